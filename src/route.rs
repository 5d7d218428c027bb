//! Declarative route classification.
//!
//! Every incoming path is classified by running it against an ordered table
//! of `(Matcher, RouteKind)` rules. Each rule is independent: a path can be
//! both an API path and a protected API path, for example. Precedence between
//! the resulting facts is applied later by [`AccessFilter`](crate::AccessFilter).
//!
//! Matching is by plain string prefix, not path segment. `/api/admins-list`
//! is covered by the `/api/admins` rule.

use std::fmt;

/// Default prefix of the authentication endpoints.
pub const AUTH_PREFIX: &str = "/api/auth";
/// Default prefix of every API route.
pub const API_PREFIX: &str = "/api/";
/// Default prefix of the server-rendered admin pages.
pub const ADMIN_PREFIX: &str = "/admin";
/// Default login page path.
pub const LOGIN_PATH: &str = "/login";
/// Default landing page after login.
pub const DASHBOARD_PATH: &str = "/admin/dashboard";

/// How a single rule matches a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Matcher {
    /// Path starts with the given string
    Prefix(String),
    /// Path equals the given string
    Exact(String),
    /// Path starts with `prefix` and the method is anything but `method`
    PrefixExceptMethod {
        /// Path prefix
        prefix: String,
        /// Upper-case method that is exempt from the rule
        method: &'static str,
    },
}

impl Matcher {
    /// Shorthand for [`Matcher::Prefix`].
    pub fn prefix(prefix: impl Into<String>) -> Self {
        Matcher::Prefix(prefix.into())
    }

    /// Shorthand for [`Matcher::Exact`].
    pub fn exact(path: impl Into<String>) -> Self {
        Matcher::Exact(path.into())
    }

    /// Shorthand for [`Matcher::PrefixExceptMethod`].
    pub fn prefix_except(prefix: impl Into<String>, method: &'static str) -> Self {
        Matcher::PrefixExceptMethod {
            prefix: prefix.into(),
            method,
        }
    }

    /// Tests the matcher. `method` must already be upper-case.
    pub fn matches(&self, path: &str, method: &str) -> bool {
        match self {
            Matcher::Prefix(prefix) => path.starts_with(prefix.as_str()),
            Matcher::Exact(exact) => path == exact,
            Matcher::PrefixExceptMethod { prefix, method: m } => {
                path.starts_with(prefix.as_str()) && method != *m
            }
        }
    }
}

impl fmt::Display for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Matcher::Prefix(p) => write!(f, "{}*", p),
            Matcher::Exact(p) => write!(f, "{}", p),
            Matcher::PrefixExceptMethod { prefix, method } => {
                write!(f, "{}* (not {})", prefix, method)
            }
        }
    }
}

/// The fact a rule establishes when it matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteKind {
    /// Session-establishing endpoint, always reachable
    AuthEndpoint,
    /// The login form
    LoginPage,
    /// Server-rendered admin page
    AdminPage,
    /// Any API route
    Api,
    /// API route that requires a principal
    ProtectedApi,
}

/// A single `(matcher, kind)` entry in the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteRule {
    /// When the rule applies
    pub matcher: Matcher,
    /// What the rule establishes
    pub kind: RouteKind,
}

impl RouteRule {
    /// Creates a rule.
    pub fn new(matcher: Matcher, kind: RouteKind) -> Self {
        Self { matcher, kind }
    }
}

/// Facts derived from a path and method.
///
/// Never stored; recomputed for every request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouteClass {
    /// Path is an authentication endpoint
    pub auth_endpoint: bool,
    /// Path is exactly the login page
    pub login_page: bool,
    /// Path is an admin page
    pub admin_page: bool,
    /// Path is under the API prefix
    pub api: bool,
    /// Path and method hit a protected API rule
    pub protected_api: bool,
}

/// Well-known paths the filter needs to classify and redirect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePaths {
    /// Prefix of the authentication endpoints
    pub auth_prefix: String,
    /// Prefix of all API routes
    pub api_prefix: String,
    /// Prefix of the admin pages
    pub admin_prefix: String,
    /// Login page
    pub login_path: String,
    /// Post-login landing page
    pub dashboard_path: String,
}

impl Default for RoutePaths {
    fn default() -> Self {
        Self {
            auth_prefix: AUTH_PREFIX.to_string(),
            api_prefix: API_PREFIX.to_string(),
            admin_prefix: ADMIN_PREFIX.to_string(),
            login_path: LOGIN_PATH.to_string(),
            dashboard_path: DASHBOARD_PATH.to_string(),
        }
    }
}

/// Ordered rule table plus the redirect targets.
///
/// # Examples
///
/// ```
/// use storefront_gate::RouteTable;
///
/// let table = RouteTable::default();
///
/// assert!(!table.classify("/api/products/1", "GET").protected_api);
/// assert!(table.classify("/api/products/1", "DELETE").protected_api);
/// assert!(table.classify("/api/admins", "GET").protected_api);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTable {
    paths: RoutePaths,
    rules: Vec<RouteRule>,
}

impl RouteTable {
    /// Builds the standard table for the given paths.
    pub fn new(paths: RoutePaths) -> Self {
        let mut rules = vec![
            RouteRule::new(Matcher::prefix(&paths.auth_prefix), RouteKind::AuthEndpoint),
            RouteRule::new(Matcher::exact(&paths.login_path), RouteKind::LoginPage),
            RouteRule::new(Matcher::prefix(&paths.admin_prefix), RouteKind::AdminPage),
            RouteRule::new(Matcher::prefix(&paths.api_prefix), RouteKind::Api),
        ];
        rules.extend(
            standard_protected_api()
                .into_iter()
                .map(|m| RouteRule::new(m, RouteKind::ProtectedApi)),
        );

        Self { paths, rules }
    }

    /// Appends an extra protected API matcher.
    pub fn protect(mut self, matcher: Matcher) -> Self {
        self.rules
            .push(RouteRule::new(matcher, RouteKind::ProtectedApi));
        self
    }

    /// The paths this table was built from.
    pub fn paths(&self) -> &RoutePaths {
        &self.paths
    }

    /// The rules, in table order.
    pub fn rules(&self) -> &[RouteRule] {
        &self.rules
    }

    /// Runs every rule against the path. `method` must be upper-case.
    pub fn classify(&self, path: &str, method: &str) -> RouteClass {
        let mut class = RouteClass::default();
        for rule in self.rules.iter().filter(|r| r.matcher.matches(path, method)) {
            match rule.kind {
                RouteKind::AuthEndpoint => class.auth_endpoint = true,
                RouteKind::LoginPage => class.login_page = true,
                RouteKind::AdminPage => class.admin_page = true,
                RouteKind::Api => class.api = true,
                RouteKind::ProtectedApi => class.protected_api = true,
            }
        }
        class
    }

    /// Returns true if the filter should run for this path at all.
    ///
    /// The trigger set is every path under the API prefix, every path under
    /// the admin prefix, and the login page. Unlike the rules, this check is
    /// segment-aware: `/administrator` is not under `/admin`.
    pub fn triggers(&self, path: &str) -> bool {
        is_under(path, &self.paths.api_prefix)
            || is_under(path, &self.paths.admin_prefix)
            || path == self.paths.login_path
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::new(RoutePaths::default())
    }
}

/// Protected API prefixes. Product reads are public, product writes are not.
fn standard_protected_api() -> Vec<Matcher> {
    vec![
        Matcher::prefix("/api/admin/"),
        Matcher::prefix("/api/admins"),
        Matcher::prefix("/api/categories"),
        Matcher::prefix("/api/deliveries"),
        Matcher::prefix("/api/vouchers"),
        Matcher::prefix_except("/api/products", "GET"),
    ]
}

fn is_under(path: &str, prefix: &str) -> bool {
    let base = prefix.trim_end_matches('/');
    path == base
        || path
            .strip_prefix(base)
            .is_some_and(|rest| rest.starts_with('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_endpoints_classified() {
        let table = RouteTable::default();
        let class = table.classify("/api/auth/login", "POST");

        assert!(class.auth_endpoint);
        assert!(class.api);
        assert!(!class.protected_api);
    }

    #[test]
    fn login_page_is_exact() {
        let table = RouteTable::default();
        assert!(table.classify("/login", "GET").login_page);
        assert!(!table.classify("/login/", "GET").login_page);
        assert!(!table.classify("/login?x", "GET").login_page);
    }

    #[test]
    fn admin_pages_classified() {
        let table = RouteTable::default();
        assert!(table.classify("/admin", "GET").admin_page);
        assert!(table.classify("/admin/products/new", "GET").admin_page);
        assert!(!table.classify("/pemesanan", "GET").admin_page);
    }

    #[test]
    fn protected_api_rules_one_by_one() {
        let table = RouteTable::default();
        for path in [
            "/api/admin/stats",
            "/api/admins",
            "/api/admins/7",
            "/api/categories",
            "/api/categories/5",
            "/api/deliveries/3",
            "/api/vouchers",
        ] {
            for method in ["GET", "POST", "PUT", "DELETE"] {
                assert!(
                    table.classify(path, method).protected_api,
                    "{} {} should be protected",
                    method,
                    path
                );
            }
        }
    }

    #[test]
    fn admin_rule_requires_trailing_slash() {
        let table = RouteTable::default();
        assert!(!table.classify("/api/admin", "GET").protected_api);
    }

    #[test]
    fn products_protected_only_for_writes() {
        let table = RouteTable::default();
        assert!(!table.classify("/api/products", "GET").protected_api);
        assert!(!table.classify("/api/products/123", "GET").protected_api);
        for method in ["POST", "PUT", "PATCH", "DELETE", "HEAD"] {
            assert!(table.classify("/api/products/123", method).protected_api);
        }
    }

    #[test]
    fn prefix_collisions_are_matched() {
        let table = RouteTable::default();
        assert!(table.classify("/api/admins-list", "GET").protected_api);
        assert!(table.classify("/api/administrators", "GET").protected_api);
    }

    #[test]
    fn public_api_is_unprotected() {
        let table = RouteTable::default();
        let class = table.classify("/api/public-report", "GET");
        assert!(class.api);
        assert!(!class.protected_api);

        assert!(!table.classify("/api/orders", "POST").protected_api);
    }

    #[test]
    fn extra_protected_rules_apply() {
        let table = RouteTable::default().protect(Matcher::exact("/api/orders"));
        assert!(table.classify("/api/orders", "POST").protected_api);
        assert!(!table.classify("/api/orders/1", "POST").protected_api);
    }

    #[test]
    fn trigger_set() {
        let table = RouteTable::default();
        assert!(table.triggers("/api"));
        assert!(table.triggers("/api/products"));
        assert!(table.triggers("/admin"));
        assert!(table.triggers("/admin/dashboard"));
        assert!(table.triggers("/login"));

        assert!(!table.triggers("/"));
        assert!(!table.triggers("/pemesanan"));
        assert!(!table.triggers("/apiary"));
        assert!(!table.triggers("/administrator"));
        assert!(!table.triggers("/login/help"));
    }

    #[test]
    fn matcher_display() {
        assert_eq!(Matcher::prefix("/api/").to_string(), "/api/*");
        assert_eq!(
            Matcher::prefix_except("/api/products", "GET").to_string(),
            "/api/products* (not GET)"
        );
    }
}
