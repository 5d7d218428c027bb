use std::sync::Arc;

use crate::audit::{AccessEvent, AccessOutcome, AuditTrail};
use crate::decision::{Decision, Evaluation};
use crate::logging::DecisionLog;
use crate::request::{Principal, RequestDescriptor};
use crate::resolver::{Resolution, SessionResolver};
use crate::route::RouteTable;

/// The access decision filter.
///
/// `AccessFilter` pairs a [`RouteTable`] with an injected
/// [`SessionResolver`]. It is cheap to clone and holds no per-request state,
/// so one instance serves every concurrent request.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use async_trait::async_trait;
/// use storefront_gate::{
///     AccessFilter, CookieJar, Decision, Resolution, ResolveError, RouteTable, SessionResolver,
/// };
///
/// struct Anonymous;
///
/// #[async_trait]
/// impl SessionResolver for Anonymous {
///     async fn resolve(&self, _: &CookieJar) -> Result<Resolution, ResolveError> {
///         Ok(Resolution::anonymous())
///     }
/// }
///
/// let filter = AccessFilter::new(RouteTable::default(), Arc::new(Anonymous));
///
/// assert_eq!(
///     filter.decide("/admin/orders", "GET", None),
///     Decision::redirect_with("/login", "next", "/admin/orders"),
/// );
/// assert_eq!(
///     filter.decide("/api/vouchers", "get", None),
///     Decision::RejectUnauthorized,
/// );
/// ```
#[derive(Clone)]
pub struct AccessFilter {
    routes: Arc<RouteTable>,
    resolver: Arc<dyn SessionResolver>,
    audit: Option<Arc<AuditTrail>>,
}

impl AccessFilter {
    /// Creates a filter over `routes` using `resolver` for sessions.
    pub fn new(routes: RouteTable, resolver: Arc<dyn SessionResolver>) -> Self {
        Self {
            routes: Arc::new(routes),
            resolver,
            audit: None,
        }
    }

    /// Records every evaluation into `trail` as well as the log.
    pub fn with_audit(mut self, trail: Arc<AuditTrail>) -> Self {
        self.audit = Some(trail);
        self
    }

    /// The route table in use.
    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Returns true if the filter runs for `path` at all.
    pub fn applies_to(&self, path: &str) -> bool {
        self.routes.triggers(path)
    }

    /// Pure decision over `(path, method, principal)`.
    ///
    /// `method` is compared case-insensitively. Rules, first match wins:
    ///
    /// 1. auth endpoint: continue
    /// 2. login page with a principal: redirect to the dashboard
    /// 3. admin page without a principal: redirect to login with `next`
    /// 4. any other non-API path: continue
    /// 5. protected API without a principal: reject
    /// 6. everything else: continue
    pub fn decide(&self, path: &str, method: &str, principal: Option<&Principal>) -> Decision {
        let method = method.to_ascii_uppercase();
        let class = self.routes.classify(path, &method);
        let paths = self.routes.paths();
        let authenticated = principal.is_some();

        if class.auth_endpoint {
            return Decision::Continue;
        }
        if class.login_page && authenticated {
            return Decision::redirect(&paths.dashboard_path);
        }
        if class.admin_page && !authenticated {
            return Decision::redirect_with(&paths.login_path, "next", path);
        }
        if !class.api {
            return Decision::Continue;
        }
        if class.protected_api && !authenticated {
            return Decision::RejectUnauthorized;
        }
        Decision::Continue
    }

    /// Resolves the session for `request` and decides.
    ///
    /// Auth endpoints short-circuit before the resolver is called. A resolver
    /// error is logged and treated as "no principal". Cookie writes from the
    /// resolver are returned alongside the decision whatever it is.
    pub async fn evaluate(&self, request: &RequestDescriptor) -> Evaluation {
        let log = DecisionLog::new(request.request_id(), request.path(), request.method());

        if self.routes.classify(request.path(), request.method()).auth_endpoint {
            log.debug(format_args!("auth endpoint, skipping session resolution"));
            return Evaluation::new(Decision::Continue);
        }

        let resolution = match self.resolver.resolve(request.cookies()).await {
            Ok(resolution) => resolution,
            Err(e) => {
                log.warn(format_args!("session resolution failed, treating as anonymous: {}", e));
                Resolution::anonymous()
            }
        };

        let principal = resolution.principal.as_ref();
        let decision = self.decide(request.path(), request.method(), principal);
        self.report(&log, request, principal, &decision);

        Evaluation::with_mutations(decision, resolution.mutations)
    }

    fn report(
        &self,
        log: &DecisionLog<'_>,
        request: &RequestDescriptor,
        principal: Option<&Principal>,
        decision: &Decision,
    ) {
        let outcome = AccessOutcome::from(decision);
        let mut event = AccessEvent::new(
            request.request_id(),
            principal.map(|p| p.email.as_str()),
            request.method(),
            request.path(),
            outcome,
        );
        if let Decision::RedirectTo { target, .. } = decision {
            event = event.with_redirect_target(target);
        }

        match outcome {
            AccessOutcome::Denied => log.info(format_args!("{}", event)),
            _ => log.debug(format_args!("{}", event)),
        }

        if let Some(trail) = &self.audit {
            trail.record(event);
        }
    }
}

impl std::fmt::Debug for AccessFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessFilter")
            .field("routes", &self.routes)
            .field("audit", &self.audit.is_some())
            .finish_non_exhaustive()
    }
}
