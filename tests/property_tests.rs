//! Property tests for the access decision.
//!
//! These check the decision table against arbitrary paths, methods and
//! principal states rather than hand-picked examples.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use proptest::prelude::*;
use storefront_gate::{
    AccessFilter, CookieJar, CookieMutation, CookieOptions, Decision, Principal,
    RequestDescriptor, Resolution, ResolveError, Role, RouteTable, SessionResolver,
};

struct Scripted {
    principal: Option<Principal>,
    mutations: Vec<CookieMutation>,
    calls: AtomicUsize,
}

#[async_trait]
impl SessionResolver for Scripted {
    async fn resolve(&self, _cookies: &CookieJar) -> Result<Resolution, ResolveError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Resolution {
            principal: self.principal.clone(),
            mutations: self.mutations.clone(),
        })
    }
}

fn filter_with(resolver: Arc<Scripted>) -> AccessFilter {
    AccessFilter::new(RouteTable::default(), resolver)
}

fn plain_filter() -> AccessFilter {
    filter_with(Arc::new(Scripted {
        principal: None,
        mutations: Vec::new(),
        calls: AtomicUsize::new(0),
    }))
}

fn arb_principal() -> impl Strategy<Value = Principal> {
    (
        prop::string::string_regex("[a-z0-9-]{3,10}").unwrap(),
        prop::string::string_regex("[a-z]{3,8}@toko\\.id").unwrap(),
        prop_oneof![Just(Role::Admin), Just(Role::SuperAdmin)],
    )
        .prop_map(|(id, email, role)| Principal { id, email, role })
}

fn arb_method() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("GET"),
        Just("get"),
        Just("POST"),
        Just("Put"),
        Just("DELETE"),
        Just("PATCH"),
        Just("HEAD"),
        Just("OPTIONS"),
    ]
    .prop_map(|m| m.to_string())
}

fn arb_tail() -> impl Strategy<Value = String> {
    prop::string::string_regex("(/[a-z0-9-]{0,8}){0,3}").unwrap()
}

fn arb_path() -> impl Strategy<Value = String> {
    (
        prop_oneof![
            Just("/api/auth"),
            Just("/api/admin/"),
            Just("/api/admins"),
            Just("/api/categories"),
            Just("/api/deliveries"),
            Just("/api/vouchers"),
            Just("/api/products"),
            Just("/api/orders"),
            Just("/api/public-report"),
            Just("/admin"),
            Just("/login"),
            Just("/pemesanan"),
            Just("/"),
        ],
        arb_tail(),
    )
        .prop_map(|(head, tail)| format!("{}{}", head, tail))
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap()
}

proptest! {
    /// Property: auth endpoints continue for any method and principal state
    #[test]
    fn proptest_auth_endpoints_always_continue(
        tail in arb_tail(),
        method in arb_method(),
        principal in prop::option::of(arb_principal()),
    ) {
        let path = format!("/api/auth{}", tail);
        prop_assert_eq!(
            plain_filter().decide(&path, &method, principal.as_ref()),
            Decision::Continue
        );
    }

    /// Property: anonymous admin-page requests go to login, carrying the path
    #[test]
    fn proptest_admin_pages_redirect_anonymous(tail in arb_tail(), method in arb_method()) {
        let path = format!("/admin{}", tail);
        prop_assert_eq!(
            plain_filter().decide(&path, &method, None),
            Decision::redirect_with("/login", "next", path.clone())
        );
    }

    /// Property: a principal is never redirected away from an admin page
    #[test]
    fn proptest_admin_pages_continue_for_principal(
        tail in arb_tail(),
        method in arb_method(),
        principal in arb_principal(),
    ) {
        let path = format!("/admin{}", tail);
        prop_assert_eq!(
            plain_filter().decide(&path, &method, Some(&principal)),
            Decision::Continue
        );
    }

    /// Property: a principal is never rejected, and only redirected from /login
    #[test]
    fn proptest_principal_never_rejected(
        path in arb_path(),
        method in arb_method(),
        principal in arb_principal(),
    ) {
        let decision = plain_filter().decide(&path, &method, Some(&principal));
        if path == "/login" {
            prop_assert_eq!(decision, Decision::redirect("/admin/dashboard"));
        } else {
            prop_assert_eq!(decision, Decision::Continue);
        }
    }

    /// Property: 401 only ever happens for API paths
    #[test]
    fn proptest_rejections_are_api_only(path in arb_path(), method in arb_method()) {
        if plain_filter().decide(&path, &method, None) == Decision::RejectUnauthorized {
            prop_assert!(path.starts_with("/api/"));
            prop_assert!(!path.starts_with("/api/auth"));
        }
    }

    /// Property: identical inputs yield identical decisions
    #[test]
    fn proptest_decision_is_pure(
        path in arb_path(),
        method in arb_method(),
        principal in prop::option::of(arb_principal()),
    ) {
        let filter = plain_filter();
        let first = filter.decide(&path, &method, principal.as_ref());
        let second = filter.decide(&path, &method, principal.as_ref());
        prop_assert_eq!(first, second);
    }

    /// Property: method case never changes the decision
    #[test]
    fn proptest_method_is_case_insensitive(
        path in arb_path(),
        method in arb_method(),
        principal in prop::option::of(arb_principal()),
    ) {
        let filter = plain_filter();
        prop_assert_eq!(
            filter.decide(&path, &method.to_lowercase(), principal.as_ref()),
            filter.decide(&path, &method.to_uppercase(), principal.as_ref())
        );
    }

    /// Property: resolver cookie writes survive every decision branch, and
    /// the resolver is consulted exactly when the path is not an auth endpoint
    #[test]
    fn proptest_mutations_survive_every_branch(
        path in arb_path(),
        method in arb_method(),
        principal in prop::option::of(arb_principal()),
    ) {
        let mutations = vec![
            CookieMutation::set("sb-access-token", "fresh", CookieOptions::default()),
            CookieMutation::set("sb-refresh-token", "fresh-r", CookieOptions::default()),
        ];
        let resolver = Arc::new(Scripted {
            principal: principal.clone(),
            mutations: mutations.clone(),
            calls: AtomicUsize::new(0),
        });
        let filter = filter_with(resolver.clone());
        let request = RequestDescriptor::new("req-prop", path.clone(), &method);

        let evaluation = runtime().block_on(filter.evaluate(&request));

        prop_assert_eq!(
            &evaluation.decision,
            &filter.decide(&path, &method, principal.as_ref())
        );
        if path.starts_with("/api/auth") {
            prop_assert_eq!(resolver.calls.load(Ordering::SeqCst), 0);
            prop_assert!(evaluation.mutations.is_empty());
        } else {
            prop_assert_eq!(resolver.calls.load(Ordering::SeqCst), 1);
            prop_assert_eq!(evaluation.mutations, mutations);
        }
    }
}
