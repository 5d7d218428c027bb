//! Access policy for a storefront admin application.
//!
//! Every request to the admin pages, the login page or the API passes through
//! an [`AccessFilter`] before any handler runs. The filter:
//! - resolves the requester's session through an injected [`SessionResolver`]
//!   (which may refresh session cookies)
//! - classifies the path against a declarative [`RouteTable`]
//! - returns a [`Decision`]: continue, redirect, or a structured 401
//!
//! Cookie writes produced while resolving the session travel with the
//! decision as an [`Evaluation`] and are attached to whatever response is
//! finally sent, so a refreshed session is never silently dropped.
//!
//! # Core Types
//!
//! - [`AccessFilter`]: the decision filter
//! - [`RouteTable`]: ordered `(matcher, kind)` rules
//! - [`SessionResolver`]: cookies to principal, the injected seam
//! - [`TokenSessionResolver`]: access/refresh-token adapter over an [`IdentityProvider`]
//! - [`HttpIdentityProvider`]: the provider's REST auth API, built from [`GateConfig`]
//! - [`web::enforce_access`]: axum middleware
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use async_trait::async_trait;
//! use storefront_gate::{
//!     AccessFilter, CookieJar, Decision, Principal, Resolution, ResolveError, Role,
//!     RouteTable, SessionResolver,
//! };
//!
//! struct AlwaysAdmin;
//!
//! #[async_trait]
//! impl SessionResolver for AlwaysAdmin {
//!     async fn resolve(&self, _: &CookieJar) -> Result<Resolution, ResolveError> {
//!         Ok(Resolution::authenticated(Principal {
//!             id: "u-1".to_string(),
//!             email: "admin@toko.id".to_string(),
//!             role: Role::Admin,
//!         }))
//!     }
//! }
//!
//! let filter = AccessFilter::new(RouteTable::default(), Arc::new(AlwaysAdmin));
//! assert_eq!(filter.decide("/api/products/1", "GET", None), Decision::Continue);
//! assert_eq!(
//!     filter.decide("/api/products/1", "PUT", None),
//!     Decision::RejectUnauthorized
//! );
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod audit;
mod callback;
mod config;
mod cookie;
mod decision;
mod error;
mod filter;
mod identity;
mod logging;
mod request;
mod resolver;
mod route;
mod secret;
mod session;
pub mod web;

pub use callback::{callback_redirect, CallbackContext, CALLBACK_ERROR};
pub use config::{Environment, GateConfig, IdentityConfig};
pub use self::cookie::{CookieMutation, CookieOptions, SameSite};
pub use decision::{Decision, Evaluation};
pub use error::{ConfigError, Error, ResolveError};
pub use filter::AccessFilter;
pub use identity::HttpIdentityProvider;
pub use logging::DecisionLog;
pub use request::{CookieJar, Principal, RequestDescriptor, Role};
pub use resolver::{Resolution, SessionResolver};
pub use route::{
    Matcher, RouteClass, RouteKind, RoutePaths, RouteRule, RouteTable, ADMIN_PREFIX, API_PREFIX,
    AUTH_PREFIX, DASHBOARD_PATH, LOGIN_PATH,
};
pub use secret::Secret;
pub use session::{
    parse_expiry, IdentityProvider, IdentityUser, ProviderSession, SessionCookies, SignIn,
    TokenPair, TokenSessionResolver, UserMetadata, ACCESS_COOKIE, REFRESH_COOKIE,
};
