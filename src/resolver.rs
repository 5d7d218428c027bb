//! The session-resolution seam.
//!
//! The access filter depends on a [`SessionResolver`] to turn request cookies
//! into a principal. Resolvers are injected, never global, so tests can swap
//! in a fake.

use async_trait::async_trait;

use crate::cookie::CookieMutation;
use crate::error::ResolveError;
use crate::request::{CookieJar, Principal};

/// Outcome of a successful session lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    /// The requester, if the session is valid
    pub principal: Option<Principal>,
    /// Cookie writes (refreshed or cleared session cookies)
    pub mutations: Vec<CookieMutation>,
}

impl Resolution {
    /// No principal, no cookie writes.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// A principal with no cookie writes.
    pub fn authenticated(principal: Principal) -> Self {
        Self {
            principal: Some(principal),
            mutations: Vec::new(),
        }
    }

    /// Adds cookie writes to the resolution.
    pub fn with_mutations(mut self, mutations: Vec<CookieMutation>) -> Self {
        self.mutations.extend(mutations);
        self
    }
}

/// Turns request cookies into a principal, possibly refreshing the session.
///
/// Implementations may perform network I/O. They should report transport
/// problems as `Err`; the access filter downgrades every error to "no
/// principal".
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use storefront_gate::{CookieJar, Resolution, ResolveError, SessionResolver};
///
/// struct NobodyHome;
///
/// #[async_trait]
/// impl SessionResolver for NobodyHome {
///     async fn resolve(&self, _cookies: &CookieJar) -> Result<Resolution, ResolveError> {
///         Ok(Resolution::anonymous())
///     }
/// }
/// ```
#[async_trait]
pub trait SessionResolver: Send + Sync {
    /// Resolves the principal behind `cookies`.
    async fn resolve(&self, cookies: &CookieJar) -> Result<Resolution, ResolveError>;
}
