use std::fmt;

use crate::decision::Decision;

/// What happened to an evaluated request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessOutcome {
    /// Passed to the downstream handler
    Allowed,
    /// Sent elsewhere (login page or dashboard)
    Redirected,
    /// Rejected with 401
    Denied,
}

impl From<&Decision> for AccessOutcome {
    fn from(decision: &Decision) -> Self {
        match decision {
            Decision::Continue => AccessOutcome::Allowed,
            Decision::RedirectTo { .. } => AccessOutcome::Redirected,
            Decision::RejectUnauthorized => AccessOutcome::Denied,
        }
    }
}

impl fmt::Display for AccessOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessOutcome::Allowed => write!(f, "allowed"),
            AccessOutcome::Redirected => write!(f, "redirected"),
            AccessOutcome::Denied => write!(f, "denied"),
        }
    }
}

/// One access decision, reduced to loggable metadata.
///
/// # Example
///
/// ```
/// use storefront_gate::audit::{AccessEvent, AccessOutcome};
///
/// let event = AccessEvent::new(
///     "req-7",
///     None::<String>,
///     "DELETE",
///     "/api/vouchers/3",
///     AccessOutcome::Denied,
/// );
///
/// assert_eq!(
///     event.to_string(),
///     "AccessEvent[outcome=denied, request_id=req-7, principal=<none>, DELETE /api/vouchers/3]"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessEvent {
    request_id: String,
    principal: Option<String>,
    method: String,
    path: String,
    outcome: AccessOutcome,
    redirect_target: Option<String>,
}

impl AccessEvent {
    /// Creates an event.
    pub fn new(
        request_id: impl Into<String>,
        principal: Option<impl Into<String>>,
        method: impl Into<String>,
        path: impl Into<String>,
        outcome: AccessOutcome,
    ) -> Self {
        Self {
            request_id: request_id.into(),
            principal: principal.map(Into::into),
            method: method.into(),
            path: path.into(),
            outcome,
            redirect_target: None,
        }
    }

    /// Records where a redirect pointed.
    pub fn with_redirect_target(mut self, target: impl Into<String>) -> Self {
        self.redirect_target = Some(target.into());
        self
    }

    /// Request correlation id.
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Principal email, if one was resolved.
    pub fn principal(&self) -> Option<&str> {
        self.principal.as_deref()
    }

    /// Upper-case HTTP method.
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Request path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Decision outcome.
    pub fn outcome(&self) -> AccessOutcome {
        self.outcome
    }

    /// Redirect target, for redirected requests.
    pub fn redirect_target(&self) -> Option<&str> {
        self.redirect_target.as_deref()
    }
}

impl fmt::Display for AccessEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AccessEvent[outcome={}, request_id={}, principal={}, {} {}",
            self.outcome,
            self.request_id,
            self.principal.as_deref().unwrap_or("<none>"),
            self.method,
            self.path
        )?;
        if let Some(target) = &self.redirect_target {
            write!(f, " -> {}", target)?;
        }
        write!(f, "]")
    }
}
