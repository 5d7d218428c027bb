use std::fmt;

/// Errors surfaced by the gate crate.
#[derive(Debug)]
pub enum Error {
    /// Session resolution failed
    Resolve(ResolveError),
    /// Configuration could not be loaded
    Config(ConfigError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Resolve(e) => write!(f, "Session resolution failed: {}", e),
            Error::Config(e) => write!(f, "Configuration error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Resolve(e) => Some(e),
            Error::Config(e) => Some(e),
        }
    }
}

impl From<ResolveError> for Error {
    fn from(e: ResolveError) -> Self {
        Error::Resolve(e)
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Config(e)
    }
}

/// Failure talking to the identity provider.
///
/// The access filter never propagates these: any resolver failure is treated
/// as "not authenticated". Sign-in and sign-out surface them to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// The identity provider could not be reached or answered garbage
    Provider(String),
    /// The provider returned a user record without an email address
    MissingEmail {
        /// Provider-side user id
        id: String,
    },
    /// Email and password did not match
    InvalidCredentials,
    /// The account exists but its email was never confirmed
    EmailNotConfirmed,
    /// The provider refused the request for another reason
    Rejected(String),
    /// Creating the provider account for a legacy admin failed
    Migration(String),
}

impl ResolveError {
    /// Returns true for sign-in failures that a legacy admin, unknown to the
    /// provider, would produce.
    pub fn is_unmigrated(&self) -> bool {
        matches!(
            self,
            ResolveError::InvalidCredentials | ResolveError::EmailNotConfirmed
        )
    }
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveError::Provider(msg) => write!(f, "identity provider error: {}", msg),
            ResolveError::MissingEmail { id } => write!(f, "user '{}' has no email", id),
            ResolveError::InvalidCredentials => write!(f, "Invalid login credentials"),
            ResolveError::EmailNotConfirmed => write!(f, "Email not confirmed"),
            ResolveError::Rejected(msg) => write!(f, "rejected by identity provider: {}", msg),
            ResolveError::Migration(msg) => write!(f, "failed to migrate user: {}", msg),
        }
    }
}

impl std::error::Error for ResolveError {}

/// Failure while loading [`GateConfig`](crate::GateConfig).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A required key was not set
    Missing(&'static str),
    /// A key was set to an unusable value
    Invalid {
        /// The offending key
        key: &'static str,
        /// Why the value was rejected
        reason: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "{} is not set", key),
            ConfigError::Invalid { key, reason } => write!(f, "invalid {}: {}", key, reason),
        }
    }
}

impl std::error::Error for ConfigError {}
