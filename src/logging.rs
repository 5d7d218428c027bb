use std::fmt;

/// Request-scoped logger used by the access filter.
///
/// Every line carries the request id, path and method as structured
/// `tracing` fields, so a single request can be followed through the logs.
#[derive(Debug, Clone, Copy)]
pub struct DecisionLog<'a> {
    request_id: &'a str,
    path: &'a str,
    method: &'a str,
}

impl<'a> DecisionLog<'a> {
    /// Creates a logger bound to one request.
    pub fn new(request_id: &'a str, path: &'a str, method: &'a str) -> Self {
        Self {
            request_id,
            path,
            method,
        }
    }

    /// Returns the request id this logger is bound to.
    pub fn request_id(&self) -> &str {
        self.request_id
    }

    /// Logs an info-level message.
    pub fn info(&self, args: fmt::Arguments<'_>) {
        tracing::info!(
            request_id = %self.request_id,
            path = %self.path,
            method = %self.method,
            "{}",
            args
        );
    }

    /// Logs a warning-level message.
    pub fn warn(&self, args: fmt::Arguments<'_>) {
        tracing::warn!(
            request_id = %self.request_id,
            path = %self.path,
            method = %self.method,
            "{}",
            args
        );
    }

    /// Logs a debug-level message.
    pub fn debug(&self, args: fmt::Arguments<'_>) {
        tracing::debug!(
            request_id = %self.request_id,
            path = %self.path,
            method = %self.method,
            "{}",
            args
        );
    }
}
