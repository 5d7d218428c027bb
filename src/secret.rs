use std::fmt;

/// Holds a credential (API key, access or refresh token) so that it never
/// shows up in `Debug` or `Display` output.
///
/// The wrapped value is reachable only through [`expose_secret`](Self::expose_secret).
///
/// # Examples
///
/// ```
/// use storefront_gate::Secret;
///
/// let anon_key = Secret::new("eyJhbGciOi".to_string());
/// assert_eq!(format!("{:?}", anon_key), "[REDACTED]");
/// assert_eq!(anon_key.expose_secret(), "eyJhbGciOi");
/// ```
// Do NOT derive Clone, Default or a value-printing Debug here.
pub struct Secret<T> {
    inner: T,
}

impl<T> Secret<T> {
    /// Wraps a sensitive value.
    pub fn new(value: T) -> Self {
        Self { inner: value }
    }

    /// Explicitly exposes the value. Never log the result.
    pub fn expose_secret(&self) -> &T {
        &self.inner
    }

    /// Unwraps the value, consuming the wrapper.
    pub fn into_exposed(self) -> T {
        self.inner
    }
}

impl<T> fmt::Debug for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl<T> fmt::Display for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_is_redacted_in_formatting() {
        let token = Secret::new("sb-refresh-9f8e7d".to_string());

        assert_eq!(format!("{:?}", token), "[REDACTED]");
        assert_eq!(token.to_string(), "[REDACTED]");
        assert!(!format!("{:?}", token).contains("String"));
    }

    #[test]
    fn redaction_holds_inside_containers() {
        let pair = (Secret::new("a".to_string()), "visible");
        assert_eq!(format!("{:?}", pair), "([REDACTED], \"visible\")");
    }

    #[test]
    fn explicit_access_returns_value() {
        let key = Secret::new("anon-key".to_string());
        assert_eq!(key.expose_secret(), "anon-key");
        assert_eq!(key.into_exposed(), "anon-key");
    }
}
