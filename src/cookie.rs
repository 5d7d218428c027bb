//! Outgoing cookie mutations produced by session refresh.

use cookie::time::Duration;
use cookie::Cookie;

pub use cookie::SameSite;

/// Attributes attached to a `Set-Cookie` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieOptions {
    /// `Path` attribute
    pub path: String,
    /// `Max-Age` in seconds
    pub max_age: Option<u64>,
    /// `HttpOnly` flag
    pub http_only: bool,
    /// `Secure` flag
    pub secure: bool,
    /// `SameSite` attribute
    pub same_site: Option<SameSite>,
}

impl Default for CookieOptions {
    fn default() -> Self {
        Self {
            path: "/".to_string(),
            max_age: None,
            http_only: true,
            secure: true,
            same_site: Some(SameSite::Lax),
        }
    }
}

impl CookieOptions {
    fn build(&self, name: String, value: String) -> Cookie<'static> {
        let mut builder = Cookie::build((name, value))
            .path(self.path.clone())
            .http_only(self.http_only)
            .secure(self.secure);
        if let Some(secs) = self.max_age {
            builder = builder.max_age(Duration::seconds(i64::try_from(secs).unwrap_or(i64::MAX)));
        }
        if let Some(same_site) = self.same_site {
            builder = builder.same_site(same_site);
        }
        builder.build()
    }
}

/// A single cookie write that must reach the client.
///
/// The filter never interprets these; it only guarantees they are attached
/// to whichever response is finally returned.
#[derive(Debug, Clone)]
pub struct CookieMutation {
    cookie: Cookie<'static>,
}

impl CookieMutation {
    /// Sets `name` to `value`.
    pub fn set(name: impl Into<String>, value: impl Into<String>, options: CookieOptions) -> Self {
        Self {
            cookie: options.build(name.into(), value.into()),
        }
    }

    /// Expires `name` on the client.
    pub fn remove(name: impl Into<String>, options: CookieOptions) -> Self {
        let mut cookie = options.build(name.into(), String::new());
        cookie.make_removal();
        Self { cookie }
    }

    /// Cookie name.
    pub fn name(&self) -> &str {
        self.cookie.name()
    }

    /// Cookie value; empty for removals.
    pub fn value(&self) -> &str {
        self.cookie.value()
    }

    /// `Max-Age` in seconds, if set.
    pub fn max_age(&self) -> Option<u64> {
        self.cookie
            .max_age()
            .map(|d| u64::try_from(d.whole_seconds()).unwrap_or(0))
    }

    /// The underlying cookie.
    pub fn cookie(&self) -> &Cookie<'static> {
        &self.cookie
    }

    /// Returns true if this mutation deletes the cookie.
    pub fn is_removal(&self) -> bool {
        self.max_age() == Some(0)
    }

    /// Renders the value of a `Set-Cookie` header, percent-encoding the
    /// name and value.
    pub fn to_header_value(&self) -> String {
        self.cookie.encoded().to_string()
    }
}

impl PartialEq for CookieMutation {
    fn eq(&self, other: &Self) -> bool {
        self.to_header_value() == other.to_header_value()
    }
}

impl Eq for CookieMutation {}
