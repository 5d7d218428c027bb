//! Where to send the browser after the identity provider's OAuth callback.

use crate::config::Environment;

/// Query value attached to the login redirect when the code exchange fails.
pub const CALLBACK_ERROR: &str = "auth_callback_error";

/// Inputs of the post-callback redirect.
#[derive(Debug, Clone, Copy)]
pub struct CallbackContext<'a> {
    /// Scheme and authority the request arrived on, e.g. `http://localhost:3000`
    pub origin: &'a str,
    /// The `next` query parameter, if any. Only same-site paths are honoured.
    pub next: Option<&'a str>,
    /// `X-Forwarded-Host` header, if any
    pub forwarded_host: Option<&'a str>,
    /// Deployment environment
    pub environment: Environment,
    /// Login page path
    pub login_path: &'a str,
    /// Default landing page
    pub dashboard_path: &'a str,
}

/// Computes the absolute redirect location after a code exchange.
///
/// `exchanged` is true only when a code was present and the provider
/// accepted it.
///
/// # Examples
///
/// ```
/// use storefront_gate::{callback_redirect, CallbackContext, Environment};
///
/// let ctx = CallbackContext {
///     origin: "http://10.0.0.5:3000",
///     next: None,
///     forwarded_host: Some("toko.example.com"),
///     environment: Environment::Production,
///     login_path: "/login",
///     dashboard_path: "/admin/dashboard",
/// };
///
/// assert_eq!(callback_redirect(&ctx, true), "https://toko.example.com/admin/dashboard");
/// assert_eq!(
///     callback_redirect(&ctx, false),
///     "http://10.0.0.5:3000/login?error=auth_callback_error"
/// );
/// ```
pub fn callback_redirect(ctx: &CallbackContext<'_>, exchanged: bool) -> String {
    if !exchanged {
        return format!("{}{}?error={}", ctx.origin, ctx.login_path, CALLBACK_ERROR);
    }

    let next = ctx.next.filter(|n| is_local_path(n)).unwrap_or(ctx.dashboard_path);
    match (ctx.environment, ctx.forwarded_host) {
        (Environment::Development, _) | (_, None) => format!("{}{}", ctx.origin, next),
        (Environment::Production, Some(host)) => format!("https://{}{}", host, next),
    }
}

/// A path on this site: one leading `/`, not `//` or `/\` (which browsers
/// read as a scheme-relative URL), and no control characters.
fn is_local_path(next: &str) -> bool {
    next.starts_with('/')
        && !next.starts_with("//")
        && !next.starts_with("/\\")
        && !next.chars().any(char::is_control)
}
