//! Mapping HTTP requests onto gate types.

use std::borrow::Cow;
use std::sync::atomic::{AtomicU64, Ordering};

use axum::http::header::COOKIE;
use axum::http::{HeaderMap, HeaderValue, Request};

use crate::cookie::CookieMutation;
use crate::request::{CookieJar, RequestDescriptor};

/// Header carrying an upstream-assigned request id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

static NEXT_REQUEST_ID: AtomicU64 = AtomicU64::new(1);

/// Builds the filter input from an HTTP request.
///
/// The request id is taken from `x-request-id` when present and locally
/// numbered otherwise. The path goes through [`normalize_path`]. Non-UTF-8
/// `Cookie` headers are ignored.
///
/// # Examples
///
/// ```
/// use axum::http::Request;
/// use storefront_gate::web::describe_request;
///
/// let req = Request::builder()
///     .method("delete")
///     .uri("/api/vouchers/9?force=1")
///     .header("cookie", "sb-access-token=abc")
///     .header("x-request-id", "edge-42")
///     .body(())
///     .unwrap();
///
/// let descriptor = describe_request(&req);
/// assert_eq!(descriptor.request_id(), "edge-42");
/// assert_eq!(descriptor.path(), "/api/vouchers/9");
/// assert_eq!(descriptor.method(), "DELETE");
/// assert_eq!(descriptor.cookies().get("sb-access-token"), Some("abc"));
/// ```
pub fn describe_request<B>(request: &Request<B>) -> RequestDescriptor {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("req-{}", NEXT_REQUEST_ID.fetch_add(1, Ordering::Relaxed)));

    RequestDescriptor::new(
        request_id,
        normalize_path(request.uri().path()),
        request.method().as_str(),
    )
        .with_cookies(cookie_jar(request.headers()))
}

/// Canonical form of a request path, as the access rules see it.
///
/// Percent-escapes are decoded once, empty and `.` segments dropped and `..`
/// segments resolved without climbing above the root. A trailing slash is
/// kept. A path that does not decode to UTF-8 is only cleaned of dot and
/// empty segments.
///
/// # Examples
///
/// ```
/// use storefront_gate::web::normalize_path;
///
/// assert_eq!(normalize_path("/api/%61dmins"), "/api/admins");
/// assert_eq!(normalize_path("//admin/./orders/../dashboard"), "/admin/dashboard");
/// assert_eq!(normalize_path("/admin/"), "/admin/");
/// ```
pub fn normalize_path(raw: &str) -> String {
    let decoded = urlencoding::decode(raw).unwrap_or(Cow::Borrowed(raw));

    let mut segments: Vec<&str> = Vec::new();
    for segment in decoded.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }

    let mut path = format!("/{}", segments.join("/"));
    if !segments.is_empty() && decoded.ends_with('/') {
        path.push('/');
    }
    path
}

/// Rewrites the request's `Cookie` header so downstream handlers see the
/// refreshed session rather than the one the client sent.
pub fn refresh_request_cookies(headers: &mut HeaderMap, mutations: &[CookieMutation]) {
    if mutations.is_empty() {
        return;
    }

    let mut jar = cookie_jar(headers);
    jar.apply(mutations);
    headers.remove(COOKIE);
    if jar.is_empty() {
        return;
    }

    match HeaderValue::from_str(&jar.to_header_value()) {
        Ok(value) => {
            headers.insert(COOKIE, value);
        }
        Err(e) => tracing::warn!("refreshed cookie header is not a valid header value: {}", e),
    }
}

fn cookie_jar(headers: &HeaderMap) -> CookieJar {
    CookieJar::parse(
        headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cookie::CookieOptions;

    #[test]
    fn generated_request_ids_are_unique() {
        let req = Request::builder().uri("/admin").body(()).unwrap();
        let a = describe_request(&req);
        let b = describe_request(&req);

        assert!(a.request_id().starts_with("req-"));
        assert_ne!(a.request_id(), b.request_id());
    }

    #[test]
    fn paths_are_normalized() {
        for (raw, expected) in [
            ("/", "/"),
            ("", "/"),
            ("/api/%61dmins", "/api/admins"),
            ("/api%2Fadmins", "/api/admins"),
            ("/api//vouchers", "/api/vouchers"),
            ("/../admin", "/admin"),
            ("/api/public/../admins/", "/api/admins/"),
            ("/x%FF", "/x%FF"),
        ] {
            assert_eq!(normalize_path(raw), expected, "raw {:?}", raw);
        }
    }

    #[test]
    fn descriptor_carries_normalized_path() {
        let req = Request::builder()
            .uri("/api/./%61dmins")
            .body(())
            .unwrap();
        assert_eq!(describe_request(&req).path(), "/api/admins");
    }

    #[test]
    fn multiple_cookie_headers_are_merged() {
        let req = Request::builder()
            .uri("/login")
            .header(COOKIE, "a=1")
            .header(COOKIE, "b=2; c=3")
            .body(())
            .unwrap();

        assert_eq!(describe_request(&req).cookies().len(), 3);
    }

    #[test]
    fn refresh_rewrites_cookie_header() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("sb-access-token=old; theme=dark"));

        refresh_request_cookies(
            &mut headers,
            &[CookieMutation::set("sb-access-token", "new", CookieOptions::default())],
        );

        assert_eq!(
            headers.get(COOKIE).unwrap(),
            "theme=dark; sb-access-token=new"
        );
    }

    #[test]
    fn refresh_drops_header_when_jar_empties() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("sb-access-token=old"));

        refresh_request_cookies(
            &mut headers,
            &[CookieMutation::remove("sb-access-token", CookieOptions::default())],
        );

        assert!(headers.get(COOKIE).is_none());
    }

    #[test]
    fn no_mutations_leaves_headers_alone() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("x=1;y=2"));
        refresh_request_cookies(&mut headers, &[]);
        assert_eq!(headers.get(COOKIE).unwrap(), "x=1;y=2");
    }
}
