//! Turning decisions into HTTP responses.

use axum::http::header::{LOCATION, SET_COOKIE};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::cookie::CookieMutation;
use crate::decision::Decision;

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
}

/// The structured 401 returned to API clients.
pub fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorBody {
            error: "Unauthorized",
        }),
    )
        .into_response()
}

/// Builds the response for a short-circuiting decision.
///
/// Returns `None` for [`Decision::Continue`]; the caller runs the downstream
/// handler instead. Redirects are `307 Temporary Redirect`.
pub fn short_circuit(decision: &Decision) -> Option<Response> {
    match decision {
        Decision::Continue => None,
        Decision::RejectUnauthorized => Some(unauthorized()),
        Decision::RedirectTo { .. } => {
            let location = decision.location()?;
            let response = match HeaderValue::from_str(&location) {
                Ok(value) => (StatusCode::TEMPORARY_REDIRECT, [(LOCATION, value)]).into_response(),
                Err(e) => {
                    tracing::error!(%location, "redirect target is not a valid header value: {}", e);
                    StatusCode::INTERNAL_SERVER_ERROR.into_response()
                }
            };
            Some(response)
        }
    }
}

/// Appends one `Set-Cookie` header per mutation, keeping existing ones.
pub fn append_set_cookies(response: &mut Response, mutations: &[CookieMutation]) {
    let headers = response.headers_mut();
    for mutation in mutations {
        match HeaderValue::from_str(&mutation.to_header_value()) {
            Ok(value) => {
                headers.append(SET_COOKIE, value);
            }
            Err(e) => tracing::warn!(
                cookie = %mutation.name(),
                "dropping cookie with invalid header value: {}",
                e
            ),
        }
    }
}
