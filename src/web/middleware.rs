//! The request-pipeline hook.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;

use crate::filter::AccessFilter;

use super::{append_set_cookies, describe_request, refresh_request_cookies, short_circuit};

/// Middleware running the access filter before every handler.
///
/// Paths are normalized before matching. Paths outside the filter's trigger
/// set pass straight through. For the
/// rest, the decision either short-circuits (redirect or 401) or lets the
/// request continue with its `Cookie` header refreshed. Cookie writes from
/// session resolution are attached to the outgoing response on every branch.
///
/// Install with `axum::middleware::from_fn_with_state(filter, enforce_access)`.
pub async fn enforce_access(
    State(filter): State<AccessFilter>,
    mut request: Request,
    next: Next,
) -> Response {
    let descriptor = describe_request(&request);
    if !filter.applies_to(descriptor.path()) {
        return next.run(request).await;
    }

    let evaluation = filter.evaluate(&descriptor).await;

    let mut response = match short_circuit(&evaluation.decision) {
        Some(response) => response,
        None => {
            refresh_request_cookies(request.headers_mut(), &evaluation.mutations);
            next.run(request).await
        }
    };

    append_set_cookies(&mut response, &evaluation.mutations);
    response
}
