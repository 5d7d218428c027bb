//! axum integration.
//!
//! This module is the boundary between HTTP and the access filter:
//! - [`describe_request`] maps an incoming request onto a [`RequestDescriptor`](crate::RequestDescriptor)
//! - [`enforce_access`] is the middleware that runs the filter
//! - [`short_circuit`] and [`append_set_cookies`] turn an
//!   [`Evaluation`](crate::Evaluation) into an HTTP response
//!
//! Policy and transport shaping stay separate: the filter only returns a
//! decision and cookie writes, and this module decides what bytes go out.
//!
//! # Example
//!
//! ```ignore
//! let config = GateConfig::from_env()?;
//! let resolver = Arc::new(config.token_resolver()?);
//! let filter = AccessFilter::new(RouteTable::new(config.routes), resolver);
//!
//! let app = Router::new()
//!     .route("/admin/dashboard", get(dashboard))
//!     .route("/api/products", get(list_products).post(create_product))
//!     .layer(axum::middleware::from_fn_with_state(filter, enforce_access));
//! ```

mod adapter;
mod middleware;
mod response;

pub use adapter::{describe_request, normalize_path, refresh_request_cookies, REQUEST_ID_HEADER};
pub use middleware::enforce_access;
pub use response::{append_set_cookies, short_circuit, unauthorized};
