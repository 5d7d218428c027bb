//! Access audit trail.
//!
//! Every request the filter evaluates produces an [`AccessEvent`]. Events are
//! always emitted through `tracing`; an [`AuditTrail`] can additionally be
//! attached to keep them in memory (tests, admin diagnostics).
//!
//! Events hold only the path, method, outcome and principal email. Cookie
//! values and tokens never reach them.

mod event;
mod trail;

pub use event::{AccessEvent, AccessOutcome};
pub use trail::AuditTrail;
