use std::sync::{Mutex, MutexGuard, PoisonError};

use super::AccessEvent;

/// In-memory, thread-safe recorder for access events.
///
/// Shared between concurrent requests through an `Arc`. Recording never
/// fails: a poisoned lock is recovered, since the stored events are plain
/// data.
///
/// # Example
///
/// ```
/// use storefront_gate::audit::{AccessEvent, AccessOutcome, AuditTrail};
///
/// let trail = AuditTrail::new();
/// trail.record(AccessEvent::new(
///     "req-1",
///     Some("admin@toko.id"),
///     "GET",
///     "/admin/dashboard",
///     AccessOutcome::Allowed,
/// ));
///
/// assert_eq!(trail.len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct AuditTrail {
    events: Mutex<Vec<AccessEvent>>,
}

impl AuditTrail {
    /// Creates an empty trail.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an event.
    pub fn record(&self, event: AccessEvent) {
        self.lock().push(event);
    }

    /// Snapshot of all events in recording order.
    pub fn events(&self) -> Vec<AccessEvent> {
        self.lock().clone()
    }

    /// Number of recorded events.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns true if nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Drops all recorded events.
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, Vec<AccessEvent>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
