//! One-shot invalidation signal for the published route table.

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Notify;

/// Fires exactly once, when the table generation it belongs to is superseded.
///
/// Holders re-fetch the endpoints and the new token after it fires.
#[derive(Debug)]
pub struct ChangeToken {
    generation: u64,
    fired: AtomicBool,
    notify: Notify,
}

impl ChangeToken {
    pub(crate) fn new(generation: u64) -> Self {
        Self {
            generation,
            fired: AtomicBool::new(false),
            notify: Notify::new(),
        }
    }

    /// Generation of the table this token watches.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn has_changed(&self) -> bool {
        self.fired.load(Ordering::Acquire)
    }

    /// Resolves once the token has fired. Returns immediately if it already has.
    pub async fn changed(&self) {
        let notified = self.notify.notified();
        tokio::pin!(notified);
        notified.as_mut().enable();

        if self.has_changed() {
            return;
        }
        notified.await;
    }

    pub(crate) fn fire(&self) {
        if !self.fired.swap(true, Ordering::AcqRel) {
            self.notify.notify_waiters();
        }
    }
}
