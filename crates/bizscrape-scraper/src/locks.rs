use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

/// In-process registry of business ids with a run in flight.
#[derive(Debug, Clone, Default)]
pub struct RunLocks {
    active: Arc<Mutex<HashSet<String>>>,
}

impl RunLocks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims `business_id`, or returns `None` if a run already holds it.
    /// The claim is released when the returned guard is dropped.
    #[must_use]
    pub fn try_acquire(&self, business_id: &str) -> Option<RunGuard> {
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        if !active.insert(business_id.to_string()) {
            return None;
        }
        Some(RunGuard {
            active: Arc::clone(&self.active),
            business_id: business_id.to_string(),
        })
    }

    #[must_use]
    pub fn is_running(&self, business_id: &str) -> bool {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(business_id)
    }
}

#[derive(Debug)]
pub struct RunGuard {
    active: Arc<Mutex<HashSet<String>>>,
    business_id: String,
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.business_id);
    }
}
