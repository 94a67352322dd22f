//! Process-wide holder of the current session's policy.

use crate::{PolicySnapshot, Session};
use std::sync::{PoisonError, RwLock};
use tracing::debug;

/// Holds the statements granted to the current session.
///
/// Replaced wholesale on login and emptied on logout or session expiry.
/// Readers take a [`PolicySnapshot`] and evaluate against it without
/// holding any lock.
#[derive(Debug, Default)]
pub struct PolicyCache {
    current: RwLock<PolicySnapshot>,
}

impl PolicyCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace whatever is cached with `session`.
    pub fn load(&self, session: Session) {
        debug!(
            identity = session.identity(),
            statements = session.len(),
            "loading session policy"
        );
        let snapshot = PolicySnapshot::of(session);
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = snapshot;
    }

    pub fn clear(&self) {
        debug!("clearing session policy");
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = PolicySnapshot::empty();
    }

    /// Current snapshot. Never panics, even if a writer panicked.
    pub fn get(&self) -> PolicySnapshot {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
