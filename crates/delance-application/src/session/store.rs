//! Single-owner session store.
//!
//! All mutations go through the store and are published to subscribers as a
//! whole snapshot. Each mutation runs synchronously under the channel's lock,
//! so a check and the write that depends on it cannot interleave with
//! another task.

use delance_core::{DelanceError, Result};
use tokio::sync::watch;

use super::state::SessionState;

pub(crate) struct SessionStore {
    tx: watch::Sender<SessionState>,
}

impl SessionStore {
    pub(crate) fn new() -> Self {
        Self {
            tx: watch::Sender::new(SessionState::default()),
        }
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.tx.subscribe()
    }

    pub(crate) fn snapshot(&self) -> SessionState {
        self.tx.borrow().clone()
    }

    /// Reads the current state without publishing.
    pub(crate) fn read<R>(&self, f: impl FnOnce(&SessionState) -> R) -> R {
        f(&self.tx.borrow())
    }

    pub(crate) fn modify(&self, f: impl FnOnce(&mut SessionState)) {
        self.tx.send_modify(f);
    }

    /// Applies `f` and publishes only when it succeeds.
    ///
    /// `f` must not touch the state before its last fallible check.
    pub(crate) fn try_modify<R>(
        &self,
        f: impl FnOnce(&mut SessionState) -> Result<R>,
    ) -> Result<R> {
        let mut outcome = Err(DelanceError::internal("session store update was not applied"));
        self.tx.send_if_modified(|state| {
            outcome = f(state);
            outcome.is_ok()
        });
        outcome
    }

    /// Applies `f` only if no newer reconciliation or write started since `epoch`.
    ///
    /// Returns whether it was applied.
    pub(crate) fn modify_if_current(&self, epoch: u64, f: impl FnOnce(&mut SessionState)) -> bool {
        self.tx.send_if_modified(|state| {
            if state.epoch != epoch {
                return false;
            }
            f(state);
            true
        })
    }
}

/// Clears the busy flag when dropped, whichever way the write ends.
pub(crate) struct BusyGuard<'a> {
    store: &'a SessionStore,
}

impl<'a> BusyGuard<'a> {
    /// The flag must already be set, in the same update that validated the write.
    pub(crate) fn new(store: &'a SessionStore) -> Self {
        Self { store }
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.store.tx.send_if_modified(|state| {
            let was_busy = state.busy;
            state.busy = false;
            was_busy
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use delance_core::{Role, ValidationFailure};

    #[test]
    fn test_try_modify_publishes_only_on_success() {
        let store = SessionStore::new();
        let mut rx = store.subscribe();

        let result: Result<()> = store.try_modify(|_| Err(ValidationFailure::Busy.into()));
        assert!(result.is_err());
        assert!(!rx.has_changed().unwrap());

        store
            .try_modify(|state| {
                state.role = Role::Employer;
                Ok(())
            })
            .unwrap();
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().role(), Role::Employer);
    }

    #[test]
    fn test_modify_if_current_ignores_stale_epoch() {
        let store = SessionStore::new();
        let stale = store.read(|state| state.epoch());
        store.modify(|state| {
            state.begin_transition();
        });

        assert!(!store.modify_if_current(stale, |state| state.connected = true));
        assert!(!store.snapshot().is_connected());

        let current = store.read(|state| state.epoch());
        assert!(store.modify_if_current(current, |state| state.connected = true));
        assert!(store.snapshot().is_connected());
    }

    #[test]
    fn test_busy_guard_clears_flag() {
        let store = SessionStore::new();
        store.modify(|state| state.busy = true);
        {
            let _guard = BusyGuard::new(&store);
            assert!(store.snapshot().is_busy());
        }
        assert!(!store.snapshot().is_busy());
    }
}
