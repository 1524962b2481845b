use std::sync::Arc;

use delance_core::config::SessionConfig;
use delance_core::{Account, DelanceError, LedgerClient, Result, Role, ValidationFailure};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::refresh;
use super::state::SessionState;
use super::store::SessionStore;

/// Role-scoped session over a Delance contract.
///
/// `SessionService` is responsible for:
/// - Connecting to the ledger and discovering accounts
/// - Keeping the bound signer in line with the active role
/// - Refreshing the cached balance and request list
/// - Serializing writes (see the dispatcher methods)
///
/// The view observes it through [`SessionService::subscribe`] and never
/// mutates the state directly.
pub struct SessionService {
    pub(super) ledger: Arc<dyn LedgerClient>,
    pub(super) store: SessionStore,
    pub(super) config: SessionConfig,
}

impl SessionService {
    /// Creates an unconnected session.
    ///
    /// # Arguments
    ///
    /// * `ledger` - The ledger the session binds its contract handles through
    /// * `config` - Refresh retry policy
    pub fn new(ledger: Arc<dyn LedgerClient>, config: SessionConfig) -> Self {
        Self {
            ledger,
            store: SessionStore::new(),
            config,
        }
    }

    /// Returns a receiver that sees every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.store.subscribe()
    }

    pub fn snapshot(&self) -> SessionState {
        self.store.snapshot()
    }

    /// Discovers the node's accounts and starts a fresh session as viewer.
    ///
    /// The employer address defaults to the first account and the freelancer
    /// address to the second one, if any. Calling this again reconnects.
    ///
    /// # Errors
    ///
    /// - `Connection` / `NoAccountsAvailable` when discovery fails; the
    ///   previous state is kept
    /// - `Validation(Busy)` while a write is in flight
    /// - `Refresh` when the initial read fails; the session stays connected
    ///   and keeps the balance and requests from the last successful read
    pub async fn connect(&self) -> Result<()> {
        self.store.read(|state| {
            if state.busy {
                return Err(DelanceError::from(ValidationFailure::Busy));
            }
            Ok(())
        })?;

        let accounts = match self.ledger.discover_accounts().await {
            Ok(accounts) => accounts,
            Err(e) => {
                warn!("Wallet connect failed: {}", e);
                return Err(e);
            }
        };
        info!("Connected with {} accounts", accounts.len());

        let epoch = self.store.try_modify(|state| {
            if state.busy {
                return Err(ValidationFailure::Busy.into());
            }
            state.connected = true;
            state.role = Role::Viewer;
            state.employer = accounts.first().cloned();
            state.freelancer = accounts.get(1).cloned();
            state.accounts = accounts;
            Ok(state.begin_transition())
        })?;

        self.reconcile(epoch).await
    }

    /// Switches the active role and rebinds the signer for it.
    ///
    /// Allowed while an earlier switch is still refreshing; that switch's
    /// results are then discarded.
    ///
    /// # Errors
    ///
    /// - `Validation(NotConnected | Busy)` before anything changes
    /// - Binding or refresh failures for the new signer
    pub async fn select_role(&self, role: Role) -> Result<()> {
        let epoch = self.store.try_modify(|state| {
            if !state.connected {
                return Err(ValidationFailure::NotConnected.into());
            }
            if state.busy {
                return Err(ValidationFailure::Busy.into());
            }
            state.role = role;
            Ok(state.begin_transition())
        })?;

        info!("Switching to {} role", role);
        self.reconcile(epoch).await
    }

    /// Updates the employer address field.
    ///
    /// A blank input clears it. Rebinds when the employer role is active.
    pub async fn set_employer_account(&self, input: &str) -> Result<()> {
        self.set_account(Role::Employer, Account::from_input(input))
            .await
    }

    /// Updates the freelancer address field.
    ///
    /// A blank input clears it. Rebinds when the freelancer role is active.
    pub async fn set_freelancer_account(&self, input: &str) -> Result<()> {
        self.set_account(Role::Freelancer, Account::from_input(input))
            .await
    }

    async fn set_account(&self, role: Role, account: Option<Account>) -> Result<()> {
        let epoch = self.store.try_modify(|state| {
            let rebind = state.connected && state.role == role;
            if rebind && state.busy {
                return Err(ValidationFailure::Busy.into());
            }
            match role {
                Role::Employer => state.employer = account,
                Role::Freelancer => state.freelancer = account,
                Role::Viewer => {}
            }
            Ok(rebind.then(|| state.begin_transition()))
        })?;

        match epoch {
            Some(epoch) => self.reconcile(epoch).await,
            None => Ok(()),
        }
    }

    /// Re-reads balance and requests through the bound handle.
    ///
    /// # Errors
    ///
    /// - `Validation` when not connected, busy, switching, or without a signer
    /// - `Refresh` when the reads fail; the cache is kept
    ///
    /// Each call takes a new epoch, so of two overlapping refreshes only the
    /// one started last can land.
    pub async fn refresh(&self) -> Result<()> {
        let (contract, epoch) = self.store.try_modify(|state| {
            let contract = state.usable_contract()?;
            state.epoch += 1;
            Ok((contract, state.epoch))
        })?;

        let reads = refresh::read_pair(contract.as_ref(), &self.config).await?;
        let applied = self.store.modify_if_current(epoch, |state| {
            state.apply_reads(reads.balance, reads.requests);
        });
        if !applied {
            debug!("Manual refresh superseded, result discarded");
        }
        Ok(())
    }

    /// Binds the signer implied by the current role and refreshes through it.
    ///
    /// Every state change is conditional on `epoch` still being current, so
    /// a reconciliation overtaken by a newer one leaves no trace.
    async fn reconcile(&self, epoch: u64) -> Result<()> {
        let target = self.store.read(|state| {
            (state.epoch == epoch).then(|| (state.role, state.resolved_account(state.role).cloned()))
        });
        let Some((role, account)) = target else {
            return Ok(());
        };

        let Some(account) = account else {
            self.store.modify_if_current(epoch, |state| state.pending_switch = None);
            info!("No account for {} role, rebind deferred", role);
            return Ok(());
        };

        let contract = match self.ledger.bind_signer(&account).await {
            Ok(contract) => contract,
            Err(e) => {
                self.store.modify_if_current(epoch, |state| state.pending_switch = None);
                warn!("Failed to bind {} as {}: {}", account, role, e);
                return Err(e);
            }
        };

        let installed = self.store.modify_if_current(epoch, |state| {
            state.contract = Some(Arc::clone(&contract));
        });
        if !installed {
            debug!("Handle for {} superseded before install", account);
            return Ok(());
        }
        info!("Bound {} as {}", account, role);

        match refresh::read_pair(contract.as_ref(), &self.config).await {
            Ok(reads) => {
                let applied = self.store.modify_if_current(epoch, |state| {
                    state.apply_reads(reads.balance, reads.requests);
                    state.pending_switch = None;
                });
                if !applied {
                    warn!("Discarded late refresh for abandoned {} role", role);
                }
                Ok(())
            }
            Err(e) => {
                let current = self.store.modify_if_current(epoch, |state| {
                    state.pending_switch = None;
                });
                if current {
                    Err(e)
                } else {
                    Ok(())
                }
            }
        }
    }
}
