//! Serialized contract writes.
//!
//! Each write follows the same protocol: validate against the cached state and
//! mark the session busy in one update, submit, wait for the outcome, and on
//! confirmation replace balance and requests from one fresh read pair. Nothing
//! in the cache changes on any other path.

use delance_core::{
    Amount, Confirmation, ContractHandle, DelanceError, LedgerCall, PendingTransaction, Result,
    Role, TxOutcome, ValidationFailure,
};
use tracing::{info, warn};

use super::refresh;
use super::service::SessionService;
use super::state::SessionState;
use super::store::BusyGuard;

impl SessionService {
    /// Submits `createRequest(title, amount)` with a decimal amount such as `"1.5"`.
    ///
    /// # Errors
    ///
    /// - `Validation(EmptyTitle | InvalidAmount | NonPositiveAmount)` for bad input
    /// - `Validation(InsufficientBalance)` when the amount exceeds the cached
    ///   balance; nothing is submitted
    /// - `SubmissionRejected` / `Reverted` from the ledger
    pub async fn create_request(&self, title: &str, amount: &str) -> Result<Confirmation> {
        let title = title.trim().to_string();
        let parsed = Amount::parse_decimal(amount);

        self.dispatch(move |state| {
            if title.is_empty() {
                return Err(ValidationFailure::EmptyTitle);
            }
            let amount = parsed?;
            if amount.is_zero() {
                return Err(ValidationFailure::NonPositiveAmount);
            }
            if amount > state.balance() {
                return Err(ValidationFailure::InsufficientBalance {
                    requested: amount,
                    remaining: state.balance(),
                });
            }
            Ok(LedgerCall::CreateRequest { title, amount })
        })
        .await
    }

    /// Submits `approveRequest(index)` for a pending request.
    ///
    /// # Errors
    ///
    /// - `Validation(IndexOutOfRange | RequestNotPending)`; nothing is submitted
    /// - `SubmissionRejected` / `Reverted` from the ledger
    pub async fn approve_request(&self, index: usize) -> Result<Confirmation> {
        self.dispatch(move |state| {
            let len = state.requests().len();
            let request = state
                .requests()
                .get(index)
                .ok_or(ValidationFailure::IndexOutOfRange { index, len })?;
            if !request.is_pending() {
                return Err(ValidationFailure::RequestNotPending { index });
            }
            Ok(LedgerCall::ApproveRequest { index })
        })
        .await
    }

    /// Submits `setFreelancer` with the freelancer address field.
    ///
    /// # Errors
    ///
    /// - `Validation(WrongRole)` unless the employer role is active
    /// - `Validation(EmptyAddress)` when the freelancer field is blank
    pub async fn set_freelancer_on_chain(&self) -> Result<Confirmation> {
        self.dispatch(|state| {
            if state.role() != Role::Employer {
                return Err(ValidationFailure::WrongRole {
                    required: Role::Employer,
                    actual: state.role(),
                });
            }
            let freelancer = state
                .freelancer_account()
                .cloned()
                .ok_or(ValidationFailure::EmptyAddress)?;
            Ok(LedgerCall::SetFreelancer { freelancer })
        })
        .await
    }

    async fn dispatch<F>(&self, prepare: F) -> Result<Confirmation>
    where
        F: FnOnce(&SessionState) -> std::result::Result<LedgerCall, ValidationFailure>,
    {
        let (contract, call) = self.store.try_modify(|state| {
            let contract = state.usable_contract()?;
            let call = prepare(&*state)?;
            state.busy = true;
            // Invalidates any manual refresh still in flight.
            state.epoch += 1;
            Ok((contract, call))
        })?;
        let _busy = BusyGuard::new(&self.store);

        let pending = match submit(contract.as_ref(), &call).await {
            Ok(pending) => pending,
            Err(e) => {
                warn!("{} rejected: {}", call, e);
                return Err(e);
            }
        };

        match self.ledger.await_confirmation(&pending).await? {
            TxOutcome::Reverted { tx_hash, reason } => {
                warn!("{} reverted: {}", call, reason);
                Err(DelanceError::reverted(tx_hash, reason))
            }
            TxOutcome::Confirmed(confirmation) => {
                info!("{} confirmed in {}", call, confirmation.tx_hash);
                let reads = refresh::read_pair(contract.as_ref(), &self.config).await?;
                self.store.modify(|state| {
                    state.apply_reads(reads.balance, reads.requests);
                    state.busy = false;
                });
                Ok(confirmation)
            }
        }
    }
}

async fn submit(contract: &dyn ContractHandle, call: &LedgerCall) -> Result<PendingTransaction> {
    match call {
        LedgerCall::CreateRequest { title, amount } => {
            contract.submit_create_request(title, *amount).await
        }
        LedgerCall::ApproveRequest { index } => contract.submit_approve_request(*index).await,
        LedgerCall::SetFreelancer { freelancer } => contract.submit_set_freelancer(freelancer).await,
    }
}
