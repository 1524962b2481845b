use std::sync::Arc;

use chrono::{DateTime, Utc};
use delance_core::{Account, Amount, ContractHandle, PaymentRequest, Role, ValidationFailure};

/// Everything the view renders, published as an immutable snapshot on every change.
///
/// The cached balance and request list always come from the same read pair.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub(crate) connected: bool,
    pub(crate) accounts: Vec<Account>,
    pub(crate) role: Role,
    pub(crate) employer: Option<Account>,
    pub(crate) freelancer: Option<Account>,
    pub(crate) contract: Option<Arc<dyn ContractHandle>>,
    pub(crate) balance: Amount,
    pub(crate) requests: Vec<PaymentRequest>,
    pub(crate) busy: bool,
    /// Epoch of the reconciliation still waiting for its refresh.
    pub(crate) pending_switch: Option<u64>,
    pub(crate) epoch: u64,
    pub(crate) refreshed_at: Option<DateTime<Utc>>,
}

impl SessionState {
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Accounts discovered on the last successful connect, in node order.
    pub fn accounts(&self) -> &[Account] {
        &self.accounts
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn employer_account(&self) -> Option<&Account> {
        self.employer.as_ref()
    }

    pub fn freelancer_account(&self) -> Option<&Account> {
        self.freelancer.as_ref()
    }

    /// The account `role` signs with: the first discovered account for
    /// viewers, otherwise the matching address field.
    pub fn resolved_account(&self, role: Role) -> Option<&Account> {
        match role {
            Role::Viewer => self.accounts.first(),
            Role::Employer => self.employer.as_ref(),
            Role::Freelancer => self.freelancer.as_ref(),
        }
    }

    /// Signer of the currently bound contract handle.
    pub fn bound_signer(&self) -> Option<&Account> {
        self.contract.as_ref().map(|contract| contract.signer())
    }

    pub fn balance(&self) -> Amount {
        self.balance
    }

    pub fn requests(&self) -> &[PaymentRequest] {
        &self.requests
    }

    /// Requests still awaiting approval, with their ledger index.
    pub fn pending_requests(&self) -> impl Iterator<Item = (usize, &PaymentRequest)> {
        self.requests
            .iter()
            .enumerate()
            .filter(|(_, request)| request.is_pending())
    }

    /// `true` while a write is between submission and its refresh.
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// `true` while a role switch is waiting for its refresh.
    pub fn is_switching(&self) -> bool {
        self.pending_switch.is_some()
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn refreshed_at(&self) -> Option<DateTime<Utc>> {
        self.refreshed_at
    }

    /// Starts a new reconciliation: the old handle is dropped and any result
    /// tagged with an earlier epoch becomes stale.
    pub(crate) fn begin_transition(&mut self) -> u64 {
        self.epoch += 1;
        self.contract = None;
        self.pending_switch = Some(self.epoch);
        self.epoch
    }

    pub(crate) fn apply_reads(&mut self, balance: Amount, requests: Vec<PaymentRequest>) {
        self.balance = balance;
        self.requests = requests;
        self.refreshed_at = Some(Utc::now());
    }

    /// The handle a write or manual refresh may use right now.
    pub(crate) fn usable_contract(&self) -> Result<Arc<dyn ContractHandle>, ValidationFailure> {
        if !self.connected {
            return Err(ValidationFailure::NotConnected);
        }
        if self.busy {
            return Err(ValidationFailure::Busy);
        }
        if self.pending_switch.is_some() {
            return Err(ValidationFailure::RoleSwitchPending);
        }
        self.contract
            .clone()
            .ok_or(ValidationFailure::NoSignerBound { role: self.role })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(address: &str) -> Account {
        Account::new(address).unwrap()
    }

    #[test]
    fn test_resolved_account_per_role() {
        let state = SessionState {
            accounts: vec![account("0xA"), account("0xB")],
            employer: Some(account("0xE")),
            freelancer: None,
            ..SessionState::default()
        };

        assert_eq!(state.resolved_account(Role::Viewer), Some(&account("0xA")));
        assert_eq!(state.resolved_account(Role::Employer), Some(&account("0xE")));
        assert_eq!(state.resolved_account(Role::Freelancer), None);
    }

    #[test]
    fn test_begin_transition_drops_handle() {
        let mut state = SessionState::default();
        let first = state.begin_transition();
        let second = state.begin_transition();

        assert!(second > first);
        assert_eq!(state.pending_switch, Some(second));
        assert!(state.bound_signer().is_none());
    }

    #[test]
    fn test_usable_contract_checks() {
        let mut state = SessionState::default();
        assert_eq!(
            state.usable_contract().unwrap_err(),
            ValidationFailure::NotConnected
        );

        state.connected = true;
        state.role = Role::Freelancer;
        assert_eq!(
            state.usable_contract().unwrap_err(),
            ValidationFailure::NoSignerBound {
                role: Role::Freelancer
            }
        );

        state.begin_transition();
        assert_eq!(
            state.usable_contract().unwrap_err(),
            ValidationFailure::RoleSwitchPending
        );

        state.busy = true;
        assert_eq!(state.usable_contract().unwrap_err(), ValidationFailure::Busy);
    }

    #[test]
    fn test_pending_requests_keep_ledger_index() {
        let one = Amount::parse_decimal("1").unwrap();
        let state = SessionState {
            requests: vec![
                PaymentRequest::new("Approved", one, false),
                PaymentRequest::new("Waiting", one, true),
            ],
            ..SessionState::default()
        };

        let pending: Vec<_> = state.pending_requests().map(|(i, r)| (i, r.title.as_str())).collect();
        assert_eq!(pending, vec![(1, "Waiting")]);
    }
}
