//! Ledger client interfaces.
//!
//! The contract and the node are external collaborators. These traits describe
//! the call surface the session consumes, decoupling it from the transport
//! (JSON-RPC node, in-process simulation, test doubles).

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::account::Account;
use crate::amount::Amount;
use crate::error::Result;
use crate::request::PaymentRequest;

/// The state-changing contract call carried by a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum LedgerCall {
    CreateRequest { title: String, amount: Amount },
    ApproveRequest { index: usize },
    SetFreelancer { freelancer: Account },
}

impl fmt::Display for LedgerCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LedgerCall::CreateRequest { title, amount } => {
                write!(f, "createRequest(\"{title}\", {amount} ETH)")
            }
            LedgerCall::ApproveRequest { index } => write!(f, "approveRequest({index})"),
            LedgerCall::SetFreelancer { freelancer } => write!(f, "setFreelancer({freelancer})"),
        }
    }
}

/// A submitted write awaiting inclusion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingTransaction {
    pub tx_hash: String,
    pub signer: Account,
    pub call: LedgerCall,
}

/// Proof that a transaction was included and succeeded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Confirmation {
    pub tx_hash: String,
    pub block_number: Option<u64>,
}

/// Terminal outcome of a pending transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxOutcome {
    Confirmed(Confirmation),
    /// Included but rolled back; carries the ledger's reason.
    Reverted { tx_hash: String, reason: String },
}

/// A contract handle bound to one signer.
///
/// All reads and writes issued through a handle are authorized by
/// [`ContractHandle::signer`]. Handles are replaced, never rebound.
#[async_trait]
pub trait ContractHandle: Send + Sync + fmt::Debug {
    /// The account every call through this handle is signed with.
    fn signer(&self) -> &Account;

    /// `getContractBalance()`. Side-effect free.
    async fn read_balance(&self) -> Result<Amount>;

    /// `getAllRequests()`, in ledger (creation) order. Side-effect free.
    async fn read_all_requests(&self) -> Result<Vec<PaymentRequest>>;

    /// Enqueues `createRequest(title, amount)`.
    ///
    /// # Errors
    ///
    /// `SubmissionRejected` when the signer is not authorized or the call is malformed.
    async fn submit_create_request(
        &self,
        title: &str,
        amount: Amount,
    ) -> Result<PendingTransaction>;

    /// Enqueues `approveRequest(index)`.
    async fn submit_approve_request(&self, index: usize) -> Result<PendingTransaction>;

    /// Enqueues `setFreelancer(account)`.
    async fn submit_set_freelancer(&self, freelancer: &Account) -> Result<PendingTransaction>;
}

/// Connection to a ledger node.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Lists the node's accounts in node order.
    ///
    /// # Errors
    ///
    /// - `NoAccountsAvailable` when the node exposes none
    /// - `Connection` when the node cannot be reached
    async fn discover_accounts(&self) -> Result<Vec<Account>>;

    /// Returns a contract handle whose calls are signed by `account`.
    ///
    /// Binding the same account twice yields observably equivalent handles.
    async fn bind_signer(&self, account: &Account) -> Result<Arc<dyn ContractHandle>>;

    /// Suspends until `tx` is included. There is no timeout.
    async fn await_confirmation(&self, tx: &PendingTransaction) -> Result<TxOutcome>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_call_display() {
        let call = LedgerCall::CreateRequest {
            title: "Design logo".to_string(),
            amount: Amount::parse_decimal("1.5").unwrap(),
        };
        assert_eq!(call.to_string(), "createRequest(\"Design logo\", 1.5 ETH)");
        assert_eq!(
            LedgerCall::ApproveRequest { index: 0 }.to_string(),
            "approveRequest(0)"
        );
    }
}
