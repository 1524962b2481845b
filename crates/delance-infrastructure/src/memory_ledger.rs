//! In-process simulation of the Delance contract.
//!
//! Models the contract rules (employer-only approval and freelancer
//! assignment, freelancer-only requests bounded by the escrow balance) so the
//! REPL can run without a node and the session logic can be exercised in
//! tests. Calls are checked at submission, like gas estimation on a real node,
//! and executed at confirmation, where they may still revert.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use delance_core::{
    Account, Amount, Confirmation, ContractHandle, DelanceError, LedgerCall, LedgerClient,
    PaymentRequest, PendingTransaction, Result, TxOutcome,
};
use tokio::sync::{Mutex, watch};
use tracing::{debug, info};

/// Well-known development accounts used by `--simulate`.
pub const DEMO_ACCOUNTS: [&str; 3] = [
    "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266",
    "0x70997970C51812dc3A010C7d01b50e0d17dc79C8",
    "0x3C44CdDdB6a900fa2b585dd299e03d12FA4293BC",
];

#[derive(Clone)]
pub struct InMemoryLedger {
    shared: Arc<Shared>,
}

struct Shared {
    state: Mutex<ContractState>,
    /// `true` while confirmations are held back.
    confirmations_held: watch::Sender<bool>,
    /// Signers whose reads are held back.
    held_readers: watch::Sender<HashSet<Account>>,
}

struct ContractState {
    accounts: Vec<Account>,
    employer: Option<Account>,
    freelancer: Option<Account>,
    balance: Amount,
    requests: Vec<PaymentRequest>,
    in_flight: HashMap<String, PendingTransaction>,
    next_tx: u64,
    block_number: u64,
    submissions: usize,
    failing_reads: u32,
    unreachable: bool,
}

impl InMemoryLedger {
    /// Deploys a simulated contract.
    ///
    /// The first account is the employer (deployer), the second one, if any,
    /// the initial freelancer. An empty account list models a node without
    /// accounts.
    pub fn new(accounts: Vec<Account>, balance: Amount) -> Self {
        let employer = accounts.first().cloned();
        let freelancer = accounts.get(1).cloned();

        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(ContractState {
                    accounts,
                    employer,
                    freelancer,
                    balance,
                    requests: Vec::new(),
                    in_flight: HashMap::new(),
                    next_tx: 1,
                    block_number: 0,
                    submissions: 0,
                    failing_reads: 0,
                    unreachable: false,
                }),
                confirmations_held: watch::Sender::new(false),
                held_readers: watch::Sender::new(HashSet::new()),
            }),
        }
    }

    /// Three development accounts and the given escrow balance.
    pub fn demo(balance: Amount) -> Self {
        let accounts = DEMO_ACCOUNTS
            .iter()
            .filter_map(|address| Account::from_input(address))
            .collect();
        Self::new(accounts, balance)
    }

    pub async fn balance(&self) -> Amount {
        self.shared.state.lock().await.balance
    }

    pub async fn requests(&self) -> Vec<PaymentRequest> {
        self.shared.state.lock().await.requests.clone()
    }

    pub async fn freelancer(&self) -> Option<Account> {
        self.shared.state.lock().await.freelancer.clone()
    }

    /// Number of calls that reached the ledger, accepted or not.
    pub async fn submission_count(&self) -> usize {
        self.shared.state.lock().await.submissions
    }

    /// Makes the next `count` contract reads fail.
    pub async fn fail_next_reads(&self, count: u32) {
        self.shared.state.lock().await.failing_reads = count;
    }

    /// Simulates the node going away (or coming back).
    pub async fn set_unreachable(&self, unreachable: bool) {
        self.shared.state.lock().await.unreachable = unreachable;
    }

    /// Keeps every pending transaction unconfirmed until released.
    pub fn hold_confirmations(&self) {
        self.shared.confirmations_held.send_replace(true);
    }

    pub fn release_confirmations(&self) {
        self.shared.confirmations_held.send_replace(false);
    }

    /// Overrides the escrow balance, as an outside deposit or payout would.
    pub async fn set_balance(&self, balance: Amount) {
        self.shared.state.lock().await.balance = balance;
    }

    /// Holds back read results for handles bound to `signer`.
    ///
    /// Values are taken when the read is issued, so a held read delivers
    /// whatever the contract held at that moment.
    pub fn hold_reads_for(&self, signer: &Account) {
        self.shared.held_readers.send_modify(|held| {
            held.insert(signer.clone());
        });
    }

    pub fn release_reads_for(&self, signer: &Account) {
        self.shared.held_readers.send_modify(|held| {
            held.remove(signer);
        });
    }
}

impl Shared {
    async fn ensure_reachable(&self) -> Result<()> {
        if self.state.lock().await.unreachable {
            return Err(DelanceError::connection("simulated node is unreachable"));
        }
        Ok(())
    }

    async fn begin_read(&self, what: &str) -> Result<()> {
        let mut state = self.state.lock().await;
        if state.unreachable {
            return Err(DelanceError::refresh(format!("{}: node unreachable", what)));
        }
        if state.failing_reads > 0 {
            state.failing_reads -= 1;
            return Err(DelanceError::refresh(format!("{}: simulated read failure", what)));
        }
        Ok(())
    }

    /// Waits until results for `signer` may be delivered.
    async fn deliver(&self, signer: &Account) -> Result<()> {
        let mut held = self.held_readers.subscribe();
        held.wait_for(|held| !held.contains(signer))
            .await
            .map_err(|_| DelanceError::internal("simulated ledger shut down"))?;
        Ok(())
    }

    async fn submit(&self, signer: &Account, call: LedgerCall) -> Result<PendingTransaction> {
        let mut state = self.state.lock().await;
        state.submissions += 1;
        if state.unreachable {
            return Err(DelanceError::connection("simulated node is unreachable"));
        }
        if !state.accounts.iter().any(|account| account.same_address(signer)) {
            return Err(DelanceError::submission_rejected(format!(
                "Account {} is not managed by the node",
                signer
            )));
        }
        state
            .check(signer, &call)
            .map_err(DelanceError::submission_rejected)?;

        let tx_hash = format!("0x{:064x}", state.next_tx);
        state.next_tx += 1;
        let pending = PendingTransaction {
            tx_hash: tx_hash.clone(),
            signer: signer.clone(),
            call,
        };
        state.in_flight.insert(tx_hash, pending.clone());
        info!("Simulated submit of {} as {}", pending.call, pending.tx_hash);
        Ok(pending)
    }
}

impl ContractState {
    fn is_employer(&self, signer: &Account) -> bool {
        self.employer
            .as_ref()
            .is_some_and(|employer| employer.same_address(signer))
    }

    /// Applies the contract's `require` checks without mutating anything.
    fn check(&self, signer: &Account, call: &LedgerCall) -> std::result::Result<(), String> {
        match call {
            LedgerCall::CreateRequest { amount, .. } => {
                let is_freelancer = self
                    .freelancer
                    .as_ref()
                    .is_some_and(|freelancer| freelancer.same_address(signer));
                if !is_freelancer {
                    return Err("Only freelancer can create requests".to_string());
                }
                if *amount > self.balance {
                    return Err("Amount exceeds contract balance".to_string());
                }
                Ok(())
            }
            LedgerCall::ApproveRequest { index } => {
                if !self.is_employer(signer) {
                    return Err("Only employer can approve requests".to_string());
                }
                let request = self
                    .requests
                    .get(*index)
                    .ok_or_else(|| "Request does not exist".to_string())?;
                if !request.locked {
                    return Err("Request already approved".to_string());
                }
                if request.amount > self.balance {
                    return Err("Insufficient contract balance".to_string());
                }
                Ok(())
            }
            LedgerCall::SetFreelancer { .. } => {
                if !self.is_employer(signer) {
                    return Err("Only employer can set freelancer".to_string());
                }
                Ok(())
            }
        }
    }

    fn apply(&mut self, call: &LedgerCall) {
        match call {
            LedgerCall::CreateRequest { title, amount } => {
                self.requests
                    .push(PaymentRequest::new(title.clone(), *amount, true));
            }
            LedgerCall::ApproveRequest { index } => {
                if let Some(request) = self.requests.get_mut(*index) {
                    request.locked = false;
                    self.balance = self
                        .balance
                        .checked_sub(request.amount)
                        .unwrap_or(Amount::ZERO);
                }
            }
            LedgerCall::SetFreelancer { freelancer } => {
                self.freelancer = Some(freelancer.clone());
            }
        }
    }
}

#[async_trait]
impl LedgerClient for InMemoryLedger {
    async fn discover_accounts(&self) -> Result<Vec<Account>> {
        self.shared.ensure_reachable().await?;
        let accounts = self.shared.state.lock().await.accounts.clone();
        if accounts.is_empty() {
            return Err(DelanceError::NoAccountsAvailable);
        }
        Ok(accounts)
    }

    async fn bind_signer(&self, account: &Account) -> Result<Arc<dyn ContractHandle>> {
        self.shared.ensure_reachable().await?;
        debug!("Binding simulated handle to {}", account);
        Ok(Arc::new(MemoryContractHandle {
            shared: Arc::clone(&self.shared),
            signer: account.clone(),
        }))
    }

    async fn await_confirmation(&self, tx: &PendingTransaction) -> Result<TxOutcome> {
        let mut held = self.shared.confirmations_held.subscribe();
        held.wait_for(|held| !*held)
            .await
            .map_err(|_| DelanceError::internal("simulated ledger shut down"))?;

        let mut state = self.shared.state.lock().await;
        let pending = state.in_flight.remove(&tx.tx_hash).ok_or_else(|| {
            DelanceError::internal(format!("Unknown transaction {}", tx.tx_hash))
        })?;

        state.block_number += 1;
        if let Err(reason) = state.check(&pending.signer, &pending.call) {
            return Ok(TxOutcome::Reverted {
                tx_hash: pending.tx_hash,
                reason,
            });
        }
        state.apply(&pending.call);

        Ok(TxOutcome::Confirmed(Confirmation {
            tx_hash: pending.tx_hash,
            block_number: Some(state.block_number),
        }))
    }
}

struct MemoryContractHandle {
    shared: Arc<Shared>,
    signer: Account,
}

impl fmt::Debug for MemoryContractHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryContractHandle")
            .field("signer", &self.signer)
            .finish()
    }
}

#[async_trait]
impl ContractHandle for MemoryContractHandle {
    fn signer(&self) -> &Account {
        &self.signer
    }

    async fn read_balance(&self) -> Result<Amount> {
        self.shared.begin_read("getContractBalance").await?;
        let balance = self.shared.state.lock().await.balance;
        self.shared.deliver(&self.signer).await?;
        Ok(balance)
    }

    async fn read_all_requests(&self) -> Result<Vec<PaymentRequest>> {
        self.shared.begin_read("getAllRequests").await?;
        let requests = self.shared.state.lock().await.requests.clone();
        self.shared.deliver(&self.signer).await?;
        Ok(requests)
    }

    async fn submit_create_request(
        &self,
        title: &str,
        amount: Amount,
    ) -> Result<PendingTransaction> {
        self.shared
            .submit(
                &self.signer,
                LedgerCall::CreateRequest {
                    title: title.to_string(),
                    amount,
                },
            )
            .await
    }

    async fn submit_approve_request(&self, index: usize) -> Result<PendingTransaction> {
        self.shared
            .submit(&self.signer, LedgerCall::ApproveRequest { index })
            .await
    }

    async fn submit_set_freelancer(&self, freelancer: &Account) -> Result<PendingTransaction> {
        self.shared
            .submit(
                &self.signer,
                LedgerCall::SetFreelancer {
                    freelancer: freelancer.clone(),
                },
            )
            .await
    }
}
