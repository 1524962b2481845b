#![allow(dead_code)]

use std::sync::Arc;

use delance_application::SessionService;
use delance_core::config::SessionConfig;
use delance_core::{Account, Amount};
use delance_infrastructure::InMemoryLedger;
use delance_infrastructure::memory_ledger::DEMO_ACCOUNTS;

pub fn eth(value: &str) -> Amount {
    Amount::parse_decimal(value).expect("Should parse amount")
}

/// Accounts A, B and C of the simulated node.
pub fn account(index: usize) -> Account {
    Account::new(DEMO_ACCOUNTS[index]).expect("Should be a valid account")
}

pub fn fast_config() -> SessionConfig {
    SessionConfig {
        refresh_attempts: 2,
        refresh_retry_delay_ms: 0,
    }
}

/// A session over a simulated node with the given accounts and escrow balance.
pub fn session_with(accounts: Vec<Account>, balance: &str) -> (InMemoryLedger, Arc<SessionService>) {
    let ledger = InMemoryLedger::new(accounts, eth(balance));
    let service = SessionService::new(Arc::new(ledger.clone()), fast_config());
    (ledger, Arc::new(service))
}

/// Two accounts A (employer) and B (freelancer), connected as viewer.
pub async fn connected(balance: &str) -> (InMemoryLedger, Arc<SessionService>) {
    let (ledger, service) = session_with(vec![account(0), account(1)], balance);
    service.connect().await.expect("Should connect");
    (ledger, service)
}

/// Connects, then creates one request as the freelancer and switches to employer.
pub async fn with_pending_request(
    balance: &str,
    title: &str,
    amount: &str,
) -> (InMemoryLedger, Arc<SessionService>) {
    let (ledger, service) = connected(balance).await;
    service
        .select_role(delance_core::Role::Freelancer)
        .await
        .expect("Should switch to freelancer");
    service
        .create_request(title, amount)
        .await
        .expect("Should create request");
    service
        .select_role(delance_core::Role::Employer)
        .await
        .expect("Should switch to employer");
    (ledger, service)
}
