//! Ledger client backed by a JSON-RPC node.
//!
//! Transactions are sent from node-managed (unlocked) accounts with
//! `eth_sendTransaction`, so no key material lives in this process.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use alloy::network::ReceiptResponse;
use alloy::primitives::{Address, TxHash, U256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::sol;
use alloy::transports::http::reqwest::Url;
use async_trait::async_trait;
use delance_core::config::LedgerConfig;
use delance_core::{
    Account, Amount, Confirmation, ContractHandle, DelanceError, LedgerCall, LedgerClient,
    PaymentRequest, PendingTransaction, Result, TxOutcome,
};
use tracing::{debug, info, warn};

sol! {
    #[sol(rpc)]
    interface IDelance {
        struct Request {
            string title;
            uint256 amount;
            bool locked;
        }

        function getContractBalance() external view returns (uint256);
        function getAllRequests() external view returns (Request[] memory);
        function createRequest(string memory _title, uint256 _amount) external;
        function approveRequest(uint256 _index) external;
        function setFreelancer(address _freelancer) external;
    }
}

pub struct RpcLedgerClient {
    provider: DynProvider,
    contract_address: Address,
    poll_interval: Duration,
}

impl RpcLedgerClient {
    /// Builds a client for the configured node and contract.
    ///
    /// No request is made here; an unreachable node surfaces on the first call.
    pub fn connect(config: &LedgerConfig) -> Result<Self> {
        let url: Url = config.rpc_url.parse().map_err(|e| {
            DelanceError::config(format!("Invalid rpc_url '{}': {}", config.rpc_url, e))
        })?;
        let contract_address: Address = config.contract_address.parse().map_err(|e| {
            DelanceError::config(format!(
                "Invalid contract_address '{}': {}",
                config.contract_address, e
            ))
        })?;

        let provider = ProviderBuilder::new().connect_http(url).erased();
        info!(
            "Ledger client for contract {} via {}",
            contract_address, config.rpc_url
        );

        Ok(Self {
            provider,
            contract_address,
            poll_interval: config.confirmation_poll_interval(),
        })
    }

    async fn node_accounts(&self) -> Result<Vec<Address>> {
        self.provider
            .get_accounts()
            .await
            .map_err(|e| DelanceError::connection(format!("eth_accounts failed: {}", e)))
    }
}

#[async_trait]
impl LedgerClient for RpcLedgerClient {
    async fn discover_accounts(&self) -> Result<Vec<Account>> {
        let addresses = self.node_accounts().await?;
        if addresses.is_empty() {
            return Err(DelanceError::NoAccountsAvailable);
        }
        debug!("Node exposes {} accounts", addresses.len());

        addresses
            .into_iter()
            .map(|address| Account::new(address.to_checksum(None)).map_err(DelanceError::from))
            .collect()
    }

    async fn bind_signer(&self, account: &Account) -> Result<Arc<dyn ContractHandle>> {
        let signer_address = parse_address(account)?;

        // The node can only sign for accounts it manages.
        if !self.node_accounts().await?.contains(&signer_address) {
            return Err(DelanceError::submission_rejected(format!(
                "Account {} is not managed by the node",
                account
            )));
        }

        Ok(Arc::new(RpcContractHandle {
            provider: self.provider.clone(),
            contract_address: self.contract_address,
            signer: account.clone(),
            signer_address,
        }))
    }

    async fn await_confirmation(&self, tx: &PendingTransaction) -> Result<TxOutcome> {
        let hash: TxHash = tx.tx_hash.parse().map_err(|e| {
            DelanceError::internal(format!("Malformed transaction hash {}: {}", tx.tx_hash, e))
        })?;

        // Only a receipt ends the wait.
        let mut failed_polls = 0u32;
        loop {
            let receipt = match self.provider.get_transaction_receipt(hash).await {
                Ok(receipt) => receipt,
                Err(e) => {
                    failed_polls += 1;
                    warn!(
                        "Receipt poll {} for {} failed: {}; still waiting",
                        failed_polls, tx.tx_hash, e
                    );
                    tokio::time::sleep(self.poll_interval).await;
                    continue;
                }
            };

            if let Some(receipt) = receipt {
                let block_number = receipt.block_number();
                if receipt.status() {
                    return Ok(TxOutcome::Confirmed(Confirmation {
                        tx_hash: tx.tx_hash.clone(),
                        block_number,
                    }));
                }
                warn!("{} ({}) reverted", tx.call, tx.tx_hash);
                return Ok(TxOutcome::Reverted {
                    tx_hash: tx.tx_hash.clone(),
                    reason: match block_number {
                        Some(block) => format!("execution reverted in block {}", block),
                        None => "execution reverted".to_string(),
                    },
                });
            }

            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

struct RpcContractHandle {
    provider: DynProvider,
    contract_address: Address,
    signer: Account,
    signer_address: Address,
}

impl fmt::Debug for RpcContractHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RpcContractHandle")
            .field("contract_address", &self.contract_address)
            .field("signer", &self.signer)
            .finish()
    }
}

impl RpcContractHandle {
    fn pending(&self, tx_hash: TxHash, call: LedgerCall) -> PendingTransaction {
        info!("Submitted {} as {}", call, tx_hash);
        PendingTransaction {
            tx_hash: tx_hash.to_string(),
            signer: self.signer.clone(),
            call,
        }
    }
}

#[async_trait]
impl ContractHandle for RpcContractHandle {
    fn signer(&self) -> &Account {
        &self.signer
    }

    async fn read_balance(&self) -> Result<Amount> {
        let contract = IDelance::new(self.contract_address, self.provider.clone());
        let balance = contract
            .getContractBalance()
            .call()
            .await
            .map_err(|e| DelanceError::refresh(format!("getContractBalance failed: {}", e)))?;
        Ok(Amount::from_smallest_unit(balance))
    }

    async fn read_all_requests(&self) -> Result<Vec<PaymentRequest>> {
        let contract = IDelance::new(self.contract_address, self.provider.clone());
        let requests = contract
            .getAllRequests()
            .call()
            .await
            .map_err(|e| DelanceError::refresh(format!("getAllRequests failed: {}", e)))?;

        Ok(requests
            .into_iter()
            .map(|IDelance::Request { title, amount, locked }| {
                PaymentRequest::new(title, Amount::from_smallest_unit(amount), locked)
            })
            .collect())
    }

    async fn submit_create_request(
        &self,
        title: &str,
        amount: Amount,
    ) -> Result<PendingTransaction> {
        let contract = IDelance::new(self.contract_address, self.provider.clone());
        let pending = contract
            .createRequest(title.to_string(), amount.smallest_unit())
            .from(self.signer_address)
            .send()
            .await
            .map_err(|e| DelanceError::submission_rejected(format!("createRequest: {}", e)))?;

        Ok(self.pending(
            *pending.tx_hash(),
            LedgerCall::CreateRequest {
                title: title.to_string(),
                amount,
            },
        ))
    }

    async fn submit_approve_request(&self, index: usize) -> Result<PendingTransaction> {
        let contract = IDelance::new(self.contract_address, self.provider.clone());
        let pending = contract
            .approveRequest(U256::from(index))
            .from(self.signer_address)
            .send()
            .await
            .map_err(|e| DelanceError::submission_rejected(format!("approveRequest: {}", e)))?;

        Ok(self.pending(*pending.tx_hash(), LedgerCall::ApproveRequest { index }))
    }

    async fn submit_set_freelancer(&self, freelancer: &Account) -> Result<PendingTransaction> {
        let freelancer_address = parse_address(freelancer)?;
        let contract = IDelance::new(self.contract_address, self.provider.clone());
        let pending = contract
            .setFreelancer(freelancer_address)
            .from(self.signer_address)
            .send()
            .await
            .map_err(|e| DelanceError::submission_rejected(format!("setFreelancer: {}", e)))?;

        Ok(self.pending(
            *pending.tx_hash(),
            LedgerCall::SetFreelancer {
                freelancer: freelancer.clone(),
            },
        ))
    }
}

fn parse_address(account: &Account) -> Result<Address> {
    account.as_str().parse().map_err(|e| {
        DelanceError::submission_rejected(format!("Malformed address {}: {}", account, e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_rejects_bad_config() {
        let config = LedgerConfig {
            rpc_url: "not a url".to_string(),
            ..LedgerConfig::default()
        };
        assert!(matches!(
            RpcLedgerClient::connect(&config),
            Err(DelanceError::Config(_))
        ));

        let config = LedgerConfig {
            contract_address: "0x1234".to_string(),
            ..LedgerConfig::default()
        };
        assert!(matches!(
            RpcLedgerClient::connect(&config),
            Err(DelanceError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_failed_receipt_polls_keep_waiting() {
        let config = LedgerConfig {
            rpc_url: "http://127.0.0.1:1".to_string(),
            confirmation_poll_ms: 10,
            ..LedgerConfig::default()
        };
        let client = RpcLedgerClient::connect(&config).unwrap();
        let pending = PendingTransaction {
            tx_hash: format!("0x{:064x}", 1),
            signer: Account::new("0x5FbDB2315678afecb367f032d93F642f64180aa3").unwrap(),
            call: LedgerCall::ApproveRequest { index: 0 },
        };

        // Every poll fails against a closed port; the wait must outlast them.
        let outcome = tokio::time::timeout(
            Duration::from_millis(200),
            client.await_confirmation(&pending),
        )
        .await;
        assert!(outcome.is_err());
    }

    #[test]
    fn test_parse_address() {
        let account = Account::new("0x5FbDB2315678afecb367f032d93F642f64180aa3").unwrap();
        assert!(parse_address(&account).is_ok());

        let bogus = Account::new("employer").unwrap();
        assert!(matches!(
            parse_address(&bogus),
            Err(DelanceError::SubmissionRejected(_))
        ));
    }
}
