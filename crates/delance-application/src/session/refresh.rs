//! Read-refresh of the cached contract data.

use delance_core::config::SessionConfig;
use delance_core::{Amount, ContractHandle, DelanceError, PaymentRequest, Result};
use tracing::{debug, warn};

/// Balance and request list taken together from one handle.
#[derive(Debug)]
pub(crate) struct ReadPair {
    pub(crate) balance: Amount,
    pub(crate) requests: Vec<PaymentRequest>,
}

/// Reads balance and requests concurrently, retrying the pair as a unit.
///
/// # Errors
///
/// `Refresh` with the last failure once every attempt is used up.
pub(crate) async fn read_pair(
    contract: &dyn ContractHandle,
    config: &SessionConfig,
) -> Result<ReadPair> {
    let attempts = config.refresh_attempts.max(1);
    let mut attempt = 1;

    loop {
        match futures::try_join!(contract.read_balance(), contract.read_all_requests()) {
            Ok((balance, requests)) => {
                debug!(
                    "Refreshed as {}: balance {} ETH, {} requests",
                    contract.signer(),
                    balance,
                    requests.len()
                );
                return Ok(ReadPair { balance, requests });
            }
            Err(e) if attempt < attempts => {
                warn!(
                    "Refresh attempt {}/{} failed: {}; retrying",
                    attempt, attempts, e
                );
                attempt += 1;
                tokio::time::sleep(config.refresh_retry_delay()).await;
            }
            Err(e) if e.is_refresh() => return Err(e),
            Err(e) => return Err(DelanceError::refresh(e.to_string())),
        }
    }
}
