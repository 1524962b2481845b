use serde::{Deserialize, Serialize};
use strum::Display;

use crate::amount::Amount;

/// A freelancer's payment request as stored by the contract.
///
/// Values are never edited locally; a refresh replaces the whole list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub title: String,
    pub amount: Amount,
    /// `true` while the request waits for the employer's approval.
    pub locked: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum RequestStatus {
    Pending,
    Approved,
}

impl PaymentRequest {
    pub fn new(title: impl Into<String>, amount: Amount, locked: bool) -> Self {
        Self {
            title: title.into(),
            amount,
            locked,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.locked
    }

    pub fn status(&self) -> RequestStatus {
        if self.locked {
            RequestStatus::Pending
        } else {
            RequestStatus::Approved
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_follows_locked_flag() {
        let amount = Amount::parse_decimal("1.5").unwrap();
        let pending = PaymentRequest::new("Design logo", amount, true);
        assert!(pending.is_pending());
        assert_eq!(pending.status().to_string(), "Pending");

        let approved = PaymentRequest::new("Design logo", amount, false);
        assert!(!approved.is_pending());
        assert_eq!(approved.status(), RequestStatus::Approved);
    }
}
