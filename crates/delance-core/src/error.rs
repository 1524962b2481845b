//! Error types for Delance.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::amount::Amount;
use crate::role::Role;

/// A local precondition that failed before anything was sent to the ledger.
///
/// Every variant leaves the session exactly as it was.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationFailure {
    #[error("Wallet is not connected")]
    NotConnected,

    #[error("Another transaction is still being processed")]
    Busy,

    #[error("Role switch is still refreshing contract data")]
    RoleSwitchPending,

    #[error("No signer is bound for the {role} role")]
    NoSignerBound { role: Role },

    #[error("Invalid amount '{input}': {reason}")]
    InvalidAmount { input: String, reason: String },

    #[error("Amount must be greater than zero")]
    NonPositiveAmount,

    /// The message matches what the user sees in the alert.
    #[error("Requested amount exceeds contract balance. Remaining: {remaining} ETH")]
    InsufficientBalance { requested: Amount, remaining: Amount },

    #[error("Request title must not be empty")]
    EmptyTitle,

    #[error("Request index {index} is out of range ({len} requests)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Request {index} is not pending")]
    RequestNotPending { index: usize },

    #[error("Only {required} can perform this action (current role: {actual})")]
    WrongRole { required: Role, actual: Role },

    #[error("Address must not be empty")]
    EmptyAddress,
}

/// A shared error type for every Delance crate.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum DelanceError {
    /// Node unreachable or transport broken.
    #[error("Connection failure: {0}")]
    Connection(String),

    /// The node answered but exposes no accounts.
    #[error("No accounts available in the ledger node")]
    NoAccountsAvailable,

    #[error("Validation failure: {0}")]
    Validation(#[from] ValidationFailure),

    /// The ledger refused to accept the call.
    #[error("Submission rejected: {0}")]
    SubmissionRejected(String),

    /// The call was included but rolled back.
    #[error("Transaction {tx_hash} reverted: {reason}")]
    Reverted { tx_hash: String, reason: String },

    /// A read-refresh failed; the cache keeps the last known-good values.
    #[error("Refresh failed: {0}")]
    Refresh(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {message}")]
    Io { message: String },

    #[error("Serialization error: {format} - {message}")]
    Serialization { format: String, message: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse classification used by the view to decide how to surface a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    ConnectionFailure,
    ValidationFailure,
    SubmissionRejected,
    Reverted,
    RefreshFailure,
    Environment,
}

impl DelanceError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }

    pub fn submission_rejected(message: impl Into<String>) -> Self {
        Self::SubmissionRejected(message.into())
    }

    pub fn reverted(tx_hash: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Reverted {
            tx_hash: tx_hash.into(),
            reason: reason.into(),
        }
    }

    pub fn refresh(message: impl Into<String>) -> Self {
        Self::Refresh(message.into())
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Connection(_) | Self::NoAccountsAvailable => ErrorCategory::ConnectionFailure,
            Self::Validation(_) => ErrorCategory::ValidationFailure,
            Self::SubmissionRejected(_) => ErrorCategory::SubmissionRejected,
            Self::Reverted { .. } => ErrorCategory::Reverted,
            Self::Refresh(_) => ErrorCategory::RefreshFailure,
            Self::Config(_) | Self::Io { .. } | Self::Serialization { .. } | Self::Internal(_) => {
                ErrorCategory::Environment
            }
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns the validation failure, if this is one.
    pub fn as_validation(&self) -> Option<&ValidationFailure> {
        match self {
            Self::Validation(failure) => Some(failure),
            _ => None,
        }
    }

    pub fn is_connection(&self) -> bool {
        self.category() == ErrorCategory::ConnectionFailure
    }

    pub fn is_refresh(&self) -> bool {
        matches!(self, Self::Refresh(_))
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for DelanceError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<toml::de::Error> for DelanceError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::ser::Error> for DelanceError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

/// A type alias for `Result<T, DelanceError>`.
pub type Result<T> = std::result::Result<T, DelanceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_balance_message_shows_remaining() {
        let failure = ValidationFailure::InsufficientBalance {
            requested: Amount::parse_decimal("20").unwrap(),
            remaining: Amount::parse_decimal("10").unwrap(),
        };
        assert_eq!(
            failure.to_string(),
            "Requested amount exceeds contract balance. Remaining: 10.0 ETH"
        );
    }

    #[test]
    fn test_categories() {
        assert_eq!(
            DelanceError::NoAccountsAvailable.category(),
            ErrorCategory::ConnectionFailure
        );
        assert_eq!(
            DelanceError::from(ValidationFailure::Busy).category(),
            ErrorCategory::ValidationFailure
        );
        assert_eq!(
            DelanceError::reverted("0xabc", "not employer").category(),
            ErrorCategory::Reverted
        );
        assert!(DelanceError::refresh("timeout").is_refresh());
        assert!(DelanceError::connection("refused").is_connection());
    }

    #[test]
    fn test_as_validation() {
        let err = DelanceError::from(ValidationFailure::EmptyTitle);
        assert_eq!(err.as_validation(), Some(&ValidationFailure::EmptyTitle));
        assert!(DelanceError::internal("x").as_validation().is_none());
    }

    #[test]
    fn test_wrong_role_message() {
        let failure = ValidationFailure::WrongRole {
            required: Role::Employer,
            actual: Role::Viewer,
        };
        assert_eq!(
            failure.to_string(),
            "Only employer can perform this action (current role: viewer)"
        );
    }
}
