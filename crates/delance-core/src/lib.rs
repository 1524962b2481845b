//! Domain layer for Delance.
//!
//! Holds the value types shared by every other crate (accounts, amounts, roles,
//! payment requests), the error taxonomy, the configuration model and the
//! ledger traits that the infrastructure layer implements.

pub mod account;
pub mod amount;
pub mod config;
pub mod error;
pub mod ledger;
pub mod request;
pub mod role;

pub use account::Account;
pub use amount::Amount;
pub use error::{DelanceError, ErrorCategory, Result, ValidationFailure};
pub use ledger::{Confirmation, ContractHandle, LedgerCall, LedgerClient, PendingTransaction, TxOutcome};
pub use request::{PaymentRequest, RequestStatus};
pub use role::Role;
