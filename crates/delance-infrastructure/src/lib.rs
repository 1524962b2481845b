//! Infrastructure layer for Delance.
//!
//! Concrete ledger clients (JSON-RPC node and in-process simulation) plus the
//! on-disk configuration plumbing.

pub mod config_service;
pub mod memory_ledger;
pub mod paths;
pub mod rpc_ledger;
pub mod storage;

pub use crate::config_service::ConfigService;
pub use crate::memory_ledger::InMemoryLedger;
pub use crate::paths::DelancePaths;
pub use crate::rpc_ledger::RpcLedgerClient;
