//! Application layer for Delance.
//!
//! This crate coordinates the domain types and a [`delance_core::LedgerClient`]
//! into a session the front end can drive and observe.

pub mod session;

pub use session::{SessionService, SessionState};
