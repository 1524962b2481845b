//! Session application services.
//!
//! This module holds the role-scoped session: the observable state, the
//! store that publishes it, role-switch reconciliation, and the write
//! dispatcher.

mod dispatcher;
mod refresh;
mod service;
mod state;
mod store;

pub use service::SessionService;
pub use state::SessionState;
