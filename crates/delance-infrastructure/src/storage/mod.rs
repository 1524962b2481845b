//! Storage layer for atomic file operations.

mod config_storage;

pub use config_storage::ConfigStorage;
