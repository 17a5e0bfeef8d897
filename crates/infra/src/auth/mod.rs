//! OAuth token lifecycle and credential persistence

pub mod store;
pub mod token_manager;

pub use store::{JsonFileCredentialStore, MemoryCredentialStore};
pub use token_manager::{RefreshOutcome, TokenManager};
