//! Infrastructure Layer
//!
//! Credential store adapters.

pub mod memory;
pub mod postgres;
pub mod store;

pub use memory::MemoryCredentialStore;
pub use postgres::PgCredentialStore;
pub use store::{CredentialStore, StoreBackend};
