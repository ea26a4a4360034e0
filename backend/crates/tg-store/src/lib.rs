pub mod credential_store;
pub mod error;
pub mod stores;
pub mod timeout;
pub mod typed;

pub use credential_store::{CasOutcome, CredentialStore, StoredEntry};
pub use error::{Result, StoreError};
pub use stores::memory_store::MemoryStore;
pub use stores::sqlite_store::SqliteStore;
pub use timeout::with_timeout;
pub use typed::{Versioned, cas_json, get_json};
