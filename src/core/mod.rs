pub mod ledger_store;
pub mod utils;

pub use ledger_store::{
    LedgerStore, LoadMetadata, PersistenceWarning, SubscriptionId, DEFAULT_STORAGE_KEY,
};
