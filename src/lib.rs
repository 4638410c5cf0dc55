#![doc(test(attr(deny(warnings))))]

//! Fuel Ledger keeps a fuel station attendant's shift: fuel sales, lubricant
//! sales and expenses, reconciled against credits, cards, bonds, deposits and
//! cash into one running total that is persisted after every change.

pub mod config;
pub mod core;
pub mod currency;
pub mod errors;
pub mod input;
pub mod ledger;
pub mod report;
pub mod session;
pub mod storage;
pub mod utils;

pub use crate::core::{LedgerStore, PersistenceWarning, DEFAULT_STORAGE_KEY};
pub use errors::LedgerError;

use std::sync::Once;

static STARTUP: Once = Once::new();

/// Installs the tracing subscriber and logs which build is running.
pub fn init() {
    STARTUP.call_once(|| {
        utils::init_tracing();
        let build = utils::build_info::current();
        tracing::info!(
            version = build.version,
            git = build.git_hash,
            profile = build.profile,
            "fuel ledger starting"
        );
    });
}
