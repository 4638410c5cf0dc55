#![allow(dead_code)]

use std::{
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use fuel_ledger::{
    config::ConfigManager,
    storage::{JsonFileStorage, SnapshotStorage},
    LedgerStore,
};
use once_cell::sync::Lazy;
use tempfile::TempDir;

/// Holds TempDir guards so temporary folders live for the duration of the test run.
static TEST_DIRS: Lazy<Mutex<Vec<TempDir>>> = Lazy::new(|| Mutex::new(Vec::new()));

pub const EPSILON: f64 = 1e-6;

pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < EPSILON,
        "expected {expected}, got {actual}"
    );
}

/// Creates a unique base directory that outlives the calling test.
pub fn temp_base() -> PathBuf {
    let temp = TempDir::new().expect("create temp dir");
    let base = temp.path().to_path_buf();
    TEST_DIRS.lock().expect("lock temp dir registry").push(temp);
    base
}

pub fn file_storage(base: &Path) -> Arc<dyn SnapshotStorage> {
    Arc::new(JsonFileStorage::new(Some(base.to_path_buf()), Some(3)).expect("create json storage backend"))
}

/// Creates an isolated store and config manager backed by a fresh directory.
pub fn setup_test_env() -> (LedgerStore, ConfigManager, PathBuf) {
    let base = temp_base();
    let store = LedgerStore::open_default(file_storage(&base)).expect("open ledger store");
    let config_manager =
        ConfigManager::with_base_dir(base.clone()).expect("create config manager for temp dir");
    (store, config_manager, base)
}
