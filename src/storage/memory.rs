use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard},
};

use chrono::Utc;

use crate::errors::LedgerError;

use super::{
    archive_stem, canonical_name, ensure_archive_id, sort_newest_first, ArchiveInfo, Result,
    SnapshotStorage, DEFAULT_RETENTION,
};

#[derive(Debug, Default)]
struct Inner {
    items: HashMap<String, String>,
    archives: HashMap<String, Vec<(ArchiveInfo, String)>>,
    fail_writes: bool,
}

/// In-process storage for tests and embedders that persist elsewhere.
#[derive(Debug)]
pub struct MemoryStorage {
    inner: Mutex<Inner>,
    retention: usize,
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::with_retention(DEFAULT_RETENTION)
    }

    pub fn with_retention(retention: usize) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            retention: retention.max(1),
        }
    }

    /// Makes every subsequent write fail, to exercise persistence error paths.
    pub fn set_fail_writes(&self, fail: bool) {
        self.lock().fail_writes = fail;
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A poisoned map is still structurally valid.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn simulated_failure(key: &str) -> LedgerError {
    LedgerError::Persistence(format!("write to `{key}` rejected by storage"))
}

impl SnapshotStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock().items.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let mut inner = self.lock();
        if inner.fail_writes {
            return Err(simulated_failure(key));
        }
        inner.items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.lock().items.remove(key);
        Ok(())
    }

    fn write_archive(&self, key: &str, value: &str, note: Option<&str>) -> Result<ArchiveInfo> {
        let mut inner = self.lock();
        if inner.fail_writes {
            return Err(simulated_failure(key));
        }
        let entries = inner.archives.entry(canonical_name(key)).or_default();
        let sequence = entries.iter().map(|(info, _)| info.sequence).max().unwrap_or(0) + 1;
        let id = format!("{}.json", archive_stem(key, Utc::now(), sequence, note));
        let info = ArchiveInfo::from_id(key, id, None);
        entries.push((info.clone(), value.to_string()));

        let mut infos: Vec<ArchiveInfo> = entries.iter().map(|(info, _)| info.clone()).collect();
        sort_newest_first(&mut infos);
        let keep: Vec<String> = infos
            .into_iter()
            .take(self.retention)
            .map(|info| info.id)
            .collect();
        entries.retain(|(info, _)| keep.contains(&info.id));
        Ok(info)
    }

    fn list_archives(&self, key: &str) -> Result<Vec<ArchiveInfo>> {
        let inner = self.lock();
        let mut infos: Vec<ArchiveInfo> = inner
            .archives
            .get(&canonical_name(key))
            .map(|entries| entries.iter().map(|(info, _)| info.clone()).collect())
            .unwrap_or_default();
        sort_newest_first(&mut infos);
        Ok(infos)
    }

    fn read_archive(&self, key: &str, id: &str) -> Result<String> {
        ensure_archive_id(id)?;
        self.lock()
            .archives
            .get(&canonical_name(key))
            .and_then(|entries| entries.iter().find(|(info, _)| info.id == id))
            .map(|(_, value)| value.clone())
            .ok_or_else(|| LedgerError::Persistence(format!("archive `{}` not found", id)))
    }
}
