use std::{
    fs,
    path::{Path, PathBuf},
};

use chrono::Utc;

use crate::{
    core::utils::{ensure_dir, write_replacing, PathResolver},
    errors::LedgerError,
};

use super::{
    archive_stem, canonical_name, ensure_archive_id, sort_newest_first, ArchiveInfo, Result,
    SnapshotStorage, DEFAULT_RETENTION,
};

const EXTENSION: &str = "json";

/// Filesystem-backed storage: one `<key>.json` document per key plus a
/// per-key directory of timestamped shift archives.
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    data_dir: PathBuf,
    archives_dir: PathBuf,
    retention: usize,
}

impl JsonFileStorage {
    pub fn new(root: Option<PathBuf>, retention: Option<usize>) -> Result<Self> {
        let base = PathResolver::resolve_base(root);
        Self::with_dirs(
            PathResolver::data_dir_in(&base),
            PathResolver::archive_dir_in(&base),
            retention.unwrap_or(DEFAULT_RETENTION),
        )
    }

    pub fn new_default() -> Result<Self> {
        Self::new(None, None)
    }

    /// Resolves the same layout as [`JsonFileStorage::new`] but leaves the
    /// directories alone until the first write, so read-only callers never
    /// create them.
    pub fn deferred(root: Option<PathBuf>, retention: Option<usize>) -> Self {
        let base = PathResolver::resolve_base(root);
        Self {
            data_dir: PathResolver::data_dir_in(&base),
            archives_dir: PathResolver::archive_dir_in(&base),
            retention: retention.unwrap_or(DEFAULT_RETENTION).max(1),
        }
    }

    pub fn with_dirs(data_dir: PathBuf, archives_dir: PathBuf, retention: usize) -> Result<Self> {
        ensure_dir(&data_dir)?;
        ensure_dir(&archives_dir)?;
        Ok(Self {
            data_dir,
            archives_dir,
            retention: retention.max(1),
        })
    }

    pub fn item_path(&self, key: &str) -> PathBuf {
        self.data_dir
            .join(format!("{}.{}", canonical_name(key), EXTENSION))
    }

    pub fn archive_path(&self, key: &str, id: &str) -> PathBuf {
        self.archive_dir(key).join(id)
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn archive_dir(&self, key: &str) -> PathBuf {
        self.archives_dir.join(canonical_name(key))
    }

    fn prune_archives(&self, key: &str) -> Result<()> {
        for entry in self.list_archives(key)?.into_iter().skip(self.retention) {
            if let Some(path) = entry.path {
                if let Err(err) = fs::remove_file(&path) {
                    tracing::warn!(path = %path.display(), %err, "failed to prune shift archive");
                }
            }
        }
        Ok(())
    }
}

impl SnapshotStorage for JsonFileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        let path = self.item_path(key);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(path)?))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        write_replacing(&self.item_path(key), value)
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        let path = self.item_path(key);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }

    fn write_archive(&self, key: &str, value: &str, note: Option<&str>) -> Result<ArchiveInfo> {
        let dir = self.archive_dir(key);
        ensure_dir(&dir)?;
        let now = Utc::now();
        let stamp = now.format(super::ARCHIVE_TIMESTAMP_FORMAT).to_string();
        let same_second = self
            .list_archives(key)?
            .iter()
            .filter(|info| info.id.contains(&stamp))
            .map(|info| info.sequence)
            .max()
            .unwrap_or(0);
        let file_name = format!(
            "{}.{}",
            archive_stem(key, now, same_second + 1, note),
            EXTENSION
        );
        let path = dir.join(&file_name);
        write_replacing(&path, value)?;
        self.prune_archives(key)?;
        Ok(ArchiveInfo::from_id(key, file_name, Some(path)))
    }

    fn list_archives(&self, key: &str) -> Result<Vec<ArchiveInfo>> {
        let dir = self.archive_dir(key);
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut entries = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(EXTENSION) {
                continue;
            }
            let id = match path.file_name().and_then(|name| name.to_str()) {
                Some(name) => name.to_string(),
                None => continue,
            };
            entries.push(ArchiveInfo::from_id(key, id, Some(path)));
        }
        sort_newest_first(&mut entries);
        Ok(entries)
    }

    fn read_archive(&self, key: &str, id: &str) -> Result<String> {
        ensure_archive_id(id)?;
        let path = self.archive_path(key, id);
        if !path.exists() {
            return Err(LedgerError::Persistence(format!(
                "archive `{}` not found",
                id
            )));
        }
        Ok(fs::read_to_string(path)?)
    }
}
