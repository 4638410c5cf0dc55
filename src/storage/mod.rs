//! Key-value persistence for ledger snapshots and shift archives.

pub mod json_backend;
pub mod memory;

use std::path::PathBuf;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};

use crate::errors::LedgerError;

pub use json_backend::JsonFileStorage;
pub use memory::MemoryStorage;

pub type Result<T> = std::result::Result<T, LedgerError>;

pub(crate) const ARCHIVE_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
pub(crate) const DEFAULT_RETENTION: usize = 5;

/// Describes one archived shift snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct ArchiveInfo {
    pub key: String,
    pub id: String,
    pub created_at: Option<DateTime<Utc>>,
    /// Distinguishes archives taken within the same second, starting at 1.
    pub sequence: u32,
    pub note: Option<String>,
    pub path: Option<PathBuf>,
}

impl ArchiveInfo {
    pub(crate) fn from_id(key: &str, id: String, path: Option<PathBuf>) -> Self {
        let parsed = parse_archive_id(&id);
        Self {
            key: canonical_name(key),
            id,
            created_at: parsed.created_at,
            sequence: parsed.sequence,
            note: parsed.note,
            path,
        }
    }
}

/// Orders archives newest first.
pub(crate) fn sort_newest_first(entries: &mut [ArchiveInfo]) {
    entries.sort_by(|a, b| {
        (b.created_at, b.sequence, &b.id).cmp(&(a.created_at, a.sequence, &a.id))
    });
}

/// Abstraction over string-valued key-value stores.
///
/// Values are opaque JSON documents; versioning happens through the key name.
pub trait SnapshotStorage: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>>;
    fn set_item(&self, key: &str, value: &str) -> Result<()>;
    fn remove_item(&self, key: &str) -> Result<()>;

    fn write_archive(&self, key: &str, value: &str, note: Option<&str>) -> Result<ArchiveInfo>;
    /// Archives for `key`, newest first.
    fn list_archives(&self, key: &str) -> Result<Vec<ArchiveInfo>>;
    fn read_archive(&self, key: &str, id: &str) -> Result<String>;
}

pub fn load_json<T: DeserializeOwned>(storage: &dyn SnapshotStorage, key: &str) -> Result<Option<T>> {
    match storage.get_item(key)? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

pub fn save_json<T: Serialize>(storage: &dyn SnapshotStorage, key: &str, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    storage.set_item(key, &json)
}

/// Archive ids are bare file names inside the key's archive directory.
pub(crate) fn ensure_archive_id(id: &str) -> Result<()> {
    let bare = !id.is_empty()
        && !id.contains(['/', '\\'])
        && !id.contains("..")
        && !id.starts_with('.');
    if bare {
        Ok(())
    } else {
        Err(LedgerError::Persistence(format!("invalid archive id `{id}`")))
    }
}

pub(crate) fn canonical_name(name: &str) -> String {
    let sanitized: String = name
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'a'..='z' | '0'..='9' => c,
            _ => '_',
        })
        .collect();
    if sanitized.trim_matches('_').is_empty() {
        "ledger".into()
    } else {
        sanitized
    }
}

pub(crate) fn sanitize_note(note: Option<&str>) -> Option<String> {
    let raw = note?.trim();
    if raw.is_empty() {
        return None;
    }
    let mut sanitized = String::new();
    let mut last_dash = false;
    for ch in raw.chars() {
        if ch.is_ascii_alphanumeric() {
            sanitized.push(ch.to_ascii_lowercase());
            last_dash = false;
        } else if (ch.is_whitespace() || matches!(ch, '-' | '.' | '_'))
            && !sanitized.is_empty()
            && !last_dash
        {
            sanitized.push('-');
            last_dash = true;
        }
    }
    let trimmed = sanitized.trim_matches('-').to_string();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

/// Builds `<key>_<YYYYmmdd>_<HHMMSS>[-<seq>][_<note>]` for an archive taken at `at`.
pub(crate) fn archive_stem(
    key: &str,
    at: DateTime<Utc>,
    sequence: u32,
    note: Option<&str>,
) -> String {
    let mut stem = format!(
        "{}_{}",
        canonical_name(key),
        at.format(ARCHIVE_TIMESTAMP_FORMAT)
    );
    if sequence > 1 {
        stem.push_str(&format!("-{sequence}"));
    }
    if let Some(label) = sanitize_note(note) {
        stem.push('_');
        stem.push_str(&label);
    }
    stem
}

#[derive(Debug, Default, PartialEq)]
pub(crate) struct ParsedArchiveId {
    pub created_at: Option<DateTime<Utc>>,
    pub sequence: u32,
    pub note: Option<String>,
}

/// Recovers the timestamp, sequence and note embedded in an archive id.
pub(crate) fn parse_archive_id(id: &str) -> ParsedArchiveId {
    let stem = id.strip_suffix(".json").unwrap_or(id);
    let segments: Vec<&str> = stem.split('_').collect();
    for (idx, pair) in segments.windows(2).enumerate() {
        let (date_part, time_part) = (pair[0], pair[1]);
        let (time_digits, sequence) = match time_part.split_once('-') {
            Some((digits, seq)) => (digits, seq.parse().unwrap_or(1)),
            None => (time_part, 1),
        };
        if !is_digits(date_part, 8) || !is_digits(time_digits, 6) {
            continue;
        }
        let created_at = NaiveDateTime::parse_from_str(
            &format!("{date_part}{time_digits}"),
            "%Y%m%d%H%M%S",
        )
        .ok()
        .map(|naive| DateTime::from_naive_utc_and_offset(naive, Utc));
        let note = segments
            .get(idx + 2..)
            .filter(|rest| !rest.is_empty())
            .map(|rest| rest.join("_"));
        return ParsedArchiveId {
            created_at,
            sequence,
            note,
        };
    }
    ParsedArchiveId {
        sequence: 1,
        ..ParsedArchiveId::default()
    }
}

fn is_digits(value: &str, len: usize) -> bool {
    value.len() == len && value.chars().all(|c| c.is_ascii_digit())
}
