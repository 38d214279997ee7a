//! Durable key-value storage for the dashboard state.
//!
//! The store never talks to the filesystem directly; it goes through the
//! [`StorageBackend`] trait so tests can inject failing or in-memory
//! backends. Production uses [`FileStorage`], one file per key under a root
//! directory (default `~/.orgboard/`).
//!
//! # Atomic Writes
//!
//! `FileStorage` writes via temp file + rename so a crash mid-write can
//! never leave a truncated state file behind.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use fs_err as fs;
use tempfile::NamedTempFile;

use crate::error::{Result, StoreError};

/// Key layout for the persisted state.
///
/// One primary key holds the full serialized state; auxiliary keys hold the
/// corrupt-payload backup, the periodic timestamped backups, and the save
/// counter.
pub mod keys {
    /// Primary key: the full serialized [`ApplicationState`](crate::ApplicationState).
    pub const STATE: &str = "orgboard-state";

    /// Raw payload preserved when the primary key fails to deserialize.
    pub const CORRUPT_BACKUP: &str = "orgboard-state-corrupt";

    /// Monotonic save counter, persisted across sessions.
    pub const SAVE_COUNTER: &str = "orgboard-save-counter";

    /// Prefix for periodic timestamped full backups.
    pub const BACKUP_PREFIX: &str = "orgboard-backup-";

    /// Non-critical auxiliary keys evicted when a write hits the quota.
    /// The primary state key is never on this list.
    pub const EVICTABLE: &[&str] = &[
        "orgboard-analytics-cache",
        "orgboard-search-cache",
        "orgboard-ui-prefs",
    ];

    pub fn backup(stamp: &str) -> String {
        format!("{BACKUP_PREFIX}{stamp}")
    }
}

/// Synchronous key-value persistence.
///
/// `get` distinguishes "absent" (`Ok(None)`) from "storage broken" (`Err`);
/// the store treats both as recoverable.
pub trait StorageBackend {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
}

// ─────────────────────────────────────────────────────────────────────────────
// File-Backed Storage
// ─────────────────────────────────────────────────────────────────────────────

/// One file per key under a root directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    pub fn new(root: PathBuf) -> Self {
        FileStorage { root }
    }

    /// Default root directory (`~/.orgboard`), if a home directory exists.
    pub fn default_root() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".orgboard"))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.json"))
    }
}

/// ENOSPC / EDQUOT mean the device or quota is full; everything else is a
/// plain I/O failure.
fn is_quota_error(err: &std::io::Error) -> bool {
    matches!(err.raw_os_error(), Some(28) | Some(122))
}

impl StorageBackend for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) if err.kind() == std::io::ErrorKind::PermissionDenied => {
                Err(StoreError::StorageUnavailable {
                    details: format!("cannot read {}: {err}", path.display()),
                })
            }
            Err(err) => Err(StoreError::Io {
                context: format!("reading {}", path.display()),
                source: err,
            }),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        fs::create_dir_all(&self.root).map_err(|err| StoreError::StorageUnavailable {
            details: format!("cannot create {}: {err}", self.root.display()),
        })?;

        let path = self.path_for(key);
        let map_write_err = |err: std::io::Error| {
            if is_quota_error(&err) {
                StoreError::QuotaExceeded {
                    key: key.to_string(),
                }
            } else {
                StoreError::Io {
                    context: format!("writing {}", path.display()),
                    source: err,
                }
            }
        };

        let mut temp = NamedTempFile::new_in(&self.root).map_err(map_write_err)?;
        temp.write_all(value.as_bytes()).map_err(map_write_err)?;
        temp.flush().map_err(map_write_err)?;
        temp.persist(&path).map_err(|err| map_write_err(err.error))?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        let path = self.path_for(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(StoreError::Io {
                context: format!("removing {}", path.display()),
                source: err,
            }),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// In-Memory Storage
// ─────────────────────────────────────────────────────────────────────────────

/// HashMap-backed storage for tests and for memory-only degraded operation.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        MemoryStorage::default()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(|k| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl StorageBackend for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}
