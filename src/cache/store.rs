//! File-backed feature cache.
//!
//! Layout: one JSON payload file per issue key inside the cache directory,
//! plus a `cache.meta` file holding a JSON map from key to epoch timestamp.
//! The index is the single source of truth for what is cached and how
//! fresh it is; a missing payload for an indexed key is a miss, never a
//! crash.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::feature::FeatureDocument;

const META_FILE: &str = "cache.meta";

/// Durable key/value store for serialized feature documents.
///
/// The metadata index is loaded lazily on first access and written back at
/// most once, at teardown, and only if something changed during the
/// session. Single-writer: concurrent runs sharing a directory are out of
/// scope (last teardown wins on the index).
pub struct FileCacheStore {
  /// None disables caching entirely; every operation becomes a no-op/miss.
  dir: Option<PathBuf>,
  meta: Option<BTreeMap<String, i64>>,
  dirty: bool,
}

impl FileCacheStore {
  pub fn new(dir: Option<PathBuf>) -> Self {
    Self {
      dir,
      meta: None,
      dirty: false,
    }
  }

  /// A store with caching disabled.
  pub fn disabled() -> Self {
    Self::new(None)
  }

  pub fn is_enabled(&self) -> bool {
    self.dir.is_some()
  }

  fn meta_path(dir: &Path) -> PathBuf {
    dir.join(META_FILE)
  }

  /// Load the index once. Missing or empty index file means an empty map;
  /// an unreadable one surfaces as a corrupt entry so data loss is never
  /// silent.
  fn load_meta(&mut self) -> Result<&mut BTreeMap<String, i64>> {
    if self.meta.is_none() {
      let path = self.dir.as_deref().map(Self::meta_path);

      let map = match path {
        Some(path) if path.exists() => {
          let bytes = std::fs::read(&path)?;
          serde_json::from_slice(&bytes).map_err(|e| Error::CorruptEntry {
            key: META_FILE.to_string(),
            source: e,
          })?
        }
        _ => BTreeMap::new(),
      };

      debug!(entries = map.len(), "loaded cache index");
      self.meta = Some(map);
    }

    Ok(self.meta.get_or_insert_with(BTreeMap::new))
  }

  /// All cached keys. Empty if the store is disabled or empty.
  pub fn keys(&mut self) -> Result<BTreeSet<String>> {
    if !self.is_enabled() {
      return Ok(BTreeSet::new());
    }

    Ok(self.load_meta()?.keys().cloned().collect())
  }

  /// Maximum stored timestamp, or 0 when disabled or empty.
  ///
  /// Callers must treat 0 as "fetch everything".
  pub fn latest_timestamp(&mut self) -> Result<i64> {
    if !self.is_enabled() {
      return Ok(0);
    }

    Ok(self.load_meta()?.values().copied().max().unwrap_or(0))
  }

  /// Read the cached document for `key`.
  pub fn read(&mut self, key: &str) -> Result<FeatureDocument> {
    let Some(dir) = self.dir.clone() else {
      return Err(Error::CacheMiss(key.to_string()));
    };

    self.load_meta()?;

    let path = dir.join(key);
    let bytes = match std::fs::read(&path) {
      Ok(bytes) => bytes,
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
        return Err(Error::CacheMiss(key.to_string()));
      }
      Err(e) => return Err(e.into()),
    };

    serde_json::from_slice(&bytes).map_err(|e| Error::CorruptEntry {
      key: key.to_string(),
      source: e,
    })
  }

  /// Serialize `document` under `key` and index it at `timestamp`.
  ///
  /// Rewriting a key replaces payload and timestamp together. No-op when
  /// caching is disabled.
  pub fn write(&mut self, key: &str, document: &FeatureDocument, timestamp: i64) -> Result<()> {
    let Some(dir) = self.dir.clone() else {
      return Ok(());
    };

    let bytes = serde_json::to_vec(document).map_err(|e| Error::CorruptEntry {
      key: key.to_string(),
      source: e,
    })?;

    std::fs::create_dir_all(&dir)?;
    std::fs::write(dir.join(key), bytes)?;

    self.load_meta()?.insert(key.to_string(), timestamp);
    self.dirty = true;
    debug!(key, timestamp, "cached feature document");

    Ok(())
  }

  /// Write the index back if it changed. Idempotent; also invoked from
  /// `Drop` so every exit path tears the store down.
  pub fn flush(&mut self) -> Result<()> {
    if !self.dirty {
      return Ok(());
    }

    let (Some(dir), Some(meta)) = (self.dir.as_deref(), self.meta.as_ref()) else {
      return Ok(());
    };

    let bytes = serde_json::to_vec(meta).map_err(|e| Error::CorruptEntry {
      key: META_FILE.to_string(),
      source: e,
    })?;

    std::fs::create_dir_all(dir)?;
    std::fs::write(Self::meta_path(dir), bytes)?;
    self.dirty = false;
    debug!(entries = meta.len(), "flushed cache index");

    Ok(())
  }
}

impl Drop for FileCacheStore {
  fn drop(&mut self) {
    if let Err(e) = self.flush() {
      warn!(error = %e, "failed to flush cache index at teardown");
    }
  }
}
