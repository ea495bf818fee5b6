//! Crate error type.
//!
//! Cache misses are recoverable (the loader falls back to whatever the
//! tracker returned); corrupt entries and malformed timestamps are not,
//! since silently dropping either could hide data loss or poison the
//! incremental-fetch watermark.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
  /// No cached payload for this key. Callers treat this as a miss.
  #[error("no cache entry for key {0}")]
  CacheMiss(String),

  /// A payload file exists but its bytes do not deserialize.
  #[error("corrupt cache entry for key {key}")]
  CorruptEntry {
    key: String,
    #[source]
    source: serde_json::Error,
  },

  /// An issue timestamp that does not match the RFC-3339 shape.
  #[error("malformed issue timestamp: {0:?}")]
  MalformedTimestamp(String),

  /// A tracker RPC failed. Not retried here; retry/backoff belongs to the
  /// transport layer.
  #[error("tracker request failed: {0}")]
  Tracker(String),

  /// The feature parser rejected the scenario text.
  #[error("failed to parse feature from {source_id}: {message}")]
  Parse { source_id: String, message: String },

  #[error("failed to load config from {path}: {message}")]
  Config { path: PathBuf, message: String },

  #[error("invalid tag pattern {pattern:?}: {message}")]
  Pattern { pattern: String, message: String },

  #[error(transparent)]
  Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
