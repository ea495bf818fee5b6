//! File-backed persistence for synced feature documents.
//!
//! - One payload file per issue key, JSON-serialized
//! - A `cache.meta` index mapping key to last-seen update timestamp
//! - Lazy index load, single flush at teardown, dirty-tracked

mod store;

pub use store::FileCacheStore;
