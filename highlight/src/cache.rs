//! Result cache for highlighter output.
//!
//! Entries never expire on our side and are never invalidated: the same key always maps to
//! the same output, so concurrent writers racing on one key are harmless.

use std::collections::HashMap;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::RwLock;

use syntaxhighlight_protocol::HighlightOptions;
use syntaxhighlight_protocol::LexerId;

use crate::atomic_write::write_atomic;

const KEY_PREFIX: &str = "highlight:";

/// Generic key-value store for rendered fragments.
pub trait CacheStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    /// Stores `value` under `key`. Failures are the store's to report; callers go on.
    fn set(&self, key: &str, value: &str);
}

impl<T: CacheStore + ?Sized> CacheStore for Box<T> {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) {
        (**self).set(key, value);
    }
}

impl<T: CacheStore + ?Sized> CacheStore for Arc<T> {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) {
        (**self).set(key, value);
    }
}

/// Digest over `(lexer, code, options)`.
///
/// Returns `None` only if the tuple cannot be serialized, in which case the caller skips
/// the cache for this request.
pub fn cache_key(lexer: &LexerId, code: &str, options: &HighlightOptions) -> Option<String> {
    let serialized = serde_json::to_vec(&(lexer, code, options)).ok()?;
    Some(format!("{KEY_PREFIX}{:x}", md5::compute(serialized)))
}

/// Process-local cache.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        match self.entries.read() {
            Ok(entries) => entries.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CacheStore for MemoryCache {
    fn get(&self, key: &str) -> Option<String> {
        let entries = match self.entries.read() {
            Ok(entries) => entries,
            Err(poisoned) => poisoned.into_inner(),
        };
        entries.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        let mut entries = match self.entries.write() {
            Ok(entries) => entries,
            Err(poisoned) => poisoned.into_inner(),
        };
        entries.insert(key.to_string(), value.to_string());
    }
}

/// One file per entry under a directory, so hits survive across processes.
#[derive(Debug, Clone)]
pub struct DirectoryCache {
    dir: PathBuf,
}

impl DirectoryCache {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        let file_name: String = key
            .chars()
            .map(|ch| if ch.is_ascii_alphanumeric() { ch } else { '-' })
            .collect();
        self.dir.join(file_name)
    }
}

impl CacheStore for DirectoryCache {
    fn get(&self, key: &str) -> Option<String> {
        std::fs::read_to_string(self.entry_path(key)).ok()
    }

    fn set(&self, key: &str, value: &str) {
        let path = self.entry_path(key);
        if let Err(err) = write_atomic(&path, value.as_bytes()) {
            tracing::warn!("failed to write cache entry {}: {err}", path.display());
        }
    }
}

/// Never stores anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCache;

impl CacheStore for NoCache {
    fn get(&self, _key: &str) -> Option<String> {
        None
    }

    fn set(&self, _key: &str, _value: &str) {}
}
