// src/cache.rs
// =============================================================================
// On-disk cache of link check results.
//
// Lifecycle of one run:
// 1. load the cache file (a missing or unreadable file is an empty cache)
// 2. purge every entry older than the TTL, before anything is looked up
// 3. look up URLs while building tasks, record fresh probe results
// 4. persist the whole map once, at the end of the run
//
// File format: a JSON object keyed by normalized URL
//   { "https://...": { "status": "ok", "code": 200, "finalUrl": "...",
//                      "reason": "", "timestamp": 1700000000000 } }
// `timestamp` is milliseconds since the Unix epoch.
// =============================================================================

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

use crate::checker::Outcome;
use crate::error::SentinelError;

/// A cached result plus the moment it was recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    #[serde(flatten)]
    pub outcome: Outcome,
    #[serde(default)]
    pub timestamp: i64,
}

/// Current wall-clock time in epoch milliseconds.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[derive(Debug)]
pub struct CacheStore {
    // None for a store that is never written back (--no-cache, tests)
    path: Option<PathBuf>,
    ttl: Duration,
    entries: BTreeMap<String, CacheEntry>,
}

impl CacheStore {
    /// An empty store that lives only for this run.
    pub fn in_memory(ttl: Duration) -> Self {
        CacheStore {
            path: None,
            ttl,
            entries: BTreeMap::new(),
        }
    }

    /// Loads the cache file at `path`.
    ///
    /// Never fails: a missing file starts an empty cache, an unreadable or
    /// corrupt one is logged and replaced. Individual entries that do not
    /// parse are dropped.
    pub fn load(path: &Path, ttl: Duration) -> Self {
        let mut store = CacheStore {
            path: Some(path.to_path_buf()),
            ttl,
            entries: BTreeMap::new(),
        };

        // Step 1: read the file. Any failure here just means "no cache"
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no cache file yet");
                return store;
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cannot read cache file, starting empty");
                return store;
            }
        };

        // Step 2: the top level must be an object keyed by URL
        let raw: BTreeMap<String, serde_json::Value> = match serde_json::from_str(&text) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "corrupt cache file, starting empty");
                return store;
            }
        };

        // Step 3: parse each entry on its own, so one bad entry costs only itself
        for (url, value) in raw {
            match serde_json::from_value::<CacheEntry>(value) {
                Ok(entry) => {
                    store.entries.insert(url, entry);
                }
                Err(e) => debug!(url = %url, error = %e, "dropping unreadable cache entry"),
            }
        }

        store
    }

    fn is_expired(&self, entry: &CacheEntry, now_ms: i64) -> bool {
        let ttl_ms = i64::try_from(self.ttl.as_millis()).unwrap_or(i64::MAX);
        // A zero or negative timestamp means we do not know when it was recorded
        entry.timestamp <= 0 || now_ms.saturating_sub(entry.timestamp) >= ttl_ms
    }

    /// Removes every entry whose age has reached the TTL.
    ///
    /// Returns how many entries were dropped.
    pub fn purge_expired(&mut self, now_ms: i64) -> usize {
        let before = self.entries.len();
        // Collect first: the map cannot be modified while it is being iterated
        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| self.is_expired(entry, now_ms))
            .map(|(url, _)| url.clone())
            .collect();
        for url in expired {
            self.entries.remove(&url);
        }
        before - self.entries.len()
    }

    pub fn lookup(&self, url: &str) -> Option<&CacheEntry> {
        self.entries.get(url)
    }

    /// Stores `outcome` for `url`, replacing whatever was there.
    pub fn record(&mut self, url: &str, outcome: Outcome, now_ms: i64) {
        self.entries.insert(
            url.to_string(),
            CacheEntry {
                outcome,
                timestamp: now_ms,
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Writes the full map back to the file it was loaded from.
    /// In-memory stores have nowhere to go and are skipped.
    pub fn persist(&self) -> Result<(), SentinelError> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let json = serde_json::to_string_pretty(&self.entries)
            .map_err(|source| SentinelError::Serialize { what: "cache", source })?;
        write_file(path, &json)?;

        debug!(path = %path.display(), entries = self.entries.len(), "cache persisted");
        Ok(())
    }
}

/// Writes `contents` to `path`, creating parent directories first.
pub fn write_file(path: &Path, contents: &str) -> Result<(), SentinelError> {
    let io_error = |source| SentinelError::Io {
        path: path.to_path_buf(),
        source,
    };

    // "report.json" has an empty parent, which is the current directory
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io_error)?;
    }
    std::fs::write(path, contents).map_err(io_error)
}

// -----------------------------------------------------------------------------
// NOTES:
//
// 1. Why is loading infallible?
//    - The cache only saves work; the next run can always rebuild it
//    - A crash because of a half-written cache file would be far worse than
//      re-checking a few hundred links
//
// 2. Why purge right after load instead of checking age on every lookup?
//    - Every lookup in a run then sees the same set of entries
//    - Expired entries are also gone from the file written at the end
//
// 3. Why BTreeMap?
//    - The persisted file comes out sorted by URL, so diffs between runs stay
//      small and readable
// -----------------------------------------------------------------------------
