//! Response cache (long-term memory)
//!
//! Maps request fingerprints to the successful envelope they produced. The
//! whole map lives in memory and is rewritten to a single JSON file on every
//! store:
//!
//! ```text
//! LTM/cache.json
//! {
//!   "<fingerprint>": { "request": {..}, "response": {..}, "timestamp": ".." },
//!   ...
//! }
//! ```
//!
//! Entries for requests whose outcome depends on mutable state (the wiki)
//! also record a digest of that state as it was right after the response.
//! Such an entry only counts as a hit while the state still has that digest.
//!
//! A missing or unreadable file means an empty cache, never a startup
//! failure. There is no eviction. Writers in separate processes sharing one
//! file race and the last one wins.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{CoreError, Result};
use crate::fingerprint::Fingerprint;
use crate::protocol::ResponseEnvelope;

/// One cached response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Canonical request subset the fingerprint was derived from
    pub request: Value,
    pub response: ResponseEnvelope,
    pub timestamp: DateTime<Utc>,

    /// Digest of the state the response describes, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<Fingerprint>,
}

impl CacheEntry {
    /// Whether the entry still describes `current`
    pub fn is_current(&self, current: Option<&Fingerprint>) -> bool {
        match &self.state {
            None => true,
            Some(recorded) => current == Some(recorded),
        }
    }
}

/// Fingerprint → response map persisted as one JSON file
#[derive(Debug, Default)]
pub struct ResponseCache {
    path: Option<PathBuf>,
    entries: BTreeMap<Fingerprint, CacheEntry>,
}

impl ResponseCache {
    /// Cache without a backing file
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Load the cache file at `path`
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();

        let entries = if !path.exists() {
            tracing::info!("No existing cache found at {}, starting fresh", path.display());
            BTreeMap::new()
        } else {
            match Self::read_entries(&path) {
                Ok(entries) => {
                    tracing::info!("Loaded {} cached responses from {}", entries.len(), path.display());
                    entries
                }
                Err(e) => {
                    tracing::error!("Error loading cache from {}: {}. Starting empty", path.display(), e);
                    BTreeMap::new()
                }
            }
        };

        Self {
            path: Some(path),
            entries,
        }
    }

    fn read_entries(path: &Path) -> Result<BTreeMap<Fingerprint, CacheEntry>> {
        let content = std::fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        Ok(serde_json::from_str(&content)?)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn lookup(&self, fingerprint: &Fingerprint) -> Option<&ResponseEnvelope> {
        self.entries.get(fingerprint).map(|entry| &entry.response)
    }

    /// Like [`lookup`](Self::lookup), but entries recorded against another
    /// state are treated as misses
    pub fn lookup_current(
        &self,
        fingerprint: &Fingerprint,
        state: Option<&Fingerprint>,
    ) -> Option<&ResponseEnvelope> {
        self.entries
            .get(fingerprint)
            .filter(|entry| entry.is_current(state))
            .map(|entry| &entry.response)
    }

    pub fn entry(&self, fingerprint: &Fingerprint) -> Option<&CacheEntry> {
        self.entries.get(fingerprint)
    }

    /// Record a successful response and flush the whole map.
    ///
    /// Error envelopes are refused. When the flush fails the entry is still
    /// kept in memory and the I/O error is returned.
    pub fn store(
        &mut self,
        fingerprint: Fingerprint,
        request: Value,
        response: ResponseEnvelope,
    ) -> Result<()> {
        self.store_with_state(fingerprint, request, response, None)
    }

    /// [`store`](Self::store) with the digest of the state the response
    /// leaves behind
    pub fn store_with_state(
        &mut self,
        fingerprint: Fingerprint,
        request: Value,
        response: ResponseEnvelope,
        state: Option<Fingerprint>,
    ) -> Result<()> {
        if !response.is_success() {
            return Err(CoreError::UncacheableResponse);
        }

        tracing::debug!("Storing response in cache: {}...", fingerprint.short());
        self.entries.insert(
            fingerprint,
            CacheEntry {
                request,
                response,
                timestamp: Utc::now(),
                state,
            },
        );

        self.flush()
    }

    /// Write the whole map to a sibling temp file and rename it into place
    pub fn flush(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let content = serde_json::to_string_pretty(&self.entries)?;
        let mut staging = path.clone().into_os_string();
        staging.push(".tmp");
        let staging = PathBuf::from(staging);

        std::fs::write(&staging, content)?;
        std::fs::rename(&staging, path)?;
        Ok(())
    }
}
