//! Fingerprint-keyed cache of parsed record sets.
//!
//! One slot per filename, each behind its own mutex, so resolutions of
//! different files never wait on each other while two resolutions of the same
//! file serialize. The slot map itself is only write-locked to add or evict
//! slots.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use cdr_model::{RecordSet, RemoteFileMeta};

use crate::error::{CoreError, Result};

/// A parsed record set and the fingerprint of the content it was parsed from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub fingerprint: String,
    pub records: Arc<RecordSet>,
}

/// How a resolution was satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Fingerprint matched; cached records returned without parsing.
    Reused,
    /// Parser ran and the entry was stored or replaced.
    Parsed,
}

/// Cumulative cache counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub parses: u64,
    pub evictions: u64,
}

type Slot = Arc<Mutex<Option<CacheEntry>>>;

/// Process-lifetime cache of parsed sources, keyed by filename.
///
/// An entry's records are always the successful parse of the content whose
/// fingerprint it stores; failed parses never touch an entry.
#[derive(Debug, Default)]
pub struct ContentCache {
    slots: RwLock<HashMap<String, Slot>>,
    hits: AtomicU64,
    parses: AtomicU64,
    evictions: AtomicU64,
}

impl ContentCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a cache pre-populated with entries (e.g. from a snapshot).
    pub fn from_entries(entries: BTreeMap<String, CacheEntry>) -> Self {
        let slots = entries
            .into_iter()
            .map(|(name, entry)| (name, Arc::new(Mutex::new(Some(entry)))))
            .collect();
        Self {
            slots: RwLock::new(slots),
            ..Self::default()
        }
    }

    fn slot(&self, filename: &str) -> Slot {
        {
            let slots = self.slots.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(slot) = slots.get(filename) {
                return Arc::clone(slot);
            }
        }
        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(slots.entry(filename.to_string()).or_default())
    }

    /// Returns the records for `meta`, parsing only when the fingerprint changed.
    ///
    /// On parse failure the error is returned and any previous entry for the
    /// filename is left as it was.
    pub fn resolve<F, E>(
        &self,
        meta: &RemoteFileMeta,
        parse: F,
    ) -> std::result::Result<(Arc<RecordSet>, Resolution), E>
    where
        F: FnOnce() -> std::result::Result<RecordSet, E>,
    {
        let slot = self.slot(&meta.name);
        let mut guard = slot.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(entry) = guard.as_ref() {
            if entry.fingerprint == meta.fingerprint {
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!(file = %meta.name, "cache hit");
                return Ok((Arc::clone(&entry.records), Resolution::Reused));
            }
            debug!(file = %meta.name, "fingerprint changed, re-parsing");
        } else {
            debug!(file = %meta.name, "not cached, parsing");
        }

        let records = Arc::new(parse()?);
        self.parses.fetch_add(1, Ordering::Relaxed);
        *guard = Some(CacheEntry {
            fingerprint: meta.fingerprint.clone(),
            records: Arc::clone(&records),
        });
        Ok((records, Resolution::Parsed))
    }

    /// Removes every filename not in `current`. Returns the evicted names, sorted.
    pub fn evict<'a, I>(&self, current: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let keep: HashSet<&str> = current.into_iter().collect();
        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        let mut evicted: Vec<String> = slots
            .keys()
            .filter(|name| !keep.contains(name.as_str()))
            .cloned()
            .collect();
        evicted.sort();
        for name in &evicted {
            slots.remove(name);
        }
        self.evictions
            .fetch_add(evicted.len() as u64, Ordering::Relaxed);
        if !evicted.is_empty() {
            info!(count = evicted.len(), "evicted vanished files from cache");
        }
        evicted
    }

    /// Returns the cached entry for `filename`, if any.
    pub fn get(&self, filename: &str) -> Option<CacheEntry> {
        let slot = {
            let slots = self.slots.read().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(slots.get(filename)?)
        };
        let guard = slot.lock().unwrap_or_else(PoisonError::into_inner);
        guard.clone()
    }

    pub fn contains(&self, filename: &str) -> bool {
        self.get(filename).is_some()
    }

    /// Filled entries, keyed by filename.
    pub fn entries(&self) -> BTreeMap<String, CacheEntry> {
        let slots: Vec<(String, Slot)> = {
            let slots = self.slots.read().unwrap_or_else(PoisonError::into_inner);
            slots
                .iter()
                .map(|(name, slot)| (name.clone(), Arc::clone(slot)))
                .collect()
        };
        slots
            .into_iter()
            .filter_map(|(name, slot)| {
                let guard = slot.lock().unwrap_or_else(PoisonError::into_inner);
                guard.clone().map(|entry| (name, entry))
            })
            .collect()
    }

    /// Cached filenames, sorted.
    pub fn filenames(&self) -> Vec<String> {
        self.entries().into_keys().collect()
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every entry. Counters are kept.
    pub fn clear(&self) {
        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        slots.clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.len(),
            hits: self.hits.load(Ordering::Relaxed),
            parses: self.parses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }

    /// Writes all entries to `path` as JSON (`{filename: {fingerprint, records}}`).
    ///
    /// The snapshot goes to a sibling temp file first and is renamed over
    /// `path`, so a reader never sees a partial file.
    pub fn save_snapshot(&self, path: &Path) -> Result<()> {
        let entries = self.entries();
        let json = serde_json::to_vec(&entries)
            .map_err(|e| CoreError::Snapshot(format!("serialize: {e}")))?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| CoreError::Snapshot(format!("{}: {e}", parent.display())))?;
        }
        let temp_path = path.with_extension("json.tmp");
        let snapshot_err = |e: std::io::Error| {
            CoreError::Snapshot(format!("{}: {e}", temp_path.display()))
        };
        let mut file = File::create(&temp_path).map_err(snapshot_err)?;
        file.write_all(&json).map_err(snapshot_err)?;
        file.sync_all().map_err(snapshot_err)?;
        drop(file);
        fs::rename(&temp_path, path).map_err(|e| {
            CoreError::Snapshot(format!(
                "rename {} to {}: {e}",
                temp_path.display(),
                path.display()
            ))
        })?;
        debug!(path = %path.display(), entries = entries.len(), "saved cache snapshot");
        Ok(())
    }

    /// Loads a cache from a snapshot written by [`ContentCache::save_snapshot`].
    ///
    /// A missing file yields an empty cache.
    pub fn load_snapshot(path: &Path) -> Result<Self> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::new()),
            Err(e) => return Err(CoreError::Snapshot(format!("{}: {e}", path.display()))),
        };
        let entries: BTreeMap<String, CacheEntry> = serde_json::from_slice(&bytes)
            .map_err(|e| CoreError::Snapshot(format!("{}: {e}", path.display())))?;
        debug!(path = %path.display(), entries = entries.len(), "loaded cache snapshot");
        Ok(Self::from_entries(entries))
    }
}
