//! Load cache.
//!
//! Parsed exports are memoized by content fingerprint so that every view
//! interaction re-runs only the cheap filtering pipeline. Failed loads are
//! never cached; the next request retries the parse.

use crate::loader::{load_bytes, load_path, LoadError, LoadReport};
use crate::table::TicketTable;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use td_common::Fingerprint;
use tracing::{debug, info};

/// Where a dataset came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DataSource {
    Upload { name: String, size: usize },
    DefaultFile { path: PathBuf },
}

impl DataSource {
    /// Label shown next to the record count.
    pub fn label(&self) -> String {
        match self {
            DataSource::Upload { name, .. } => name.clone(),
            DataSource::DefaultFile { path } => path.display().to_string(),
        }
    }
}

/// An immutable, team-scoped table with its provenance.
#[derive(Debug)]
pub struct LoadedDataset {
    pub fingerprint: Fingerprint,
    pub source: DataSource,
    pub table: TicketTable,
    pub report: LoadReport,
    pub loaded_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
}

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<Fingerprint, Arc<LoadedDataset>>,
    hits: u64,
    misses: u64,
}

/// Fingerprint-keyed memo of successful loads.
#[derive(Debug, Default)]
pub struct LoadCache {
    state: Mutex<CacheState>,
}

impl LoadCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached dataset for these bytes or parse and cache them.
    pub fn get_or_load_bytes(
        &self,
        name: &str,
        bytes: &[u8],
    ) -> Result<Arc<LoadedDataset>, LoadError> {
        let fingerprint = Fingerprint::of_bytes(bytes);
        if let Some(hit) = self.lookup(&fingerprint) {
            return Ok(hit);
        }
        let loaded = load_bytes(bytes)?;
        let source = DataSource::Upload {
            name: name.to_string(),
            size: bytes.len(),
        };
        Ok(self.store(fingerprint, source, loaded.table, loaded.report))
    }

    /// Return the cached dataset for this path or read and cache it.
    pub fn get_or_load_path(&self, path: &Path) -> Result<Arc<LoadedDataset>, LoadError> {
        let fingerprint = Fingerprint::of_path(path);
        if let Some(hit) = self.lookup(&fingerprint) {
            return Ok(hit);
        }
        let loaded = load_path(path)?;
        let source = DataSource::DefaultFile {
            path: path.to_path_buf(),
        };
        Ok(self.store(fingerprint, source, loaded.table, loaded.report))
    }

    /// Drop one entry. Returns whether it was present.
    pub fn invalidate(&self, fingerprint: &Fingerprint) -> bool {
        let removed = self.lock().entries.remove(fingerprint).is_some();
        if removed {
            debug!(fingerprint = fingerprint.short(), "cache entry invalidated");
        }
        removed
    }

    /// Drop every entry and reset the counters.
    pub fn clear(&self) {
        let mut state = self.lock();
        let dropped = state.entries.len();
        *state = CacheState::default();
        info!(dropped, "load cache cleared");
    }

    pub fn contains(&self, fingerprint: &Fingerprint) -> bool {
        self.lock().entries.contains_key(fingerprint)
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        let state = self.lock();
        CacheStats {
            entries: state.entries.len(),
            hits: state.hits,
            misses: state.misses,
        }
    }

    fn lookup(&self, fingerprint: &Fingerprint) -> Option<Arc<LoadedDataset>> {
        let mut state = self.lock();
        match state.entries.get(fingerprint).cloned() {
            Some(hit) => {
                state.hits += 1;
                debug!(fingerprint = fingerprint.short(), "load cache hit");
                Some(hit)
            }
            None => {
                state.misses += 1;
                debug!(fingerprint = fingerprint.short(), "load cache miss");
                None
            }
        }
    }

    fn store(
        &self,
        fingerprint: Fingerprint,
        source: DataSource,
        table: TicketTable,
        report: LoadReport,
    ) -> Arc<LoadedDataset> {
        let dataset = Arc::new(LoadedDataset {
            fingerprint: fingerprint.clone(),
            source,
            table,
            report,
            loaded_at: chrono::Utc::now(),
        });
        self.lock().entries.insert(fingerprint, Arc::clone(&dataset));
        dataset
    }

    // A poisoned lock still holds consistent data: entries are inserted whole.
    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const CSV: &str = "Status;Atribuído - Técnico;Data de abertura\n\
                       Novo;Fagner Brito;01-03-2024 09:00\n";

    #[test]
    fn test_bytes_are_memoized_by_content() {
        let cache = LoadCache::new();
        let a = cache.get_or_load_bytes("a.csv", CSV.as_bytes()).expect("load a");
        let b = cache.get_or_load_bytes("b.csv", CSV.as_bytes()).expect("load b");
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(b.source.label(), "a.csv");
        assert_eq!(
            cache.stats(),
            CacheStats {
                entries: 1,
                hits: 1,
                misses: 1
            }
        );
    }

    #[test]
    fn test_failed_load_is_not_cached() {
        let cache = LoadCache::new();
        assert!(cache.get_or_load_bytes("empty.csv", b"").is_err());
        assert!(cache.is_empty());
        assert!(cache.get_or_load_bytes("empty.csv", b"").is_err());
        assert_eq!(cache.stats().misses, 2);
    }

    #[test]
    fn test_invalidate_and_clear() {
        let cache = LoadCache::new();
        let loaded = cache.get_or_load_bytes("a.csv", CSV.as_bytes()).expect("load");
        assert!(cache.contains(&loaded.fingerprint));
        assert!(cache.invalidate(&loaded.fingerprint));
        assert!(!cache.invalidate(&loaded.fingerprint));

        cache.get_or_load_bytes("a.csv", CSV.as_bytes()).expect("reload");
        assert_eq!(cache.len(), 1);
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.stats(), CacheStats::default());
    }

    #[test]
    fn test_path_source_label() {
        let mut file = NamedTempFile::new().expect("tempfile");
        file.write_all(CSV.as_bytes()).expect("write");
        let cache = LoadCache::new();
        let loaded = cache.get_or_load_path(file.path()).expect("load");
        assert_eq!(loaded.source.label(), file.path().display().to_string());
        assert_eq!(loaded.table.len(), 1);
        assert!(cache.get_or_load_path(file.path()).is_ok());
        assert_eq!(cache.stats().hits, 1);
    }

    #[test]
    fn test_missing_path_is_io_error() {
        let cache = LoadCache::new();
        let err = cache
            .get_or_load_path(Path::new("/nonexistent/glpi.csv"))
            .unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
        assert!(cache.is_empty());
    }
}
