//! In-memory document cache mirroring the record store.
//!
//! [`DocumentCache`] owns the authoritative in-process view of the
//! collection: a map from document id to [`DocumentRecord`], persisted
//! as a JSON snapshot with a human-readable metadata sidecar. The
//! record store owns durable truth — on any detected divergence the
//! cache is rebuilt from it.
//!
//! Lifecycle: [`DocumentCache::open`] loads the snapshot (any load
//! failure degrades to an empty cache, never a startup failure), then
//! rebuilds if the validity check fails. Every invalidity is followed
//! by a rebuild attempt; there is no stuck-invalid state.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::config::StorageConfig;
use crate::error::Result;
use crate::models::{CacheMetadata, DocumentRecord, DocumentSummary, CACHE_VERSION};
use crate::store::RecordStore;

/// Outcome of a [`DocumentCache::check_dimensions`] diagnostic pass.
#[derive(Debug, Clone)]
pub struct DimensionReport {
    /// Expected embedding length from configuration.
    pub expected: usize,
    /// Distinct embedding lengths observed, with entry counts.
    pub lengths: BTreeMap<usize, usize>,
    /// Ids whose embedding is empty.
    pub zero_length: Vec<String>,
    /// Ids whose embedding length differs from `expected`.
    pub off_expected: Vec<String>,
}

impl DimensionReport {
    /// True when every entry carries a non-empty embedding of the
    /// expected length.
    pub fn is_healthy(&self) -> bool {
        self.zero_length.is_empty() && self.off_expected.is_empty()
    }
}

/// In-memory mapping from document id to record, kept consistent with
/// a [`RecordStore`] and persisted as a snapshot between runs.
///
/// Single-writer: callers must serialize access to one instance, and
/// concurrent processes sharing the same storage directory are
/// unsupported.
pub struct DocumentCache {
    store: RecordStore,
    entries: HashMap<String, DocumentRecord>,
    metadata: CacheMetadata,
    snapshot_path: PathBuf,
    metadata_path: PathBuf,
}

impl DocumentCache {
    /// Open the cache: load the persisted snapshot, then self-heal by
    /// rebuilding if the snapshot disagrees with the record store.
    ///
    /// Snapshot problems (missing, corrupt, version mismatch) are
    /// recoverable-by-rebuild and never fail startup. An uncreatable
    /// records directory does fail — see [`RecordStore::open`].
    pub fn open(storage: &StorageConfig) -> Result<Self> {
        let store = RecordStore::open(&storage.records_dir)?;
        let mut cache = Self {
            store,
            entries: HashMap::new(),
            metadata: CacheMetadata::default(),
            snapshot_path: storage.snapshot_path.clone(),
            metadata_path: storage.metadata_path.clone(),
        };
        cache.load();
        if !cache.is_valid()? {
            cache.rebuild()?;
        }
        Ok(cache)
    }

    /// Load the persisted snapshot and metadata into memory.
    ///
    /// Any failure leaves the corresponding part empty with a warning;
    /// the follow-up validity check triggers a rebuild.
    fn load(&mut self) {
        match fs::read(&self.snapshot_path) {
            Ok(bytes) => match serde_json::from_slice::<Vec<DocumentRecord>>(&bytes) {
                Ok(records) => {
                    self.entries = records.into_iter().map(|r| (r.id.clone(), r)).collect();
                }
                Err(e) => {
                    eprintln!("Warning: could not parse cache snapshot: {}; rebuilding", e);
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                eprintln!("Warning: could not read cache snapshot: {}; rebuilding", e);
            }
        }

        match fs::read(&self.metadata_path) {
            Ok(bytes) => match serde_json::from_slice::<CacheMetadata>(&bytes) {
                Ok(metadata) if metadata.cache_version == CACHE_VERSION => {
                    self.metadata = metadata;
                }
                Ok(metadata) => {
                    eprintln!(
                        "Warning: cache snapshot version {} does not match {}; rebuilding",
                        metadata.cache_version, CACHE_VERSION
                    );
                    self.entries.clear();
                }
                Err(e) => {
                    eprintln!("Warning: could not parse cache metadata: {}", e);
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                eprintln!("Warning: could not read cache metadata: {}", e);
            }
        }
    }

    /// Whether the cached id set equals the record store's id set.
    ///
    /// This is the sole validity criterion. In-place content or
    /// embedding edits under an existing id (e.g. a record file edited
    /// directly on disk) are deliberately invisible to it; re-ingesting
    /// through [`DocumentCache::upsert`] is the only supported update
    /// path.
    pub fn is_valid(&self) -> Result<bool> {
        let store_ids = self.store.list_ids()?;
        let cache_ids: BTreeSet<String> = self.entries.keys().cloned().collect();
        Ok(store_ids == cache_ids)
    }

    /// Discard in-memory entries and repopulate from every parseable
    /// record in the store, then persist a fresh snapshot.
    ///
    /// Corrupt record files are skipped with a warning; no single
    /// corrupt file aborts the rebuild.
    pub fn rebuild(&mut self) -> Result<()> {
        let records = self.store.load_all()?;
        self.entries = records.into_iter().map(|r| (r.id.clone(), r)).collect();
        let now = Utc::now();
        self.metadata = CacheMetadata {
            last_built: Some(now),
            last_updated: Some(now),
            total_documents: self.entries.len(),
            cache_version: CACHE_VERSION,
        };
        self.persist()
    }

    /// Write a record through to the store, update the in-memory map,
    /// and persist the snapshot and metadata.
    ///
    /// The cache is valid immediately afterward; the record is visible
    /// to retrieval as soon as this returns.
    pub fn upsert(&mut self, record: DocumentRecord) -> Result<()> {
        self.store.put(&record)?;
        self.entries.insert(record.id.clone(), record);
        self.touch();
        self.persist()
    }

    /// Remove a record from the store and the cache. Idempotent.
    pub fn remove(&mut self, id: &str) -> Result<()> {
        self.store.delete(id)?;
        self.entries.remove(id);
        self.touch();
        self.persist()
    }

    /// Delete the persisted snapshot and metadata artifacts, then
    /// rebuild from the record store. Operator remedy for suspected
    /// drift.
    pub fn invalidate(&mut self) -> Result<()> {
        remove_if_present(&self.snapshot_path)?;
        remove_if_present(&self.metadata_path)?;
        self.rebuild()
    }

    /// Look up a cached record by id.
    pub fn get(&self, id: &str) -> Result<&DocumentRecord> {
        self.entries
            .get(id)
            .ok_or_else(|| crate::error::Error::NotFound(id.to_string()))
    }

    /// Summaries of all cached documents, ordered by id.
    pub fn list(&self) -> Vec<DocumentSummary> {
        let mut summaries: Vec<DocumentSummary> = self
            .entries
            .values()
            .map(|r| DocumentSummary {
                id: r.id.clone(),
                filename: r.original_filename.clone(),
                added_date: r.added_date,
            })
            .collect();
        summaries.sort_by(|a, b| a.id.cmp(&b.id));
        summaries
    }

    pub fn entries(&self) -> &HashMap<String, DocumentRecord> {
        &self.entries
    }

    pub fn metadata(&self) -> &CacheMetadata {
        &self.metadata
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Diagnostic pass over all entries reporting the distinct
    /// embedding lengths and flagging zero-length or off-expected
    /// vectors. Does not mutate state; useful when the embedding
    /// provider changes models.
    pub fn check_dimensions(&self, expected: usize) -> DimensionReport {
        let mut lengths: BTreeMap<usize, usize> = BTreeMap::new();
        let mut zero_length = Vec::new();
        let mut off_expected = Vec::new();
        for (id, record) in &self.entries {
            let len = record.embedding.len();
            *lengths.entry(len).or_insert(0) += 1;
            if len == 0 {
                zero_length.push(id.clone());
            } else if len != expected {
                off_expected.push(id.clone());
            }
        }
        zero_length.sort();
        off_expected.sort();
        DimensionReport {
            expected,
            lengths,
            zero_length,
            off_expected,
        }
    }

    fn touch(&mut self) {
        self.metadata.last_updated = Some(Utc::now());
        self.metadata.total_documents = self.entries.len();
        if self.metadata.cache_version == 0 {
            self.metadata.cache_version = CACHE_VERSION;
        }
    }

    /// Persist the snapshot and metadata, each via temp-file-plus-rename.
    fn persist(&self) -> Result<()> {
        let records: Vec<&DocumentRecord> = self.entries.values().collect();
        write_atomic(&self.snapshot_path, &serde_json::to_vec(&records)?)?;
        write_atomic(
            &self.metadata_path,
            &serde_json::to_vec_pretty(&self.metadata)?,
        )?;
        Ok(())
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

fn remove_if_present(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}
