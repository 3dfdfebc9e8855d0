//! Core data models used throughout semdex.
//!
//! These types represent the documents, cache bookkeeping, and search
//! results that flow through the ingestion and retrieval pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Snapshot format version, persisted in the metadata sidecar. Bumped
/// when the record or snapshot shape changes; a sidecar carrying a
/// different version marks the snapshot stale, and the cache is
/// rebuilt from the record store.
pub const CACHE_VERSION: u32 = 1;

/// One ingested document: extracted text, its embedding, and
/// provenance metadata. Immutable once written except for full
/// replacement via re-ingestion under the same id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    /// Stable identifier derived from the source filename stem.
    pub id: String,
    pub original_filename: String,
    pub original_path: String,
    pub file_type: String,
    /// Extracted UTF-8 text, unbounded length.
    pub content: String,
    /// Fixed-length embedding vector (model-dependent, e.g. 1536).
    pub embedding: Vec<f32>,
    pub added_date: DateTime<Utc>,
}

/// Advisory bookkeeping persisted alongside the cache snapshot.
///
/// Diagnostics only — never used to gate correctness. The sole
/// validity criterion is id-set equality with the record store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheMetadata {
    pub last_built: Option<DateTime<Utc>>,
    pub last_updated: Option<DateTime<Utc>>,
    pub total_documents: usize,
    pub cache_version: u32,
}

/// Lightweight listing entry for a cached document.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentSummary {
    pub id: String,
    pub filename: String,
    pub added_date: DateTime<Utc>,
}

/// A ranked retrieval result. Ephemeral, never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct SimilarityResult {
    pub id: String,
    pub filename: String,
    pub file_type: String,
    /// Cosine similarity in `[-1.0, 1.0]`.
    pub similarity: f32,
    /// Document text, truncated to the configured preview length.
    pub content: String,
}
