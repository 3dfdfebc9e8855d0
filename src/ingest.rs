//! Ingestion pipeline: source file → text → embedding → cached record.
//!
//! One synchronous flow per call: resolve the file type, extract text,
//! request an embedding through the retry wrapper, build the record,
//! and write it through the cache. Any failure before the final upsert
//! leaves no partial state — no half-created record, no cache
//! mutation, and no embedding request for unusable input.

use std::path::Path;

use chrono::Utc;

use crate::cache::DocumentCache;
use crate::error::{Error, Result};
use crate::extract::{extract_text, FileType};
use crate::models::DocumentRecord;
use crate::provider::EmbeddingClient;
use crate::retry::{call_with_retry, RetryPolicy};

/// Ingest one file and return its document id.
///
/// The id is the filename stem; ingesting another file with the same
/// stem overwrites the prior record (last-write-wins). Empty or
/// whitespace-only extracted text fails with [`Error::EmptyContent`]
/// before any remote call is made. The new record is visible to
/// retrieval as soon as this returns.
pub async fn ingest(
    cache: &mut DocumentCache,
    client: &dyn EmbeddingClient,
    policy: &RetryPolicy,
    path: &Path,
) -> Result<String> {
    let file_type = FileType::from_path(path)?;

    let id = path
        .file_stem()
        .and_then(|s| s.to_str())
        .map(str::to_string)
        .ok_or_else(|| Error::UnsupportedFileType(path.display().to_string()))?;

    let content = extract_text(path, file_type)?;
    if content.trim().is_empty() {
        return Err(Error::EmptyContent(path.to_path_buf()));
    }

    let embedding = call_with_retry(policy, "embedding request", || client.embed(&content)).await?;

    let record = DocumentRecord {
        id: id.clone(),
        original_filename: path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(&id)
            .to_string(),
        original_path: path.display().to_string(),
        file_type: file_type.as_str().to_string(),
        content,
        embedding,
        added_date: Utc::now(),
    };

    cache.upsert(record)?;
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StorageConfig;
    use async_trait::async_trait;
    use std::fs;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tempfile::TempDir;

    struct FixedEmbedder {
        vector: Vec<f32>,
        calls: AtomicU32,
    }

    impl FixedEmbedder {
        fn new(vector: Vec<f32>) -> Self {
            Self {
                vector,
                calls: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl EmbeddingClient for FixedEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.vector.clone())
        }
    }

    fn open_cache(tmp: &TempDir) -> DocumentCache {
        DocumentCache::open(&StorageConfig {
            records_dir: tmp.path().join("records"),
            snapshot_path: tmp.path().join("cache_snapshot.json"),
            metadata_path: tmp.path().join("cache_metadata.json"),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn ingests_a_text_file() {
        let tmp = TempDir::new().unwrap();
        let mut cache = open_cache(&tmp);
        let file = tmp.path().join("alpha.txt");
        fs::write(&file, "Rust systems programming notes").unwrap();

        let embedder = FixedEmbedder::new(vec![1.0, 0.0, 0.0]);
        let id = ingest(&mut cache, &embedder, &RetryPolicy::default(), &file)
            .await
            .unwrap();

        assert_eq!(id, "alpha");
        let record = cache.get("alpha").unwrap();
        assert_eq!(record.original_filename, "alpha.txt");
        assert_eq!(record.file_type, "text");
        assert_eq!(record.content, "Rust systems programming notes");
        assert_eq!(record.embedding, vec![1.0, 0.0, 0.0]);
        assert!(cache.is_valid().unwrap());
    }

    #[tokio::test]
    async fn empty_extraction_makes_no_record_and_no_remote_call() {
        let tmp = TempDir::new().unwrap();
        let mut cache = open_cache(&tmp);
        let file = tmp.path().join("blank.txt");
        fs::write(&file, "   \n\t  ").unwrap();

        let embedder = FixedEmbedder::new(vec![1.0]);
        let result = ingest(&mut cache, &embedder, &RetryPolicy::default(), &file).await;

        assert!(matches!(result, Err(Error::EmptyContent(_))));
        assert!(cache.is_empty());
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unsupported_extension_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let mut cache = open_cache(&tmp);
        let file = tmp.path().join("data.bin");
        fs::write(&file, "binary").unwrap();

        let embedder = FixedEmbedder::new(vec![1.0]);
        let result = ingest(&mut cache, &embedder, &RetryPolicy::default(), &file).await;
        assert!(matches!(result, Err(Error::UnsupportedFileType(_))));
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn same_stem_overwrites_prior_record() {
        let tmp = TempDir::new().unwrap();
        let mut cache = open_cache(&tmp);

        let first = tmp.path().join("alpha.txt");
        fs::write(&first, "first version").unwrap();
        let embedder = FixedEmbedder::new(vec![0.5, 0.5]);
        ingest(&mut cache, &embedder, &RetryPolicy::default(), &first)
            .await
            .unwrap();

        let second = tmp.path().join("alpha.md");
        fs::write(&second, "second version").unwrap();
        ingest(&mut cache, &embedder, &RetryPolicy::default(), &second)
            .await
            .unwrap();

        assert_eq!(cache.len(), 1);
        let record = cache.get("alpha").unwrap();
        assert_eq!(record.content, "second version");
        assert_eq!(record.file_type, "markdown");
    }

    #[tokio::test]
    async fn provider_failure_leaves_no_partial_state() {
        struct FailingEmbedder;

        #[async_trait]
        impl EmbeddingClient for FailingEmbedder {
            async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
                Err(Error::Provider("401 unauthorized".into()))
            }
        }

        let tmp = TempDir::new().unwrap();
        let mut cache = open_cache(&tmp);
        let file = tmp.path().join("alpha.txt");
        fs::write(&file, "some text").unwrap();

        let result = ingest(&mut cache, &FailingEmbedder, &RetryPolicy::default(), &file).await;
        assert!(matches!(result, Err(Error::Provider(_))));
        assert!(cache.is_empty());
        assert!(cache.is_valid().unwrap());
    }
}
