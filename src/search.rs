//! Ranked similarity retrieval over the cached documents.
//!
//! Both entry points are linear scans over the current cache contents:
//! [`find_similar`] starts from a stored document's embedding,
//! [`search_by_query`] from a fresh embedding of free text. Results at
//! or above the threshold are sorted descending by similarity; callers
//! must not depend on any particular tie-break beyond that. Entries
//! whose embedding length differs from the query's score 0.0 and fall
//! out at any positive threshold — mismatched-model embeddings are
//! never treated as similar.

use crate::cache::DocumentCache;
use crate::error::Result;
use crate::models::{DocumentRecord, SimilarityResult};
use crate::provider::EmbeddingClient;
use crate::retry::{call_with_retry, RetryPolicy};
use crate::similarity::cosine_similarity;

/// Find documents similar to the stored document `query_id`.
///
/// The query document itself is excluded from the results. Fails with
/// `NotFound` when `query_id` is not cached.
pub fn find_similar(
    cache: &DocumentCache,
    query_id: &str,
    threshold: f32,
    preview_chars: usize,
) -> Result<Vec<SimilarityResult>> {
    let query = cache.get(query_id)?;
    Ok(scan(
        cache,
        &query.embedding,
        threshold,
        Some(query_id),
        preview_chars,
    ))
}

/// Find documents similar to free-form query text.
///
/// Requests a fresh embedding for the query through the retry wrapper,
/// then scans all cached entries (no self-exclusion — the query is not
/// a stored document).
pub async fn search_by_query(
    cache: &DocumentCache,
    client: &dyn EmbeddingClient,
    policy: &RetryPolicy,
    query_text: &str,
    threshold: f32,
    preview_chars: usize,
) -> Result<Vec<SimilarityResult>> {
    let embedding =
        call_with_retry(policy, "query embedding request", || client.embed(query_text)).await?;
    Ok(scan(cache, &embedding, threshold, None, preview_chars))
}

/// Score every cached entry against `query`, keep those at or above
/// `threshold`, and sort descending by similarity (stable).
fn scan(
    cache: &DocumentCache,
    query: &[f32],
    threshold: f32,
    exclude_id: Option<&str>,
    preview_chars: usize,
) -> Vec<SimilarityResult> {
    let mut results: Vec<SimilarityResult> = cache
        .entries()
        .values()
        .filter(|record| exclude_id != Some(record.id.as_str()))
        .filter_map(|record| {
            let similarity = cosine_similarity(query, &record.embedding);
            (similarity >= threshold).then(|| to_result(record, similarity, preview_chars))
        })
        .collect();

    results.sort_by(|a, b| {
        b.similarity
            .partial_cmp(&a.similarity)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    results
}

fn to_result(record: &DocumentRecord, similarity: f32, preview_chars: usize) -> SimilarityResult {
    SimilarityResult {
        id: record.id.clone(),
        filename: record.original_filename.clone(),
        file_type: record.file_type.clone(),
        similarity,
        content: truncate_chars(&record.content, preview_chars),
    }
}

/// Truncate to at most `max` characters on a char boundary.
fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}
