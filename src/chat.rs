//! Chat orchestration over retrieval results.
//!
//! Thin layer: embed the question, pull the most relevant cached
//! documents, pack their previews into a system prompt, and ask the
//! completion provider. All remote calls go through the shared retry
//! wrapper.

use crate::cache::DocumentCache;
use crate::config::{ChatConfig, SearchConfig};
use crate::error::Result;
use crate::provider::{CompletionClient, EmbeddingClient};
use crate::retry::{call_with_retry, RetryPolicy};
use crate::search::search_by_query;

const SYSTEM_PREAMBLE: &str = "You are a helpful assistant answering questions about a \
    document collection. Answer using only the documents provided below. If the documents \
    do not contain the answer, say so.";

/// Answer a question using the cached documents as context.
///
/// Returns a canned response without calling the completion provider
/// when retrieval finds nothing above the chat threshold.
pub async fn ask(
    cache: &DocumentCache,
    embedder: &dyn EmbeddingClient,
    completer: &dyn CompletionClient,
    policy: &RetryPolicy,
    chat: &ChatConfig,
    search: &SearchConfig,
    question: &str,
) -> Result<String> {
    let results = search_by_query(
        cache,
        embedder,
        policy,
        question,
        chat.context_threshold,
        search.content_preview_chars,
    )
    .await?;

    if results.is_empty() {
        return Ok("I could not find any relevant documents for that question.".to_string());
    }

    let mut system_prompt = String::from(SYSTEM_PREAMBLE);
    for result in results.iter().take(chat.context_documents) {
        system_prompt.push_str(&format!(
            "\n\n--- {} (similarity {:.2}) ---\n{}",
            result.filename, result.similarity, result.content
        ));
    }

    call_with_retry(policy, "completion request", || {
        completer.complete(&system_prompt, question)
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StorageConfig;
    use crate::models::DocumentRecord;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::Mutex;
    use tempfile::TempDir;

    struct FixedEmbedder(Vec<f32>);

    #[async_trait]
    impl EmbeddingClient for FixedEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(self.0.clone())
        }
    }

    struct RecordingCompleter {
        seen_system: Mutex<Option<String>>,
    }

    #[async_trait]
    impl CompletionClient for RecordingCompleter {
        async fn complete(&self, system_prompt: &str, _user_prompt: &str) -> Result<String> {
            *self.seen_system.lock().unwrap() = Some(system_prompt.to_string());
            Ok("an answer".to_string())
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
    async fn packs_retrieved_documents_into_the_prompt() {
        let tmp = TempDir::new().unwrap();
        let mut cache = open_cache(&tmp);
        cache
            .upsert(DocumentRecord {
                id: "taxonomy".to_string(),
                original_filename: "taxonomy.txt".to_string(),
                original_path: "/tmp/taxonomy.txt".to_string(),
                file_type: "text".to_string(),
                content: "Genera under the tribe Unionini".to_string(),
                embedding: vec![1.0, 0.0],
                added_date: Utc::now(),
            })
            .unwrap();

        let completer = RecordingCompleter {
            seen_system: Mutex::new(None),
        };
        let answer = ask(
            &cache,
            &FixedEmbedder(vec![1.0, 0.0]),
            &completer,
            &RetryPolicy::default(),
            &ChatConfig::default(),
            &SearchConfig::default(),
            "What genera are listed?",
        )
        .await
        .unwrap();

        assert_eq!(answer, "an answer");
        let system = completer.seen_system.lock().unwrap().clone().unwrap();
        assert!(system.contains("taxonomy.txt"));
        assert!(system.contains("Genera under the tribe Unionini"));
    }

    #[tokio::test]
    async fn empty_retrieval_skips_the_completion_call() {
        struct PanickingCompleter;

        #[async_trait]
        impl CompletionClient for PanickingCompleter {
            async fn complete(&self, _s: &str, _u: &str) -> Result<String> {
                panic!("completion must not be called");
            }
        }

        let tmp = TempDir::new().unwrap();
        let cache = open_cache(&tmp);
        let answer = ask(
            &cache,
            &FixedEmbedder(vec![1.0, 0.0]),
            &PanickingCompleter,
            &RetryPolicy::default(),
            &ChatConfig::default(),
            &SearchConfig::default(),
            "anything",
        )
        .await
        .unwrap();
        assert!(answer.contains("could not find"));
    }
}
