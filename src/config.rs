use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub search: SearchConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    #[serde(default = "default_records_dir")]
    pub records_dir: PathBuf,
    #[serde(default = "default_snapshot_path")]
    pub snapshot_path: PathBuf,
    #[serde(default = "default_metadata_path")]
    pub metadata_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            records_dir: default_records_dir(),
            snapshot_path: default_snapshot_path(),
            metadata_path: default_metadata_path(),
        }
    }
}

fn default_records_dir() -> PathBuf {
    PathBuf::from("./data/records")
}
fn default_snapshot_path() -> PathBuf {
    PathBuf::from("./data/cache_snapshot.json")
}
fn default_metadata_path() -> PathBuf {
    PathBuf::from("./data/cache_metadata.json")
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_embedding_model")]
    pub model: String,
    #[serde(default = "default_dims")]
    pub dims: usize,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: default_embedding_model(),
            dims: default_dims(),
            api_base: default_api_base(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_embedding_model() -> String {
    "text-embedding-ada-002".to_string()
}
fn default_dims() -> usize {
    1536
}
fn default_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChatConfig {
    #[serde(default = "default_chat_model")]
    pub model: String,
    /// How many retrieved documents to pack into the prompt.
    #[serde(default = "default_context_documents")]
    pub context_documents: usize,
    /// Retrieval threshold for prompt context; deliberately lower than
    /// the search default so the chat layer sees looser matches.
    #[serde(default = "default_context_threshold")]
    pub context_threshold: f32,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            model: default_chat_model(),
            context_documents: default_context_documents(),
            context_threshold: default_context_threshold(),
        }
    }
}

fn default_chat_model() -> String {
    "gpt-4o-mini".to_string()
}
fn default_context_documents() -> usize {
    3
}
fn default_context_threshold() -> f32 {
    0.3
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetryConfig {
    /// Total attempts per remote call, including the first.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Linear backoff step for rate-limited attempts (seconds).
    #[serde(default = "default_rate_limit_backoff_secs")]
    pub rate_limit_backoff_secs: u64,
    /// Fixed delay after timeout or connection failures (seconds).
    #[serde(default = "default_transient_delay_secs")]
    pub transient_delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            rate_limit_backoff_secs: default_rate_limit_backoff_secs(),
            transient_delay_secs: default_transient_delay_secs(),
        }
    }
}

fn default_max_retries() -> u32 {
    3
}
fn default_rate_limit_backoff_secs() -> u64 {
    2
}
fn default_transient_delay_secs() -> u64 {
    1
}

#[derive(Debug, Deserialize, Clone)]
pub struct SearchConfig {
    /// Minimum similarity (inclusive) for a result to rank.
    #[serde(default = "default_threshold")]
    pub default_threshold: f32,
    /// Result content is truncated to this many characters.
    #[serde(default = "default_preview_chars")]
    pub content_preview_chars: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_threshold: default_threshold(),
            content_preview_chars: default_preview_chars(),
        }
    }
}

fn default_threshold() -> f32 {
    0.7
}
fn default_preview_chars() -> usize {
    2000
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if config.embedding.dims == 0 {
        anyhow::bail!("embedding.dims must be > 0");
    }
    if config.embedding.timeout_secs == 0 {
        anyhow::bail!("embedding.timeout_secs must be > 0");
    }

    if config.retry.max_retries == 0 {
        anyhow::bail!("retry.max_retries must be >= 1");
    }

    if !(-1.0..=1.0).contains(&config.search.default_threshold) {
        anyhow::bail!("search.default_threshold must be in [-1.0, 1.0]");
    }
    if config.search.content_preview_chars == 0 {
        anyhow::bail!("search.content_preview_chars must be > 0");
    }

    if !(-1.0..=1.0).contains(&config.chat.context_threshold) {
        anyhow::bail!("chat.context_threshold must be in [-1.0, 1.0]");
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn load(content: &str) -> Result<Config> {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("semdex.toml");
        fs::write(&path, content).unwrap();
        load_config(&path)
    }

    #[test]
    fn empty_file_uses_defaults() {
        let config = load("").unwrap();
        assert_eq!(config.embedding.model, "text-embedding-ada-002");
        assert_eq!(config.embedding.dims, 1536);
        assert_eq!(config.retry.max_retries, 3);
        assert_eq!(config.search.default_threshold, 0.7);
        assert_eq!(config.search.content_preview_chars, 2000);
    }

    #[test]
    fn partial_sections_fill_in() {
        let config = load(
            r#"
[embedding]
model = "text-embedding-3-small"
dims = 512

[retry]
max_retries = 5
"#,
        )
        .unwrap();
        assert_eq!(config.embedding.model, "text-embedding-3-small");
        assert_eq!(config.embedding.dims, 512);
        assert_eq!(config.retry.max_retries, 5);
        assert_eq!(config.retry.rate_limit_backoff_secs, 2);
    }

    #[test]
    fn zero_dims_is_rejected() {
        assert!(load("[embedding]\ndims = 0\n").is_err());
    }

    #[test]
    fn zero_retries_is_rejected() {
        assert!(load("[retry]\nmax_retries = 0\n").is_err());
    }

    #[test]
    fn out_of_range_threshold_is_rejected() {
        assert!(load("[search]\ndefault_threshold = 1.5\n").is_err());
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(load_config(Path::new("/nonexistent/semdex.toml")).is_err());
    }
}
