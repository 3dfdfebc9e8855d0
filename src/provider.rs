//! Remote provider clients for embeddings and chat completions.
//!
//! [`EmbeddingClient`] and [`CompletionClient`] are the seams the
//! ingestion, retrieval, and chat layers depend on; tests substitute
//! mocks. [`OpenAiClient`] implements both against the OpenAI API.
//!
//! Failures map onto the typed classes the retry wrapper keys off:
//! - HTTP 429 → [`Error::RateLimited`]
//! - request timeout → [`Error::Timeout`]
//! - connection-level failure → [`Error::ConnectionFailed`]
//! - anything else (auth, malformed request, server error) →
//!   [`Error::Provider`], never retried

use std::time::Duration;

use async_trait::async_trait;

use crate::config::{ChatConfig, EmbeddingConfig};
use crate::error::{Error, Result};

/// Produces an embedding vector for a text.
#[async_trait]
pub trait EmbeddingClient: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Produces a chat completion from a system and user prompt.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String>;
}

/// OpenAI-backed client for both provider roles.
pub struct OpenAiClient {
    api_base: String,
    api_key: String,
    embedding_model: String,
    chat_model: String,
    http: reqwest::Client,
}

impl OpenAiClient {
    /// Build a client from configuration. Reads the API key from the
    /// `OPENAI_API_KEY` environment variable.
    pub fn new(embedding: &EmbeddingConfig, chat: &ChatConfig) -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| Error::Config("OPENAI_API_KEY environment variable not set".into()))?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(embedding.timeout_secs))
            .build()
            .map_err(|e| Error::Config(format!("could not build HTTP client: {}", e)))?;
        Ok(Self {
            api_base: embedding.api_base.trim_end_matches('/').to_string(),
            api_key,
            embedding_model: embedding.model.clone(),
            chat_model: chat.model.clone(),
            http,
        })
    }

    async fn post_json(&self, endpoint: &str, body: &serde_json::Value) -> Result<serde_json::Value> {
        let url = format!("{}/{}", self.api_base, endpoint);
        let response = self
            .http
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(body)
            .send()
            .await
            .map_err(classify_reqwest_error)?;

        let status = response.status();
        if status.is_success() {
            return response.json().await.map_err(classify_reqwest_error);
        }

        let body_text = response.text().await.unwrap_or_default();
        if status.as_u16() == 429 {
            return Err(Error::RateLimited(body_text));
        }
        Err(Error::Provider(format!("{}: {}", status, body_text)))
    }
}

/// Map a reqwest failure onto the retryable error classes.
fn classify_reqwest_error(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::Timeout(e.to_string())
    } else if e.is_connect() {
        Error::ConnectionFailed(e.to_string())
    } else {
        Error::Provider(e.to_string())
    }
}

#[async_trait]
impl EmbeddingClient for OpenAiClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let body = serde_json::json!({
            "model": self.embedding_model,
            "input": text,
        });
        let json = self.post_json("embeddings", &body).await?;
        let embedding = json
            .get("data")
            .and_then(|d| d.as_array())
            .and_then(|d| d.first())
            .and_then(|item| item.get("embedding"))
            .and_then(|e| e.as_array())
            .ok_or_else(|| Error::Provider("invalid embeddings response shape".into()))?;
        Ok(embedding
            .iter()
            .map(|v| v.as_f64().unwrap_or(0.0) as f32)
            .collect())
    }
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        let body = serde_json::json!({
            "model": self.chat_model,
            "messages": [
                { "role": "system", "content": system_prompt },
                { "role": "user", "content": user_prompt },
            ],
        });
        let json = self.post_json("chat/completions", &body).await?;
        json.get("choices")
            .and_then(|c| c.as_array())
            .and_then(|c| c.first())
            .and_then(|choice| choice.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| Error::Provider("invalid completions response shape".into()))
    }
}
