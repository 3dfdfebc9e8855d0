//! # semdex
//!
//! A local-first semantic document index.
//!
//! semdex ingests heterogeneous source files (text, markdown, PDF,
//! Word, images), embeds their extracted text via a remote provider,
//! persists one JSON record per document, mirrors the record set in an
//! in-memory cache with a persisted snapshot, and answers ranked
//! cosine-similarity queries over the cached embeddings.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────┐   ┌────────────┐   ┌──────────────┐
//! │  Extract  │──▶│  Ingest    │──▶│ Record Store │
//! │ txt/md/pdf│   │ embed+store│   │ <id>.json    │
//! └───────────┘   └─────┬──────┘   └──────┬───────┘
//!                       │                 │ rebuild / validity
//!                       ▼                 ▼
//!                 ┌────────────────────────────┐
//!                 │       Document Cache       │
//!                 │ snapshot + metadata on disk│
//!                 └─────────────┬──────────────┘
//!                               ▼
//!                 ┌────────────────────────────┐
//!                 │  Search (cosine, ranked)   │
//!                 └────────────────────────────┘
//! ```
//!
//! The cache self-heals: on startup it loads its snapshot and rebuilds
//! from the record store whenever the two disagree on the set of ids.
//! The record store owns durable truth; the cache owns the in-process
//! view.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`error`] | Typed error taxonomy |
//! | [`store`] | One-file-per-document record persistence |
//! | [`cache`] | In-memory cache with snapshot, validity check, rebuild |
//! | [`extract`] | Per-format text extraction |
//! | [`ingest`] | Ingestion pipeline |
//! | [`search`] | Ranked similarity retrieval |
//! | [`similarity`] | Cosine similarity |
//! | [`provider`] | Embedding and completion provider clients |
//! | [`retry`] | Retry-with-backoff wrapper for provider calls |
//! | [`chat`] | Chat orchestration over retrieval results |
//!
//! ## Concurrency model
//!
//! Single process, single writer. Callers serialize access to one
//! [`cache::DocumentCache`]; the snapshot and record files are written
//! without file locking, so concurrent processes sharing a storage
//! directory are unsupported.

pub mod cache;
pub mod chat;
pub mod config;
pub mod error;
pub mod extract;
pub mod ingest;
pub mod models;
pub mod provider;
pub mod retry;
pub mod search;
pub mod similarity;
pub mod store;
