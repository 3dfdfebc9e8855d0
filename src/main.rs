//! # semdex CLI
//!
//! The `semdex` binary manages a local collection of embedded
//! documents and searches it by similarity.
//!
//! ## Usage
//!
//! ```bash
//! semdex --config ./config/semdex.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `semdex add <file>` | Ingest a file: extract text, embed, store |
//! | `semdex list` | List all cached documents |
//! | `semdex get <id>` | Print a stored document |
//! | `semdex delete <id>` | Remove a document from store and cache |
//! | `semdex similar <id>` | Rank documents similar to a stored one |
//! | `semdex search "<text>"` | Rank documents similar to free text |
//! | `semdex ask "<question>"` | Answer a question from the collection |
//! | `semdex rebuild` | Rebuild the cache from the record store |
//! | `semdex invalidate` | Drop cache artifacts and rebuild |
//! | `semdex check-dims` | Report embedding dimension health |
//!
//! Commands that call the embedding or completion provider (`add`,
//! `search`, `ask`) need `OPENAI_API_KEY` in the environment; the rest
//! work offline against the local store.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use semdex::cache::DocumentCache;
use semdex::chat;
use semdex::config::{load_config, Config};
use semdex::ingest::ingest;
use semdex::models::SimilarityResult;
use semdex::provider::OpenAiClient;
use semdex::retry::RetryPolicy;
use semdex::search::{find_similar, search_by_query};

/// semdex — a local-first semantic document index.
///
/// All commands accept a `--config` flag pointing to a TOML
/// configuration file. Every setting has a default; an empty file is a
/// valid configuration.
#[derive(Parser)]
#[command(
    name = "semdex",
    about = "semdex — a local-first semantic document index",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/semdex.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Ingest a file into the collection.
    ///
    /// Extracts text (txt, md, pdf, docx; images need an OCR backend),
    /// requests an embedding, and stores the record. The document id
    /// is the filename stem; re-adding a file with the same stem
    /// replaces the prior record.
    Add {
        /// Path to the source file.
        file: PathBuf,
    },

    /// List all cached documents.
    List,

    /// Print a stored document's metadata and content.
    Get {
        /// Document id (filename stem).
        id: String,
    },

    /// Remove a document from the store and the cache.
    Delete {
        /// Document id (filename stem).
        id: String,
    },

    /// Rank documents similar to a stored document.
    Similar {
        /// Document id to compare against.
        id: String,

        /// Minimum similarity (inclusive). Defaults to the configured
        /// search threshold.
        #[arg(long)]
        threshold: Option<f32>,
    },

    /// Rank documents similar to free-form query text.
    ///
    /// Requests a fresh embedding for the query, so this needs the
    /// embedding provider available.
    Search {
        /// The query text.
        query: String,

        /// Minimum similarity (inclusive). Defaults to the configured
        /// search threshold.
        #[arg(long)]
        threshold: Option<f32>,
    },

    /// Answer a question using the most relevant cached documents as
    /// context for the completion provider.
    Ask {
        /// The question to answer.
        question: String,
    },

    /// Rebuild the in-memory cache and its snapshot from the record
    /// store. Corrupt record files are skipped with a warning.
    Rebuild,

    /// Delete the cache snapshot and metadata artifacts, then rebuild.
    /// Use when cache drift is suspected.
    Invalidate,

    /// Report the distinct embedding dimensions across the cache and
    /// flag zero-length or off-expected vectors. Useful after an
    /// embedding model change.
    CheckDims,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;
    let policy = RetryPolicy::from_config(&config.retry);

    // Opening the cache self-heals: snapshot load, validity check,
    // rebuild if stale.
    let mut cache = DocumentCache::open(&config.storage)?;

    match cli.command {
        Commands::Add { file } => {
            let client = OpenAiClient::new(&config.embedding, &config.chat)?;
            let id = ingest(&mut cache, &client, &policy, &file).await?;
            println!("added '{}'", id);
            println!("  documents: {}", cache.len());
        }

        Commands::List => {
            if cache.is_empty() {
                println!("No documents.");
            } else {
                for doc in cache.list() {
                    println!(
                        "{}  {}  (added {})",
                        doc.id,
                        doc.filename,
                        doc.added_date.format("%Y-%m-%d %H:%M")
                    );
                }
                println!("{} document(s)", cache.len());
            }
        }

        Commands::Get { id } => {
            let record = cache.get(&id)?;
            println!("id: {}", record.id);
            println!("filename: {}", record.original_filename);
            println!("path: {}", record.original_path);
            println!("type: {}", record.file_type);
            println!("added: {}", record.added_date.to_rfc3339());
            println!("embedding dims: {}", record.embedding.len());
            println!();
            println!("{}", record.content);
        }

        Commands::Delete { id } => {
            cache.remove(&id)?;
            println!("deleted '{}'", id);
            println!("  documents: {}", cache.len());
        }

        Commands::Similar { id, threshold } => {
            let threshold = threshold.unwrap_or(config.search.default_threshold);
            let results = find_similar(
                &cache,
                &id,
                threshold,
                config.search.content_preview_chars,
            )?;
            print_results(&results, threshold);
        }

        Commands::Search { query, threshold } => {
            let threshold = threshold.unwrap_or(config.search.default_threshold);
            let client = OpenAiClient::new(&config.embedding, &config.chat)?;
            let results = search_by_query(
                &cache,
                &client,
                &policy,
                &query,
                threshold,
                config.search.content_preview_chars,
            )
            .await?;
            print_results(&results, threshold);
        }

        Commands::Ask { question } => {
            let client = OpenAiClient::new(&config.embedding, &config.chat)?;
            let answer = chat::ask(
                &cache,
                &client,
                &client,
                &policy,
                &config.chat,
                &config.search,
                &question,
            )
            .await?;
            println!("{}", answer);
        }

        Commands::Rebuild => {
            cache.rebuild()?;
            println!("rebuilt cache");
            println!("  documents: {}", cache.len());
        }

        Commands::Invalidate => {
            cache.invalidate()?;
            println!("invalidated and rebuilt cache");
            println!("  documents: {}", cache.len());
        }

        Commands::CheckDims => {
            let report = cache.check_dimensions(config.embedding.dims);
            println!("expected dims: {}", report.expected);
            for (len, count) in &report.lengths {
                println!("  dims {}: {} document(s)", len, count);
            }
            if !report.zero_length.is_empty() {
                println!("zero-length embeddings: {}", report.zero_length.join(", "));
            }
            if !report.off_expected.is_empty() {
                println!(
                    "off-expected embeddings: {}",
                    report.off_expected.join(", ")
                );
            }
            if report.is_healthy() {
                println!("ok");
            }
        }
    }

    Ok(())
}

fn print_results(results: &[SimilarityResult], threshold: f32) {
    if results.is_empty() {
        println!("No results at threshold {:.2}.", threshold);
        return;
    }
    for (i, result) in results.iter().enumerate() {
        println!(
            "{}. {} ({})  similarity {:.4}",
            i + 1,
            result.filename,
            result.id,
            result.similarity
        );
        let preview: String = result.content.chars().take(160).collect();
        println!("   {}", preview.replace('\n', " "));
    }
    println!("{} result(s)", results.len());
}
