//! # Session RAG - Session-Scoped Codebase Indexing and Retrieval
//!
//! Ingests an uploaded codebase, splits it into chunks, embeds each chunk via
//! a remote embedding service, and persists the vectors in a shared vector
//! store collection partitioned per upload session. Nearest-neighbor
//! retrieval against a session powers downstream chat, search, and
//! summarization features.
//!
//! ## Architecture
//!
//! ```text
//! files ──► IndexingPipeline ──► Chunker
//!                │                  │ chunks
//!                │            run_bounded (embedding ceiling)
//!                │                  │
//!                │            EmbeddingProvider (remote HTTP)
//!                │                  │ records
//!                └────────────► VectorStoreGateway ──► VectorBackend (REST)
//!                                   insert batches, index create + poll
//!
//! query ──► RetrievalService ──► EmbeddingProvider ──► VectorStoreGateway
//! ```
//!
//! Concurrency is bounded at two independent levels (files, then chunks per
//! file) by [`runner::run_bounded`], the pipeline's sole admission-control
//! mechanism. Per-item failures reduce yield but never abort a run; store
//! failures abort the run without rolling back inserted vectors.
//!
//! ## Usage Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use session_rag::config::Config;
//! use session_rag::embedding::RemoteEmbedder;
//! use session_rag::indexer::IndexingPipeline;
//! use session_rag::types::FileNode;
//! use session_rag::vector_store::{HttpVectorStore, VectorStoreGateway};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::new()?;
//!     let embedder = Arc::new(RemoteEmbedder::new(&config.embedding, "")?);
//!     let backend = Arc::new(HttpVectorStore::new(&config.vector_store, "")?);
//!     let gateway = Arc::new(VectorStoreGateway::new(
//!         backend,
//!         &config.vector_store,
//!         config.embedding.dimension,
//!     ));
//!     let pipeline = IndexingPipeline::with_config(embedder, gateway, config.indexing.clone());
//!
//!     let files = vec![FileNode {
//!         path: "src/main.py".into(),
//!         extension: "py".into(),
//!         content: "def f(): pass".into(),
//!     }];
//!     let summary = pipeline.index_session("session-1", files).await?;
//!     println!("indexed {} chunks", summary.total_chunks);
//!     Ok(())
//! }
//! ```

/// Configuration with serde defaults, TOML files, and environment overrides
pub mod config;

/// Embedding generation via a remote embedding service
pub mod embedding;

/// Error types and utilities
pub mod error;

/// Chunking and the indexing orchestrator
pub mod indexer;

/// Session-scoped nearest-neighbor retrieval
pub mod retrieval;

/// Bounded-concurrency batch runner
pub mod runner;

/// Request/response and pipeline data types
pub mod types;

/// Vector store gateway and backends
pub mod vector_store;
