//! Indexing orchestration: files in, indexed session out.
//!
//! Drives the end-to-end ingest: per-file chunking, chunk embedding behind
//! the bounded runner, then collection/insert/index through the gateway.

mod chunker;

pub use chunker::{Chunker, LineChunker};

use std::sync::Arc;
use std::time::Instant;

use crate::config::IndexingConfig;
use crate::embedding::EmbeddingProvider;
use crate::error::{EmbeddingError, IndexingError, RagError};
use crate::runner::run_bounded;
use crate::types::{EmbeddingRecord, FileNode, IndexResponse, IndexSummary};
use crate::vector_store::{VectorStoreGateway, validate_session_id};

pub struct IndexingPipeline {
    chunker: Arc<dyn Chunker>,
    embedder: Arc<dyn EmbeddingProvider>,
    gateway: Arc<VectorStoreGateway>,
    config: IndexingConfig,
}

impl IndexingPipeline {
    pub fn new(
        chunker: Arc<dyn Chunker>,
        embedder: Arc<dyn EmbeddingProvider>,
        gateway: Arc<VectorStoreGateway>,
        config: IndexingConfig,
    ) -> Self {
        Self {
            chunker,
            embedder,
            gateway,
            config,
        }
    }

    /// Build a pipeline with the line-window chunker sized by
    /// `config.chunk_lines`. Use [`IndexingPipeline::new`] to supply a
    /// custom [`Chunker`].
    pub fn with_config(
        embedder: Arc<dyn EmbeddingProvider>,
        gateway: Arc<VectorStoreGateway>,
        config: IndexingConfig,
    ) -> Self {
        let chunker = Arc::new(LineChunker::new(config.chunk_lines));
        Self::new(chunker, embedder, gateway, config)
    }

    /// Index one uploaded session end to end.
    ///
    /// Files fan out under the file-level concurrency ceiling; each file's
    /// chunks fan out again under the embedding ceiling. A chunk whose
    /// embedding call fails is dropped, not retried, and never fails its
    /// file. If nothing at all could be embedded the run reports
    /// [`IndexingError::NoEmbeddingsProduced`] without touching the store.
    ///
    /// Store failures after insertion are not rolled back: the session may
    /// hold inserted-but-unindexed vectors, and callers can delete the
    /// session and re-index.
    pub async fn index_session(
        &self,
        session_id: &str,
        files: Vec<FileNode>,
    ) -> Result<IndexSummary, RagError> {
        validate_session_id(session_id)?;
        if files.is_empty() {
            return Err(IndexingError::NoFilesProvided.into());
        }

        tracing::info!(session_id, files = files.len(), "starting indexing run");

        let processing_started = Instant::now();
        let per_file = run_bounded(
            files,
            self.config.max_concurrent_files,
            |file| file.path.clone(),
            |file| self.process_file(session_id, file),
        )
        .await;
        let records: Vec<EmbeddingRecord> = per_file.into_iter().flatten().collect();
        let processing_ms = processing_started.elapsed().as_millis() as u64;

        if records.is_empty() {
            tracing::warn!(session_id, "no embeddings produced, nothing to index");
            return Err(IndexingError::NoEmbeddingsProduced.into());
        }

        let indexing_started = Instant::now();
        self.gateway.ensure_collection().await?;
        let total_chunks = self.gateway.insert(records).await?;
        self.gateway.create_index_if_needed(total_chunks).await?;
        let indexing_ms = indexing_started.elapsed().as_millis() as u64;

        tracing::info!(
            session_id,
            total_chunks,
            processing_ms,
            indexing_ms,
            "indexing run complete"
        );

        Ok(IndexSummary {
            session_id: session_id.to_string(),
            total_chunks,
            processing_ms,
            indexing_ms,
        })
    }

    /// Wire-payload variant of [`index_session`](Self::index_session) for the
    /// ingestion layer: always yields a response, never an error.
    pub async fn index_session_response(
        &self,
        session_id: &str,
        files: Vec<FileNode>,
    ) -> IndexResponse {
        match self.index_session(session_id, files).await {
            Ok(summary) => IndexResponse::from_summary(&summary),
            Err(err) => {
                tracing::error!(session_id, error = %err, "indexing run failed");
                IndexResponse::from_error(&err, self.config.development_mode)
            }
        }
    }

    /// Chunk one file and embed its chunks under the embedding ceiling.
    ///
    /// Never fails: a file with no chunks contributes an empty batch, and
    /// failed embeddings are dropped by the runner.
    async fn process_file(
        &self,
        session_id: &str,
        file: FileNode,
    ) -> Result<Vec<EmbeddingRecord>, RagError> {
        let chunks = self.chunker.chunk(&file.content, &file.extension);
        if chunks.is_empty() {
            tracing::debug!(file = %file.path, "no chunks produced, skipping file");
            return Ok(Vec::new());
        }
        tracing::debug!(file = %file.path, chunks = chunks.len(), "embedding chunks");

        let path = file.path;
        let label_path = path.clone();

        let records = run_bounded(
            chunks,
            self.config.max_concurrent_embeddings,
            move |chunk| {
                format!(
                    "{}:{}-{}",
                    label_path,
                    chunk.start_line.unwrap_or(0),
                    chunk.end_line.unwrap_or(0)
                )
            },
            |chunk| {
                let embedder = self.embedder.clone();
                let file_path = path.clone();
                let session_id = session_id.to_string();
                async move {
                    let embedding = embedder.embed(&chunk.content).await?;
                    Ok::<_, EmbeddingError>(EmbeddingRecord {
                        content: chunk.content,
                        file_path,
                        embedding,
                        session_id,
                        start_line: chunk.start_line,
                        end_line: chunk.end_line,
                        chunk_kind: chunk.kind,
                    })
                }
            },
        )
        .await;

        Ok(records)
    }
}
