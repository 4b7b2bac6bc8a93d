//! Policy layer over a [`VectorBackend`]: collection lifecycle, insert
//! batching, index creation with readiness polling, and the session-scoped
//! query path.

use std::sync::Arc;

use tokio::time::{Duration, Instant, sleep};

use super::{IndexState, VectorBackend, VectorRow, session_filter, validate_session_id};
use crate::config::{IndexPollConfig, VectorStoreConfig};
use crate::error::{RagError, VectorStoreError};
use crate::types::{EmbeddingRecord, SearchHit};

/// Clustering parameter bounds for the vector index. Small collections get a
/// coarse index; large ones are capped to keep index-build cost bounded.
const NLIST_MIN: usize = 4;
const NLIST_MAX: usize = 128;

pub struct VectorStoreGateway {
    backend: Arc<dyn VectorBackend>,
    collection: String,
    dimension: usize,
    insert_batch_size: usize,
    poll: IndexPollConfig,
}

impl VectorStoreGateway {
    pub fn new(backend: Arc<dyn VectorBackend>, config: &VectorStoreConfig, dimension: usize) -> Self {
        Self {
            backend,
            collection: config.collection_name.clone(),
            dimension,
            insert_batch_size: config.insert_batch_size,
            poll: config.index.clone(),
        }
    }

    /// Create the collection if it does not exist yet. Idempotent.
    pub async fn ensure_collection(&self) -> Result<(), VectorStoreError> {
        if self.backend.has_collection(&self.collection).await? {
            tracing::debug!(collection = %self.collection, "collection already exists");
            return Ok(());
        }

        tracing::info!(
            collection = %self.collection,
            dimension = self.dimension,
            "creating collection"
        );
        self.backend
            .create_collection(&self.collection, self.dimension)
            .await
    }

    /// Insert records in sequential batches, each within the store's
    /// transport limit. Returns the number of rows inserted.
    ///
    /// Dimensions are validated up front so a mismatched record fails the
    /// call before anything is sent.
    pub async fn insert(&self, records: Vec<EmbeddingRecord>) -> Result<usize, VectorStoreError> {
        if records.is_empty() {
            return Ok(0);
        }

        for record in &records {
            if record.embedding.len() != self.dimension {
                return Err(VectorStoreError::DimensionMismatch {
                    expected: self.dimension,
                    actual: record.embedding.len(),
                });
            }
        }

        let total = records.len();
        let rows: Vec<VectorRow> = records.into_iter().map(VectorRow::from).collect();

        for batch in rows.chunks(self.insert_batch_size) {
            self.backend
                .insert(&self.collection, batch.to_vec())
                .await?;
            tracing::debug!(rows = batch.len(), "inserted batch");
        }

        tracing::info!(rows = total, collection = %self.collection, "insert complete");
        Ok(total)
    }

    /// Create the vector index unless one already exists, then poll until the
    /// store reports it finished.
    ///
    /// The clustering parameter scales with half the vector count, clamped to
    /// `[NLIST_MIN, NLIST_MAX]`. The poll interval starts at the configured
    /// initial value, grows by the configured factor each attempt, and is
    /// capped. Two independent bounds end the wait: wall-clock time and
    /// attempt count, whichever trips first.
    pub async fn create_index_if_needed(
        &self,
        total_vector_count: usize,
    ) -> Result<(), VectorStoreError> {
        if self.backend.describe_index(&self.collection).await?.is_some() {
            tracing::debug!(collection = %self.collection, "index already exists, skipping creation");
            return Ok(());
        }

        let nlist = clustering_nlist(total_vector_count);
        tracing::info!(
            collection = %self.collection,
            nlist,
            total_vector_count,
            "creating vector index"
        );
        self.backend.create_index(&self.collection, nlist).await?;

        self.wait_for_index().await
    }

    async fn wait_for_index(&self) -> Result<(), VectorStoreError> {
        let started = Instant::now();
        let max_wait = Duration::from_millis(self.poll.max_wait_ms);
        let cap = Duration::from_millis(self.poll.max_interval_ms);
        let mut interval = Duration::from_millis(self.poll.initial_ms);
        let mut attempts: u32 = 0;

        loop {
            sleep(interval).await;
            attempts += 1;

            match self.backend.describe_index(&self.collection).await? {
                Some(IndexState::Finished) => {
                    tracing::info!(
                        collection = %self.collection,
                        attempts,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "index build finished"
                    );
                    return Ok(());
                }
                Some(IndexState::Failed { reason }) => {
                    return Err(VectorStoreError::IndexBuildFailed(reason));
                }
                Some(IndexState::Building) | None => {}
            }

            if started.elapsed() >= max_wait || attempts >= self.poll.max_attempts {
                return Err(VectorStoreError::IndexBuildTimeout {
                    elapsed_ms: started.elapsed().as_millis() as u64,
                    attempts,
                });
            }

            interval = next_interval(interval, self.poll.growth, cap);
            tracing::debug!(
                attempt = attempts,
                next_poll_ms = interval.as_millis() as u64,
                "index still building"
            );
        }
    }

    /// Nearest-neighbor search scoped to one session.
    ///
    /// Rows the store returns in an unexpected shape are logged and skipped,
    /// never propagated. Rows tagged with a different session are discarded
    /// even if the backend misapplied the filter.
    pub async fn search(
        &self,
        query_vector: &[f32],
        session_id: &str,
        limit: usize,
    ) -> Result<Vec<SearchHit>, RagError> {
        validate_session_id(session_id)?;
        if query_vector.len() != self.dimension {
            return Err(VectorStoreError::DimensionMismatch {
                expected: self.dimension,
                actual: query_vector.len(),
            }
            .into());
        }

        let filter = session_filter(session_id);
        let raw = self
            .backend
            .search(&self.collection, query_vector, &filter, limit)
            .await?;

        let mut hits = Vec::with_capacity(raw.len());
        for row in &raw {
            match parse_hit(row, session_id) {
                Some(hit) => hits.push(hit),
                None => {
                    tracing::warn!(row = %row, "dropping malformed or cross-session hit");
                }
            }
        }

        tracing::debug!(session_id, hits = hits.len(), "search complete");
        Ok(hits)
    }

    /// Bulk delete of every row belonging to the session
    pub async fn delete_session(&self, session_id: &str) -> Result<(), RagError> {
        validate_session_id(session_id)?;
        self.backend
            .delete(&self.collection, &session_filter(session_id))
            .await?;
        tracing::info!(session_id, "deleted session vectors");
        Ok(())
    }
}

/// IVF clustering parameter: half the vector count, clamped to the bounds
pub(crate) fn clustering_nlist(total_vector_count: usize) -> u32 {
    total_vector_count.div_ceil(2).clamp(NLIST_MIN, NLIST_MAX) as u32
}

/// Next poll interval: grow by `growth`, never past `cap`
pub(crate) fn next_interval(current: Duration, growth: f64, cap: Duration) -> Duration {
    current.mul_f64(growth).min(cap)
}

fn parse_hit(row: &serde_json::Value, session_id: &str) -> Option<SearchHit> {
    // Backends differ on the score key: native scores vs raw distances.
    let score = row
        .get("score")
        .or_else(|| row.get("distance"))?
        .as_f64()? as f32;
    let content = row.get("content")?.as_str()?.to_string();
    let file_path = row.get("file_path")?.as_str()?.to_string();

    if row.get("session_id").and_then(|v| v.as_str()) != Some(session_id) {
        return None;
    }

    Some(SearchHit {
        score,
        content,
        file_path,
        start_line: row.get("start_line").and_then(|v| v.as_u64()).map(|v| v as usize),
        end_line: row.get("end_line").and_then(|v| v.as_u64()).map(|v| v as usize),
    })
}
