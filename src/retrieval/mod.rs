//! Session-scoped retrieval: query text in, ranked hits out.

use std::sync::Arc;

use crate::config::SearchConfig;
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, ValidationError};
use crate::types::SearchHit;
use crate::vector_store::VectorStoreGateway;

pub struct RetrievalService {
    embedder: Arc<dyn EmbeddingProvider>,
    gateway: Arc<VectorStoreGateway>,
    config: SearchConfig,
}

impl RetrievalService {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        gateway: Arc<VectorStoreGateway>,
        config: SearchConfig,
    ) -> Self {
        Self {
            embedder,
            gateway,
            config,
        }
    }

    /// Nearest-neighbor search within one session.
    ///
    /// The query is embedded with a single call; an embedding failure fails
    /// the whole request, there is no best-effort result. `limit` defaults
    /// to the configured value and is capped at the configured maximum.
    pub async fn search(
        &self,
        session_id: &str,
        query_text: &str,
        limit: Option<usize>,
    ) -> Result<Vec<SearchHit>, RagError> {
        if query_text.trim().is_empty() {
            return Err(ValidationError::Empty("query text".to_string()).into());
        }
        let limit = self.resolve_limit(limit)?;

        let query_vector = self.embedder.embed(query_text).await?;
        tracing::debug!(session_id, limit, "running retrieval query");

        self.gateway.search(&query_vector, session_id, limit).await
    }

    /// Remove every vector belonging to the session (session teardown)
    pub async fn delete_session(&self, session_id: &str) -> Result<(), RagError> {
        self.gateway.delete_session(session_id).await
    }

    fn resolve_limit(&self, limit: Option<usize>) -> Result<usize, RagError> {
        match limit {
            None => Ok(self.config.default_limit),
            Some(0) => Err(ValidationError::ConstraintViolation {
                field: "limit".to_string(),
                constraint: "greater than 0".to_string(),
                actual: "0".to_string(),
            }
            .into()),
            Some(n) if n > self.config.max_limit => {
                tracing::warn!(requested = n, max = self.config.max_limit, "capping result limit");
                Ok(self.config.max_limit)
            }
            Some(n) => Ok(n),
        }
    }
}
