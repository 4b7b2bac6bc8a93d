//! Vector store abstraction
//!
//! [`VectorBackend`] is the vendor-facing surface (collection lifecycle,
//! raw inserts, index control, filtered search). [`gateway::VectorStoreGateway`]
//! sits on top of it and owns the policy: insert batching, index-readiness
//! polling, and the session filter that scopes every query.

pub mod gateway;
pub mod http_client;

pub use gateway::VectorStoreGateway;
pub use http_client::HttpVectorStore;

use serde::{Deserialize, Serialize};

use crate::error::{ValidationError, VectorStoreError};
use crate::types::EmbeddingRecord;

/// Build state of a collection's vector index, as reported by the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexState {
    Building,
    Finished,
    Failed { reason: String },
}

/// One row as persisted in the store
///
/// The store assigns the primary id; everything else is supplied here. Scalar
/// fields ride along as dynamic fields next to the vector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorRow {
    pub embedding: Vec<f32>,
    pub content: String,
    pub file_path: String,
    pub session_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_line: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_line: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunk_kind: Option<String>,
}

impl From<EmbeddingRecord> for VectorRow {
    fn from(record: EmbeddingRecord) -> Self {
        Self {
            embedding: record.embedding,
            content: record.content,
            file_path: record.file_path,
            session_id: record.session_id,
            start_line: record.start_line,
            end_line: record.end_line,
            chunk_kind: record.chunk_kind.map(|k| k.as_str().to_string()),
        }
    }
}

/// Vendor-facing vector store operations
///
/// Implementations translate these calls to their wire protocol and nothing
/// more; batching, polling and filter construction live in the gateway.
#[async_trait::async_trait]
pub trait VectorBackend: Send + Sync {
    /// Whether the named collection exists
    async fn has_collection(&self, name: &str) -> Result<bool, VectorStoreError>;

    /// Create a collection with an auto-generated primary id, a vector field
    /// of the given dimension, and dynamic scalar fields for metadata
    async fn create_collection(&self, name: &str, dimension: usize)
    -> Result<(), VectorStoreError>;

    /// Insert rows; callers keep each call within the store's transport limit
    async fn insert(&self, collection: &str, rows: Vec<VectorRow>)
    -> Result<(), VectorStoreError>;

    /// Describe the vector index; `None` means no index exists yet
    async fn describe_index(&self, collection: &str)
    -> Result<Option<IndexState>, VectorStoreError>;

    /// Request creation of a vector index with the given clustering parameter
    async fn create_index(&self, collection: &str, nlist: u32) -> Result<(), VectorStoreError>;

    /// Nearest-neighbor search restricted by a filter expression; rows are
    /// returned in the store's raw shape and normalized by the gateway
    async fn search(
        &self,
        collection: &str,
        vector: &[f32],
        filter: &str,
        limit: usize,
    ) -> Result<Vec<serde_json::Value>, VectorStoreError>;

    /// Delete every row matching the filter expression
    async fn delete(&self, collection: &str, filter: &str) -> Result<(), VectorStoreError>;
}

/// Validate a session id for use inside a filter expression.
///
/// The filter is a string expression, so ids that could break out of the
/// quoted literal are rejected outright rather than escaped.
pub fn validate_session_id(session_id: &str) -> Result<(), ValidationError> {
    if session_id.trim().is_empty() {
        return Err(ValidationError::Empty("session id".to_string()));
    }
    if session_id.contains('"') || session_id.contains('\\') {
        return Err(ValidationError::InvalidSessionId(session_id.to_string()));
    }
    Ok(())
}

/// Filter expression matching exactly one session's rows
pub(crate) fn session_filter(session_id: &str) -> String {
    format!("session_id == \"{}\"", session_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_session_id_ok() {
        assert!(validate_session_id("session-123_abc").is_ok());
    }

    #[test]
    fn test_validate_session_id_rejects_empty() {
        assert!(validate_session_id("").is_err());
        assert!(validate_session_id("   ").is_err());
    }

    #[test]
    fn test_validate_session_id_rejects_quote_breakout() {
        assert!(validate_session_id("s1\" || session_id != \"").is_err());
        assert!(validate_session_id("s1\\").is_err());
    }

    #[test]
    fn test_session_filter_shape() {
        assert_eq!(session_filter("abc"), "session_id == \"abc\"");
    }

    #[test]
    fn test_vector_row_omits_absent_lines() {
        let row = VectorRow {
            embedding: vec![0.1],
            content: "x".to_string(),
            file_path: "a.rs".to_string(),
            session_id: "s".to_string(),
            start_line: None,
            end_line: None,
            chunk_kind: None,
        };
        let json = serde_json::to_value(&row).unwrap();
        assert!(json.get("start_line").is_none());
        assert!(json.get("chunk_kind").is_none());
    }
}
