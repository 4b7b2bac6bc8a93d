/// Centralized error types for session-rag using thiserror
///
/// Provides domain-specific error types for better error handling and user-facing messages.
use thiserror::Error;

/// Main error type for the indexing and retrieval pipeline
#[derive(Error, Debug)]
pub enum RagError {
    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("Vector store error: {0}")]
    VectorStore(#[from] VectorStoreError),

    #[error("Indexing error: {0}")]
    Indexing(#[from] IndexingError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    Other(String),
}

/// Errors from the remote embedding service
#[derive(Error, Debug)]
pub enum EmbeddingError {
    #[error("Embedding request failed: {0}")]
    RequestFailed(String),

    #[error("Embedding service returned {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Malformed embedding response: {0}")]
    MalformedResponse(String),

    #[error("Embedding service returned an empty embedding")]
    EmptyEmbedding,
}

/// Errors from vector store operations
#[derive(Error, Debug)]
pub enum VectorStoreError {
    #[error("Failed to connect to vector store: {0}")]
    ConnectionFailed(String),

    #[error("Failed to create collection '{collection}': {reason}")]
    CollectionCreationFailed { collection: String, reason: String },

    #[error("Failed to insert vectors: {0}")]
    InsertFailed(String),

    #[error("Failed to search vectors: {0}")]
    SearchFailed(String),

    #[error("Failed to delete vectors: {0}")]
    DeleteFailed(String),

    #[error("Failed to create index: {0}")]
    IndexCreationFailed(String),

    #[error("Failed to describe index: {0}")]
    DescribeIndexFailed(String),

    #[error("Index build failed: {0}")]
    IndexBuildFailed(String),

    #[error("Index build still pending after {elapsed_ms}ms and {attempts} polls")]
    IndexBuildTimeout { elapsed_ms: u64, attempts: u32 },

    #[error("Vector dimension mismatch: collection expects {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// Errors from the indexing orchestration
#[derive(Error, Debug)]
pub enum IndexingError {
    #[error("No embeddings could be generated from the uploaded files")]
    NoEmbeddingsProduced,

    #[error("No files were provided for indexing")]
    NoFilesProvided,
}

/// Errors related to configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration file: {0}")]
    LoadFailed(String),

    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),

    #[error("Invalid configuration value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("Configuration file not found: {0}")]
    FileNotFound(String),
}

/// Errors related to input validation
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Invalid session id: {0}")]
    InvalidSessionId(String),

    #[error("Empty {0}")]
    Empty(String),

    #[error("{field} must be {constraint}, got {actual}")]
    ConstraintViolation {
        field: String,
        constraint: String,
        actual: String,
    },
}

// Conversion from anyhow::Error to RagError
impl From<anyhow::Error> for RagError {
    fn from(err: anyhow::Error) -> Self {
        RagError::Other(format!("{:#}", err))
    }
}

impl RagError {
    /// Create a new error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        RagError::Other(msg.into())
    }

    /// Convert to a user-facing error string suitable for API responses
    pub fn to_user_string(&self) -> String {
        format!("{}", self)
    }

    /// Check if this is a user error (validation, bad input) vs system error
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            RagError::Validation(_)
                | RagError::Indexing(IndexingError::NoFilesProvided)
                | RagError::Config(ConfigError::InvalidValue { .. })
        )
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            RagError::VectorStore(VectorStoreError::ConnectionFailed(_))
                | RagError::Embedding(EmbeddingError::RequestFailed(_))
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RagError::Validation(ValidationError::InvalidSessionId("a\"b".to_string()));
        assert_eq!(err.to_string(), "Validation error: Invalid session id: a\"b");
    }

    #[test]
    fn test_error_from_anyhow() {
        let anyhow_err = anyhow::anyhow!("test error");
        let rag_err: RagError = anyhow_err.into();
        assert!(matches!(rag_err, RagError::Other(_)));
    }

    #[test]
    fn test_is_user_error() {
        let user_err = RagError::Validation(ValidationError::Empty("query".to_string()));
        assert!(user_err.is_user_error());

        let system_err = RagError::VectorStore(VectorStoreError::InsertFailed("test".to_string()));
        assert!(!system_err.is_user_error());
    }

    #[test]
    fn test_is_retryable() {
        let retryable =
            RagError::VectorStore(VectorStoreError::ConnectionFailed("test".to_string()));
        assert!(retryable.is_retryable());

        let not_retryable = RagError::Indexing(IndexingError::NoEmbeddingsProduced);
        assert!(!not_retryable.is_retryable());
    }

    #[test]
    fn test_index_build_timeout_display() {
        let err = VectorStoreError::IndexBuildTimeout {
            elapsed_ms: 60_000,
            attempts: 60,
        };
        assert_eq!(
            err.to_string(),
            "Index build still pending after 60000ms and 60 polls"
        );
    }

    #[test]
    fn test_dimension_mismatch_display() {
        let err = VectorStoreError::DimensionMismatch {
            expected: 1024,
            actual: 3,
        };
        assert_eq!(
            err.to_string(),
            "Vector dimension mismatch: collection expects 1024, got 3"
        );
    }

    #[test]
    fn test_error_chain() {
        let embedding_err = EmbeddingError::EmptyEmbedding;
        let rag_err: RagError = embedding_err.into();
        assert!(matches!(rag_err, RagError::Embedding(_)));
        assert_eq!(
            rag_err.to_string(),
            "Embedding error: Embedding service returned an empty embedding"
        );
    }
}
