use serde::{Deserialize, Serialize};

use crate::error::RagError;

/// One file from an uploaded codebase, as handed over by the ingestion layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileNode {
    /// Path of the file relative to the upload root
    pub path: String,
    /// File extension without the leading dot (e.g. "py", "rs")
    pub extension: String,
    /// Full file content as UTF-8 text
    pub content: String,
}

/// Kind of source construct a chunk was cut around
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkKind {
    Function,
    Class,
    Block,
    File,
}

impl ChunkKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChunkKind::Function => "function",
            ChunkKind::Class => "class",
            ChunkKind::Block => "block",
            ChunkKind::File => "file",
        }
    }
}

/// A contiguous slice of one file's text, produced by the chunker
///
/// Chunks live only for the duration of an indexing run; only their
/// embedding-bearing projection ([`EmbeddingRecord`]) is persisted.
#[derive(Debug, Clone)]
pub struct Chunk {
    pub content: String,
    pub start_line: Option<usize>,
    pub end_line: Option<usize>,
    pub kind: Option<ChunkKind>,
}

/// A chunk paired with its embedding vector, ready for insertion
///
/// Owned by the indexing pipeline until handed to the vector store gateway;
/// after insertion the store is the sole owner and assigns the row id.
#[derive(Debug, Clone)]
pub struct EmbeddingRecord {
    pub content: String,
    pub file_path: String,
    pub embedding: Vec<f32>,
    pub session_id: String,
    pub start_line: Option<usize>,
    pub end_line: Option<usize>,
    pub chunk_kind: Option<ChunkKind>,
}

/// A single ranked retrieval result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    /// Similarity score as reported by the vector store
    pub score: f32,
    /// The chunk content
    pub content: String,
    /// File path relative to the upload root
    pub file_path: String,
    /// Starting line number in the file, when known
    pub start_line: Option<usize>,
    /// Ending line number in the file, when known
    pub end_line: Option<usize>,
}

/// Counts and timings from a completed indexing run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexSummary {
    /// Session the records were inserted under
    pub session_id: String,
    /// Number of embedding records inserted
    pub total_chunks: usize,
    /// Time spent chunking and embedding, in milliseconds
    pub processing_ms: u64,
    /// Time spent inserting and building the index, in milliseconds
    pub indexing_ms: u64,
}

/// Wire payload returned to the ingestion layer for an indexing request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_chunks: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indexing_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl IndexResponse {
    /// Success payload from a completed run
    pub fn from_summary(summary: &IndexSummary) -> Self {
        Self {
            success: true,
            total_chunks: Some(summary.total_chunks),
            processing_ms: Some(summary.processing_ms),
            indexing_ms: Some(summary.indexing_ms),
            message: None,
        }
    }

    /// Failure payload with a user-facing message
    ///
    /// The debug chain is only appended when `include_detail` is set
    /// (development mode); production callers get the display message alone.
    pub fn from_error(err: &RagError, include_detail: bool) -> Self {
        let message = if include_detail {
            format!("{} ({:?})", err.to_user_string(), err)
        } else {
            err.to_user_string()
        };
        Self {
            success: false,
            total_chunks: None,
            processing_ms: None,
            indexing_ms: None,
            message: Some(message),
        }
    }
}
