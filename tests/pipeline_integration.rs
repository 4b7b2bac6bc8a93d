/// End-to-end pipeline tests: index a small upload into an in-memory store,
/// then retrieve from it, all through the public API.
use std::sync::{Arc, Mutex};

use serde_json::json;
use session_rag::config::Config;
use session_rag::embedding::EmbeddingProvider;
use session_rag::error::{EmbeddingError, RagError, VectorStoreError};
use session_rag::indexer::{IndexingPipeline, LineChunker};
use session_rag::retrieval::RetrievalService;
use session_rag::types::FileNode;
use session_rag::vector_store::{IndexState, VectorBackend, VectorRow, VectorStoreGateway};

/// In-memory store: rows are kept per insert, search applies the session
/// filter the way the real store would, the index finishes on first poll.
#[derive(Default)]
struct InMemoryStore {
    collection_exists: Mutex<bool>,
    rows: Mutex<Vec<VectorRow>>,
    index_created: Mutex<bool>,
}

fn session_from_filter(filter: &str) -> Option<String> {
    // filter shape: session_id == "<id>"
    let quoted = filter.strip_prefix("session_id == \"")?;
    quoted.strip_suffix('"').map(|s| s.to_string())
}

#[async_trait::async_trait]
impl VectorBackend for InMemoryStore {
    async fn has_collection(&self, _name: &str) -> Result<bool, VectorStoreError> {
        Ok(*self.collection_exists.lock().unwrap())
    }

    async fn create_collection(&self, _name: &str, _dimension: usize) -> Result<(), VectorStoreError> {
        *self.collection_exists.lock().unwrap() = true;
        Ok(())
    }

    async fn insert(&self, _collection: &str, rows: Vec<VectorRow>) -> Result<(), VectorStoreError> {
        self.rows.lock().unwrap().extend(rows);
        Ok(())
    }

    async fn describe_index(&self, _collection: &str) -> Result<Option<IndexState>, VectorStoreError> {
        if *self.index_created.lock().unwrap() {
            Ok(Some(IndexState::Finished))
        } else {
            Ok(None)
        }
    }

    async fn create_index(&self, _collection: &str, _nlist: u32) -> Result<(), VectorStoreError> {
        *self.index_created.lock().unwrap() = true;
        Ok(())
    }

    async fn search(
        &self,
        _collection: &str,
        _vector: &[f32],
        filter: &str,
        limit: usize,
    ) -> Result<Vec<serde_json::Value>, VectorStoreError> {
        let session = session_from_filter(filter)
            .ok_or_else(|| VectorStoreError::SearchFailed("bad filter".to_string()))?;
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .iter()
            .filter(|r| r.session_id == session)
            .take(limit)
            .map(|r| {
                json!({
                    "score": 0.9,
                    "content": r.content,
                    "file_path": r.file_path,
                    "session_id": r.session_id,
                    "start_line": r.start_line,
                    "end_line": r.end_line,
                })
            })
            .collect())
    }

    async fn delete(&self, _collection: &str, filter: &str) -> Result<(), VectorStoreError> {
        let session = session_from_filter(filter)
            .ok_or_else(|| VectorStoreError::DeleteFailed("bad filter".to_string()))?;
        self.rows.lock().unwrap().retain(|r| r.session_id != session);
        Ok(())
    }
}

struct TestEmbedder;

#[async_trait::async_trait]
impl EmbeddingProvider for TestEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        // deterministic toy embedding so vectors differ per text
        let sum = text.bytes().map(|b| b as f32).sum::<f32>();
        Ok(vec![sum, text.len() as f32, 1.0])
    }

    fn dimension(&self) -> usize {
        3
    }

    fn model_name(&self) -> &str {
        "test-embedder"
    }
}

fn build(store: Arc<InMemoryStore>) -> (IndexingPipeline, RetrievalService) {
    let config = Config::default();
    let gateway = Arc::new(VectorStoreGateway::new(store, &config.vector_store, 3));
    let embedder = Arc::new(TestEmbedder);
    let pipeline = IndexingPipeline::new(
        Arc::new(LineChunker::default()),
        embedder.clone(),
        gateway.clone(),
        config.indexing.clone(),
    );
    let retrieval = RetrievalService::new(embedder, gateway, config.search.clone());
    (pipeline, retrieval)
}

fn upload(paths: &[(&str, &str)]) -> Vec<FileNode> {
    paths
        .iter()
        .map(|(path, content)| FileNode {
            path: path.to_string(),
            extension: path.rsplit('.').next().unwrap_or("").to_string(),
            content: content.to_string(),
        })
        .collect()
}

#[tokio::test(start_paused = true)]
async fn test_index_then_search_round_trip() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let store = Arc::new(InMemoryStore::default());
    let (pipeline, retrieval) = build(store.clone());

    let files = upload(&[
        ("src/main.rs", "fn main() { println!(\"hello\"); }"),
        ("src/lib.rs", "pub fn add(a: i32, b: i32) -> i32 { a + b }"),
        ("README.md", "# demo project"),
    ]);

    let summary = pipeline.index_session("upload-1", files).await.unwrap();
    assert_eq!(summary.total_chunks, 3);
    assert!(*store.index_created.lock().unwrap());

    let hits = retrieval
        .search("upload-1", "where is the entry point?", None)
        .await
        .unwrap();
    assert_eq!(hits.len(), 3);
    assert!(hits.iter().any(|h| h.file_path == "src/main.rs"));
}

#[tokio::test(start_paused = true)]
async fn test_sessions_are_isolated() {
    let store = Arc::new(InMemoryStore::default());
    let (pipeline, retrieval) = build(store.clone());

    pipeline
        .index_session("session-a", upload(&[("a.rs", "fn a() {}")]))
        .await
        .unwrap();
    pipeline
        .index_session("session-b", upload(&[("b.rs", "fn b() {}")]))
        .await
        .unwrap();

    let hits = retrieval.search("session-a", "function", None).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].file_path, "a.rs");
}

#[tokio::test(start_paused = true)]
async fn test_delete_session_removes_only_that_session() {
    let store = Arc::new(InMemoryStore::default());
    let (pipeline, retrieval) = build(store.clone());

    pipeline
        .index_session("keep", upload(&[("k.rs", "fn k() {}")]))
        .await
        .unwrap();
    pipeline
        .index_session("drop", upload(&[("d.rs", "fn d() {}")]))
        .await
        .unwrap();

    retrieval.delete_session("drop").await.unwrap();

    assert!(retrieval.search("drop", "fn", None).await.unwrap().is_empty());
    assert_eq!(retrieval.search("keep", "fn", None).await.unwrap().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_unreadable_upload_reports_structured_failure() {
    let store = Arc::new(InMemoryStore::default());
    let (pipeline, _) = build(store.clone());

    let result = pipeline
        .index_session("empty-upload", upload(&[("blob.bin", ""), ("img.png", "  ")]))
        .await;

    assert!(matches!(result, Err(RagError::Indexing(_))));
    assert!(store.rows.lock().unwrap().is_empty());
    assert!(!*store.index_created.lock().unwrap());
}

#[tokio::test(start_paused = true)]
async fn test_reindexing_same_session_is_additive() {
    // Two runs for the same session are not coordinated; both land.
    let store = Arc::new(InMemoryStore::default());
    let (pipeline, retrieval) = build(store.clone());

    pipeline
        .index_session("s", upload(&[("one.rs", "fn one() {}")]))
        .await
        .unwrap();
    pipeline
        .index_session("s", upload(&[("two.rs", "fn two() {}")]))
        .await
        .unwrap();

    let hits = retrieval.search("s", "fn", None).await.unwrap();
    assert_eq!(hits.len(), 2);
}
