//! REST backend for Milvus-style vector stores (v2 HTTP API).
//!
//! Every operation is a JSON POST returning a `{code, message, data}`
//! envelope; a non-zero code is an application-level failure.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderValue};
use serde_json::{Value, json};

use super::{IndexState, VectorBackend, VectorRow};
use crate::config::VectorStoreConfig;
use crate::error::VectorStoreError;

const VECTOR_FIELD: &str = "embedding";
const INDEX_NAME: &str = "embedding_idx";
const HTTP_TIMEOUT_SECS: u64 = 30;

/// Envelope code the store returns when the described index does not exist.
const INDEX_NOT_FOUND_CODE: i64 = 700;

pub struct HttpVectorStore {
    client: Client,
    base_url: String,
}

impl HttpVectorStore {
    /// Builds a new REST client for the configured store.
    ///
    /// `token` may be empty for unauthenticated deployments.
    pub fn new(config: &VectorStoreConfig, token: &str) -> Result<Self> {
        anyhow::ensure!(
            config.url.starts_with("http://") || config.url.starts_with("https://"),
            "vector store URL must be an http(s) URL"
        );

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if !token.trim().is_empty() {
            let auth = format!("Bearer {}", token.trim());
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&auth).context("invalid vector store token")?,
            );
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .default_headers(headers)
            .build()
            .context("failed to build vector store HTTP client")?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
        })
    }

    /// POST a v2 API request and unwrap the response envelope.
    ///
    /// Transport failures map to `ConnectionFailed`; a non-zero envelope code
    /// is returned as `Err(message)` for the call site to wrap in its
    /// operation-specific error.
    async fn post(&self, path: &str, body: Value) -> Result<Value, VectorStoreError> {
        let url = format!("{}/v2/vectordb/{}", self.base_url, path);

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| VectorStoreError::ConnectionFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(VectorStoreError::ConnectionFailed(format!(
                "{} returned {}: {}",
                url, status, body
            )));
        }

        response
            .json()
            .await
            .map_err(|e| VectorStoreError::ConnectionFailed(format!("invalid response body: {}", e)))
    }
}

fn envelope_code(envelope: &Value) -> i64 {
    envelope.get("code").and_then(|c| c.as_i64()).unwrap_or(-1)
}

fn envelope_message(envelope: &Value) -> String {
    envelope
        .get("message")
        .and_then(|m| m.as_str())
        .unwrap_or("unknown store error")
        .to_string()
}

/// Interprets an `indexes/describe` envelope.
///
/// "Index not found" is the normal answer for a collection that has never
/// been indexed and maps to `Ok(None)`. Any other non-zero code (auth,
/// permission, missing collection) is a real failure and must not be read
/// as "no index yet".
fn describe_outcome(envelope: &Value) -> Result<Option<IndexState>, VectorStoreError> {
    let code = envelope_code(envelope);
    if code != 0 {
        let message = envelope_message(envelope);
        if code == INDEX_NOT_FOUND_CODE || message.to_ascii_lowercase().contains("index not found")
        {
            return Ok(None);
        }
        return Err(VectorStoreError::DescribeIndexFailed(message));
    }
    let state = envelope
        .pointer("/data/0/indexState")
        .or_else(|| envelope.pointer("/data/indexState"))
        .and_then(|v| v.as_str());
    Ok(state.map(parse_index_state))
}

/// Maps the store's index state string onto the lifecycle state machine.
/// Unknown strings are treated as still building rather than an error.
fn parse_index_state(state: &str) -> IndexState {
    match state {
        "Finished" => IndexState::Finished,
        "Failed" => IndexState::Failed {
            reason: "store reported index build failure".to_string(),
        },
        _ => IndexState::Building,
    }
}

#[async_trait::async_trait]
impl VectorBackend for HttpVectorStore {
    async fn has_collection(&self, name: &str) -> Result<bool, VectorStoreError> {
        let envelope = self
            .post("collections/has", json!({ "collectionName": name }))
            .await?;
        if envelope_code(&envelope) != 0 {
            return Err(VectorStoreError::ConnectionFailed(envelope_message(&envelope)));
        }
        Ok(envelope
            .pointer("/data/has")
            .and_then(|v| v.as_bool())
            .unwrap_or(false))
    }

    async fn create_collection(
        &self,
        name: &str,
        dimension: usize,
    ) -> Result<(), VectorStoreError> {
        // Quick-create: auto-generated Int64 primary key, one vector field,
        // dynamic scalar fields enabled for the chunk metadata.
        let body = json!({
            "collectionName": name,
            "dimension": dimension,
            "idType": "Int64",
            "autoId": true,
            "vectorFieldName": VECTOR_FIELD,
            "enableDynamicField": true,
        });
        let envelope = self.post("collections/create", body).await?;
        if envelope_code(&envelope) != 0 {
            return Err(VectorStoreError::CollectionCreationFailed {
                collection: name.to_string(),
                reason: envelope_message(&envelope),
            });
        }
        Ok(())
    }

    async fn insert(&self, collection: &str, rows: Vec<VectorRow>) -> Result<(), VectorStoreError> {
        let body = json!({
            "collectionName": collection,
            "data": rows,
        });
        let envelope = self.post("entities/insert", body).await?;
        if envelope_code(&envelope) != 0 {
            return Err(VectorStoreError::InsertFailed(envelope_message(&envelope)));
        }
        Ok(())
    }

    async fn describe_index(
        &self,
        collection: &str,
    ) -> Result<Option<IndexState>, VectorStoreError> {
        let body = json!({
            "collectionName": collection,
            "indexName": INDEX_NAME,
        });
        let envelope = self.post("indexes/describe", body).await?;
        describe_outcome(&envelope)
    }

    async fn create_index(&self, collection: &str, nlist: u32) -> Result<(), VectorStoreError> {
        let body = json!({
            "collectionName": collection,
            "indexParams": [{
                "fieldName": VECTOR_FIELD,
                "indexName": INDEX_NAME,
                "metricType": "COSINE",
                "params": {
                    "index_type": "IVF_FLAT",
                    "nlist": nlist,
                },
            }],
        });
        let envelope = self.post("indexes/create", body).await?;
        if envelope_code(&envelope) != 0 {
            return Err(VectorStoreError::IndexCreationFailed(envelope_message(&envelope)));
        }
        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        vector: &[f32],
        filter: &str,
        limit: usize,
    ) -> Result<Vec<Value>, VectorStoreError> {
        let body = json!({
            "collectionName": collection,
            "data": [vector],
            "annsField": VECTOR_FIELD,
            "filter": filter,
            "limit": limit,
            "outputFields": [
                "content", "file_path", "session_id",
                "start_line", "end_line", "chunk_kind",
            ],
        });
        let envelope = self.post("entities/search", body).await?;
        if envelope_code(&envelope) != 0 {
            return Err(VectorStoreError::SearchFailed(envelope_message(&envelope)));
        }
        Ok(envelope
            .get("data")
            .and_then(|d| d.as_array())
            .cloned()
            .unwrap_or_default())
    }

    async fn delete(&self, collection: &str, filter: &str) -> Result<(), VectorStoreError> {
        let body = json!({
            "collectionName": collection,
            "filter": filter,
        });
        let envelope = self.post("entities/delete", body).await?;
        if envelope_code(&envelope) != 0 {
            return Err(VectorStoreError::DeleteFailed(envelope_message(&envelope)));
        }
        Ok(())
    }
}
