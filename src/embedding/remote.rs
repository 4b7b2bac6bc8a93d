//! HTTP embedding client for OpenAI-compatible `/embeddings` endpoints.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderValue};
use serde::{Deserialize, Serialize};

use super::EmbeddingProvider;
use crate::config::EmbeddingConfig;
use crate::error::EmbeddingError;

/// Async embeddings client that talks to an OpenAI-compatible endpoint.
///
/// Sends one input per request; batching happens upstream in the bounded
/// concurrency runner, not at the transport level.
#[derive(Clone)]
pub struct RemoteEmbedder {
    client: Client,
    endpoint: String,
    model: String,
    dimension: usize,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: [&'a str; 1],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingEntry>,
}

#[derive(Deserialize)]
struct EmbeddingEntry {
    embedding: Vec<f32>,
}

impl RemoteEmbedder {
    /// Builds a new embeddings client from configuration.
    ///
    /// `api_key` may be empty for unauthenticated local deployments.
    pub fn new(config: &EmbeddingConfig, api_key: &str) -> Result<Self> {
        anyhow::ensure!(
            config.base_url.starts_with("http://") || config.base_url.starts_with("https://"),
            "embedding endpoint must be an http(s) URL"
        );
        anyhow::ensure!(!config.model_name.trim().is_empty(), "missing embedding model name");

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if !api_key.trim().is_empty() {
            let auth = format!("Bearer {}", api_key.trim());
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&auth).context("invalid embedding API key")?,
            );
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .context("failed to build embedding HTTP client")?;

        let endpoint = format!("{}/embeddings", config.base_url.trim_end_matches('/'));

        Ok(Self {
            client,
            endpoint,
            model: config.model_name.clone(),
            dimension: config.dimension,
        })
    }

    fn first_embedding(response: EmbeddingResponse) -> Result<Vec<f32>, EmbeddingError> {
        let entry = response
            .data
            .into_iter()
            .next()
            .ok_or(EmbeddingError::EmptyEmbedding)?;
        if entry.embedding.is_empty() {
            return Err(EmbeddingError::EmptyEmbedding);
        }
        Ok(entry.embedding)
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for RemoteEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let request = EmbeddingRequest {
            model: &self.model,
            input: [text],
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| EmbeddingError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(EmbeddingError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| EmbeddingError::MalformedResponse(e.to_string()))?;

        Self::first_embedding(parsed)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
