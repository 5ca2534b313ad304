//! OpenAI-compatible embedding client.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use reqwest::header::{HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};

use super::Embedder;
use crate::config::EmbeddingConfig;

/// Blocking embeddings client for `<base>/embeddings`.
///
/// Requests are sent once; failures are returned to the caller untouched.
#[derive(Clone)]
pub struct OpenAiEmbedder {
    client: Client,
    endpoint: String,
    model: String,
    dimensions: Option<usize>,
    batch_size: usize,
}

impl OpenAiEmbedder {
    /// Builds a new OpenAI embeddings client.
    pub fn new(
        api_key: &str,
        base_url: &str,
        model: impl Into<String>,
        dimensions: Option<usize>,
        timeout: Duration,
        batch_size: usize,
    ) -> Result<Self> {
        let model = model.into();
        anyhow::ensure!(!api_key.trim().is_empty(), "missing OpenAI API key");
        anyhow::ensure!(!model.trim().is_empty(), "missing OpenAI model name");
        let mut headers = reqwest::header::HeaderMap::new();
        let auth = format!("Bearer {}", api_key.trim());
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth).context("invalid OpenAI API key")?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .context("failed to build OpenAI HTTP client")?;
        Ok(Self {
            client,
            endpoint: endpoints_url(base_url),
            model,
            dimensions,
            batch_size: batch_size.max(1),
        })
    }

    /// Builds the client from embedding settings; a missing key is an error.
    pub fn from_config(config: &EmbeddingConfig) -> Result<Self> {
        let api_key = config
            .openai_api_key
            .as_deref()
            .context("OPENAI_API_KEY is not set")?;
        Self::new(
            api_key,
            &config.openai_base_url,
            config.model.clone(),
            config.openai_dimensions,
            config.timeout(),
            config.batch_size,
        )
    }

    fn embed_batch(&self, inputs: &[&str]) -> Result<Vec<Vec<f32>>> {
        let request = EmbeddingRequest {
            model: &self.model,
            input: inputs,
            dimensions: self.dimensions,
        };
        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .context("OpenAI embeddings request failed")?;
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            anyhow::bail!("OpenAI embeddings request failed ({}): {}", status, body);
        }
        let parsed: EmbeddingResponse = response
            .json()
            .context("failed to parse OpenAI embedding response")?;
        into_ordered_vectors(parsed, inputs.len())
    }
}

impl Embedder for OpenAiEmbedder {
    fn name(&self) -> &str {
        "openai"
    }

    fn dimensions(&self) -> Option<usize> {
        self.dimensions
    }

    fn embed(&self, inputs: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(inputs.len());
        for batch in inputs.chunks(self.batch_size) {
            out.extend(self.embed_batch(batch)?);
        }
        Ok(out)
    }
}

fn endpoints_url(base_url: &str) -> String {
    format!("{}/embeddings", base_url.trim_end_matches('/'))
}

fn into_ordered_vectors(mut parsed: EmbeddingResponse, expected: usize) -> Result<Vec<Vec<f32>>> {
    parsed.data.sort_by_key(|entry| entry.index);
    anyhow::ensure!(
        parsed.data.len() == expected,
        "OpenAI returned {} embeddings for {} inputs",
        parsed.data.len(),
        expected
    );
    Ok(parsed
        .data
        .into_iter()
        .map(|entry| entry.embedding)
        .collect())
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    #[serde(borrow)]
    input: &'a [&'a str],
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}
