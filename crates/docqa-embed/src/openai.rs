//! Embedding gateway for any OpenAI-compatible `/embeddings` endpoint.
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use docqa_core::config::GatewaySettings;
use docqa_core::error::{Error, Result};
use docqa_core::traits::Embedder;

pub struct OpenAiEmbedder {
    client: reqwest::blocking::Client,
    url: String,
    api_key: Option<String>,
    model: String,
    dim: usize,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    #[serde(default)]
    index: usize,
    embedding: Vec<f32>,
}

impl OpenAiEmbedder {
    pub fn from_settings(settings: &GatewaySettings) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| Error::InvalidConfig(format!("http client: {e}")))?;
        let api_key = settings.api_key();
        if api_key.is_none() {
            warn!(env = %settings.api_key_env, "no API key set; sending unauthenticated embedding requests");
        }
        Ok(Self {
            client,
            url: format!("{}/embeddings", settings.base_url.trim_end_matches('/')),
            api_key,
            model: settings.embedding_model.clone(),
            dim: settings.embedding_dim,
        })
    }

    pub fn model(&self) -> &str { &self.model }
}

/// Vectors in input order, checked against the expected count and dimension.
fn vectors(mut parsed: EmbeddingResponse, expected: usize, dim: usize) -> Result<Vec<Vec<f32>>> {
    if parsed.data.len() != expected {
        return Err(Error::Embedding(format!("expected {expected} vectors, got {}", parsed.data.len())));
    }
    parsed.data.sort_by_key(|d| d.index);
    let vectors: Vec<Vec<f32>> = parsed.data.into_iter().map(|d| d.embedding).collect();
    if let Some(bad) = vectors.iter().find(|v| v.len() != dim) {
        return Err(Error::Embedding(format!("expected dim {dim}, got {}", bad.len())));
    }
    Ok(vectors)
}

impl Embedder for OpenAiEmbedder {
    fn dim(&self) -> usize { self.dim }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let mut request = self.client.post(&self.url).json(&EmbeddingRequest { model: &self.model, input: texts });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }
        let response = request.send().map_err(|e| Error::Embedding(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(Error::Embedding(format!("{status}: {body}")));
        }
        let parsed: EmbeddingResponse = response.json().map_err(|e| Error::Embedding(format!("bad response: {e}")))?;
        let vectors = vectors(parsed, texts.len(), self.dim)?;
        debug!(model = %self.model, batch = texts.len(), "embedded batch");
        Ok(vectors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(body: &str) -> EmbeddingResponse {
        serde_json::from_str(body).unwrap()
    }

    #[test]
    fn vectors_follow_input_order() {
        let body = r#"{"object":"list","data":[
            {"object":"embedding","index":2,"embedding":[0.0,0.0,1.0]},
            {"object":"embedding","index":0,"embedding":[1.0,0.0,0.0]},
            {"object":"embedding","index":1,"embedding":[0.0,1.0,0.0]}
        ],"model":"text-embedding-ada-002"}"#;
        let out = vectors(parse(body), 3, 3).unwrap();
        assert_eq!(out, vec![vec![1.0, 0.0, 0.0], vec![0.0, 1.0, 0.0], vec![0.0, 0.0, 1.0]]);
    }

    #[test]
    fn missing_vectors_are_rejected() {
        let body = r#"{"data":[{"index":0,"embedding":[1.0,0.0]}]}"#;
        let err = vectors(parse(body), 2, 2).unwrap_err();
        assert!(matches!(err, Error::Embedding(ref m) if m.contains("expected 2 vectors")), "{err}");
    }

    #[test]
    fn wrong_dimension_is_rejected() {
        let body = r#"{"data":[{"index":1,"embedding":[1.0,0.0]},{"index":0,"embedding":[1.0,0.0,0.0]}]}"#;
        let err = vectors(parse(body), 2, 3).unwrap_err();
        assert!(matches!(err, Error::Embedding(ref m) if m.contains("expected dim 3, got 2")), "{err}");
    }
}
