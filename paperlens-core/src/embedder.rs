//! Text embedding client and vector similarity.
//!
//! `HttpEmbedder` talks to any OpenAI-compatible `/embeddings` endpoint, so
//! the same code covers a local inference server and hosted APIs. Scoring
//! code depends only on the `TextEmbedder` trait, which keeps test doubles
//! trivial.

use crate::config::EmbeddingConfig;
use crate::error::EmbeddingError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub trait TextEmbedder {
    /// Embed one text into a fixed-dimension vector. Deterministic for
    /// identical input. Inputs beyond the configured maximum length are
    /// silently truncated; empty input embeds a placeholder rather than
    /// failing.
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    fn name(&self) -> &str;
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

pub struct HttpEmbedder {
    agent: ureq::Agent,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    max_input_chars: usize,
}

impl HttpEmbedder {
    pub fn new(config: &EmbeddingConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build();
        let api_key = config
            .api_key_env
            .as_deref()
            .and_then(|var| std::env::var(var).ok());

        Self {
            agent,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
            max_input_chars: config.max_input_chars,
        }
    }
}

impl TextEmbedder for HttpEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let truncated: String = text.chars().take(self.max_input_chars).collect();
        // Most servers reject a zero-length input outright.
        let input = if truncated.is_empty() { " " } else { &truncated };

        let url = format!("{}/embeddings", self.endpoint);
        let mut request = self.agent.post(&url).set("Content-Type", "application/json");
        if let Some(key) = &self.api_key {
            request = request.set("Authorization", &format!("Bearer {}", key));
        }

        let response = request
            .send_json(EmbeddingRequest {
                model: &self.model,
                input,
            })
            .map_err(|err| match err {
                ureq::Error::Status(status, response) => EmbeddingError::Api {
                    status,
                    message: response.into_string().unwrap_or_default(),
                },
                other => EmbeddingError::Http(other.to_string()),
            })?;

        let parsed: EmbeddingResponse = response
            .into_json()
            .map_err(|err| EmbeddingError::MalformedResponse(err.to_string()))?;
        parsed
            .data
            .into_iter()
            .next()
            .map(|data| data.embedding)
            .ok_or_else(|| EmbeddingError::MalformedResponse("empty data array".to_string()))
    }

    fn name(&self) -> &str {
        "HttpEmbedder"
    }
}

/// Cosine similarity in [-1, 1]. Mismatched dimensions or a zero-magnitude
/// vector yield 0.0 rather than NaN.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cosine_identical_vectors() {
        let v = vec![0.5, 0.25, -1.0];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_orthogonal_vectors() {
        assert!((cosine_similarity(&[1.0, 0.0], &[0.0, 1.0])).abs() < 1e-6);
    }

    #[test]
    fn cosine_opposite_vectors() {
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_zero_vector_is_zero() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]), 0.0);
    }

    #[test]
    fn cosine_mismatched_lengths_is_zero() {
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 2.0]), 0.0);
    }
}
