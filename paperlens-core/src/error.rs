use thiserror::Error;

/// Failures of the embedding provider. These are computation failures, not
/// input-absence cases: they must reach the caller as errors so a failed
/// model call is never mistaken for a legitimate low-importance score.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("embedding request failed: {0}")]
    Http(String),

    #[error("embedding API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("malformed embedding response: {0}")]
    MalformedResponse(String),
}

/// Failures of the section scorer. Input-absence cases (no abstract, short
/// sections, missing feedback) are handled by fallback paths and never
/// surface here.
#[derive(Debug, Error)]
pub enum ScoreError {
    #[error(transparent)]
    Embedding(#[from] EmbeddingError),
}
