use crate::types::*;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Version constants for cache invalidation
pub mod versions {
    pub const PAPERLENS_VERSION: &str = "0.1.0";
    pub const PROCESSING_VERSION: &str = "1.0.0";
}

/// Analysis cache key (PDF + config → analysis)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct AnalysisCacheKey {
    pub pdf_hash: String,
    pub config_hash: String,
    pub paperlens_version: String,
    pub processing_version: String,
}

impl AnalysisCacheKey {
    pub fn new(pdf_hash: String, config_hash: String) -> Self {
        Self {
            pdf_hash,
            config_hash,
            paperlens_version: versions::PAPERLENS_VERSION.to_string(),
            processing_version: versions::PROCESSING_VERSION.to_string(),
        }
    }

    /// Compute cache key hash for storage
    pub fn to_cache_hash(&self) -> String {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(&self.pdf_hash);
        hasher.update(&self.config_hash);
        hasher.update(&self.paperlens_version);
        hasher.update(&self.processing_version);
        format!("{:x}", hasher.finalize())
    }
}

/// Analysis cache value (analysis with metadata)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisCacheValue {
    pub analysis: PaperAnalysis,
    pub created_at: DateTime<Utc>,
    pub processing_time_ms: u64,
    pub cache_version: String,
}

impl AnalysisCacheValue {
    pub fn new(analysis: PaperAnalysis, processing_time_ms: u64) -> Self {
        Self {
            analysis,
            created_at: Utc::now(),
            processing_time_ms,
            cache_version: versions::PAPERLENS_VERSION.to_string(),
        }
    }
}
