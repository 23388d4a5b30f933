use crate::cache::{AnalysisCacheKey, AnalysisCacheValue};
use crate::types::PreprocessorOutput;
use anyhow::{anyhow, Result};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;

/// Storage abstraction for caching PDF processing results
pub trait DocumentStorage {
    // Level 1: Preprocessor cache (PDF → PreprocessorOutput)
    fn get_preprocessor_output(&self, pdf_hash: &str) -> Result<Option<PreprocessorOutput>>;
    fn store_preprocessor_output(&self, pdf_hash: &str, output: &PreprocessorOutput) -> Result<()>;

    // Level 2: Analysis cache (PreprocessorOutput + Config → PaperAnalysis)
    fn get_analysis(&self, cache_key: &AnalysisCacheKey) -> Result<Option<AnalysisCacheValue>>;
    fn store_analysis(&self, cache_key: &AnalysisCacheKey, cache_value: &AnalysisCacheValue) -> Result<()>;
}

/// File-based storage implementation using local cache directory
pub struct FileStorage {
    cache_dir: String,
}

impl FileStorage {
    pub fn new(cache_dir: &str) -> Result<Self> {
        // Ensure cache directory exists
        fs::create_dir_all(cache_dir)?;
        fs::create_dir_all(format!("{cache_dir}/preprocessor"))?;
        fs::create_dir_all(format!("{cache_dir}/analysis"))?;

        Ok(Self {
            cache_dir: cache_dir.to_string(),
        })
    }

    fn preprocessor_path(&self, hash: &str) -> String {
        format!("{}/preprocessor/{}.json", self.cache_dir, hash)
    }

    fn analysis_path(&self, cache_key: &AnalysisCacheKey) -> String {
        format!("{}/analysis/{}.json", self.cache_dir, cache_key.to_cache_hash())
    }
}

impl DocumentStorage for FileStorage {
    fn get_preprocessor_output(&self, pdf_hash: &str) -> Result<Option<PreprocessorOutput>> {
        let path = self.preprocessor_path(pdf_hash);
        if Path::new(&path).exists() {
            let json_str = fs::read_to_string(path)?;
            let output: PreprocessorOutput = serde_json::from_str(&json_str)
                .map_err(|e| anyhow!("Failed to deserialize cached PreprocessorOutput: {}", e))?;
            Ok(Some(output))
        } else {
            Ok(None)
        }
    }

    fn store_preprocessor_output(&self, pdf_hash: &str, output: &PreprocessorOutput) -> Result<()> {
        let path = self.preprocessor_path(pdf_hash);
        let json_str = serde_json::to_string_pretty(output)
            .map_err(|e| anyhow!("Failed to serialize PreprocessorOutput: {}", e))?;
        fs::write(path, json_str)?;
        Ok(())
    }

    fn get_analysis(&self, cache_key: &AnalysisCacheKey) -> Result<Option<AnalysisCacheValue>> {
        let path = self.analysis_path(cache_key);
        if Path::new(&path).exists() {
            let json_str = fs::read_to_string(path)?;
            let cache_value: AnalysisCacheValue = serde_json::from_str(&json_str)
                .map_err(|e| anyhow!("Failed to deserialize cached AnalysisCacheValue: {}", e))?;
            Ok(Some(cache_value))
        } else {
            Ok(None)
        }
    }

    fn store_analysis(&self, cache_key: &AnalysisCacheKey, cache_value: &AnalysisCacheValue) -> Result<()> {
        let path = self.analysis_path(cache_key);
        let json_str = serde_json::to_string_pretty(cache_value)
            .map_err(|e| anyhow!("Failed to serialize AnalysisCacheValue: {}", e))?;
        fs::write(path, json_str)?;
        Ok(())
    }
}

/// Calculate a fast hash for PDF content using start + end chunks
pub fn calculate_pdf_hash(pdf_bytes: &[u8]) -> String {
    let chunk_size = 1024; // 1KB from start and end
    let mut hasher = Sha256::new();

    // Hash file size first (for quick differentiation)
    hasher.update(pdf_bytes.len().to_le_bytes());

    // Hash first chunk
    let start_end = std::cmp::min(chunk_size, pdf_bytes.len());
    hasher.update(&pdf_bytes[0..start_end]);

    // Hash last chunk (if file is large enough)
    if pdf_bytes.len() > chunk_size {
        let end_start = pdf_bytes.len() - chunk_size;
        hasher.update(&pdf_bytes[end_start..]);
    }

    format!("{:x}", hasher.finalize())
}

/// Calculate hash for configuration data (for Level 2 cache key)
pub fn calculate_config_hash<T: serde::Serialize>(config: &T) -> Result<String> {
    let config_json = serde_json::to_string(config)
        .map_err(|e| anyhow!("Failed to serialize config for hashing: {}", e))?;

    let mut hasher = Sha256::new();
    hasher.update(config_json.as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}

/// No-op storage implementation that disables all caching
pub struct NoOpStorage;

impl Default for NoOpStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl NoOpStorage {
    pub fn new() -> Self {
        Self
    }
}

impl DocumentStorage for NoOpStorage {
    fn get_preprocessor_output(&self, _pdf_hash: &str) -> Result<Option<PreprocessorOutput>> {
        Ok(None) // Always cache miss
    }

    fn store_preprocessor_output(&self, _pdf_hash: &str, _output: &PreprocessorOutput) -> Result<()> {
        Ok(()) // No-op
    }

    fn get_analysis(&self, _cache_key: &AnalysisCacheKey) -> Result<Option<AnalysisCacheValue>> {
        Ok(None) // Always cache miss
    }

    fn store_analysis(&self, _cache_key: &AnalysisCacheKey, _cache_value: &AnalysisCacheValue) -> Result<()> {
        Ok(()) // No-op
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PaperAnalysis;
    use tempfile::TempDir;

    #[test]
    fn test_pdf_hash_consistency() {
        let pdf_data = b"test pdf content with some data";
        let hash1 = calculate_pdf_hash(pdf_data);
        let hash2 = calculate_pdf_hash(pdf_data);
        assert_eq!(hash1, hash2);
    }

    #[test]
    fn test_pdf_hash_uniqueness() {
        let pdf1 = b"test pdf content 1";
        let pdf2 = b"test pdf content 2";
        let hash1 = calculate_pdf_hash(pdf1);
        let hash2 = calculate_pdf_hash(pdf2);
        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_preprocessor_cache_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::new(temp_dir.path().to_str().unwrap()).unwrap();

        let output = PreprocessorOutput::default();
        storage.store_preprocessor_output("hash1", &output).unwrap();
        let retrieved = storage.get_preprocessor_output("hash1").unwrap();
        assert!(retrieved.is_some());
        assert!(storage.get_preprocessor_output("other").unwrap().is_none());
    }

    #[test]
    fn test_analysis_cache_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::new(temp_dir.path().to_str().unwrap()).unwrap();

        let key = AnalysisCacheKey::new("pdf_hash".to_string(), "config_hash".to_string());
        let value = AnalysisCacheValue::new(PaperAnalysis::default(), 42);
        storage.store_analysis(&key, &value).unwrap();

        let retrieved = storage.get_analysis(&key).unwrap().unwrap();
        assert_eq!(retrieved.processing_time_ms, 42);
        assert_eq!(retrieved.analysis.paper_id, "");
    }
}
