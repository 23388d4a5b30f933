use anyhow::Result;
use serde::{Deserialize, Serialize};

// Default value functions for serde
fn default_true() -> bool {
    true
}

fn default_heading_size_ratio() -> f32 {
    // Headings are at least 10% larger than the most common font size.
    1.1
}

fn default_fallback_title() -> String {
    "Document".to_string()
}

fn default_top_n_terms() -> usize {
    20
}

fn default_min_context_words() -> usize {
    5
}

fn default_min_section_words() -> usize {
    10
}

fn default_title_keyword_weight() -> f32 {
    0.2
}

fn default_body_keyword_weight() -> f32 {
    0.1
}

fn default_neutral_score() -> f32 {
    0.5
}

fn default_top_n_sentences() -> usize {
    5
}

fn default_importance_keywords() -> Vec<String> {
    vec![
        "method".to_string(),
        "result".to_string(),
        "conclusion".to_string(),
        "discussion".to_string(),
        "finding".to_string(),
        "contribution".to_string(),
        "evaluation".to_string(),
        "experiment".to_string(),
    ]
}

fn default_embedding_endpoint() -> String {
    "http://localhost:8080/v1".to_string()
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_max_input_chars() -> usize {
    // Roughly a 512-token encoder window; input beyond this is silently
    // truncated before embedding.
    8000
}

fn default_timeout_secs() -> u64 {
    30
}

/// Top-level analysis configuration. Every heuristic constant in the
/// pipeline lives here as a tunable default rather than a hard invariant.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default)]
    pub heading: HeadingConfig,
    #[serde(default)]
    pub terminology: TerminologyConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeadingConfig {
    /// A line is a heading candidate when any span size exceeds
    /// most_common_size * size_ratio.
    #[serde(default = "default_heading_size_ratio")]
    pub size_ratio: f32,
    /// Title for the single collapsed section when no headings are found.
    #[serde(default = "default_fallback_title")]
    pub fallback_title: String,
}

impl Default for HeadingConfig {
    fn default() -> Self {
        Self {
            size_ratio: default_heading_size_ratio(),
            fallback_title: default_fallback_title(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerminologyConfig {
    /// Maximum ranked terms returned per extraction.
    #[serde(default = "default_top_n_terms")]
    pub top_n: usize,
    /// Minimum words for a context-fallback definition sentence.
    #[serde(default = "default_min_context_words")]
    pub min_context_words: usize,
}

impl Default for TerminologyConfig {
    fn default() -> Self {
        Self {
            top_n: default_top_n_terms(),
            min_context_words: default_min_context_words(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Sections shorter than this many words score 0.0 in the model pass.
    #[serde(default = "default_min_section_words")]
    pub min_section_words: usize,
    /// Keywords consulted by the no-abstract fallback heuristic.
    #[serde(default = "default_importance_keywords")]
    pub importance_keywords: Vec<String>,
    /// Added per keyword found in a section title (fallback heuristic).
    #[serde(default = "default_title_keyword_weight")]
    pub title_keyword_weight: f32,
    /// Added per keyword present in a section body (fallback heuristic).
    #[serde(default = "default_body_keyword_weight")]
    pub body_keyword_weight: f32,
    /// Score assigned to sections with no feedback and no model signal.
    #[serde(default = "default_neutral_score")]
    pub neutral_score: f32,
    /// Default sentence count for get_important_sentences.
    #[serde(default = "default_top_n_sentences")]
    pub top_n_sentences: usize,
    /// Whether model-based scoring runs by default.
    #[serde(default = "default_true")]
    pub use_model: bool,
    /// Whether feedback-based scoring runs by default.
    #[serde(default = "default_true")]
    pub use_feedback: bool,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            min_section_words: default_min_section_words(),
            importance_keywords: default_importance_keywords(),
            title_keyword_weight: default_title_keyword_weight(),
            body_keyword_weight: default_body_keyword_weight(),
            neutral_score: default_neutral_score(),
            top_n_sentences: default_top_n_sentences(),
            use_model: true,
            use_feedback: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Base URL of an OpenAI-compatible embeddings API.
    #[serde(default = "default_embedding_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_embedding_model")]
    pub model: String,
    /// Environment variable holding the API key, read at client build time.
    #[serde(default)]
    pub api_key_env: Option<String>,
    /// Inputs are silently truncated to this many characters.
    #[serde(default = "default_max_input_chars")]
    pub max_input_chars: usize,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            endpoint: default_embedding_endpoint(),
            model: default_embedding_model(),
            api_key_env: None,
            max_input_chars: default_max_input_chars(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl AnalysisConfig {
    /// Load config from file path (functional approach)
    pub fn load_from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: AnalysisConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Load config with fallback to default
    pub fn load_with_fallback(path: Option<&str>) -> Self {
        match path {
            Some(p) => Self::load_from_file(p).unwrap_or_else(|_| {
                eprintln!("⚠️  Failed to load config from {}, using defaults", p);
                Self::default()
            }),
            None => Self::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_heuristics() {
        let config = AnalysisConfig::default();
        assert!((config.heading.size_ratio - 1.1).abs() < 1e-6);
        assert_eq!(config.terminology.top_n, 20);
        assert_eq!(config.scoring.min_section_words, 10);
        assert!((config.scoring.title_keyword_weight - 0.2).abs() < 1e-6);
        assert!((config.scoring.body_keyword_weight - 0.1).abs() < 1e-6);
    }

    #[test]
    fn partial_yaml_fills_defaults() {
        let yaml = "heading:\n  size_ratio: 1.25\n";
        let config: AnalysisConfig = serde_yaml::from_str(yaml).unwrap();
        assert!((config.heading.size_ratio - 1.25).abs() < 1e-6);
        assert_eq!(config.heading.fallback_title, "Document");
        assert_eq!(config.terminology.top_n, 20);
    }
}
