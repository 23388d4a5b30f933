// Paperlens Core Library
//
// Provides academic-paper analysis with pluggable preprocessor architecture.
// Main interface for extracting structure, terminology and importance
// scores from PDF papers.

pub mod types;
pub mod preprocessors;
pub mod processor;
pub mod sections;
pub mod terminology;
pub mod scoring;
pub mod embedder;
pub mod feedback;
pub mod cache;
pub mod config;
pub mod error;
pub mod storage;

// Re-export main types and functions for easy use
pub use types::*;
pub use preprocessors::{PdfPreprocessor, Preprocessor};
pub use processor::{paper_id_from_path, AnalysisOptions, PaperProcessor};
pub use config::AnalysisConfig;
pub use embedder::{cosine_similarity, HttpEmbedder, TextEmbedder};
pub use error::{EmbeddingError, ScoreError};
pub use feedback::{FeedbackStore, FeedbackStorage, FileFeedbackStorage};
pub use scoring::SectionScorer;
pub use sections::StructuralExtractor;
pub use terminology::{PatternTerminology, TerminologyProvider};
