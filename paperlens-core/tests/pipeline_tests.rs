//! End-to-end pipeline tests over synthetic documents.
//!
//! These drive the full PaperProcessor with stub collaborators: a
//! preprocessor that returns hand-built structured pages and an embedder
//! with a deterministic two-axis vector space. No real PDF or embedding
//! server is involved, so every assertion here is about pipeline wiring
//! and the documented extraction/scoring semantics.

use anyhow::Result;
use paperlens_core::config::AnalysisConfig;
use paperlens_core::error::EmbeddingError;
use paperlens_core::feedback::FeedbackStore;
use paperlens_core::processor::{AnalysisOptions, PaperProcessor};
use paperlens_core::scoring::SectionScorer;
use paperlens_core::storage::FileStorage;
use paperlens_core::terminology::PatternTerminology;
use paperlens_core::types::*;
use paperlens_core::{Preprocessor, TextEmbedder};
use std::path::Path;
use tempfile::TempDir;

// ============================================================================
// Stub collaborators
// ============================================================================

/// Returns a fixed document regardless of the bytes it is handed.
struct StubPreprocessor {
    output: PreprocessorOutput,
}

impl Preprocessor for StubPreprocessor {
    fn process(&self, _pdf_bytes: &[u8]) -> Result<PreprocessorOutput> {
        Ok(self.output.clone())
    }

    fn name(&self) -> &str {
        "StubPreprocessor"
    }

    fn supports_file_type(&self, _path: &Path) -> bool {
        true
    }
}

/// Always fails, standing in for an unopenable PDF.
struct BrokenPreprocessor;

impl Preprocessor for BrokenPreprocessor {
    fn process(&self, _pdf_bytes: &[u8]) -> Result<PreprocessorOutput> {
        anyhow::bail!("not a PDF")
    }

    fn name(&self) -> &str {
        "BrokenPreprocessor"
    }

    fn supports_file_type(&self, _path: &Path) -> bool {
        true
    }
}

/// Embeds texts along two axes: counts of "alpha" and "beta".
struct KeywordEmbedder;

impl TextEmbedder for KeywordEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        Ok(vec![
            text.matches("alpha").count() as f32,
            text.matches("beta").count() as f32,
        ])
    }

    fn name(&self) -> &str {
        "KeywordEmbedder"
    }
}

// ============================================================================
// Synthetic document helpers
// ============================================================================

fn line(text: &str, size: f32, y: f32) -> TextLine {
    TextLine {
        text: text.to_string(),
        bbox: BoundingBox::new(50.0, y, 400.0, y + size),
        fonts: vec!["Times".to_string()],
        sizes: vec![size],
    }
}

fn page(lines: Vec<TextLine>) -> StructuredPage {
    StructuredPage {
        blocks: vec![TextBlock {
            bbox: BoundingBox::new(0.0, 0.0, 612.0, 792.0),
            lines,
        }],
    }
}

fn body(word: &str) -> String {
    std::iter::repeat(word).take(12).collect::<Vec<_>>().join(" ")
}

/// Three pages, body size 10, headings "Abstract" (page 0) and "Results"
/// (page 1) at size 14.
fn two_heading_paper() -> PreprocessorOutput {
    PreprocessorOutput {
        pages: vec![
            page(vec![
                line("Abstract", 14.0, 700.0),
                line(&format!("{}.", body("alpha")), 10.0, 650.0),
            ]),
            page(vec![
                line("Results", 14.0, 600.0),
                line(&format!("{}.", body("beta")), 10.0, 550.0),
            ]),
            page(vec![line("Neural networks are powerful.", 10.0, 700.0)]),
        ],
        metadata: DocumentMetadata {
            title: "A Study of Things".to_string(),
            author: "A. Author".to_string(),
            subject: String::new(),
            keywords: String::new(),
            page_count: 3,
        },
        potential_figures: vec![PotentialFigure {
            page: 1,
            bbox: BoundingBox::new(0.0, 0.0, 120.0, 80.0),
        }],
    }
}

fn build_processor(dir: &TempDir, preprocessor: Box<dyn Preprocessor>) -> PaperProcessor {
    let config = AnalysisConfig::default();
    let scorer = SectionScorer::new(
        config.scoring.clone(),
        Box::new(KeywordEmbedder),
        FeedbackStore::with_file(dir.path().join("feedback.json")),
    );
    let storage = Box::new(FileStorage::new(dir.path().join("cache").to_str().unwrap()).unwrap());
    let terminology = Box::new(PatternTerminology::new(config.terminology.clone()));
    PaperProcessor::new_with_dependencies(preprocessor, storage, terminology, scorer, config)
}

/// The processor reads the input path from disk before hashing, so every
/// test needs a real file even though the stub ignores its bytes.
fn dummy_pdf(dir: &TempDir) -> String {
    let path = dir.path().join("paper.pdf");
    std::fs::write(&path, b"%PDF-1.4 stub bytes").unwrap();
    path.to_str().unwrap().to_string()
}

fn fresh_options() -> AnalysisOptions {
    AnalysisOptions {
        abstract_text: None,
        use_model: true,
        use_feedback: true,
        skip_cache: true,
        enable_profiling: false,
    }
}

// ============================================================================
// Full pipeline
// ============================================================================

mod full_pipeline {
    use super::*;

    #[test]
    fn analysis_covers_structure_terms_and_scores() {
        let dir = TempDir::new().unwrap();
        let processor = build_processor(&dir, Box::new(StubPreprocessor { output: two_heading_paper() }));
        let input = dummy_pdf(&dir);

        let analysis = processor.analyze_paper_with_options(&input, &fresh_options()).unwrap();

        assert_eq!(analysis.paper_id, "paper.pdf");
        assert_eq!(analysis.structure.metadata.title, "A Study of Things");
        assert_eq!(analysis.structure.sections.len(), 2);
        assert_eq!(analysis.structure.sections[0].title, "Abstract");
        assert_eq!(analysis.structure.sections[1].title, "Results");
        assert_eq!(analysis.structure.potential_figures.len(), 1);

        // Every section got a score with provenance, all within [0, 1]
        assert_eq!(analysis.section_scores.len(), 2);
        for score in analysis.section_scores.values() {
            assert!((0.0..=1.0).contains(&score.score));
            assert!(!score.sources.is_empty());
        }

        // Terminology came from the concatenated section text
        let term = analysis
            .terminology
            .terms
            .iter()
            .find(|t| t.term.to_lowercase().contains("neural networks"));
        assert!(term.is_some(), "expected a neural-networks term, got {:?}", analysis.terminology.terms);
    }

    #[test]
    fn last_section_text_runs_to_document_end() {
        let dir = TempDir::new().unwrap();
        let processor = build_processor(&dir, Box::new(StubPreprocessor { output: two_heading_paper() }));
        let input = dummy_pdf(&dir);

        let analysis = processor.analyze_paper_with_options(&input, &fresh_options()).unwrap();
        let results = analysis.structure.section("Results").unwrap();
        assert!(results.text.contains("beta"));
        assert!(results.text.contains("Neural networks are powerful."));
        assert!(!results.text.contains("alpha"));
    }

    #[test]
    fn unreadable_pdf_degrades_to_empty_analysis() {
        let dir = TempDir::new().unwrap();
        let processor = build_processor(&dir, Box::new(BrokenPreprocessor));
        let input = dummy_pdf(&dir);

        let analysis = processor.analyze_paper_with_options(&input, &fresh_options()).unwrap();
        assert!(analysis.structure.sections.is_empty());
        assert!(analysis.terminology.terms.is_empty());
        assert!(analysis.section_scores.is_empty());
    }

    #[test]
    fn repeated_analysis_is_deterministic() {
        let dir = TempDir::new().unwrap();
        let processor = build_processor(&dir, Box::new(StubPreprocessor { output: two_heading_paper() }));
        let input = dummy_pdf(&dir);

        let first = processor.analyze_paper_with_options(&input, &fresh_options()).unwrap();
        let second = processor.analyze_paper_with_options(&input, &fresh_options()).unwrap();
        assert_eq!(
            serde_json::to_value(&first).unwrap(),
            serde_json::to_value(&second).unwrap()
        );
    }
}

// ============================================================================
// Caching
// ============================================================================

mod caching {
    use super::*;

    #[test]
    fn second_run_hits_the_analysis_cache() {
        let dir = TempDir::new().unwrap();
        let processor = build_processor(&dir, Box::new(StubPreprocessor { output: two_heading_paper() }));
        let input = dummy_pdf(&dir);

        let mut options = fresh_options();
        options.skip_cache = false;

        let first = processor.analyze_paper_with_options(&input, &options).unwrap();
        // A second processor over the same cache dir must serve the cached
        // analysis even though its preprocessor would now fail.
        let cached_processor = build_processor(&dir, Box::new(BrokenPreprocessor));
        let second = cached_processor.analyze_paper_with_options(&input, &options).unwrap();

        assert_eq!(
            serde_json::to_value(&first).unwrap(),
            serde_json::to_value(&second).unwrap()
        );
        assert_eq!(second.structure.sections.len(), 2);
    }
}

// ============================================================================
// Feedback through the pipeline
// ============================================================================

mod feedback_flow {
    use super::*;

    #[test]
    fn recorded_feedback_shifts_the_blended_score() {
        let dir = TempDir::new().unwrap();
        let processor = build_processor(&dir, Box::new(StubPreprocessor { output: two_heading_paper() }));
        let input = dummy_pdf(&dir);

        let baseline = processor.analyze_paper_with_options(&input, &fresh_options()).unwrap();
        let before = baseline.section_scores["Results"].clone();
        assert_eq!(before.sources.get("feedback"), Some(&0.5));

        assert!(processor.add_user_feedback("paper.pdf", "Results", 1.0));

        let rated = processor.analyze_paper_with_options(&input, &fresh_options()).unwrap();
        let after = &rated.section_scores["Results"];
        assert_eq!(after.sources.get("feedback"), Some(&1.0));
        assert!(after.score > before.score);
        // Blend stays the mean of its sources
        let mean: f32 = after.sources.values().sum::<f32>() / after.sources.len() as f32;
        assert!((after.score - mean).abs() < 1e-6);
    }

    #[test]
    fn model_only_scoring_ignores_recorded_feedback() {
        let dir = TempDir::new().unwrap();
        let processor = build_processor(&dir, Box::new(StubPreprocessor { output: two_heading_paper() }));
        let input = dummy_pdf(&dir);
        processor.add_user_feedback("paper.pdf", "Results", 1.0);

        let mut options = fresh_options();
        options.use_feedback = false;
        let analysis = processor.analyze_paper_with_options(&input, &options).unwrap();
        assert!(!analysis.section_scores["Results"].sources.contains_key("feedback"));
    }
}
