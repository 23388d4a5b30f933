use crate::cache::{AnalysisCacheKey, AnalysisCacheValue};
use crate::config::AnalysisConfig;
use crate::embedder::HttpEmbedder;
use crate::feedback::FeedbackStore;
use crate::preprocessors::{PdfPreprocessor, Preprocessor};
use crate::scoring::SectionScorer;
use crate::sections::StructuralExtractor;
use crate::storage::{calculate_config_hash, calculate_pdf_hash, DocumentStorage, FileStorage};
use crate::terminology::{PatternTerminology, TerminologyProvider};
use crate::types::*;
use anyhow::Result;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Simple profiler that collects timings for pipeline steps
pub struct StepProfiler {
    enabled: bool,
    timings: Vec<(String, Duration)>,
}

impl StepProfiler {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            timings: Vec::new(),
        }
    }

    pub fn time_step<F, R>(&mut self, step_name: &str, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        if !self.enabled {
            return f();
        }

        let start = Instant::now();
        let result = f();
        let elapsed = start.elapsed();

        self.timings.push((step_name.to_string(), elapsed));
        println!("⏱️  {}: {:.0}ms", step_name, elapsed.as_millis());

        result
    }

    pub fn print_summary(&self) {
        if !self.enabled || self.timings.is_empty() {
            return;
        }

        println!("\n📊 Performance Summary:");
        let total: Duration = self.timings.iter().map(|(_, d)| *d).sum();

        for (step, duration) in &self.timings {
            let percentage = (duration.as_secs_f64() / total.as_secs_f64()) * 100.0;
            println!(
                "   {:.<35} {:.0}ms ({:.1}%)",
                step,
                duration.as_millis(),
                percentage
            );
        }
        println!("   {:.<35} {:.0}ms", "Total", total.as_millis());
    }
}

/// Per-call analysis options.
#[derive(Debug, Clone)]
pub struct AnalysisOptions {
    /// Abstract override; when absent the scorer searches the sections.
    pub abstract_text: Option<String>,
    pub use_model: bool,
    pub use_feedback: bool,
    pub skip_cache: bool,
    pub enable_profiling: bool,
}

impl AnalysisOptions {
    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self {
            abstract_text: None,
            use_model: config.scoring.use_model,
            use_feedback: config.scoring.use_feedback,
            skip_cache: false,
            enable_profiling: false,
        }
    }
}

/// Stable surrogate identity for a paper: the file name. Content hashes
/// would orphan feedback whenever the file is re-exported.
pub fn paper_id_from_path(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

pub struct PaperProcessor {
    preprocessor: Box<dyn Preprocessor>,
    storage: Box<dyn DocumentStorage + Send + Sync>,
    extractor: StructuralExtractor,
    terminology: Box<dyn TerminologyProvider>,
    scorer: SectionScorer,
    config: AnalysisConfig,
}

impl PaperProcessor {
    /// Create PaperProcessor with full dependency injection
    pub fn new_with_dependencies(
        preprocessor: Box<dyn Preprocessor>,
        storage: Box<dyn DocumentStorage + Send + Sync>,
        terminology: Box<dyn TerminologyProvider>,
        scorer: SectionScorer,
        config: AnalysisConfig,
    ) -> Self {
        let extractor = StructuralExtractor::new(config.heading.clone());
        Self {
            preprocessor,
            storage,
            extractor,
            terminology,
            scorer,
            config,
        }
    }

    /// Convenience constructor for CLI usage: lopdf backend, file-based
    /// cache, HTTP embedder and file-backed feedback.
    pub fn new_cli(config: AnalysisConfig, cache_dir: &str, feedback_path: PathBuf) -> Result<Self> {
        let preprocessor = Box::new(PdfPreprocessor::new());
        let storage = Box::new(FileStorage::new(cache_dir)?);
        let terminology = Box::new(PatternTerminology::new(config.terminology.clone()));
        let scorer = SectionScorer::new(
            config.scoring.clone(),
            Box::new(HttpEmbedder::new(&config.embedding)),
            FeedbackStore::with_file(feedback_path),
        );
        Ok(Self::new_with_dependencies(
            preprocessor,
            storage,
            terminology,
            scorer,
            config,
        ))
    }

    pub fn scorer(&self) -> &SectionScorer {
        &self.scorer
    }

    /// Analyze with default options from the loaded config.
    pub fn analyze_paper(&self, input_path: &str) -> Result<PaperAnalysis> {
        let options = AnalysisOptions::from_config(&self.config);
        self.analyze_paper_with_options(input_path, &options)
    }

    /// Full pipeline: PDF + config → structure, terminology and scores,
    /// with two cache levels keyed on PDF content and config.
    pub fn analyze_paper_with_options(
        &self,
        input_path: &str,
        options: &AnalysisOptions,
    ) -> Result<PaperAnalysis> {
        let start_time = Instant::now();
        let mut profiler = StepProfiler::new(options.enable_profiling);

        let pdf_bytes = std::fs::read(input_path)?;
        let pdf_hash = calculate_pdf_hash(&pdf_bytes);
        let config_hash = calculate_config_hash(&self.config)?;
        let cache_key = AnalysisCacheKey::new(pdf_hash.clone(), config_hash);

        if options.skip_cache {
            println!("🚫 Skipping cache lookup (--skip-cache enabled)");
        } else if let Some(cached) = self.storage.get_analysis(&cache_key)? {
            println!("🎯 Cache hit: Found analysis for PDF + config combination");
            println!(
                "⏱️  Total processing time: {:.0}ms (cached)",
                start_time.elapsed().as_millis()
            );
            return Ok(cached.analysis);
        }

        println!("📄 Analyzing paper: {}", input_path);
        let paper_id = paper_id_from_path(Path::new(input_path));

        // Stage 1: Preprocessing (PDF → structured pages). An unreadable
        // PDF degrades to an empty document so downstream stages still run.
        let preprocessor_output = profiler.time_step("1. PDF Extraction", || {
            match self.storage.get_preprocessor_output(&pdf_hash) {
                Ok(Some(cached)) => return cached,
                Ok(None) => {}
                Err(err) => eprintln!("⚠️  Preprocessor cache read failed: {}", err),
            }
            match self.preprocessor.process(&pdf_bytes) {
                Ok(output) => {
                    if let Err(err) = self.storage.store_preprocessor_output(&pdf_hash, &output) {
                        eprintln!("⚠️  Preprocessor cache write failed: {}", err);
                    }
                    output
                }
                Err(err) => {
                    eprintln!("⚠️  Failed to parse {}: {}", input_path, err);
                    PreprocessorOutput::default()
                }
            }
        });

        // Stage 2: Structural extraction
        let structure = profiler.time_step("2. Structural Extraction", || {
            self.extractor.document_structure(&preprocessor_output)
        });
        if structure.sections.is_empty() {
            println!("⚠️  No structure found in {}", input_path);
        } else {
            println!("📝 Extracted {} sections", structure.sections.len());
        }

        // Stage 3: Terminology. A failing provider (e.g. LLM-backed) falls
        // back to the deterministic pattern extractor.
        let full_text = structure
            .sections
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        let terminology = profiler.time_step("3. Terminology", || {
            match self.terminology.extract(&full_text) {
                Ok(terminology) => terminology,
                Err(err) => {
                    eprintln!(
                        "⚠️  Terminology provider {} failed ({}), using pattern fallback",
                        self.terminology.name(),
                        err
                    );
                    PatternTerminology::new(self.config.terminology.clone())
                        .extract_terminology(&full_text)
                }
            }
        });
        println!("🔤 Found {} terms", terminology.terms.len());

        // Stage 4: Importance scoring. Embedding failures propagate; a
        // silent zero would look like a real low-importance judgment.
        let section_scores = profiler.time_step("4. Importance Scoring", || {
            self.scorer.score_sections(
                &paper_id,
                &structure.sections,
                options.abstract_text.as_deref(),
                options.use_model,
                options.use_feedback,
            )
        })?;

        let analysis = PaperAnalysis {
            paper_id,
            structure,
            terminology,
            section_scores,
        };

        if options.skip_cache {
            println!("🚫 Skipping cache storage (--skip-cache enabled)");
        } else {
            let processing_time = start_time.elapsed().as_millis() as u64;
            let cache_value = AnalysisCacheValue::new(analysis.clone(), processing_time);
            self.storage.store_analysis(&cache_key, &cache_value)?;
        }

        profiler.print_summary();
        println!(
            "⏱️  Total processing time: {:.3}s",
            start_time.elapsed().as_secs_f64()
        );
        Ok(analysis)
    }

    /// Record a user rating for one section. Returns false when the
    /// feedback file could not be written.
    pub fn add_user_feedback(&self, paper_id: &str, section_title: &str, score: f32) -> bool {
        self.scorer.add_user_feedback(paper_id, section_title, score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paper_id_is_the_file_name() {
        assert_eq!(paper_id_from_path(Path::new("/data/papers/attention.pdf")), "attention.pdf");
        assert_eq!(paper_id_from_path(Path::new("attention.pdf")), "attention.pdf");
    }

    #[test]
    fn options_follow_config_defaults() {
        let options = AnalysisOptions::from_config(&AnalysisConfig::default());
        assert!(options.use_model);
        assert!(options.use_feedback);
        assert!(!options.skip_cache);
        assert!(options.abstract_text.is_none());
    }
}
