use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ===== GEOMETRY =====
// Coordinates are PDF user space: origin bottom-left, y increases upward,
// units are points. "Above" on the page therefore means a *larger* y.

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl BoundingBox {
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// Top edge of the box (largest y).
    pub fn top(&self) -> f32 {
        self.y1
    }

    /// Bottom edge of the box (smallest y).
    pub fn bottom(&self) -> f32 {
        self.y0
    }
}

// ===== STRUCTURED TEXT =====
// The positioned-text model the structural extractor consumes. Produced by
// a Preprocessor backend; everything downstream is backend-agnostic.

/// One visual line: span text concatenated, fonts/sizes aggregated per line.
/// No whitespace normalization beyond what the text layer provides.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextLine {
    pub text: String,
    pub bbox: BoundingBox,
    pub fonts: Vec<String>,
    pub sizes: Vec<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextBlock {
    pub bbox: BoundingBox,
    pub lines: Vec<TextLine>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StructuredPage {
    pub blocks: Vec<TextBlock>,
}

impl StructuredPage {
    pub fn lines(&self) -> impl Iterator<Item = &TextLine> {
        self.blocks.iter().flat_map(|b| b.lines.iter())
    }
}

/// A line whose font size exceeds the document's heading threshold.
/// Ephemeral: produced and consumed within one extraction call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeadingCandidate {
    /// Zero-based page index.
    pub page: usize,
    pub text: String,
    /// Largest span size on the line.
    pub size: f32,
    pub bbox: BoundingBox,
}

// ===== DOCUMENT STRUCTURE =====

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentMetadata {
    /// Metadata strings fall back to "" when the PDF omits them.
    pub title: String,
    pub author: String,
    pub subject: String,
    pub keywords: String,
    pub page_count: usize,
}

/// A titled span of document content, in document order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Section {
    pub title: String,
    pub text: String,
    /// Present only when populated by a path with confidence reporting.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
}

impl Section {
    pub fn new(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            text: text.into(),
            confidence: None,
        }
    }

    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }
}

/// Best-effort record of an embedded raster image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PotentialFigure {
    pub page: usize,
    pub bbox: BoundingBox,
}

/// Top-level output of the structural extractor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentStructure {
    pub metadata: DocumentMetadata,
    /// Ordered by position in the document; titles are unique per document.
    pub sections: Vec<Section>,
    pub potential_figures: Vec<PotentialFigure>,
}

impl DocumentStructure {
    pub fn section(&self, title: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.title == title)
    }
}

/// Complete output from document preprocessing: everything a backend can
/// pull out of the raw bytes in one pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PreprocessorOutput {
    pub pages: Vec<StructuredPage>,
    pub metadata: DocumentMetadata,
    pub potential_figures: Vec<PotentialFigure>,
}

// ===== TERMINOLOGY =====

/// A candidate terminology item with its frequency-based score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Term {
    pub term: String,
    pub score: f32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Terminology {
    /// Descending by score, at most top_n entries.
    pub terms: Vec<Term>,
    /// Keyed by term surface text; terms with no usable sentence have no entry.
    pub definitions: HashMap<String, String>,
}

// ===== SCORING =====

/// Importance score for one section, with per-source provenance.
/// Invariant: `score` is the arithmetic mean of the values in `sources`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionScore {
    pub score: f32,
    /// Keyed by source name: "model", "feedback" or "default".
    pub sources: HashMap<String, f32>,
}

impl SectionScore {
    pub fn from_sources(sources: HashMap<String, f32>) -> Self {
        if sources.is_empty() {
            let mut defaults = HashMap::new();
            defaults.insert("default".to_string(), 0.5);
            return Self {
                score: 0.5,
                sources: defaults,
            };
        }
        let score = sources.values().sum::<f32>() / sources.len() as f32;
        Self { score, sources }
    }
}

// ===== ANALYSIS =====

/// Complete analysis of one paper: structure, terminology and per-section
/// importance scores.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaperAnalysis {
    /// Stable surrogate identity (file name), used to attach feedback.
    pub paper_id: String,
    pub structure: DocumentStructure,
    pub terminology: Terminology,
    /// Keyed by section title.
    pub section_scores: HashMap<String, SectionScore>,
}

// ===== FONT ANALYSIS =====

/// Font-size statistics computed across a whole document.
#[derive(Debug, Clone)]
pub struct FontSizeAnalysis {
    /// Occurrence count per size, keyed by "{:.1}" string for stable grouping.
    pub size_counts: HashMap<String, usize>,
    /// Most frequently occurring span size. Ties break toward the smallest
    /// size so a tie widens the heading set rather than emptying it.
    pub most_common_size: f32,
    pub total_spans: usize,
}

impl FontSizeAnalysis {
    /// Analyze every span size on every line of the document.
    /// Returns None for a document with no sized text at all; callers must
    /// treat that as "no headings found".
    pub fn analyze(pages: &[StructuredPage]) -> Option<Self> {
        let mut size_counts: HashMap<String, usize> = HashMap::new();
        let mut total_spans = 0usize;

        for page in pages {
            for line in page.lines() {
                for size in &line.sizes {
                    let key = format!("{:.1}", size);
                    *size_counts.entry(key).or_insert(0) += 1;
                    total_spans += 1;
                }
            }
        }

        if total_spans == 0 {
            return None;
        }

        let most_common_size = size_counts
            .iter()
            .filter_map(|(key, &count)| key.parse::<f32>().ok().map(|size| (size, count)))
            .max_by(|(size_a, count_a), (size_b, count_b)| {
                count_a
                    .cmp(count_b)
                    .then(size_b.partial_cmp(size_a).unwrap_or(std::cmp::Ordering::Equal))
            })
            .map(|(size, _)| size)
            .unwrap_or(12.0);

        Some(Self {
            size_counts,
            most_common_size,
            total_spans,
        })
    }
}
