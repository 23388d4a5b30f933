//! Structural extraction: turn positioned pages into an ordered list of
//! titled sections using document-wide font-size statistics.

use crate::config::HeadingConfig;
use crate::types::*;

/// Detects headings and slices the document into sections.
///
/// All operations are pure over the structured pages a Preprocessor backend
/// produced; no I/O happens here.
pub struct StructuralExtractor {
    config: HeadingConfig,
}

impl Default for StructuralExtractor {
    fn default() -> Self {
        Self::new(HeadingConfig::default())
    }
}

impl StructuralExtractor {
    pub fn new(config: HeadingConfig) -> Self {
        Self { config }
    }

    /// Lines whose largest span size exceeds `most_common_size * size_ratio`.
    ///
    /// One candidate per qualifying line, not deduplicated by text. A
    /// document with no sized text yields an empty list, which callers must
    /// treat as "no headings found".
    pub fn identify_heading_candidates(&self, pages: &[StructuredPage]) -> Vec<HeadingCandidate> {
        let Some(analysis) = FontSizeAnalysis::analyze(pages) else {
            return Vec::new();
        };
        let threshold = analysis.most_common_size * self.config.size_ratio;

        let mut candidates = Vec::new();
        for (page_index, page) in pages.iter().enumerate() {
            for line in page.lines() {
                let max_size = line.sizes.iter().copied().fold(0.0f32, f32::max);
                if line.sizes.iter().any(|&s| s > threshold) {
                    candidates.push(HeadingCandidate {
                        page: page_index,
                        text: line.text.clone(),
                        size: max_size,
                        bbox: line.bbox,
                    });
                }
            }
        }
        candidates
    }

    /// Slice the document into ordered (title, text) sections.
    ///
    /// Each section's body runs from the bottom edge of its heading to the
    /// top edge of the next heading (or document end). Headings with blank
    /// text are dropped before slicing, so their content flows into the
    /// neighboring section instead of creating a nameless entry. With zero
    /// usable headings the whole document collapses into a single section
    /// under the configured fallback title.
    pub fn extract_sections(&self, pages: &[StructuredPage]) -> Vec<Section> {
        let mut candidates = self.identify_heading_candidates(pages);
        candidates.retain(|c| !c.text.trim().is_empty());

        // Reading order: page ascending, then top of page first (larger y
        // first, since coordinates grow upward).
        candidates.sort_by(|a, b| {
            a.page.cmp(&b.page).then(
                b.bbox
                    .top()
                    .partial_cmp(&a.bbox.top())
                    .unwrap_or(std::cmp::Ordering::Equal),
            )
        });

        if candidates.is_empty() {
            let full_text = document_text(pages);
            if full_text.trim().is_empty() {
                return Vec::new();
            }
            return vec![Section::new(self.config.fallback_title.clone(), full_text)];
        }

        let mut sections: Vec<Section> = Vec::new();
        for (i, heading) in candidates.iter().enumerate() {
            let next = candidates.get(i + 1);
            let text = collect_span_text(pages, heading, next);
            upsert_section(&mut sections, heading.text.trim().to_string(), text);
        }
        sections
    }

    /// Metadata, sections and figure records in one call.
    pub fn document_structure(&self, output: &PreprocessorOutput) -> DocumentStructure {
        DocumentStructure {
            metadata: output.metadata.clone(),
            sections: self.extract_sections(&output.pages),
            potential_figures: output.potential_figures.clone(),
        }
    }
}

/// Ordered-mapping insert: a repeated heading title overwrites the earlier
/// section's text but keeps its original position.
fn upsert_section(sections: &mut Vec<Section>, title: String, text: String) {
    match sections.iter_mut().find(|s| s.title == title) {
        Some(existing) => existing.text = text,
        None => sections.push(Section::new(title, text)),
    }
}

/// Gather the text between one heading's bottom edge and the next heading's
/// top edge. Pages strictly between the two headings are taken in full.
fn collect_span_text(
    pages: &[StructuredPage],
    heading: &HeadingCandidate,
    next: Option<&HeadingCandidate>,
) -> String {
    let end_page = next.map(|n| n.page).unwrap_or(pages.len().saturating_sub(1));
    let mut parts: Vec<&str> = Vec::new();

    for page_index in heading.page..=end_page {
        let Some(page) = pages.get(page_index) else {
            continue;
        };
        for line in page.lines() {
            if page_index == heading.page && line.bbox.top() >= heading.bbox.bottom() {
                continue;
            }
            if let Some(next) = next {
                if page_index == next.page && line.bbox.bottom() <= next.bbox.top() {
                    continue;
                }
            }
            if !line.text.trim().is_empty() {
                parts.push(line.text.trim());
            }
        }
    }

    parts.join("\n")
}

fn document_text(pages: &[StructuredPage]) -> String {
    let parts: Vec<&str> = pages
        .iter()
        .flat_map(|page| page.lines())
        .map(|line| line.text.trim())
        .filter(|text| !text.is_empty())
        .collect();
    parts.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

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

    /// Three pages, body size 10, two size-14 headings on pages 0 and 1.
    fn two_heading_document() -> Vec<StructuredPage> {
        vec![
            page(vec![
                line("Abstract", 14.0, 700.0),
                line("We study the thing.", 10.0, 650.0),
                line("It is interesting.", 10.0, 630.0),
            ]),
            page(vec![
                line("Some carried-over text.", 10.0, 720.0),
                line("Results", 14.0, 600.0),
                line("The thing works.", 10.0, 550.0),
            ]),
            page(vec![line("Still more results.", 10.0, 700.0)]),
        ]
    }

    #[test]
    fn finds_both_headings() {
        let extractor = StructuralExtractor::default();
        let candidates = extractor.identify_heading_candidates(&two_heading_document());
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].text, "Abstract");
        assert_eq!(candidates[1].text, "Results");
    }

    #[test]
    fn sections_span_heading_to_heading() {
        let extractor = StructuralExtractor::default();
        let sections = extractor.extract_sections(&two_heading_document());
        assert_eq!(sections.len(), 2);

        let abstract_section = &sections[0];
        assert_eq!(abstract_section.title, "Abstract");
        assert!(abstract_section.text.contains("We study the thing."));
        assert!(abstract_section.text.contains("carried-over"));
        assert!(!abstract_section.text.contains("The thing works."));

        let results = &sections[1];
        assert_eq!(results.title, "Results");
        assert!(results.text.contains("The thing works."));
        assert!(results.text.contains("Still more results."));
        assert!(!results.text.contains("We study"));
    }

    #[test]
    fn section_bodies_do_not_overlap() {
        let extractor = StructuralExtractor::default();
        let sections = extractor.extract_sections(&two_heading_document());
        for pair in sections.windows(2) {
            for line in pair[0].text.lines() {
                assert!(!pair[1].text.contains(line), "line {:?} appears twice", line);
            }
        }
    }

    #[test]
    fn no_headings_collapses_to_single_document_section() {
        let pages = vec![page(vec![
            line("All the same size here.", 10.0, 700.0),
            line("No heading anywhere.", 10.0, 680.0),
        ])];
        let extractor = StructuralExtractor::default();
        let sections = extractor.extract_sections(&pages);
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].title, "Document");
        assert!(sections[0].text.contains("All the same size here."));
        assert!(sections[0].text.contains("No heading anywhere."));
    }

    #[test]
    fn empty_document_yields_no_sections() {
        let extractor = StructuralExtractor::default();
        assert!(extractor.extract_sections(&[]).is_empty());
        assert!(extractor
            .identify_heading_candidates(&[StructuredPage::default()])
            .is_empty());
    }

    #[test]
    fn blank_heading_merges_into_neighbor() {
        let pages = vec![page(vec![
            line("Intro", 14.0, 700.0),
            line("First body line.", 10.0, 660.0),
            line("   ", 14.0, 640.0),
            line("Second body line.", 10.0, 620.0),
        ])];
        let extractor = StructuralExtractor::default();
        let sections = extractor.extract_sections(&pages);
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].title, "Intro");
        assert!(sections[0].text.contains("First body line."));
        assert!(sections[0].text.contains("Second body line."));
    }

    #[test]
    fn repeated_heading_title_keeps_one_entry() {
        let pages = vec![page(vec![
            line("Notes", 14.0, 700.0),
            line("Early notes.", 10.0, 660.0),
            line("Notes", 14.0, 600.0),
            line("Late notes.", 10.0, 560.0),
        ])];
        let extractor = StructuralExtractor::default();
        let sections = extractor.extract_sections(&pages);
        assert_eq!(sections.len(), 1);
        assert!(sections[0].text.contains("Late notes."));
    }
}
