//! Section importance scoring: semantic similarity to the abstract blended
//! with persisted user feedback.

use crate::config::ScoringConfig;
use crate::embedder::{cosine_similarity, TextEmbedder};
use crate::error::ScoreError;
use crate::feedback::FeedbackStore;
use crate::types::{Section, SectionScore};
use std::collections::HashMap;

/// Scores sections of one paper. Stateless per call apart from the feedback
/// store's durable records; the embedder is injected so tests can substitute
/// a deterministic double.
pub struct SectionScorer {
    config: ScoringConfig,
    embedder: Box<dyn TextEmbedder>,
    feedback: FeedbackStore,
}

impl SectionScorer {
    pub fn new(config: ScoringConfig, embedder: Box<dyn TextEmbedder>, feedback: FeedbackStore) -> Self {
        Self {
            config,
            embedder,
            feedback,
        }
    }

    pub fn feedback(&self) -> &FeedbackStore {
        &self.feedback
    }

    /// Cosine similarity of the two texts' embeddings, clamped to [0, 1].
    /// Embedding failures propagate; a silent zero here would read as a
    /// legitimate low-importance signal downstream.
    pub fn compute_similarity(&self, text1: &str, text2: &str) -> Result<f32, ScoreError> {
        let embedding1 = self.embedder.embed(text1)?;
        let embedding2 = self.embedder.embed(text2)?;
        Ok(cosine_similarity(&embedding1, &embedding2).clamp(0.0, 1.0))
    }

    /// Content-based score per section title.
    ///
    /// With an abstract available (supplied, or discovered among the
    /// sections by title), each section scores its similarity to it; without
    /// one, a keyword presence heuristic stands in. Sections shorter than
    /// the configured minimum score 0.0 either way. Scores are normalized by
    /// the maximum so the best section lands at 1.0.
    pub fn score_sections_model(
        &self,
        sections: &[Section],
        abstract_text: Option<&str>,
    ) -> Result<HashMap<String, f32>, ScoreError> {
        let abstract_text =
            abstract_text.or_else(|| discover_abstract(sections).map(|s| s.text.as_str()));

        let mut scores = HashMap::new();
        match abstract_text.filter(|text| !text.is_empty()) {
            Some(abstract_text) => {
                for section in sections {
                    let score = if section.word_count() < self.config.min_section_words {
                        0.0
                    } else {
                        self.compute_similarity(abstract_text, &section.text)?
                    };
                    scores.insert(section.title.clone(), score);
                }
            }
            None => {
                for section in sections {
                    scores.insert(section.title.clone(), self.keyword_score(section));
                }
            }
        }

        let max = scores.values().copied().fold(0.0f32, f32::max);
        if max > 0.0 {
            for score in scores.values_mut() {
                *score /= max;
            }
        }
        Ok(scores)
    }

    /// Keyword presence heuristic used when no abstract-like text exists.
    fn keyword_score(&self, section: &Section) -> f32 {
        if section.word_count() < self.config.min_section_words {
            return 0.0;
        }
        let title = section.title.to_lowercase();
        let body = section.text.to_lowercase();
        let mut score = 1.0;
        for keyword in &self.config.importance_keywords {
            if title.contains(keyword.as_str()) {
                score += self.config.title_keyword_weight;
            }
            if body.contains(keyword.as_str()) {
                score += self.config.body_keyword_weight;
            }
        }
        score.min(1.0)
    }

    /// Feedback-based score per section title. Sections without an explicit
    /// rating get the neutral default, not a missing entry.
    pub fn score_sections_user_feedback(
        &self,
        paper_id: &str,
        sections: &[Section],
    ) -> HashMap<String, f32> {
        let ratings = self.feedback.ratings_for(paper_id);
        sections
            .iter()
            .map(|section| {
                let score = ratings
                    .get(&section.title)
                    .copied()
                    .unwrap_or(self.config.neutral_score);
                (section.title.clone(), score)
            })
            .collect()
    }

    /// Blend of the enabled sub-scorers: each section's score is the
    /// arithmetic mean of the sources that contributed to it, with full
    /// per-source provenance. A section reached by no source gets the
    /// default entry.
    pub fn score_sections(
        &self,
        paper_id: &str,
        sections: &[Section],
        abstract_text: Option<&str>,
        use_model: bool,
        use_feedback: bool,
    ) -> Result<HashMap<String, SectionScore>, ScoreError> {
        let model_scores = if use_model {
            self.score_sections_model(sections, abstract_text)?
        } else {
            HashMap::new()
        };
        let feedback_scores = if use_feedback {
            self.score_sections_user_feedback(paper_id, sections)
        } else {
            HashMap::new()
        };

        let mut combined = HashMap::new();
        for section in sections {
            let mut sources = HashMap::new();
            if let Some(&score) = model_scores.get(&section.title) {
                sources.insert("model".to_string(), score);
            }
            if let Some(&score) = feedback_scores.get(&section.title) {
                sources.insert("feedback".to_string(), score);
            }
            combined.insert(section.title.clone(), SectionScore::from_sources(sources));
        }
        Ok(combined)
    }

    /// Record one rating and persist immediately. False means the write
    /// failed and the rating may not survive the session.
    pub fn add_user_feedback(&self, paper_id: &str, section_title: &str, score: f32) -> bool {
        self.feedback.add(paper_id, section_title, score)
    }

    /// The sentences most representative of the text: each surviving
    /// sentence scored by similarity to an embedding of the whole text.
    /// Short texts come back filtered but unranked.
    pub fn get_important_sentences(&self, text: &str, top_n: usize) -> Result<Vec<String>, ScoreError> {
        let sentences: Vec<String> = text
            .split('.')
            .map(str::trim)
            .filter(|s| s.len() > 10)
            .map(str::to_string)
            .collect();

        if sentences.len() <= top_n {
            return Ok(sentences);
        }

        let full_text = sentences.join(" ");
        let full_embedding = self.embedder.embed(&full_text)?;

        let mut ranked: Vec<(String, f32)> = Vec::new();
        for sentence in sentences {
            if sentence.split_whitespace().count() < 5 {
                continue;
            }
            let embedding = self.embedder.embed(&sentence)?;
            ranked.push((sentence, cosine_similarity(&full_embedding, &embedding)));
        }

        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        Ok(ranked.into_iter().take(top_n).map(|(s, _)| s).collect())
    }
}

/// Abstract-like section: title containing "abstract", else "introduction",
/// else the first section.
fn discover_abstract(sections: &[Section]) -> Option<&Section> {
    sections
        .iter()
        .find(|s| s.title.to_lowercase().contains("abstract"))
        .or_else(|| {
            sections
                .iter()
                .find(|s| s.title.to_lowercase().contains("introduction"))
        })
        .or_else(|| sections.first())
}
