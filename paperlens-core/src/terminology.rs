//! Terminology extraction: candidate noun phrases, frequency ranking and
//! pattern-matched definitions.

use crate::config::TerminologyConfig;
use crate::types::{Term, Terminology};
use anyhow::Result;
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

// Pre-compiled sentence splitter: a run of non-terminators plus its
// trailing terminators, so the punctuation stays with the sentence.
static SENTENCE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^.!?]+[.!?]*").unwrap());

/// Function words that terminate a candidate phrase. A phrase is a maximal
/// run of content tokens between stopwords, which approximates noun-phrase
/// chunking closely enough for frequency ranking.
const STOPWORDS: &[&str] = &[
    "a", "an", "the", "this", "that", "these", "those", "is", "are", "was", "were", "be", "been",
    "being", "am", "do", "does", "did", "have", "has", "had", "can", "could", "will", "would",
    "shall", "should", "may", "might", "must", "and", "or", "but", "nor", "so", "yet", "if",
    "then", "than", "because", "while", "when", "where", "which", "who", "whom", "whose", "what",
    "how", "why", "of", "in", "on", "at", "by", "for", "with", "about", "against", "between",
    "into", "through", "during", "before", "after", "above", "below", "to", "from", "up", "down",
    "out", "off", "over", "under", "again", "further", "here", "there", "all", "any", "both",
    "each", "few", "more", "most", "other", "some", "such", "no", "not", "only", "own", "same",
    "too", "very", "just", "also", "as", "its", "it", "we", "our", "they", "their", "he", "she",
    "his", "her", "you", "your", "i", "my", "us", "them",
];

/// Copular patterns that mark a sentence as definitional, each rendered as
/// `"<term><pattern>"` lowercase.
const DEFINITION_PATTERNS: &[&str] = &[
    " is ",
    " are ",
    " refers to ",
    " is defined as ",
    " means ",
    ", which is ",
    " which is ",
];

/// Source of `{terms, definitions}` for a block of text. The pattern-based
/// extractor below is the deterministic implementation; an LLM-backed one
/// can stand in behind the same trait.
pub trait TerminologyProvider {
    fn extract(&self, text: &str) -> Result<Terminology>;
    fn name(&self) -> &str;
}

pub struct PatternTerminology {
    config: TerminologyConfig,
}

impl Default for PatternTerminology {
    fn default() -> Self {
        Self::new(TerminologyConfig::default())
    }
}

impl PatternTerminology {
    pub fn new(config: TerminologyConfig) -> Self {
        Self { config }
    }

    /// Candidate phrases in first-seen order, deduplicated case-insensitively.
    ///
    /// A candidate survives only when it is multi-word or starts with an
    /// uppercase letter, filtering out common single lowercase nouns.
    pub fn extract_candidate_terms(&self, text: &str) -> Vec<String> {
        let mut seen: Vec<String> = Vec::new();
        let mut candidates: Vec<String> = Vec::new();

        for sentence in split_sentences(text) {
            for chunk in chunk_phrases(sentence) {
                let keep = chunk.contains(' ')
                    || chunk.chars().next().map(|c| c.is_uppercase()).unwrap_or(false);
                if !keep {
                    continue;
                }
                let folded = chunk.to_lowercase();
                if !seen.contains(&folded) {
                    seen.push(folded);
                    candidates.push(chunk);
                }
            }
        }
        candidates
    }

    /// Rank candidates by case-insensitive occurrence count within the full
    /// text, descending, stable on first-seen order, truncated to top_n.
    pub fn rank_terms_by_importance(&self, text: &str, candidates: &[String]) -> Vec<Term> {
        let haystack = text.to_lowercase();
        let mut ranked: Vec<Term> = candidates
            .iter()
            .map(|candidate| Term {
                term: candidate.clone(),
                score: count_occurrences(&haystack, &candidate.to_lowercase()) as f32,
            })
            .collect();
        ranked.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        ranked.truncate(self.config.top_n);
        ranked
    }

    /// First definitional sentence per term, falling back to the first
    /// sufficiently long sentence mentioning the term, prefixed "Context: ".
    /// Terms mentioned in no sentence get no entry.
    pub fn find_term_definitions(&self, text: &str, terms: &[Term]) -> HashMap<String, String> {
        let sentences = split_sentences(text);
        let mut definitions = HashMap::new();

        for term in terms {
            let needle = term.term.to_lowercase();
            let mut found = None;

            for sentence in &sentences {
                let folded = sentence.to_lowercase();
                if DEFINITION_PATTERNS
                    .iter()
                    .any(|pattern| folded.contains(&format!("{}{}", needle, pattern)))
                {
                    found = Some(sentence.trim().to_string());
                    break;
                }
            }

            if found.is_none() {
                found = sentences
                    .iter()
                    .find(|sentence| {
                        sentence.to_lowercase().contains(&needle)
                            && sentence.split_whitespace().count() > self.config.min_context_words
                    })
                    .map(|sentence| format!("Context: {}", sentence.trim()));
            }

            if let Some(definition) = found {
                definitions.insert(term.term.clone(), definition);
            }
        }
        definitions
    }

    /// Full extraction: candidates, ranking, definitions. Pure function of
    /// its input text.
    pub fn extract_terminology(&self, text: &str) -> Terminology {
        let candidates = self.extract_candidate_terms(text);
        let terms = self.rank_terms_by_importance(text, &candidates);
        let definitions = self.find_term_definitions(text, &terms);
        Terminology { terms, definitions }
    }
}

impl TerminologyProvider for PatternTerminology {
    fn extract(&self, text: &str) -> Result<Terminology> {
        Ok(self.extract_terminology(text))
    }

    fn name(&self) -> &str {
        "PatternTerminology"
    }
}

fn split_sentences(text: &str) -> Vec<&str> {
    SENTENCE_REGEX
        .find_iter(text)
        .map(|m| m.as_str().trim())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Maximal runs of non-stopword tokens within one sentence.
fn chunk_phrases(sentence: &str) -> Vec<String> {
    let mut phrases = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for raw in sentence.split_whitespace() {
        let token = raw.trim_matches(|c: char| !c.is_alphanumeric() && c != '-');
        let is_content = !token.is_empty()
            && token.chars().any(|c| c.is_alphabetic())
            && !STOPWORDS.contains(&token.to_lowercase().as_str());
        if is_content {
            current.push(token);
        } else if !current.is_empty() {
            phrases.push(current.join(" "));
            current.clear();
        }
    }
    if !current.is_empty() {
        phrases.push(current.join(" "));
    }
    phrases
}

fn count_occurrences(haystack: &str, needle: &str) -> usize {
    if needle.is_empty() {
        return 0;
    }
    haystack.match_indices(needle).count()
}
