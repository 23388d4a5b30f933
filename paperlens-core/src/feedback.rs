//! Durable user feedback: `paper_id → {section_title → score}`.
//!
//! Backed by a single JSON file rewritten in full on every mutation. The
//! store loads lazily on first access and serializes all access through a
//! mutex, so concurrent callers within one process cannot lose each other's
//! writes.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Full persisted structure: paper id to per-section ratings.
pub type FeedbackData = HashMap<String, HashMap<String, f32>>;

/// Persistence backend for the feedback store.
pub trait FeedbackStorage: Send {
    /// Load the full structure. A missing or unreadable file means "no
    /// feedback exists yet", never an error.
    fn load(&self) -> FeedbackData;

    fn save(&self, data: &FeedbackData) -> Result<()>;
}

pub struct FileFeedbackStorage {
    path: PathBuf,
}

impl FileFeedbackStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FeedbackStorage for FileFeedbackStorage {
    fn load(&self) -> FeedbackData {
        let Ok(content) = std::fs::read_to_string(&self.path) else {
            return FeedbackData::new();
        };
        match serde_json::from_str(&content) {
            Ok(data) => data,
            Err(err) => {
                eprintln!(
                    "⚠️  Feedback file {} is unreadable ({}), starting empty",
                    self.path.display(),
                    err
                );
                FeedbackData::new()
            }
        }
    }

    fn save(&self, data: &FeedbackData) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(data)?;
        std::fs::write(&self.path, json)
            .with_context(|| format!("failed to write {}", self.path.display()))
    }
}

/// Lazily loaded, mutex-guarded view over a `FeedbackStorage` backend.
/// Every mutation writes through synchronously.
pub struct FeedbackStore {
    storage: Box<dyn FeedbackStorage>,
    state: Mutex<Option<FeedbackData>>,
}

impl FeedbackStore {
    pub fn new(storage: Box<dyn FeedbackStorage>) -> Self {
        Self {
            storage,
            state: Mutex::new(None),
        }
    }

    pub fn with_file(path: impl Into<PathBuf>) -> Self {
        Self::new(Box::new(FileFeedbackStorage::new(path)))
    }

    /// All ratings recorded for one paper; empty when none exist.
    pub fn ratings_for(&self, paper_id: &str) -> HashMap<String, f32> {
        let mut guard = self.lock_state();
        let data = guard.get_or_insert_with(|| self.storage.load());
        data.get(paper_id).cloned().unwrap_or_default()
    }

    /// Upsert one rating and persist immediately. Returns false when the
    /// write fails; the in-memory state keeps the change either way, so the
    /// session stays consistent even if durability was lost.
    pub fn add(&self, paper_id: &str, section_title: &str, score: f32) -> bool {
        let score = score.clamp(0.0, 1.0);
        let mut guard = self.lock_state();
        let data = guard.get_or_insert_with(|| self.storage.load());
        data.entry(paper_id.to_string())
            .or_default()
            .insert(section_title.to_string(), score);

        match self.storage.save(data) {
            Ok(()) => true,
            Err(err) => {
                eprintln!("⚠️  Failed to persist feedback: {}", err);
                false
            }
        }
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, Option<FeedbackData>> {
        // A poisoned mutex only means another thread panicked mid-update;
        // the map itself is still usable.
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> FeedbackStore {
        FeedbackStore::with_file(dir.path().join("feedback.json"))
    }

    #[test]
    fn round_trips_a_rating() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        assert!(store.add("paper1", "Intro", 0.9));

        let reopened = store_in(&dir);
        let ratings = reopened.ratings_for("paper1");
        assert_eq!(ratings.get("Intro"), Some(&0.9));
    }

    #[test]
    fn repeated_identical_add_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.add("paper1", "Intro", 0.7);
        let after_first = store.ratings_for("paper1");
        store.add("paper1", "Intro", 0.7);
        assert_eq!(store.ratings_for("paper1"), after_first);
    }

    #[test]
    fn missing_file_means_no_feedback() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        assert!(store.ratings_for("unknown").is_empty());
    }

    #[test]
    fn corrupt_file_starts_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("feedback.json");
        std::fs::write(&path, "{ not json").unwrap();
        let store = FeedbackStore::with_file(&path);
        assert!(store.ratings_for("paper1").is_empty());
        // And recovers: the next write replaces the corrupt file.
        assert!(store.add("paper1", "Intro", 0.5));
        assert_eq!(store.ratings_for("paper1").get("Intro"), Some(&0.5));
    }

    #[test]
    fn score_is_clamped_to_unit_interval() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.add("paper1", "Intro", 1.5);
        assert_eq!(store.ratings_for("paper1").get("Intro"), Some(&1.0));
    }
}
