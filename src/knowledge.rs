// Knowledge base: reference material spliced into agent prompts

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::{Arc, PoisonError, RwLock};
use uuid::Uuid;

use crate::config::constants::KNOWLEDGE_CHAR_BUDGET;
use crate::errors::StoreError;
use crate::store::{ConfigStore, Namespace};

const ENTRIES_KEY: &str = "entries";

#[derive(Debug, thiserror::Error)]
pub enum KnowledgeError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Knowledge lookup failed: {0}")]
    Backend(String),
}

/// Source of reference text for a prompt. The result is opaque to callers.
#[async_trait]
pub trait KnowledgeStore: Send + Sync {
    async fn relevant_data(
        &self,
        context: &str,
        target_audience: &str,
    ) -> Result<String, KnowledgeError>;
}

/// Store that never has anything to add.
pub struct NoKnowledge;

#[async_trait]
impl KnowledgeStore for NoKnowledge {
    async fn relevant_data(&self, _: &str, _: &str) -> Result<String, KnowledgeError> {
        Ok(String::new())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeEntry {
    pub id: String,
    pub title: String,
    pub content: String,
    pub added_at: DateTime<Utc>,
}

/// Persisted list of text entries, ranked by keyword overlap.
pub struct KnowledgeBase {
    store: Arc<dyn ConfigStore>,
    entries: RwLock<Vec<KnowledgeEntry>>,
}

impl KnowledgeBase {
    pub fn load(store: Arc<dyn ConfigStore>) -> Result<Self, StoreError> {
        let entries = store
            .load_as::<Vec<KnowledgeEntry>>(Namespace::KnowledgeBase, ENTRIES_KEY)?
            .unwrap_or_default();
        Ok(Self {
            store,
            entries: RwLock::new(entries),
        })
    }

    pub fn add(
        &self,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Result<KnowledgeEntry, StoreError> {
        let entry = KnowledgeEntry {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            content: content.into(),
            added_at: Utc::now(),
        };
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.push(entry.clone());
        self.store
            .save_as(Namespace::KnowledgeBase, ENTRIES_KEY, &*entries)?;
        Ok(entry)
    }

    pub fn remove(&self, id: &str) -> Result<bool, StoreError> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|e| e.id != id);
        if entries.len() == before {
            return Ok(false);
        }
        self.store
            .save_as(Namespace::KnowledgeBase, ENTRIES_KEY, &*entries)?;
        Ok(true)
    }

    pub fn list(&self) -> Vec<KnowledgeEntry> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Entries sharing a keyword with the query, best first; every entry when
    /// none match. Output stops at the character budget.
    fn select(&self, query: &str) -> String {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        if entries.is_empty() {
            return String::new();
        }

        let query_words = keywords(query);
        let mut scored: Vec<(usize, &KnowledgeEntry)> = entries
            .iter()
            .map(|entry| {
                let words = keywords(&format!("{} {}", entry.title, entry.content));
                (words.intersection(&query_words).count(), entry)
            })
            .filter(|(score, _)| *score > 0)
            .collect();

        if scored.is_empty() {
            scored = entries.iter().map(|e| (0, e)).collect();
        }
        // Stable: equal scores keep insertion order
        scored.sort_by(|a, b| b.0.cmp(&a.0));

        let mut out = String::new();
        for (_, entry) in scored {
            let section = format!("### {}\n{}\n\n", entry.title.trim(), entry.content.trim());
            if !out.is_empty() && out.len() + section.len() > KNOWLEDGE_CHAR_BUDGET {
                break;
            }
            out.push_str(&section);
        }
        truncate_at_char_boundary(&mut out, KNOWLEDGE_CHAR_BUDGET);
        out.trim_end().to_string()
    }
}

#[async_trait]
impl KnowledgeStore for KnowledgeBase {
    async fn relevant_data(
        &self,
        context: &str,
        target_audience: &str,
    ) -> Result<String, KnowledgeError> {
        Ok(self.select(&format!("{} {}", context, target_audience)))
    }
}

fn keywords(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() >= 4)
        .map(str::to_lowercase)
        .collect()
}

fn truncate_at_char_boundary(text: &mut String, max: usize) {
    if text.len() <= max {
        return;
    }
    let mut cut = max;
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }
    text.truncate(cut);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn knowledge() -> (KnowledgeBase, Arc<dyn ConfigStore>) {
        let store: Arc<dyn ConfigStore> = Arc::new(MemoryStore::new());
        (KnowledgeBase::load(store.clone()).unwrap(), store)
    }

    #[tokio::test]
    async fn test_empty_base_yields_empty_text() {
        let (kb, _) = knowledge();
        assert_eq!(kb.relevant_data("anything", "anyone").await.unwrap(), "");
        assert_eq!(NoKnowledge.relevant_data("x", "y").await.unwrap(), "");
    }

    #[tokio::test]
    async fn test_matching_entries_rank_first() {
        let (kb, _) = knowledge();
        kb.add("Gardening", "Tomatoes need full sun and regular watering.")
            .unwrap();
        kb.add("Rust ownership", "Ownership rules prevent data races in Rust programs.")
            .unwrap();

        let text = kb
            .relevant_data("Explain ownership in Rust", "beginners")
            .await
            .unwrap();
        assert!(text.starts_with("### Rust ownership"));
        assert!(!text.contains("Tomatoes"));
    }

    #[tokio::test]
    async fn test_no_match_falls_back_to_all_entries() {
        let (kb, _) = knowledge();
        kb.add("Style guide", "Prefer active voice.").unwrap();
        kb.add("Glossary", "Widget: a small gadget.").unwrap();
        let text = kb.relevant_data("quantum", "physicists").await.unwrap();
        assert!(text.contains("Style guide"));
        assert!(text.contains("Glossary"));
    }

    #[tokio::test]
    async fn test_output_respects_budget() {
        let (kb, _) = knowledge();
        let long = "é".repeat(KNOWLEDGE_CHAR_BUDGET);
        kb.add("Huge", long).unwrap();
        let text = kb.relevant_data("huge", "").await.unwrap();
        assert!(text.len() <= KNOWLEDGE_CHAR_BUDGET);
    }

    #[test]
    fn test_entries_persist_and_remove() {
        let (kb, store) = knowledge();
        let entry = kb.add("Note", "Remember the milk").unwrap();
        assert_eq!(KnowledgeBase::load(store.clone()).unwrap().list().len(), 1);
        assert!(kb.remove(&entry.id).unwrap());
        assert!(!kb.remove(&entry.id).unwrap());
        assert!(KnowledgeBase::load(store).unwrap().list().is_empty());
    }
}
