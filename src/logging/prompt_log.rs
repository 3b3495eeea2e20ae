// Prompt log for diagnosing agent output
//
// Every agent call (operation, provider, prompt, answer) is appended to a
// JSONL file. Entries are buffered and flushed in batches.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::debug;

use crate::providers::PromptResponse;

const FLUSH_THRESHOLD: usize = 10;

/// A single logged agent call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptLogEntry {
    pub id: String,
    pub timestamp: DateTime<Utc>,

    /// Agent operation, e.g. "expand" or "review"
    pub operation: String,

    pub provider: String,

    /// Prompts are long; only the size is kept
    pub prompt_chars: usize,

    pub content: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
}

impl PromptLogEntry {
    pub fn new(operation: &str, provider: &str, prompt: &str, response: &PromptResponse) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            operation: operation.to_string(),
            provider: provider.to_string(),
            prompt_chars: prompt.chars().count(),
            content: response.content.clone(),
            reasoning: response.reasoning.clone(),
        }
    }
}

pub struct PromptLog {
    log_path: PathBuf,
    buffer: Mutex<Vec<PromptLogEntry>>,
}

impl PromptLog {
    pub fn new(log_path: PathBuf) -> Result<Self> {
        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create prompt log directory")?;
        }

        Ok(Self {
            log_path,
            buffer: Mutex::new(Vec::new()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.log_path
    }

    /// Buffer one entry; returns its id.
    pub async fn record(
        &self,
        operation: &str,
        provider: &str,
        prompt: &str,
        response: &PromptResponse,
    ) -> Result<String> {
        let entry = PromptLogEntry::new(operation, provider, prompt, response);
        let id = entry.id.clone();

        let mut buffer = self.buffer.lock().await;
        buffer.push(entry);
        if buffer.len() >= FLUSH_THRESHOLD {
            self.write_out(&mut buffer)?;
        }
        Ok(id)
    }

    pub async fn flush(&self) -> Result<()> {
        let mut buffer = self.buffer.lock().await;
        self.write_out(&mut buffer)
    }

    fn write_out(&self, buffer: &mut Vec<PromptLogEntry>) -> Result<()> {
        if buffer.is_empty() {
            return Ok(());
        }

        debug!("Flushing {} prompt log entries to disk", buffer.len());

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)
            .context("Failed to open prompt log")?;

        for entry in buffer.iter() {
            let json = serde_json::to_string(entry).context("Failed to serialize log entry")?;
            writeln!(file, "{}", json).context("Failed to write log entry")?;
        }

        buffer.clear();
        Ok(())
    }

    /// Read back every flushed entry.
    pub fn entries(&self) -> Result<Vec<PromptLogEntry>> {
        if !self.log_path.exists() {
            return Ok(Vec::new());
        }
        let contents =
            std::fs::read_to_string(&self.log_path).context("Failed to read prompt log")?;

        contents
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str(line).context("Failed to parse log entry"))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_record_and_flush() {
        let dir = TempDir::new().unwrap();
        let log = PromptLog::new(dir.path().join("logs/prompts.jsonl")).unwrap();

        let response = PromptResponse {
            content: "Draft text".to_string(),
            reasoning: Some("thinking".to_string()),
            raw: None,
        };
        let id = log.record("expand", "openai", "Write é", &response).await.unwrap();

        // Buffered until flushed
        assert!(log.entries().unwrap().is_empty());
        log.flush().await.unwrap();

        let entries = log.entries().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, id);
        assert_eq!(entries[0].prompt_chars, 7);
        assert_eq!(entries[0].reasoning.as_deref(), Some("thinking"));
    }

    #[tokio::test]
    async fn test_auto_flush_at_threshold() {
        let dir = TempDir::new().unwrap();
        let log = PromptLog::new(dir.path().join("prompts.jsonl")).unwrap();
        let response = PromptResponse::text("ok");
        for _ in 0..FLUSH_THRESHOLD {
            log.record("review", "ollama", "p", &response).await.unwrap();
        }
        assert_eq!(log.entries().unwrap().len(), FLUSH_THRESHOLD);
    }
}
