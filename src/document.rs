// Document model: outline sections, review comments and the document brief

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::agent::AgentConfig;

/// What the document is about; shared context for every agent call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentBrief {
    /// e.g. "blog post", "technical guide"
    pub content_type: String,
    pub idea: String,
    pub target_audience: String,
}

impl DocumentBrief {
    pub fn new(
        content_type: impl Into<String>,
        idea: impl Into<String>,
        target_audience: impl Into<String>,
    ) -> Self {
        Self {
            content_type: content_type.into(),
            idea: idea.into(),
            target_audience: target_audience.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommentStatus {
    #[default]
    Idle,
    Loading,
    Error,
    Success,
}

/// One review entry on a section.
///
/// Only the latest text is kept; a retry overwrites it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub author: String,
    pub text: String,
    pub status: CommentStatus,
}

impl Comment {
    pub fn new(author: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            author: author.into(),
            text: text.into(),
            status: CommentStatus::Idle,
        }
    }

    /// A comment that is about to be filled in by a reviewer.
    pub fn pending(author: impl Into<String>) -> Self {
        Self {
            status: CommentStatus::Loading,
            ..Self::new(author, String::new())
        }
    }

    /// Move to `Loading`. Refused while a request is already outstanding.
    pub fn begin(&mut self) -> bool {
        if self.status == CommentStatus::Loading {
            return false;
        }
        self.status = CommentStatus::Loading;
        true
    }

    pub fn succeed(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.timestamp = Utc::now();
        self.status = CommentStatus::Success;
    }

    /// Record a failure; the error message becomes the visible text.
    pub fn fail(&mut self, message: impl Into<String>) {
        self.text = message.into();
        self.timestamp = Utc::now();
        self.status = CommentStatus::Error;
    }
}

/// One outline section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentBlock {
    pub id: u32,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub comments: Vec<Comment>,
    /// Snapshot of the assigned writer; registry edits do not reach it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub writer: Option<AgentConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewer: Option<AgentConfig>,
}

impl ContentBlock {
    pub fn new(id: u32, title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            description: description.into(),
            content: String::new(),
            comments: Vec::new(),
            writer: None,
            reviewer: None,
        }
    }

    pub fn comment(&self, comment_id: &str) -> Option<&Comment> {
        self.comments.iter().find(|c| c.id == comment_id)
    }

    pub fn comment_mut(&mut self, comment_id: &str) -> Option<&mut Comment> {
        self.comments.iter_mut().find(|c| c.id == comment_id)
    }
}

/// Render the sections as a markdown document.
pub fn to_markdown(title: Option<&str>, blocks: &[ContentBlock]) -> String {
    let mut out = String::new();
    if let Some(title) = title.filter(|t| !t.trim().is_empty()) {
        out.push_str(&format!("# {}\n\n", title.trim()));
    }
    for block in blocks {
        out.push_str(&format!("## {}\n\n", block.title.trim()));
        let body = block.content.trim();
        if body.is_empty() {
            out.push_str(&format!("_{}_\n\n", block.description.trim()));
        } else {
            out.push_str(body);
            out.push_str("\n\n");
        }
    }
    out.truncate(out.trim_end().len());
    out.push('\n');
    out
}
