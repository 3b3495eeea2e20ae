// Agent configuration records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::styles::{Tone, WritingStyle};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    ContentWriter,
    ContentReviewer,
}

impl AgentRole {
    pub fn as_str(self) -> &'static str {
        match self {
            AgentRole::ContentWriter => "content_writer",
            AgentRole::ContentReviewer => "content_reviewer",
        }
    }
}

impl fmt::Display for AgentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgentRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "content_writer" | "writer" => Ok(AgentRole::ContentWriter),
            "content_reviewer" | "reviewer" => Ok(AgentRole::ContentReviewer),
            other => Err(format!("unknown agent role '{}'", other)),
        }
    }
}

/// A configured persona driving provider calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentConfig {
    pub id: String,
    pub name: String,
    pub role: AgentRole,
    /// Persona description placed at the top of every prompt
    pub system_prompt: String,
    #[serde(default)]
    pub expertise: Vec<String>,
    pub writing_style: WritingStyle,
    #[serde(default)]
    pub tone: Tone,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AgentConfig {
    /// New agent with the role's default style and a professional tone.
    pub fn new(name: impl Into<String>, role: AgentRole, system_prompt: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            role,
            system_prompt: system_prompt.into(),
            expertise: Vec::new(),
            writing_style: WritingStyle::default_for(role),
            tone: Tone::default(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_style(mut self, style: WritingStyle) -> Self {
        self.writing_style = style;
        self
    }

    pub fn with_tone(mut self, tone: Tone) -> Self {
        self.tone = tone;
        self
    }

    pub fn with_expertise<I, S>(mut self, expertise: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.expertise = expertise.into_iter().map(Into::into).collect();
        self
    }

    /// Switch role; the style resets to the new role's default.
    pub fn set_role(&mut self, role: AgentRole) {
        if self.role != role {
            self.role = role;
            self.writing_style = WritingStyle::default_for(role);
        }
        self.touch();
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn style_instruction(&self) -> &'static str {
        self.writing_style.instruction(self.role)
    }

    pub fn tone_instruction(&self) -> &'static str {
        self.tone.instruction()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_uses_role_default_style() {
        let writer = AgentConfig::new("Ada", AgentRole::ContentWriter, "You write.");
        assert_eq!(writer.writing_style, WritingStyle::Conversational);
        let reviewer = AgentConfig::new("Rex", AgentRole::ContentReviewer, "You review.");
        assert_eq!(reviewer.writing_style, WritingStyle::Constructive);
        assert_ne!(writer.id, reviewer.id);
    }

    #[test]
    fn test_set_role_resets_style() {
        let mut agent = AgentConfig::new("Ada", AgentRole::ContentWriter, "You write.")
            .with_style(WritingStyle::Academic);
        let created = agent.updated_at;
        agent.set_role(AgentRole::ContentReviewer);
        assert_eq!(agent.role, AgentRole::ContentReviewer);
        assert_eq!(agent.writing_style, WritingStyle::Constructive);
        assert!(agent.updated_at >= created);
    }

    #[test]
    fn test_serialized_shape() {
        let agent = AgentConfig::new("Ada", AgentRole::ContentWriter, "p")
            .with_tone(Tone::Friendly)
            .with_expertise(["rust", "databases"]);
        let json = serde_json::to_value(&agent).unwrap();
        assert_eq!(json["role"], "content_writer");
        assert_eq!(json["writingStyle"], "conversational");
        assert_eq!(json["tone"], "friendly");
        assert_eq!(json["expertise"][1], "databases");
        assert!(json.get("createdAt").is_some());
    }

    #[test]
    fn test_role_parse() {
        assert_eq!("reviewer".parse::<AgentRole>().unwrap(), AgentRole::ContentReviewer);
        assert_eq!("CONTENT_WRITER".parse::<AgentRole>().unwrap(), AgentRole::ContentWriter);
        assert!("editor".parse::<AgentRole>().is_err());
    }
}
