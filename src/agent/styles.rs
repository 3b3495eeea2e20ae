// Style and tone vocabularies
//
// Writers and reviewers share the `writing_style` field but read it through
// different vocabularies.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::config::AgentRole;

/// Every value the `writing_style` field can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WritingStyle {
    // Writer vocabulary
    Formal,
    Conversational,
    Technical,
    Storytelling,
    Persuasive,
    Academic,
    // Reviewer vocabulary
    Constructive,
    Critical,
    Detailed,
    Concise,
    Supportive,
}

impl WritingStyle {
    pub const WRITER: [WritingStyle; 6] = [
        WritingStyle::Formal,
        WritingStyle::Conversational,
        WritingStyle::Technical,
        WritingStyle::Storytelling,
        WritingStyle::Persuasive,
        WritingStyle::Academic,
    ];

    pub const REVIEWER: [WritingStyle; 5] = [
        WritingStyle::Constructive,
        WritingStyle::Critical,
        WritingStyle::Detailed,
        WritingStyle::Concise,
        WritingStyle::Supportive,
    ];

    /// Style a freshly created (or re-roled) agent starts with.
    pub fn default_for(role: AgentRole) -> Self {
        match role {
            AgentRole::ContentWriter => WritingStyle::Conversational,
            AgentRole::ContentReviewer => WritingStyle::Constructive,
        }
    }

    pub fn vocabulary(role: AgentRole) -> &'static [WritingStyle] {
        match role {
            AgentRole::ContentWriter => &Self::WRITER,
            AgentRole::ContentReviewer => &Self::REVIEWER,
        }
    }

    pub fn belongs_to(self, role: AgentRole) -> bool {
        Self::vocabulary(role).contains(&self)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            WritingStyle::Formal => "formal",
            WritingStyle::Conversational => "conversational",
            WritingStyle::Technical => "technical",
            WritingStyle::Storytelling => "storytelling",
            WritingStyle::Persuasive => "persuasive",
            WritingStyle::Academic => "academic",
            WritingStyle::Constructive => "constructive",
            WritingStyle::Critical => "critical",
            WritingStyle::Detailed => "detailed",
            WritingStyle::Concise => "concise",
            WritingStyle::Supportive => "supportive",
        }
    }

    /// Instruction text for this style as read by `role`.
    ///
    /// A style outside the role's vocabulary reads as the role's default.
    pub fn instruction(self, role: AgentRole) -> &'static str {
        let style = if self.belongs_to(role) {
            self
        } else {
            Self::default_for(role)
        };
        match style {
            WritingStyle::Formal => {
                "Write in a formal style: precise wording, complete sentences, no slang or contractions."
            }
            WritingStyle::Conversational => {
                "Write in a conversational style: speak directly to the reader, keep sentences short and natural."
            }
            WritingStyle::Technical => {
                "Write in a technical style: be exact, define terms, prefer concrete detail and examples over generalities."
            }
            WritingStyle::Storytelling => {
                "Write in a storytelling style: use narrative, scenes and characters to carry the points, with a clear arc."
            }
            WritingStyle::Persuasive => {
                "Write in a persuasive style: lead with the strongest argument, back claims with evidence, close with a call to action."
            }
            WritingStyle::Academic => {
                "Write in an academic style: structured argument, careful qualification of claims, neutral and rigorous."
            }
            WritingStyle::Constructive => {
                "Review constructively: name what works, then give specific, actionable improvements."
            }
            WritingStyle::Critical => {
                "Review critically: focus on weaknesses, gaps in logic and unsupported claims."
            }
            WritingStyle::Detailed => {
                "Review in detail: cover structure, clarity, accuracy and style, pointing at exact passages."
            }
            WritingStyle::Concise => {
                "Review concisely: only the most important issues, one short line each."
            }
            WritingStyle::Supportive => {
                "Review supportively: encourage the writer and frame every suggestion as an opportunity."
            }
        }
    }
}

impl fmt::Display for WritingStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WritingStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        Self::WRITER
            .into_iter()
            .chain(Self::REVIEWER)
            .find(|style| style.as_str() == s)
            .ok_or_else(|| format!("unknown writing style '{}'", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    #[default]
    Professional,
    Casual,
    Enthusiastic,
    Authoritative,
    Friendly,
    Humorous,
    Neutral,
}

impl Tone {
    pub const ALL: [Tone; 7] = [
        Tone::Professional,
        Tone::Casual,
        Tone::Enthusiastic,
        Tone::Authoritative,
        Tone::Friendly,
        Tone::Humorous,
        Tone::Neutral,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Tone::Professional => "professional",
            Tone::Casual => "casual",
            Tone::Enthusiastic => "enthusiastic",
            Tone::Authoritative => "authoritative",
            Tone::Friendly => "friendly",
            Tone::Humorous => "humorous",
            Tone::Neutral => "neutral",
        }
    }

    pub fn instruction(self) -> &'static str {
        match self {
            Tone::Professional => "Keep the tone professional: confident, courteous and focused.",
            Tone::Casual => "Keep the tone casual: relaxed and informal, as if talking to a friend.",
            Tone::Enthusiastic => {
                "Keep the tone enthusiastic: energetic and upbeat, showing genuine excitement about the subject."
            }
            Tone::Authoritative => {
                "Keep the tone authoritative: speak as an expert, state conclusions plainly."
            }
            Tone::Friendly => "Keep the tone friendly: warm, approachable and encouraging.",
            Tone::Humorous => {
                "Keep the tone humorous: light wit where it fits, without undercutting the message."
            }
            Tone::Neutral => "Keep the tone neutral: objective and even, without emotional coloring.",
        }
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tone {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|tone| tone.as_str() == s)
            .ok_or_else(|| format!("unknown tone '{}'", s))
    }
}
