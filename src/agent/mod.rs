// Writing agents
//
// An `Agent` pairs an `AgentConfig` persona with the default provider. Each
// operation resolves the provider first, so a missing provider fails before
// any prompt is built. Errors from lower layers pass through unchanged.

pub mod config;
pub mod manager;
pub mod prompts;
pub mod styles;

pub use config::{AgentConfig, AgentRole};
pub use manager::AgentManager;
pub use styles::{Tone, WritingStyle};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::config::constants::TEXT_TASK_TEMPERATURE;
use crate::document::{ContentBlock, DocumentBrief};
use crate::errors::{LlmError, StoreError};
use crate::knowledge::{KnowledgeError, KnowledgeStore};
use crate::logging::PromptLog;
use crate::outline;
use crate::providers::{PromptOptions, PromptResponse, Provider, ProviderRegistry};

#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error(transparent)]
    Knowledge(#[from] KnowledgeError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Unknown agent: {0}")]
    UnknownAgent(String),
}

impl AgentError {
    /// True when the user has to set up a provider before retrying.
    pub fn is_configuration(&self) -> bool {
        matches!(self, AgentError::Llm(e) if e.is_configuration())
    }
}

/// Inline editing transforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextTask {
    Simplify,
    Rephrase,
    Grammar,
    Explain,
}

impl TextTask {
    pub fn instruction(self) -> &'static str {
        match self {
            TextTask::Simplify => {
                "Simplify the text below. Use plain words and shorter sentences while keeping the meaning."
            }
            TextTask::Rephrase => {
                "Rephrase the text below. Keep the meaning and length but use different wording."
            }
            TextTask::Grammar => {
                "Correct grammar, spelling and punctuation in the text below. Change nothing else."
            }
            TextTask::Explain => {
                "Explain the text below in simple terms for someone new to the subject."
            }
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TextTask::Simplify => "simplify",
            TextTask::Rephrase => "rephrase",
            TextTask::Grammar => "grammar",
            TextTask::Explain => "explain",
        }
    }
}

impl fmt::Display for TextTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TextTask {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "simplify" => Ok(TextTask::Simplify),
            "rephrase" => Ok(TextTask::Rephrase),
            "grammar" => Ok(TextTask::Grammar),
            "explain" => Ok(TextTask::Explain),
            other => Err(format!("unknown text task '{}'", other)),
        }
    }
}

pub struct Agent {
    config: AgentConfig,
    registry: Arc<ProviderRegistry>,
    knowledge: Arc<dyn KnowledgeStore>,
    prompt_log: Option<Arc<PromptLog>>,
    options: PromptOptions,
}

impl Agent {
    pub fn new(
        config: AgentConfig,
        registry: Arc<ProviderRegistry>,
        knowledge: Arc<dyn KnowledgeStore>,
    ) -> Self {
        Self {
            config,
            registry,
            knowledge,
            prompt_log: None,
            options: PromptOptions::default(),
        }
    }

    pub fn with_prompt_log(mut self, log: Option<Arc<PromptLog>>) -> Self {
        self.prompt_log = log;
        self
    }

    /// Base options for every call; text tasks override the temperature.
    pub fn with_options(mut self, options: PromptOptions) -> Self {
        self.options = options;
        self
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Plan a document as an outline.
    ///
    /// Output the codec cannot read yields an empty outline, not an error.
    pub async fn generate_structured_blocks(
        &self,
        brief: &DocumentBrief,
        extra_context: Option<&str>,
    ) -> Result<Vec<ContentBlock>, AgentError> {
        let provider = self.registry.require_default_provider()?;
        let knowledge = self
            .knowledge
            .relevant_data(&brief.idea, &brief.target_audience)
            .await?;
        let prompt = prompts::structured_blocks(&self.config, brief, extra_context, &knowledge);

        let response = self.call(&provider, "outline", &prompt, &self.options).await?;
        let blocks = outline::decode(&response.content);
        if blocks.is_empty() {
            tracing::warn!("Outline response contained no readable sections");
        }
        Ok(blocks)
    }

    /// Write the body of one section.
    pub async fn expand(
        &self,
        brief: &DocumentBrief,
        outline: &[ContentBlock],
        block: &ContentBlock,
    ) -> Result<String, AgentError> {
        let provider = self.registry.require_default_provider()?;
        let knowledge = self.section_knowledge(brief, block).await?;
        let prompt = prompts::expand(&self.config, brief, outline, block, &knowledge);

        let response = self.call(&provider, "expand", &prompt, &self.options).await?;
        Ok(response.content)
    }

    /// Produce a full replacement for a section, addressing every point of
    /// `feedback`.
    pub async fn rewrite(
        &self,
        brief: &DocumentBrief,
        outline: &[ContentBlock],
        block: &ContentBlock,
        current_content: &str,
        feedback: &str,
    ) -> Result<String, AgentError> {
        let provider = self.registry.require_default_provider()?;
        let knowledge = self.section_knowledge(brief, block).await?;
        let prompt = prompts::rewrite(
            &self.config,
            brief,
            outline,
            block,
            current_content,
            feedback,
            &knowledge,
        );

        let response = self.call(&provider, "rewrite", &prompt, &self.options).await?;
        Ok(response.content)
    }

    /// Review a section as a short bullet list.
    pub async fn generate_review(
        &self,
        brief: &DocumentBrief,
        block: &ContentBlock,
        instructions: Option<&str>,
    ) -> Result<String, AgentError> {
        let provider = self.registry.require_default_provider()?;
        let knowledge = self.section_knowledge(brief, block).await?;
        let prompt = prompts::review(&self.config, brief, block, instructions, &knowledge);

        let response = self.call(&provider, "review", &prompt, &self.options).await?;
        Ok(response.content.trim().to_string())
    }

    pub async fn execute_text_task(
        &self,
        text: &str,
        task: TextTask,
        instructions: Option<&str>,
    ) -> Result<String, AgentError> {
        let provider = self.registry.require_default_provider()?;
        let prompt = prompts::text_task(&self.config, task, text, instructions);
        let options = self.options.clone().with_temperature(TEXT_TASK_TEMPERATURE);

        let response = self.call(&provider, task.as_str(), &prompt, &options).await?;
        Ok(response.content.trim().to_string())
    }

    async fn section_knowledge(
        &self,
        brief: &DocumentBrief,
        block: &ContentBlock,
    ) -> Result<String, KnowledgeError> {
        let context = format!("{} {} {}", brief.idea, block.title, block.description);
        self.knowledge
            .relevant_data(&context, &brief.target_audience)
            .await
    }

    async fn call(
        &self,
        provider: &Provider,
        operation: &str,
        prompt: &str,
        options: &PromptOptions,
    ) -> Result<PromptResponse, LlmError> {
        tracing::debug!(
            "Agent {} running {} via {}",
            self.config.name,
            operation,
            provider.name()
        );
        let response = provider.execute_prompt(prompt, options).await?;

        if let Some(log) = &self.prompt_log {
            if let Err(e) = log.record(operation, provider.name(), prompt, &response).await {
                tracing::warn!("Failed to write prompt log: {}", e);
            }
        }
        Ok(response)
    }
}
