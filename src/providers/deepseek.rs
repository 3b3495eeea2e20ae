// DeepSeek adapter (OpenAI-compatible chat completions)
//
// deepseek-reasoner returns its deliberation in `reasoning_content`; older
// deployments inline it as a <think> block in `content`.

use reqwest::Client;

use super::http::extract_text;
use super::openai::{chat_completion, CONTENT_POINTER};
use super::reasoning::split_reasoning;
use super::types::{PromptOptions, PromptResponse, ProviderField, ProviderSchema, ProviderSettings};
use crate::errors::LlmError;

pub const SCHEMA: ProviderSchema = ProviderSchema {
    name: "deepseek",
    display_name: "DeepSeek",
    fields: &[
        ProviderField::required("apiKey").secret(),
        ProviderField::required("model")
            .with_choices(&["deepseek-chat", "deepseek-reasoner"])
            .with_default("deepseek-chat"),
        ProviderField::optional("baseUrl").with_default("https://api.deepseek.com"),
    ],
};

const REASONING_POINTER: &str = "/choices/0/message/reasoning_content";

pub(crate) async fn execute(
    client: &Client,
    settings: &ProviderSettings,
    prompt: &str,
    options: &PromptOptions,
) -> Result<PromptResponse, LlmError> {
    let payload = chat_completion(&SCHEMA, client, settings, prompt, options).await?;
    let (content, reasoning) = normalize(&payload);
    Ok(PromptResponse {
        content,
        reasoning,
        raw: Some(payload),
    })
}

fn normalize(payload: &serde_json::Value) -> (String, Option<String>) {
    let text = extract_text(payload, CONTENT_POINTER);
    let dedicated = extract_text(payload, REASONING_POINTER);
    if !dedicated.is_empty() {
        return (text, Some(dedicated));
    }

    let (reasoning, content) = split_reasoning(&text);
    let reasoning = (!reasoning.is_empty()).then_some(reasoning);
    (content, reasoning)
}
