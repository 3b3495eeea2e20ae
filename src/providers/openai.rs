// OpenAI API adapter
//
// The chat-completions envelope is shared by several vendors (DeepSeek uses
// it verbatim), so the request/response plumbing here is reused by them.

use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

use super::http::{extract_text, send_json};
use super::types::{PromptOptions, PromptResponse, ProviderField, ProviderSchema, ProviderSettings};
use crate::errors::LlmError;

const OPENAI_BASE_URL: &str = "https://api.openai.com";

pub const SCHEMA: ProviderSchema = ProviderSchema {
    name: "openai",
    display_name: "OpenAI",
    fields: &[
        ProviderField::required("apiKey").secret(),
        ProviderField::required("model")
            .with_choices(&["gpt-4o", "gpt-4o-mini", "gpt-4.1", "gpt-4.1-mini", "o3-mini"])
            .with_default("gpt-4o"),
        ProviderField::optional("baseUrl").with_default(OPENAI_BASE_URL),
    ],
};

pub(crate) async fn execute(
    client: &Client,
    settings: &ProviderSettings,
    prompt: &str,
    options: &PromptOptions,
) -> Result<PromptResponse, LlmError> {
    let payload = chat_completion(&SCHEMA, client, settings, prompt, options).await?;
    Ok(PromptResponse {
        content: extract_text(&payload, CONTENT_POINTER),
        reasoning: None,
        raw: Some(payload),
    })
}

pub(crate) const CONTENT_POINTER: &str = "/choices/0/message/content";

/// POST a single-turn chat completion and return the decoded body.
pub(crate) async fn chat_completion(
    schema: &ProviderSchema,
    client: &Client,
    settings: &ProviderSettings,
    prompt: &str,
    options: &PromptOptions,
) -> Result<Value, LlmError> {
    let request = build_request(schema, settings, prompt, options);
    let base_url = settings.resolve(schema, "baseUrl").unwrap_or_default();
    let url = format!("{}/v1/chat/completions", base_url.trim_end_matches('/'));
    let api_key = settings.get_str("apiKey").unwrap_or_default();

    tracing::debug!(
        "Sending request to {} (model: {}, {} prompt chars)",
        schema.name,
        request.model,
        prompt.len()
    );

    send_json(
        schema.name,
        client
            .post(&url)
            .header("Authorization", format!("Bearer {}", api_key))
            .header("content-type", "application/json")
            .json(&request),
    )
    .await
}

fn build_request(
    schema: &ProviderSchema,
    settings: &ProviderSettings,
    prompt: &str,
    options: &PromptOptions,
) -> OpenAIRequest {
    OpenAIRequest {
        model: settings.resolve(schema, "model").unwrap_or_default(),
        messages: vec![OpenAIMessage {
            role: "user".to_string(),
            content: prompt.to_string(),
        }],
        max_tokens: options.max_tokens,
        temperature: options.temperature,
    }
}

// OpenAI API types

#[derive(Debug, Clone, Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    temperature: f32,
}

#[derive(Debug, Clone, Serialize)]
struct OpenAIMessage {
    role: String,
    content: String,
}
