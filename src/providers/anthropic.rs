// Anthropic Messages API adapter

use reqwest::Client;
use serde::Serialize;

use super::http::{extract_text, send_json};
use super::types::{PromptOptions, PromptResponse, ProviderField, ProviderSchema, ProviderSettings};
use crate::config::constants::ANTHROPIC_DEFAULT_MAX_TOKENS;
use crate::errors::LlmError;

const ANTHROPIC_VERSION: &str = "2023-06-01";

pub const SCHEMA: ProviderSchema = ProviderSchema {
    name: "anthropic",
    display_name: "Anthropic",
    fields: &[
        ProviderField::required("apiKey").secret(),
        ProviderField::required("model")
            .with_choices(&["claude-sonnet-4-5", "claude-opus-4-1", "claude-3-5-haiku-latest"])
            .with_default("claude-sonnet-4-5"),
        ProviderField::optional("baseUrl").with_default("https://api.anthropic.com"),
    ],
};

const CONTENT_POINTER: &str = "/content/0/text";

pub(crate) async fn execute(
    client: &Client,
    settings: &ProviderSettings,
    prompt: &str,
    options: &PromptOptions,
) -> Result<PromptResponse, LlmError> {
    let request = build_request(settings, prompt, options);
    let base_url = settings.resolve(&SCHEMA, "baseUrl").unwrap_or_default();
    let url = format!("{}/v1/messages", base_url.trim_end_matches('/'));

    tracing::debug!("Sending request to Anthropic API (model: {})", request.model);

    let payload = send_json(
        SCHEMA.name,
        client
            .post(&url)
            .header("x-api-key", settings.get_str("apiKey").unwrap_or_default())
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&request),
    )
    .await?;

    Ok(PromptResponse {
        content: extract_text(&payload, CONTENT_POINTER),
        reasoning: None,
        raw: Some(payload),
    })
}

fn build_request(settings: &ProviderSettings, prompt: &str, options: &PromptOptions) -> MessageRequest {
    MessageRequest {
        model: settings.resolve(&SCHEMA, "model").unwrap_or_default(),
        max_tokens: options.max_tokens.unwrap_or(ANTHROPIC_DEFAULT_MAX_TOKENS),
        temperature: options.temperature,
        messages: vec![Message {
            role: "user",
            content: prompt.to_string(),
        }],
    }
}

#[derive(Debug, Serialize)]
struct MessageRequest {
    model: String,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<Message>,
}

#[derive(Debug, Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_max_tokens_always_present() {
        let settings = ProviderSettings::new().with("apiKey", "k");
        let body =
            serde_json::to_value(build_request(&settings, "Hi", &PromptOptions::default())).unwrap();
        assert_eq!(body["max_tokens"], ANTHROPIC_DEFAULT_MAX_TOKENS);
        assert_eq!(body["model"], "claude-sonnet-4-5");
        assert_eq!(body["messages"][0]["content"], "Hi");
    }

    #[test]
    fn test_content_pointer() {
        let payload = json!({
            "id": "msg_01",
            "type": "message",
            "content": [{"type": "text", "text": "Hello"}]
        });
        assert_eq!(extract_text(&payload, CONTENT_POINTER), "Hello");
        assert_eq!(extract_text(&json!({"content": []}), CONTENT_POINTER), "");
    }
}
