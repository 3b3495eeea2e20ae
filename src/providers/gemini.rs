// Google Gemini API adapter
//
// Gemini authenticates with a `key` query parameter and nests generation
// limits under `generationConfig`.

use reqwest::Client;
use serde::Serialize;

use super::http::{extract_text, send_json};
use super::types::{PromptOptions, PromptResponse, ProviderField, ProviderSchema, ProviderSettings};
use crate::errors::LlmError;

pub const SCHEMA: ProviderSchema = ProviderSchema {
    name: "gemini",
    display_name: "Google Gemini",
    fields: &[
        ProviderField::required("apiKey").secret(),
        ProviderField::required("model")
            .with_choices(&["gemini-2.0-flash", "gemini-2.5-flash", "gemini-2.5-pro"])
            .with_default("gemini-2.0-flash"),
        ProviderField::optional("baseUrl")
            .with_default("https://generativelanguage.googleapis.com"),
    ],
};

const CONTENT_POINTER: &str = "/candidates/0/content/parts/0/text";

pub(crate) async fn execute(
    client: &Client,
    settings: &ProviderSettings,
    prompt: &str,
    options: &PromptOptions,
) -> Result<PromptResponse, LlmError> {
    let model = settings.resolve(&SCHEMA, "model").unwrap_or_default();
    let base_url = settings.resolve(&SCHEMA, "baseUrl").unwrap_or_default();
    let url = format!(
        "{}/v1beta/models/{}:generateContent",
        base_url.trim_end_matches('/'),
        model
    );

    tracing::debug!("Sending request to Gemini API (model: {})", model);

    let payload = send_json(
        SCHEMA.name,
        client
            .post(&url)
            .query(&[("key", settings.get_str("apiKey").unwrap_or_default())])
            .header("content-type", "application/json")
            .json(&build_request(prompt, options)),
    )
    .await?;

    Ok(PromptResponse {
        content: extract_text(&payload, CONTENT_POINTER),
        reasoning: None,
        raw: Some(payload),
    })
}

fn build_request(prompt: &str, options: &PromptOptions) -> GeminiRequest {
    GeminiRequest {
        contents: vec![GeminiContent {
            role: "user",
            parts: vec![GeminiPart {
                text: prompt.to_string(),
            }],
        }],
        generation_config: GeminiGenerationConfig {
            temperature: options.temperature,
            max_output_tokens: options.max_tokens,
        },
    }
}

// Gemini API types

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    role: &'static str,
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}
