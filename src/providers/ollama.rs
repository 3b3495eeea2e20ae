// Ollama adapter (local inference daemon)
//
// With `stream` on, /api/generate answers with one JSON object per line, each
// carrying a `response` fragment; the last one has `"done": true` and the
// timing stats. Fragments are folded into the final text.

use futures::stream::{Stream, StreamExt, TryStreamExt};
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

use super::http::{extract_text, send, send_json};
use super::reasoning::split_reasoning;
use super::stream::JsonLines;
use super::types::{PromptOptions, PromptResponse, ProviderField, ProviderSchema, ProviderSettings};
use crate::errors::{LlmError, TransportError};

pub const SCHEMA: ProviderSchema = ProviderSchema {
    name: "ollama",
    display_name: "Ollama (local)",
    fields: &[
        ProviderField::required("baseUrl").with_default("http://localhost:11434"),
        ProviderField::required("model")
            .with_choices(&["llama3.1", "qwen3", "deepseek-r1", "mistral", "gemma3"])
            .with_default("llama3.1"),
        ProviderField::optional("stream")
            .with_choices(&["true", "false"])
            .with_default("true"),
    ],
};

pub(crate) async fn execute(
    client: &Client,
    settings: &ProviderSettings,
    prompt: &str,
    options: &PromptOptions,
) -> Result<PromptResponse, LlmError> {
    let request = build_request(settings, prompt, options);
    let base_url = settings.resolve(&SCHEMA, "baseUrl").unwrap_or_default();
    let url = format!("{}/api/generate", base_url.trim_end_matches('/'));

    tracing::debug!(
        "Sending request to Ollama at {} (model: {}, stream: {})",
        base_url,
        request.model,
        request.stream
    );

    let builder = client.post(&url).json(&request);

    let (text, raw) = if request.stream {
        let response = send(SCHEMA.name, builder).await?;
        let status = response.status().as_u16();
        let bytes = response.bytes_stream().map_err(|source| TransportError::Http {
            provider: SCHEMA.name.to_string(),
            source,
        });
        fold_fragments(status, JsonLines::new(SCHEMA.name, bytes)).await?
    } else {
        let payload = send_json(SCHEMA.name, builder).await?;
        (extract_text(&payload, "/response"), payload)
    };

    let (reasoning, content) = split_reasoning(&text);
    Ok(PromptResponse {
        content,
        reasoning: (!reasoning.is_empty()).then_some(reasoning),
        raw: Some(raw),
    })
}

/// Accumulate `response` fragments until one reports `done`.
///
/// Returns the text and the final fragment. A stream that ends without a
/// `done` fragment is an interruption, not a short answer.
async fn fold_fragments<S>(status: u16, fragments: S) -> Result<(String, Value), LlmError>
where
    S: Stream<Item = Result<Value, TransportError>> + Unpin,
{
    let mut fragments = fragments;
    let mut text = String::new();

    while let Some(fragment) = fragments.next().await {
        let fragment = fragment?;

        // The daemon reports mid-stream failures as {"error": ".."}
        if let Some(message) = fragment.get("error").and_then(Value::as_str) {
            return Err(LlmError::ProviderApi {
                provider: SCHEMA.name.to_string(),
                status,
                message: message.to_string(),
            });
        }

        text.push_str(fragment.get("response").and_then(Value::as_str).unwrap_or_default());

        if fragment.get("done").and_then(Value::as_bool).unwrap_or(false) {
            return Ok((text, fragment));
        }
    }

    Err(TransportError::StreamInterrupted {
        provider: SCHEMA.name.to_string(),
    }
    .into())
}

fn build_request(settings: &ProviderSettings, prompt: &str, options: &PromptOptions) -> GenerateRequest {
    GenerateRequest {
        model: settings.resolve(&SCHEMA, "model").unwrap_or_default(),
        prompt: prompt.to_string(),
        stream: settings.resolve(&SCHEMA, "stream").as_deref() != Some("false"),
        options: GenerateOptions {
            temperature: options.temperature,
            num_predict: options.max_tokens,
        },
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest {
    model: String,
    prompt: String,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}
