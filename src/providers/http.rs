// Shared HTTP plumbing for the vendor adapters

use reqwest::{Client, RequestBuilder, Response};
use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::errors::{LlmError, TransportError};

/// Build the client shared by every provider instance.
pub fn build_client(request_timeout: Duration, connect_timeout: Duration) -> reqwest::Result<Client> {
    Client::builder()
        .timeout(request_timeout)
        .connect_timeout(connect_timeout)
        .build()
}

/// Send a request and return the response if its status is a success.
pub async fn send(provider: &str, request: RequestBuilder) -> Result<Response, LlmError> {
    let response = request
        .send()
        .await
        .map_err(|source| http_error(provider, source))?;

    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    tracing::debug!("{} returned {}: {}", provider, status, body);
    Err(LlmError::ProviderApi {
        provider: provider.to_string(),
        status: status.as_u16(),
        message: vendor_error_message(&body),
    })
}

/// Send a request and decode the body as JSON.
pub async fn send_json(provider: &str, request: RequestBuilder) -> Result<Value, LlmError> {
    let response = send(provider, request).await?;
    let bytes = response
        .bytes()
        .await
        .map_err(|source| http_error(provider, source))?;
    serde_json::from_slice(&bytes).map_err(|source| {
        TransportError::Malformed {
            provider: provider.to_string(),
            source,
        }
        .into()
    })
}

/// Pull the vendor's own error text out of an error body.
///
/// Understands `{"error": {"message": ..}}` (OpenAI, Anthropic, Gemini,
/// DeepSeek), `{"error": ".."}` (Ollama) and `{"message": ..}`.
pub fn vendor_error_message(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return UNKNOWN_ERROR.to_string();
    };

    value
        .pointer("/error/message")
        .or_else(|| value.get("error").filter(|e| e.is_string()))
        .or_else(|| value.get("message"))
        .and_then(Value::as_str)
        .filter(|m| !m.is_empty())
        .unwrap_or(UNKNOWN_ERROR)
        .to_string()
}

pub const UNKNOWN_ERROR: &str = "Unknown error";

/// Navigate a JSON pointer to a string; anything else is `""`.
pub fn extract_text(payload: &Value, pointer: &str) -> String {
    payload
        .pointer(pointer)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Race `call` against an optional deadline and a cancellation token.
///
/// Dropping `call` on expiry aborts any in-flight request or stream read.
pub async fn with_deadline<T, F>(
    provider: &str,
    timeout: Option<Duration>,
    cancel: &CancellationToken,
    call: F,
) -> Result<T, LlmError>
where
    F: Future<Output = Result<T, LlmError>>,
{
    let bounded = async {
        match timeout {
            Some(limit) => tokio::time::timeout(limit, call).await.map_err(|_| {
                LlmError::from(TransportError::Timeout {
                    provider: provider.to_string(),
                    elapsed: limit,
                })
            })?,
            None => call.await,
        }
    };

    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(TransportError::Cancelled {
            provider: provider.to_string(),
        }
        .into()),
        result = bounded => result,
    }
}

pub fn http_error(provider: &str, source: reqwest::Error) -> LlmError {
    if source.is_timeout() {
        // Client-level timeout; the configured duration is not exposed by reqwest
        return TransportError::Timeout {
            provider: provider.to_string(),
            elapsed: Duration::ZERO,
        }
        .into();
    }
    TransportError::Http {
        provider: provider.to_string(),
        source,
    }
    .into()
}
