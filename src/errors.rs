// Error taxonomy for the provider layer and its persistence
//
// Agent and session layers wrap these; the CLI and server convert them into
// anyhow errors or HTTP statuses at the edge.

use std::time::Duration;

/// Failures of a provider call or of provider/registry configuration.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// A required field of the provider's schema has no value.
    #[error(
        "Provider '{provider}' is not configured (missing: {}). Configure it before use.",
        missing.join(", ")
    )]
    NotConfigured {
        provider: String,
        missing: Vec<String>,
    },

    /// No default provider could be resolved.
    #[error("No LLM provider is configured. Select and configure a provider first.")]
    NoProviderConfigured,

    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    /// The vendor answered with a non-success status.
    #[error("{provider} API error ({status}): {message}")]
    ProviderApi {
        provider: String,
        status: u16,
        message: String,
    },

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl LlmError {
    /// True for the two configuration failures callers redirect to provider setup.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            LlmError::NotConfigured { .. } | LlmError::NoProviderConfigured
        )
    }
}

/// Network, stream and payload failures. Propagated unchanged, never retried.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Request to {provider} failed: {source}")]
    Http {
        provider: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{provider} did not answer within {}s", elapsed.as_secs())]
    Timeout { provider: String, elapsed: Duration },

    #[error("Request to {provider} was cancelled")]
    Cancelled { provider: String },

    #[error("Stream from {provider} ended before completion")]
    StreamInterrupted { provider: String },

    #[error("Malformed {provider} payload: {source}")]
    Malformed {
        provider: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Failures of the persistent key/value store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Store I/O error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Stored value for '{key}' is not valid JSON: {source}")]
    Serde {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}
