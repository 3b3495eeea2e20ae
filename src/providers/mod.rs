// Multi-provider LLM support
//
// One adapter per vendor behind a closed set of provider kinds. Callers get
// `Provider` instances from the registry and never talk to an adapter
// directly.

pub mod anthropic;
pub mod deepseek;
pub mod gemini;
pub mod http;
pub mod ollama;
pub mod openai;
pub mod reasoning;
pub mod registry;
pub mod stream;
pub mod types;

pub use registry::{ProviderRegistry, ProviderStatus};
pub use types::{
    PromptOptions, PromptResponse, ProviderField, ProviderSchema, ProviderSettings, REDACTED,
};

use futures::future::try_join_all;
use reqwest::Client;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::errors::LlmError;
use crate::store::{ConfigStore, Namespace};

/// Every supported backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    OpenAi,
    Anthropic,
    Gemini,
    DeepSeek,
    Ollama,
}

impl ProviderKind {
    /// Fallback order used when no explicit default is set.
    pub const ALL: [ProviderKind; 5] = [
        ProviderKind::OpenAi,
        ProviderKind::Anthropic,
        ProviderKind::Gemini,
        ProviderKind::DeepSeek,
        ProviderKind::Ollama,
    ];

    pub fn schema(self) -> &'static ProviderSchema {
        match self {
            ProviderKind::OpenAi => &openai::SCHEMA,
            ProviderKind::Anthropic => &anthropic::SCHEMA,
            ProviderKind::Gemini => &gemini::SCHEMA,
            ProviderKind::DeepSeek => &deepseek::SCHEMA,
            ProviderKind::Ollama => &ollama::SCHEMA,
        }
    }

    pub fn name(self) -> &'static str {
        self.schema().name
    }

    /// Case-insensitive lookup by provider name.
    pub fn parse(name: &str) -> Result<Self, LlmError> {
        let normalized = name.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == normalized)
            .ok_or_else(|| LlmError::UnknownProvider(name.to_string()))
    }

    async fn dispatch(
        self,
        client: &Client,
        settings: &ProviderSettings,
        prompt: &str,
        options: &PromptOptions,
    ) -> Result<PromptResponse, LlmError> {
        match self {
            ProviderKind::OpenAi => openai::execute(client, settings, prompt, options).await,
            ProviderKind::Anthropic => anthropic::execute(client, settings, prompt, options).await,
            ProviderKind::Gemini => gemini::execute(client, settings, prompt, options).await,
            ProviderKind::DeepSeek => deepseek::execute(client, settings, prompt, options).await,
            ProviderKind::Ollama => ollama::execute(client, settings, prompt, options).await,
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A provider instance: its kind plus the working configuration.
///
/// The configuration is only ever replaced wholesale by `configure`.
pub struct Provider {
    kind: ProviderKind,
    client: Client,
    store: Arc<dyn ConfigStore>,
    settings: RwLock<ProviderSettings>,
}

impl Provider {
    /// Build an instance, reloading its persisted configuration.
    pub(crate) fn load(
        kind: ProviderKind,
        client: Client,
        store: Arc<dyn ConfigStore>,
    ) -> Result<Self, LlmError> {
        let settings = store
            .load_as::<ProviderSettings>(Namespace::LlmConfig, kind.name())?
            .unwrap_or_default();
        Ok(Self {
            kind,
            client,
            store,
            settings: RwLock::new(settings),
        })
    }

    pub fn kind(&self) -> ProviderKind {
        self.kind
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn schema(&self) -> &'static ProviderSchema {
        self.kind.schema()
    }

    /// Replace the working configuration and persist it.
    ///
    /// Values are not validated here; see `is_configured`.
    pub fn configure(&self, settings: ProviderSettings) -> Result<(), LlmError> {
        self.store
            .save_as(Namespace::LlmConfig, self.name(), &settings)?;
        *self.settings.write().unwrap_or_else(PoisonError::into_inner) = settings;
        tracing::info!("Configured provider {}", self.name());
        Ok(())
    }

    /// True iff every required schema field has a truthy value.
    pub fn is_configured(&self) -> bool {
        self.missing_fields().is_empty()
    }

    /// Required fields without a truthy value, in schema order.
    pub fn missing_fields(&self) -> Vec<String> {
        let settings = self.settings.read().unwrap_or_else(PoisonError::into_inner);
        self.schema()
            .required_fields()
            .filter(|field| !settings.is_truthy(field.name))
            .map(|field| field.name.to_string())
            .collect()
    }

    pub fn get_config(&self) -> ProviderSettings {
        self.settings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub async fn execute_prompt(
        &self,
        prompt: &str,
        options: &PromptOptions,
    ) -> Result<PromptResponse, LlmError> {
        self.execute_prompt_with_cancel(prompt, options, &CancellationToken::new())
            .await
    }

    /// Run one prompt under the options' deadline and `cancel`.
    pub async fn execute_prompt_with_cancel(
        &self,
        prompt: &str,
        options: &PromptOptions,
        cancel: &CancellationToken,
    ) -> Result<PromptResponse, LlmError> {
        let missing = self.missing_fields();
        if !missing.is_empty() {
            return Err(LlmError::NotConfigured {
                provider: self.name().to_string(),
                missing,
            });
        }

        // Snapshot so a concurrent configure does not change a call mid-flight
        let settings = self.get_config();
        let timeout = options.timeout_secs.map(Duration::from_secs);

        let response = http::with_deadline(
            self.name(),
            timeout,
            cancel,
            self.kind.dispatch(&self.client, &settings, prompt, options),
        )
        .await?;

        tracing::debug!(
            "{} answered with {} chars (reasoning: {})",
            self.name(),
            response.content.len(),
            response.reasoning.is_some()
        );
        Ok(response)
    }

    /// Run every prompt concurrently; results are in input order.
    ///
    /// Any failure fails the whole batch.
    pub async fn execute_prompts<S: AsRef<str>>(
        &self,
        prompts: &[S],
        options: &PromptOptions,
    ) -> Result<Vec<PromptResponse>, LlmError> {
        try_join_all(
            prompts
                .iter()
                .map(|prompt| self.execute_prompt(prompt.as_ref(), options)),
        )
        .await
    }
}

impl fmt::Debug for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Provider")
            .field("kind", &self.kind)
            .field("configured", &self.is_configured())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::TransportError;
    use crate::store::MemoryStore;

    fn provider(kind: ProviderKind) -> (Provider, Arc<dyn ConfigStore>) {
        let store: Arc<dyn ConfigStore> = Arc::new(MemoryStore::new());
        let provider = Provider::load(kind, Client::new(), store.clone()).unwrap();
        (provider, store)
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(ProviderKind::parse("OpenAI").unwrap(), ProviderKind::OpenAi);
        assert_eq!(ProviderKind::parse(" deepseek ").unwrap(), ProviderKind::DeepSeek);
        assert!(matches!(
            ProviderKind::parse("grok"),
            Err(LlmError::UnknownProvider(name)) if name == "grok"
        ));
    }

    #[test]
    fn test_schema_names_are_unique_per_kind() {
        for kind in ProviderKind::ALL {
            let schema = kind.schema();
            assert_eq!(schema.name, kind.name());
            let mut names: Vec<_> = schema.fields.iter().map(|f| f.name).collect();
            names.sort_unstable();
            names.dedup();
            assert_eq!(names.len(), schema.fields.len(), "duplicate field in {}", kind);
        }
    }

    #[test]
    fn test_is_configured_is_required_field_predicate() {
        let (provider, _) = provider(ProviderKind::OpenAi);
        assert!(!provider.is_configured());

        provider
            .configure(ProviderSettings::new().with("apiKey", "sk-1"))
            .unwrap();
        assert!(!provider.is_configured());
        assert_eq!(provider.missing_fields(), vec!["model".to_string()]);

        provider
            .configure(
                ProviderSettings::new()
                    .with("apiKey", "sk-1")
                    .with("model", "gpt-4o")
                    .with("baseUrl", ""),
            )
            .unwrap();
        assert!(provider.is_configured());

        provider
            .configure(
                ProviderSettings::new()
                    .with("apiKey", "")
                    .with("model", "gpt-4o"),
            )
            .unwrap();
        assert!(!provider.is_configured());
    }

    #[test]
    fn test_configure_replaces_wholesale_and_persists() {
        let (provider, store) = provider(ProviderKind::Gemini);
        provider
            .configure(
                ProviderSettings::new()
                    .with("apiKey", "k")
                    .with("model", "gemini-2.5-pro"),
            )
            .unwrap();
        provider
            .configure(ProviderSettings::new().with("model", "gemini-2.0-flash"))
            .unwrap();

        let config = provider.get_config();
        assert!(config.get("apiKey").is_none());

        let persisted: ProviderSettings = store
            .load_as(Namespace::LlmConfig, "gemini")
            .unwrap()
            .unwrap();
        assert_eq!(persisted, config);

        // A fresh instance reloads the persisted configuration
        let reloaded = Provider::load(ProviderKind::Gemini, Client::new(), store).unwrap();
        assert_eq!(reloaded.get_config(), config);
    }

    #[tokio::test]
    async fn test_unconfigured_execute_fails_before_network() {
        let (provider, _) = provider(ProviderKind::Anthropic);
        let err = provider
            .execute_prompt("Hello", &PromptOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LlmError::NotConfigured { ref provider, .. } if provider == "anthropic"
        ));
    }

    #[tokio::test]
    async fn test_cancelled_call_resolves_to_transport_error() {
        let (provider, _) = provider(ProviderKind::Ollama);
        // Non-routable address keeps the connect pending until cancellation
        provider
            .configure(
                ProviderSettings::new()
                    .with("baseUrl", "http://10.255.255.1:11434")
                    .with("model", "llama3.1"),
            )
            .unwrap();

        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = provider
            .execute_prompt_with_cancel("Hi", &PromptOptions::default(), &cancel)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LlmError::Transport(TransportError::Cancelled { .. })
        ));
    }
}
