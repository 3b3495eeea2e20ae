// Provider registry
//
// The single construction point for provider instances: one instance per
// provider kind, created on first lookup and cached for the life of the
// registry.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use reqwest::Client;
use serde::Serialize;
use std::sync::Arc;

use super::{Provider, ProviderField, ProviderKind, ProviderSettings};
use crate::errors::LlmError;
use crate::store::{ConfigStore, Namespace};

const DEFAULT_KEY: &str = "default";

/// Listing entry for one provider kind.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderStatus {
    pub name: &'static str,
    pub display_name: &'static str,
    pub configured: bool,
    pub is_default: bool,
    /// Working configuration with secret fields masked
    pub config: ProviderSettings,
    pub fields: &'static [ProviderField],
}

pub struct ProviderRegistry {
    store: Arc<dyn ConfigStore>,
    client: Client,
    instances: DashMap<ProviderKind, Arc<Provider>>,
}

impl ProviderRegistry {
    pub fn new(store: Arc<dyn ConfigStore>, client: Client) -> Self {
        Self {
            store,
            client,
            instances: DashMap::new(),
        }
    }

    /// Case-insensitive lookup; the same instance is returned for every call.
    pub fn get_provider(&self, name: &str) -> Result<Arc<Provider>, LlmError> {
        self.instance(ProviderKind::parse(name)?)
    }

    fn instance(&self, kind: ProviderKind) -> Result<Arc<Provider>, LlmError> {
        // The entry holds the shard lock, so racing first lookups build once
        match self.instances.entry(kind) {
            Entry::Occupied(entry) => Ok(entry.get().clone()),
            Entry::Vacant(entry) => {
                let provider = Arc::new(Provider::load(
                    kind,
                    self.client.clone(),
                    self.store.clone(),
                )?);
                tracing::debug!("Created provider instance {}", kind);
                entry.insert(provider.clone());
                Ok(provider)
            }
        }
    }

    /// Persist `name` as the default provider.
    ///
    /// The name must be known but the provider need not be configured yet;
    /// an unconfigured default fails when it is used.
    pub fn set_default_provider(&self, name: &str) -> Result<(), LlmError> {
        let kind = ProviderKind::parse(name)?;
        self.store
            .save_as(Namespace::LlmConfig, DEFAULT_KEY, &kind.name())?;
        tracing::info!("Default provider set to {}", kind);
        Ok(())
    }

    /// The explicitly selected default, if any.
    pub fn default_kind(&self) -> Result<Option<ProviderKind>, LlmError> {
        let Some(name) = self
            .store
            .load_as::<String>(Namespace::LlmConfig, DEFAULT_KEY)?
        else {
            return Ok(None);
        };
        match ProviderKind::parse(&name) {
            Ok(kind) => Ok(Some(kind)),
            Err(_) => {
                tracing::warn!("Ignoring unknown default provider '{}' in store", name);
                Ok(None)
            }
        }
    }

    /// Resolve the default provider.
    ///
    /// An explicit default is returned only while it is configured. Without
    /// one, the first configured provider in priority order is used.
    pub fn default_provider(&self) -> Result<Option<Arc<Provider>>, LlmError> {
        if let Some(kind) = self.default_kind()? {
            let provider = self.instance(kind)?;
            if provider.is_configured() {
                return Ok(Some(provider));
            }
            tracing::warn!("Default provider {} is not configured", kind);
            return Ok(None);
        }

        for kind in ProviderKind::ALL {
            let provider = self.instance(kind)?;
            if provider.is_configured() {
                return Ok(Some(provider));
            }
        }
        Ok(None)
    }

    /// Like `default_provider`, but absence is an error.
    pub fn require_default_provider(&self) -> Result<Arc<Provider>, LlmError> {
        self.default_provider()?
            .ok_or(LlmError::NoProviderConfigured)
    }

    /// Names of every configured provider, in priority order.
    pub fn configured_providers(&self) -> Result<Vec<&'static str>, LlmError> {
        let mut names = Vec::new();
        for kind in ProviderKind::ALL {
            if self.instance(kind)?.is_configured() {
                names.push(kind.name());
            }
        }
        Ok(names)
    }

    /// Status of every known provider with secrets redacted.
    pub fn get_configurations(&self) -> Result<Vec<ProviderStatus>, LlmError> {
        let default = self.default_kind()?;
        ProviderKind::ALL
            .into_iter()
            .map(|kind| {
                let provider = self.instance(kind)?;
                let schema = kind.schema();
                Ok(ProviderStatus {
                    name: schema.name,
                    display_name: schema.display_name,
                    configured: provider.is_configured(),
                    is_default: default == Some(kind),
                    config: provider.get_config().redacted(schema),
                    fields: schema.fields,
                })
            })
            .collect()
    }
}
