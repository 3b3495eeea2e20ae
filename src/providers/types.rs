// Normalized request/response types shared by every provider adapter
//
// Vendors differ in envelope shape, auth scheme and field names; everything
// above the adapters only sees these types.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::config::constants::DEFAULT_TEMPERATURE;

/// Per-call generation options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptOptions {
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Upper bound on generated tokens (vendor-specific field name on the wire)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Deadline for the whole call, including every stream read
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

fn default_temperature() -> f32 {
    DEFAULT_TEMPERATURE
}

impl Default for PromptOptions {
    fn default() -> Self {
        Self {
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: None,
            timeout_secs: None,
        }
    }
}

impl PromptOptions {
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }
}

/// Normalized provider answer.
///
/// `content` is always present; an envelope the extractor cannot navigate
/// yields `""` rather than an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptResponse {
    pub content: String,

    /// Internal deliberation text, when the model emitted one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,

    /// Vendor payload as received, kept for diagnostics
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<Value>,
}

impl PromptResponse {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }
}

/// One configuration field of a provider's static schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProviderField {
    pub name: &'static str,
    pub required: bool,
    /// Redacted when listing configurations
    pub secret: bool,
    #[serde(skip_serializing_if = "no_choices")]
    pub choices: &'static [&'static str],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<&'static str>,
}

fn no_choices(choices: &&'static [&'static str]) -> bool {
    choices.is_empty()
}

impl ProviderField {
    pub const fn required(name: &'static str) -> Self {
        Self {
            name,
            required: true,
            secret: false,
            choices: &[],
            default: None,
        }
    }

    pub const fn optional(name: &'static str) -> Self {
        Self {
            name,
            required: false,
            secret: false,
            choices: &[],
            default: None,
        }
    }

    pub const fn secret(self) -> Self {
        Self {
            secret: true,
            ..self
        }
    }

    pub const fn with_default(self, default: &'static str) -> Self {
        Self {
            default: Some(default),
            ..self
        }
    }

    pub const fn with_choices(self, choices: &'static [&'static str]) -> Self {
        Self { choices, ..self }
    }
}

/// Static description of a provider kind: identity plus its config fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderSchema {
    pub name: &'static str,
    pub display_name: &'static str,
    pub fields: &'static [ProviderField],
}

impl ProviderSchema {
    pub fn field(&self, name: &str) -> Option<&ProviderField> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn required_fields(&self) -> impl Iterator<Item = &ProviderField> {
        self.fields.iter().filter(|f| f.required)
    }
}

/// A provider's working configuration: field name → value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProviderSettings(BTreeMap<String, Value>);

impl ProviderSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// String value of a field, if it is set to a non-empty string.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.0
            .get(name)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    /// Field value as text, falling back to the schema default.
    pub fn resolve(&self, schema: &ProviderSchema, name: &str) -> Option<String> {
        match self.0.get(name) {
            Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
            Some(Value::Bool(b)) => Some(b.to_string()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => schema
                .field(name)
                .and_then(|f| f.default)
                .map(str::to_string),
        }
    }

    /// JavaScript-style truthiness of a field.
    pub fn is_truthy(&self, name: &str) -> bool {
        match self.0.get(name) {
            None | Some(Value::Null) => false,
            Some(Value::Bool(b)) => *b,
            Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
            Some(Value::String(s)) => !s.is_empty(),
            Some(Value::Array(_)) | Some(Value::Object(_)) => true,
        }
    }

    /// Copy with every secret field of `schema` masked.
    pub fn redacted(&self, schema: &ProviderSchema) -> Self {
        let mut copy = self.clone();
        for field in schema.fields.iter().filter(|f| f.secret) {
            if copy.is_truthy(field.name) {
                copy.0
                    .insert(field.name.to_string(), Value::String(REDACTED.to_string()));
            }
        }
        copy
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<BTreeMap<String, Value>> for ProviderSettings {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Self(map)
    }
}

pub const REDACTED: &str = "••••";
