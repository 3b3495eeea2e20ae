// Persistent key/value store
//
// Every durable piece of state (provider configs, the agent list, the editor
// session, the knowledge base) goes through `ConfigStore`, namespaced per
// logical domain.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::errors::StoreError;

/// Logical domains of persisted state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    Agents,
    LlmConfig,
    Editor,
    KnowledgeBase,
}

impl Namespace {
    pub fn prefix(self) -> &'static str {
        match self {
            Namespace::Agents => "agents",
            Namespace::LlmConfig => "llm-config",
            Namespace::Editor => "editor",
            Namespace::KnowledgeBase => "knowledge-base",
        }
    }
}

/// Durable, idempotent key/value storage.
///
/// `save` replaces the whole value for a key; there are no partial writes.
pub trait ConfigStore: Send + Sync {
    fn save(&self, namespace: Namespace, key: &str, value: &Value) -> Result<(), StoreError>;

    fn load(&self, namespace: Namespace, key: &str) -> Result<Option<Value>, StoreError>;

    fn remove(&self, namespace: Namespace, key: &str) -> Result<(), StoreError>;
}

impl dyn ConfigStore {
    /// Serialize `value` and save it.
    pub fn save_as<T: Serialize>(
        &self,
        namespace: Namespace,
        key: &str,
        value: &T,
    ) -> Result<(), StoreError> {
        let json = serde_json::to_value(value).map_err(|source| StoreError::Serde {
            key: format!("{}/{}", namespace.prefix(), key),
            source,
        })?;
        self.save(namespace, key, &json)
    }

    /// Load and deserialize a value, `None` when the key was never saved.
    pub fn load_as<T: DeserializeOwned>(
        &self,
        namespace: Namespace,
        key: &str,
    ) -> Result<Option<T>, StoreError> {
        match self.load(namespace, key)? {
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|source| StoreError::Serde {
                    key: format!("{}/{}", namespace.prefix(), key),
                    source,
                }),
            None => Ok(None),
        }
    }
}
