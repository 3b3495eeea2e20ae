// In-process store, used by tests and `--ephemeral` runs

use dashmap::DashMap;
use serde_json::Value;

use super::{ConfigStore, Namespace};
use crate::errors::StoreError;

#[derive(Default)]
pub struct MemoryStore {
    entries: DashMap<(Namespace, String), Value>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ConfigStore for MemoryStore {
    fn save(&self, namespace: Namespace, key: &str, value: &Value) -> Result<(), StoreError> {
        self.entries
            .insert((namespace, key.to_string()), value.clone());
        Ok(())
    }

    fn load(&self, namespace: Namespace, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self
            .entries
            .get(&(namespace, key.to_string()))
            .map(|entry| entry.value().clone()))
    }

    fn remove(&self, namespace: Namespace, key: &str) -> Result<(), StoreError> {
        self.entries.remove(&(namespace, key.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_namespaces_do_not_collide() {
        let store = MemoryStore::new();
        store.save(Namespace::Agents, "list", &json!([1])).unwrap();
        store.save(Namespace::Editor, "list", &json!([2])).unwrap();

        assert_eq!(store.load(Namespace::Agents, "list").unwrap(), Some(json!([1])));
        assert_eq!(store.load(Namespace::Editor, "list").unwrap(), Some(json!([2])));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_repeated_save_is_idempotent() {
        let store = MemoryStore::new();
        store.save(Namespace::LlmConfig, "openai", &json!({"a": 1})).unwrap();
        store.save(Namespace::LlmConfig, "openai", &json!({"a": 1})).unwrap();
        assert_eq!(store.len(), 1);

        store.remove(Namespace::LlmConfig, "openai").unwrap();
        assert!(store.is_empty());
    }
}
