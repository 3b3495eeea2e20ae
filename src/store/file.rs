// File-backed store: one JSON document per key
//
// Layout: <root>/<namespace>/<key>.json
// Writers take an exclusive lock on <root>/<namespace>/.lock and replace the
// document with a rename, so a reader never observes a half-written file.

use fs2::FileExt;
use serde_json::Value;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use super::{ConfigStore, Namespace};
use crate::errors::StoreError;

pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Open (and create if needed) a store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|source| io_error(&root, source))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn namespace_dir(&self, namespace: Namespace) -> PathBuf {
        self.root.join(namespace.prefix())
    }

    fn key_path(&self, namespace: Namespace, key: &str) -> PathBuf {
        self.namespace_dir(namespace)
            .join(format!("{}.json", sanitize_key(key)))
    }

    /// Run `f` while holding the namespace's exclusive write lock.
    fn with_lock<T>(
        &self,
        namespace: Namespace,
        f: impl FnOnce(&Path) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let dir = self.namespace_dir(namespace);
        fs::create_dir_all(&dir).map_err(|source| io_error(&dir, source))?;

        let lock_path = dir.join(".lock");
        let lock = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)
            .map_err(|source| io_error(&lock_path, source))?;
        lock.lock_exclusive()
            .map_err(|source| io_error(&lock_path, source))?;

        let result = f(&dir);

        if let Err(e) = lock.unlock() {
            tracing::warn!("Failed to release store lock {}: {}", lock_path.display(), e);
        }
        result
    }
}

impl ConfigStore for FileStore {
    fn save(&self, namespace: Namespace, key: &str, value: &Value) -> Result<(), StoreError> {
        let path = self.key_path(namespace, key);
        let bytes = serde_json::to_vec_pretty(value).map_err(|source| StoreError::Serde {
            key: format!("{}/{}", namespace.prefix(), key),
            source,
        })?;

        self.with_lock(namespace, |dir| {
            let tmp = dir.join(format!(".{}.tmp", sanitize_key(key)));
            let mut file = File::create(&tmp).map_err(|source| io_error(&tmp, source))?;
            file.write_all(&bytes)
                .and_then(|_| file.sync_all())
                .map_err(|source| io_error(&tmp, source))?;
            fs::rename(&tmp, &path).map_err(|source| io_error(&path, source))
        })?;

        tracing::debug!("Saved {}/{} ({} bytes)", namespace.prefix(), key, bytes.len());
        Ok(())
    }

    fn load(&self, namespace: Namespace, key: &str) -> Result<Option<Value>, StoreError> {
        let path = self.key_path(namespace, key);
        let contents = match fs::read(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(io_error(&path, source)),
        };

        serde_json::from_slice(&contents)
            .map(Some)
            .map_err(|source| StoreError::Serde {
                key: format!("{}/{}", namespace.prefix(), key),
                source,
            })
    }

    fn remove(&self, namespace: Namespace, key: &str) -> Result<(), StoreError> {
        let path = self.key_path(namespace, key);
        self.with_lock(namespace, |_| match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(io_error(&path, source)),
        })
    }
}

/// Keys become file names; anything outside [A-Za-z0-9_-] is replaced.
fn sanitize_key(key: &str) -> String {
    key.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

fn io_error(path: &Path, source: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.display().to_string(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;
    use tempfile::TempDir;

    #[test]
    fn test_save_then_load_survives_reopen() {
        let dir = TempDir::new().unwrap();
        {
            let store = FileStore::open(dir.path()).unwrap();
            store
                .save(Namespace::LlmConfig, "openai", &json!({"apiKey": "sk-1"}))
                .unwrap();
        }

        let reopened = FileStore::open(dir.path()).unwrap();
        let value = reopened.load(Namespace::LlmConfig, "openai").unwrap();
        assert_eq!(value, Some(json!({"apiKey": "sk-1"})));
        assert!(dir.path().join("llm-config/openai.json").exists());
    }

    #[test]
    fn test_missing_key_is_none() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        assert_eq!(store.load(Namespace::Agents, "list").unwrap(), None);
    }

    #[test]
    fn test_save_replaces_whole_value() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        store
            .save(Namespace::LlmConfig, "gemini", &json!({"apiKey": "a", "model": "m"}))
            .unwrap();
        store
            .save(Namespace::LlmConfig, "gemini", &json!({"apiKey": "b"}))
            .unwrap();
        assert_eq!(
            store.load(Namespace::LlmConfig, "gemini").unwrap(),
            Some(json!({"apiKey": "b"}))
        );
    }

    #[test]
    fn test_remove_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        store.save(Namespace::Editor, "session", &json!({})).unwrap();
        store.remove(Namespace::Editor, "session").unwrap();
        store.remove(Namespace::Editor, "session").unwrap();
        assert_eq!(store.load(Namespace::Editor, "session").unwrap(), None);
    }

    #[test]
    fn test_corrupt_file_is_reported() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        fs::create_dir_all(dir.path().join("agents")).unwrap();
        fs::write(dir.path().join("agents/list.json"), "{not json").unwrap();
        assert!(matches!(
            store.load(Namespace::Agents, "list"),
            Err(StoreError::Serde { .. })
        ));
    }

    #[test]
    fn test_key_sanitization() {
        assert_eq!(sanitize_key("../etc/passwd"), "___etc_passwd");
        assert_eq!(sanitize_key("open-ai_2"), "open-ai_2");
    }

    #[test]
    fn test_concurrent_writers_leave_valid_json() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(FileStore::open(dir.path()).unwrap());

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    store
                        .save(Namespace::Agents, "list", &json!({ "writer": i }))
                        .unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let value = store.load(Namespace::Agents, "list").unwrap().unwrap();
        assert!(value["writer"].as_u64().unwrap() < 8);
    }
}
