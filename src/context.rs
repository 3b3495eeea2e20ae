// Application context
//
// Built once at startup and handed to every component that needs providers,
// agents or persisted state. Tests build one over a `MemoryStore`.

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;

use crate::agent::{Agent, AgentConfig, AgentManager};
use crate::config::Settings;
use crate::knowledge::KnowledgeBase;
use crate::logging::PromptLog;
use crate::providers::http::build_client;
use crate::providers::ProviderRegistry;
use crate::store::{ConfigStore, FileStore};

pub struct AppContext {
    settings: Settings,
    store: Arc<dyn ConfigStore>,
    registry: Arc<ProviderRegistry>,
    agents: AgentManager,
    knowledge: Arc<KnowledgeBase>,
    prompt_log: Option<Arc<PromptLog>>,
}

impl AppContext {
    /// Context backed by the workspace's file store.
    pub fn open(settings: Settings) -> Result<Self> {
        let store_dir = settings.store_dir();
        let store = FileStore::open(&store_dir)
            .with_context(|| format!("Failed to open store at {}", store_dir.display()))?;
        Self::with_store(settings, Arc::new(store))
    }

    pub fn with_store(settings: Settings, store: Arc<dyn ConfigStore>) -> Result<Self> {
        let client = build_client(
            Duration::from_secs(settings.http.request_timeout_secs),
            Duration::from_secs(settings.http.connect_timeout_secs),
        )
        .context("Failed to build HTTP client")?;

        let registry = Arc::new(ProviderRegistry::new(store.clone(), client));
        let agents = AgentManager::load(store.clone()).context("Failed to load agents")?;
        let knowledge =
            Arc::new(KnowledgeBase::load(store.clone()).context("Failed to load knowledge base")?);

        let prompt_log = if settings.prompt_log {
            Some(Arc::new(PromptLog::new(settings.prompt_log_path())?))
        } else {
            None
        };

        Ok(Self {
            settings,
            store,
            registry,
            agents,
            knowledge,
            prompt_log,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn store(&self) -> &Arc<dyn ConfigStore> {
        &self.store
    }

    pub fn registry(&self) -> &Arc<ProviderRegistry> {
        &self.registry
    }

    pub fn agents(&self) -> &AgentManager {
        &self.agents
    }

    pub fn knowledge(&self) -> &Arc<KnowledgeBase> {
        &self.knowledge
    }

    pub fn prompt_log(&self) -> Option<&Arc<PromptLog>> {
        self.prompt_log.as_ref()
    }

    /// An agent for `config`, wired to this context's providers and knowledge.
    pub fn agent(&self, config: AgentConfig) -> Agent {
        Agent::new(config, self.registry.clone(), self.knowledge.clone())
            .with_prompt_log(self.prompt_log.clone())
    }

    /// Flush buffered diagnostics. Call before exit.
    pub async fn shutdown(&self) {
        if let Some(log) = &self.prompt_log {
            if let Err(e) = log.flush().await {
                tracing::warn!("Failed to flush prompt log: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::AgentRole;
    use crate::store::MemoryStore;
    use tempfile::TempDir;

    #[test]
    fn test_in_memory_context_seeds_agents() {
        let ctx = AppContext::with_store(Settings::default(), Arc::new(MemoryStore::new())).unwrap();
        assert!(ctx.agents().first_with_role(AgentRole::ContentWriter).is_some());
        assert!(ctx.prompt_log().is_none());
        assert!(ctx.registry().default_provider().unwrap().is_none());
    }

    #[test]
    fn test_file_context_persists_across_opens() {
        let dir = TempDir::new().unwrap();
        let settings = Settings {
            workspace: dir.path().to_path_buf(),
            prompt_log: true,
            ..Settings::default()
        };

        let ctx = AppContext::open(settings.clone()).unwrap();
        ctx.registry().set_default_provider("ollama").unwrap();
        ctx.knowledge().add("Note", "Body").unwrap();
        assert!(ctx.prompt_log().is_some());
        drop(ctx);

        let reopened = AppContext::open(settings).unwrap();
        assert_eq!(
            reopened.registry().default_kind().unwrap().map(|k| k.name()),
            Some("ollama")
        );
        assert_eq!(reopened.knowledge().list().len(), 1);
    }
}
