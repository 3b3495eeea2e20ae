// Agent manager: the persisted agent list
//
// The list is saved wholesale under `agents/list` after every change. Edits
// are made on a copy that replaces the in-memory list only once it is saved.
// The write lock is held across the save so concurrent edits serialize.

use std::sync::{Arc, PoisonError, RwLock, RwLockWriteGuard};

use super::config::{AgentConfig, AgentRole};
use super::styles::{Tone, WritingStyle};
use super::AgentError;
use crate::errors::StoreError;
use crate::store::{ConfigStore, Namespace};

const LIST_KEY: &str = "list";

pub struct AgentManager {
    store: Arc<dyn ConfigStore>,
    agents: RwLock<Vec<AgentConfig>>,
}

impl AgentManager {
    /// Load the persisted list, seeding a default writer and reviewer when
    /// nothing has been saved yet.
    pub fn load(store: Arc<dyn ConfigStore>) -> Result<Self, StoreError> {
        let agents = match store.load_as::<Vec<AgentConfig>>(Namespace::Agents, LIST_KEY)? {
            Some(agents) => agents,
            None => {
                let seeded = default_agents();
                store.save_as(Namespace::Agents, LIST_KEY, &seeded)?;
                tracing::info!("Seeded {} default agents", seeded.len());
                seeded
            }
        };
        Ok(Self {
            store,
            agents: RwLock::new(agents),
        })
    }

    pub fn list(&self) -> Vec<AgentConfig> {
        self.agents
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn get(&self, id: &str) -> Option<AgentConfig> {
        self.agents
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|a| a.id == id)
            .cloned()
    }

    /// Look up by id, then by case-insensitive name.
    pub fn find(&self, id_or_name: &str) -> Option<AgentConfig> {
        self.get(id_or_name).or_else(|| {
            self.agents
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .iter()
                .find(|a| a.name.eq_ignore_ascii_case(id_or_name))
                .cloned()
        })
    }

    /// First agent with `role`, in list order.
    pub fn first_with_role(&self, role: AgentRole) -> Option<AgentConfig> {
        self.agents
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|a| a.role == role)
            .cloned()
    }

    pub fn create(&self, agent: AgentConfig) -> Result<AgentConfig, AgentError> {
        let mut agents = self.write();
        let mut next = agents.clone();
        next.push(agent.clone());
        self.persist(&next)?;
        *agents = next;
        tracing::info!("Created agent {} ({})", agent.name, agent.role);
        Ok(agent)
    }

    /// Apply `edit` in place and bump `updated_at`.
    ///
    /// `id` and `created_at` are preserved whatever `edit` does.
    pub fn update<F>(&self, id: &str, edit: F) -> Result<AgentConfig, AgentError>
    where
        F: FnOnce(&mut AgentConfig),
    {
        let mut agents = self.write();
        let mut next = agents.clone();
        let agent = next
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| AgentError::UnknownAgent(id.to_string()))?;

        let (id, created_at) = (agent.id.clone(), agent.created_at);
        edit(agent);
        agent.id = id;
        agent.created_at = created_at;
        agent.touch();

        let updated = agent.clone();
        self.persist(&next)?;
        *agents = next;
        Ok(updated)
    }

    /// Change an agent's role; its style resets to the role default.
    pub fn set_role(&self, id: &str, role: AgentRole) -> Result<AgentConfig, AgentError> {
        self.update(id, |agent| agent.set_role(role))
    }

    /// Remove by id. Returns whether anything was removed.
    pub fn delete(&self, id: &str) -> Result<bool, AgentError> {
        let mut agents = self.write();
        let next: Vec<_> = agents.iter().filter(|a| a.id != id).cloned().collect();
        if next.len() == agents.len() {
            return Ok(false);
        }
        self.persist(&next)?;
        *agents = next;
        tracing::info!("Deleted agent {}", id);
        Ok(true)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<AgentConfig>> {
        self.agents.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn persist(&self, agents: &[AgentConfig]) -> Result<(), StoreError> {
        self.store.save_as(Namespace::Agents, LIST_KEY, &agents)
    }
}

fn default_agents() -> Vec<AgentConfig> {
    vec![
        AgentConfig::new(
            "Writer",
            AgentRole::ContentWriter,
            "You are an experienced content writer. You turn outlines into clear, engaging prose \
             that fits the audience and never pads for length.",
        )
        .with_style(WritingStyle::Conversational)
        .with_tone(Tone::Professional)
        .with_expertise(["content writing", "editing"]),
        AgentConfig::new(
            "Reviewer",
            AgentRole::ContentReviewer,
            "You are a sharp, fair editor. You read drafts closely and point out exactly what \
             would make them better.",
        )
        .with_style(WritingStyle::Constructive)
        .with_tone(Tone::Professional)
        .with_expertise(["editing", "structure", "clarity"]),
    ]
}
