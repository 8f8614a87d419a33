//! Playbook registry and dispatch.

use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

use crate::entity::EntitySnapshot;
use crate::executor::{execute_playbook, RunOptions};
use crate::playbook::Playbook;
use crate::result::RunOutput;

/// Requested playbook is not registered.
#[derive(Debug, Error)]
#[error("Playbook not found: {0}")]
pub struct UnknownPlaybook(pub String);

/// Registry of available playbooks, keyed by playbook ID.
pub struct PlaybookRegistry {
    playbooks: HashMap<String, Arc<Playbook>>,
}

impl PlaybookRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            playbooks: HashMap::new(),
        }
    }

    /// Register a playbook under its own ID.
    pub fn register(&mut self, playbook: Playbook) {
        let id = playbook.id.clone();
        self.playbooks.insert(id, Arc::new(playbook));
    }

    /// Get a playbook by ID.
    pub fn get(&self, id: &str) -> Option<Arc<Playbook>> {
        self.playbooks.get(id).cloned()
    }

    /// Check if a playbook is registered.
    pub fn has(&self, id: &str) -> bool {
        self.playbooks.contains_key(id)
    }

    /// List all registered playbook IDs.
    pub fn list(&self) -> Vec<&str> {
        self.playbooks.keys().map(|s| s.as_str()).collect()
    }

    /// Execute a registered playbook by ID.
    pub async fn execute(
        &self,
        id: &str,
        entity: EntitySnapshot,
        opts: RunOptions,
    ) -> Result<RunOutput, UnknownPlaybook> {
        let playbook = self.get(id).ok_or_else(|| UnknownPlaybook(id.to_string()))?;
        Ok(execute_playbook(&playbook, entity, opts).await)
    }
}

impl Default for PlaybookRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PlaybookRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybookRegistry")
            .field("playbooks", &self.playbooks.keys().collect::<Vec<_>>())
            .finish()
    }
}
