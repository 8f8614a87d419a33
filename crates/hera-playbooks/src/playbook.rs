//! Playbook definition.

use std::sync::Arc;

use crate::step::Step;

/// An ordered list of steps plus metadata describing one reusable business
/// workflow.
#[derive(Clone)]
pub struct Playbook {
    /// Playbook identifier (e.g., "customer.vip-upgrade").
    pub id: String,

    /// Entity type the playbook operates on (e.g., "customer").
    pub entity_type: String,

    steps: Vec<Arc<dyn Step>>,
}

impl Playbook {
    /// Create an empty playbook.
    pub fn new(id: impl Into<String>, entity_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            entity_type: entity_type.into(),
            steps: Vec::new(),
        }
    }

    /// Append a step. Steps execute in the order they are appended.
    pub fn step<S: Step + 'static>(mut self, step: S) -> Self {
        self.steps.push(Arc::new(step));
        self
    }

    /// The ordered step list.
    pub fn steps(&self) -> &[Arc<dyn Step>] {
        &self.steps
    }

    /// Number of steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// True when the playbook has no steps.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl std::fmt::Debug for Playbook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Playbook")
            .field("id", &self.id)
            .field("entity_type", &self.entity_type)
            .field("steps", &self.steps.iter().map(|s| s.id()).collect::<Vec<_>>())
            .finish()
    }
}
