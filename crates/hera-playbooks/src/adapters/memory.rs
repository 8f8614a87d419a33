//! In-memory adapter for tests and embedding.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Mutex;

use crate::adapter::{Adapter, FetchOptions, RunScope, TxFn};
use crate::entity::EntitySnapshot;
use crate::error::AdapterError;
use crate::out::{DynamicWrite, OutBuffer, RelationshipWrite};

/// A recorded audit event.
#[derive(Debug, Clone)]
pub struct AuditRecord {
    /// Event name (e.g., "playbook.started").
    pub event: String,

    /// Event payload.
    pub payload: serde_json::Value,

    /// Run that emitted the event.
    pub run_id: uuid::Uuid,

    /// When the event was recorded.
    pub at: DateTime<Utc>,
}

#[derive(Default)]
struct MemoryState {
    /// Entities keyed by (organization_id, entity_id).
    entities: HashMap<(String, String), EntitySnapshot>,

    /// Full buffer snapshot received at each persist call.
    persist_calls: Vec<OutBuffer>,

    /// Staged writes forwarded during the run.
    staged_dynamic: Vec<DynamicWrite>,
    staged_links: Vec<RelationshipWrite>,

    /// Recorded audit events.
    audit_events: Vec<AuditRecord>,

    /// When set, persist calls fail with a storage error.
    fail_persist: bool,
}

/// In-process adapter that records every call it receives.
///
/// Doubles as a spy in tests: persist invocations, staged writes, and audit
/// events are all observable after a run.
#[derive(Default)]
pub struct MemoryAdapter {
    inner: Mutex<MemoryState>,
}

impl MemoryAdapter {
    /// Create an empty adapter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entity into the store under an organization.
    pub fn insert_entity(&self, organization_id: &str, entity: EntitySnapshot) {
        let mut state = self.inner.lock().unwrap();
        state
            .entities
            .insert((organization_id.to_string(), entity.id.clone()), entity);
    }

    /// Make subsequent persist calls fail.
    pub fn fail_persist(&self) {
        self.inner.lock().unwrap().fail_persist = true;
    }

    /// Number of persist calls received.
    pub fn persist_count(&self) -> usize {
        self.inner.lock().unwrap().persist_calls.len()
    }

    /// The buffer received by the most recent persist call.
    pub fn last_persisted(&self) -> Option<OutBuffer> {
        self.inner.lock().unwrap().persist_calls.last().cloned()
    }

    /// All staged dynamic-field writes forwarded during runs.
    pub fn staged_dynamic(&self) -> Vec<DynamicWrite> {
        self.inner.lock().unwrap().staged_dynamic.clone()
    }

    /// All staged relationship writes forwarded during runs.
    pub fn staged_links(&self) -> Vec<RelationshipWrite> {
        self.inner.lock().unwrap().staged_links.clone()
    }

    /// All recorded audit events.
    pub fn audit_events(&self) -> Vec<AuditRecord> {
        self.inner.lock().unwrap().audit_events.clone()
    }
}

#[async_trait]
impl Adapter for MemoryAdapter {
    async fn set_dynamic(
        &self,
        _scope: &RunScope,
        write: &DynamicWrite,
    ) -> Result<(), AdapterError> {
        self.inner.lock().unwrap().staged_dynamic.push(write.clone());
        Ok(())
    }

    async fn link(
        &self,
        _scope: &RunScope,
        write: &RelationshipWrite,
    ) -> Result<(), AdapterError> {
        self.inner.lock().unwrap().staged_links.push(write.clone());
        Ok(())
    }

    async fn persist(&self, scope: &RunScope, out: &OutBuffer) -> Result<(), AdapterError> {
        let mut state = self.inner.lock().unwrap();
        if state.fail_persist {
            return Err(AdapterError::Storage("persist unavailable".to_string()));
        }

        // Apply dynamic writes to the stored entity so later runs observe
        // them; last write for a name wins.
        if let Some(entity) = state
            .entities
            .get_mut(&(scope.organization_id.clone(), scope.entity_id.clone()))
        {
            for write in &out.dynamic_fields {
                match entity.dynamic_data.iter_mut().find(|f| f.name == write.name) {
                    Some(field) => field.value = write.value.clone(),
                    None => entity.dynamic_data.push(crate::entity::DynamicField {
                        name: write.name.clone(),
                        value: write.value.clone(),
                        field_type: write.field_type.clone(),
                        smart_code: Some(write.smart_code.as_str().to_string()),
                    }),
                }
            }
        }

        state.persist_calls.push(out.clone());
        Ok(())
    }

    async fn audit(
        &self,
        scope: &RunScope,
        event: &str,
        payload: serde_json::Value,
    ) -> Result<(), AdapterError> {
        self.inner.lock().unwrap().audit_events.push(AuditRecord {
            event: event.to_string(),
            payload,
            run_id: scope.run_id,
            at: Utc::now(),
        });
        Ok(())
    }

    async fn tx(&self, f: TxFn) -> Result<serde_json::Value, AdapterError> {
        // No transactional storage here; the closure runs inline.
        f().await
    }

    async fn fetch_entity_by_id(
        &self,
        scope: &RunScope,
        id: &str,
        _options: &FetchOptions,
    ) -> Result<Option<EntitySnapshot>, AdapterError> {
        let state = self.inner.lock().unwrap();
        Ok(state
            .entities
            .get(&(scope.organization_id.clone(), id.to_string()))
            .cloned())
    }
}
