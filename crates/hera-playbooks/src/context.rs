//! Execution context for playbook runs.
//!
//! One context is created per run and owned by the executor for the run's
//! lifetime. Steps receive it mutably and use the bound helper surface to
//! read entity state and stage writes; they never talk to the adapter
//! directly.

use std::collections::HashMap;
use std::sync::Arc;

use crate::adapter::{Adapter, FetchOptions, RunScope, TxFn};
use crate::entity::{Actor, EntitySnapshot};
use crate::error::AdapterError;
use crate::out::{DynamicWrite, OutBuffer, RelationshipWrite};
use crate::result::RunOutput;
use crate::result::StepResult;
use crate::smart_code::SmartCode;

/// State key holding the playbook ID, seeded at run start.
pub const STATE_PLAYBOOK_ID: &str = "__playbookId";

/// Options for [`ExecutionContext::set_dynamic_with`].
#[derive(Debug, Clone, Default)]
pub struct SetDynamicOptions {
    /// Field type; defaults to "text".
    pub field_type: Option<String>,

    /// Explicit smart code; defaults to `HERA.<TYPE>.DYN.<NAME>.v1`.
    pub smart_code: Option<SmartCode>,
}

/// Options for [`ExecutionContext::link_with`].
#[derive(Debug, Clone, Default)]
pub struct LinkOptions {
    /// Explicit smart code; defaults to `HERA.<TYPE>.REL.<REL_TYPE>.v1`.
    pub smart_code: Option<SmartCode>,
}

/// Mutable, per-run execution context.
pub struct ExecutionContext {
    entity: EntitySnapshot,
    actor: Actor,
    organization_id: String,
    scope: RunScope,
    adapter: Arc<dyn Adapter>,

    /// Run-local state, private to the run. Steps pass information forward
    /// through arbitrary keys here.
    pub state: HashMap<String, serde_json::Value>,

    /// Accumulated staged writes. Append-only for the duration of the run.
    pub out: OutBuffer,

    /// Pending-value overlay: last staged value per dynamic-field name.
    pending: HashMap<String, serde_json::Value>,
}

impl ExecutionContext {
    /// Create a context for one run. State is seeded with the playbook ID.
    pub fn new(
        playbook_id: &str,
        entity: EntitySnapshot,
        actor: Actor,
        organization_id: impl Into<String>,
        adapter: Arc<dyn Adapter>,
    ) -> Self {
        let organization_id = organization_id.into();
        let scope = RunScope {
            run_id: uuid::Uuid::new_v4(),
            playbook_id: playbook_id.to_string(),
            organization_id: organization_id.clone(),
            actor: actor.clone(),
            entity_id: entity.id.clone(),
            entity_type: entity.entity_type.clone(),
        };

        let mut state = HashMap::new();
        state.insert(
            STATE_PLAYBOOK_ID.to_string(),
            serde_json::Value::String(playbook_id.to_string()),
        );

        Self {
            entity,
            actor,
            organization_id,
            scope,
            adapter,
            state,
            out: OutBuffer::new(),
            pending: HashMap::new(),
        }
    }

    /// The immutable entity snapshot this run operates on.
    pub fn entity(&self) -> &EntitySnapshot {
        &self.entity
    }

    /// The invoking principal.
    pub fn actor(&self) -> &Actor {
        &self.actor
    }

    /// The tenant scope of the run.
    pub fn organization_id(&self) -> &str {
        &self.organization_id
    }

    /// Run identity passed to every adapter call.
    pub fn scope(&self) -> &RunScope {
        &self.scope
    }

    /// Set a run-local state value.
    pub fn set_state(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.state.insert(key.into(), value);
    }

    /// Get a run-local state value.
    pub fn get_state(&self, key: &str) -> Option<&serde_json::Value> {
        self.state.get(key)
    }

    /// Read the current value of a dynamic field.
    ///
    /// Two-tier lookup: the pending overlay (last value staged during this
    /// run) wins over the entity snapshot. Purely in-memory; never performs
    /// I/O. Returns `None` when the field is unset in both tiers.
    pub fn get_dynamic(&self, name: &str) -> Option<&serde_json::Value> {
        self.pending
            .get(name)
            .or_else(|| self.entity.dynamic_value(name))
    }

    /// Stage a dynamic-field write with default type and smart code.
    pub async fn set_dynamic(
        &mut self,
        name: &str,
        value: serde_json::Value,
    ) -> Result<(), AdapterError> {
        self.set_dynamic_with(name, value, SetDynamicOptions::default()).await
    }

    /// Stage a dynamic-field write.
    ///
    /// Appends to `out.dynamic_fields`, updates the pending overlay so later
    /// `get_dynamic` calls observe the new value, and forwards the staged
    /// write to the adapter as intent.
    pub async fn set_dynamic_with(
        &mut self,
        name: &str,
        value: serde_json::Value,
        options: SetDynamicOptions,
    ) -> Result<(), AdapterError> {
        let write = DynamicWrite {
            name: name.to_string(),
            value: value.clone(),
            field_type: options.field_type.unwrap_or_else(|| "text".to_string()),
            smart_code: options
                .smart_code
                .unwrap_or_else(|| SmartCode::for_dynamic_field(&self.entity.entity_type, name)),
        };

        self.out.dynamic_fields.push(write.clone());
        self.pending.insert(name.to_string(), value);

        self.adapter.set_dynamic(&self.scope, &write).await
    }

    /// Stage a relationship write from the current entity with a default
    /// smart code.
    pub async fn link(&mut self, rel_type: &str, to: &str) -> Result<(), AdapterError> {
        self.link_with(rel_type, to, LinkOptions::default()).await
    }

    /// Stage a relationship write from the current entity to `to`.
    pub async fn link_with(
        &mut self,
        rel_type: &str,
        to: &str,
        options: LinkOptions,
    ) -> Result<(), AdapterError> {
        let write = RelationshipWrite {
            rel_type: rel_type.to_string(),
            from: self.entity.id.clone(),
            to: to.to_string(),
            smart_code: options
                .smart_code
                .unwrap_or_else(|| SmartCode::for_relationship(&self.entity.entity_type, rel_type)),
        };

        self.out.relationships.push(write.clone());

        self.adapter.link(&self.scope, &write).await
    }

    /// Stage a top-level field override on the entity row.
    pub fn set_header(&mut self, name: impl Into<String>, value: serde_json::Value) {
        self.out.headers.insert(name.into(), value);
    }

    /// Flush the full accumulated buffer through the adapter.
    ///
    /// Safe to call more than once; the adapter receives the entire buffer
    /// every time, not a delta.
    pub async fn persist(&self) -> Result<(), AdapterError> {
        self.adapter.persist(&self.scope, &self.out).await
    }

    /// Record an audit event. Fire-and-forget: failures are logged and
    /// swallowed, never surfaced to the step.
    pub async fn log(&self, event: &str, payload: serde_json::Value) {
        if let Err(e) = self.adapter.audit(&self.scope, event, payload).await {
            tracing::warn!(event, error = %e, "Audit emission failed");
        }
    }

    /// Run a closure inside an adapter-owned transaction boundary.
    pub async fn tx(&self, f: TxFn) -> Result<serde_json::Value, AdapterError> {
        self.adapter.tx(f).await
    }

    /// Fetch an entity by ID. The run's organization scope is always
    /// injected; steps cannot bypass tenant isolation.
    pub async fn fetch_entity_by_id(
        &self,
        id: &str,
        options: FetchOptions,
    ) -> Result<Option<EntitySnapshot>, AdapterError> {
        self.adapter.fetch_entity_by_id(&self.scope, id, &options).await
    }

    /// Consume the context into the run's final output.
    pub(crate) fn into_run_output(self, steps: Vec<StepResult>) -> RunOutput {
        RunOutput {
            steps,
            output: self.out,
            state: self.state,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::MemoryAdapter;

    fn test_context() -> ExecutionContext {
        let entity = EntitySnapshot::new("cust-1", "customer")
            .with_dynamic("price", serde_json::json!(10));
        ExecutionContext::new(
            "pb-test",
            entity,
            Actor::new("user-1", "manager"),
            "org-1",
            Arc::new(MemoryAdapter::new()),
        )
    }

    #[test]
    fn test_state_seeded_with_playbook_id() {
        let ctx = test_context();
        assert_eq!(
            ctx.get_state(STATE_PLAYBOOK_ID),
            Some(&serde_json::json!("pb-test"))
        );
    }

    #[test]
    fn test_get_dynamic_falls_back_to_snapshot() {
        let ctx = test_context();
        assert_eq!(ctx.get_dynamic("price"), Some(&serde_json::json!(10)));
        assert_eq!(ctx.get_dynamic("missing"), None);
    }

    #[tokio::test]
    async fn test_pending_value_wins_over_snapshot() {
        let mut ctx = test_context();
        ctx.set_dynamic("price", serde_json::json!(20)).await.unwrap();

        assert_eq!(ctx.get_dynamic("price"), Some(&serde_json::json!(20)));
        assert_eq!(ctx.out.dynamic_fields.len(), 1);
        assert_eq!(
            ctx.out.dynamic_fields[0].smart_code.as_str(),
            "HERA.CUSTOMER.DYN.PRICE.v1"
        );
    }

    #[tokio::test]
    async fn test_get_dynamic_is_idempotent() {
        let ctx = test_context();
        let first = ctx.get_dynamic("price").cloned();
        let second = ctx.get_dynamic("price").cloned();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_repeated_set_dynamic_appends() {
        let mut ctx = test_context();
        ctx.set_dynamic("price", serde_json::json!(20)).await.unwrap();
        ctx.set_dynamic("price", serde_json::json!(30)).await.unwrap();

        // Both writes stay in the buffer; the overlay reflects the latest.
        assert_eq!(ctx.out.dynamic_fields.len(), 2);
        assert_eq!(ctx.get_dynamic("price"), Some(&serde_json::json!(30)));
    }

    #[tokio::test]
    async fn test_link_defaults() {
        let mut ctx = test_context();
        ctx.link("OWNS", "entity-123").await.unwrap();

        let write = &ctx.out.relationships[0];
        assert_eq!(write.from, "cust-1");
        assert_eq!(write.to, "entity-123");
        assert_eq!(write.smart_code.as_str(), "HERA.CUSTOMER.REL.OWNS.v1");
    }

    #[tokio::test]
    async fn test_set_dynamic_with_explicit_options() {
        let mut ctx = test_context();
        ctx.set_dynamic_with(
            "loyalty_points",
            serde_json::json!(250),
            SetDynamicOptions {
                field_type: Some("number".to_string()),
                smart_code: Some(SmartCode::new("HERA.CRM.LOYALTY.POINTS.v2")),
            },
        )
        .await
        .unwrap();

        let write = &ctx.out.dynamic_fields[0];
        assert_eq!(write.field_type, "number");
        assert_eq!(write.smart_code.as_str(), "HERA.CRM.LOYALTY.POINTS.v2");
    }

    #[test]
    fn test_set_header() {
        let mut ctx = test_context();
        ctx.set_header("entity_name", serde_json::json!("Acme Corp"));
        assert_eq!(ctx.out.headers["entity_name"], serde_json::json!("Acme Corp"));
    }
}
