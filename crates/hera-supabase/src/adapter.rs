//! Adapter implementation over Supabase RPC functions.
//!
//! Staged writes are intent-only during a run; `persist` forwards the full
//! accumulated buffer to `hera_entity_upsert_v1` in one call. The server-side
//! upserts are keyed by (entity, field name) and (type, from, to), so
//! re-flushing the same buffer is idempotent.

use async_trait::async_trait;
use chrono::Utc;

use hera_playbooks::{
    Adapter, AdapterError, DynamicWrite, EntitySnapshot, FetchOptions, OutBuffer,
    RelationshipWrite, RunScope, TxFn,
};

use crate::client::RpcClient;
use crate::config::SupabaseConfig;

const RPC_ENTITY_UPSERT: &str = "hera_entity_upsert_v1";
const RPC_ENTITIES_CRUD: &str = "hera_entities_crud_v1";
const RPC_AUDIT_EVENT: &str = "hera_audit_event_v1";

/// Adapter forwarding playbook side effects to Supabase RPC functions.
pub struct SupabaseAdapter {
    client: RpcClient,
}

impl SupabaseAdapter {
    /// Create an adapter from a configuration.
    pub fn new(config: &SupabaseConfig) -> Self {
        Self {
            client: RpcClient::new(config),
        }
    }

    /// Create an adapter from environment variables.
    pub fn from_env() -> Result<Self, AdapterError> {
        Ok(Self::new(&SupabaseConfig::from_env()?))
    }
}

#[async_trait]
impl Adapter for SupabaseAdapter {
    async fn set_dynamic(
        &self,
        scope: &RunScope,
        write: &DynamicWrite,
    ) -> Result<(), AdapterError> {
        // Intent only; the staged buffer reaches storage at persist time.
        tracing::trace!(
            run_id = %scope.run_id,
            field = %write.name,
            smart_code = %write.smart_code,
            "Dynamic-field write staged"
        );
        Ok(())
    }

    async fn link(
        &self,
        scope: &RunScope,
        write: &RelationshipWrite,
    ) -> Result<(), AdapterError> {
        tracing::trace!(
            run_id = %scope.run_id,
            rel_type = %write.rel_type,
            to = %write.to,
            "Relationship write staged"
        );
        Ok(())
    }

    async fn persist(&self, scope: &RunScope, out: &OutBuffer) -> Result<(), AdapterError> {
        let args = serde_json::json!({
            "p_organization_id": scope.organization_id,
            "p_entity_id": scope.entity_id,
            "p_entity_type": scope.entity_type,
            "p_actor_id": scope.actor.id,
            "p_actor_role": scope.actor.role,
            "p_headers": out.headers,
            "p_dynamic_fields": out.dynamic_fields,
            "p_relationships": out.relationships,
        });

        self.client.call(RPC_ENTITY_UPSERT, &args).await?;

        tracing::debug!(
            run_id = %scope.run_id,
            entity_id = %scope.entity_id,
            staged = out.staged_count(),
            "Buffer persisted"
        );

        Ok(())
    }

    async fn audit(
        &self,
        scope: &RunScope,
        event: &str,
        payload: serde_json::Value,
    ) -> Result<(), AdapterError> {
        let args = serde_json::json!({
            "p_organization_id": scope.organization_id,
            "p_actor_id": scope.actor.id,
            "p_event": event,
            "p_payload": payload,
            "p_run_id": scope.run_id,
            "p_occurred_at": Utc::now(),
        });

        self.client
            .call_with_retry(RPC_AUDIT_EVENT, &args)
            .await
            .map_err(|e| AdapterError::Audit(e.to_string()))?;

        Ok(())
    }

    async fn tx(&self, f: TxFn) -> Result<serde_json::Value, AdapterError> {
        // PostgREST has no client-side transaction primitive; each RPC call
        // is atomic on the server, so the closure runs inline.
        f().await
    }

    async fn fetch_entity_by_id(
        &self,
        scope: &RunScope,
        id: &str,
        options: &FetchOptions,
    ) -> Result<Option<EntitySnapshot>, AdapterError> {
        let args = serde_json::json!({
            "p_action": "read",
            "p_organization_id": scope.organization_id,
            "p_entity_id": id,
            "p_include_dynamic": options.include_dynamic,
        });

        let value = self.client.call(RPC_ENTITIES_CRUD, &args).await?;
        if value.is_null() {
            return Ok(None);
        }

        let entity: EntitySnapshot = serde_json::from_value(value)?;
        Ok(Some(entity))
    }
}
