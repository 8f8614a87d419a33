//! The pluggable persistence/audit boundary.
//!
//! The executor never talks to storage directly; every side effect goes
//! through an [`Adapter`] injected per run. Adapter calls receive a
//! [`RunScope`] carrying run identity and tenant scope so implementations can
//! stamp every write with actor and organization.

use async_trait::async_trait;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

use crate::entity::{Actor, EntitySnapshot};
use crate::error::AdapterError;
use crate::out::{DynamicWrite, OutBuffer, RelationshipWrite};

/// Identity and scope of a run, passed to every adapter call.
#[derive(Debug, Clone, Serialize)]
pub struct RunScope {
    /// Unique run ID.
    pub run_id: uuid::Uuid,

    /// Playbook being executed.
    pub playbook_id: String,

    /// Tenant/organization scope. Propagated to every downstream read and
    /// write to preserve tenant isolation.
    pub organization_id: String,

    /// Invoking principal.
    pub actor: Actor,

    /// Target entity ID.
    pub entity_id: String,

    /// Target entity type.
    pub entity_type: String,
}

/// Options for entity lookups.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FetchOptions {
    /// Include the entity's dynamic data in the result.
    #[serde(default)]
    pub include_dynamic: bool,
}

/// A closure to run inside an adapter-owned transaction boundary.
pub type TxFn = Box<
    dyn FnOnce() -> BoxFuture<'static, Result<serde_json::Value, AdapterError>> + Send,
>;

/// Persistence, audit, and lookup boundary for playbook runs.
#[async_trait]
pub trait Adapter: Send + Sync {
    /// Acknowledge a staged dynamic-field write.
    ///
    /// Called once per `set_dynamic` during the run, with duplicates allowed;
    /// the last write for a name logically wins at persistence time. The
    /// staged buffer is flushed separately via [`Adapter::persist`], so
    /// implementations may treat this call as intent only.
    async fn set_dynamic(&self, scope: &RunScope, write: &DynamicWrite)
        -> Result<(), AdapterError>;

    /// Acknowledge a staged relationship write. Same append-many semantics
    /// as [`Adapter::set_dynamic`].
    async fn link(&self, scope: &RunScope, write: &RelationshipWrite)
        -> Result<(), AdapterError>;

    /// Atomically write the accumulated buffer.
    ///
    /// May be called more than once per run; every call receives the full
    /// buffer accumulated so far, never a delta, so implementations must be
    /// idempotent with respect to re-flushing.
    async fn persist(&self, scope: &RunScope, out: &OutBuffer) -> Result<(), AdapterError>;

    /// Record an audit event. Fire-and-forget from the run's perspective;
    /// failures are logged by the caller and never abort a step.
    async fn audit(
        &self,
        scope: &RunScope,
        event: &str,
        payload: serde_json::Value,
    ) -> Result<(), AdapterError>;

    /// Run a closure inside a transaction boundary owned by the adapter,
    /// which is responsible for atomicity and rollback.
    async fn tx(&self, f: TxFn) -> Result<serde_json::Value, AdapterError>;

    /// Fetch an entity by ID, scoped to the run's organization.
    ///
    /// Returns `None` when no entity with that ID exists in the organization.
    async fn fetch_entity_by_id(
        &self,
        scope: &RunScope,
        id: &str,
        options: &FetchOptions,
    ) -> Result<Option<EntitySnapshot>, AdapterError>;
}
