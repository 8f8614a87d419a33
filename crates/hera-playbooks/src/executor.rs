//! Playbook executor.
//!
//! Drives the ordered step list against a freshly constructed execution
//! context: fail-fast on the first failed result, wrap raised step errors
//! into synthetic results, and always attempt one best-effort final flush of
//! the staged buffer. The executor never raises; every failure signal is
//! carried in-band in the returned step results.

use std::sync::Arc;

use crate::adapter::Adapter;
use crate::context::ExecutionContext;
use crate::entity::{Actor, EntitySnapshot};
use crate::playbook::Playbook;
use crate::result::{RunOutput, StepResult};

/// Per-run options: invoking principal, tenant scope, and the injected
/// adapter.
#[derive(Clone)]
pub struct RunOptions {
    /// ID of the invoking principal.
    pub actor_id: String,

    /// Role of the invoking principal.
    pub actor_role: String,

    /// Tenant/organization scope for every read and write in the run.
    pub organization_id: String,

    /// Persistence/audit boundary for the run.
    pub adapter: Arc<dyn Adapter>,
}

/// Execute a playbook against an entity snapshot.
///
/// Returns normally in every case; callers inspect the returned step results
/// for the first failed entry to learn how far the run progressed.
pub async fn execute_playbook(
    playbook: &Playbook,
    entity: EntitySnapshot,
    opts: RunOptions,
) -> RunOutput {
    let actor = Actor::new(opts.actor_id, opts.actor_role);
    let mut ctx = ExecutionContext::new(
        &playbook.id,
        entity,
        actor,
        opts.organization_id,
        opts.adapter,
    );

    ctx.log(
        "playbook.started",
        serde_json::json!({
            "playbook_id": playbook.id,
            "entity_id": ctx.entity().id,
            "step_count": playbook.len(),
        }),
    )
    .await;

    let mut results: Vec<StepResult> = Vec::with_capacity(playbook.len());

    for step in playbook.steps() {
        tracing::debug!(
            playbook_id = %playbook.id,
            step_id = step.id(),
            "Executing step"
        );

        let result = match step.run(&mut ctx).await {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(
                    playbook_id = %playbook.id,
                    step_id = step.id(),
                    error = %e,
                    "Step raised an error"
                );
                StepResult::exception(&e)
            }
        };

        let failed = result.is_failure();
        if failed {
            ctx.log(
                "step.failed",
                serde_json::json!({
                    "step_id": step.id(),
                    "message": result.message(),
                }),
            )
            .await;
        } else {
            ctx.log(
                "step.completed",
                serde_json::json!({"step_id": step.id()}),
            )
            .await;
        }

        results.push(result);

        if failed {
            // Fail fast: remaining steps never execute.
            break;
        }
    }

    // Best-effort final flush, even when the run aborted partway through.
    if !ctx.out.is_empty() {
        if let Err(e) = ctx.persist().await {
            tracing::error!(
                playbook_id = %playbook.id,
                error = %e,
                "Final persist failed"
            );
            results.push(StepResult::persist_failed(e.to_string()));
        }
    }

    let succeeded = results.iter().all(|r| r.is_success());
    ctx.log(
        "playbook.completed",
        serde_json::json!({
            "playbook_id": playbook.id,
            "succeeded": succeeded,
            "steps": results.len(),
        }),
    )
    .await;

    tracing::info!(
        playbook_id = %playbook.id,
        succeeded,
        steps = results.len(),
        "Playbook run finished"
    );

    ctx.into_run_output(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::MemoryAdapter;
    use crate::context::STATE_PLAYBOOK_ID;
    use crate::step::Step;
    use async_trait::async_trait;

    /// Stages a dynamic-field write and succeeds.
    struct StageField {
        id: &'static str,
        name: &'static str,
        value: serde_json::Value,
    }

    #[async_trait]
    impl Step for StageField {
        fn id(&self) -> &str {
            self.id
        }

        async fn run(&self, ctx: &mut ExecutionContext) -> anyhow::Result<StepResult> {
            ctx.set_dynamic(self.name, self.value.clone()).await?;
            Ok(StepResult::succeeded("field", self.id))
        }
    }

    /// Copies the current value of a dynamic field into run state.
    struct ReadField {
        id: &'static str,
        name: &'static str,
        state_key: &'static str,
    }

    #[async_trait]
    impl Step for ReadField {
        fn id(&self) -> &str {
            self.id
        }

        async fn run(&self, ctx: &mut ExecutionContext) -> anyhow::Result<StepResult> {
            let value = ctx
                .get_dynamic(self.name)
                .cloned()
                .unwrap_or(serde_json::Value::Null);
            ctx.set_state(self.state_key, value);
            Ok(StepResult::succeeded("field", self.id))
        }
    }

    /// Reports a business-rule failure.
    struct FailStep {
        id: &'static str,
        message: &'static str,
    }

    #[async_trait]
    impl Step for FailStep {
        fn id(&self) -> &str {
            self.id
        }

        async fn run(&self, _ctx: &mut ExecutionContext) -> anyhow::Result<StepResult> {
            Ok(StepResult::failed("post", self.id, self.message))
        }
    }

    /// Raises an error instead of returning a result.
    struct ThrowStep {
        message: &'static str,
    }

    #[async_trait]
    impl Step for ThrowStep {
        fn id(&self) -> &str {
            "throw"
        }

        async fn run(&self, _ctx: &mut ExecutionContext) -> anyhow::Result<StepResult> {
            anyhow::bail!("{}", self.message)
        }
    }

    /// Stages a relationship write, then raises.
    struct LinkThenThrow;

    #[async_trait]
    impl Step for LinkThenThrow {
        fn id(&self) -> &str {
            "link-then-throw"
        }

        async fn run(&self, ctx: &mut ExecutionContext) -> anyhow::Result<StepResult> {
            ctx.link("OWNS", "entity-123").await?;
            anyhow::bail!("storage exploded")
        }
    }

    fn opts(adapter: Arc<MemoryAdapter>) -> RunOptions {
        RunOptions {
            actor_id: "user-1".to_string(),
            actor_role: "manager".to_string(),
            organization_id: "org-1".to_string(),
            adapter,
        }
    }

    fn customer() -> EntitySnapshot {
        EntitySnapshot::new("cust-1", "customer").with_dynamic("price", serde_json::json!(10))
    }

    #[tokio::test]
    async fn test_results_preserve_step_order() {
        let playbook = Playbook::new("pb", "customer")
            .step(StageField { id: "s1", name: "a", value: serde_json::json!(1) })
            .step(StageField { id: "s2", name: "b", value: serde_json::json!(2) })
            .step(StageField { id: "s3", name: "c", value: serde_json::json!(3) });

        let adapter = Arc::new(MemoryAdapter::new());
        let output = execute_playbook(&playbook, customer(), opts(adapter)).await;

        assert!(output.succeeded());
        let ids: Vec<&str> = output.steps.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["s1", "s2", "s3"]);
    }

    #[tokio::test]
    async fn test_earlier_mutations_visible_to_later_steps() {
        let playbook = Playbook::new("pb", "customer")
            .step(StageField { id: "s1", name: "price", value: serde_json::json!(20) })
            .step(ReadField { id: "s2", name: "price", state_key: "observed_price" });

        let adapter = Arc::new(MemoryAdapter::new());
        let output = execute_playbook(&playbook, customer(), opts(adapter)).await;

        // The pending value staged by s1 wins over the snapshot's 10.
        assert_eq!(output.state["observed_price"], serde_json::json!(20));
    }

    #[tokio::test]
    async fn test_fail_fast_skips_remaining_steps() {
        let playbook = Playbook::new("pb", "customer")
            .step(StageField { id: "s1", name: "a", value: serde_json::json!(1) })
            .step(FailStep { id: "s2", message: "limit exceeded" })
            .step(StageField { id: "s3", name: "never", value: serde_json::json!(true) });

        let adapter = Arc::new(MemoryAdapter::new());
        let output = execute_playbook(&playbook, customer(), opts(adapter.clone())).await;

        let ids: Vec<&str> = output.steps.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["s1", "s2"]);

        // s3 never ran, so its write was never staged.
        assert!(output.output.dynamic_fields.iter().all(|w| w.name != "never"));
        assert_eq!(output.first_failure().map(|r| r.id.as_str()), Some("s2"));
    }

    #[tokio::test]
    async fn test_raised_error_is_wrapped_not_rethrown() {
        let playbook = Playbook::new("pb", "customer").step(ThrowStep { message: "boom" });

        let adapter = Arc::new(MemoryAdapter::new());
        let output = execute_playbook(&playbook, customer(), opts(adapter)).await;

        assert_eq!(output.steps.len(), 1);
        let result = &output.steps[0];
        assert_eq!(result.kind, "unknown");
        assert_eq!(result.id, "error");
        assert!(result.is_failure());
        assert_eq!(result.message(), Some("boom"));
    }

    #[tokio::test]
    async fn test_final_flush_runs_after_abort() {
        let playbook = Playbook::new("pb", "customer")
            .step(StageField { id: "s1", name: "vip_tier", value: serde_json::json!("gold") })
            .step(FailStep { id: "s2", message: "nope" });

        let adapter = Arc::new(MemoryAdapter::new());
        let output = execute_playbook(&playbook, customer(), opts(adapter.clone())).await;

        assert!(!output.succeeded());
        assert_eq!(adapter.persist_count(), 1);
        let flushed = adapter.last_persisted().unwrap();
        assert_eq!(flushed.dynamic_fields.len(), 1);
        assert_eq!(flushed.dynamic_fields[0].name, "vip_tier");
    }

    #[tokio::test]
    async fn test_single_step_stages_and_flushes_once() {
        let playbook = Playbook::new("pb", "customer").step(StageField {
            id: "stage:vip_tier",
            name: "vip_tier",
            value: serde_json::json!("gold"),
        });

        let adapter = Arc::new(MemoryAdapter::new());
        let output = execute_playbook(&playbook, customer(), opts(adapter.clone())).await;

        assert!(output.succeeded());
        assert_eq!(output.output.dynamic_fields.len(), 1);
        let write = &output.output.dynamic_fields[0];
        assert_eq!(write.name, "vip_tier");
        assert_eq!(write.value, serde_json::json!("gold"));
        assert_eq!(write.field_type, "text");
        assert_eq!(write.smart_code.as_str(), "HERA.CUSTOMER.DYN.VIP_TIER.v1");

        // Only the final flush, no mid-run persist.
        assert_eq!(adapter.persist_count(), 1);
    }

    #[tokio::test]
    async fn test_empty_playbook_skips_persist() {
        let playbook = Playbook::new("pb-empty", "customer");

        let adapter = Arc::new(MemoryAdapter::new());
        let output = execute_playbook(&playbook, customer(), opts(adapter.clone())).await;

        assert!(output.steps.is_empty());
        assert!(output.output.is_empty());
        assert_eq!(output.state.len(), 1);
        assert_eq!(output.state[STATE_PLAYBOOK_ID], serde_json::json!("pb-empty"));
        assert_eq!(adapter.persist_count(), 0);
    }

    #[tokio::test]
    async fn test_staged_link_survives_raised_error() {
        let playbook = Playbook::new("pb", "customer").step(LinkThenThrow);

        let adapter = Arc::new(MemoryAdapter::new());
        let output = execute_playbook(&playbook, customer(), opts(adapter.clone())).await;

        assert_eq!(output.steps.len(), 1);
        assert!(output.steps[0].is_failure());

        // The relationship staged before the error still reaches the flush.
        assert_eq!(adapter.persist_count(), 1);
        let flushed = adapter.last_persisted().unwrap();
        assert_eq!(flushed.relationships.len(), 1);
        assert_eq!(flushed.relationships[0].to, "entity-123");
    }

    #[tokio::test]
    async fn test_persist_failure_appends_synthetic_result() {
        let playbook = Playbook::new("pb", "customer").step(StageField {
            id: "s1",
            name: "vip_tier",
            value: serde_json::json!("gold"),
        });

        let adapter = Arc::new(MemoryAdapter::new());
        adapter.fail_persist();
        let output = execute_playbook(&playbook, customer(), opts(adapter)).await;

        assert_eq!(output.steps.len(), 2);
        assert!(output.steps[0].is_success());
        let persist_result = &output.steps[1];
        assert_eq!(persist_result.kind, "post");
        assert_eq!(persist_result.id, "persist:final");
        assert!(persist_result.is_failure());
    }

    #[tokio::test]
    async fn test_lifecycle_audit_events() {
        let playbook = Playbook::new("pb", "customer").step(StageField {
            id: "s1",
            name: "a",
            value: serde_json::json!(1),
        });

        let adapter = Arc::new(MemoryAdapter::new());
        execute_playbook(&playbook, customer(), opts(adapter.clone())).await;

        let events: Vec<String> = adapter
            .audit_events()
            .iter()
            .map(|e| e.event.clone())
            .collect();
        assert_eq!(
            events,
            vec!["playbook.started", "step.completed", "playbook.completed"]
        );
    }
}
