//! Built-in demo playbooks.
//!
//! This module provides two small workflows used for smoke-testing a HERA
//! backend and for dry runs:
//! - `customer.vip-upgrade` - promote a customer to the gold VIP tier
//! - `order.fulfillment-check` - validate an order and mark it ready

use async_trait::async_trait;
use chrono::Utc;

use hera_playbooks::{
    ExecutionContext, Playbook, PlaybookRegistry, SetDynamicOptions, Step, StepResult,
};

/// Fails the run when the customer already holds the gold tier.
struct EnsureNotAlreadyGold;

#[async_trait]
impl Step for EnsureNotAlreadyGold {
    fn id(&self) -> &str {
        "check:vip_tier"
    }

    async fn run(&self, ctx: &mut ExecutionContext) -> anyhow::Result<StepResult> {
        if ctx.get_dynamic("vip_tier") == Some(&serde_json::json!("gold")) {
            return Ok(StepResult::failed(
                "check",
                self.id(),
                "customer is already on the gold tier",
            ));
        }
        Ok(StepResult::succeeded("check", self.id()))
    }
}

/// Stages the tier upgrade and an upgrade timestamp.
struct StageGoldTier;

#[async_trait]
impl Step for StageGoldTier {
    fn id(&self) -> &str {
        "stage:vip_tier"
    }

    async fn run(&self, ctx: &mut ExecutionContext) -> anyhow::Result<StepResult> {
        let previous = ctx.get_dynamic("vip_tier").cloned();

        ctx.set_dynamic("vip_tier", serde_json::json!("gold")).await?;
        ctx.set_dynamic_with(
            "vip_upgraded_at",
            serde_json::json!(Utc::now().to_rfc3339()),
            SetDynamicOptions {
                field_type: Some("timestamp".to_string()),
                smart_code: None,
            },
        )
        .await?;

        ctx.log(
            "vip.upgraded",
            serde_json::json!({"previous_tier": previous}),
        )
        .await;

        Ok(StepResult::succeeded("field", self.id()))
    }
}

/// Links the customer to the gold loyalty program.
struct LinkLoyaltyProgram;

#[async_trait]
impl Step for LinkLoyaltyProgram {
    fn id(&self) -> &str {
        "link:loyalty_program"
    }

    async fn run(&self, ctx: &mut ExecutionContext) -> anyhow::Result<StepResult> {
        ctx.link("MEMBER_OF", "loyalty-program-gold").await?;
        Ok(StepResult::succeeded("relationship", self.id()))
    }
}

/// Rejects orders without a positive total.
struct CheckOrderTotal;

#[async_trait]
impl Step for CheckOrderTotal {
    fn id(&self) -> &str {
        "check:total"
    }

    async fn run(&self, ctx: &mut ExecutionContext) -> anyhow::Result<StepResult> {
        let total = match ctx.get_dynamic("total").and_then(|v| v.as_f64()) {
            Some(total) => total,
            None => {
                return Ok(StepResult::failed("check", self.id(), "order has no total"));
            }
        };

        if total <= 0.0 {
            return Ok(StepResult::failed(
                "check",
                self.id(),
                format!("order total must be positive, got {}", total),
            ));
        }

        ctx.set_state("checked_total", serde_json::json!(total));
        Ok(StepResult::succeeded("check", self.id()))
    }
}

/// Marks the order ready for fulfillment.
struct MarkOrderReady;

#[async_trait]
impl Step for MarkOrderReady {
    fn id(&self) -> &str {
        "stage:fulfillment_status"
    }

    async fn run(&self, ctx: &mut ExecutionContext) -> anyhow::Result<StepResult> {
        ctx.set_dynamic("fulfillment_status", serde_json::json!("ready")).await?;
        ctx.set_header("status", serde_json::json!("ready"));
        Ok(StepResult::succeeded("field", self.id()))
    }
}

/// Create a registry with all built-in demo playbooks registered.
pub fn create_demo_registry() -> PlaybookRegistry {
    let mut registry = PlaybookRegistry::new();

    registry.register(
        Playbook::new("customer.vip-upgrade", "customer")
            .step(EnsureNotAlreadyGold)
            .step(StageGoldTier)
            .step(LinkLoyaltyProgram),
    );

    registry.register(
        Playbook::new("order.fulfillment-check", "order")
            .step(CheckOrderTotal)
            .step(MarkOrderReady),
    );

    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use hera_playbooks::{EntitySnapshot, MemoryAdapter, RunOptions};
    use std::sync::Arc;

    fn opts() -> RunOptions {
        RunOptions {
            actor_id: "user-1".to_string(),
            actor_role: "manager".to_string(),
            organization_id: "org-1".to_string(),
            adapter: Arc::new(MemoryAdapter::new()),
        }
    }

    #[test]
    fn test_demo_registry_contents() {
        let registry = create_demo_registry();
        assert!(registry.has("customer.vip-upgrade"));
        assert!(registry.has("order.fulfillment-check"));
    }

    #[tokio::test]
    async fn test_vip_upgrade_stages_tier_and_link() {
        let registry = create_demo_registry();
        let entity = EntitySnapshot::new("cust-1", "customer")
            .with_dynamic("vip_tier", serde_json::json!("silver"));

        let output = registry
            .execute("customer.vip-upgrade", entity, opts())
            .await
            .unwrap();

        assert!(output.succeeded());
        assert!(output
            .output
            .dynamic_fields
            .iter()
            .any(|w| w.name == "vip_tier" && w.value == serde_json::json!("gold")));
        assert_eq!(output.output.relationships.len(), 1);
        assert_eq!(output.output.relationships[0].to, "loyalty-program-gold");
    }

    #[tokio::test]
    async fn test_vip_upgrade_rejects_gold_customers() {
        let registry = create_demo_registry();
        let entity = EntitySnapshot::new("cust-1", "customer")
            .with_dynamic("vip_tier", serde_json::json!("gold"));

        let output = registry
            .execute("customer.vip-upgrade", entity, opts())
            .await
            .unwrap();

        assert!(!output.succeeded());
        assert_eq!(output.steps.len(), 1);
        assert_eq!(
            output.first_failure().map(|r| r.id.as_str()),
            Some("check:vip_tier")
        );
        // Nothing was staged, so nothing to flush.
        assert!(output.output.is_empty());
    }

    #[tokio::test]
    async fn test_fulfillment_check_requires_total() {
        let registry = create_demo_registry();
        let entity = EntitySnapshot::new("order-1", "order");

        let output = registry
            .execute("order.fulfillment-check", entity, opts())
            .await
            .unwrap();

        assert!(!output.succeeded());
        assert_eq!(
            output.first_failure().and_then(|r| r.message()),
            Some("order has no total")
        );
    }

    #[tokio::test]
    async fn test_fulfillment_check_marks_ready() {
        let registry = create_demo_registry();
        let entity = EntitySnapshot::new("order-1", "order")
            .with_dynamic("total", serde_json::json!(42.5));

        let output = registry
            .execute("order.fulfillment-check", entity, opts())
            .await
            .unwrap();

        assert!(output.succeeded());
        assert_eq!(output.state["checked_total"], serde_json::json!(42.5));
        assert_eq!(output.output.headers["status"], serde_json::json!("ready"));
    }
}
