//! Step contract.

use async_trait::async_trait;
use futures::future::BoxFuture;

use crate::context::ExecutionContext;
use crate::result::StepResult;

/// A single unit of work in a playbook.
///
/// Steps execute strictly in playbook order against the shared mutable
/// context. A step reports a business-rule failure by returning an `Ok`
/// result with a failed outcome; returning `Err` models an unexpected
/// exception, which the executor catches and wraps.
#[async_trait]
pub trait Step: Send + Sync {
    /// Step identifier, used in results and audit events.
    fn id(&self) -> &str;

    /// Execute the step against the shared context.
    async fn run(&self, ctx: &mut ExecutionContext) -> anyhow::Result<StepResult>;
}

/// The future type a [`FnStep`] closure must return.
pub type StepFuture<'a> = BoxFuture<'a, anyhow::Result<StepResult>>;

/// A step backed by a function.
///
/// Most convenient with a free function returning a boxed future:
///
/// ```ignore
/// fn stage_tier(ctx: &mut ExecutionContext) -> StepFuture<'_> {
///     Box::pin(async move {
///         ctx.set_dynamic("vip_tier", serde_json::json!("gold")).await?;
///         Ok(StepResult::succeeded("field", "stage:vip_tier"))
///     })
/// }
///
/// let step = FnStep::new("stage:vip_tier", stage_tier);
/// ```
pub struct FnStep {
    id: String,
    f: Box<dyn for<'a> Fn(&'a mut ExecutionContext) -> StepFuture<'a> + Send + Sync>,
}

impl FnStep {
    /// Create a step from a function.
    pub fn new<F>(id: impl Into<String>, f: F) -> Self
    where
        F: for<'a> Fn(&'a mut ExecutionContext) -> StepFuture<'a> + Send + Sync + 'static,
    {
        Self {
            id: id.into(),
            f: Box::new(f),
        }
    }
}

#[async_trait]
impl Step for FnStep {
    fn id(&self) -> &str {
        &self.id
    }

    async fn run(&self, ctx: &mut ExecutionContext) -> anyhow::Result<StepResult> {
        (self.f)(ctx).await
    }
}

impl std::fmt::Debug for FnStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnStep").field("id", &self.id).finish()
    }
}
