//! Step result and run output types.

use serde::ser::SerializeStruct;
use serde::Serialize;
use std::collections::HashMap;

use crate::out::OutBuffer;

/// Outcome of a single step, as a closed sum over the failure taxonomy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Step completed successfully.
    Success,

    /// Step completed and explicitly reported a business-rule failure.
    BusinessFailure {
        /// Human-readable failure explanation.
        message: String,
    },

    /// Step raised an unexpected error, caught at the executor boundary.
    ExceptionFailure {
        /// The error's top-level message.
        message: String,
        /// The rendered error chain.
        error: String,
    },

    /// The final best-effort persistence flush failed.
    PersistFailure {
        /// The adapter error message.
        message: String,
    },
}

impl Outcome {
    /// True for [`Outcome::Success`].
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success)
    }

    /// True for any failure variant.
    pub fn is_failure(&self) -> bool {
        !self.is_success()
    }

    /// Failure message, if any.
    pub fn message(&self) -> Option<&str> {
        match self {
            Outcome::Success => None,
            Outcome::BusinessFailure { message }
            | Outcome::ExceptionFailure { message, .. }
            | Outcome::PersistFailure { message } => Some(message),
        }
    }

    /// Rendered error chain for exception failures.
    pub fn error_detail(&self) -> Option<&str> {
        match self {
            Outcome::ExceptionFailure { error, .. } => Some(error),
            _ => None,
        }
    }
}

/// Result of one executed step, immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepResult {
    /// Result category tag (e.g., "post", "unknown").
    pub kind: String,

    /// Human-readable identifier for the step or sub-operation.
    pub id: String,

    /// The step's outcome.
    pub outcome: Outcome,
}

impl StepResult {
    /// Create a successful result.
    pub fn succeeded(kind: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            id: id.into(),
            outcome: Outcome::Success,
        }
    }

    /// Create a business-rule failure result.
    pub fn failed(
        kind: impl Into<String>,
        id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind: kind.into(),
            id: id.into(),
            outcome: Outcome::BusinessFailure {
                message: message.into(),
            },
        }
    }

    /// Wrap an error raised by a step into a synthetic failure result.
    pub(crate) fn exception(err: &anyhow::Error) -> Self {
        Self {
            kind: "unknown".to_string(),
            id: "error".to_string(),
            outcome: Outcome::ExceptionFailure {
                message: err.to_string(),
                error: format!("{:#}", err),
            },
        }
    }

    /// Synthetic result for a failed final persistence flush.
    pub(crate) fn persist_failed(message: impl Into<String>) -> Self {
        Self {
            kind: "post".to_string(),
            id: "persist:final".to_string(),
            outcome: Outcome::PersistFailure {
                message: message.into(),
            },
        }
    }

    /// True if the step succeeded.
    pub fn is_success(&self) -> bool {
        self.outcome.is_success()
    }

    /// True if the step failed in any way.
    pub fn is_failure(&self) -> bool {
        self.outcome.is_failure()
    }

    /// The serialized status tag: "succeeded" or "failed".
    pub fn status(&self) -> &'static str {
        if self.is_success() {
            "succeeded"
        } else {
            "failed"
        }
    }

    /// Failure message, if any.
    pub fn message(&self) -> Option<&str> {
        self.outcome.message()
    }
}

impl Serialize for StepResult {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut st = serializer.serialize_struct("StepResult", 5)?;
        st.serialize_field("kind", &self.kind)?;
        st.serialize_field("id", &self.id)?;
        st.serialize_field("status", self.status())?;
        match self.outcome.message() {
            Some(message) => st.serialize_field("message", message)?,
            None => st.skip_field("message")?,
        }
        match self.outcome.error_detail() {
            Some(error) => st.serialize_field("error", error)?,
            None => st.skip_field("error")?,
        }
        st.end()
    }
}

/// Everything a run produced, returned unconditionally to the caller.
#[derive(Debug, Serialize)]
pub struct RunOutput {
    /// Step results in execution order, including synthetic entries.
    pub steps: Vec<StepResult>,

    /// The accumulated staged-write buffer.
    pub output: OutBuffer,

    /// Final run-local state map.
    pub state: HashMap<String, serde_json::Value>,
}

impl RunOutput {
    /// True when every recorded result succeeded.
    pub fn succeeded(&self) -> bool {
        self.steps.iter().all(|r| r.is_success())
    }

    /// The first failed result, if any.
    pub fn first_failure(&self) -> Option<&StepResult> {
        self.steps.iter().find(|r| r.is_failure())
    }
}
