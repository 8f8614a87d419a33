//! HERA Playbooks
//!
//! Executes ordered, side-effecting business workflows ("playbooks") against
//! HERA entities.
//!
//! This crate provides:
//! - Execution context with staged dynamic-field and relationship writes
//! - Step and playbook contracts with a fail-fast sequential executor
//! - A pluggable `Adapter` boundary for persistence, auditing, and lookups
//! - Smart-code synthesis for staged writes
//! - An in-memory adapter for tests and embedding

pub mod adapter;
pub mod adapters;
pub mod context;
pub mod entity;
pub mod error;
pub mod executor;
pub mod out;
pub mod playbook;
pub mod registry;
pub mod result;
pub mod smart_code;
pub mod step;

pub use adapter::{Adapter, FetchOptions, RunScope, TxFn};
pub use adapters::memory::MemoryAdapter;
pub use context::{ExecutionContext, LinkOptions, SetDynamicOptions};
pub use entity::{Actor, DynamicField, EntitySnapshot};
pub use error::AdapterError;
pub use executor::{execute_playbook, RunOptions};
pub use out::{DynamicWrite, OutBuffer, RelationshipWrite};
pub use playbook::Playbook;
pub use registry::{PlaybookRegistry, UnknownPlaybook};
pub use result::{Outcome, RunOutput, StepResult};
pub use smart_code::SmartCode;
pub use step::{FnStep, Step, StepFuture};
