//! Business-entity snapshot types.

use serde::{Deserialize, Serialize};

fn default_field_type() -> String {
    "text".to_string()
}

/// A dynamic field already attached to an entity when a run begins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DynamicField {
    /// Field name (e.g., "price", "vip_tier").
    pub name: String,

    /// Field value.
    pub value: serde_json::Value,

    /// Field type (e.g., "text", "number", "boolean").
    #[serde(rename = "type", default = "default_field_type")]
    pub field_type: String,

    /// Smart code tagging the field's business meaning.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub smart_code: Option<String>,
}

/// Immutable snapshot of the entity a run operates on.
///
/// The snapshot is read-only for the lifetime of a run; playbook steps stage
/// changes through the execution context rather than mutating it in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntitySnapshot {
    /// Entity ID.
    pub id: String,

    /// Entity type (e.g., "customer", "order").
    #[serde(rename = "type")]
    pub entity_type: String,

    /// Dynamic data attached to the entity at snapshot time.
    #[serde(default)]
    pub dynamic_data: Vec<DynamicField>,

    /// Fixed-schema payload of the entity row.
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl EntitySnapshot {
    /// Create a new snapshot with no dynamic data.
    pub fn new(id: impl Into<String>, entity_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            entity_type: entity_type.into(),
            dynamic_data: Vec::new(),
            payload: serde_json::Value::Null,
        }
    }

    /// Attach a dynamic field to the snapshot.
    pub fn with_dynamic(mut self, name: impl Into<String>, value: serde_json::Value) -> Self {
        self.dynamic_data.push(DynamicField {
            name: name.into(),
            value,
            field_type: default_field_type(),
            smart_code: None,
        });
        self
    }

    /// Set the fixed-schema payload.
    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }

    /// Look up a dynamic field value on the snapshot.
    pub fn dynamic_value(&self, name: &str) -> Option<&serde_json::Value> {
        self.dynamic_data.iter().find(|f| f.name == name).map(|f| &f.value)
    }
}

/// Identity of the principal invoking a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Actor {
    /// Actor ID (user or service identity).
    pub id: String,

    /// Actor role (e.g., "owner", "manager", "system").
    pub role: String,
}

impl Actor {
    /// Create a new actor identity.
    pub fn new(id: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role: role.into(),
        }
    }
}
