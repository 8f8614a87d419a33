//! Staged-write accumulation buffer.
//!
//! Everything a run intends to change is appended here in step order and
//! flushed through the adapter. Entries are never removed for the duration
//! of a run.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::smart_code::SmartCode;

/// A staged dynamic-field write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DynamicWrite {
    /// Field name.
    pub name: String,

    /// Field value.
    pub value: serde_json::Value,

    /// Field type (e.g., "text", "number").
    #[serde(rename = "type")]
    pub field_type: String,

    /// Smart code for the write.
    pub smart_code: SmartCode,
}

/// A staged relationship write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipWrite {
    /// Relationship type (e.g., "OWNS", "MEMBER_OF").
    #[serde(rename = "type")]
    pub rel_type: String,

    /// Source entity ID.
    pub from: String,

    /// Target entity ID.
    pub to: String,

    /// Smart code for the write.
    pub smart_code: SmartCode,
}

/// Append-only buffer of writes staged during a run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutBuffer {
    /// Top-level field overrides on the entity row itself.
    #[serde(default)]
    pub headers: HashMap<String, serde_json::Value>,

    /// Pending dynamic-field writes, in staging order.
    #[serde(default)]
    pub dynamic_fields: Vec<DynamicWrite>,

    /// Pending relationship writes, in staging order.
    #[serde(default)]
    pub relationships: Vec<RelationshipWrite>,
}

impl OutBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// True if nothing has been staged.
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty() && self.dynamic_fields.is_empty() && self.relationships.is_empty()
    }

    /// Total number of staged entries across all containers.
    pub fn staged_count(&self) -> usize {
        self.headers.len() + self.dynamic_fields.len() + self.relationships.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_buffer() {
        let out = OutBuffer::new();
        assert!(out.is_empty());
        assert_eq!(out.staged_count(), 0);
    }

    #[test]
    fn test_staged_count() {
        let mut out = OutBuffer::new();
        out.headers.insert("entity_name".to_string(), serde_json::json!("Acme"));
        out.dynamic_fields.push(DynamicWrite {
            name: "vip_tier".to_string(),
            value: serde_json::json!("gold"),
            field_type: "text".to_string(),
            smart_code: SmartCode::for_dynamic_field("customer", "vip_tier"),
        });

        assert!(!out.is_empty());
        assert_eq!(out.staged_count(), 2);
    }

    #[test]
    fn test_serialization_shape() {
        let mut out = OutBuffer::new();
        out.relationships.push(RelationshipWrite {
            rel_type: "OWNS".to_string(),
            from: "cust-1".to_string(),
            to: "order-9".to_string(),
            smart_code: SmartCode::for_relationship("customer", "OWNS"),
        });

        let json = serde_json::to_value(&out).unwrap();
        assert_eq!(json["relationships"][0]["type"], "OWNS");
        assert_eq!(json["relationships"][0]["smart_code"], "HERA.CUSTOMER.REL.OWNS.v1");
    }
}
