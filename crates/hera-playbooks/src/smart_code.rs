//! Smart-code synthesis.
//!
//! Smart codes are structured string identifiers (e.g.
//! `HERA.CUSTOMER.DYN.VIP_TIER.v1`) that tag every field and relationship
//! with its business meaning and version. The executor treats them as opaque:
//! it only synthesizes defaults and passes explicit codes through.

use serde::{Deserialize, Serialize};

/// An opaque smart-code string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SmartCode(String);

impl SmartCode {
    /// Wrap an explicit smart code.
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Default smart code for a staged dynamic-field write:
    /// `HERA.<ENTITY_TYPE>.DYN.<FIELD_NAME>.v1`.
    pub fn for_dynamic_field(entity_type: &str, field_name: &str) -> Self {
        Self(format!("HERA.{}.DYN.{}.v1", segment(entity_type), segment(field_name)))
    }

    /// Default smart code for a staged relationship write:
    /// `HERA.<ENTITY_TYPE>.REL.<REL_TYPE>.v1`.
    pub fn for_relationship(entity_type: &str, rel_type: &str) -> Self {
        Self(format!("HERA.{}.REL.{}.v1", segment(entity_type), segment(rel_type)))
    }

    /// The smart code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SmartCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SmartCode {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for SmartCode {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Normalize a raw name into a smart-code segment: uppercased, with
/// whitespace and separators collapsed to underscores.
fn segment(raw: &str) -> String {
    raw.trim()
        .to_uppercase()
        .replace([' ', '-', '.', '/'], "_")
}
