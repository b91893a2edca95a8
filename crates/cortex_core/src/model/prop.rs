//! Typed node properties.
//!
//! # Responsibility
//! - Define the typed key/value attribute record attached to nodes.
//! - Name the reserved keys shared by mutator, query and agenda layers.
//!
//! # Invariants
//! - `(node_id, key)` uniquely identifies a property; writes are upserts.
//! - `key` is the normalized slug of `label`.
//! - The value is a tagged union; the kind is always recoverable from it.

use crate::model::node::NodeId;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for node properties.
pub type PropId = Uuid;

/// Reserved key flipped by todo toggling and read by agenda heuristics.
pub const STATUS_KEY: &str = "status";
/// Reserved key holding a soft path reference written by anchor refiling.
///
/// Anchors never drive structure and never bypass cycle checks.
pub const ANCHOR_KEY: &str = "_anchor";
/// Reserved datetime key consulted by readiness checks.
pub const SCHEDULED_KEY: &str = "scheduled_at";
/// Reserved datetime key consulted by priority scoring.
pub const DUE_KEY: &str = "due_at";

/// Property value categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropKind {
    String,
    Number,
    Boolean,
    Date,
    Datetime,
    Taglist,
    Json,
}

/// Typed property value, one variant per kind.
///
/// Serialized with an explicit `kind` tag so the persisted record carries
/// both discriminant and payload in one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum PropValue {
    String(String),
    Number(f64),
    Boolean(bool),
    Date(NaiveDate),
    Datetime(NaiveDateTime),
    Taglist(Vec<String>),
    Json(serde_json::Value),
}

impl PropValue {
    /// Returns the kind discriminant for this value.
    pub fn kind(&self) -> PropKind {
        match self {
            Self::String(_) => PropKind::String,
            Self::Number(_) => PropKind::Number,
            Self::Boolean(_) => PropKind::Boolean,
            Self::Date(_) => PropKind::Date,
            Self::Datetime(_) => PropKind::Datetime,
            Self::Taglist(_) => PropKind::Taglist,
            Self::Json(_) => PropKind::Json,
        }
    }

    /// Returns the string payload for `String` values.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value.as_str()),
            _ => None,
        }
    }

    /// Renders the display/grouping string form of this value.
    pub fn display_string(&self) -> String {
        match self {
            Self::String(value) => value.clone(),
            Self::Number(value) => value.to_string(),
            Self::Boolean(value) => value.to_string(),
            Self::Date(value) => value.format("%Y-%m-%d").to_string(),
            Self::Datetime(value) => value.format("%Y-%m-%dT%H:%M:%S").to_string(),
            Self::Taglist(values) => values.join(","),
            Self::Json(value) => value.to_string(),
        }
    }
}

/// Typed key/value attribute attached to one node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    /// Stable property ID.
    pub id: PropId,
    /// Owning node ID.
    pub node_id: NodeId,
    /// Normalized slug key, unique per node.
    pub key: String,
    /// Original display form of the key.
    pub label: String,
    /// Typed value; the kind is implied by the variant.
    pub value: PropValue,
}

impl Property {
    /// Returns the kind discriminant of the stored value.
    pub fn kind(&self) -> PropKind {
        self.value.kind()
    }
}
