//! Outline node record.
//!
//! # Responsibility
//! - Define the canonical tree node shared by store, mutator and query.
//!
//! # Invariants
//! - `id` is stable and never reused for another node.
//! - `level` is derived from parent links; the store recomputes it on every
//!   structural mutation.
//! - `sort` mirrors the node's position in its parent's ordered child list.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for outline nodes.
pub type NodeId = Uuid;

/// Outline node category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    /// Structural heading that groups children.
    Heading,
    /// Actionable item tracked through the `status` property.
    Todo,
    /// Free-form text body.
    Paragraph,
    /// Display node hosting a saved slice.
    View,
}

impl NodeType {
    /// Stable lowercase name used by the DSL and the persistence sink.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Heading => "heading",
            Self::Todo => "todo",
            Self::Paragraph => "paragraph",
            Self::View => "view",
        }
    }

    /// Parses the stable lowercase name back into a node type.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "heading" => Some(Self::Heading),
            "todo" => Some(Self::Todo),
            "paragraph" => Some(Self::Paragraph),
            "view" => Some(Self::View),
            _ => None,
        }
    }
}

/// Canonical outline tree node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Stable node ID used for linking, anchors and persistence.
    pub id: NodeId,
    /// Parent node ID. `None` means top-level node.
    pub parent_id: Option<NodeId>,
    /// Serialized as `type` to match the persisted schema naming.
    #[serde(rename = "type")]
    pub kind: NodeType,
    /// Display title. Titleless nodes are skipped by path building.
    pub title: Option<String>,
    /// Free-form body text.
    pub content: Option<String>,
    /// Tree depth; top-level nodes have level 1.
    pub level: u32,
    /// Sibling order key within one parent.
    pub sort: i64,
    /// Inline tags, case-sensitive, order-preserving.
    pub tags: Vec<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last write timestamp; stamped by every store mutation.
    pub updated_at: DateTime<Utc>,
}

impl Node {
    /// Creates a node with a generated stable ID.
    pub fn new(
        parent_id: Option<NodeId>,
        kind: NodeType,
        title: Option<String>,
        content: Option<String>,
        level: u32,
        sort: i64,
    ) -> Self {
        Self::with_id(Uuid::new_v4(), parent_id, kind, title, content, level, sort)
    }

    /// Creates a node with a caller-provided stable ID.
    ///
    /// Used by seed/bulk-load paths where identity already exists externally.
    #[allow(clippy::too_many_arguments)]
    pub fn with_id(
        id: NodeId,
        parent_id: Option<NodeId>,
        kind: NodeType,
        title: Option<String>,
        content: Option<String>,
        level: u32,
        sort: i64,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            parent_id,
            kind,
            title,
            content,
            level,
            sort,
            tags: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns whether `tag` is present, case-sensitive as stored.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|candidate| candidate == tag)
    }
}
