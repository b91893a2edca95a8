//! Saved slice definitions.
//!
//! # Responsibility
//! - Define the persisted shape of a saved, named query.
//!
//! # Invariants
//! - `dsl` is interpreted by the query compiler; a slice never stores a
//!   compiled predicate.
//! - `scope` restricts evaluation to the whole outline or one subtree.

use crate::model::node::NodeId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for saved slices.
pub type SliceId = Uuid;

/// Evaluation scope for a slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SliceScope {
    /// Every node in the outline.
    Global,
    /// Proper descendants of one root node.
    Subtree { root: NodeId },
}

/// Sort direction for slice output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDir {
    Asc,
    Desc,
}

/// Sort request over one output column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SliceSort {
    /// Column name: `title`, `path`, `type`, `status` or `prop.<key>`.
    pub by: String,
    pub dir: SortDir,
}

/// Saved, named query over the outline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slice {
    /// Stable slice ID.
    pub id: SliceId,
    /// User-facing name.
    pub name: String,
    /// Evaluation scope.
    pub scope: SliceScope,
    /// Filter string compiled by the query layer.
    pub dsl: String,
    /// Ordered output column list.
    pub columns: Vec<String>,
    /// Optional sort request.
    pub sort: Option<SliceSort>,
    /// Optional grouping column.
    pub group_by: Option<String>,
    /// Optional view node that displays this slice.
    pub display_node: Option<NodeId>,
}

/// Input shape for saving a slice; `id = None` creates a new one.
#[derive(Debug, Clone, PartialEq)]
pub struct SliceDraft {
    pub id: Option<SliceId>,
    pub name: String,
    pub scope: SliceScope,
    pub dsl: String,
    pub columns: Vec<String>,
    pub sort: Option<SliceSort>,
    pub group_by: Option<String>,
    pub display_node: Option<NodeId>,
}

impl SliceDraft {
    /// Materializes the draft into a slice record under `id`.
    pub fn into_slice(self, id: SliceId) -> Slice {
        Slice {
            id,
            name: self.name,
            scope: self.scope,
            dsl: self.dsl,
            columns: self.columns,
            sort: self.sort,
            group_by: self.group_by,
            display_node: self.display_node,
        }
    }
}

impl Default for SliceDraft {
    fn default() -> Self {
        Self {
            id: None,
            name: String::new(),
            scope: SliceScope::Global,
            dsl: String::new(),
            columns: Vec::new(),
            sort: None,
            group_by: None,
            display_node: None,
        }
    }
}
