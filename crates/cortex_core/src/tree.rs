//! Structural tree mutator.
//!
//! # Responsibility
//! - Relocate nodes (move/indent/outdent/refile) while preserving tree
//!   invariants.
//! - Flip todo status through the reserved `status` property.
//!
//! # Invariants
//! - A move never creates a cycle; rejected moves leave the tree unchanged.
//! - `level` is recomputed for a moved node and all its descendants.
//! - Boundary operations with no valid target are silent no-ops, not errors.

use crate::model::node::{NodeId, NodeType};
use crate::model::prop::{PropValue, ANCHOR_KEY, STATUS_KEY};
use crate::path::PathError;
use crate::store::{Outline, StoreError};
use log::debug;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Result type used by structural mutations.
pub type TreeResult<T> = Result<T, TreeError>;

/// Errors from structural tree mutations.
#[derive(Debug)]
pub enum TreeError {
    /// Operation references a node ID that does not exist.
    NodeNotFound(NodeId),
    /// Move target is the node itself or one of its descendants.
    Cycle { node: NodeId, target: NodeId },
    /// Target path is invalid.
    Path(PathError),
    /// Store-level failure.
    Store(StoreError),
}

impl Display for TreeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NodeNotFound(id) => write!(f, "node not found: {id}"),
            Self::Cycle { node, target } => {
                write!(f, "move would create cycle: node {node} under {target}")
            }
            Self::Path(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for TreeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Path(err) => Some(err),
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StoreError> for TreeError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NodeNotFound(id) => Self::NodeNotFound(id),
            other => Self::Store(other),
        }
    }
}

impl From<PathError> for TreeError {
    fn from(value: PathError) -> Self {
        Self::Path(value)
    }
}

/// How a refile treats the node's tree position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefileMode {
    /// Resolve/create the target path and move the node under it.
    Move,
    /// Leave the tree untouched; record the path as an `_anchor` property.
    Anchor,
}

impl Outline {
    /// Moves a node under a new parent at an optional sibling index.
    ///
    /// The index is clamped; omitted means append. `level` is recomputed for
    /// the node and all descendants.
    ///
    /// # Errors
    /// - `NodeNotFound` when the node or target parent is missing.
    /// - `Cycle` when the target is the node itself or a descendant; the
    ///   tree is left unchanged.
    pub fn move_node(
        &mut self,
        id: NodeId,
        new_parent: Option<NodeId>,
        index: Option<usize>,
    ) -> TreeResult<()> {
        let old_parent = self.require_node(id)?.parent_id;

        if let Some(target) = new_parent {
            self.require_node(target)?;
            if self.is_self_or_descendant(id, target) {
                return Err(TreeError::Cycle { node: id, target });
            }
        }

        self.detach_from_sibling_list(old_parent, id);
        if let Some(node) = self.node_mut(id) {
            node.parent_id = new_parent;
        }
        self.attach_to_sibling_list(new_parent, id, index);
        self.recompute_levels(id);
        self.touch(id);
        debug!("event=move_node module=tree status=ok node={id}");
        Ok(())
    }

    /// Makes a node the last child of its immediate previous sibling.
    ///
    /// No-op when the node has no previous sibling.
    pub fn indent(&mut self, id: NodeId) -> TreeResult<()> {
        let parent_id = self.require_node(id)?.parent_id;
        let siblings = self.children(parent_id);
        let position = siblings.iter().position(|&sibling| sibling == id);
        let new_parent = match position {
            Some(index) if index > 0 => siblings[index - 1],
            _ => return Ok(()),
        };
        self.move_node(id, Some(new_parent), None)
    }

    /// Moves a node up one level, placed right after its former parent.
    ///
    /// No-op when the node is already at top level.
    pub fn outdent(&mut self, id: NodeId) -> TreeResult<()> {
        let Some(parent_id) = self.require_node(id)?.parent_id else {
            return Ok(());
        };
        let grandparent = self.require_node(parent_id)?.parent_id;
        let parent_position = self
            .children(grandparent)
            .iter()
            .position(|&sibling| sibling == parent_id);
        let index = parent_position.map(|position| position + 1);
        self.move_node(id, grandparent, index)
    }

    /// Refiles a node toward a target path.
    ///
    /// `Move` resolves/creates the path, then moves the node under it with
    /// the usual cycle guard. `Anchor` leaves the tree position untouched
    /// and upserts the reserved `_anchor` property holding the path — a soft
    /// reference that never drives structure.
    pub fn refile(&mut self, id: NodeId, target_path: &str, mode: RefileMode) -> TreeResult<()> {
        self.require_node(id)?;
        match mode {
            RefileMode::Move => {
                let target = self.ensure_path(target_path)?;
                self.move_node(id, Some(target), None)
            }
            RefileMode::Anchor => {
                self.upsert_property(
                    id,
                    ANCHOR_KEY,
                    PropValue::String(target_path.to_string()),
                )?;
                self.touch(id);
                Ok(())
            }
        }
    }

    /// Returns the anchor path recorded on a node, if any.
    pub fn anchor_path(&self, id: NodeId) -> Option<&str> {
        self.prop_value(id, ANCHOR_KEY).and_then(PropValue::as_str)
    }

    /// Removes the anchor reference from a node.
    ///
    /// # Errors
    /// - `NodeNotFound` when the node is missing.
    pub fn remove_anchor(&mut self, id: NodeId) -> TreeResult<()> {
        self.remove_property(id, ANCHOR_KEY)?;
        self.touch(id);
        Ok(())
    }

    /// Flips the `status` property of a todo node between `todo` and `done`.
    ///
    /// A missing status counts as `todo`, so the first toggle marks the node
    /// done. Non-todo nodes are a silent no-op.
    ///
    /// # Errors
    /// - `NodeNotFound` when the node is missing.
    pub fn toggle_todo(&mut self, id: NodeId) -> TreeResult<()> {
        if self.require_node(id)?.kind != NodeType::Todo {
            return Ok(());
        }
        let next = match self.prop_value(id, STATUS_KEY).and_then(PropValue::as_str) {
            Some("done") => "todo",
            _ => "done",
        };
        self.upsert_property(id, STATUS_KEY, PropValue::String(next.to_string()))?;
        self.touch(id);
        Ok(())
    }
}
