//! Node CRUD and children-index maintenance.
//!
//! # Responsibility
//! - Create, patch and delete nodes while keeping the ordered children index
//!   and the node records consistent.
//!
//! # Invariants
//! - Child listing is deterministic: index position is authoritative and
//!   `Node::sort` mirrors it.
//! - Deleting a node removes its whole subtree and every property attached
//!   to any deleted node; no orphans remain.
//! - Every node write stamps `updated_at`.

use super::{dedup_tags, Outline, StoreError, StoreResult};
use crate::model::node::{Node, NodeId, NodeType};
use chrono::Utc;

/// Partial update for one node.
///
/// Outer `None` leaves a field untouched; for clearable fields the inner
/// option distinguishes "set" from "clear".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodePatch {
    pub kind: Option<NodeType>,
    pub title: Option<Option<String>>,
    pub content: Option<Option<String>>,
    pub tags: Option<Vec<String>>,
}

impl Outline {
    /// Creates a node under `parent_id`, appended to sibling order.
    ///
    /// # Errors
    /// - `NodeNotFound` when `parent_id` references a missing node.
    pub fn add_node(
        &mut self,
        parent_id: Option<NodeId>,
        kind: NodeType,
        title: Option<String>,
        content: Option<String>,
    ) -> StoreResult<NodeId> {
        let level = match parent_id {
            Some(parent_id) => self.require_node(parent_id)?.level + 1,
            None => 1,
        };
        let sort = self.children(parent_id).len() as i64;
        let node = Node::new(parent_id, kind, title, content, level, sort);
        let id = node.id;
        self.nodes.insert(id, node);
        self.sibling_list_mut(parent_id).push(id);
        Ok(id)
    }

    /// Applies a partial update to one node and stamps `updated_at`.
    ///
    /// # Errors
    /// - `NodeNotFound` when `id` is missing.
    pub fn update_node(&mut self, id: NodeId, patch: NodePatch) -> StoreResult<()> {
        let node = self
            .nodes
            .get_mut(&id)
            .ok_or(StoreError::NodeNotFound(id))?;
        if let Some(kind) = patch.kind {
            node.kind = kind;
        }
        if let Some(title) = patch.title {
            node.title = title;
        }
        if let Some(content) = patch.content {
            node.content = content;
        }
        if let Some(tags) = patch.tags {
            node.tags = dedup_tags(tags);
        }
        node.updated_at = Utc::now();
        Ok(())
    }

    /// Deletes `id`, its whole subtree and every referencing property.
    ///
    /// Uses an explicit worklist so deep trees cannot exhaust the stack.
    ///
    /// # Errors
    /// - `NodeNotFound` when `id` is missing.
    pub fn remove_node(&mut self, id: NodeId) -> StoreResult<()> {
        let parent_id = self.require_node(id)?.parent_id;

        let mut worklist = vec![id];
        while let Some(current) = worklist.pop() {
            if let Some(kids) = self.children.remove(&current) {
                worklist.extend(kids);
            }
            if let Some(keys) = self.prop_index.remove(&current) {
                for prop_id in keys.values() {
                    self.props.remove(prop_id);
                }
            }
            self.nodes.remove(&current);
        }

        self.detach_from_sibling_list(parent_id, id);
        Ok(())
    }

    /// Returns the ordered child IDs under `parent_id` (`None` = top level).
    pub fn children(&self, parent_id: Option<NodeId>) -> &[NodeId] {
        match parent_id {
            Some(parent_id) => self
                .children
                .get(&parent_id)
                .map(Vec::as_slice)
                .unwrap_or(&[]),
            None => &self.root_order,
        }
    }

    /// Returns one node by ID.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// Returns whether `id` exists.
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Number of nodes in the outline.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns whether the outline holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterates all nodes in unspecified order.
    pub fn iter_nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Returns whether `candidate` is `ancestor` itself or lies below it.
    ///
    /// Walks parent links; bounded by tree depth.
    pub fn is_self_or_descendant(&self, ancestor: NodeId, candidate: NodeId) -> bool {
        let mut cursor = Some(candidate);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.nodes.get(&current).and_then(|node| node.parent_id);
        }
        false
    }

    pub(crate) fn require_node(&self, id: NodeId) -> StoreResult<&Node> {
        self.nodes.get(&id).ok_or(StoreError::NodeNotFound(id))
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    /// Stamps `updated_at` on one node, if present.
    pub(crate) fn touch(&mut self, id: NodeId) {
        if let Some(node) = self.nodes.get_mut(&id) {
            node.updated_at = Utc::now();
        }
    }

    pub(crate) fn sibling_list_mut(&mut self, parent_id: Option<NodeId>) -> &mut Vec<NodeId> {
        match parent_id {
            Some(parent_id) => self.children.entry(parent_id).or_default(),
            None => &mut self.root_order,
        }
    }

    /// Removes `id` from its sibling list and renumbers the remainder.
    pub(crate) fn detach_from_sibling_list(&mut self, parent_id: Option<NodeId>, id: NodeId) {
        let list = self.sibling_list_mut(parent_id);
        list.retain(|candidate| *candidate != id);
        self.renumber_siblings(parent_id);
    }

    /// Inserts `id` into a sibling list at a clamped index (append default)
    /// and renumbers the list.
    pub(crate) fn attach_to_sibling_list(
        &mut self,
        parent_id: Option<NodeId>,
        id: NodeId,
        index: Option<usize>,
    ) {
        let list = self.sibling_list_mut(parent_id);
        let position = index.unwrap_or(list.len()).min(list.len());
        list.insert(position, id);
        self.renumber_siblings(parent_id);
    }

    /// Reassigns contiguous `sort` values for one sibling list.
    pub(crate) fn renumber_siblings(&mut self, parent_id: Option<NodeId>) {
        let ordered: Vec<NodeId> = self.children(parent_id).to_vec();
        for (index, id) in ordered.into_iter().enumerate() {
            if let Some(node) = self.nodes.get_mut(&id) {
                node.sort = index as i64;
            }
        }
    }

    /// Recomputes `level` for `start` and all its descendants.
    pub(crate) fn recompute_levels(&mut self, start: NodeId) {
        let base = match self.nodes.get(&start) {
            Some(node) => match node.parent_id {
                Some(parent_id) => self
                    .nodes
                    .get(&parent_id)
                    .map(|parent| parent.level + 1)
                    .unwrap_or(1),
                None => 1,
            },
            None => return,
        };

        let mut worklist = vec![(start, base)];
        while let Some((id, level)) = worklist.pop() {
            if let Some(node) = self.nodes.get_mut(&id) {
                node.level = level;
            }
            if let Some(kids) = self.children.get(&id) {
                worklist.extend(kids.iter().map(|&kid| (kid, level + 1)));
            }
        }
    }
}
