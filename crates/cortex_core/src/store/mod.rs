//! In-memory outline store.
//!
//! # Responsibility
//! - Own the canonical outline state: node arena, ordered children index,
//!   property records and saved slices.
//! - Provide the bulk-load boundary used by seeding and the snapshot sink.
//!
//! # Invariants
//! - The ordered children index is the source of truth for sibling order;
//!   `Node::sort` is renumbered contiguously whenever a sibling list changes.
//! - `level` is derived from parent links and recomputed on load and on every
//!   structural mutation.
//! - Mutations validate before the first write; no partial state is ever
//!   observable.

mod nodes;
mod props;
mod slices;

use crate::model::node::{Node, NodeId};
use crate::model::prop::{PropId, Property};
use crate::model::slice::{Slice, SliceId};
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub use nodes::NodePatch;
pub use props::normalize_key;

/// Result type used by store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors from outline store operations.
#[derive(Debug)]
pub enum StoreError {
    /// Operation references a node ID that does not exist.
    NodeNotFound(NodeId),
    /// Input or bundle data cannot be accepted as a valid outline.
    InvalidData(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NodeNotFound(id) => write!(f, "node not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid outline data: {message}"),
        }
    }
}

impl Error for StoreError {}

/// Bulk-load bundle accepted by [`Outline::from_bundle`].
///
/// This is the persisted record shape owned by the core; the storage
/// technology behind it is external.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeedBundle {
    pub nodes: Vec<Node>,
    pub properties: Vec<Property>,
    pub slice_definitions: Vec<Slice>,
}

/// Canonical in-memory outline state.
///
/// Passed by handle into every operation; there is no ambient global store.
/// A single `Outline` is the one writer authority over its tree.
#[derive(Debug, Default)]
pub struct Outline {
    pub(crate) nodes: HashMap<NodeId, Node>,
    pub(crate) children: HashMap<NodeId, Vec<NodeId>>,
    pub(crate) root_order: Vec<NodeId>,
    pub(crate) props: HashMap<PropId, Property>,
    pub(crate) prop_index: HashMap<NodeId, BTreeMap<String, PropId>>,
    pub(crate) slices: HashMap<SliceId, Slice>,
}

impl Outline {
    /// Creates an empty outline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads an outline from a seed bundle.
    ///
    /// Forgiving where data quality allows it, strict where structure is at
    /// stake:
    /// - nodes referencing a missing parent are reattached at top level;
    /// - properties referencing a missing node are dropped;
    /// - duplicate `(node_id, key)` properties resolve to the last one
    ///   (upsert semantics);
    /// - parent-link cycles reject the whole bundle.
    ///
    /// Sibling order is rebuilt from `(sort, bundle position)`; `level` is
    /// recomputed from parent links, which are the source of truth.
    pub fn from_bundle(bundle: SeedBundle) -> StoreResult<Self> {
        let mut outline = Self::new();

        let mut bundle_rank: HashMap<NodeId, usize> = HashMap::new();
        for (position, mut node) in bundle.nodes.into_iter().enumerate() {
            if node.parent_id == Some(node.id) {
                return Err(StoreError::InvalidData(format!(
                    "node {} is its own parent",
                    node.id
                )));
            }
            node.tags = dedup_tags(std::mem::take(&mut node.tags));
            bundle_rank.insert(node.id, position);
            outline.nodes.insert(node.id, node);
        }

        // Reattach orphans now that the full id set is known.
        let orphan_ids: Vec<NodeId> = outline
            .nodes
            .values()
            .filter(|node| {
                node.parent_id
                    .is_some_and(|parent_id| !outline.nodes.contains_key(&parent_id))
            })
            .map(|node| node.id)
            .collect();
        for id in orphan_ids {
            warn!("event=bundle_load module=store status=warn reason=orphan_reattached node={id}");
            if let Some(node) = outline.nodes.get_mut(&id) {
                node.parent_id = None;
            }
        }

        outline.rebuild_child_index(&bundle_rank)?;

        for property in bundle.properties {
            if !outline.nodes.contains_key(&property.node_id) {
                warn!(
                    "event=bundle_load module=store status=warn reason=dangling_property prop={}",
                    property.id
                );
                continue;
            }
            let keys = outline.prop_index.entry(property.node_id).or_default();
            if let Some(previous) = keys.insert(property.key.clone(), property.id) {
                outline.props.remove(&previous);
            }
            outline.props.insert(property.id, property);
        }

        for slice in bundle.slice_definitions {
            outline.slices.insert(slice.id, slice);
        }

        Ok(outline)
    }

    /// Exports the outline as a seed bundle in deterministic order.
    ///
    /// Nodes are emitted in document order (depth-first, sibling order),
    /// properties per node in key order, slices sorted by name then ID.
    pub fn to_bundle(&self) -> SeedBundle {
        let mut nodes = Vec::with_capacity(self.nodes.len());
        let mut properties = Vec::with_capacity(self.props.len());

        let mut stack: Vec<NodeId> = self.root_order.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            if let Some(node) = self.nodes.get(&id) {
                nodes.push(node.clone());
            }
            if let Some(keys) = self.prop_index.get(&id) {
                for prop_id in keys.values() {
                    if let Some(property) = self.props.get(prop_id) {
                        properties.push(property.clone());
                    }
                }
            }
            if let Some(kids) = self.children.get(&id) {
                stack.extend(kids.iter().rev().copied());
            }
        }

        let mut slice_definitions: Vec<Slice> = self.slices.values().cloned().collect();
        slice_definitions.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));

        SeedBundle {
            nodes,
            properties,
            slice_definitions,
        }
    }

    /// Rebuilds the children index from node parent links.
    ///
    /// Sibling ties on equal `sort` break by bundle position. Rejects
    /// parent-link cycles: every node must be reachable from a top-level
    /// node.
    fn rebuild_child_index(&mut self, bundle_rank: &HashMap<NodeId, usize>) -> StoreResult<()> {
        self.children.clear();
        self.root_order.clear();

        let mut grouped: HashMap<Option<NodeId>, Vec<(i64, usize, NodeId)>> = HashMap::new();
        for node in self.nodes.values() {
            let rank = bundle_rank.get(&node.id).copied().unwrap_or(usize::MAX);
            grouped
                .entry(node.parent_id)
                .or_default()
                .push((node.sort, rank, node.id));
        }

        for (parent_id, mut entries) in grouped {
            entries.sort();
            let ordered: Vec<NodeId> = entries.into_iter().map(|(_, _, id)| id).collect();
            match parent_id {
                Some(parent_id) => {
                    self.children.insert(parent_id, ordered);
                }
                None => self.root_order = ordered,
            }
        }

        // Level recompute doubles as the cycle check: a parent cycle is
        // unreachable from any top-level node.
        let mut visited = 0usize;
        let mut stack: Vec<(NodeId, u32)> =
            self.root_order.iter().map(|&id| (id, 1)).collect();
        while let Some((id, level)) = stack.pop() {
            visited += 1;
            if let Some(node) = self.nodes.get_mut(&id) {
                node.level = level;
            }
            if let Some(kids) = self.children.get(&id) {
                stack.extend(kids.iter().map(|&kid| (kid, level + 1)));
            }
        }
        if visited != self.nodes.len() {
            return Err(StoreError::InvalidData(
                "bundle contains a parent-link cycle".to_string(),
            ));
        }

        self.renumber_all_siblings();
        Ok(())
    }

    fn renumber_all_siblings(&mut self) {
        let lists: Vec<Vec<NodeId>> = std::iter::once(self.root_order.clone())
            .chain(self.children.values().cloned())
            .collect();
        for list in lists {
            for (index, id) in list.iter().enumerate() {
                if let Some(node) = self.nodes.get_mut(id) {
                    node.sort = index as i64;
                }
            }
        }
    }
}

pub(crate) fn dedup_tags(tags: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    tags.into_iter()
        .filter(|tag| seen.insert(tag.clone()))
        .collect()
}
