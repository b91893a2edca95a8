//! Typed property store.
//!
//! # Responsibility
//! - Upsert, read and remove typed key/value attributes per node.
//!
//! # Invariants
//! - `(node_id, key)` is unique; a second write overwrites in place and the
//!   property keeps its original ID.
//! - Keys are the normalized form of the given label; lookups normalize the
//!   same way.

use super::{Outline, StoreError, StoreResult};
use crate::model::node::NodeId;
use crate::model::prop::{PropId, PropValue, Property};
use once_cell::sync::Lazy;
use regex::Regex;
use uuid::Uuid;

static KEY_WHITESPACE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("valid key whitespace regex"));

/// Normalizes a property label into its key form.
///
/// Lowercases and joins whitespace runs with one hyphen. Deliberately
/// lighter than path slugification: reserved keys such as `_anchor` keep
/// their leading underscore.
pub fn normalize_key(label: &str) -> String {
    KEY_WHITESPACE_RE
        .replace_all(label.trim(), "-")
        .to_lowercase()
}

impl Outline {
    /// Inserts or overwrites the property addressed by `(node_id, label)`.
    ///
    /// The label is normalized to its slug key; the display label is kept as
    /// given.
    ///
    /// # Errors
    /// - `NodeNotFound` when `node_id` is missing.
    /// - `InvalidData` when the label slugifies to an empty key.
    pub fn upsert_property(
        &mut self,
        node_id: NodeId,
        label: &str,
        value: PropValue,
    ) -> StoreResult<PropId> {
        self.require_node(node_id)?;
        let key = normalize_key(label);
        if key.is_empty() {
            return Err(StoreError::InvalidData(format!(
                "property label `{label}` normalizes to an empty key"
            )));
        }

        let keys = self.prop_index.entry(node_id).or_default();
        if let Some(&existing_id) = keys.get(&key) {
            if let Some(existing) = self.props.get_mut(&existing_id) {
                existing.label = label.to_string();
                existing.value = value;
                return Ok(existing_id);
            }
        }

        let id = Uuid::new_v4();
        keys.insert(key.clone(), id);
        self.props.insert(
            id,
            Property {
                id,
                node_id,
                key,
                label: label.to_string(),
                value,
            },
        );
        Ok(id)
    }

    /// Removes the property addressed by `(node_id, key)`.
    ///
    /// Missing keys are a silent no-op; a missing node is an error.
    pub fn remove_property(&mut self, node_id: NodeId, key: &str) -> StoreResult<()> {
        self.require_node(node_id)?;
        let normalized = normalize_key(key);
        if let Some(keys) = self.prop_index.get_mut(&node_id) {
            if let Some(prop_id) = keys.remove(&normalized) {
                self.props.remove(&prop_id);
            }
        }
        Ok(())
    }

    /// Returns the property addressed by `(node_id, key)`, if present.
    pub fn get_property(&self, node_id: NodeId, key: &str) -> Option<&Property> {
        let normalized = normalize_key(key);
        self.prop_index
            .get(&node_id)?
            .get(&normalized)
            .and_then(|prop_id| self.props.get(prop_id))
    }

    /// Returns the stored value addressed by `(node_id, key)`, if present.
    pub fn prop_value(&self, node_id: NodeId, key: &str) -> Option<&PropValue> {
        self.get_property(node_id, key).map(|prop| &prop.value)
    }

    /// Lists all properties of one node in key order.
    pub fn node_properties(&self, node_id: NodeId) -> Vec<&Property> {
        self.prop_index
            .get(&node_id)
            .map(|keys| {
                keys.values()
                    .filter_map(|prop_id| self.props.get(prop_id))
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::normalize_key;

    #[test]
    fn normalize_key_lowercases_and_hyphenates_whitespace() {
        assert_eq!(normalize_key("  Visit Count "), "visit-count");
        assert_eq!(normalize_key("Rating"), "rating");
    }

    #[test]
    fn normalize_key_keeps_reserved_underscore_prefix() {
        assert_eq!(normalize_key("_anchor"), "_anchor");
    }
}
