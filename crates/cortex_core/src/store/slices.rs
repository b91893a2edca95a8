//! Saved slice registry.
//!
//! # Responsibility
//! - Store and look up saved slice definitions by stable ID.

use super::Outline;
use crate::model::slice::{Slice, SliceDraft, SliceId};
use uuid::Uuid;

impl Outline {
    /// Saves a slice definition; drafts without an ID create a new one.
    pub fn save_slice(&mut self, draft: SliceDraft) -> SliceId {
        let id = draft.id.unwrap_or_else(Uuid::new_v4);
        self.slices.insert(id, draft.into_slice(id));
        id
    }

    /// Returns one saved slice by ID.
    pub fn slice(&self, id: SliceId) -> Option<&Slice> {
        self.slices.get(&id)
    }

    /// Removes one saved slice; missing IDs are a silent no-op.
    pub fn remove_slice(&mut self, id: SliceId) {
        self.slices.remove(&id);
    }

    /// Lists saved slices sorted by name, then ID.
    pub fn slices(&self) -> Vec<&Slice> {
        let mut all: Vec<&Slice> = self.slices.values().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        all
    }
}
