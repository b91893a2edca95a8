//! Readiness flag and priority scoring.
//!
//! # Responsibility
//! - Derive whether a todo node is currently actionable.
//! - Derive a due-date priority score for agenda ordering.
//!
//! # Invariants
//! - Both heuristics are pure in `(outline, node, now)` and are recomputed
//!   on every call; results are never cached.

use crate::model::node::{NodeId, NodeType};
use crate::model::prop::{PropValue, DUE_KEY, SCHEDULED_KEY, STATUS_KEY};
use crate::store::Outline;
use chrono::{Duration, Local, NaiveDateTime};

/// Score contribution for an overdue item.
const SCORE_OVERDUE: u32 = 100;
/// Score contribution for an item due within one day.
const SCORE_DUE_SOON: u32 = 80;
/// Score contribution for an item due within three days.
const SCORE_DUE_THIS_WEEK: u32 = 60;
/// Score contribution for any other dated item.
const SCORE_DATED: u32 = 30;
/// Bonus for currently actionable items.
const SCORE_READY_BONUS: u32 = 10;

impl Outline {
    /// Returns whether a node is currently actionable.
    pub fn is_ready(&self, id: NodeId) -> bool {
        self.is_ready_at(id, Local::now().naive_local())
    }

    /// Clock-injected readiness check.
    ///
    /// A node is ready when it is a todo, its status is not `done`, and its
    /// `scheduled_at` (if any) is not in the future.
    pub fn is_ready_at(&self, id: NodeId, now: NaiveDateTime) -> bool {
        let Some(node) = self.node(id) else {
            return false;
        };
        if node.kind != NodeType::Todo {
            return false;
        }
        if self.prop_value(id, STATUS_KEY).and_then(PropValue::as_str) == Some("done") {
            return false;
        }
        if let Some(scheduled) = self.prop_datetime(id, SCHEDULED_KEY) {
            if scheduled > now {
                return false;
            }
        }
        true
    }

    /// Returns the priority score of a node against the current wall clock.
    pub fn score(&self, id: NodeId) -> u32 {
        self.score_at(id, Local::now().naive_local())
    }

    /// Clock-injected priority score.
    ///
    /// Base 0; a `due_at` property contributes by urgency bucket
    /// (overdue 100, under a day 80, under three days 60, otherwise 30);
    /// ready nodes get a bonus of 10.
    pub fn score_at(&self, id: NodeId, now: NaiveDateTime) -> u32 {
        let mut total = 0;

        if let Some(due) = self.prop_datetime(id, DUE_KEY) {
            let remaining = due - now;
            total += if remaining < Duration::zero() {
                SCORE_OVERDUE
            } else if remaining < Duration::hours(24) {
                SCORE_DUE_SOON
            } else if remaining < Duration::days(3) {
                SCORE_DUE_THIS_WEEK
            } else {
                SCORE_DATED
            };
        }

        if self.is_ready_at(id, now) {
            total += SCORE_READY_BONUS;
        }

        total
    }

    /// Reads a date-like property as a datetime; dates count from midnight.
    fn prop_datetime(&self, id: NodeId, key: &str) -> Option<NaiveDateTime> {
        match self.prop_value(id, key)? {
            PropValue::Datetime(value) => Some(*value),
            PropValue::Date(value) => value.and_hms_opt(0, 0, 0),
            _ => None,
        }
    }
}
