//! Domain model for the outline engine.
//!
//! # Responsibility
//! - Define the canonical records shared by store, query and persistence.
//! - Keep one node-centric shape for every outline projection.
//!
//! # Invariants
//! - Every record is identified by a stable UUID alias (`NodeId`, `PropId`,
//!   `SliceId`).
//! - Property values are a tagged union; a value can never disagree with its
//!   kind.

pub mod node;
pub mod prop;
pub mod slice;
