//! Core outline data engine for Cortex.
//! This crate is the single source of truth for outline invariants.

pub mod agenda;
pub mod capture;
pub mod db;
pub mod logging;
pub mod model;
pub mod path;
pub mod query;
pub mod store;
pub mod tree;

pub use capture::{parse_capture, parse_capture_at, Capture};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::node::{Node, NodeId, NodeType};
pub use model::prop::{
    PropId, PropKind, PropValue, Property, ANCHOR_KEY, DUE_KEY, SCHEDULED_KEY, STATUS_KEY,
};
pub use model::slice::{Slice, SliceDraft, SliceId, SliceScope, SliceSort, SortDir};
pub use path::{parse_path_string, slugify, PathError, PathResult, ROOT_MARKER};
pub use query::{
    compile_query, CompiledQuery, QueryError, QueryRequest, QueryResult, QueryRow, QueryRows,
    RowGroup, EMPTY_GROUP_KEY,
};
pub use store::{normalize_key, NodePatch, Outline, SeedBundle, StoreError, StoreResult};
pub use tree::{RefileMode, TreeError, TreeResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
