//! Filter DSL over materialized outline rows.
//!
//! # Responsibility
//! - Compile filter strings into total predicates.
//! - Evaluate saved slices with scope, sort and group semantics.
//!
//! # See also
//! - `model/slice.rs` for the saved-query shape.

mod compile;
mod rows;

pub use compile::{
    compile_query, CompareOp, CompiledQuery, Condition, PathPattern, QueryError, QueryResult,
};
pub use rows::{QueryRequest, QueryRow, QueryRows, RowGroup, EMPTY_GROUP_KEY};
