//! Row materialization, scope, sort and group evaluation.
//!
//! # Responsibility
//! - Materialize nodes into rows (node + path + properties) in document
//!   order and apply compiled predicates, sorting and grouping.
//!
//! # Invariants
//! - Reads never mutate the outline and never block.
//! - Sorting is stable; missing sort values order lowest.
//! - Group emission order is first-encountered order in the sorted sequence.

use crate::model::node::{Node, NodeId};
use crate::model::prop::{PropValue, STATUS_KEY};
use crate::model::slice::{Slice, SliceScope, SliceSort, SortDir};
use crate::query::compile::{compile_query, QueryResult};
use crate::store::{normalize_key, Outline};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

/// Sentinel group key for rows missing the grouped column.
pub const EMPTY_GROUP_KEY: &str = "(empty)";

/// One materialized row: node snapshot, slug path and property map.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRow {
    pub node: Node,
    pub path: String,
    pub props: BTreeMap<String, PropValue>,
}

impl QueryRow {
    /// Renders the display string of one output column, if present.
    ///
    /// Known columns are `title`, `path`, `type`, `status` and `tags`;
    /// `prop.<key>` and bare keys read from the property map.
    pub fn column_string(&self, column: &str) -> Option<String> {
        match column {
            "title" => self.node.title.clone(),
            "path" => Some(self.path.clone()),
            "type" => Some(self.node.kind.as_str().to_string()),
            "status" => self
                .props
                .get(STATUS_KEY)
                .map(PropValue::display_string),
            "tags" => Some(self.node.tags.join(",")),
            other => {
                let key = normalize_key(other.strip_prefix("prop.").unwrap_or(other));
                self.props.get(&key).map(PropValue::display_string)
            }
        }
    }
}

/// One emitted group of rows.
#[derive(Debug, Clone, PartialEq)]
pub struct RowGroup {
    pub key: String,
    pub rows: Vec<QueryRow>,
}

/// Ordered query output, flat or grouped.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryRows {
    Flat(Vec<QueryRow>),
    Grouped(Vec<RowGroup>),
}

impl QueryRows {
    /// Total number of rows across groups.
    pub fn len(&self) -> usize {
        match self {
            Self::Flat(rows) => rows.len(),
            Self::Grouped(groups) => groups.iter().map(|group| group.rows.len()).sum(),
        }
    }

    /// Returns whether no row matched.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One query evaluation request.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRequest {
    pub dsl: String,
    pub scope: SliceScope,
    pub sort: Option<SliceSort>,
    pub group_by: Option<String>,
}

impl QueryRequest {
    /// Builds a global, unsorted, ungrouped request for a DSL string.
    pub fn global(dsl: impl Into<String>) -> Self {
        Self {
            dsl: dsl.into(),
            scope: SliceScope::Global,
            sort: None,
            group_by: None,
        }
    }
}

/// Sort key extracted from one row.
#[derive(Debug, Clone, PartialEq)]
enum SortValue {
    Missing,
    Number(f64),
    Text(String),
}

impl Outline {
    /// Evaluates a query request into ordered (optionally grouped) rows.
    ///
    /// Scope `Subtree` covers proper descendants of the scope root; a
    /// missing root yields no rows. Rows materialize in document order.
    ///
    /// # Errors
    /// - Compilation errors of the DSL string.
    pub fn apply_query(&self, request: &QueryRequest) -> QueryResult<QueryRows> {
        let compiled = compile_query(&request.dsl)?;

        let mut rows: Vec<QueryRow> = self
            .scope_candidates(request.scope)
            .into_iter()
            .filter_map(|id| self.materialize_row(id))
            .filter(|row| compiled.matches_row(row))
            .collect();

        if let Some(sort) = &request.sort {
            sort_rows(&mut rows, sort);
        }

        match request.group_by.as_deref().map(str::trim) {
            Some(column) if !column.is_empty() => Ok(QueryRows::Grouped(group_rows(rows, column))),
            _ => Ok(QueryRows::Flat(rows)),
        }
    }

    /// Evaluates a saved slice definition.
    pub fn run_slice(&self, slice: &Slice) -> QueryResult<QueryRows> {
        self.apply_query(&QueryRequest {
            dsl: slice.dsl.clone(),
            scope: slice.scope,
            sort: slice.sort.clone(),
            group_by: slice.group_by.clone(),
        })
    }

    /// Materializes one node into a row; missing IDs yield `None`.
    pub fn materialize_row(&self, id: NodeId) -> Option<QueryRow> {
        let node = self.node(id)?.clone();
        let path = self.build_path(id);
        let props = self
            .node_properties(id)
            .into_iter()
            .map(|property| (property.key.clone(), property.value.clone()))
            .collect();
        Some(QueryRow { node, path, props })
    }

    /// Collects candidate IDs for one scope in document order.
    fn scope_candidates(&self, scope: SliceScope) -> Vec<NodeId> {
        let seeds: Vec<NodeId> = match scope {
            SliceScope::Global => self.children(None).to_vec(),
            SliceScope::Subtree { root } => {
                if !self.contains(root) {
                    return Vec::new();
                }
                self.children(Some(root)).to_vec()
            }
        };

        let mut ordered = Vec::new();
        let mut stack: Vec<NodeId> = seeds.into_iter().rev().collect();
        while let Some(id) = stack.pop() {
            ordered.push(id);
            stack.extend(self.children(Some(id)).iter().rev().copied());
        }
        ordered
    }
}

fn sort_rows(rows: &mut [QueryRow], sort: &SliceSort) {
    rows.sort_by(|a, b| {
        let ordering = compare_sort_values(&sort_value(a, &sort.by), &sort_value(b, &sort.by));
        match sort.dir {
            SortDir::Asc => ordering,
            SortDir::Desc => ordering.reverse(),
        }
    });
}

fn sort_value(row: &QueryRow, column: &str) -> SortValue {
    match column {
        "title" => row
            .node
            .title
            .as_deref()
            .map(|title| SortValue::Text(title.to_string()))
            .unwrap_or(SortValue::Missing),
        "path" => SortValue::Text(row.path.clone()),
        "type" => SortValue::Text(row.node.kind.as_str().to_string()),
        "status" => row
            .props
            .get(STATUS_KEY)
            .map(|value| SortValue::Text(value.display_string()))
            .unwrap_or(SortValue::Missing),
        other => {
            let key = normalize_key(other.strip_prefix("prop.").unwrap_or(other));
            match row.props.get(&key) {
                Some(PropValue::Number(value)) => SortValue::Number(*value),
                Some(value) => SortValue::Text(value.display_string()),
                None => SortValue::Missing,
            }
        }
    }
}

fn compare_sort_values(a: &SortValue, b: &SortValue) -> Ordering {
    match (a, b) {
        (SortValue::Missing, SortValue::Missing) => Ordering::Equal,
        (SortValue::Missing, _) => Ordering::Less,
        (_, SortValue::Missing) => Ordering::Greater,
        (SortValue::Number(a), SortValue::Number(b)) => {
            a.partial_cmp(b).unwrap_or(Ordering::Equal)
        }
        (a, b) => text_form(a).cmp(&text_form(b)),
    }
}

fn text_form(value: &SortValue) -> String {
    match value {
        SortValue::Missing => String::new(),
        SortValue::Number(value) => value.to_string(),
        SortValue::Text(value) => value.to_lowercase(),
    }
}

fn group_rows(rows: Vec<QueryRow>, column: &str) -> Vec<RowGroup> {
    let mut groups: Vec<RowGroup> = Vec::new();
    let mut index_by_key: HashMap<String, usize> = HashMap::new();

    for row in rows {
        let key = row
            .column_string(column)
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| EMPTY_GROUP_KEY.to_string());
        match index_by_key.get(&key) {
            Some(&index) => groups[index].rows.push(row),
            None => {
                index_by_key.insert(key.clone(), groups.len());
                groups.push(RowGroup {
                    key,
                    rows: vec![row],
                });
            }
        }
    }

    groups
}
