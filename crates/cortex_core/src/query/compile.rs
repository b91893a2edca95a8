//! DSL condition compiler.
//!
//! # Responsibility
//! - Tokenize the strict AND-joined grammar and compile each condition into
//!   a predicate over one materialized row.
//!
//! # Invariants
//! - Compiled predicates are total: they never panic and never error at
//!   evaluation time.
//! - An unrecognized condition compiles to an always-false predicate; only
//!   structurally broken tokens are compile errors.
//! - Kind-mismatched property comparisons evaluate to "not satisfied".

use crate::model::prop::{PropValue, STATUS_KEY};
use crate::path::slugify;
use crate::query::rows::QueryRow;
use crate::store::normalize_key;
use chrono::{NaiveDate, NaiveDateTime};
use log::warn;
use once_cell::sync::Lazy;
use regex::Regex;
use std::cmp::Ordering;
use std::error::Error;
use std::fmt::{Display, Formatter};

static AND_SPLIT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+AND\s+").expect("valid AND separator regex"));

/// Result type used by query compilation.
pub type QueryResult<T> = Result<T, QueryError>;

/// Errors from query compilation.
#[derive(Debug)]
pub enum QueryError {
    /// Condition token is structurally broken (e.g. `prop.` without an
    /// operator, a path pattern with no usable segments).
    MalformedCondition { fragment: String },
}

impl Display for QueryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MalformedCondition { fragment } => {
                write!(f, "malformed query condition: `{fragment}`")
            }
        }
    }
}

impl Error for QueryError {}

/// Comparison operator for property conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Gt,
    Lt,
    Ge,
    Le,
}

impl CompareOp {
    fn accepts(self, ordering: Ordering) -> bool {
        match self {
            Self::Eq => ordering == Ordering::Equal,
            Self::Gt => ordering == Ordering::Greater,
            Self::Lt => ordering == Ordering::Less,
            Self::Ge => ordering != Ordering::Less,
            Self::Le => ordering != Ordering::Greater,
        }
    }
}

/// Slugified path pattern; `wildcard` switches containment semantics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    /// Slugified non-wildcard segments.
    segments: Vec<String>,
    /// True when the pattern ended in a `*` segment.
    wildcard: bool,
}

/// One compiled condition.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// `type:<nodeType>` equality on the node type name.
    TypeIs(String),
    /// `tag:<name>` membership, case-sensitive as stored.
    HasTag(String),
    /// `path:<pattern>` containment or exact-suffix match.
    PathMatches(PathPattern),
    /// `prop.<key><op><value>` against the stored kind.
    PropCompare {
        key: String,
        op: CompareOp,
        target: String,
    },
    /// `status:<value>` / `status!=<value>` sugar over the status property.
    StatusIs { value: String, negated: bool },
    /// Unrecognized fragment; always false.
    Never(String),
}

/// Compiled query: conditions joined by AND.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledQuery {
    conditions: Vec<Condition>,
}

impl CompiledQuery {
    /// Evaluates every condition against one row. Total function.
    pub fn matches_row(&self, row: &QueryRow) -> bool {
        self.conditions
            .iter()
            .all(|condition| eval_condition(condition, row))
    }

    /// Returns the compiled conditions, mainly for diagnostics.
    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }
}

/// Compiles a DSL string into a predicate over materialized rows.
///
/// The grammar is the strict dialect: conditions joined by the explicit
/// token `AND`. An empty string compiles to the match-everything query.
///
/// # Errors
/// - `MalformedCondition` for structurally broken tokens, carrying the
///   offending fragment.
pub fn compile_query(dsl: &str) -> QueryResult<CompiledQuery> {
    let trimmed = dsl.trim();
    if trimmed.is_empty() {
        return Ok(CompiledQuery {
            conditions: Vec::new(),
        });
    }

    let mut conditions = Vec::new();
    for fragment in AND_SPLIT_RE.split(trimmed) {
        let fragment = fragment.trim();
        if fragment.is_empty() {
            continue;
        }
        conditions.push(parse_condition(fragment)?);
    }

    Ok(CompiledQuery { conditions })
}

fn parse_condition(fragment: &str) -> QueryResult<Condition> {
    if let Some(value) = fragment.strip_prefix("type:") {
        return Ok(Condition::TypeIs(value.to_string()));
    }
    if let Some(value) = fragment.strip_prefix("tag:") {
        return Ok(Condition::HasTag(value.to_string()));
    }
    if let Some(pattern) = fragment.strip_prefix("path:") {
        return parse_path_pattern(fragment, pattern);
    }
    if let Some(rest) = fragment.strip_prefix("prop.") {
        return parse_prop_condition(fragment, rest);
    }
    if let Some(value) = fragment.strip_prefix("status!=") {
        return Ok(Condition::StatusIs {
            value: value.to_string(),
            negated: true,
        });
    }
    if let Some(value) = fragment.strip_prefix("status:") {
        return Ok(Condition::StatusIs {
            value: value.to_string(),
            negated: false,
        });
    }

    warn!("event=query_compile module=query status=warn reason=unknown_condition fragment={fragment}");
    Ok(Condition::Never(fragment.to_string()))
}

fn parse_path_pattern(fragment: &str, pattern: &str) -> QueryResult<Condition> {
    let stripped = pattern
        .trim()
        .trim_start_matches('#')
        .trim_start_matches('/');
    let raw: Vec<&str> = stripped
        .split('/')
        .filter(|segment| !segment.is_empty())
        .collect();

    let wildcard_count = raw.iter().filter(|segment| **segment == "*").count();
    let wildcard = wildcard_count == 1 && raw.last() == Some(&"*");
    if wildcard_count > 1 || (wildcard_count == 1 && !wildcard) {
        // Only one trailing wildcard segment is part of the grammar.
        return Err(QueryError::MalformedCondition {
            fragment: fragment.to_string(),
        });
    }

    let segments: Vec<String> = raw
        .iter()
        .filter(|segment| **segment != "*")
        .map(|segment| slugify(segment))
        .collect();

    if segments.is_empty() && !wildcard {
        return Err(QueryError::MalformedCondition {
            fragment: fragment.to_string(),
        });
    }

    Ok(Condition::PathMatches(PathPattern { segments, wildcard }))
}

const OPERATORS: &[(&str, CompareOp)] = &[
    ("<=", CompareOp::Le),
    (">=", CompareOp::Ge),
    ("<", CompareOp::Lt),
    (">", CompareOp::Gt),
    ("=", CompareOp::Eq),
];

fn parse_prop_condition(fragment: &str, rest: &str) -> QueryResult<Condition> {
    // Earliest operator wins; on a tie the longer token wins so `>=` never
    // parses as `>` followed by `=...`.
    let (op, op_index, op_len) = OPERATORS
        .iter()
        .filter_map(|(token, op)| rest.find(token).map(|index| (*op, index, token.len())))
        .min_by_key(|(_, index, len)| (*index, usize::MAX - len))
        .ok_or_else(|| QueryError::MalformedCondition {
            fragment: fragment.to_string(),
        })?;

    let key = normalize_key(&rest[..op_index]);
    if key.is_empty() {
        return Err(QueryError::MalformedCondition {
            fragment: fragment.to_string(),
        });
    }

    Ok(Condition::PropCompare {
        key,
        op,
        target: rest[op_index + op_len..].to_string(),
    })
}

fn eval_condition(condition: &Condition, row: &QueryRow) -> bool {
    match condition {
        Condition::TypeIs(value) => row.node.kind.as_str() == value.as_str(),
        Condition::HasTag(tag) => row.node.has_tag(tag),
        Condition::PathMatches(pattern) => eval_path_pattern(pattern, &row.path),
        Condition::PropCompare { key, op, target } => row
            .props
            .get(key)
            .is_some_and(|value| compare_prop_value(value, *op, target)),
        Condition::StatusIs { value, negated } => row
            .props
            .get(STATUS_KEY)
            .and_then(PropValue::as_str)
            .is_some_and(|stored| (stored == value.as_str()) != *negated),
        Condition::Never(_) => false,
    }
}

fn eval_path_pattern(pattern: &PathPattern, path: &str) -> bool {
    let segments: Vec<&str> = path
        .trim_start_matches('#')
        .split('/')
        .filter(|segment| !segment.is_empty())
        .collect();

    if pattern.wildcard {
        // True ancestor containment: the node lies strictly under the
        // pattern prefix.
        segments.len() > pattern.segments.len()
            && pattern
                .segments
                .iter()
                .zip(&segments)
                .all(|(expected, actual)| expected == actual)
    } else {
        segments.len() >= pattern.segments.len()
            && pattern
                .segments
                .iter()
                .rev()
                .zip(segments.iter().rev())
                .all(|(expected, actual)| expected == actual)
    }
}

fn compare_prop_value(value: &PropValue, op: CompareOp, target: &str) -> bool {
    match value {
        PropValue::String(stored) => op.accepts(stored.as_str().cmp(target)),
        PropValue::Number(stored) => match target.parse::<f64>() {
            Ok(parsed) => stored
                .partial_cmp(&parsed)
                .is_some_and(|ordering| op.accepts(ordering)),
            Err(_) => false,
        },
        PropValue::Boolean(stored) => {
            // Anything but a literal boolean target is a kind mismatch.
            let parsed = match target.to_ascii_lowercase().as_str() {
                "true" => true,
                "false" => false,
                _ => return false,
            };
            op.accepts(stored.cmp(&parsed))
        }
        PropValue::Date(stored) => match NaiveDate::parse_from_str(target, "%Y-%m-%d") {
            Ok(parsed) => op.accepts(stored.cmp(&parsed)),
            Err(_) => false,
        },
        PropValue::Datetime(stored) => match parse_target_datetime(target) {
            Some(parsed) => op.accepts(stored.cmp(&parsed)),
            None => false,
        },
        PropValue::Taglist(stored) => {
            op == CompareOp::Eq && stored.iter().any(|entry| entry == target)
        }
        PropValue::Json(_) => false,
    }
}

fn parse_target_datetime(target: &str) -> Option<NaiveDateTime> {
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(target, format) {
            return Some(parsed);
        }
    }
    NaiveDate::parse_from_str(target, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

#[cfg(test)]
mod tests {
    use super::{compile_query, CompareOp, Condition, QueryError};

    #[test]
    fn compiles_and_joined_conditions() {
        let compiled = compile_query("type:todo AND tag:urgent").expect("query should compile");
        assert_eq!(compiled.conditions().len(), 2);
        assert_eq!(
            compiled.conditions()[0],
            Condition::TypeIs("todo".to_string())
        );
    }

    #[test]
    fn empty_query_matches_everything() {
        let compiled = compile_query("   ").expect("blank query should compile");
        assert!(compiled.conditions().is_empty());
    }

    #[test]
    fn prop_condition_without_operator_is_malformed() {
        let err = compile_query("prop.rating").expect_err("missing operator must fail");
        assert!(matches!(
            err,
            QueryError::MalformedCondition { fragment } if fragment == "prop.rating"
        ));
    }

    #[test]
    fn prop_condition_prefers_two_char_operator() {
        let compiled = compile_query("prop.rating>=4").expect("query should compile");
        assert_eq!(
            compiled.conditions()[0],
            Condition::PropCompare {
                key: "rating".to_string(),
                op: CompareOp::Ge,
                target: "4".to_string(),
            }
        );
    }

    #[test]
    fn unknown_condition_compiles_to_never() {
        let compiled = compile_query("frobnicate").expect("unknown head should compile");
        assert!(matches!(compiled.conditions()[0], Condition::Never(_)));
    }

    #[test]
    fn double_wildcard_is_malformed() {
        assert!(compile_query("path:/a/*/*").is_err());
    }
}
