//! Slug paths and path-to-node resolution.
//!
//! # Responsibility
//! - Normalize titles into slugs and paths into segment lists.
//! - Build the slug path of a node and resolve/create nodes for a path.
//!
//! # Invariants
//! - `slugify` is total and deterministic; equal inputs always produce equal
//!   slugs.
//! - `ensure_path` is idempotent: repeated or case-varying calls resolve to
//!   the same node and never create duplicates.

use crate::model::node::{NodeId, NodeType};
use crate::store::{Outline, StoreError};
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Leading marker carried by every rendered path.
pub const ROOT_MARKER: &str = "#";

static NON_SLUG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\w\s-]+").expect("valid slug strip regex"));
static SEPARATOR_RUN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\s_-]+").expect("valid separator regex"));

/// Result type used by path operations.
pub type PathResult<T> = Result<T, PathError>;

/// Errors from path parsing and resolution.
#[derive(Debug)]
pub enum PathError {
    /// Path contains no segments after normalization.
    EmptyPath,
    /// Store-level failure while creating intermediate nodes.
    Store(StoreError),
}

impl Display for PathError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyPath => write!(f, "path has no segments"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for PathError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::EmptyPath => None,
            Self::Store(err) => Some(err),
        }
    }
}

impl From<StoreError> for PathError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Normalizes a title into its slug form.
///
/// Lowercases, strips characters outside `[\w\s-]`, collapses
/// whitespace/underscore/hyphen runs into one hyphen and trims edge hyphens.
pub fn slugify(text: &str) -> String {
    let lowered = text.to_lowercase();
    let stripped = NON_SLUG_RE.replace_all(lowered.trim(), "");
    let hyphenated = SEPARATOR_RUN_RE.replace_all(&stripped, "-");
    hyphenated.trim_matches('-').to_string()
}

/// Splits a path string into its segments, original casing preserved.
///
/// Accepts `#/A/B`, `#A/B` and `A/B` forms; empty segments are dropped.
///
/// # Errors
/// - `EmptyPath` when nothing remains after normalization.
pub fn parse_path_string(path: &str) -> PathResult<Vec<String>> {
    let trimmed = path.trim();
    let without_marker = trimmed.strip_prefix(ROOT_MARKER).unwrap_or(trimmed);
    let without_lead = without_marker.strip_prefix('/').unwrap_or(without_marker);

    let segments: Vec<String> = without_lead
        .split('/')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .collect();

    if segments.is_empty() {
        return Err(PathError::EmptyPath);
    }
    Ok(segments)
}

impl Outline {
    /// Renders the slug path of one node, e.g. `#/cities/tokyo`.
    ///
    /// Walks parent links to the top, collecting slugified titles and
    /// skipping titleless nodes. Unknown IDs render the bare root marker.
    pub fn build_path(&self, id: NodeId) -> String {
        let mut slugs: Vec<String> = Vec::new();
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let Some(node) = self.node(current) else {
                break;
            };
            if let Some(title) = node.title.as_deref() {
                let slug = slugify(title);
                if !slug.is_empty() {
                    slugs.push(slug);
                }
            }
            cursor = node.parent_id;
        }
        slugs.reverse();
        format!("{ROOT_MARKER}/{}", slugs.join("/"))
    }

    /// Resolves a path to a node, creating missing heading segments.
    ///
    /// Per segment, an existing child wins when its title slug matches the
    /// segment slug; otherwise a heading titled with the segment's original
    /// casing is appended to sibling order. Idempotent across repeated and
    /// case-varying calls.
    ///
    /// # Errors
    /// - `EmptyPath` when the path has no segments.
    pub fn ensure_path(&mut self, path: &str) -> PathResult<NodeId> {
        let segments = parse_path_string(path)?;

        let mut parent: Option<NodeId> = None;
        for segment in segments {
            let slug = slugify(&segment);
            let existing = self.children(parent).iter().copied().find(|&child_id| {
                self.node(child_id)
                    .and_then(|node| node.title.as_deref())
                    .is_some_and(|title| slugify(title) == slug)
            });
            parent = Some(match existing {
                Some(child_id) => child_id,
                None => self.add_node(parent, NodeType::Heading, Some(segment), None)?,
            });
        }

        // Non-empty segment list guarantees at least one descent.
        parent.ok_or(PathError::EmptyPath)
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_path_string, slugify, PathError};

    #[test]
    fn slugify_normalizes_case_symbols_and_runs() {
        assert_eq!(slugify("  Tokyo  Trip!! "), "tokyo-trip");
        assert_eq!(slugify("a_b - c"), "a-b-c");
        assert_eq!(slugify("---"), "");
    }

    #[test]
    fn slugify_is_deterministic_for_equivalent_inputs() {
        assert_eq!(slugify("Coffee Shops"), slugify("coffee   shops"));
    }

    #[test]
    fn parse_accepts_marker_variants_and_keeps_casing() {
        for path in ["#/Cities/Tokyo", "#Cities/Tokyo", "Cities/Tokyo", "/Cities/Tokyo"] {
            let segments = parse_path_string(path).expect("path should parse");
            assert_eq!(segments, vec!["Cities".to_string(), "Tokyo".to_string()]);
        }
    }

    #[test]
    fn parse_drops_empty_segments() {
        let segments = parse_path_string("#/Cities//Tokyo/").expect("path should parse");
        assert_eq!(segments.len(), 2);
    }

    #[test]
    fn parse_rejects_blank_paths() {
        assert!(matches!(parse_path_string("#/"), Err(PathError::EmptyPath)));
        assert!(matches!(parse_path_string("  "), Err(PathError::EmptyPath)));
    }
}
