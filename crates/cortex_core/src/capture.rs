//! Quick-capture free-text parser.
//!
//! # Responsibility
//! - Extract path/tags/properties/due/scheduled tokens from one capture
//!   line; whatever remains is the title.
//!
//! # Invariants
//! - Extraction is ordered and destructive: each matched token is removed
//!   before the next rule runs. The order is a correctness contract.
//! - Parsing is total: it never fails, and unmatched text becomes the title.

use chrono::{Local, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::ops::Range;

/// Hour of day assigned to bare due dates.
const DUE_DEFAULT_HOUR: u32 = 9;

static PATH_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"#([\w/:-]+)").expect("valid path regex"));
static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"@([\w/-]+)").expect("valid tag regex"));
static PROP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"prop\.([\w-]+)=(\S+)").expect("valid prop regex"));
static DUE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bdue\s+(\d{4})[-/](\d{2})[-/](\d{2})").expect("valid due regex")
});
static TIME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(?:\bat|@)\s+(\d{1,2}):(\d{2})\b").expect("valid time regex"));
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

/// Parsed capture line.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Capture {
    /// Remaining text after token extraction.
    pub title: String,
    /// First `#segments` token, original casing, `#`-prefixed.
    pub path: Option<String>,
    /// Every `@tag` token, as written.
    pub tags: Vec<String>,
    /// Every `prop.key=value` token, keys as written.
    pub props: BTreeMap<String, String>,
    /// `due YYYY-MM-DD` token at the default hour.
    pub due: Option<NaiveDateTime>,
    /// `at HH:MM` token on the parse day.
    pub scheduled: Option<NaiveDateTime>,
}

/// Parses one capture line against the current wall clock.
pub fn parse_capture(input: &str) -> Capture {
    parse_capture_at(input, Local::now().naive_local())
}

/// Parses one capture line; `now` anchors the time-of-day token.
///
/// Rules run in order, each stripping its match from the working string:
/// leading `t ` marker, path token, tag tokens, property tokens, due date,
/// time of day. The trimmed remainder is the title.
pub fn parse_capture_at(input: &str, now: NaiveDateTime) -> Capture {
    let mut capture = Capture::default();
    let mut working = input.trim().to_string();

    if let Some(rest) = working.strip_prefix("t ") {
        working = rest.trim_start().to_string();
    }

    if let Some((range, value)) = first_path_token(&working) {
        capture.path = Some(format!("#{value}"));
        working.replace_range(range, "");
    }

    capture.tags = TAG_RE
        .captures_iter(&working)
        .map(|caps| caps[1].to_string())
        .collect();
    working = TAG_RE.replace_all(&working, "").into_owned();

    for caps in PROP_RE.captures_iter(&working) {
        capture.props.insert(caps[1].to_string(), caps[2].to_string());
    }
    working = PROP_RE.replace_all(&working, "").into_owned();

    if let Some((range, due)) = first_due_token(&working) {
        capture.due = Some(due);
        working.replace_range(range, "");
    }

    if let Some((range, scheduled)) = first_time_token(&working, now) {
        capture.scheduled = Some(scheduled);
        working.replace_range(range, "");
    }

    capture.title = WHITESPACE_RE
        .replace_all(&working, " ")
        .trim()
        .to_string();
    capture
}

fn first_path_token(working: &str) -> Option<(Range<usize>, String)> {
    let caps = PATH_RE.captures(working)?;
    let range = caps.get(0)?.range();
    Some((range, caps[1].trim().to_string()))
}

fn first_due_token(working: &str) -> Option<(Range<usize>, NaiveDateTime)> {
    let caps = DUE_RE.captures(working)?;
    let range = caps.get(0)?.range();
    let year: i32 = caps[1].parse().ok()?;
    let month: u32 = caps[2].parse().ok()?;
    let day: u32 = caps[3].parse().ok()?;
    // Tokens naming an impossible date stay in the title.
    let due = NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(DUE_DEFAULT_HOUR, 0, 0)?;
    Some((range, due))
}

fn first_time_token(working: &str, now: NaiveDateTime) -> Option<(Range<usize>, NaiveDateTime)> {
    let caps = TIME_RE.captures(working)?;
    let range = caps.get(0)?.range();
    let hour: u32 = caps[1].parse().ok()?;
    let minute: u32 = caps[2].parse().ok()?;
    let scheduled = now.date().and_hms_opt(hour, minute, 0)?;
    Some((range, scheduled))
}

#[cfg(test)]
mod tests {
    use super::parse_capture_at;
    use chrono::NaiveDate;

    fn noon() -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 5, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn extracts_every_token_kind_in_order() {
        let capture =
            parse_capture_at("t Buy milk #Errands due 2026-05-01 @errands", noon());
        assert_eq!(capture.title, "Buy milk");
        assert_eq!(capture.path.as_deref(), Some("#Errands"));
        assert_eq!(capture.tags, vec!["errands".to_string()]);
        assert_eq!(
            capture.due,
            NaiveDate::from_ymd_opt(2026, 5, 1).unwrap().and_hms_opt(9, 0, 0)
        );
        assert!(capture.scheduled.is_none());
    }

    #[test]
    fn keeps_unmatched_text_as_title() {
        let capture = parse_capture_at("just a plain thought", noon());
        assert_eq!(capture.title, "just a plain thought");
        assert!(capture.path.is_none());
        assert!(capture.tags.is_empty());
    }

    #[test]
    fn collects_properties_and_time_of_day() {
        let capture = parse_capture_at("Review prop.rating=4 at 16:30 draft", noon());
        assert_eq!(capture.props.get("rating").map(String::as_str), Some("4"));
        assert_eq!(
            capture.scheduled,
            noon().date().and_hms_opt(16, 30, 0)
        );
        assert_eq!(capture.title, "Review draft");
    }

    #[test]
    fn impossible_due_date_stays_in_title() {
        let capture = parse_capture_at("Pay rent due 2026-13-40", noon());
        assert!(capture.due.is_none());
        assert_eq!(capture.title, "Pay rent due 2026-13-40");
    }

    #[test]
    fn slashed_due_date_parses_like_dashed() {
        let capture = parse_capture_at("Ship due 2026/05/02", noon());
        assert_eq!(
            capture.due,
            NaiveDate::from_ymd_opt(2026, 5, 2).unwrap().and_hms_opt(9, 0, 0)
        );
    }

    #[test]
    fn marker_is_only_stripped_at_the_front() {
        let capture = parse_capture_at("t t-shirt shopping", noon());
        assert_eq!(capture.title, "t-shirt shopping");
    }
}
