//! Section extraction from free-form case text.
//!
//! Officers type section lists by hand ("IPC 302, 307 r/w 34", "379,420"),
//! so extraction only looks for runs of decimal digits.
//!
//! ## Known fidelity gap
//!
//! Letter suffixes are dropped: "120B" and "498A" extract as "120" and "498".
//! A suffixed code is therefore indistinguishable from its bare number and
//! never matches a suffixed rule-table entry by exact lookup. This is kept for
//! compatibility with stored cases and analyses.

use lazy_static::lazy_static;
use regex::Regex;
use std::cmp::Ordering;
use std::collections::HashSet;

lazy_static! {
    /// Maximal run of ASCII decimal digits
    static ref DIGIT_RUN: Regex = Regex::new(r"[0-9]+").unwrap();
}

/// Extract section numbers from text.
///
/// Returns every maximal digit run, deduplicated, in order of first
/// appearance. Absent or empty input yields an empty list.
pub fn parse_sections(text: Option<&str>) -> Vec<String> {
    let Some(text) = text else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    DIGIT_RUN
        .find_iter(text)
        .map(|m| m.as_str())
        .filter(|section| seen.insert(*section))
        .map(str::to_string)
        .collect()
}

/// Order section identifiers by numeric prefix, then by full text.
///
/// "34" < "120" < "120B" < "302" < "498A".
pub fn compare_sections(a: &str, b: &str) -> Ordering {
    numeric_prefix(a)
        .cmp(&numeric_prefix(b))
        .then_with(|| a.cmp(b))
}

fn numeric_prefix(section: &str) -> u64 {
    let digits: &str = section
        .find(|c: char| !c.is_ascii_digit())
        .map_or(section, |end| &section[..end]);
    digits.parse().unwrap_or(u64::MAX)
}
