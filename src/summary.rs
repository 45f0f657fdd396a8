//! Parser for the packed `"Name: <n> regs / <value>, ..."` summary columns.
//!
//! Parsing is best effort: fragments that do not match the expected shape are
//! dropped and the remaining fragments are still returned.

use crate::schema::{EntityContribution, SummaryMap};
use log::debug;
use regex::Regex;
use std::sync::LazyLock;

/// `<count> regs / <value>` where value may carry thousands separators and a decimal part.
static DETAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)\s*regs\s*/\s*([\d,]+(?:\.\d+)?)$").unwrap());

/// A detail inside a name means two pairs ran together.
static EMBEDDED_DETAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+\s*regs\s*/").unwrap());

pub fn parse_summary(summary: Option<&str>) -> SummaryMap {
    let mut entities = SummaryMap::new();

    let cleaned: String = match summary {
        Some(text) => text.chars().filter(|&c| c != '"').collect(),
        None => return entities,
    };
    if cleaned.trim().is_empty() {
        return entities;
    }

    for pair in split_pairs(&cleaned) {
        let pair = pair.trim();
        match parse_pair(pair) {
            Some((name, contribution)) => {
                if entities.insert(name.to_string(), contribution).is_some() {
                    debug!("Duplicate entity '{}' in summary, keeping the last value", name);
                }
            }
            None => {
                if !pair.is_empty() {
                    debug!("Skipping malformed summary fragment: '{}'", pair);
                }
            }
        }
    }

    entities
}

fn parse_pair(pair: &str) -> Option<(&str, EntityContribution)> {
    // Entity names may contain colons; the detail part never does.
    let colon = pair.rfind(':').filter(|&idx| idx > 0)?;
    let name = pair[..colon].trim();
    let detail = pair[colon + 1..].trim();
    if name.is_empty() || EMBEDDED_DETAIL_RE.is_match(name) {
        return None;
    }

    let captures = DETAIL_RE.captures(detail)?;
    let count = captures[1].parse::<u64>().ok()?;
    let value = captures[2].replace(',', "").parse::<f64>().ok()?;
    if value.is_nan() {
        return None;
    }

    Some((name, EntityContribution { count, value }))
}

/// Splits on pair-separating commas. A comma with a digit directly on both
/// sides is a digit-group separator (`52,000`, `1,00,000`) and stays inside its pair.
fn split_pairs(text: &str) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut pairs = Vec::new();
    let mut start = 0;

    for (idx, &byte) in bytes.iter().enumerate() {
        if byte == b',' && !is_digit_group_separator(bytes, idx) {
            pairs.push(&text[start..idx]);
            start = idx + 1;
        }
    }
    pairs.push(&text[start..]);

    pairs
}

fn is_digit_group_separator(bytes: &[u8], idx: usize) -> bool {
    let digit_before = idx > 0 && bytes[idx - 1].is_ascii_digit();
    let digit_after = bytes.get(idx + 1).is_some_and(u8::is_ascii_digit);

    digit_before && digit_after
}
