//! Shared detection patterns and text helpers.
//!
//! Used by the coercer (placeholder filtering, paragraph splitting), the
//! quality gates and the trust scorer, so every component agrees on what a
//! "metric", a "recent year" or an "unavailable" value looks like.

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;

use crate::contract::RelevanceMatching;

lazy_static! {
    // =========================================================================
    // STRUCTURE
    // =========================================================================

    /// Blank-line paragraph boundary
    pub static ref PARAGRAPH_BREAK: Regex = Regex::new(r"\n[ \t\r]*\n").unwrap();

    /// Generator instructions leaking into content ("Insert a key insight here")
    pub static ref INSTRUCTION_PLACEHOLDER: Regex = Regex::new(
        r"(?i)(^\s*\[?\s*(insert|provide|describe|list|replace|enter|fill in|write)\s+(a|an|the|your|key|specific|here|\d+)\b)|\bplaceholder\b|lorem ipsum|\[(insert|tbd|todo)[^\]]*\]|\byour (insight|text|content) here\b"
    ).unwrap();

    /// Whole-value template text used as an insight title
    pub static ref INSIGHT_PLACEHOLDER: Regex = Regex::new(
        r"(?i)^\s*(\[[^\]]*\]|\{\{[^}]*\}\}|<[^>]*>|(insert|enter|fill in|write|add)\s+(a|an|the|your)\s+(key\s+)?(insight|title|headline|finding)\b.*|your (insight|title|headline) here\.?|lorem ipsum.*|placeholder|tbd)\s*$"
    ).unwrap();

    /// Values that stand in for missing data
    pub static ref UNAVAILABLE: Regex = Regex::new(
        r"(?i)^\s*(n/?a|tbd|tbc|unknown|none|-+|unavailable|not available|insufficient data|no data( available)?|data (is )?(not available|unavailable))\s*\.?\s*$"
    ).unwrap();

    // =========================================================================
    // CONTENT SIGNALS
    // =========================================================================

    /// Company-name-like token: capitalized words followed by a legal suffix
    pub static ref COMPANY_NAME: Regex = Regex::new(
        r"\b[A-Z][A-Za-z0-9&\-]+(\s+[A-Z][A-Za-z0-9&\-]+)*\s+(Corp|Corporation|Inc|Ltd|LLC|Co|Group|Holdings|GmbH|PLC|Plc|AG|SA|Limited|JSC|Pte)\b"
    ).unwrap();

    /// Year 2020 or later
    pub static ref RECENT_YEAR: Regex = Regex::new(r"\b20[2-9][0-9]\b").unwrap();

    /// Any plausible four-digit year
    pub static ref ANY_YEAR: Regex = Regex::new(r"\b(1[0-9]|20)[0-9]{2}\b").unwrap();

    /// Year, quarter or half-year token used for insight timing
    pub static ref YEAR_OR_QUARTER: Regex = Regex::new(
        r"(?i)\b((19|20)[0-9]{2}|Q[1-4]|H[12]|FY[0-9]{2,4})\b"
    ).unwrap();

    /// Currency amount: symbol, ISO code or magnitude word
    pub static ref CURRENCY_AMOUNT: Regex = Regex::new(
        r"(?i)([$€£¥]\s?[0-9][0-9,.]*|\b[0-9][0-9,.]*\s?(million|billion|trillion|bn|mn)\b|\b(USD|EUR|JPY|GBP|VND|THB|SGD)\s?[0-9])"
    ).unwrap();

    /// Percentage share or growth figure
    pub static ref PERCENTAGE: Regex = Regex::new(r"(?i)[0-9]+(\.[0-9]+)?\s?(%|percent\b)").unwrap();

    /// Founding or market-entry year phrase
    pub static ref FOUNDING_PHRASE: Regex = Regex::new(
        r"(?i)\b(founded|established|entered|since|launched|incorporated)\s+(in\s+)?(19|20)[0-9]{2}\b"
    ).unwrap();

    /// Macro-economic indicators that tend to pad content
    pub static ref MACRO_INDICATOR: Regex = Regex::new(
        r"(?i)\b(GDP|gross domestic product|population|inflation|trade balance|trade deficit|trade surplus)\b"
    ).unwrap();

    pub static ref DIGIT: Regex = Regex::new(r"[0-9]").unwrap();
}

/// Count whitespace-separated words.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// True for missing, null or whitespace-only values.
pub fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        Some(Value::Object(map)) => map.is_empty(),
        _ => false,
    }
}

/// True for strings that stand in for missing data.
pub fn is_unavailable(text: &str) -> bool {
    text.trim().is_empty() || UNAVAILABLE.is_match(text)
}

/// True for generator instructions left in place of content.
pub fn is_instruction_placeholder(text: &str) -> bool {
    INSTRUCTION_PLACEHOLDER.is_match(text)
}

/// True when an insight title is template text rather than a finding.
pub fn is_placeholder_title(text: &str) -> bool {
    INSIGHT_PLACEHOLDER.is_match(text)
}

/// Whether text carries a currency amount, percentage or founding year.
pub fn has_metric(text: &str) -> bool {
    CURRENCY_AMOUNT.is_match(text) || PERCENTAGE.is_match(text) || FOUNDING_PHRASE.is_match(text)
}

pub fn has_year_or_quarter(text: &str) -> bool {
    YEAR_OR_QUARTER.is_match(text)
}

pub fn contains_company_name(text: &str) -> bool {
    COMPANY_NAME.is_match(text)
}

pub fn contains_recent_year(text: &str) -> bool {
    RECENT_YEAR.is_match(text)
}

/// Split narrative text into trimmed, non-empty paragraphs.
pub fn split_paragraphs(text: &str) -> Vec<String> {
    PARAGRAPH_BREAK
        .split(text)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

/// Render a value as plain text: strings verbatim, numbers formatted,
/// containers joined with spaces.
pub fn text_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        Value::Array(items) => items
            .iter()
            .map(text_of)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" "),
        Value::Object(map) => map
            .values()
            .map(text_of)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" "),
    }
}

/// Count case-insensitive occurrences of `needle` in `haystack`.
pub fn count_mentions(haystack: &str, needle: &str, matching: RelevanceMatching) -> usize {
    let needle = needle.trim();
    if needle.is_empty() {
        return 0;
    }
    match matching {
        RelevanceMatching::Substring => {
            let haystack = haystack.to_lowercase();
            let needle = needle.to_lowercase();
            haystack.matches(needle.as_str()).count()
        }
        RelevanceMatching::TokenBoundary => {
            let pattern = format!(r"(?i)\b{}\b", regex::escape(needle));
            match Regex::new(&pattern) {
                Ok(re) => re.find_iter(haystack).count(),
                Err(_) => 0,
            }
        }
    }
}
