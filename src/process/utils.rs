use once_cell::sync::Lazy;
use regex::Regex;

static WHITESPACE_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("whitespace regex should compile"));
static CITATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[[^\]]*\]").expect("citation regex should compile"));

/// Collapse whitespace runs to one space and trim.
pub fn collapse_ws(raw: &str) -> String {
    WHITESPACE_RUN.replace_all(raw, " ").trim().to_string()
}

/// Remove `[...]` footnote markers such as `[1]` or `[note 3]`.
pub fn strip_citations(raw: &str) -> String {
    CITATION.replace_all(raw, "").into_owned()
}

/// Drop separators, currency signs, whitespace and citation markers so the
/// remainder can be read as a number.
pub fn clean_numeric_str(raw: &str) -> String {
    let stripped: String = raw
        .chars()
        .filter(|c| *c != ',' && *c != '$' && !c.is_whitespace())
        .map(|c| if c == '\u{2212}' { '-' } else { c })
        .collect();
    strip_citations(&stripped)
}

/// Parse a finite number; anything else is `None`.
pub fn parse_finite(s: &str) -> Option<f64> {
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Plain number that may carry `,` thousands separators: `"1,234"` -> 1234.
pub fn parse_thousands(s: &str) -> Option<f64> {
    parse_finite(&s.replace(',', ""))
}

/// Lenient numeric read of a raw cell: `"$1,234[1]"` -> 1234.
pub fn parse_number(raw: &str) -> Option<f64> {
    parse_finite(&clean_numeric_str(raw))
}
