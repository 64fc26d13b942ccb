// Decoding of textual `(name, count)` aggregate rows.
//
// Grouped queries hand back rows rendered as text, e.g.
//   (ACME CO*, 7)
//   ('ACME CO*', 7)
//   {'': SMITH, JONES & CO, '': 12}
//   (ACME CO - 7)
// The name may itself contain commas, so the count is the trailing
// integer and everything before its separator (a comma, colon, hyphen or
// plain whitespace) is the name.
use crate::normalize::NameNormalizer;
use once_cell::sync::Lazy;
use regex::Regex;

static RECORD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?s)^(?P<name>.+?)(?:\s*[,:\-]\s*|\s+)(?:'[^']*'\s*:\s*)?['"]?(?P<count>-?\d+)['"]?$"#,
    )
    .expect("valid regex")
});

static KEY_PREFIX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^'[^']*'\s*:\s*").expect("valid regex"));

/// A decoded aggregate row. The count is signed here; the aggregator
/// rejects negatives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRecord {
    pub name: String,
    pub count: i64,
}

fn strip_enclosing(s: &str) -> &str {
    let s = s.trim();
    for (open, close) in [('(', ')'), ('{', '}'), ('[', ']')] {
        if let Some(inner) = s.strip_prefix(open).and_then(|r| r.strip_suffix(close)) {
            return inner.trim();
        }
    }
    s
}

fn strip_quotes(s: &str) -> &str {
    for q in ['\'', '"'] {
        if let Some(inner) = s.strip_prefix(q).and_then(|r| r.strip_suffix(q)) {
            return inner;
        }
    }
    s
}

/// Splits one encoded aggregate row into a raw name and a count, without
/// normalizing the name. `None` when no trailing integer can be found or
/// the name is blank.
pub fn split_record(encoded: &str) -> Option<(String, i64)> {
    let inner = strip_enclosing(encoded);
    let caps = RECORD_RE.captures(inner)?;
    let count: i64 = caps["count"].parse().ok()?;

    let name = caps["name"]
        .trim_end_matches(|c: char| matches!(c, ',' | ':' | '-') || c.is_whitespace());
    let name = KEY_PREFIX_RE.replace(name.trim(), "");
    let name = strip_quotes(name.trim()).trim_end_matches('*').trim();
    if name.is_empty() {
        return None;
    }
    Some((name.to_string(), count))
}

/// Decodes and normalizes one aggregate row. Failures are logged and
/// reported as `None` so a single bad row never aborts a leaderboard.
pub fn parse_record(normalizer: &NameNormalizer, encoded: &str) -> Option<ParsedRecord> {
    match split_record(encoded) {
        Some((raw, count)) => Some(ParsedRecord { name: normalizer.normalize(&raw), count }),
        None => {
            log::warn!("Failed to parse record '{}': no trailing count found", encoded);
            None
        }
    }
}
