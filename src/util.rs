// Utility helpers for parsing and basic statistics.
//
// This module centralizes the forgiving CSV field handling so the rest of
// the code can assume clean, typed values.
use chrono::{NaiveDate, NaiveDateTime};
use num_format::{Locale, ToFormattedString};

/// Parse a date field, accepting a bare `YYYY-MM-DD` or one followed by a
/// time part as the Socrata export writes it (`2024-03-04T00:00:00.000`).
pub fn parse_date_safe(s: Option<&str>) -> Option<NaiveDate> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d);
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|dt| dt.date())
}

/// Lenient boolean: `true/false`, `1/0`, `y/n`, `yes/no`, any case.
/// Blank means `false`; anything else unrecognized is `None`.
pub fn parse_bool_safe(s: Option<&str>) -> Option<bool> {
    let s = s.map(str::trim).unwrap_or_default();
    match s.to_ascii_lowercase().as_str() {
        "" | "false" | "f" | "0" | "n" | "no" => Some(false),
        "true" | "t" | "1" | "y" | "yes" => Some(true),
        _ => None,
    }
}

pub fn average(v: &[f64]) -> f64 {
    // Standard arithmetic mean; returns 0 for an empty slice to avoid NaNs.
    if v.is_empty() {
        return 0.0;
    }
    let sum: f64 = v.iter().copied().sum();
    sum / v.len() as f64
}

/// Round half away from zero to one decimal place.
pub fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

/// `(actual - avg) / avg * 100`, or 0 when the average is 0.
pub fn percent_diff(actual: f64, avg: f64) -> f64 {
    if avg == 0.0 {
        return 0.0;
    }
    (actual - avg) / avg * 100.0
}

/// Share of `part` in `whole` as a percentage, 0 when `whole` is 0.
pub fn percent_of(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    part as f64 / whole as f64 * 100.0
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Fixed decimals plus locale-aware thousands separators (`1,234.5`).
    let neg = n.is_sign_negative() && n != 0.0;
    let s = format!("{:.*}", decimals, n.abs());
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    let int_val: i64 = int_part.parse().unwrap_or(0);
    let mut res = int_val.to_formatted_string(&Locale::en);
    if let Some(frac) = frac_part {
        res.push('.');
        res.push_str(frac);
    }
    if neg {
        format!("-{}", res)
    } else {
        res
    }
}

/// Signed percentage for display, e.g. `+20.0%` / `-3.5%`.
pub fn format_signed_percent(p: f64) -> String {
    if p > 0.0 {
        format!("+{}%", format_number(p, 1))
    } else {
        format!("{}%", format_number(p, 1))
    }
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    n.to_formatted_string(&Locale::en)
}
