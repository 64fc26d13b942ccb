use thiserror::Error;

/// Errors surfaced by the reporting core and its I/O glue.
///
/// Expected irregularities (an unparseable aggregate string, a date with
/// no rows) are not represented here: they are absorbed where they occur.
#[derive(Debug, Error)]
pub enum StatsError {
    /// A required setting was absent.
    #[error("missing required configuration: {0}")]
    MissingConfig(&'static str),

    /// A setting was present but unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A rule-table pattern failed to compile.
    #[error("invalid {table} pattern `{pattern}`: {source}")]
    InvalidPattern {
        table: &'static str,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// An aggregate count below zero reached the aggregator.
    #[error("negative count {count} for `{name}`")]
    NegativeCount { name: String, count: i64 },

    #[error("invalid date `{0}` (expected YYYY-MM-DD)")]
    InvalidDate(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("config parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, StatsError>;
