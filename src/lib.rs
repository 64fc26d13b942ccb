// Daily statistics over Chicago 811 dig tickets, with contractor names
// normalized so spelling variants of one company count together.
pub mod config;
pub mod error;
pub mod loader;
pub mod normalize;
pub mod output;
pub mod record;
pub mod reports;
pub mod rules;
pub mod stats;
pub mod types;
pub mod util;

pub use config::{AnalyticsConfig, Settings};
pub use error::{Result, StatsError};
pub use normalize::NameNormalizer;
pub use record::{parse_record, ParsedRecord};
pub use rules::NameRules;
pub use stats::StatsAggregator;
pub use types::{
    Category, DailyReport, DailyStats, DailyTotals, DayComparison, LeaderboardEntry, Leaderboards,
    PermitRecord,
};
