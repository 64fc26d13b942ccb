use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tabled::Tabled;

/// One row of the Chicago 811 dig-ticket export, untouched.
#[derive(Debug, Deserialize)]
pub struct RawRow {
    pub dig_ticket_number: Option<String>,
    pub request_date: Option<String>,
    pub dig_date: Option<String>,
    pub is_emergency: Option<String>,
    pub street_name: Option<String>,
    pub contact_last_name: Option<String>,
}

/// A dig ticket as the aggregator sees it.
#[derive(Debug, Clone, PartialEq)]
pub struct PermitRecord {
    pub ticket: Option<String>,
    pub request_date: NaiveDate,
    pub dig_date: Option<NaiveDate>,
    pub is_emergency: bool,
    pub street: Option<String>,
    pub contractor: Option<String>,
}

impl PermitRecord {
    pub fn new(request_date: NaiveDate, is_emergency: bool) -> Self {
        Self {
            ticket: None,
            request_date,
            dig_date: None,
            is_emergency,
            street: None,
            contractor: None,
        }
    }

    pub fn with_contractor(mut self, name: impl Into<String>) -> Self {
        self.contractor = Some(name.into());
        self
    }

    pub fn with_street(mut self, street: impl Into<String>) -> Self {
        self.street = Some(street.into());
        self
    }

    /// The contractor field, if it holds anything besides whitespace.
    pub fn contractor_name(&self) -> Option<&str> {
        self.contractor.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    pub fn street_name(&self) -> Option<&str> {
        self.street.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DailyTotals {
    pub total: u64,
    pub emergency: u64,
    pub regular: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DailyStats {
    pub date: Option<NaiveDate>,
    pub totals: DailyTotals,
    pub unique_contractors: usize,
    pub unique_streets: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayComparison {
    pub day_name: String,
    pub actual_total: u64,
    pub actual_emergency: u64,
    pub actual_regular: u64,
    pub avg_total: f64,
    pub avg_emergency: f64,
    pub avg_regular: f64,
    pub total_diff_percent: f64,
    pub emergency_diff_percent: f64,
    pub regular_diff_percent: f64,
    /// Number of prior same-weekday dates the averages were taken over.
    pub baseline_days: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Overall,
    Emergency,
    UniqueStreets,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Overall, Category::Emergency, Category::UniqueStreets];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Overall => "overall",
            Category::Emergency => "emergency",
            Category::UniqueStreets => "unique_streets",
        }
    }
}

/// One contractor's count under one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregateRecord {
    pub name: String,
    pub count: u64,
    pub category: Category,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeaderboardEntry {
    pub name: String,
    pub count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Leaderboards {
    pub overall: Vec<LeaderboardEntry>,
    pub emergency: Vec<LeaderboardEntry>,
    pub streets: Vec<LeaderboardEntry>,
}

impl Leaderboards {
    pub fn board(&self, category: Category) -> &[LeaderboardEntry] {
        match category {
            Category::Overall => &self.overall,
            Category::Emergency => &self.emergency,
            Category::UniqueStreets => &self.streets,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.overall.is_empty() && self.emergency.is_empty() && self.streets.is_empty()
    }
}

/// Raw spellings that collapsed into one canonical name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NameVariants {
    pub canonical: String,
    pub variants: Vec<String>,
    pub tickets: u64,
}

/// Everything the posting layer needs for one day.
#[derive(Debug, Clone, Serialize)]
pub struct DailyReport {
    pub date: NaiveDate,
    pub stats: DailyStats,
    pub emergency_percent: f64,
    pub comparison: DayComparison,
    pub leaderboards: Leaderboards,
    pub newcomer: String,
    pub newcomer_tickets: u64,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct LeaderboardRow {
    #[serde(rename = "Board")]
    #[tabled(rename = "Board")]
    pub board: String,
    #[serde(rename = "Rank")]
    #[tabled(rename = "Rank")]
    pub rank: usize,
    #[serde(rename = "Contractor")]
    #[tabled(rename = "Contractor")]
    pub contractor: String,
    #[serde(rename = "Count")]
    #[tabled(rename = "Count")]
    pub count: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct ComparisonRow {
    #[serde(rename = "Metric")]
    #[tabled(rename = "Metric")]
    pub metric: String,
    #[serde(rename = "Actual")]
    #[tabled(rename = "Actual")]
    pub actual: String,
    #[serde(rename = "Average")]
    #[tabled(rename = "Average")]
    pub average: String,
    #[serde(rename = "DiffPct")]
    #[tabled(rename = "DiffPct")]
    pub diff_percent: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct NameVariantRow {
    #[serde(rename = "Contractor")]
    #[tabled(rename = "Contractor")]
    pub contractor: String,
    #[serde(rename = "Spellings")]
    #[tabled(rename = "Spellings")]
    pub spellings: usize,
    #[serde(rename = "Tickets")]
    #[tabled(rename = "Tickets")]
    pub tickets: String,
    #[serde(rename = "Examples")]
    #[tabled(rename = "Examples")]
    pub examples: String,
}
