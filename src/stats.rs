// Daily statistics, day-of-week baselines and contractor leaderboards.
//
// Every contractor grouping goes through the `NameNormalizer` first, so
// spelling variants of one contractor are counted together. All
// operations are pure functions of the record slice they are given; a
// date with no rows yields zeros, never an error.

use crate::config::AnalyticsConfig;
use crate::error::{Result, StatsError};
use crate::normalize::NameNormalizer;
use crate::record::parse_record;
use crate::types::{
    AggregateRecord, Category, DailyStats, DailyTotals, DayComparison, LeaderboardEntry,
    Leaderboards, NameVariants, PermitRecord,
};
use crate::util::{average, percent_diff, round1};
use chrono::{Datelike, Days, NaiveDate};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::ops::RangeInclusive;

#[derive(Debug, Clone)]
pub struct StatsAggregator {
    config: AnalyticsConfig,
    normalizer: NameNormalizer,
}

fn tally<'a>(records: impl IntoIterator<Item = &'a PermitRecord>) -> DailyTotals {
    let mut totals = DailyTotals::default();
    for r in records {
        totals.total += 1;
        if r.is_emergency {
            totals.emergency += 1;
        }
    }
    totals.regular = totals.total - totals.emergency;
    totals
}

/// Streets are compared case-insensitively.
fn street_key(r: &PermitRecord) -> Option<String> {
    r.street_name().map(str::to_uppercase)
}

/// Descending by count, ties by name. Contractors with a zero count stay
/// eligible, so a quiet category still fills its board.
fn top_n(mut entries: Vec<LeaderboardEntry>, limit: usize) -> Vec<LeaderboardEntry> {
    entries.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    entries.truncate(limit);
    entries
}

/// Canonical names for every distinct raw contractor string in `records`.
/// Names that normalize to nothing (bare markers) are left out.
fn canonical_names<'a>(
    normalizer: &NameNormalizer,
    records: impl IntoIterator<Item = &'a PermitRecord>,
) -> HashMap<&'a str, String> {
    let mut names = HashMap::new();
    let mut blank = HashSet::new();
    for r in records {
        let Some(raw) = r.contractor_name() else { continue };
        if names.contains_key(raw) || blank.contains(raw) {
            continue;
        }
        let canonical = normalizer.normalize(raw);
        if canonical.is_empty() {
            blank.insert(raw);
        } else {
            names.insert(raw, canonical);
        }
    }
    names
}

/// How raw spellings collapse into canonical names, busiest first. Needs
/// only the normalizer, not the analytics settings.
pub fn name_variants(normalizer: &NameNormalizer, records: &[PermitRecord]) -> Vec<NameVariants> {
    let names = canonical_names(normalizer, records);
    let mut groups: BTreeMap<&str, (BTreeSet<&str>, u64)> = BTreeMap::new();
    for r in records {
        let Some(raw) = r.contractor_name() else { continue };
        let Some(canonical) = names.get(raw) else { continue };
        let g = groups.entry(canonical.as_str()).or_default();
        g.0.insert(raw);
        g.1 += 1;
    }
    let mut out: Vec<NameVariants> = groups
        .into_iter()
        .map(|(canonical, (variants, tickets))| NameVariants {
            canonical: canonical.to_string(),
            variants: variants.into_iter().map(str::to_string).collect(),
            tickets,
        })
        .collect();
    out.sort_by(|a, b| b.tickets.cmp(&a.tickets).then_with(|| a.canonical.cmp(&b.canonical)));
    out
}

impl StatsAggregator {
    pub fn new(config: AnalyticsConfig, normalizer: NameNormalizer) -> Self {
        Self { config, normalizer }
    }

    pub fn config(&self) -> &AnalyticsConfig {
        &self.config
    }

    pub fn normalizer(&self) -> &NameNormalizer {
        &self.normalizer
    }

    pub fn daily_totals(&self, records: &[PermitRecord], date: NaiveDate) -> DailyTotals {
        tally(records.iter().filter(|r| r.request_date == date))
    }

    pub fn daily_stats(&self, records: &[PermitRecord], date: NaiveDate) -> DailyStats {
        let day: Vec<&PermitRecord> = records.iter().filter(|r| r.request_date == date).collect();
        let names = canonical_names(&self.normalizer, day.iter().copied());
        let unique_contractors = names.values().collect::<HashSet<_>>().len();
        let unique_streets = day.iter().filter_map(|r| street_key(r)).collect::<HashSet<_>>().len();
        log::debug!("Daily stats for {}: {} records", date, day.len());
        DailyStats {
            date: Some(date),
            totals: tally(day),
            unique_contractors,
            unique_streets,
        }
    }

    /// Compares `date` with the mean of earlier same-weekday dates inside
    /// the rolling window. Only dates that have records count toward the
    /// mean; with no such dates the averages and deviations are all 0.
    pub fn day_of_week_comparison(&self, records: &[PermitRecord], date: NaiveDate) -> DayComparison {
        let window_start = date
            .checked_sub_days(Days::new(u64::from(self.config.rolling_window_days)))
            .unwrap_or(NaiveDate::MIN);
        let weekday = date.weekday();

        let mut by_date: BTreeMap<NaiveDate, Vec<&PermitRecord>> = BTreeMap::new();
        for r in records {
            let d = r.request_date;
            if d >= window_start && d < date && d.weekday() == weekday {
                by_date.entry(d).or_default().push(r);
            }
        }
        let history: Vec<DailyTotals> = by_date.into_values().map(tally).collect();

        let avg_of = |f: fn(&DailyTotals) -> u64| {
            average(&history.iter().map(|t| f(t) as f64).collect::<Vec<_>>())
        };
        let avg_total = avg_of(|t| t.total);
        let avg_emergency = avg_of(|t| t.emergency);
        let avg_regular = avg_of(|t| t.regular);

        let actual = self.daily_totals(records, date);
        log::debug!(
            "Day comparison for {}: {} baseline days in a {}-day window",
            date,
            history.len(),
            self.config.rolling_window_days
        );

        DayComparison {
            day_name: date.format("%A").to_string(),
            actual_total: actual.total,
            actual_emergency: actual.emergency,
            actual_regular: actual.regular,
            avg_total: round1(avg_total),
            avg_emergency: round1(avg_emergency),
            avg_regular: round1(avg_regular),
            total_diff_percent: round1(percent_diff(actual.total as f64, avg_total)),
            emergency_diff_percent: round1(percent_diff(actual.emergency as f64, avg_emergency)),
            regular_diff_percent: round1(percent_diff(actual.regular as f64, avg_regular)),
            baseline_days: history.len(),
        }
    }

    /// Per-contractor counts for the dates in `dates`, keyed by canonical
    /// name. Street counts are distinct streets across all of a
    /// contractor's spellings, not a sum per spelling.
    pub fn contractor_aggregates(
        &self,
        records: &[PermitRecord],
        dates: RangeInclusive<NaiveDate>,
    ) -> Vec<AggregateRecord> {
        #[derive(Default)]
        struct Acc {
            total: u64,
            emergency: u64,
            streets: HashSet<String>,
        }

        let in_range: Vec<&PermitRecord> =
            records.iter().filter(|r| dates.contains(&r.request_date)).collect();
        let names = canonical_names(&self.normalizer, in_range.iter().copied());

        let mut map: BTreeMap<&str, Acc> = BTreeMap::new();
        for r in &in_range {
            let Some(canonical) = r.contractor_name().and_then(|raw| names.get(raw)) else {
                continue;
            };
            let e = map.entry(canonical.as_str()).or_default();
            e.total += 1;
            if r.is_emergency {
                e.emergency += 1;
            }
            if let Some(street) = street_key(r) {
                e.streets.insert(street);
            }
        }

        let mut out = Vec::with_capacity(map.len() * 3);
        for (name, acc) in map {
            out.push(AggregateRecord { name: name.to_string(), count: acc.total, category: Category::Overall });
            out.push(AggregateRecord { name: name.to_string(), count: acc.emergency, category: Category::Emergency });
            out.push(AggregateRecord {
                name: name.to_string(),
                count: acc.streets.len() as u64,
                category: Category::UniqueStreets,
            });
        }
        out
    }

    /// Top-`limit` contractors by tickets, emergency tickets and distinct
    /// streets over `dates`.
    pub fn leaderboards(
        &self,
        records: &[PermitRecord],
        dates: RangeInclusive<NaiveDate>,
        limit: usize,
    ) -> Leaderboards {
        log::debug!("Generating contractor leaderboard (limit: {})", limit);
        Self::rank(&self.contractor_aggregates(records, dates), limit)
    }

    /// Ranks aggregate records per category. Records sharing a name within
    /// a category are summed first.
    pub fn rank(aggregates: &[AggregateRecord], limit: usize) -> Leaderboards {
        let board = |category: Category| {
            let mut sums: HashMap<&str, u64> = HashMap::new();
            for a in aggregates.iter().filter(|a| a.category == category) {
                *sums.entry(a.name.as_str()).or_default() += a.count;
            }
            let entries = sums
                .into_iter()
                .map(|(name, count)| LeaderboardEntry { name: name.to_string(), count })
                .collect();
            top_n(entries, limit)
        };
        Leaderboards {
            overall: board(Category::Overall),
            emergency: board(Category::Emergency),
            streets: board(Category::UniqueStreets),
        }
    }

    /// Leaderboards from textual `(name, count)` rows, one category per
    /// row. Unparseable rows are dropped; a negative count is an upstream
    /// contract breach and fails the whole call.
    pub fn leaderboards_from_encoded<I, S>(&self, encoded: I, limit: usize) -> Result<Leaderboards>
    where
        I: IntoIterator<Item = (Category, S)>,
        S: AsRef<str>,
    {
        let mut aggregates = Vec::new();
        let mut skipped = 0usize;
        for (category, row) in encoded {
            let Some(parsed) = parse_record(&self.normalizer, row.as_ref()) else {
                skipped += 1;
                continue;
            };
            let count = u64::try_from(parsed.count).map_err(|_| StatsError::NegativeCount {
                name: parsed.name.clone(),
                count: parsed.count,
            })?;
            aggregates.push(AggregateRecord { name: parsed.name, count, category });
        }
        if skipped > 0 {
            log::warn!("Skipped {} unparseable aggregate rows", skipped);
        }
        Ok(Self::rank(&aggregates, limit))
    }

    /// The contractor with the most tickets on `date` among those whose
    /// canonical name never appears on an earlier date.
    pub fn newcomer(&self, records: &[PermitRecord], date: NaiveDate) -> Option<LeaderboardEntry> {
        let names = canonical_names(&self.normalizer, records.iter().filter(|r| r.request_date <= date));

        let mut seen_before: HashSet<&str> = HashSet::new();
        let mut on_date: HashMap<&str, u64> = HashMap::new();
        for r in records {
            let Some(canonical) = r.contractor_name().and_then(|raw| names.get(raw)) else {
                continue;
            };
            if r.request_date < date {
                seen_before.insert(canonical.as_str());
            } else if r.request_date == date {
                *on_date.entry(canonical.as_str()).or_default() += 1;
            }
        }

        on_date
            .into_iter()
            .filter(|(name, _)| !seen_before.contains(name))
            .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(a.0)))
            .map(|(name, count)| LeaderboardEntry { name: name.to_string(), count })
    }

    pub fn name_variants(&self, records: &[PermitRecord]) -> Vec<NameVariants> {
        name_variants(&self.normalizer, records)
    }
}
