use crate::stats::StatsAggregator;
use crate::types::{
    Category, ComparisonRow, DailyReport, DayComparison, LeaderboardRow, Leaderboards,
    NameVariantRow, NameVariants, PermitRecord,
};
use crate::util::{format_int, format_number, format_signed_percent, percent_of, round1};
use chrono::NaiveDate;

/// Literal used in place of a newcomer name when nobody qualifies.
pub const NO_NEWCOMER: &str = "none";

/// Bundles one day's figures for the posting layer. Leaderboards cover
/// the target date only.
pub fn build_daily_report(
    agg: &StatsAggregator,
    records: &[PermitRecord],
    date: NaiveDate,
) -> DailyReport {
    log::info!("Building daily report for {}", date);
    let stats = agg.daily_stats(records, date);
    let emergency_percent = round1(percent_of(stats.totals.emergency, stats.totals.total));
    let comparison = agg.day_of_week_comparison(records, date);
    let leaderboards = agg.leaderboards(records, date..=date, agg.config().leaderboard_limit);
    let (newcomer, newcomer_tickets) = match agg.newcomer(records, date) {
        Some(entry) => (entry.name, entry.count),
        None => (NO_NEWCOMER.to_string(), 0),
    };

    DailyReport {
        date,
        stats,
        emergency_percent,
        comparison,
        leaderboards,
        newcomer,
        newcomer_tickets,
    }
}

pub fn leaderboard_rows(boards: &Leaderboards) -> Vec<LeaderboardRow> {
    Category::ALL
        .iter()
        .flat_map(|category| {
            boards.board(*category).iter().enumerate().map(move |(i, e)| LeaderboardRow {
                board: category.as_str().to_string(),
                rank: i + 1,
                contractor: e.name.clone(),
                count: format_int(e.count),
            })
        })
        .collect()
}

pub fn comparison_rows(cmp: &DayComparison) -> Vec<ComparisonRow> {
    let row = |metric: &str, actual: u64, avg: f64, diff: f64| ComparisonRow {
        metric: metric.to_string(),
        actual: format_int(actual),
        average: format_number(avg, 1),
        diff_percent: format_signed_percent(diff),
    };
    vec![
        row("Total", cmp.actual_total, cmp.avg_total, cmp.total_diff_percent),
        row("Emergency", cmp.actual_emergency, cmp.avg_emergency, cmp.emergency_diff_percent),
        row("Regular", cmp.actual_regular, cmp.avg_regular, cmp.regular_diff_percent),
    ]
}

/// Only canonical names that absorbed more than one raw spelling are
/// interesting here; `max_examples` caps the spellings listed per row.
pub fn name_variant_rows(groups: &[NameVariants], max_examples: usize) -> Vec<NameVariantRow> {
    groups
        .iter()
        .filter(|g| g.variants.len() > 1)
        .map(|g| {
            let mut examples = g
                .variants
                .iter()
                .take(max_examples)
                .cloned()
                .collect::<Vec<_>>()
                .join(" | ");
            if g.variants.len() > max_examples {
                examples.push_str(" | ...");
            }
            NameVariantRow {
                contractor: g.canonical.clone(),
                spellings: g.variants.len(),
                tickets: format_int(g.tickets),
                examples,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalyticsConfig;
    use crate::normalize::NameNormalizer;
    use crate::types::LeaderboardEntry;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn aggregator() -> StatsAggregator {
        let config = AnalyticsConfig { rolling_window_days: 30, leaderboard_limit: 3 };
        StatsAggregator::new(config, NameNormalizer::default())
    }

    #[test]
    fn daily_report_bundles_everything() {
        let date = d(2024, 3, 25);
        let mut records = vec![
            PermitRecord::new(d(2024, 3, 18), false).with_contractor("COMED"),
            PermitRecord::new(d(2024, 3, 18), false).with_contractor("COMED"),
        ];
        records.push(PermitRecord::new(date, true).with_contractor("COM ED").with_street("N STATE ST"));
        records.push(PermitRecord::new(date, false).with_contractor("COMED*").with_street("W LAKE ST"));
        records.push(PermitRecord::new(date, false).with_contractor("Lakeside Paving"));
        records.push(PermitRecord::new(date, false));

        let report = build_daily_report(&aggregator(), &records, date);
        assert_eq!(report.stats.totals.total, 4);
        assert_eq!(report.stats.totals.emergency, 1);
        assert_eq!(report.emergency_percent, 25.0);
        assert_eq!(report.stats.unique_contractors, 2);
        assert_eq!(report.comparison.avg_total, 2.0);
        assert_eq!(report.comparison.total_diff_percent, 100.0);
        assert_eq!(
            report.leaderboards.overall,
            vec![
                LeaderboardEntry { name: "ComEd".into(), count: 2 },
                LeaderboardEntry { name: "Lakeside Paving".into(), count: 1 },
            ]
        );
        assert_eq!(report.newcomer, "Lakeside Paving");
        assert_eq!(report.newcomer_tickets, 1);
    }

    #[test]
    fn empty_day_reports_zeros_and_no_newcomer() {
        let report = build_daily_report(&aggregator(), &[], d(2024, 3, 25));
        assert_eq!(report.emergency_percent, 0.0);
        assert!(report.leaderboards.is_empty());
        assert_eq!(report.newcomer, NO_NEWCOMER);
        assert_eq!(report.newcomer_tickets, 0);
    }

    #[test]
    fn leaderboard_rows_are_ranked_per_board() {
        let boards = Leaderboards {
            overall: vec![
                LeaderboardEntry { name: "ComEd".into(), count: 1200 },
                LeaderboardEntry { name: "Peoples Gas".into(), count: 7 },
            ],
            emergency: vec![LeaderboardEntry { name: "Peoples Gas".into(), count: 3 }],
            streets: vec![],
        };
        let rows = leaderboard_rows(&boards);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].board, "overall");
        assert_eq!(rows[0].count, "1,200");
        assert_eq!(rows[1].rank, 2);
        assert_eq!(rows[2].board, "emergency");
        assert_eq!(rows[2].rank, 1);
    }

    #[test]
    fn comparison_rows_format_signs() {
        let cmp = DayComparison {
            day_name: "Monday".into(),
            actual_total: 132,
            actual_emergency: 15,
            actual_regular: 117,
            avg_total: 110.0,
            avg_emergency: 10.0,
            avg_regular: 100.0,
            total_diff_percent: 20.0,
            emergency_diff_percent: 50.0,
            regular_diff_percent: -3.3,
            baseline_days: 3,
        };
        let rows = comparison_rows(&cmp);
        assert_eq!(rows[0].diff_percent, "+20.0%");
        assert_eq!(rows[0].average, "110.0");
        assert_eq!(rows[2].diff_percent, "-3.3%");
    }

    #[test]
    fn single_spelling_groups_are_skipped() {
        let groups = vec![
            NameVariants {
                canonical: "ComEd".into(),
                variants: vec!["COM ED".into(), "COM-ED".into(), "COMED".into()],
                tickets: 10,
            },
            NameVariants { canonical: "Acme".into(), variants: vec!["ACME".into()], tickets: 4 },
        ];
        let rows = name_variant_rows(&groups, 2);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].spellings, 3);
        assert_eq!(rows[0].examples, "COM ED | COM-ED | ...");
    }
}
