// Entry point and high-level CLI flow.
//
// - `report` loads a dig-ticket CSV and produces one day's report: a
//   console summary, a leaderboard CSV and the full report as JSON.
// - `normalize` prints how contractor names are canonicalized.
// - `names` shows which raw spellings in a CSV collapse together.
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use dig_report::config::{Settings, DEFAULT_CONFIG_PATH};
use dig_report::error::{Result, StatsError};
use dig_report::normalize::NameNormalizer;
use dig_report::rules::NameRules;
use dig_report::stats::{self, StatsAggregator};
use dig_report::{loader, output, reports, util, AnalyticsConfig};
use std::io::{self, BufRead};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "dig_report", about = "Daily Chicago 811 dig-ticket statistics")]
struct Cli {
    /// Settings file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the daily report for one date
    Report {
        /// Dig-ticket CSV export
        csv: PathBuf,
        /// Target date (YYYY-MM-DD); defaults to yesterday
        #[arg(long)]
        date: Option<String>,
        /// Override analytics.rolling_window_days
        #[arg(long)]
        window_days: Option<u32>,
        /// Override analytics.leaderboard_limit
        #[arg(long)]
        limit: Option<usize>,
        /// Directory for the CSV and JSON outputs
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },
    /// Print `raw -> canonical` for each name (or each stdin line)
    Normalize { names: Vec<String> },
    /// Show contractors whose spellings were merged
    Names {
        /// Dig-ticket CSV export
        csv: PathBuf,
        /// Number of contractors to list
        #[arg(long, default_value = "20", value_parser = clap::value_parser!(u64).range(1..))]
        top: u64,
    },
}

/// An explicit `--config` must exist; the default file is optional.
fn load_settings(path: Option<&Path>) -> Result<Settings> {
    match path {
        Some(p) => Settings::load(p),
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => Settings::load(DEFAULT_CONFIG_PATH),
        None => {
            log::debug!("No {} found, using built-in settings", DEFAULT_CONFIG_PATH);
            Ok(Settings::default())
        }
    }
}

fn build_normalizer(settings: &Settings) -> Result<NameNormalizer> {
    let rules = NameRules::with_settings(&settings.names)?;
    Ok(NameNormalizer::new(Arc::new(rules)))
}

fn parse_target_date(arg: Option<&str>) -> Result<NaiveDate> {
    match arg {
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map_err(|_| StatsError::InvalidDate(s.to_string())),
        None => {
            let today = Local::now().date_naive();
            today.pred_opt().ok_or_else(|| StatsError::InvalidDate(today.to_string()))
        }
    }
}

fn handle_report(
    settings: &mut Settings,
    csv: &Path,
    date: Option<&str>,
    window_days: Option<u32>,
    limit: Option<usize>,
    out_dir: &Path,
) -> Result<()> {
    if window_days.is_some() {
        settings.analytics.rolling_window_days = window_days;
    }
    if limit.is_some() {
        settings.analytics.leaderboard_limit = limit;
    }
    let config = AnalyticsConfig::from_settings(settings)?;
    let date = parse_target_date(date)?;
    let agg = StatsAggregator::new(config, build_normalizer(settings)?);

    let (records, load_report) = loader::load_permits(csv)?;
    println!(
        "Processing dataset... ({} rows read, {} loaded)",
        util::format_int(load_report.total_rows),
        util::format_int(load_report.loaded_rows)
    );
    if load_report.parse_errors > 0 {
        println!(
            "Note: {} rows skipped due to missing or invalid request dates.",
            util::format_int(load_report.parse_errors)
        );
    }
    if load_report.missing_contractor > 0 {
        println!(
            "Info: {} rows have no contractor name.",
            util::format_int(load_report.missing_contractor)
        );
    }

    let report = reports::build_daily_report(&agg, &records, date);
    let totals = &report.stats.totals;
    println!("\nDig tickets for {} ({})", report.date, report.comparison.day_name);
    println!(
        "Total: {}  Emergency: {} ({}%)  Regular: {}",
        util::format_int(totals.total),
        util::format_int(totals.emergency),
        util::format_number(report.emergency_percent, 1),
        util::format_int(totals.regular)
    );
    println!(
        "Contractors: {}  Streets: {}",
        util::format_int(report.stats.unique_contractors),
        util::format_int(report.stats.unique_streets)
    );

    let note = format!(
        "vs. {} prior {}s in the last {} days",
        report.comparison.baseline_days, report.comparison.day_name, config.rolling_window_days
    );
    output::preview_table(
        "Day-of-Week Comparison",
        Some(&note),
        &reports::comparison_rows(&report.comparison),
        3,
    );

    let rows = reports::leaderboard_rows(&report.leaderboards);
    output::preview_table("Contractor Leaderboards", None, &rows, rows.len());
    println!("Newcomer: {} ({} tickets)\n", report.newcomer, report.newcomer_tickets);

    std::fs::create_dir_all(out_dir)?;
    let csv_out = out_dir.join(format!("leaderboards_{}.csv", date));
    output::write_csv(&csv_out, &rows)?;
    let json_out = out_dir.join(format!("daily_report_{}.json", date));
    output::write_json(&json_out, &report)?;
    println!("(Outputs saved to {} and {})", csv_out.display(), json_out.display());
    log::info!("Report for {} complete", date);
    Ok(())
}

fn handle_normalize(settings: &Settings, names: &[String]) -> Result<()> {
    let normalizer = build_normalizer(settings)?;
    if !names.is_empty() {
        for n in names {
            println!("{} -> {}", n, normalizer.normalize(n));
        }
        return Ok(());
    }
    for line in io::stdin().lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        println!("{} -> {}", line, normalizer.normalize(&line));
    }
    Ok(())
}

fn handle_names(settings: &Settings, csv: &Path, top: usize) -> Result<()> {
    let normalizer = build_normalizer(settings)?;
    let (records, _) = loader::load_permits(csv)?;
    let groups = stats::name_variants(&normalizer, &records);
    let rows = reports::name_variant_rows(&groups, 4);
    output::preview_table(
        "Merged Contractor Spellings",
        Some(&format!(
            "{} canonical names from {} tickets",
            util::format_int(groups.len()),
            util::format_int(records.len())
        )),
        &rows,
        top,
    );
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    let mut settings = load_settings(cli.config.as_deref())?;
    match cli.command {
        Commands::Report { csv, date, window_days, limit, out_dir } => handle_report(
            &mut settings,
            &csv,
            date.as_deref(),
            window_days,
            limit,
            &out_dir,
        ),
        Commands::Normalize { names } => handle_normalize(&settings, &names),
        Commands::Names { csv, top } => {
            handle_names(&settings, &csv, usize::try_from(top).unwrap_or(usize::MAX))
        }
    }
}

fn main() {
    pretty_env_logger::init();
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
