//! crmboard - CRM analytics dashboard

mod cli;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use crmboard_core::{
    export_insights_to_json, export_series_to_csv, export_series_to_json, DashboardConfig,
    DashboardController, InitReport, SeriesOrigin, Snapshot, Timeframe,
};
use std::path::{Path, PathBuf};

use cli::DateArg;

#[derive(Parser)]
#[command(
    name = "crmboard",
    version,
    about = "CRM analytics dashboard - synthetic metrics and rule-based insights",
    long_about = "Generates a year of daily CRM metrics (revenue, customer segments,\n\
                  campaigns, engagement, per-city breakdown) and derives prioritized\n\
                  insights from week-over-week comparisons.\n\
                  \n\
                  The series is generated once and kept in a snapshot so repeated\n\
                  runs see the same data. Use 'clear-snapshot' to start over.\n\
                  \n\
                  Examples:\n\
                    crmboard                              # Insights (default)\n\
                    crmboard insights -t monthly --json   # Insights as JSON\n\
                    crmboard day 2024-05-01               # One day's record\n\
                    crmboard window --days 14             # Last 14 days\n\
                    crmboard summary -t yearly            # KPI summary\n\
                    crmboard export --format csv --output metrics.csv --days 30\n\
                  \n\
                  Environment Variables:\n\
                    CRMBOARD_SNAPSHOT                     # Override snapshot path\n\
                    CRMBOARD_CONFIG                       # Override config path\n\
                    CRMBOARD_NO_COLOR                     # Disable ANSI colors\n\
                    RUST_LOG                              # Log filter (stderr)"
)]
struct Cli {
    #[command(subcommand)]
    mode: Option<Mode>,

    /// Snapshot file (default: <cache_dir>/crmboard/snapshot.json)
    #[arg(long, env = "CRMBOARD_SNAPSHOT", global = true)]
    snapshot: Option<PathBuf>,

    /// Config file (default: <config_dir>/crmboard/config.toml)
    #[arg(long, env = "CRMBOARD_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Do not read or write the snapshot
    #[arg(long, global = true)]
    no_persist: bool,

    /// Disable ANSI colors (log-friendly)
    #[arg(long, env = "CRMBOARD_NO_COLOR", global = true)]
    no_color: bool,
}

#[derive(Subcommand)]
enum Mode {
    /// Show generated insights (default)
    Insights {
        /// Timeframe: daily, monthly, yearly
        #[arg(long, short = 't')]
        timeframe: Option<Timeframe>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the record for one day
    Day {
        /// Date: today (latest day in the series), 7d, YYYY-MM-DD
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show records for the N days ending at a date
    Window {
        /// Number of days
        #[arg(long, short = 'n', default_value = "7")]
        days: usize,
        /// End date: today, 7d, YYYY-MM-DD
        #[arg(long, short = 'd')]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print KPI summary for a timeframe
    Summary {
        /// Timeframe: daily, monthly, yearly
        #[arg(long, short = 't')]
        timeframe: Option<Timeframe>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Export records (or insights) to a file
    Export {
        #[arg(long, value_enum)]
        format: ExportFormat,
        /// Destination file
        #[arg(long, short = 'o')]
        output: PathBuf,
        /// Only the last N days (default: whole series)
        #[arg(long, short = 'n')]
        days: Option<usize>,
        /// Export the insight list instead of records (JSON only)
        #[arg(long)]
        insights: bool,
    },
    /// Delete the snapshot and exit
    ClearSnapshot,
}

#[derive(Clone, Copy, ValueEnum)]
enum ExportFormat {
    Csv,
    Json,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "crmboard=warn,crmboard_core=warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config_path = cli.config.clone().or_else(DashboardConfig::default_path);
    let config = match &config_path {
        Some(path) => DashboardConfig::load(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => DashboardConfig::default(),
    };

    let snapshot_path = cli
        .snapshot
        .clone()
        .or_else(|| config.resolved_snapshot_path());

    let mode = cli.mode.unwrap_or(Mode::Insights {
        timeframe: None,
        json: false,
    });

    if let Mode::ClearSnapshot = mode {
        let path = snapshot_path.context("Could not determine snapshot location")?;
        return run_clear_snapshot(&path);
    }

    let snapshot_path = if cli.no_persist { None } else { snapshot_path };
    let mut controller = DashboardController::new(config.generator.clone());
    load_controller(&mut controller, snapshot_path.as_deref(), config.persist_insights)?;

    match mode {
        Mode::Insights { timeframe, json } => {
            if let Some(timeframe) = timeframe {
                controller.set_timeframe(timeframe);
            }
            println!(
                "{}",
                cli::format_insights(controller.insights(), json, cli.no_color)
            );
        }
        Mode::Day { date, json } => {
            let date = resolve_date(&controller, date.as_deref())?;
            controller.set_selected_date(date);
            let record = controller
                .current_record()
                .with_context(|| format!("No record for {}", date))?;
            println!("{}", cli::format_record(record, json));
        }
        Mode::Window { days, date, json } => {
            let date = resolve_date(&controller, date.as_deref())?;
            controller.set_selected_date(date);
            println!(
                "{}",
                cli::format_window(controller.timeframe_data(days), json, cli.no_color)
            );
        }
        Mode::Summary { timeframe, json } => {
            if let Some(timeframe) = timeframe {
                controller.set_timeframe(timeframe);
            }
            println!(
                "{}",
                cli::format_summary(&controller.summary(), controller.timeframe(), json)
            );
        }
        Mode::Export {
            format,
            output,
            days,
            insights,
        } => {
            run_export(&controller, format, &output, days, insights)?;
        }
        Mode::ClearSnapshot => {}
    }

    Ok(())
}

/// Restore from the snapshot (or generate), then persist a freshly generated series
fn load_controller(
    controller: &mut DashboardController,
    snapshot_path: Option<&Path>,
    persist_insights: bool,
) -> Result<()> {
    let Some(path) = snapshot_path else {
        controller.initialize();
        return Ok(());
    };

    let report = controller.initialize_from_snapshot(path);
    print_report_warnings(&report);
    tracing::debug!(
        origin = ?report.origin,
        records = report.records_loaded,
        insights_restored = report.insights_restored,
        "Controller ready"
    );

    if report.origin == SeriesOrigin::Generated {
        if let Err(e) = controller.save_snapshot(path, persist_insights) {
            tracing::warn!(error = %e, path = %path.display(), "Snapshot not saved");
            eprintln!("Warning: could not save snapshot: {}", e);
        }
    }

    Ok(())
}

fn print_report_warnings(report: &InitReport) {
    for error in &report.errors {
        eprintln!("Warning: {}", error.message);
        if let Some(suggestion) = &error.suggestion {
            eprintln!("  💡 {}", suggestion);
        }
    }
}

fn resolve_date(controller: &DashboardController, arg: Option<&str>) -> Result<chrono::NaiveDate> {
    match arg {
        Some(s) => DateArg::parse(s)?.resolve(controller.latest_date()),
        None => Ok(controller.selected_date()),
    }
}

fn run_export(
    controller: &DashboardController,
    format: ExportFormat,
    output: &Path,
    days: Option<usize>,
    insights: bool,
) -> Result<()> {
    if insights {
        if let ExportFormat::Csv = format {
            bail!("Insights can only be exported as JSON");
        }
        export_insights_to_json(controller.insights(), output)?;
        println!(
            "✓ Exported {} insights to {}",
            controller.insights().len(),
            output.display()
        );
        return Ok(());
    }

    let records = match days {
        Some(days) => controller.timeframe_data(days),
        None => controller.series(),
    };

    match format {
        ExportFormat::Csv => export_series_to_csv(records, output)?,
        ExportFormat::Json => export_series_to_json(records, output)?,
    }

    println!(
        "✓ Exported {} records to {}",
        records.len(),
        output.display()
    );
    Ok(())
}

fn run_clear_snapshot(path: &Path) -> Result<()> {
    let size_bytes = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);

    let removed = Snapshot::clear(path)
        .with_context(|| format!("Failed to delete snapshot: {}", path.display()))?;

    if removed {
        println!("✓ Snapshot cleared: {}", path.display());
        println!("  Freed {:.1} KB", size_bytes as f64 / 1024.0);
        println!("  Next run will generate a new series.");
    } else {
        println!("❌ Snapshot not found at: {}", path.display());
        println!("   Nothing to clear.");
    }

    Ok(())
}
