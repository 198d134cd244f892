//! Export of metric windows and insight lists
//!
//! CSV for spreadsheets, JSON for other tools. Both create parent
//! directories and overwrite the destination.

use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::models::{City, Insight, MetricRecord};

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    Ok(())
}

/// Export records to CSV, one row per day
///
/// Columns: Date, Revenue, customer segments, campaign funnel, engagement,
/// then `<City> Revenue` for each city in `City::ALL` order.
///
/// # Examples
///
/// ```no_run
/// use crmboard_core::export::export_series_to_csv;
/// use crmboard_core::DashboardController;
/// use std::path::Path;
///
/// let mut controller = DashboardController::with_defaults();
/// controller.initialize();
/// export_series_to_csv(controller.timeframe_data(30), Path::new("last-30-days.csv")).unwrap();
/// ```
pub fn export_series_to_csv(records: &[MetricRecord], path: &Path) -> Result<()> {
    ensure_parent(path)?;

    let file = File::create(path)
        .with_context(|| format!("Failed to create CSV file: {}", path.display()))?;
    let mut writer = BufWriter::new(file);

    let city_columns: Vec<String> = City::ALL
        .iter()
        .map(|c| format!("{} Revenue", c.name()))
        .collect();
    writeln!(
        writer,
        "Date,Revenue,Customers,VIP,Regular,New,Inactive,Campaigns,Impressions,Clicks,Conversions,CTR (%),ROI (%),Session (s),Pages/Session,Bounce (%),Return (%),{}",
        city_columns.join(",")
    )
    .context("Failed to write CSV header")?;

    for r in records {
        let city_revenue: Vec<String> = City::ALL
            .iter()
            .map(|&c| r.city(c).map(|m| m.revenue).unwrap_or(0).to_string())
            .collect();

        writeln!(
            writer,
            "{},{},{},{},{},{},{},{},{},{},{},{:.2},{:.1},{:.1},{:.1},{:.1},{:.1},{}",
            r.date.format("%Y-%m-%d"),
            r.revenue,
            r.customers.total,
            r.customers.vip,
            r.customers.regular,
            r.customers.new,
            r.customers.inactive,
            r.campaigns.active,
            r.campaigns.impressions,
            r.campaigns.clicks,
            r.campaigns.conversions,
            r.campaigns.avg_ctr,
            r.campaigns.avg_roi,
            r.engagement.session_duration,
            r.engagement.pages_per_session,
            r.engagement.bounce_rate,
            r.engagement.return_rate,
            city_revenue.join(",")
        )
        .with_context(|| format!("Failed to write row for {}", r.date))?;
    }

    writer.flush().context("Failed to flush CSV writer")?;
    Ok(())
}

/// Export records to a pretty-printed JSON array
pub fn export_series_to_json(records: &[MetricRecord], path: &Path) -> Result<()> {
    ensure_parent(path)?;

    let json =
        serde_json::to_string_pretty(records).context("Failed to serialize records to JSON")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write JSON file: {}", path.display()))?;
    Ok(())
}

/// Export insights to a pretty-printed JSON array
pub fn export_insights_to_json(insights: &[Insight], path: &Path) -> Result<()> {
    ensure_parent(path)?;

    let json =
        serde_json::to_string_pretty(insights).context("Failed to serialize insights to JSON")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write JSON file: {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GeneratorConfig;
    use crate::generator::SeriesGenerator;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn series(days: u32) -> Vec<MetricRecord> {
        let config = GeneratorConfig {
            horizon_days: days - 1,
            ..Default::default()
        };
        SeriesGenerator::new(config).generate(NaiveDate::from_ymd_opt(2024, 2, 10).unwrap())
    }

    #[test]
    fn test_csv_has_header_and_one_row_per_day() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out").join("series.csv");

        export_series_to_csv(&series(5), &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 6);
        assert!(lines[0].starts_with("Date,Revenue,Customers"));
        assert!(lines[0].ends_with("Antalya Revenue"));
        assert!(lines[5].starts_with("2024-02-10,"));

        let columns = lines[0].split(',').count();
        assert!(lines[1..].iter().all(|l| l.split(',').count() == columns));
    }

    #[test]
    fn test_json_export_parses_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("series.json");
        let records = series(3);

        export_series_to_json(&records, &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let parsed: Vec<MetricRecord> = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed, records);
    }

    #[test]
    fn test_empty_insights_export() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("insights.json");

        export_insights_to_json(&[], &path).unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap().trim(), "[]");
    }
}
