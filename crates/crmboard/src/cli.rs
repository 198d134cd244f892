//! CLI formatting and argument helpers
//!
//! Renders controller output as comfy-table tables (human) or JSON.

use anyhow::{Context, Result};
use chrono::{Days, NaiveDate};
use comfy_table::{Cell, Color, ContentArrangement, Row, Table};
use crmboard_core::analytics::WindowSummary;
use crmboard_core::models::{Insight, MetricRecord};
use crmboard_core::Timeframe;

// ============================================================================
// Date Argument
// ============================================================================

/// Date argument for `day` and `window`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateArg {
    Today,
    DaysAgo(u64),
    On(NaiveDate),
}

impl DateArg {
    /// Parse from string: "today", "7d" (days before the latest day), "YYYY-MM-DD"
    pub fn parse(s: &str) -> Result<Self> {
        if s.eq_ignore_ascii_case("today") {
            return Ok(DateArg::Today);
        }

        if let Some(stripped) = s.strip_suffix('d') {
            let days = stripped
                .parse::<u64>()
                .context("Invalid days format (expected: 7d)")?;
            return Ok(DateArg::DaysAgo(days));
        }

        let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .context("Invalid date format (expected: YYYY-MM-DD, 7d or today)")?;
        Ok(DateArg::On(date))
    }

    /// Resolve against the last day of the loaded series
    pub fn resolve(&self, latest: NaiveDate) -> Result<NaiveDate> {
        match self {
            DateArg::Today => Ok(latest),
            DateArg::DaysAgo(d) => latest
                .checked_sub_days(Days::new(*d))
                .context("Date out of range"),
            DateArg::On(date) => Ok(*date),
        }
    }
}

// ============================================================================
// Formatters
// ============================================================================

fn header(labels: &[&str], no_color: bool) -> Vec<Cell> {
    labels
        .iter()
        .map(|l| {
            let cell = Cell::new(l);
            if no_color {
                cell
            } else {
                cell.fg(Color::Cyan)
            }
        })
        .collect()
}

fn color_for(name: &str) -> Color {
    match name {
        "red" => Color::Red,
        "yellow" => Color::Yellow,
        "green" => Color::Green,
        "blue" => Color::Blue,
        "magenta" => Color::Magenta,
        _ => Color::Grey,
    }
}

/// Format insights as table (human) or JSON
pub fn format_insights(insights: &[Insight], json: bool, no_color: bool) -> String {
    if json {
        return serde_json::to_string_pretty(insights).unwrap_or_else(|_| "[]".to_string());
    }

    if insights.is_empty() {
        return "No insights (at least 7 days of history are needed).".to_string();
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(header(
        &[
            "Type",
            "Priority",
            "Title",
            "Description",
            "Sources",
            "Confidence",
            "Impact",
        ],
        no_color,
    ));

    for insight in insights {
        let mut kind = Cell::new(format!(
            "{} {}",
            insight.insight_type.icon(),
            insight.insight_type.label()
        ));
        let mut priority = Cell::new(insight.priority.label());
        if !no_color {
            kind = kind.fg(color_for(insight.insight_type.color_name()));
            priority = priority.fg(color_for(insight.priority.color_name()));
        }
        let sources = insight
            .data_source
            .iter()
            .map(|s| s.label())
            .collect::<Vec<_>>()
            .join(", ");

        table.add_row(Row::from(vec![
            kind,
            priority,
            Cell::new(&insight.title),
            Cell::new(truncate(&insight.description, 80)),
            Cell::new(sources),
            Cell::new(format!("{}%", insight.confidence)),
            Cell::new(&insight.impact_estimate),
        ]));
    }

    table.to_string()
}

/// Format a single day's record (human or JSON)
pub fn format_record(record: &MetricRecord, json: bool) -> String {
    if json {
        return serde_json::to_string_pretty(record).unwrap_or_else(|_| "{}".to_string());
    }

    let c = &record.customers;
    let k = &record.campaigns;
    let e = &record.engagement;

    let mut lines = vec![];
    lines.push(format!("Date:             {}", record.date));
    lines.push(format!("Revenue:          {}", format_number(record.revenue)));
    lines.push(format!("Customers:        {}", format_number(c.total)));
    lines.push(format!(
        "  VIP / Regular:  {} / {}",
        format_number(c.vip),
        format_number(c.regular)
    ));
    lines.push(format!(
        "  New / Inactive: {} / {}",
        format_number(c.new),
        format_number(c.inactive)
    ));
    lines.push(format!("Campaigns:        {} active", k.active));
    lines.push(format!(
        "  Funnel:         {} → {} → {}",
        format_number(k.impressions),
        format_number(k.clicks),
        format_number(k.conversions)
    ));
    lines.push(format!(
        "  CTR / ROI:      {:.2}% / {:.1}%",
        k.avg_ctr, k.avg_roi
    ));
    lines.push(format!(
        "Engagement:       {:.0}s session, {:.1} pages",
        e.session_duration, e.pages_per_session
    ));
    lines.push(format!(
        "  Bounce/Return:  {:.1}% / {:.1}%",
        e.bounce_rate, e.return_rate
    ));
    lines.push("Geography:".to_string());
    for city in &record.geography {
        lines.push(format!(
            "  {:<15} {:>12} revenue, {:>7} customers, {:.1}% engagement",
            city.city.name(),
            format_number(city.revenue),
            format_number(city.customers),
            city.engagement
        ));
    }

    lines.join("\n")
}

/// Format a run of records as table (human) or JSON
pub fn format_window(records: &[MetricRecord], json: bool, no_color: bool) -> String {
    if json {
        return serde_json::to_string_pretty(records).unwrap_or_else(|_| "[]".to_string());
    }

    if records.is_empty() {
        return "No records in window.".to_string();
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(header(
        &[
            "Date",
            "Revenue",
            "Customers",
            "VIP",
            "Conversions",
            "CTR",
            "Bounce",
            "Top City",
        ],
        no_color,
    ));

    for r in records {
        let top_city = r
            .top_city_by_revenue()
            .map(|c| c.city.name())
            .unwrap_or("-");
        table.add_row(Row::from(vec![
            r.date.to_string(),
            format_number(r.revenue),
            format_number(r.customers.total),
            format_number(r.customers.vip),
            format_number(r.campaigns.conversions),
            format!("{:.2}%", r.campaigns.avg_ctr),
            format!("{:.1}%", r.engagement.bounce_rate),
            top_city.to_string(),
        ]));
    }

    table.to_string()
}

/// Format a window summary (human or JSON)
pub fn format_summary(summary: &WindowSummary, timeframe: Timeframe, json: bool) -> String {
    if json {
        return serde_json::to_string_pretty(summary).unwrap_or_else(|_| "{}".to_string());
    }

    if summary.is_empty() {
        return format!("No records for {}.", timeframe.display());
    }

    let pct = |v: Option<f64>| v.map(|p| format!("{:.1}%", p)).unwrap_or_else(|| "-".into());

    let mut lines = vec![];
    lines.push(format!("crmboard - {} summary", timeframe.display()));
    lines.push("=".repeat(40));
    if let (Some(first), Some(last)) = (summary.first_date, summary.last_date) {
        lines.push(format!("Period:           {} .. {}", first, last));
    }
    lines.push(format!(
        "Revenue:          {} (avg {}/day)",
        format_number(summary.total_revenue),
        format_number(summary.avg_daily_revenue.round() as u64)
    ));
    lines.push(format!(
        "Customers:        {}",
        format_number(summary.latest_customers)
    ));
    lines.push(format!("VIP share:        {}", pct(summary.avg_vip_share_pct)));
    lines.push(format!(
        "Funnel:           {} → {} → {}",
        format_number(summary.impressions),
        format_number(summary.clicks),
        format_number(summary.conversions)
    ));
    lines.push(format!(
        "CTR / Conversion: {} / {}",
        pct(summary.click_through_pct),
        pct(summary.conversion_pct)
    ));
    lines.push(format!("Avg ROI:          {}", pct(summary.avg_roi_pct)));
    lines.push(format!("Avg bounce:       {}", pct(summary.avg_bounce_rate_pct)));
    lines.push(format!(
        "Avg session:      {}",
        summary
            .avg_session_secs
            .map(|s| format!("{:.0}s", s))
            .unwrap_or_else(|| "-".into())
    ));
    lines.push(String::new());
    lines.push("Revenue by city:".to_string());
    let top = summary.top_city().map(|(city, _)| city);
    for (city, revenue) in &summary.revenue_by_city {
        let marker = if Some(*city) == top { " *" } else { "" };
        lines.push(format!(
            "  {:<15} {:>14}{}",
            city.name(),
            format_number(*revenue),
            marker
        ));
    }

    lines.join("\n")
}

// ============================================================================
// Utilities
// ============================================================================

/// Group thousands with commas
pub fn format_number(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

fn truncate(s: &str, max: usize) -> String {
    let char_count = s.chars().count();
    if char_count <= max {
        s.to_string()
    } else {
        s.chars().take(max - 1).collect::<String>() + "…"
    }
}

// ============================================================================
// Tests
// ============================================================================
