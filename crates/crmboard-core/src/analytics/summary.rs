//! KPI aggregation over a window of records

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::mean;
use crate::models::{City, MetricRecord};

/// Aggregated figures for a contiguous window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowSummary {
    pub days: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub total_revenue: u64,
    pub avg_daily_revenue: f64,
    /// Customer total on the last day of the window
    pub latest_customers: u64,
    /// Average VIP share (%), days without customers excluded
    pub avg_vip_share_pct: Option<f64>,
    pub impressions: u64,
    pub clicks: u64,
    pub conversions: u64,
    /// clicks / impressions (%), `None` without impressions
    pub click_through_pct: Option<f64>,
    /// conversions / clicks (%), `None` without clicks
    pub conversion_pct: Option<f64>,
    pub avg_roi_pct: Option<f64>,
    pub avg_bounce_rate_pct: Option<f64>,
    pub avg_session_secs: Option<f64>,
    /// Revenue per city in `City::ALL` order
    pub revenue_by_city: Vec<(City, u64)>,
}

impl WindowSummary {
    pub fn is_empty(&self) -> bool {
        self.days == 0
    }

    /// City with the most revenue over the window; first in `City::ALL` wins ties.
    pub fn top_city(&self) -> Option<(City, u64)> {
        self.revenue_by_city
            .iter()
            .copied()
            .fold(None, |best, (city, revenue)| match best {
                Some((_, best_revenue)) if best_revenue >= revenue => best,
                _ => Some((city, revenue)),
            })
    }
}

fn ratio_pct(part: u64, whole: u64) -> Option<f64> {
    (whole > 0).then(|| part as f64 / whole as f64 * 100.0)
}

/// Summarize a date-ordered window
pub fn summarize_window(window: &[MetricRecord]) -> WindowSummary {
    let total_revenue: u64 = window.iter().map(|r| r.revenue).sum();
    let impressions: u64 = window.iter().map(|r| r.campaigns.impressions).sum();
    let clicks: u64 = window.iter().map(|r| r.campaigns.clicks).sum();
    let conversions: u64 = window.iter().map(|r| r.campaigns.conversions).sum();

    let revenue_by_city = City::ALL
        .iter()
        .map(|&city| {
            let revenue = window
                .iter()
                .filter_map(|r| r.city(city))
                .map(|c| c.revenue)
                .sum();
            (city, revenue)
        })
        .collect();

    WindowSummary {
        days: window.len(),
        first_date: window.first().map(|r| r.date),
        last_date: window.last().map(|r| r.date),
        total_revenue,
        avg_daily_revenue: if window.is_empty() {
            0.0
        } else {
            total_revenue as f64 / window.len() as f64
        },
        latest_customers: window.last().map(|r| r.customers.total).unwrap_or(0),
        avg_vip_share_pct: mean(window.iter().filter_map(|r| r.customers.vip_share_pct())),
        impressions,
        clicks,
        conversions,
        click_through_pct: ratio_pct(clicks, impressions),
        conversion_pct: ratio_pct(conversions, clicks),
        avg_roi_pct: mean(window.iter().map(|r| r.campaigns.avg_roi)),
        avg_bounce_rate_pct: mean(window.iter().map(|r| r.engagement.bounce_rate)),
        avg_session_secs: mean(window.iter().map(|r| r.engagement.session_duration)),
        revenue_by_city,
    }
}
