//! Analytics over the daily metric series
//!
//! Provides week-over-week insight rules and window summaries for the
//! dashboard's selected timeframe.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

pub mod insights;
pub mod summary;


pub use insights::{generate_insights, generate_insights_at, Finding, Rule, WeekOverWeek, RULES};
pub use summary::{summarize_window, WindowSummary};

/// Timeframe selected on the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Timeframe {
    #[default]
    Daily,
    Monthly,
    Yearly,
}

impl Timeframe {
    pub const ALL: [Timeframe; 3] = [Timeframe::Daily, Timeframe::Monthly, Timeframe::Yearly];

    /// Days of history shown for this timeframe
    pub fn window_days(&self) -> usize {
        match self {
            Timeframe::Daily => 7,
            Timeframe::Monthly => 30,
            Timeframe::Yearly => 365,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Timeframe::Daily => "daily",
            Timeframe::Monthly => "monthly",
            Timeframe::Yearly => "yearly",
        }
    }

    /// Display label
    pub fn display(&self) -> String {
        format!("{} (last {} days)", self.label(), self.window_days())
    }
}

impl FromStr for Timeframe {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "daily" | "d" => Ok(Timeframe::Daily),
            "monthly" | "m" => Ok(Timeframe::Monthly),
            "yearly" | "y" => Ok(Timeframe::Yearly),
            other => Err(format!(
                "unknown timeframe '{}' (expected daily, monthly or yearly)",
                other
            )),
        }
    }
}

impl std::fmt::Display for Timeframe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Mean of the finite values, `None` if there are none
pub(crate) fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values
        .filter(|v| v.is_finite())
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}
