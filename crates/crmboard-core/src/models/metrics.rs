//! Daily metric record model
//!
//! One `MetricRecord` per calendar date. Records are immutable once built;
//! the generator and the snapshot loader are the only producers.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Cities tracked in the geography breakdown.
///
/// `City::ALL` is the fixed iteration order used by the generator when
/// splitting totals and by the insight engine when breaking revenue ties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum City {
    Istanbul,
    Ankara,
    Izmir,
    Bursa,
    Antalya,
}

impl City {
    /// Fixed city order (first entry wins ties)
    pub const ALL: [City; 5] = [
        City::Istanbul,
        City::Ankara,
        City::Izmir,
        City::Bursa,
        City::Antalya,
    ];

    /// Display name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Istanbul => "Istanbul",
            Self::Ankara => "Ankara",
            Self::Izmir => "Izmir",
            Self::Bursa => "Bursa",
            Self::Antalya => "Antalya",
        }
    }
}

impl std::fmt::Display for City {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Customer base broken down by segment
///
/// Invariant: `vip + regular + new + inactive == total`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerSegments {
    pub total: u64,
    pub vip: u64,
    pub regular: u64,
    pub new: u64,
    pub inactive: u64,
}

impl CustomerSegments {
    /// Build segments from drawn counts, deriving `regular` as the remainder.
    ///
    /// Drawn segments are clamped so they never exceed `total`.
    pub fn from_total(total: u64, vip: u64, new: u64, inactive: u64) -> Self {
        let vip = vip.min(total);
        let new = new.min(total - vip);
        let inactive = inactive.min(total - vip - new);
        Self {
            total,
            vip,
            regular: total - vip - new - inactive,
            new,
            inactive,
        }
    }

    /// Segment sum matches the total
    pub fn is_consistent(&self) -> bool {
        self.vip
            .checked_add(self.regular)
            .and_then(|s| s.checked_add(self.new))
            .and_then(|s| s.checked_add(self.inactive))
            == Some(self.total)
    }

    /// VIP share in percent, `None` when there are no customers
    pub fn vip_share_pct(&self) -> Option<f64> {
        self.share_pct(self.vip)
    }

    /// New-customer share in percent, `None` when there are no customers
    pub fn new_share_pct(&self) -> Option<f64> {
        self.share_pct(self.new)
    }

    fn share_pct(&self, part: u64) -> Option<f64> {
        if self.total == 0 {
            return None;
        }
        Some(part as f64 / self.total as f64 * 100.0)
    }
}

/// Campaign activity for the day
///
/// Invariants: `clicks <= impressions`, `conversions <= clicks`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CampaignMetrics {
    /// Number of running campaigns
    pub active: u32,
    pub impressions: u64,
    pub clicks: u64,
    pub conversions: u64,
    /// Click-through rate in percent
    pub avg_ctr: f64,
    /// Return on investment in percent
    pub avg_roi: f64,
}

impl CampaignMetrics {
    pub fn is_consistent(&self) -> bool {
        self.clicks <= self.impressions
            && self.conversions <= self.clicks
            && self.avg_ctr >= 0.0
            && self.avg_roi >= 0.0
    }
}

/// Site/app engagement for the day
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EngagementMetrics {
    /// Average session length in seconds
    pub session_duration: f64,
    pub pages_per_session: f64,
    /// Percent in [0, 100]
    pub bounce_rate: f64,
    /// Percent in [0, 100]
    pub return_rate: f64,
}

impl EngagementMetrics {
    pub fn is_consistent(&self) -> bool {
        self.session_duration >= 0.0
            && self.pages_per_session >= 0.0
            && (0.0..=100.0).contains(&self.bounce_rate)
            && (0.0..=100.0).contains(&self.return_rate)
    }
}

/// Per-city slice of a day's totals
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CityMetrics {
    pub city: City,
    pub customers: u64,
    pub revenue: u64,
    /// Percent in [0, 100]
    pub engagement: f64,
}

/// One day of business metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRecord {
    pub date: NaiveDate,
    pub revenue: u64,
    pub customers: CustomerSegments,
    pub campaigns: CampaignMetrics,
    pub engagement: EngagementMetrics,
    /// Ordered per-city breakdown, in `City::ALL` order when generated
    pub geography: Vec<CityMetrics>,
}

impl MetricRecord {
    /// Per-city entry lookup
    pub fn city(&self, city: City) -> Option<&CityMetrics> {
        self.geography.iter().find(|c| c.city == city)
    }

    /// City with the highest revenue; ties go to the city earliest in `City::ALL`.
    pub fn top_city_by_revenue(&self) -> Option<&CityMetrics> {
        City::ALL
            .iter()
            .filter_map(|&city| self.city(city))
            .fold(None, |best, c| match best {
                Some(b) if b.revenue >= c.revenue => Some(b),
                _ => Some(c),
            })
    }

    /// Check every structural invariant of the record.
    ///
    /// Returns a description of the first violation found.
    pub fn validate(&self) -> Result<(), String> {
        if !self.customers.is_consistent() {
            return Err(format!(
                "{}: customer segments do not sum to total {}",
                self.date, self.customers.total
            ));
        }
        if !self.campaigns.is_consistent() {
            return Err(format!(
                "{}: campaign funnel out of order (impressions {}, clicks {}, conversions {})",
                self.date,
                self.campaigns.impressions,
                self.campaigns.clicks,
                self.campaigns.conversions
            ));
        }
        if !self.engagement.is_consistent() {
            return Err(format!("{}: engagement values out of range", self.date));
        }
        if !self.geography.is_empty() {
            let city_customers: u64 = self.geography.iter().map(|c| c.customers).sum();
            let city_revenue: u64 = self.geography.iter().map(|c| c.revenue).sum();
            if city_customers != self.customers.total {
                return Err(format!(
                    "{}: city customers {} != total {}",
                    self.date, city_customers, self.customers.total
                ));
            }
            if city_revenue != self.revenue {
                return Err(format!(
                    "{}: city revenue {} != revenue {}",
                    self.date, city_revenue, self.revenue
                ));
            }
        }
        Ok(())
    }
}
