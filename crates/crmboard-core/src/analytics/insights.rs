//! Rule-based insight synthesis
//!
//! Compares the most recent week against the week before it and runs a
//! fixed table of threshold rules over the result. Every rule is evaluated
//! on every run and output keeps the table order:
//! - Revenue growth >10% week over week → opportunity
//! - Revenue decline below -5% → warning
//! - VIP share >12% → opportunity
//! - New-customer share <15% → warning
//! - Campaign ROI >200% → opportunity
//! - Top-revenue city engagement >80% → opportunity
//! - Bounce rate >50% → warning
//! - Session duration >300s → trend
//!
//! Ratios with a zero denominator are left out of averages; if nothing is
//! left to average the rule stays silent.

use chrono::{DateTime, NaiveDate, Utc};

use super::mean;
use crate::models::{City, DataSource, Insight, InsightPriority, InsightType, MetricRecord};

/// Days in each comparison window
pub const WEEK_DAYS: usize = 7;

/// Minimum series length before any rule runs
pub const MIN_HISTORY_DAYS: usize = WEEK_DAYS;

pub const REVENUE_GROWTH_THRESHOLD_PCT: f64 = 10.0;
pub const REVENUE_DECLINE_THRESHOLD_PCT: f64 = -5.0;
pub const VIP_SHARE_THRESHOLD_PCT: f64 = 12.0;
pub const NEW_CUSTOMER_SHARE_THRESHOLD_PCT: f64 = 15.0;
pub const CAMPAIGN_ROI_THRESHOLD_PCT: f64 = 200.0;
pub const CITY_ENGAGEMENT_THRESHOLD_PCT: f64 = 80.0;
pub const BOUNCE_RATE_THRESHOLD_PCT: f64 = 50.0;
pub const SESSION_DURATION_THRESHOLD_SECS: f64 = 300.0;

/// Week-over-week view of a series
#[derive(Debug, Clone, Copy)]
pub struct WeekOverWeek<'a> {
    /// Last 7 records
    pub recent: &'a [MetricRecord],
    /// Up to 7 records immediately before `recent`
    pub previous: &'a [MetricRecord],
    pub latest: &'a MetricRecord,
}

impl<'a> WeekOverWeek<'a> {
    /// Split a date-ordered series; `None` when it is shorter than a week.
    pub fn from_series(series: &'a [MetricRecord]) -> Option<Self> {
        if series.len() < MIN_HISTORY_DAYS {
            return None;
        }
        let split = series.len() - WEEK_DAYS;
        let recent = &series[split..];
        let previous = &series[split.saturating_sub(WEEK_DAYS)..split];
        let latest = recent.last()?;

        Some(Self {
            recent,
            previous,
            latest,
        })
    }

    pub fn recent_revenue(&self) -> u64 {
        self.recent.iter().map(|r| r.revenue).sum()
    }

    pub fn previous_revenue(&self) -> u64 {
        self.previous.iter().map(|r| r.revenue).sum()
    }

    /// Week-over-week revenue change in percent
    pub fn revenue_growth_pct(&self) -> Option<f64> {
        let previous = self.previous_revenue();
        if previous == 0 {
            return None;
        }
        let recent = self.recent_revenue() as f64;
        Some((recent - previous as f64) / previous as f64 * 100.0)
    }

    pub fn avg_vip_share_pct(&self) -> Option<f64> {
        mean(self.recent.iter().filter_map(|r| r.customers.vip_share_pct()))
    }

    pub fn avg_new_share_pct(&self) -> Option<f64> {
        mean(self.recent.iter().filter_map(|r| r.customers.new_share_pct()))
    }

    pub fn avg_campaign_roi(&self) -> Option<f64> {
        mean(self.recent.iter().map(|r| r.campaigns.avg_roi))
    }

    pub fn avg_bounce_rate(&self) -> Option<f64> {
        mean(self.recent.iter().map(|r| r.engagement.bounce_rate))
    }

    pub fn avg_session_duration(&self) -> Option<f64> {
        mean(self.recent.iter().map(|r| r.engagement.session_duration))
    }
}

/// Computed figures a firing rule interpolates into its text
///
/// One variant per rule, so rendering never has to pair a rule with a
/// finding shape it did not produce.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Finding {
    RevenueGrowth { pct: f64, recent: u64, previous: u64 },
    RevenueDecline { pct: f64, recent: u64, previous: u64 },
    VipShareHigh { avg_pct: f64 },
    NewCustomerShareLow { avg_pct: f64 },
    HighCampaignRoi { avg_pct: f64 },
    TopCityEngagement {
        city: City,
        date: NaiveDate,
        revenue: u64,
        engagement: f64,
    },
    HighBounceRate { avg_pct: f64 },
    LongSessionDuration { avg_secs: f64 },
}

impl Finding {
    /// Title, description and impact estimate
    pub fn render(&self) -> (String, String, String) {
        match *self {
            Finding::RevenueGrowth {
                pct,
                recent,
                previous,
            } => (
                "Strong revenue growth".to_string(),
                format!(
                    "Revenue grew {:.1}% over the last 7 days ({} vs {} the week before).",
                    pct, recent, previous
                ),
                format!(
                    "About +{} revenue per week if the trend holds",
                    recent.saturating_sub(previous)
                ),
            ),
            Finding::RevenueDecline {
                pct,
                recent,
                previous,
            } => (
                "Revenue decline detected".to_string(),
                format!(
                    "Revenue fell {:.1}% over the last 7 days ({} vs {} the week before).",
                    pct.abs(),
                    recent,
                    previous
                ),
                format!(
                    "About -{} revenue per week at the current pace",
                    previous.saturating_sub(recent)
                ),
            ),
            Finding::VipShareHigh { avg_pct } => (
                "High share of VIP customers".to_string(),
                format!(
                    "VIP customers made up {:.1}% of the customer base over the last 7 days.",
                    avg_pct
                ),
                "Premium offers could lift VIP revenue by 15-20%".to_string(),
            ),
            Finding::NewCustomerShareLow { avg_pct } => (
                "New customer acquisition is slowing".to_string(),
                format!(
                    "New customers were only {:.1}% of the customer base over the last 7 days (target {:.0}%).",
                    avg_pct, NEW_CUSTOMER_SHARE_THRESHOLD_PCT
                ),
                format!(
                    "Closing the {:.1} point gap keeps the customer base growing",
                    NEW_CUSTOMER_SHARE_THRESHOLD_PCT - avg_pct
                ),
            ),
            Finding::HighCampaignRoi { avg_pct } => (
                "Campaigns are delivering high ROI".to_string(),
                format!(
                    "Average campaign ROI reached {:.1}% over the last 7 days.",
                    avg_pct
                ),
                "Moving 20% more budget to these campaigns could raise returns proportionally"
                    .to_string(),
            ),
            Finding::TopCityEngagement {
                city,
                date,
                revenue,
                engagement,
            } => (
                format!("{} leads with strong engagement", city),
                format!(
                    "{} generated the most revenue on {} ({}) with {:.1}% engagement.",
                    city, date, revenue, engagement
                ),
                format!(
                    "Localized campaigns in {} could compound the engagement lead",
                    city
                ),
            ),
            Finding::HighBounceRate { avg_pct } => (
                "High bounce rate".to_string(),
                format!(
                    "Average bounce rate was {:.1}% over the last 7 days.",
                    avg_pct
                ),
                format!(
                    "Bringing it under {:.0}% would keep {:.1}% more visitors on site",
                    BOUNCE_RATE_THRESHOLD_PCT,
                    avg_pct - BOUNCE_RATE_THRESHOLD_PCT
                ),
            ),
            Finding::LongSessionDuration { avg_secs } => (
                "Visitors are staying longer".to_string(),
                format!(
                    "Average session duration was {:.0}s ({:.1} minutes) over the last 7 days.",
                    avg_secs,
                    avg_secs / 60.0
                ),
                "Engaged visitors are good targets for upsell content".to_string(),
            ),
        }
    }
}

/// The fixed insight rule table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rule {
    RevenueGrowth,
    RevenueDecline,
    VipShareHigh,
    NewCustomerShareLow,
    HighCampaignRoi,
    TopCityEngagement,
    HighBounceRate,
    LongSessionDuration,
}

/// Rules in evaluation (and output) order
pub const RULES: [Rule; 8] = [
    Rule::RevenueGrowth,
    Rule::RevenueDecline,
    Rule::VipShareHigh,
    Rule::NewCustomerShareLow,
    Rule::HighCampaignRoi,
    Rule::TopCityEngagement,
    Rule::HighBounceRate,
    Rule::LongSessionDuration,
];

impl Rule {
    /// Stable identifier, used as the insight id prefix
    pub fn slug(&self) -> &'static str {
        match self {
            Self::RevenueGrowth => "revenue-growth",
            Self::RevenueDecline => "revenue-decline",
            Self::VipShareHigh => "vip-share-high",
            Self::NewCustomerShareLow => "new-customer-share-low",
            Self::HighCampaignRoi => "high-campaign-roi",
            Self::TopCityEngagement => "top-city-engagement",
            Self::HighBounceRate => "high-bounce-rate",
            Self::LongSessionDuration => "long-session-duration",
        }
    }

    pub fn insight_type(&self) -> InsightType {
        match self {
            Self::RevenueGrowth
            | Self::VipShareHigh
            | Self::HighCampaignRoi
            | Self::TopCityEngagement => InsightType::Opportunity,
            Self::RevenueDecline | Self::NewCustomerShareLow | Self::HighBounceRate => {
                InsightType::Warning
            }
            Self::LongSessionDuration => InsightType::Trend,
        }
    }

    pub fn priority(&self) -> InsightPriority {
        match self {
            Self::RevenueGrowth | Self::RevenueDecline | Self::HighCampaignRoi => {
                InsightPriority::High
            }
            Self::VipShareHigh
            | Self::NewCustomerShareLow
            | Self::TopCityEngagement
            | Self::HighBounceRate => InsightPriority::Medium,
            Self::LongSessionDuration => InsightPriority::Low,
        }
    }

    pub fn confidence(&self) -> u8 {
        match self {
            Self::RevenueGrowth => 92,
            Self::RevenueDecline => 89,
            Self::VipShareHigh => 85,
            Self::NewCustomerShareLow => 88,
            Self::HighCampaignRoi => 94,
            Self::TopCityEngagement => 82,
            Self::HighBounceRate => 86,
            Self::LongSessionDuration => 90,
        }
    }

    pub fn data_sources(&self) -> &'static [DataSource] {
        match self {
            Self::RevenueGrowth | Self::RevenueDecline => &[DataSource::Revenue],
            Self::VipShareHigh | Self::NewCustomerShareLow => &[DataSource::Customers],
            Self::HighCampaignRoi => &[DataSource::Campaigns, DataSource::Revenue],
            Self::TopCityEngagement => &[DataSource::Geography, DataSource::Engagement],
            Self::HighBounceRate | Self::LongSessionDuration => &[DataSource::Engagement],
        }
    }

    pub fn actions(&self) -> &'static [&'static str] {
        match self {
            Self::RevenueGrowth => &[
                "Scale budget on the best-performing campaigns",
                "Check stock levels for top-selling products",
                "Reinvest part of the gain into customer acquisition",
            ],
            Self::RevenueDecline => &[
                "Review campaign and pricing changes from the last two weeks",
                "Launch a win-back offer for inactive customers",
                "Compare prices against key competitors",
            ],
            Self::VipShareHigh => &[
                "Introduce an exclusive VIP loyalty tier",
                "Offer VIP customers early access to new products",
                "Assign dedicated account managers to top accounts",
            ],
            Self::NewCustomerShareLow => &[
                "Start a referral program with rewards for both sides",
                "Increase top-of-funnel advertising spend",
                "Offer a first-purchase discount",
            ],
            Self::HighCampaignRoi => &[
                "Shift budget from low-ROI campaigns to the top performers",
                "Duplicate winning creatives into new audiences",
                "Raise daily caps on high-ROI campaigns",
            ],
            Self::TopCityEngagement => &[
                "Run a localized campaign in the leading city",
                "Host an in-person event for local customers",
                "Use the city as a pilot market for new offers",
            ],
            Self::HighBounceRate => &[
                "Audit landing page load times",
                "Align ad copy with landing page content",
                "A/B test a simplified landing page layout",
            ],
            Self::LongSessionDuration => &[
                "Place upsell content in long-session pages",
                "Add newsletter sign-up prompts for engaged visitors",
            ],
        }
    }

    /// Evaluate this rule's condition. `None` means the rule does not fire.
    pub fn check(&self, wow: &WeekOverWeek<'_>) -> Option<Finding> {
        match self {
            Self::RevenueGrowth => {
                let pct = wow.revenue_growth_pct()?;
                (pct > REVENUE_GROWTH_THRESHOLD_PCT).then(|| Finding::RevenueGrowth {
                    pct,
                    recent: wow.recent_revenue(),
                    previous: wow.previous_revenue(),
                })
            }
            Self::RevenueDecline => {
                let pct = wow.revenue_growth_pct()?;
                (pct < REVENUE_DECLINE_THRESHOLD_PCT).then(|| Finding::RevenueDecline {
                    pct,
                    recent: wow.recent_revenue(),
                    previous: wow.previous_revenue(),
                })
            }
            Self::VipShareHigh => wow
                .avg_vip_share_pct()
                .filter(|v| *v > VIP_SHARE_THRESHOLD_PCT)
                .map(|avg_pct| Finding::VipShareHigh { avg_pct }),
            Self::NewCustomerShareLow => wow
                .avg_new_share_pct()
                .filter(|v| *v < NEW_CUSTOMER_SHARE_THRESHOLD_PCT)
                .map(|avg_pct| Finding::NewCustomerShareLow { avg_pct }),
            Self::HighCampaignRoi => wow
                .avg_campaign_roi()
                .filter(|v| *v > CAMPAIGN_ROI_THRESHOLD_PCT)
                .map(|avg_pct| Finding::HighCampaignRoi { avg_pct }),
            Self::TopCityEngagement => {
                let top = wow.latest.top_city_by_revenue()?;
                (top.engagement > CITY_ENGAGEMENT_THRESHOLD_PCT).then(|| {
                    Finding::TopCityEngagement {
                        city: top.city,
                        date: wow.latest.date,
                        revenue: top.revenue,
                        engagement: top.engagement,
                    }
                })
            }
            Self::HighBounceRate => wow
                .avg_bounce_rate()
                .filter(|v| *v > BOUNCE_RATE_THRESHOLD_PCT)
                .map(|avg_pct| Finding::HighBounceRate { avg_pct }),
            Self::LongSessionDuration => wow
                .avg_session_duration()
                .filter(|v| *v > SESSION_DURATION_THRESHOLD_SECS)
                .map(|avg_secs| Finding::LongSessionDuration { avg_secs }),
        }
    }

    /// Check the rule and build its insight if it fires
    pub fn fire(&self, wow: &WeekOverWeek<'_>, now: DateTime<Utc>) -> Option<Insight> {
        let finding = self.check(wow)?;
        let (title, description, impact_estimate) = finding.render();

        Some(Insight {
            id: format!("{}-{}", self.slug(), now.timestamp_millis()),
            insight_type: self.insight_type(),
            priority: self.priority(),
            title,
            description,
            data_source: self.data_sources().to_vec(),
            confidence: self.confidence(),
            impact_estimate,
            created_at: now,
            actions: self.actions().iter().map(|a| a.to_string()).collect(),
        })
    }
}

/// Generate insights for a date-ordered series, stamped with the current time
///
/// # Performance
/// Bounded by two 7-record windows; no allocation beyond the output.
pub fn generate_insights(series: &[MetricRecord]) -> Vec<Insight> {
    generate_insights_at(series, Utc::now())
}

/// Generate insights with an explicit generation timestamp
///
/// Returns an empty list when the series is shorter than a week.
pub fn generate_insights_at(series: &[MetricRecord], now: DateTime<Utc>) -> Vec<Insight> {
    let Some(wow) = WeekOverWeek::from_series(series) else {
        tracing::debug!(
            records = series.len(),
            required = MIN_HISTORY_DAYS,
            "Not enough history for insights"
        );
        return Vec::new();
    };

    let insights: Vec<Insight> = RULES.iter().filter_map(|rule| rule.fire(&wow, now)).collect();

    tracing::debug!(
        records = series.len(),
        fired = insights.len(),
        "Insight rules evaluated"
    );

    insights
}
