//! Data models for crmboard

pub mod insight;
pub mod metrics;

pub use insight::{DataSource, Insight, InsightPriority, InsightType};
pub use metrics::{
    CampaignMetrics, City, CityMetrics, CustomerSegments, EngagementMetrics, MetricRecord,
};
