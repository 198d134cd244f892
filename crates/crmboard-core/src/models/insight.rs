//! Insight model produced by the insight engine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of observation an insight represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightType {
    Opportunity,
    Warning,
    Trend,
    Recommendation,
}

impl InsightType {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Opportunity => "opportunity",
            Self::Warning => "warning",
            Self::Trend => "trend",
            Self::Recommendation => "recommendation",
        }
    }

    /// Icon representation for terminal display
    pub fn icon(&self) -> &'static str {
        match self {
            Self::Opportunity => "📈",
            Self::Warning => "⚠️",
            Self::Trend => "📊",
            Self::Recommendation => "💡",
        }
    }

    /// Color name for presentation styling
    pub fn color_name(&self) -> &'static str {
        match self {
            Self::Opportunity => "green",
            Self::Warning => "yellow",
            Self::Trend => "blue",
            Self::Recommendation => "magenta",
        }
    }
}

/// Insight urgency. Ordered so that `High > Medium > Low`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightPriority {
    Low,
    Medium,
    High,
}

impl InsightPriority {
    pub fn label(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }

    pub fn color_name(&self) -> &'static str {
        match self {
            Self::High => "red",
            Self::Medium => "yellow",
            Self::Low => "gray",
        }
    }
}

/// Metric category a rule consulted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    Revenue,
    Customers,
    Campaigns,
    Engagement,
    Geography,
}

impl DataSource {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Revenue => "revenue",
            Self::Customers => "customers",
            Self::Campaigns => "campaigns",
            Self::Engagement => "engagement",
            Self::Geography => "geography",
        }
    }
}

/// A generated, prioritized observation
///
/// Built once per engine run and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    /// Rule slug plus generation timestamp
    pub id: String,
    #[serde(rename = "type")]
    pub insight_type: InsightType,
    pub priority: InsightPriority,
    pub title: String,
    pub description: String,
    pub data_source: Vec<DataSource>,
    /// 0-100
    pub confidence: u8,
    pub impact_estimate: String,
    pub created_at: DateTime<Utc>,
    pub actions: Vec<String>,
}

impl Insight {
    /// Check the fields a restored insight must satisfy.
    ///
    /// Returns a description of the first violation found.
    pub fn validate(&self) -> Result<(), String> {
        if self.id.trim().is_empty() {
            return Err("insight with empty id".to_string());
        }
        if self.title.trim().is_empty() {
            return Err(format!("insight {}: empty title", self.id));
        }
        if self.confidence > 100 {
            return Err(format!(
                "insight {}: confidence {} out of range 0-100",
                self.id, self.confidence
            ));
        }
        Ok(())
    }
}
