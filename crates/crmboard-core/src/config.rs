//! Dashboard configuration
//!
//! Loaded from an optional TOML file. Every field has a default, so a
//! missing file or a partial file is fine:
//!
//! ```toml
//! persist_insights = true
//!
//! [generator]
//! horizon_days = 365
//! base_revenue = 50000.0
//!
//! [generator.vip_share]
//! min = 0.08
//! max = 0.16
//! ```

use crate::error::CoreError;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Closed interval a generator quantity is drawn from
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateRange {
    pub min: f64,
    pub max: f64,
}

impl RateRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Uniform draw in `[min, max]`
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        if self.max <= self.min {
            return self.min;
        }
        rng.gen_range(self.min..=self.max)
    }

    pub fn contains(&self, value: f64) -> bool {
        (self.min..=self.max).contains(&value)
    }

    fn validate(&self, name: &str) -> Result<(), CoreError> {
        if !self.min.is_finite() || !self.max.is_finite() || self.min < 0.0 || self.min > self.max {
            return Err(CoreError::InvalidConfig {
                message: format!(
                    "{} must satisfy 0 <= min <= max (got {}..{})",
                    name, self.min, self.max
                ),
            });
        }
        Ok(())
    }
}

/// Longest history the generator will produce (ten years)
pub const MAX_HORIZON_DAYS: u32 = 3650;

/// Parameters of the synthetic series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Days of history before the reference date
    pub horizon_days: u32,
    pub base_revenue: f64,
    /// Amplitude of the yearly sine wave
    pub seasonal_amplitude: f64,
    /// Linear growth per day index
    pub daily_growth_rate: f64,
    /// Multiplicative noise band
    pub noise: RateRange,
    pub base_customers: u64,
    pub daily_customer_growth: f64,
    /// Absolute +/- noise on the customer total
    pub customer_jitter: u64,
    pub vip_share: RateRange,
    pub new_share: RateRange,
    pub inactive_share: RateRange,
    pub active_campaigns: RateRange,
    /// Impressions per unit of revenue
    pub impressions_per_revenue: RateRange,
    /// Click-through rate as a fraction
    pub ctr: RateRange,
    /// Conversions per click as a fraction
    pub conversion_rate: RateRange,
    /// ROI in percent
    pub roi_pct: RateRange,
    pub session_duration_secs: RateRange,
    pub pages_per_session: RateRange,
    pub bounce_rate_pct: RateRange,
    pub return_rate_pct: RateRange,
    /// Fraction of the remaining total allocated to each city but the last
    pub city_share: RateRange,
    pub city_engagement_pct: RateRange,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            horizon_days: 365,
            base_revenue: 50_000.0,
            seasonal_amplitude: 0.3,
            daily_growth_rate: 0.001,
            noise: RateRange::new(0.8, 1.2),
            base_customers: 5_000,
            daily_customer_growth: 12.0,
            customer_jitter: 150,
            vip_share: RateRange::new(0.08, 0.16),
            new_share: RateRange::new(0.10, 0.20),
            inactive_share: RateRange::new(0.05, 0.15),
            active_campaigns: RateRange::new(5.0, 15.0),
            impressions_per_revenue: RateRange::new(8.0, 12.0),
            ctr: RateRange::new(0.02, 0.05),
            conversion_rate: RateRange::new(0.02, 0.08),
            roi_pct: RateRange::new(120.0, 320.0),
            session_duration_secs: RateRange::new(180.0, 420.0),
            pages_per_session: RateRange::new(2.0, 8.0),
            bounce_rate_pct: RateRange::new(25.0, 65.0),
            return_rate_pct: RateRange::new(20.0, 60.0),
            city_share: RateRange::new(0.15, 0.35),
            city_engagement_pct: RateRange::new(60.0, 95.0),
        }
    }
}

impl GeneratorConfig {
    /// Reject parameters that would break record invariants
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.horizon_days == 0 {
            return Err(CoreError::InvalidConfig {
                message: "generator.horizon_days must be positive".to_string(),
            });
        }
        if self.horizon_days > MAX_HORIZON_DAYS {
            return Err(CoreError::InvalidConfig {
                message: format!(
                    "generator.horizon_days is {}, must not exceed {}",
                    self.horizon_days, MAX_HORIZON_DAYS
                ),
            });
        }
        if !self.base_revenue.is_finite() || self.base_revenue < 0.0 {
            return Err(CoreError::InvalidConfig {
                message: "generator.base_revenue must be non-negative".to_string(),
            });
        }
        if !(0.0..1.0).contains(&self.seasonal_amplitude) {
            return Err(CoreError::InvalidConfig {
                message: "generator.seasonal_amplitude must be in [0, 1)".to_string(),
            });
        }

        let ranges = [
            ("generator.noise", &self.noise),
            ("generator.vip_share", &self.vip_share),
            ("generator.new_share", &self.new_share),
            ("generator.inactive_share", &self.inactive_share),
            ("generator.active_campaigns", &self.active_campaigns),
            ("generator.impressions_per_revenue", &self.impressions_per_revenue),
            ("generator.ctr", &self.ctr),
            ("generator.conversion_rate", &self.conversion_rate),
            ("generator.roi_pct", &self.roi_pct),
            ("generator.session_duration_secs", &self.session_duration_secs),
            ("generator.pages_per_session", &self.pages_per_session),
            ("generator.bounce_rate_pct", &self.bounce_rate_pct),
            ("generator.return_rate_pct", &self.return_rate_pct),
            ("generator.city_share", &self.city_share),
            ("generator.city_engagement_pct", &self.city_engagement_pct),
        ];
        for (name, range) in ranges {
            range.validate(name)?;
        }

        for (name, range) in [
            ("generator.ctr", &self.ctr),
            ("generator.conversion_rate", &self.conversion_rate),
            ("generator.city_share", &self.city_share),
        ] {
            if range.max > 1.0 {
                return Err(CoreError::InvalidConfig {
                    message: format!("{} is a fraction and must not exceed 1.0", name),
                });
            }
        }

        for (name, range) in [
            ("generator.bounce_rate_pct", &self.bounce_rate_pct),
            ("generator.return_rate_pct", &self.return_rate_pct),
            ("generator.city_engagement_pct", &self.city_engagement_pct),
        ] {
            if range.max > 100.0 {
                return Err(CoreError::InvalidConfig {
                    message: format!("{} is a percentage and must not exceed 100", name),
                });
            }
        }

        let max_segments = self.vip_share.max + self.new_share.max + self.inactive_share.max;
        if max_segments > 1.0 {
            return Err(CoreError::InvalidConfig {
                message: format!(
                    "vip + new + inactive share maxima sum to {:.2}, must not exceed 1.0",
                    max_segments
                ),
            });
        }

        Ok(())
    }
}

/// Top-level dashboard configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub generator: GeneratorConfig,
    /// Write the insight list into the snapshot alongside the series
    pub persist_insights: bool,
    /// Snapshot location (defaults to the user cache directory)
    pub snapshot_path: Option<PathBuf>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            generator: GeneratorConfig::default(),
            persist_insights: true,
            snapshot_path: None,
        }
    }
}

impl DashboardConfig {
    /// Load configuration from a TOML file.
    ///
    /// A missing file yields the defaults; an unreadable or invalid file is an error.
    pub fn load(path: &Path) -> Result<Self, CoreError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|source| CoreError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;

        let config: Self = toml::from_str(&content).map_err(|source| CoreError::TomlParse {
            path: path.to_path_buf(),
            message: source.message().to_string(),
            source,
        })?;

        config.generator.validate()?;
        tracing::debug!(path = %path.display(), "Config loaded");
        Ok(config)
    }

    /// Default config location: `<config_dir>/crmboard/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("crmboard").join("config.toml"))
    }

    /// Snapshot path from config, falling back to `<cache_dir>/crmboard/snapshot.json`
    pub fn resolved_snapshot_path(&self) -> Option<PathBuf> {
        self.snapshot_path
            .clone()
            .or_else(|| dirs::cache_dir().map(|d| d.join("crmboard").join("snapshot.json")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_are_valid() {
        assert!(GeneratorConfig::default().validate().is_ok());
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let config = DashboardConfig::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, DashboardConfig::default());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "persist_insights = false\n\n[generator]\nhorizon_days = 30\n\n[generator.vip_share]\nmin = 0.1\nmax = 0.2\n",
        )
        .unwrap();

        let config = DashboardConfig::load(&path).unwrap();
        assert!(!config.persist_insights);
        assert_eq!(config.generator.horizon_days, 30);
        assert_eq!(config.generator.vip_share, RateRange::new(0.1, 0.2));
        assert_eq!(config.generator.base_customers, 5_000);
    }

    #[test]
    fn test_invalid_toml_is_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "generator = [not toml").unwrap();

        let err = DashboardConfig::load(&path).unwrap_err();
        assert!(matches!(err, CoreError::TomlParse { .. }));
    }

    #[test]
    fn test_segment_maxima_over_one_rejected() {
        let config = GeneratorConfig {
            vip_share: RateRange::new(0.3, 0.5),
            new_share: RateRange::new(0.3, 0.4),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(CoreError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_horizon_capped_at_ten_years() {
        let at_cap = GeneratorConfig {
            horizon_days: MAX_HORIZON_DAYS,
            ..Default::default()
        };
        assert!(at_cap.validate().is_ok());

        let huge = GeneratorConfig {
            horizon_days: 4_000_000_000,
            ..Default::default()
        };
        let err = huge.validate().unwrap_err();
        assert!(err.to_string().contains("horizon_days"));
    }

    #[test]
    fn test_inverted_range_rejected() {
        let config = GeneratorConfig {
            noise: RateRange::new(1.2, 0.8),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
