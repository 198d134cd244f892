//! Synthetic historical metrics
//!
//! Builds one `MetricRecord` per day as seasonal × growth × noise, then
//! derives every dependent field so the record invariants hold exactly:
//! segment remainders, funnel ordering, and last-city-absorbs-remainder
//! geography. Values are not reproducible across runs unless the caller
//! passes a seeded RNG to [`SeriesGenerator::generate_with_rng`].

use chrono::{Datelike, Days, NaiveDate};
use rand::Rng;
use std::f64::consts::PI;

use crate::config::{GeneratorConfig, MAX_HORIZON_DAYS};
use crate::models::{
    CampaignMetrics, City, CityMetrics, CustomerSegments, EngagementMetrics, MetricRecord,
};

/// Synthesizes a daily metric series ending at a reference date
#[derive(Debug, Clone, Default)]
pub struct SeriesGenerator {
    config: GeneratorConfig,
}

impl SeriesGenerator {
    pub fn new(config: GeneratorConfig) -> Self {
        Self { config }
    }

    /// Generate `horizon_days + 1` records ending at `reference_date` (inclusive)
    ///
    /// The horizon is clamped to [`MAX_HORIZON_DAYS`] for configs that
    /// never went through validation.
    pub fn generate(&self, reference_date: NaiveDate) -> Vec<MetricRecord> {
        self.generate_with_rng(reference_date, &mut rand::thread_rng())
    }

    /// Same as [`generate`](Self::generate) with a caller-supplied RNG
    pub fn generate_with_rng<R: Rng + ?Sized>(
        &self,
        reference_date: NaiveDate,
        rng: &mut R,
    ) -> Vec<MetricRecord> {
        let start = reference_date
            .checked_sub_days(Days::new(u64::from(
                self.config.horizon_days.min(MAX_HORIZON_DAYS),
            )))
            .unwrap_or(NaiveDate::MIN);

        let series: Vec<MetricRecord> = start
            .iter_days()
            .take_while(|date| *date <= reference_date)
            .enumerate()
            .map(|(i, date)| self.build_record(i, date, rng))
            .collect();

        tracing::debug!(
            records = series.len(),
            first = %start,
            last = %reference_date,
            "Generated metric series"
        );

        series
    }

    fn build_record<R: Rng + ?Sized>(
        &self,
        day_index: usize,
        date: NaiveDate,
        rng: &mut R,
    ) -> MetricRecord {
        let cfg = &self.config;
        let i = day_index as f64;

        let seasonal =
            1.0 + cfg.seasonal_amplitude * (2.0 * PI * f64::from(date.ordinal()) / 365.0).sin();
        let growth = 1.0 + i * cfg.daily_growth_rate;
        let noise = cfg.noise.sample(rng);
        let revenue = to_count(cfg.base_revenue * seasonal * growth * noise);

        let customers = self.build_customers(i, rng);
        let campaigns = self.build_campaigns(revenue, rng);
        let engagement = EngagementMetrics {
            session_duration: round_to(cfg.session_duration_secs.sample(rng), 1),
            pages_per_session: round_to(cfg.pages_per_session.sample(rng), 1),
            bounce_rate: round_to(cfg.bounce_rate_pct.sample(rng), 1),
            return_rate: round_to(cfg.return_rate_pct.sample(rng), 1),
        };
        let geography = self.split_geography(customers.total, revenue, rng);

        MetricRecord {
            date,
            revenue,
            customers,
            campaigns,
            engagement,
            geography,
        }
    }

    fn build_customers<R: Rng + ?Sized>(&self, i: f64, rng: &mut R) -> CustomerSegments {
        let cfg = &self.config;
        let jitter = cfg.customer_jitter as f64;
        let total = to_count(
            cfg.base_customers as f64 + i * cfg.daily_customer_growth + rng.gen_range(-jitter..=jitter),
        );

        let vip = to_count(total as f64 * cfg.vip_share.sample(rng));
        let new = to_count(total as f64 * cfg.new_share.sample(rng));
        let inactive = to_count(total as f64 * cfg.inactive_share.sample(rng));

        CustomerSegments::from_total(total, vip, new, inactive)
    }

    fn build_campaigns<R: Rng + ?Sized>(&self, revenue: u64, rng: &mut R) -> CampaignMetrics {
        let cfg = &self.config;

        // Funnel is derived top-down; each stage is a fraction <= 1 of the previous.
        let impressions = to_count(revenue as f64 * cfg.impressions_per_revenue.sample(rng));
        let ctr = cfg.ctr.sample(rng);
        let clicks = to_count(impressions as f64 * ctr).min(impressions);
        let conversions = to_count(clicks as f64 * cfg.conversion_rate.sample(rng)).min(clicks);

        CampaignMetrics {
            active: cfg.active_campaigns.sample(rng).round() as u32,
            impressions,
            clicks,
            conversions,
            avg_ctr: round_to(ctr * 100.0, 2),
            avg_roi: round_to(cfg.roi_pct.sample(rng), 1),
        }
    }

    fn split_geography<R: Rng + ?Sized>(
        &self,
        total_customers: u64,
        total_revenue: u64,
        rng: &mut R,
    ) -> Vec<CityMetrics> {
        let cfg = &self.config;
        let mut remaining_customers = total_customers;
        let mut remaining_revenue = total_revenue;
        let last = City::ALL.len() - 1;

        City::ALL
            .iter()
            .enumerate()
            .map(|(idx, &city)| {
                let (customers, revenue) = if idx == last {
                    (remaining_customers, remaining_revenue)
                } else {
                    let fraction = cfg.city_share.sample(rng);
                    (
                        to_count(remaining_customers as f64 * fraction).min(remaining_customers),
                        to_count(remaining_revenue as f64 * fraction).min(remaining_revenue),
                    )
                };
                remaining_customers -= customers;
                remaining_revenue -= revenue;

                CityMetrics {
                    city,
                    customers,
                    revenue,
                    engagement: round_to(cfg.city_engagement_pct.sample(rng), 1),
                }
            })
            .collect()
    }
}

/// Round to a non-negative integer count
fn to_count(value: f64) -> u64 {
    if value.is_finite() && value > 0.0 {
        value.round() as u64
    } else {
        0
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RateRange;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn reference() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 30).unwrap()
    }

    fn generate_seeded(config: GeneratorConfig, seed: u64) -> Vec<MetricRecord> {
        let mut rng = StdRng::seed_from_u64(seed);
        SeriesGenerator::new(config).generate_with_rng(reference(), &mut rng)
    }

    #[test]
    fn test_covers_horizon_inclusive_without_gaps() {
        let series = generate_seeded(GeneratorConfig::default(), 7);

        assert_eq!(series.len(), 366);
        assert_eq!(series.first().unwrap().date, NaiveDate::from_ymd_opt(2023, 7, 1).unwrap());
        assert_eq!(series.last().unwrap().date, reference());
        for pair in series.windows(2) {
            assert_eq!(pair[0].date.succ_opt().unwrap(), pair[1].date);
        }
    }

    #[test]
    fn test_every_record_satisfies_invariants() {
        for seed in 0..5 {
            for record in generate_seeded(GeneratorConfig::default(), seed) {
                assert_eq!(
                    record.customers.vip
                        + record.customers.regular
                        + record.customers.new
                        + record.customers.inactive,
                    record.customers.total
                );
                assert!(record.campaigns.clicks <= record.campaigns.impressions);
                assert!(record.campaigns.conversions <= record.campaigns.clicks);
                assert_eq!(
                    record.geography.iter().map(|c| c.customers).sum::<u64>(),
                    record.customers.total
                );
                assert_eq!(
                    record.geography.iter().map(|c| c.revenue).sum::<u64>(),
                    record.revenue
                );
                assert!(record.validate().is_ok(), "{:?}", record.validate());
            }
        }
    }

    #[test]
    fn test_geography_follows_city_order() {
        let series = generate_seeded(GeneratorConfig::default(), 3);
        let cities: Vec<City> = series[0].geography.iter().map(|c| c.city).collect();
        assert_eq!(cities, City::ALL.to_vec());
    }

    #[test]
    fn test_growth_trends_upward_without_noise() {
        let config = GeneratorConfig {
            seasonal_amplitude: 0.0,
            noise: RateRange::new(1.0, 1.0),
            customer_jitter: 0,
            ..Default::default()
        };
        let series = generate_seeded(config, 1);

        let first = series.first().unwrap();
        let last = series.last().unwrap();
        assert_eq!(first.revenue, 50_000);
        assert!(last.revenue > first.revenue);
        assert!(last.customers.total > first.customers.total);
    }

    #[test]
    fn test_ranges_are_respected() {
        let config = GeneratorConfig::default();
        for record in generate_seeded(config.clone(), 11) {
            assert!(config.bounce_rate_pct.contains(record.engagement.bounce_rate));
            assert!(record.engagement.return_rate <= 100.0);
            for city in &record.geography {
                assert!((0.0..=100.0).contains(&city.engagement));
            }
        }
    }

    #[test]
    fn test_zero_customers_stay_consistent() {
        let config = GeneratorConfig {
            base_customers: 0,
            daily_customer_growth: 0.0,
            customer_jitter: 0,
            horizon_days: 3,
            ..Default::default()
        };
        for record in generate_seeded(config, 5) {
            assert_eq!(record.customers.total, 0);
            assert!(record.validate().is_ok());
        }
    }

    #[test]
    fn test_unvalidated_horizon_is_clamped() {
        let config = GeneratorConfig {
            horizon_days: u32::MAX,
            ..Default::default()
        };
        let series = generate_seeded(config, 1);
        assert_eq!(series.len(), MAX_HORIZON_DAYS as usize + 1);
    }
}
