//! Metric series store
//!
//! Holds the series as a shared, immutable slice sorted ascending by date.
//! Lookups binary-search on the date key; windows are contiguous subslices,
//! so reads never copy records.

use chrono::{Days, NaiveDate};
use std::sync::Arc;

use crate::models::MetricRecord;

/// Date-ordered metric series with point and window lookup
#[derive(Debug, Clone)]
pub struct MetricsStore {
    /// Sorted ascending by date, no duplicate dates
    records: Arc<[MetricRecord]>,
}

impl Default for MetricsStore {
    fn default() -> Self {
        Self::empty()
    }
}

impl MetricsStore {
    pub fn empty() -> Self {
        Self {
            records: Arc::from(Vec::new()),
        }
    }

    /// Build a store, sorting by date and keeping the first record per date.
    pub fn new(mut records: Vec<MetricRecord>) -> Self {
        let sorted = records.windows(2).all(|w| w[0].date < w[1].date);
        if !sorted {
            tracing::warn!(
                records = records.len(),
                "Series not strictly ascending, sorting and dropping duplicate dates"
            );
            records.sort_by_key(|r| r.date);
            records.dedup_by_key(|r| r.date);
        }

        Self {
            records: Arc::from(records),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All records in ascending date order
    pub fn records(&self) -> &[MetricRecord] {
        &self.records
    }

    pub fn latest(&self) -> Option<&MetricRecord> {
        self.records.last()
    }

    /// Exact-date lookup
    pub fn by_date(&self, date: NaiveDate) -> Option<&MetricRecord> {
        self.records
            .binary_search_by_key(&date, |r| r.date)
            .ok()
            .map(|idx| &self.records[idx])
    }

    /// Records dated within `[reference_date - days + 1, reference_date]`.
    ///
    /// Returns fewer than `days` records when the series does not cover the
    /// whole interval, and an empty slice for `days == 0`.
    pub fn window(&self, days: usize, reference_date: NaiveDate) -> &[MetricRecord] {
        if days == 0 {
            return &[];
        }

        let start_date = reference_date
            .checked_sub_days(Days::new(days as u64 - 1))
            .unwrap_or(NaiveDate::MIN);
        let start = self.records.partition_point(|r| r.date < start_date);
        let end = self.records.partition_point(|r| r.date <= reference_date);

        if start >= end {
            return &[];
        }
        &self.records[start..end]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CampaignMetrics, CustomerSegments, EngagementMetrics};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn record(date: NaiveDate, revenue: u64) -> MetricRecord {
        MetricRecord {
            date,
            revenue,
            customers: CustomerSegments::default(),
            campaigns: CampaignMetrics::default(),
            engagement: EngagementMetrics::default(),
            geography: Vec::new(),
        }
    }

    /// Ten consecutive days, Jan 1..=Jan 10
    fn ten_days() -> MetricsStore {
        MetricsStore::new(
            (1..=10)
                .map(|d| record(date(2024, 1, d), u64::from(d) * 100))
                .collect(),
        )
    }

    #[test]
    fn test_by_date_hit_and_miss() {
        let store = ten_days();
        assert_eq!(store.by_date(date(2024, 1, 4)).unwrap().revenue, 400);
        assert!(store.by_date(date(2024, 2, 1)).is_none());
        assert!(MetricsStore::empty().by_date(date(2024, 1, 1)).is_none());
    }

    #[test]
    fn test_window_inside_series() {
        let store = ten_days();
        let window = store.window(3, date(2024, 1, 5));

        let dates: Vec<NaiveDate> = window.iter().map(|r| r.date).collect();
        assert_eq!(dates, vec![date(2024, 1, 3), date(2024, 1, 4), date(2024, 1, 5)]);
    }

    #[test]
    fn test_window_truncated_at_series_start() {
        let store = ten_days();
        let window = store.window(30, date(2024, 1, 5));
        assert_eq!(window.len(), 5);
        assert_eq!(window[0].date, date(2024, 1, 1));
    }

    #[test]
    fn test_window_reference_after_series_end() {
        let store = ten_days();
        let window = store.window(7, date(2024, 1, 12));
        assert_eq!(window.len(), 5);
        assert_eq!(window.last().unwrap().date, date(2024, 1, 10));
    }

    #[test]
    fn test_window_edge_sizes() {
        let store = ten_days();
        assert!(store.window(0, date(2024, 1, 5)).is_empty());
        assert_eq!(store.window(1, date(2024, 1, 5)).len(), 1);
        assert!(store.window(5, date(2023, 12, 1)).is_empty());
    }

    #[test]
    fn test_window_bounds_property() {
        let store = ten_days();
        for days in 0..15usize {
            for offset in 0..14u64 {
                let reference = date(2023, 12, 30) + Days::new(offset);
                let window = store.window(days, reference);

                assert!(window.len() <= days);
                assert!(window.windows(2).all(|w| w[0].date < w[1].date));
                for r in window {
                    assert!(r.date <= reference);
                    assert!(r.date > reference - Days::new(days as u64));
                }
            }
        }
    }

    #[test]
    fn test_unsorted_input_is_sorted_and_deduplicated() {
        let store = MetricsStore::new(vec![
            record(date(2024, 1, 3), 3),
            record(date(2024, 1, 1), 1),
            record(date(2024, 1, 3), 99),
            record(date(2024, 1, 2), 2),
        ]);

        let revenues: Vec<u64> = store.records().iter().map(|r| r.revenue).collect();
        assert_eq!(revenues, vec![1, 2, 3]);
    }
}
