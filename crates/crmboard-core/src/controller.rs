//! Dashboard controller
//!
//! Owns the analytics state (series, insights, selected timeframe and date)
//! and is the single writer to it. The series is generated or restored once
//! per lifetime (until `reset`); the insight list is recomputed wholesale on
//! every timeframe change or explicit request. Both are held as `Arc` slices
//! and swapped, never edited in place, so readers holding a shared handle
//! keep a consistent view.

use chrono::{Local, NaiveDate};
use rand::Rng;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::analytics::{generate_insights, summarize_window, Timeframe, WindowSummary};
use crate::config::GeneratorConfig;
use crate::error::{CoreError, InitReport, LoadError, SeriesOrigin};
use crate::generator::SeriesGenerator;
use crate::models::{Insight, MetricRecord};
use crate::snapshot::Snapshot;
use crate::store::MetricsStore;

/// Process-wide analytics state behind an explicit service object
pub struct DashboardController {
    generator: SeriesGenerator,

    /// Last day of generated history
    reference_date: NaiveDate,

    timeframe: Timeframe,

    selected_date: NaiveDate,

    store: MetricsStore,

    insights: Arc<[Insight]>,
}

impl DashboardController {
    /// Create an uninitialized controller whose history ends today
    pub fn new(config: GeneratorConfig) -> Self {
        Self::with_reference_date(config, Local::now().date_naive())
    }

    /// Create an uninitialized controller whose history ends at `reference_date`
    pub fn with_reference_date(config: GeneratorConfig, reference_date: NaiveDate) -> Self {
        Self {
            generator: SeriesGenerator::new(config),
            reference_date,
            timeframe: Timeframe::default(),
            selected_date: reference_date,
            store: MetricsStore::empty(),
            insights: Arc::from(Vec::new()),
        }
    }

    /// Create with default configuration
    pub fn with_defaults() -> Self {
        Self::new(GeneratorConfig::default())
    }

    pub fn is_initialized(&self) -> bool {
        !self.store.is_empty()
    }

    pub fn reference_date(&self) -> NaiveDate {
        self.reference_date
    }

    /// Generate the series and compute insights.
    ///
    /// No-op when a series is already loaded. Returns whether it generated.
    pub fn initialize(&mut self) -> bool {
        self.initialize_with_rng(&mut rand::thread_rng())
    }

    /// [`initialize`](Self::initialize) with a caller-supplied RNG
    pub fn initialize_with_rng<R: Rng + ?Sized>(&mut self, rng: &mut R) -> bool {
        if self.is_initialized() {
            debug!(records = self.store.len(), "Already initialized, skipping generation");
            return false;
        }

        let series = self.generator.generate_with_rng(self.reference_date, rng);
        self.install_series(series);
        self.regenerate_insights();

        info!(
            records = self.store.len(),
            insights = self.insights.len(),
            reference_date = %self.reference_date,
            "Dashboard initialized from generated series"
        );
        true
    }

    /// Initialize from a snapshot, falling back to generation.
    ///
    /// Missing, mismatched, or malformed snapshots never fail the call: the
    /// problem is recorded in the report and a fresh series is generated.
    /// Persisted insights are restored as-is; otherwise they are recomputed.
    pub fn initialize_from_snapshot(&mut self, path: &Path) -> InitReport {
        let mut report = InitReport::new();

        if self.is_initialized() {
            report.records_loaded = self.store.len();
            return report;
        }

        match Snapshot::load(path) {
            Ok(Some(snapshot)) if !snapshot.series.is_empty() => {
                self.install_series(snapshot.series);
                match snapshot.insights {
                    Some(insights) => {
                        self.insights = Arc::from(insights);
                        report.insights_restored = true;
                    }
                    None => self.regenerate_insights(),
                }
                report.origin = SeriesOrigin::Snapshot;
                report.records_loaded = self.store.len();

                if self.store.by_date(self.selected_date).is_none() {
                    if let Some(latest) = self.store.latest() {
                        debug!(
                            selected = %self.selected_date,
                            latest = %latest.date,
                            "Selected date not in snapshot, selecting latest record"
                        );
                        self.selected_date = latest.date;
                    }
                }

                info!(
                    records = report.records_loaded,
                    insights_restored = report.insights_restored,
                    "Dashboard initialized from snapshot"
                );
                return report;
            }
            Ok(Some(_)) => {
                report.add_warning("snapshot", "Snapshot contained no records, regenerated series");
            }
            Ok(None) => {}
            Err(e) => {
                warn!(error = %e, "Discarding snapshot, regenerating series");
                report.add_error(LoadError::from_core_error("snapshot", &e));
            }
        }

        self.initialize();
        report.origin = SeriesOrigin::Generated;
        report.records_loaded = self.store.len();
        report
    }

    /// Persist the current series (and insights when asked)
    pub fn save_snapshot(&self, path: &Path, include_insights: bool) -> Result<(), CoreError> {
        let insights = include_insights.then(|| self.insights.to_vec());
        Snapshot::new(self.store.records().to_vec(), insights).save(path)
    }

    /// Drop the series and insights so the next `initialize` generates again
    pub fn reset(&mut self) {
        info!(records = self.store.len(), "Resetting dashboard state");
        self.store = MetricsStore::empty();
        self.insights = Arc::from(Vec::new());
        self.selected_date = self.reference_date;
    }

    /// Recompute the insight list from the stored series, replacing the old one
    pub fn regenerate_insights(&mut self) {
        self.insights = Arc::from(generate_insights(self.store.records()));
        debug!(insights = self.insights.len(), "Insights regenerated");
    }

    pub fn timeframe(&self) -> Timeframe {
        self.timeframe
    }

    /// Change the timeframe. Always recomputes insights.
    pub fn set_timeframe(&mut self, timeframe: Timeframe) {
        debug!(from = %self.timeframe, to = %timeframe, "Timeframe changed");
        self.timeframe = timeframe;
        self.regenerate_insights();
    }

    pub fn selected_date(&self) -> NaiveDate {
        self.selected_date
    }

    /// Change the selected date. Insights are left untouched.
    pub fn set_selected_date(&mut self, date: NaiveDate) {
        self.selected_date = date;
    }

    /// Last date covered by the loaded series.
    ///
    /// Differs from [`reference_date`](Self::reference_date) when the series
    /// was restored from a snapshot written on an earlier day. Falls back to
    /// the selected date while uninitialized.
    pub fn latest_date(&self) -> NaiveDate {
        self.store
            .latest()
            .map(|r| r.date)
            .unwrap_or(self.selected_date)
    }

    /// Record for the selected date
    pub fn current_record(&self) -> Option<&MetricRecord> {
        self.store.by_date(self.selected_date)
    }

    /// Up to `days` records ending at the selected date
    pub fn timeframe_data(&self, days: usize) -> &[MetricRecord] {
        self.store.window(days, self.selected_date)
    }

    /// Window for the current timeframe ending at the selected date
    pub fn timeframe_window(&self) -> &[MetricRecord] {
        self.timeframe_data(self.timeframe.window_days())
    }

    /// KPI summary of the current timeframe window
    pub fn summary(&self) -> WindowSummary {
        summarize_window(self.timeframe_window())
    }

    /// Current insight list, in rule order
    pub fn insights(&self) -> &[Insight] {
        &self.insights
    }

    /// Shared handle on the current insight list
    pub fn shared_insights(&self) -> Arc<[Insight]> {
        Arc::clone(&self.insights)
    }

    pub fn series(&self) -> &[MetricRecord] {
        self.store.records()
    }

    fn install_series(&mut self, series: Vec<MetricRecord>) {
        self.store = MetricsStore::new(series);
    }
}

impl Default for DashboardController {
    fn default() -> Self {
        Self::with_defaults()
    }
}
