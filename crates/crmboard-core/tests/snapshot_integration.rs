//! Integration tests for controller lifecycle with on-disk snapshots

use chrono::NaiveDate;
use crmboard_core::config::RateRange;
use crmboard_core::error::LoadError;
use crmboard_core::{
    CoreError, DashboardController, GeneratorConfig, SeriesOrigin, Snapshot,
    SNAPSHOT_SCHEMA_VERSION,
};
use tempfile::TempDir;

fn reference() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 11, 30).unwrap()
}

fn controller() -> DashboardController {
    DashboardController::with_reference_date(GeneratorConfig::default(), reference())
}

#[test]
fn test_missing_snapshot_generates() {
    let dir = TempDir::new().unwrap();
    let mut ctl = controller();

    let report = ctl.initialize_from_snapshot(&dir.path().join("snapshot.json"));

    assert_eq!(report.origin, SeriesOrigin::Generated);
    assert_eq!(report.records_loaded, 366);
    assert!(!report.has_errors());
    assert!(!report.insights_restored);
}

#[test]
fn test_roundtrip_with_insights() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("snapshot.json");

    let mut original = controller();
    original.initialize();
    original.save_snapshot(&path, true).unwrap();

    let mut restored = controller();
    let report = restored.initialize_from_snapshot(&path);

    assert_eq!(report.origin, SeriesOrigin::Snapshot);
    assert!(report.insights_restored);
    assert_eq!(restored.series(), original.series());
    assert_eq!(restored.insights(), original.insights());
}

#[test]
fn test_roundtrip_without_insights_recomputes() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("snapshot.json");

    let mut original = controller();
    original.initialize();
    original.save_snapshot(&path, false).unwrap();

    let mut restored = controller();
    let report = restored.initialize_from_snapshot(&path);

    assert_eq!(report.origin, SeriesOrigin::Snapshot);
    assert!(!report.insights_restored);
    assert_eq!(restored.series(), original.series());

    let titles = |ctl: &DashboardController| -> Vec<String> {
        ctl.insights().iter().map(|i| i.title.clone()).collect()
    };
    assert_eq!(titles(&restored), titles(&original));
}

#[test]
fn test_version_mismatch_falls_back_to_generation() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("snapshot.json");

    let mut original = controller();
    original.initialize();
    let mut snapshot = Snapshot::new(original.series().to_vec(), None);
    snapshot.schema_version = SNAPSHOT_SCHEMA_VERSION + 1;
    snapshot.save(&path).unwrap();

    let mut restored = controller();
    let report = restored.initialize_from_snapshot(&path);

    assert_eq!(report.origin, SeriesOrigin::Generated);
    assert_eq!(report.warnings().count(), 1);
    assert_eq!(restored.series().len(), 366);
}

#[test]
fn test_malformed_snapshot_falls_back_to_generation() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("snapshot.json");
    std::fs::write(
        &path,
        format!(
            r#"{{"schema_version": {}, "saved_at": "2024-11-30T00:00:00Z", "series": [{{"date": "2024-11-30"}}]}}"#,
            SNAPSHOT_SCHEMA_VERSION
        ),
    )
    .unwrap();

    let mut ctl = controller();
    let report = ctl.initialize_from_snapshot(&path);

    assert_eq!(report.origin, SeriesOrigin::Generated);
    let entry: &LoadError = report.errors.first().unwrap();
    assert_eq!(entry.source, "snapshot");
    assert!(entry.message.contains("malformed"));
    assert!(ctl.is_initialized());
}

#[test]
fn test_snapshot_ignored_once_initialized() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("snapshot.json");

    let mut other = DashboardController::with_reference_date(
        GeneratorConfig {
            horizon_days: 20,
            ..Default::default()
        },
        reference(),
    );
    other.initialize();
    other.save_snapshot(&path, true).unwrap();

    let mut ctl = controller();
    ctl.initialize();
    let report = ctl.initialize_from_snapshot(&path);

    assert_eq!(report.origin, SeriesOrigin::AlreadyInitialized);
    assert_eq!(ctl.series().len(), 366);
}

#[test]
fn test_stale_snapshot_selects_latest_record() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("snapshot.json");

    let older = NaiveDate::from_ymd_opt(2024, 10, 1).unwrap();
    let mut original = DashboardController::with_reference_date(GeneratorConfig::default(), older);
    original.initialize();
    original.save_snapshot(&path, true).unwrap();

    let mut ctl = controller();
    ctl.initialize_from_snapshot(&path);

    assert_eq!(ctl.selected_date(), older);
    assert_eq!(ctl.current_record().unwrap().date, older);
}

#[test]
fn test_latest_date_follows_restored_series() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("snapshot.json");

    let older = NaiveDate::from_ymd_opt(2024, 10, 1).unwrap();
    let mut original = DashboardController::with_reference_date(GeneratorConfig::default(), older);
    original.initialize();
    original.save_snapshot(&path, false).unwrap();

    let mut ctl = controller();
    ctl.initialize_from_snapshot(&path);

    assert_eq!(ctl.reference_date(), reference());
    assert_eq!(ctl.latest_date(), older);

    // A window anchored at the series end is full, not empty
    ctl.set_selected_date(ctl.latest_date());
    assert_eq!(ctl.timeframe_data(7).len(), 7);
    assert_eq!(ctl.timeframe_data(7).last().unwrap().date, older);
}

#[test]
fn test_corrupt_persisted_insight_falls_back_to_generation() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("snapshot.json");

    // ROI pinned above the threshold so the ROI rule always fires
    let config = GeneratorConfig {
        roi_pct: RateRange::new(250.0, 260.0),
        ..Default::default()
    };
    let mut original = DashboardController::with_reference_date(config, reference());
    original.initialize();

    let mut insights = original.insights().to_vec();
    insights[0].confidence = 250;
    Snapshot::new(original.series().to_vec(), Some(insights))
        .save(&path)
        .unwrap();

    let mut restored = controller();
    let report = restored.initialize_from_snapshot(&path);

    assert_eq!(report.origin, SeriesOrigin::Generated);
    assert!(!report.insights_restored);
    assert!(report.errors[0].message.contains("confidence"));
    assert!(restored.insights().iter().all(|i| i.confidence <= 100));
}

#[test]
fn test_insight_with_empty_title_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("snapshot.json");

    let config = GeneratorConfig {
        roi_pct: RateRange::new(250.0, 260.0),
        ..Default::default()
    };
    let mut original = DashboardController::with_reference_date(config, reference());
    original.initialize();

    let mut insights = original.insights().to_vec();
    insights[0].title.clear();
    Snapshot::new(original.series().to_vec(), Some(insights))
        .save(&path)
        .unwrap();

    assert!(matches!(
        Snapshot::load(&path),
        Err(CoreError::MalformedSnapshot { .. })
    ));
}
