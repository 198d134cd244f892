//! Versioned snapshot of the analytics state
//!
//! Stored as pretty JSON:
//!
//! ```json
//! { "schema_version": 1, "saved_at": "...", "series": [...], "insights": [...] }
//! ```
//!
//! Version History:
//! - v1: Initial layout (series + optional insights)
//!
//! **IMPORTANT**: bump `SNAPSHOT_SCHEMA_VERSION` whenever `MetricRecord` or
//! `Insight` change shape. Loaders never migrate; a mismatched snapshot is
//! discarded and the series regenerated.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::CoreError;
use crate::models::{Insight, MetricRecord};

/// Current snapshot schema version
pub const SNAPSHOT_SCHEMA_VERSION: u32 = 1;

/// Persisted copy of the series and, optionally, the last insight list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub schema_version: u32,
    pub saved_at: DateTime<Utc>,
    pub series: Vec<MetricRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insights: Option<Vec<Insight>>,
}

impl Snapshot {
    pub fn new(series: Vec<MetricRecord>, insights: Option<Vec<Insight>>) -> Self {
        Self {
            schema_version: SNAPSHOT_SCHEMA_VERSION,
            saved_at: Utc::now(),
            series,
            insights,
        }
    }

    /// Load a snapshot from disk.
    ///
    /// Returns `Ok(None)` when no file exists. The schema version is checked
    /// before the body is decoded, so a layout change is always reported as
    /// `SnapshotVersionMismatch` rather than a parse failure.
    pub fn load(path: &Path) -> Result<Option<Self>, CoreError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No snapshot found");
            return Ok(None);
        }

        let content = std::fs::read_to_string(path).map_err(|source| CoreError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;

        let value: serde_json::Value =
            serde_json::from_str(&content).map_err(|source| CoreError::JsonParse {
                path: path.to_path_buf(),
                message: source.to_string(),
                source,
            })?;

        let found = value
            .get("schema_version")
            .and_then(serde_json::Value::as_u64)
            .ok_or_else(|| CoreError::MalformedSnapshot {
                path: path.to_path_buf(),
                reason: "missing schema_version".to_string(),
            })?;

        if found != u64::from(SNAPSHOT_SCHEMA_VERSION) {
            return Err(CoreError::SnapshotVersionMismatch {
                path: path.to_path_buf(),
                found: u32::try_from(found).unwrap_or(u32::MAX),
                expected: SNAPSHOT_SCHEMA_VERSION,
            });
        }

        let snapshot: Snapshot =
            serde_json::from_value(value).map_err(|e| CoreError::MalformedSnapshot {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        snapshot
            .validate()
            .map_err(|reason| CoreError::MalformedSnapshot {
                path: path.to_path_buf(),
                reason,
            })?;

        tracing::info!(
            path = %path.display(),
            records = snapshot.series.len(),
            insights = snapshot.insights.as_ref().map(Vec::len),
            "Loaded snapshot"
        );

        Ok(Some(snapshot))
    }

    /// Write the snapshot, creating parent directories as needed.
    ///
    /// Writes to a sibling temp file and renames it into place so readers
    /// never see a half-written snapshot.
    pub fn save(&self, path: &Path) -> Result<(), CoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| CoreError::FileWrite {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let json = serde_json::to_string_pretty(self).map_err(|source| CoreError::JsonParse {
            path: path.to_path_buf(),
            message: "failed to serialize snapshot".to_string(),
            source,
        })?;

        let tmp_path = path.with_extension("json.tmp");
        std::fs::write(&tmp_path, json).map_err(|source| CoreError::FileWrite {
            path: tmp_path.clone(),
            source,
        })?;
        std::fs::rename(&tmp_path, path).map_err(|source| CoreError::FileWrite {
            path: path.to_path_buf(),
            source,
        })?;

        tracing::info!(
            path = %path.display(),
            records = self.series.len(),
            "Saved snapshot"
        );
        Ok(())
    }

    /// Remove a snapshot file. Returns whether a file was removed.
    pub fn clear(path: &Path) -> Result<bool, CoreError> {
        if !path.exists() {
            return Ok(false);
        }
        std::fs::remove_file(path).map_err(|source| CoreError::FileWrite {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::info!(path = %path.display(), "Cleared snapshot");
        Ok(true)
    }

    /// Series must be strictly ascending, every record internally consistent,
    /// and every persisted insight well-formed
    fn validate(&self) -> Result<(), String> {
        if let Some(pair) = self.series.windows(2).find(|w| w[0].date >= w[1].date) {
            return Err(format!(
                "series out of order at {} -> {}",
                pair[0].date, pair[1].date
            ));
        }
        self.series.iter().try_for_each(MetricRecord::validate)?;
        self.insights
            .iter()
            .flatten()
            .try_for_each(Insight::validate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GeneratorConfig;
    use crate::generator::SeriesGenerator;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn small_series() -> Vec<MetricRecord> {
        let config = GeneratorConfig {
            horizon_days: 13,
            ..Default::default()
        };
        SeriesGenerator::new(config).generate(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap())
    }

    #[test]
    fn test_missing_file_is_none() {
        let dir = TempDir::new().unwrap();
        assert!(Snapshot::load(&dir.path().join("none.json")).unwrap().is_none());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("snapshot.json");
        let snapshot = Snapshot::new(small_series(), None);

        snapshot.save(&path).unwrap();
        let loaded = Snapshot::load(&path).unwrap().unwrap();

        assert_eq!(loaded, snapshot);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_version_mismatch_detected_before_body() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("snapshot.json");
        std::fs::write(&path, r#"{"schema_version": 0, "records": "old layout"}"#).unwrap();

        let err = Snapshot::load(&path).unwrap_err();
        assert!(matches!(
            err,
            CoreError::SnapshotVersionMismatch {
                found: 0,
                expected: SNAPSHOT_SCHEMA_VERSION,
                ..
            }
        ));
    }

    #[test]
    fn test_missing_fields_are_malformed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("snapshot.json");
        std::fs::write(&path, r#"{"schema_version": 1, "series": []}"#).unwrap();

        let err = Snapshot::load(&path).unwrap_err();
        assert!(matches!(err, CoreError::MalformedSnapshot { .. }));
    }

    #[test]
    fn test_inconsistent_record_is_malformed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("snapshot.json");
        let mut series = small_series();
        series[3].customers.vip += 1;
        Snapshot::new(series, None).save(&path).unwrap();

        let err = Snapshot::load(&path).unwrap_err();
        match err {
            CoreError::MalformedSnapshot { reason, .. } => {
                assert!(reason.contains("customer segments"))
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_garbage_is_json_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("snapshot.json");
        std::fs::write(&path, "not json {").unwrap();

        let err = Snapshot::load(&path).unwrap_err();
        assert!(matches!(err, CoreError::JsonParse { .. }));
    }

    #[test]
    fn test_clear() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("snapshot.json");
        Snapshot::new(Vec::new(), None).save(&path).unwrap();

        assert!(Snapshot::clear(&path).unwrap());
        assert!(!Snapshot::clear(&path).unwrap());
    }
}
