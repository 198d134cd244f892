//! Error types for crmboard-core
//!
//! The analytics engine itself never fails: degenerate inputs degrade to
//! "no insight" and unusable snapshots degrade to fresh generation. These
//! types describe the I/O edges and let the controller report what happened.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for crmboard operations
#[derive(Error, Debug)]
pub enum CoreError {
    // ===================
    // IO Errors
    // ===================
    #[error("Failed to read file: {path}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file: {path}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ===================
    // Parse Errors
    // ===================
    #[error("Failed to parse JSON in {path}: {message}")]
    JsonParse {
        path: PathBuf,
        message: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to parse TOML in {path}: {message}")]
    TomlParse {
        path: PathBuf,
        message: String,
        #[source]
        source: toml::de::Error,
    },

    // ===================
    // Snapshot Errors
    // ===================
    #[error("Snapshot schema version {found} in {path} does not match expected {expected}")]
    SnapshotVersionMismatch {
        path: PathBuf,
        found: u32,
        expected: u32,
    },

    #[error("Malformed snapshot in {path}: {reason}")]
    MalformedSnapshot { path: PathBuf, reason: String },

    // ===================
    // Config Errors
    // ===================
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

/// Severity level for errors during initialization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Non-critical, can continue with degraded functionality
    Warning,
    /// Significant, the operation did not complete
    Error,
}

/// Individual error entry in an init report
#[derive(Debug, Clone)]
pub struct LoadError {
    pub source: String,
    pub message: String,
    pub severity: ErrorSeverity,
    /// Actionable suggestion for user (optional)
    pub suggestion: Option<String>,
}

impl LoadError {
    pub fn warning(source: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            message: message.into(),
            severity: ErrorSeverity::Warning,
            suggestion: None,
        }
    }

    /// Create user-friendly entry from CoreError with context-aware suggestions
    ///
    /// Snapshot failures are downgraded to warnings since the controller
    /// always recovers from them by regenerating.
    pub fn from_core_error(source: impl Into<String>, error: &CoreError) -> Self {
        let source = source.into();
        let (message, suggestion, severity) = match error {
            CoreError::SnapshotVersionMismatch {
                path,
                found,
                expected,
            } => (
                format!(
                    "Snapshot {} uses schema v{} (current v{}), regenerated series",
                    path.display(),
                    found,
                    expected
                ),
                Some("The snapshot is rewritten on the next save".to_string()),
                ErrorSeverity::Warning,
            ),
            CoreError::MalformedSnapshot { path, reason } => (
                format!("Discarded malformed snapshot {}: {}", path.display(), reason),
                Some("Run 'crmboard clear-snapshot' to remove it".to_string()),
                ErrorSeverity::Warning,
            ),
            CoreError::JsonParse { path, message, .. } => (
                format!("Invalid JSON in {}: {}", path.display(), message),
                Some("Run 'crmboard clear-snapshot' to remove it".to_string()),
                ErrorSeverity::Warning,
            ),
            CoreError::FileRead { path, .. } => (
                format!("Cannot read file: {}", path.display()),
                Some(format!("Check permissions: chmod +r {}", path.display())),
                ErrorSeverity::Warning,
            ),
            CoreError::FileWrite { path, .. } => (
                format!("Cannot write file: {}", path.display()),
                Some(format!(
                    "Check that the directory is writable: {}",
                    path.parent().map(|p| p.display().to_string()).unwrap_or_default()
                )),
                ErrorSeverity::Error,
            ),
            _ => (error.to_string(), None, ErrorSeverity::Error),
        };

        Self {
            source,
            message,
            severity,
            suggestion,
        }
    }
}

/// Where the controller's series came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SeriesOrigin {
    /// Series was already present, initialize was a no-op
    #[default]
    AlreadyInitialized,
    /// Freshly synthesized
    Generated,
    /// Restored from a snapshot on disk
    Snapshot,
}

/// Report of what happened during controller initialization
///
/// Snapshot failures are recorded here rather than returned, so the
/// dashboard stays renderable.
#[derive(Debug, Default)]
pub struct InitReport {
    pub errors: Vec<LoadError>,
    pub origin: SeriesOrigin,
    pub records_loaded: usize,
    pub insights_restored: bool,
}

impl InitReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_error(&mut self, error: LoadError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, source: impl Into<String>, message: impl Into<String>) {
        self.errors.push(LoadError::warning(source, message));
    }

    /// Returns true if there are any errors (including warnings)
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Returns only warnings
    pub fn warnings(&self) -> impl Iterator<Item = &LoadError> {
        self.errors
            .iter()
            .filter(|e| e.severity == ErrorSeverity::Warning)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_mismatch_is_warning_with_suggestion() {
        let err = CoreError::SnapshotVersionMismatch {
            path: PathBuf::from("/tmp/snapshot.json"),
            found: 1,
            expected: 2,
        };
        let entry = LoadError::from_core_error("snapshot", &err);

        assert_eq!(entry.severity, ErrorSeverity::Warning);
        assert!(entry.message.contains("v1"));
        assert!(entry.suggestion.is_some());
    }

    #[test]
    fn test_init_report_severity_counting() {
        let mut report = InitReport::new();
        report.add_warning("snapshot", "Version mismatch");
        report.add_error(LoadError::from_core_error(
            "config",
            &CoreError::InvalidConfig {
                message: "bad range".to_string(),
            },
        ));

        assert!(report.has_errors());
        assert_eq!(report.errors.len(), 2);
        assert_eq!(report.warnings().count(), 1);
    }

    #[test]
    fn test_invalid_config_is_error_severity() {
        let err = CoreError::InvalidConfig {
            message: "horizon_days must be positive".to_string(),
        };
        assert_eq!(
            LoadError::from_core_error("config", &err).severity,
            ErrorSeverity::Error
        );
    }
}
