use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Where processing of a single listed file ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileOutcome {
    /// Name sorts at or before the bookmark; never downloaded
    Skipped,
    /// Download-only mode: compressed file kept on disk
    Downloaded { path: PathBuf },
    DownloadFailed { reason: String },
    DecompressFailed { reason: String },
    ClipFailed { reason: String },
    Completed { output: PathBuf },
}

impl FileOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            FileOutcome::DownloadFailed { .. }
                | FileOutcome::DecompressFailed { .. }
                | FileOutcome::ClipFailed { .. }
        )
    }

    pub fn label(&self) -> &'static str {
        match self {
            FileOutcome::Skipped => "skipped",
            FileOutcome::Downloaded { .. } => "downloaded",
            FileOutcome::DownloadFailed { .. } => "download failed",
            FileOutcome::DecompressFailed { .. } => "decompress failed",
            FileOutcome::ClipFailed { .. } => "clip failed",
            FileOutcome::Completed { .. } => "completed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileReport {
    pub file_name: String,
    #[serde(flatten)]
    pub outcome: FileOutcome,
}

/// Outcomes of one run, in listing order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunReport {
    pub files: Vec<FileReport>,
}

impl RunReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, file_name: impl Into<String>, outcome: FileOutcome) {
        self.files.push(FileReport {
            file_name: file_name.into(),
            outcome,
        });
    }

    pub fn outcome_of(&self, file_name: &str) -> Option<&FileOutcome> {
        self.files
            .iter()
            .find(|f| f.file_name == file_name)
            .map(|f| &f.outcome)
    }

    pub fn skipped_count(&self) -> usize {
        self.count(|o| matches!(o, FileOutcome::Skipped))
    }

    pub fn completed_count(&self) -> usize {
        self.count(|o| matches!(o, FileOutcome::Completed { .. }))
    }

    pub fn downloaded_count(&self) -> usize {
        self.count(|o| matches!(o, FileOutcome::Downloaded { .. }))
    }

    pub fn failed_count(&self) -> usize {
        self.count(FileOutcome::is_failure)
    }

    fn count(&self, predicate: impl Fn(&FileOutcome) -> bool) -> usize {
        self.files.iter().filter(|f| predicate(&f.outcome)).count()
    }

    pub fn summary(&self) -> String {
        let mut summary = format!(
            "Run Summary:\n  Listed: {}\n  Skipped: {}\n  Completed: {}\n  Downloaded only: {}\n  Failed: {}\n",
            self.files.len(),
            self.skipped_count(),
            self.completed_count(),
            self.downloaded_count(),
            self.failed_count()
        );

        let failures: Vec<_> = self.files.iter().filter(|f| f.outcome.is_failure()).collect();
        if !failures.is_empty() {
            summary.push_str("  Failures:\n");
            for file in failures {
                let reason = match &file.outcome {
                    FileOutcome::DownloadFailed { reason }
                    | FileOutcome::DecompressFailed { reason }
                    | FileOutcome::ClipFailed { reason } => reason.as_str(),
                    _ => "",
                };
                summary.push_str(&format!(
                    "    {} ({}): {}\n",
                    file.file_name,
                    file.outcome.label(),
                    reason
                ));
            }
        }

        summary
    }

    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn read_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let report: Self = serde_json::from_str(&content)?;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn sample_report() -> RunReport {
        let mut report = RunReport::new();
        report.record("chirps-v2.0.2003.10.1.tif.gz", FileOutcome::Skipped);
        report.record(
            "chirps-v2.0.2003.10.2.tif.gz",
            FileOutcome::Completed {
                output: PathBuf::from("out/chirps-v2.0.2003.10.2.tif"),
            },
        );
        report.record(
            "chirps-v2.0.2003.10.3.tif.gz",
            FileOutcome::DecompressFailed {
                reason: "invalid gzip header".to_string(),
            },
        );
        report
    }

    #[test]
    fn test_counts() {
        let report = sample_report();
        assert_eq!(report.skipped_count(), 1);
        assert_eq!(report.completed_count(), 1);
        assert_eq!(report.failed_count(), 1);
        assert_eq!(report.downloaded_count(), 0);
        assert_eq!(
            report.outcome_of("chirps-v2.0.2003.10.1.tif.gz"),
            Some(&FileOutcome::Skipped)
        );
        assert_eq!(report.outcome_of("missing.tif.gz"), None);
    }

    #[test]
    fn test_summary_lists_failures() {
        let summary = sample_report().summary();
        assert!(summary.contains("Listed: 3"));
        assert!(summary.contains("chirps-v2.0.2003.10.3.tif.gz (decompress failed): invalid gzip header"));
    }

    #[test]
    fn test_json_report() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.json");
        let report = sample_report();
        report.write_json(&path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("\"status\": \"completed\""));

        let read_back = RunReport::read_json(&path).unwrap();
        assert_eq!(read_back.files, report.files);
    }
}
