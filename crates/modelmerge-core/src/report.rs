//! Comparison report schema (stable v1)
//!
//! This schema is STABLE and VERSIONED.
//! Breaking changes require a new version.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::str::FromStr;

use crate::comparison::{ComparisonKey, ComparisonResult, ComparisonStatus, ResolutionKind};
use crate::conflict::Severity;
use crate::model::ModelHeader;

/// Report schema version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportVersion {
    /// Major version (breaking changes)
    pub major: u32,

    /// Minor version (backward-compatible additions)
    pub minor: u32,
}

impl ReportVersion {
    /// Current report schema version
    pub const CURRENT: ReportVersion = ReportVersion { major: 1, minor: 0 };
}

impl std::fmt::Display for ReportVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Text rendering flavour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// One line per result
    #[default]
    Summary,

    /// Every conflict with its values
    Detailed,
}

impl FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "summary" => Ok(Self::Summary),
            "detailed" => Ok(Self::Detailed),
            other => Err(format!("unknown report format '{}'", other)),
        }
    }
}

/// Summary statistics for a report
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    /// Number of result rows
    pub total: usize,

    pub same: usize,
    pub different: usize,
    pub new: usize,
    pub removed: usize,

    /// Number of conflicts across all rows
    pub conflicts: usize,

    /// Conflicts by severity
    pub errors: usize,
    pub warnings: usize,
    pub info: usize,

    /// Rows needing a decision that have one
    pub resolved: usize,

    /// Rows needing a decision that are still unresolved
    pub pending: usize,
}

impl ReportSummary {
    fn from_results(
        results: &[ComparisonResult],
        resolutions: &BTreeMap<ComparisonKey, ResolutionKind>,
    ) -> Self {
        let mut summary = Self {
            total: results.len(),
            ..Self::default()
        };

        for result in results {
            match result.status {
                ComparisonStatus::Same => summary.same += 1,
                ComparisonStatus::Different => summary.different += 1,
                ComparisonStatus::New => summary.new += 1,
                ComparisonStatus::Removed => summary.removed += 1,
            }

            for conflict in &result.conflicts {
                summary.conflicts += 1;
                match conflict.severity {
                    Severity::Error => summary.errors += 1,
                    Severity::Warn => summary.warnings += 1,
                    Severity::Info => summary.info += 1,
                }
            }

            if result.needs_resolution() {
                match resolutions.get(&result.key) {
                    Some(ResolutionKind::Unresolved) | None => summary.pending += 1,
                    Some(_) => summary.resolved += 1,
                }
            }
        }

        summary
    }
}

/// Comparison report (report.json v1)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonReport {
    /// Schema version
    pub version: ReportVersion,

    /// Timestamp (ISO 8601)
    pub timestamp: String,

    pub left: ModelHeader,

    pub right: ModelHeader,

    /// Structural digest of the left model
    pub left_digest: String,

    /// Structural digest of the right model
    pub right_digest: String,

    /// Summary statistics
    pub summary: ReportSummary,

    /// All results, in matcher order
    pub results: Vec<ComparisonResult>,

    /// Decision per result key
    pub resolutions: BTreeMap<ComparisonKey, ResolutionKind>,
}

impl ComparisonReport {
    /// Create a report from session results
    pub fn new(
        left: ModelHeader,
        right: ModelHeader,
        left_digest: String,
        right_digest: String,
        results: Vec<ComparisonResult>,
        resolutions: BTreeMap<ComparisonKey, ResolutionKind>,
    ) -> Self {
        let summary = ReportSummary::from_results(&results, &resolutions);

        Self {
            version: ReportVersion::CURRENT,
            timestamp: chrono::Utc::now().to_rfc3339(),
            left,
            right,
            left_digest,
            right_digest,
            summary,
            results,
            resolutions,
        }
    }

    /// Check if the models differ at all
    pub fn has_differences(&self) -> bool {
        self.summary.same != self.summary.total
    }

    /// Check if any conflict is an error
    pub fn has_errors(&self) -> bool {
        self.summary.errors > 0
    }

    fn resolution(&self, key: &ComparisonKey) -> ResolutionKind {
        self.resolutions
            .get(key)
            .copied()
            .unwrap_or(ResolutionKind::Unresolved)
    }

    /// Render as plain text
    ///
    /// The output is deterministic for identical inputs (the timestamp is not
    /// included).
    pub fn render(&self, format: ReportFormat) -> String {
        let mut out = String::new();
        let s = &self.summary;

        let _ = writeln!(out, "Comparison: {} -> {}", self.left, self.right);
        let _ = writeln!(
            out,
            "Objects: {} total, {} same, {} different, {} new, {} removed",
            s.total, s.same, s.different, s.new, s.removed
        );
        let _ = writeln!(
            out,
            "Conflicts: {} (errors {}, warnings {}, info {})",
            s.conflicts, s.errors, s.warnings, s.info
        );
        let _ = writeln!(out, "Resolved: {}/{}", s.resolved, s.resolved + s.pending);

        if format == ReportFormat::Detailed {
            let _ = writeln!(out, "Left digest:  {}", self.left_digest);
            let _ = writeln!(out, "Right digest: {}", self.right_digest);
        }

        for result in &self.results {
            out.push('\n');
            let _ = write!(
                out,
                "{:<9} {:<6} {}",
                result.status.as_str(),
                result.kind.to_string(),
                result.key
            );

            if !result.conflicts.is_empty() {
                let noun = if result.conflicts.len() == 1 { "conflict" } else { "conflicts" };
                let _ = write!(out, " ({} {})", result.conflicts.len(), noun);
            }

            if result.needs_resolution() {
                let _ = write!(out, " [{}]", self.resolution(&result.key));
            }

            if format == ReportFormat::Detailed {
                for conflict in &result.conflicts {
                    out.push('\n');
                    let _ = write!(
                        out,
                        "  - [{}] {} {}: {}",
                        conflict.severity.to_string().to_uppercase(),
                        conflict.code,
                        conflict.subject,
                        conflict.message
                    );
                    if let Some(left) = &conflict.left {
                        let _ = write!(out, "\n      left:  {}", left);
                    }
                    if let Some(right) = &conflict.right {
                        let _ = write!(out, "\n      right: {}", right);
                    }
                }
            }
        }

        out.push('\n');
        out
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Save to file
    pub fn save_to_file(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let json = self.to_json()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
        std::fs::write(path, json)
    }
}
