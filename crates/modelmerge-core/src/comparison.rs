//! Comparison result types shared by the engine and its hosts

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::conflict::{Conflict, Severity};

/// Kind of object a result row describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    Entity,
    Attribute,
    Relationship,
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Entity => write!(f, "Entity"),
            Self::Attribute => write!(f, "Attribute"),
            Self::Relationship => write!(f, "Relationship"),
        }
    }
}

/// Outcome of comparing one object pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComparisonStatus {
    /// Present on both sides, no differences
    Same,

    /// Present on both sides with at least one conflict
    Different,

    /// Present only in the right model
    New,

    /// Present only in the left model
    Removed,
}

impl ComparisonStatus {
    /// Derive the status from presence flags and whether conflicts were found
    pub fn classify(left_present: bool, right_present: bool, has_conflicts: bool) -> Self {
        match (left_present, right_present) {
            (true, true) if has_conflicts => Self::Different,
            (false, true) => Self::New,
            (true, false) => Self::Removed,
            // (false, false) is never produced by the matcher
            _ => Self::Same,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Same => "same",
            Self::Different => "different",
            Self::New => "new",
            Self::Removed => "removed",
        }
    }
}

impl fmt::Display for ComparisonStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ComparisonStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "same" => Ok(Self::Same),
            "different" => Ok(Self::Different),
            "new" => Ok(Self::New),
            "removed" => Ok(Self::Removed),
            other => Err(format!("unknown status '{}'", other)),
        }
    }
}

/// Key identifying a top-level comparison result (the entity's qualified name)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComparisonKey(String);

impl ComparisonKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ComparisonKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ComparisonKey {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

impl From<String> for ComparisonKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

/// One row of the comparison grid
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub kind: ObjectKind,

    /// Qualified name; doubles as the resolution key
    pub key: ComparisonKey,

    pub left_present: bool,

    pub right_present: bool,

    pub status: ComparisonStatus,

    /// Ordered conflicts (attribute conflicts first, then relationships)
    pub conflicts: Vec<Conflict>,

    /// Structural fingerprint of the left object
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left_fingerprint: Option<String>,

    /// Structural fingerprint of the right object
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right_fingerprint: Option<String>,
}

impl ComparisonResult {
    /// Build a result, deriving its status from presence and conflicts
    pub fn new(
        kind: ObjectKind,
        key: impl Into<ComparisonKey>,
        left_present: bool,
        right_present: bool,
        conflicts: Vec<Conflict>,
    ) -> Self {
        // Membership conflicts on new/removed rows do not count as field differences.
        let status = ComparisonStatus::classify(left_present, right_present, !conflicts.is_empty());
        Self {
            kind,
            key: key.into(),
            left_present,
            right_present,
            status,
            conflicts,
            left_fingerprint: None,
            right_fingerprint: None,
        }
    }

    pub fn with_fingerprints(mut self, left: Option<String>, right: Option<String>) -> Self {
        self.left_fingerprint = left;
        self.right_fingerprint = right;
        self
    }

    pub fn name(&self) -> &str {
        self.key.as_str()
    }

    pub fn is_same(&self) -> bool {
        self.status == ComparisonStatus::Same
    }

    /// Whether the merge needs an explicit decision for this row
    pub fn needs_resolution(&self) -> bool {
        !self.is_same()
    }

    /// Highest conflict severity, if any
    pub fn max_severity(&self) -> Option<Severity> {
        self.conflicts.iter().map(|c| c.severity).max()
    }
}

/// Drill-down row for one attribute or relationship of an entity pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailRow {
    pub kind: ObjectKind,

    /// `Entity.Member`
    pub name: String,

    pub status: ComparisonStatus,

    /// Rendered left definition
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left: Option<String>,

    /// Rendered right definition
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right: Option<String>,

    pub conflicts: Vec<Conflict>,
}

/// Decision kinds, without the custom payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResolutionKind {
    Unresolved,
    TakeLeft,
    TakeRight,
    Custom,
    Skip,
}

impl ResolutionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unresolved => "unresolved",
            Self::TakeLeft => "take-left",
            Self::TakeRight => "take-right",
            Self::Custom => "custom",
            Self::Skip => "skip",
        }
    }
}

impl fmt::Display for ResolutionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Status filter of the comparison grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    All,
    Only(ComparisonStatus),
}

/// Grid filter: status plus case-insensitive name search
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResultFilter {
    #[serde(default)]
    pub status: StatusFilter,
    #[serde(default)]
    pub search: String,
}

impl ResultFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_status(mut self, status: ComparisonStatus) -> Self {
        self.status = StatusFilter::Only(status);
        self
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    pub fn matches(&self, result: &ComparisonResult) -> bool {
        let status_ok = match self.status {
            StatusFilter::All => true,
            StatusFilter::Only(status) => result.status == status,
        };

        status_ok
            && result
                .name()
                .to_lowercase()
                .contains(&self.search.trim().to_lowercase())
    }
}
