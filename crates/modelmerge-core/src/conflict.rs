//! Conflict codes and descriptions
//!
//! IMPORTANT: Conflict codes are stable identifiers.
//! NEVER rename or remove codes - hosts classify and filter on them.
//! Add new codes with new names only.

use serde::{Deserialize, Serialize};

/// Conflict code registry (v1)
///
/// These codes are STABLE and VERSIONED.
/// Do NOT rename or remove codes - only add new ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConflictCode {
    // Attribute fields
    /// Declared type string differs
    TypeChanged,

    /// Nullability flag differs
    NullabilityChanged,

    /// Constraint tag present only on the right
    ConstraintAdded,

    /// Constraint tag present only on the left
    ConstraintRemoved,

    /// Domain reference differs
    DomainChanged,

    // Entity membership
    /// Attribute present only in the right model
    AttributeAdded,

    /// Attribute present only in the left model
    AttributeRemoved,

    /// Relationship present only in the right model
    RelationshipAdded,

    /// Relationship present only in the left model
    RelationshipRemoved,

    /// Relationship cardinality differs
    RelationshipCardinalityChanged,

    /// Relationship identifying flag differs
    RelationshipIdentifyingChanged,

    /// Relationship points at a different entity
    RelationshipTargetChanged,

    // Model membership
    /// Entity present only in the right model
    EntityAdded,

    /// Entity present only in the left model
    EntityRemoved,
}

impl ConflictCode {
    /// Get the conflict code as a stable string identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TypeChanged => "TYPE_CHANGED",
            Self::NullabilityChanged => "NULLABILITY_CHANGED",
            Self::ConstraintAdded => "CONSTRAINT_ADDED",
            Self::ConstraintRemoved => "CONSTRAINT_REMOVED",
            Self::DomainChanged => "DOMAIN_CHANGED",
            Self::AttributeAdded => "ATTRIBUTE_ADDED",
            Self::AttributeRemoved => "ATTRIBUTE_REMOVED",
            Self::RelationshipAdded => "RELATIONSHIP_ADDED",
            Self::RelationshipRemoved => "RELATIONSHIP_REMOVED",
            Self::RelationshipCardinalityChanged => "RELATIONSHIP_CARDINALITY_CHANGED",
            Self::RelationshipIdentifyingChanged => "RELATIONSHIP_IDENTIFYING_CHANGED",
            Self::RelationshipTargetChanged => "RELATIONSHIP_TARGET_CHANGED",
            Self::EntityAdded => "ENTITY_ADDED",
            Self::EntityRemoved => "ENTITY_REMOVED",
        }
    }

    /// Severity used when no override is configured
    ///
    /// Removals break consumers of the left model, so they default to errors.
    pub fn default_severity(&self) -> Severity {
        match self {
            Self::AttributeRemoved
            | Self::RelationshipRemoved
            | Self::RelationshipTargetChanged
            | Self::EntityRemoved => Severity::Error,
            Self::TypeChanged
            | Self::NullabilityChanged
            | Self::ConstraintAdded
            | Self::ConstraintRemoved
            | Self::RelationshipCardinalityChanged
            | Self::RelationshipIdentifyingChanged => Severity::Warn,
            Self::DomainChanged
            | Self::AttributeAdded
            | Self::RelationshipAdded
            | Self::EntityAdded => Severity::Info,
        }
    }
}

impl std::fmt::Display for ConflictCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Conflict severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational difference
    Info,

    /// Should be reviewed before merging
    Warn,

    /// Breaking difference
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// A single field-level or membership difference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conflict {
    /// Stable conflict code
    pub code: ConflictCode,

    /// Severity level
    pub severity: Severity,

    /// Qualified name of the object the conflict is about (`Order.TotalAmount`)
    pub subject: String,

    /// Human-readable message
    pub message: String,

    /// Value on the left side, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left: Option<String>,

    /// Value on the right side, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right: Option<String>,
}

impl Conflict {
    /// Create a conflict with the code's default severity
    pub fn new(code: ConflictCode, subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code,
            severity: code.default_severity(),
            subject: subject.into(),
            message: message.into(),
            left: None,
            right: None,
        }
    }

    /// Set left/right values
    pub fn with_values(mut self, left: Option<String>, right: Option<String>) -> Self {
        self.left = left;
        self.right = right;
        self
    }

    /// Override the severity
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }
}

impl std::fmt::Display for Conflict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.subject, self.message)
    }
}
