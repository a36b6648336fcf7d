//! modelmerge core
//!
//! Domain model for schema comparison: validated schema snapshots, stable
//! conflict codes, comparison results, configuration and reports.
//! Never rename conflict codes - they are part of the public API.

pub mod comparison;
pub mod config;
pub mod conflict;
pub mod error;
pub mod fingerprint;
pub mod load;
pub mod model;
pub mod report;
pub mod selection;

pub use comparison::{
    ComparisonKey, ComparisonResult, ComparisonStatus, DetailRow, ObjectKind, ResolutionKind,
    ResultFilter, StatusFilter,
};
pub use config::{CompareConfig, ConfigError, IgnoreRules, SeverityThreshold};
pub use conflict::{Conflict, ConflictCode, Severity};
pub use error::{ModelError, ModelResult};
pub use fingerprint::{entity_fingerprint, model_fingerprint};
pub use load::{load_schema_model, RawAttribute, RawEntity, RawRelationship, RawSchemaModel};
pub use model::{
    qualified_name, Attribute, Cardinality, Constraint, Entity, ModelHeader, Relationship,
    SchemaModel,
};
pub use report::{ComparisonReport, ReportFormat, ReportSummary, ReportVersion};
pub use selection::{Selected, SelectionContext};
