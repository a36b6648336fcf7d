//! Error types for schema model construction

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised while building or validating a schema model
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    /// A model, entity or attribute breaks a structural invariant
    #[error("Validation error: {0}")]
    Validation(String),

    /// A relationship points at an entity that does not exist (or was excluded)
    #[error("Dangling reference: relationship '{relationship}' references missing entity '{entity}'")]
    DanglingReference {
        relationship: String,
        entity: String,
    },

    /// The raw description could not be parsed
    #[error("Parse error: {0}")]
    Parse(String),
}

impl ModelError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn dangling(relationship: impl Into<String>, entity: impl Into<String>) -> Self {
        Self::DanglingReference {
            relationship: relationship.into(),
            entity: entity.into(),
        }
    }
}

impl From<serde_json::Error> for ModelError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}
