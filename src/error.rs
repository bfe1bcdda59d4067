//! Error types for the condition tree engine

use thiserror::Error;

/// Main error type for the condition tree engine
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConditionError {
    #[error("Unknown field: {key}")]
    UnknownField { key: String },

    #[error("Operator `{operator}` is not allowed for field `{field}`")]
    InvalidOperator { field: String, operator: String },

    #[error("Invalid value for field `{field}`: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Maximum nesting depth of {max_depth} exceeded")]
    MaxDepthExceeded { max_depth: usize },

    #[error("Invalid node path `{path}`: {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("Invalid registry: {0}")]
    InvalidRegistry(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),
}

impl ConditionError {
    /// Shorthand for an `InvalidValue` error
    pub(crate) fn invalid_value(field: &str, reason: impl Into<String>) -> Self {
        ConditionError::InvalidValue {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    /// Field key this error refers to, if any
    pub fn field(&self) -> Option<&str> {
        match self {
            ConditionError::UnknownField { key } => Some(key),
            ConditionError::InvalidOperator { field, .. }
            | ConditionError::InvalidValue { field, .. } => Some(field),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ConditionError {
    fn from(err: serde_json::Error) -> Self {
        ConditionError::Deserialization(err.to_string())
    }
}

/// Result type alias for the condition tree engine
pub type Result<T> = std::result::Result<T, ConditionError>;
