//! Field descriptors

use crate::condition::{global_operators, Operator, OperatorSet};
use crate::error::{ConditionError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Semantic type of a queryable field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SemanticType {
    String,
    Enum,
    Uuid,
    Number,
    Boolean,
    Date,
    Datetime,
}

impl SemanticType {
    pub const ALL: [SemanticType; 7] = [
        SemanticType::String,
        SemanticType::Enum,
        SemanticType::Uuid,
        SemanticType::Number,
        SemanticType::Boolean,
        SemanticType::Date,
        SemanticType::Datetime,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SemanticType::String => "string",
            SemanticType::Enum => "enum",
            SemanticType::Uuid => "uuid",
            SemanticType::Number => "number",
            SemanticType::Boolean => "boolean",
            SemanticType::Date => "date",
            SemanticType::Datetime => "datetime",
        }
    }

    /// Values of this type are compared as text
    pub fn is_textual(&self) -> bool {
        matches!(
            self,
            SemanticType::String | SemanticType::Enum | SemanticType::Uuid
        )
    }
}

impl fmt::Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata for one field that conditions may reference
///
/// An empty `allowed_operators` list is filled with every operator the
/// semantic type supports when the descriptor enters a registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    pub key: String,
    #[serde(default)]
    pub label: String,
    pub semantic_type: SemanticType,
    #[serde(default)]
    pub allowed_operators: OperatorSet,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<String>>,
}

impl FieldDescriptor {
    /// Create a descriptor allowing every operator of its semantic type
    pub fn new(key: impl Into<String>, label: impl Into<String>, semantic_type: SemanticType) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            semantic_type,
            allowed_operators: global_operators(semantic_type),
            enum_values: None,
        }
    }

    /// Create an enum descriptor with its closed value set
    pub fn enumeration<I, S>(key: impl Into<String>, label: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(key, label, SemanticType::Enum).with_enum_values(values)
    }

    /// Restrict the operators this field accepts
    pub fn with_operators(mut self, operators: &[Operator]) -> Self {
        self.allowed_operators = operators.iter().copied().collect();
        self
    }

    pub fn with_enum_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.enum_values = Some(values.into_iter().map(Into::into).collect());
        self
    }

    /// Whether `operator` may be used with this field
    #[inline]
    pub fn allows(&self, operator: Operator) -> bool {
        self.allowed_operators.contains(&operator)
    }

    /// Whether `value` belongs to the enum value set (case-sensitive)
    pub fn is_enum_member(&self, value: &str) -> bool {
        self.enum_values
            .as_ref()
            .is_some_and(|values| values.iter().any(|v| v == value))
    }

    /// Fill defaults and check descriptor invariants
    pub(crate) fn normalized(mut self) -> Result<Self> {
        if self.key.trim().is_empty() {
            return Err(ConditionError::InvalidRegistry(
                "field key must not be empty".to_string(),
            ));
        }

        if self.allowed_operators.is_empty() {
            self.allowed_operators = global_operators(self.semantic_type);
        }

        for operator in &self.allowed_operators {
            if !operator.applies_to(self.semantic_type) {
                return Err(ConditionError::InvalidRegistry(format!(
                    "operator `{}` does not apply to {} field `{}`",
                    operator, self.semantic_type, self.key
                )));
            }
        }

        let mut seen = OperatorSet::new();
        self.allowed_operators.retain(|op| {
            if seen.contains(op) {
                false
            } else {
                seen.push(*op);
                true
            }
        });

        match (self.semantic_type, &self.enum_values) {
            (SemanticType::Enum, Some(values)) if !values.is_empty() => {}
            (SemanticType::Enum, _) => {
                return Err(ConditionError::InvalidRegistry(format!(
                    "enum field `{}` requires enumValues",
                    self.key
                )));
            }
            (_, Some(_)) => {
                return Err(ConditionError::InvalidRegistry(format!(
                    "field `{}` is not an enum but declares enumValues",
                    self.key
                )));
            }
            (_, None) => {}
        }

        Ok(self)
    }
}
