//! Comparison operators and their semantics

use crate::condition::coerce::{compare, Operand, RecordValue, TypedValue};
use crate::error::{ConditionError, Result};
use crate::registry::{FieldDescriptor, SemanticType};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::cmp::Ordering;
use std::fmt;

/// Ordered set of operators; fits every operator inline
pub type OperatorSet = SmallVec<[Operator; 11]>;

/// Leaf comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Is,
    IsNot,
    In,
    NotIn,
    Contains,
    IsEmpty,
    IsNotEmpty,
    Gt,
    Gte,
    Lt,
    Lte,
}

/// How many values an operator takes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    None,
    Scalar,
    Array,
}

impl Operator {
    pub const ALL: [Operator; 11] = [
        Operator::Is,
        Operator::IsNot,
        Operator::In,
        Operator::NotIn,
        Operator::Contains,
        Operator::IsEmpty,
        Operator::IsNotEmpty,
        Operator::Gt,
        Operator::Gte,
        Operator::Lt,
        Operator::Lte,
    ];

    /// Wire identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Is => "is",
            Operator::IsNot => "is_not",
            Operator::In => "in",
            Operator::NotIn => "not_in",
            Operator::Contains => "contains",
            Operator::IsEmpty => "is_empty",
            Operator::IsNotEmpty => "is_not_empty",
            Operator::Gt => "gt",
            Operator::Gte => "gte",
            Operator::Lt => "lt",
            Operator::Lte => "lte",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Operator::ALL.into_iter().find(|op| op.as_str() == s)
    }

    /// Human-readable form used when rendering trees
    pub fn label(&self) -> &'static str {
        match self {
            Operator::Is => "is",
            Operator::IsNot => "is not",
            Operator::In => "in",
            Operator::NotIn => "not in",
            Operator::Contains => "contains",
            Operator::IsEmpty => "is empty",
            Operator::IsNotEmpty => "is not empty",
            Operator::Gt => ">",
            Operator::Gte => ">=",
            Operator::Lt => "<",
            Operator::Lte => "<=",
        }
    }

    pub fn arity(&self) -> Arity {
        match self {
            Operator::IsEmpty | Operator::IsNotEmpty => Arity::None,
            Operator::In | Operator::NotIn => Arity::Array,
            _ => Arity::Scalar,
        }
    }

    /// Whether the operator is defined for a semantic type
    pub fn applies_to(&self, semantic_type: SemanticType) -> bool {
        use SemanticType::*;
        match self {
            Operator::Is | Operator::IsNot | Operator::IsEmpty | Operator::IsNotEmpty => true,
            Operator::In | Operator::NotIn => {
                matches!(semantic_type, String | Enum | Uuid | Number)
            }
            Operator::Contains => semantic_type == String,
            Operator::Gt | Operator::Gte | Operator::Lt | Operator::Lte => {
                matches!(semantic_type, Number | Date | Datetime)
            }
        }
    }

    /// `is_not` and `not_in` are negations of `is` and `in`
    pub fn negated(&self) -> Option<Operator> {
        match self {
            Operator::IsNot => Some(Operator::Is),
            Operator::NotIn => Some(Operator::In),
            _ => None,
        }
    }

    /// Apply the operator to a coerced record value and operand
    ///
    /// Multi-valued records match a positive operator when any element does.
    pub fn apply(
        &self,
        field: &FieldDescriptor,
        actual: &RecordValue,
        operand: &Operand,
    ) -> Result<bool> {
        if let Some(positive) = self.negated() {
            return positive.apply(field, actual, operand).map(|matched| !matched);
        }

        match (self, operand) {
            (Operator::IsEmpty, _) => Ok(actual.is_empty()),
            (Operator::IsNotEmpty, _) => Ok(!actual.is_empty()),

            (Operator::Is, Operand::Absent) => Ok(actual.is_empty()),
            (Operator::Is, Operand::One(expected)) => {
                Ok(actual.any(|v| compare(v, expected) == Some(Ordering::Equal)))
            }

            (Operator::In, Operand::Many(expected)) => Ok(actual.any(|v| {
                expected
                    .iter()
                    .any(|e| compare(v, e) == Some(Ordering::Equal))
            })),

            (Operator::Contains, Operand::One(TypedValue::Text(needle))) => Ok(actual.any(|v| {
                matches!(v, TypedValue::Text(haystack) if haystack.contains(needle.as_str()))
            })),

            (Operator::Gt | Operator::Gte | Operator::Lt | Operator::Lte, Operand::One(expected)) => {
                Ok(actual.any(|v| compare(v, expected).is_some_and(|ord| self.accepts(ord))))
            }

            (_, Operand::Absent) => Err(ConditionError::invalid_value(
                &field.key,
                format!("operator `{}` requires a value", self),
            )),
            _ => Err(ConditionError::invalid_value(
                &field.key,
                format!("operand does not fit operator `{}`", self),
            )),
        }
    }

    /// Ordering check for `gt`/`gte`/`lt`/`lte`
    fn accepts(&self, ordering: Ordering) -> bool {
        match self {
            Operator::Gt => ordering == Ordering::Greater,
            Operator::Gte => ordering != Ordering::Less,
            Operator::Lt => ordering == Ordering::Less,
            Operator::Lte => ordering != Ordering::Greater,
            _ => false,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every operator defined for a semantic type, in canonical order
pub fn global_operators(semantic_type: SemanticType) -> OperatorSet {
    Operator::ALL
        .into_iter()
        .filter(|op| op.applies_to(semantic_type))
        .collect()
}
