//! Value coercion
//!
//! Turns stored leaf values (operands) and record values into typed values
//! according to the field's semantic type. Operands are coerced strictly;
//! record values are coerced leniently since records come from storage.

use crate::condition::operator::{Arity, Operator};
use crate::condition::value::{LeafValue, Scalar};
use crate::error::{ConditionError, Result};
use crate::registry::{FieldDescriptor, SemanticType};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::cmp::Ordering;

/// Calendar dates must be written in full `YYYY-MM-DD` form
static DATE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("date pattern compiles"));

const NAIVE_DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S"];

/// A value after coercion to its field's semantic type
#[derive(Debug, Clone, PartialEq)]
pub enum TypedValue {
    Text(String),
    Number(f64),
    Bool(bool),
    Date(NaiveDate),
    DateTime(DateTime<Utc>),
}

/// Coerced leaf operand
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// No value, or a blank value
    Absent,
    One(TypedValue),
    Many(Vec<TypedValue>),
}

/// Coerced record value
#[derive(Debug, Clone, PartialEq)]
pub enum RecordValue {
    Empty,
    One(TypedValue),
    Many(Vec<TypedValue>),
}

impl RecordValue {
    pub fn is_empty(&self) -> bool {
        matches!(self, RecordValue::Empty)
    }

    /// Whether any contained value satisfies `predicate`
    pub fn any<F>(&self, mut predicate: F) -> bool
    where
        F: FnMut(&TypedValue) -> bool,
    {
        match self {
            RecordValue::Empty => false,
            RecordValue::One(value) => predicate(value),
            RecordValue::Many(values) => values.iter().any(predicate),
        }
    }
}

/// Compare two typed values of the same kind
pub fn compare(left: &TypedValue, right: &TypedValue) -> Option<Ordering> {
    match (left, right) {
        (TypedValue::Text(a), TypedValue::Text(b)) => Some(a.cmp(b)),
        (TypedValue::Number(a), TypedValue::Number(b)) => a.partial_cmp(b),
        (TypedValue::Bool(a), TypedValue::Bool(b)) => Some(a.cmp(b)),
        (TypedValue::Date(a), TypedValue::Date(b)) => Some(a.cmp(b)),
        (TypedValue::DateTime(a), TypedValue::DateTime(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

/// Presence test: missing, `null`, `""` and arrays holding only those are empty
pub fn is_empty_value(value: Option<&Value>) -> bool {
    match value {
        None => true,
        Some(Value::Array(items)) => items.iter().all(is_blank),
        Some(other) => is_blank(other),
    }
}

/// A single JSON value carrying nothing: `null` or `""`
fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

// ============================================================================
// Operand coercion
// ============================================================================

/// Coerce a leaf's stored value for `operator`
///
/// Presence operators ignore the value. Array operators accept a sequence,
/// a comma-separated string or a single scalar; elements are trimmed and
/// blank elements dropped.
pub fn coerce_operand(
    field: &FieldDescriptor,
    operator: Operator,
    value: Option<&LeafValue>,
) -> Result<Operand> {
    match operator.arity() {
        Arity::None => Ok(Operand::Absent),
        Arity::Scalar => match value {
            None => Ok(Operand::Absent),
            Some(LeafValue::Scalar(scalar)) => {
                Ok(coerce_scalar(field, scalar)?.map_or(Operand::Absent, Operand::One))
            }
            Some(LeafValue::Sequence(_)) => Err(ConditionError::invalid_value(
                &field.key,
                format!("operator `{}` takes a single value, not a list", operator),
            )),
        },
        Arity::Array => {
            let mut values = Vec::new();
            match value {
                None => {}
                Some(LeafValue::Sequence(items)) => {
                    for item in items {
                        push_element(field, item, &mut values)?;
                    }
                }
                Some(LeafValue::Scalar(Scalar::Text(text))) => {
                    for part in text.split(',') {
                        push_text_element(field, part, &mut values)?;
                    }
                }
                Some(LeafValue::Scalar(other)) => push_element(field, other, &mut values)?,
            }
            Ok(Operand::Many(values))
        }
    }
}

fn push_element(field: &FieldDescriptor, item: &Scalar, out: &mut Vec<TypedValue>) -> Result<()> {
    match item {
        Scalar::Text(text) => push_text_element(field, text, out),
        other => {
            if let Some(value) = coerce_scalar(field, other)? {
                out.push(value);
            }
            Ok(())
        }
    }
}

fn push_text_element(field: &FieldDescriptor, text: &str, out: &mut Vec<TypedValue>) -> Result<()> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(());
    }
    if let Some(value) = coerce_text(field, text)? {
        out.push(value);
    }
    Ok(())
}

/// Coerce one stored scalar; `Ok(None)` means the value is blank
pub fn coerce_scalar(field: &FieldDescriptor, scalar: &Scalar) -> Result<Option<TypedValue>> {
    match (scalar, field.semantic_type) {
        (Scalar::Text(text), _) => coerce_text(field, text),
        // Textual fields compare numbers and booleans by their JSON text
        (Scalar::Number(_) | Scalar::Bool(_), semantic_type) if semantic_type.is_textual() => {
            coerce_text(field, &scalar.to_string())
        }
        (Scalar::Number(n), SemanticType::Number) => Ok(Some(TypedValue::Number(*n))),
        (Scalar::Bool(b), SemanticType::Boolean) => Ok(Some(TypedValue::Bool(*b))),
        (other, semantic_type) => Err(ConditionError::invalid_value(
            &field.key,
            format!("expected a {} value, got {}", semantic_type, other),
        )),
    }
}

fn coerce_text(field: &FieldDescriptor, text: &str) -> Result<Option<TypedValue>> {
    let semantic_type = field.semantic_type;

    // Only the exact empty string is absent; booleans never are
    if semantic_type != SemanticType::Boolean && text.is_empty() {
        return Ok(None);
    }

    let value = match semantic_type {
        SemanticType::Boolean => TypedValue::Bool(parse_bool(text).ok_or_else(|| {
            ConditionError::invalid_value(
                &field.key,
                format!("`{}` is not `true` or `false`", text),
            )
        })?),
        SemanticType::String | SemanticType::Uuid => TypedValue::Text(text.to_string()),
        SemanticType::Enum => {
            if !field.is_enum_member(text) {
                return Err(ConditionError::invalid_value(
                    &field.key,
                    format!("`{}` is not one of the allowed values", text),
                ));
            }
            TypedValue::Text(text.to_string())
        }
        SemanticType::Number => TypedValue::Number(parse_number(text).ok_or_else(|| {
            ConditionError::invalid_value(&field.key, format!("`{}` is not a number", text))
        })?),
        SemanticType::Date => TypedValue::Date(parse_date(text).ok_or_else(|| {
            ConditionError::invalid_value(
                &field.key,
                format!("`{}` is not a date (YYYY-MM-DD)", text),
            )
        })?),
        SemanticType::Datetime => TypedValue::DateTime(parse_datetime(text).ok_or_else(|| {
            ConditionError::invalid_value(&field.key, format!("`{}` is not a timestamp", text))
        })?),
    };

    Ok(Some(value))
}

// ============================================================================
// Record coercion
// ============================================================================

/// Coerce the record's value for `field`
///
/// Arrays become multi-valued records. Numbers and booleans stored in
/// textual fields are compared by their JSON text. A `date` field accepts a
/// full timestamp and keeps its UTC calendar date.
pub fn coerce_record_value(field: &FieldDescriptor, value: Option<&Value>) -> Result<RecordValue> {
    match value {
        None | Some(Value::Null) => Ok(RecordValue::Empty),
        Some(Value::Array(items)) => {
            let mut values = Vec::with_capacity(items.len());
            for item in items {
                if let Some(value) = coerce_json(field, item)? {
                    values.push(value);
                }
            }
            if values.is_empty() {
                Ok(RecordValue::Empty)
            } else {
                Ok(RecordValue::Many(values))
            }
        }
        Some(other) => Ok(coerce_json(field, other)?.map_or(RecordValue::Empty, RecordValue::One)),
    }
}

fn coerce_json(field: &FieldDescriptor, value: &Value) -> Result<Option<TypedValue>> {
    let semantic_type = field.semantic_type;
    let mismatch = || {
        ConditionError::invalid_value(
            &field.key,
            format!("record value {} is not a {} value", value, semantic_type),
        )
    };

    if is_blank(value) {
        return Ok(None);
    }

    let typed = match value {
        Value::Null => return Ok(None),
        Value::String(s) => match semantic_type {
            SemanticType::String | SemanticType::Enum | SemanticType::Uuid => {
                TypedValue::Text(s.clone())
            }
            SemanticType::Number => TypedValue::Number(parse_number(s).ok_or_else(mismatch)?),
            SemanticType::Boolean => TypedValue::Bool(parse_bool(s).ok_or_else(mismatch)?),
            SemanticType::Date => TypedValue::Date(
                parse_date(s)
                    .or_else(|| parse_datetime(s).map(|dt| dt.date_naive()))
                    .ok_or_else(mismatch)?,
            ),
            SemanticType::Datetime => TypedValue::DateTime(
                parse_datetime(s)
                    .or_else(|| {
                        parse_date(s)
                            .and_then(|d| d.and_hms_opt(0, 0, 0))
                            .map(|dt| dt.and_utc())
                    })
                    .ok_or_else(mismatch)?,
            ),
        },
        Value::Number(n) => match semantic_type {
            SemanticType::Number => TypedValue::Number(n.as_f64().ok_or_else(mismatch)?),
            t if t.is_textual() => TypedValue::Text(n.to_string()),
            _ => return Err(mismatch()),
        },
        Value::Bool(b) => match semantic_type {
            SemanticType::Boolean => TypedValue::Bool(*b),
            t if t.is_textual() => TypedValue::Text(b.to_string()),
            _ => return Err(mismatch()),
        },
        Value::Array(_) | Value::Object(_) => {
            return Err(ConditionError::invalid_value(
                &field.key,
                "nested record values must be flattened before evaluation",
            ));
        }
    };

    Ok(Some(typed))
}

// ============================================================================
// Parsers
// ============================================================================

fn parse_bool(text: &str) -> Option<bool> {
    match text {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

fn parse_number(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

fn parse_date(text: &str) -> Option<NaiveDate> {
    if !DATE_PATTERN.is_match(text) {
        return None;
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d").ok()
}

fn parse_datetime(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .map(|naive| naive.and_utc())
}
