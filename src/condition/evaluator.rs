//! Condition evaluator
//!
//! `try_evaluate` is strict and returns the first structural error it meets.
//! `evaluate` is the boundary used by callers: a leaf that fails to evaluate
//! (unknown field, disallowed operator, bad value) counts as non-matching and
//! a warning is logged.

use crate::condition::ast::{ConditionGroup, ConditionLeaf, ConditionNode, Connective};
use crate::condition::coerce::{coerce_operand, coerce_record_value, is_empty_value};
use crate::condition::operator::Operator;
use crate::condition::record::Record;
use crate::error::{ConditionError, Result};
use crate::registry::FieldRegistry;

/// Evaluate a root condition; `None` matches every record
pub fn evaluate<R: Record + ?Sized>(
    root: Option<&ConditionNode>,
    record: &R,
    registry: &FieldRegistry,
) -> bool {
    match root {
        None => true,
        Some(node) => check(node, record, registry),
    }
}

/// Evaluate a root condition, propagating structural errors
pub fn try_evaluate<R: Record + ?Sized>(
    root: Option<&ConditionNode>,
    record: &R,
    registry: &FieldRegistry,
) -> Result<bool> {
    match root {
        None => Ok(true),
        Some(node) => try_check(node, record, registry),
    }
}

/// Evaluate a node, treating failing leaves as non-matching
pub fn check<R: Record + ?Sized>(node: &ConditionNode, record: &R, registry: &FieldRegistry) -> bool {
    match node {
        ConditionNode::Leaf(leaf) => match check_leaf(leaf, record, registry) {
            Ok(matched) => matched,
            Err(err) => {
                log::warn!("condition `{}` treated as non-matching: {}", leaf, err);
                false
            }
        },
        ConditionNode::Group(group) => {
            short_circuit(group, |child| Ok::<_, ConditionError>(check(child, record, registry)))
                .unwrap_or(false)
        }
    }
}

/// Evaluate a node, propagating structural errors
pub fn try_check<R: Record + ?Sized>(
    node: &ConditionNode,
    record: &R,
    registry: &FieldRegistry,
) -> Result<bool> {
    match node {
        ConditionNode::Leaf(leaf) => check_leaf(leaf, record, registry),
        ConditionNode::Group(group) => short_circuit(group, |child| try_check(child, record, registry)),
    }
}

/// Left-to-right evaluation stopping at the first determining child
///
/// Empty AND is true, empty OR is false.
fn short_circuit<F>(group: &ConditionGroup, mut eval: F) -> Result<bool>
where
    F: FnMut(&ConditionNode) -> Result<bool>,
{
    match group.connective {
        Connective::And => {
            for child in &group.children {
                if !eval(child)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        Connective::Or => {
            for child in &group.children {
                if eval(child)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
    }
}

/// Evaluate a single leaf against a record
pub fn check_leaf<R: Record + ?Sized>(
    leaf: &ConditionLeaf,
    record: &R,
    registry: &FieldRegistry,
) -> Result<bool> {
    let field = registry.get(&leaf.field)?;
    if !field.allows(leaf.operator) {
        return Err(ConditionError::InvalidOperator {
            field: leaf.field.clone(),
            operator: leaf.operator.to_string(),
        });
    }

    let raw = record.value_of(&leaf.field);

    // Presence tests never look at the stored value or coerce the record
    match leaf.operator {
        Operator::IsEmpty => return Ok(is_empty_value(raw)),
        Operator::IsNotEmpty => return Ok(!is_empty_value(raw)),
        _ => {}
    }

    let operand = coerce_operand(field, leaf.operator, leaf.value.as_ref())?;
    let actual = coerce_record_value(field, raw)?;
    leaf.operator.apply(field, &actual, &operand)
}
