//! Save-time validation
//!
//! Walks a whole tree and reports every problem with the path of the node
//! that caused it, so the builder can show messages next to each row.

use crate::condition::ast::{ConditionLeaf, ConditionNode};
use crate::condition::coerce::{coerce_operand, Operand};
use crate::condition::operator::Arity;
use crate::condition::path::NodePath;
use crate::config::EngineConfig;
use crate::error::{ConditionError, Result};
use crate::registry::FieldRegistry;
use std::fmt;

/// A problem found at one node
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationIssue {
    pub path: NodePath,
    pub error: ConditionError,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.error)
    }
}

/// Validate a root condition; `None` is always valid
pub fn validate(
    root: Option<&ConditionNode>,
    registry: &FieldRegistry,
    config: &EngineConfig,
) -> std::result::Result<(), Vec<ValidationIssue>> {
    let mut issues = Vec::new();
    if let Some(node) = root {
        walk(node, &NodePath::root(), 1, registry, config, &mut issues);
    }
    if issues.is_empty() {
        Ok(())
    } else {
        Err(issues)
    }
}

fn walk(
    node: &ConditionNode,
    path: &NodePath,
    depth: usize,
    registry: &FieldRegistry,
    config: &EngineConfig,
    issues: &mut Vec<ValidationIssue>,
) {
    match node {
        ConditionNode::Leaf(leaf) => {
            if let Err(error) = validate_leaf(leaf, registry) {
                issues.push(ValidationIssue {
                    path: path.clone(),
                    error,
                });
            }
        }
        ConditionNode::Group(group) => {
            if depth > config.max_depth {
                issues.push(ValidationIssue {
                    path: path.clone(),
                    error: ConditionError::MaxDepthExceeded {
                        max_depth: config.max_depth,
                    },
                });
            }
            for (index, child) in group.children.iter().enumerate() {
                walk(child, &path.child(index), depth + 1, registry, config, issues);
            }
        }
    }
}

/// Validate one leaf against the registry
///
/// Stricter than evaluation: scalar operators need a value and array
/// operators need at least one.
pub fn validate_leaf(leaf: &ConditionLeaf, registry: &FieldRegistry) -> Result<()> {
    let field = registry.get(&leaf.field)?;
    if !field.allows(leaf.operator) {
        return Err(ConditionError::InvalidOperator {
            field: leaf.field.clone(),
            operator: leaf.operator.to_string(),
        });
    }

    let operand = coerce_operand(field, leaf.operator, leaf.value.as_ref())?;
    match (leaf.operator.arity(), operand) {
        (Arity::Scalar, Operand::Absent) => Err(ConditionError::invalid_value(
            &field.key,
            format!("operator `{}` requires a value", leaf.operator),
        )),
        (Arity::Array, Operand::Many(values)) if values.is_empty() => {
            Err(ConditionError::invalid_value(
                &field.key,
                format!("operator `{}` requires at least one value", leaf.operator),
            ))
        }
        _ => Ok(()),
    }
}
