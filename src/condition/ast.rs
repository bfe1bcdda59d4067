//! Condition tree model
//!
//! A condition is either a leaf predicate or a group joining ordered
//! children with a connective. Trees are plain values: editing produces a
//! new tree and equality is structural.
//!
//! Wire shape: leaves are `{"field", "operator", "value"?}`, groups are
//! `{"connective": "AND" | "OR", "children": [...]}`. Unknown keys are
//! rejected so a malformed object cannot be taken for the other variant.

use crate::condition::operator::{Arity, Operator};
use crate::condition::value::LeafValue;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Logical connective of a group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Connective {
    #[default]
    And,
    Or,
}

impl Connective {
    pub fn opposite(self) -> Self {
        match self {
            Connective::And => Connective::Or,
            Connective::Or => Connective::And,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Connective::And => "AND",
            Connective::Or => "OR",
        }
    }
}

impl fmt::Display for Connective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Single field/operator/value predicate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConditionLeaf {
    pub field: String,
    pub operator: Operator,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<LeafValue>,
}

impl ConditionLeaf {
    pub fn new(field: impl Into<String>, operator: Operator, value: Option<LeafValue>) -> Self {
        Self {
            field: field.into(),
            operator,
            value,
        }
    }

    /// Leaf as created by the editor: no field, `is`, blank value
    pub fn empty() -> Self {
        Self::new("", Operator::Is, Some(LeafValue::blank()))
    }

    /// Fresh leaf for `field`: operator `is`, blank value
    pub fn for_field(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            ..Self::empty()
        }
    }
}

impl Default for ConditionLeaf {
    fn default() -> Self {
        Self::empty()
    }
}

/// Connective over ordered children
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConditionGroup {
    pub connective: Connective,
    #[serde(default)]
    pub children: Vec<ConditionNode>,
}

impl ConditionGroup {
    pub fn new(connective: Connective, children: Vec<ConditionNode>) -> Self {
        Self {
            connective,
            children,
        }
    }
}

/// A condition tree node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConditionNode {
    Group(ConditionGroup),
    Leaf(ConditionLeaf),
}

impl ConditionNode {
    pub fn leaf(field: impl Into<String>, operator: Operator, value: Option<LeafValue>) -> Self {
        ConditionNode::Leaf(ConditionLeaf::new(field, operator, value))
    }

    pub fn group(connective: Connective, children: Vec<ConditionNode>) -> Self {
        ConditionNode::Group(ConditionGroup::new(connective, children))
    }

    pub fn and(children: Vec<ConditionNode>) -> Self {
        Self::group(Connective::And, children)
    }

    pub fn or(children: Vec<ConditionNode>) -> Self {
        Self::group(Connective::Or, children)
    }

    pub fn is_group(&self) -> bool {
        matches!(self, ConditionNode::Group(_))
    }

    pub fn as_group(&self) -> Option<&ConditionGroup> {
        match self {
            ConditionNode::Group(group) => Some(group),
            ConditionNode::Leaf(_) => None,
        }
    }

    pub fn as_leaf(&self) -> Option<&ConditionLeaf> {
        match self {
            ConditionNode::Leaf(leaf) => Some(leaf),
            ConditionNode::Group(_) => None,
        }
    }

    /// Group nesting depth: 0 for a leaf, 1 for a flat group
    pub fn depth(&self) -> usize {
        match self {
            ConditionNode::Leaf(_) => 0,
            ConditionNode::Group(group) => {
                1 + group.children.iter().map(ConditionNode::depth).max().unwrap_or(0)
            }
        }
    }

    /// Number of leaves in the tree
    pub fn leaf_count(&self) -> usize {
        match self {
            ConditionNode::Leaf(_) => 1,
            ConditionNode::Group(group) => group.children.iter().map(ConditionNode::leaf_count).sum(),
        }
    }

    fn fmt_nested(&self, f: &mut fmt::Formatter<'_>, nested: bool) -> fmt::Result {
        match self {
            ConditionNode::Leaf(leaf) => write!(f, "{}", leaf),
            ConditionNode::Group(group) if group.children.is_empty() => {
                write!(f, "({} of nothing)", group.connective)
            }
            ConditionNode::Group(group) => {
                if nested {
                    f.write_str("(")?;
                }
                for (i, child) in group.children.iter().enumerate() {
                    if i > 0 {
                        write!(f, " {} ", group.connective)?;
                    }
                    child.fmt_nested(f, true)?;
                }
                if nested {
                    f.write_str(")")?;
                }
                Ok(())
            }
        }
    }
}

impl From<ConditionLeaf> for ConditionNode {
    fn from(leaf: ConditionLeaf) -> Self {
        ConditionNode::Leaf(leaf)
    }
}

impl From<ConditionGroup> for ConditionNode {
    fn from(group: ConditionGroup) -> Self {
        ConditionNode::Group(group)
    }
}

impl fmt::Display for ConditionLeaf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let field = if self.field.is_empty() { "?" } else { &self.field };
        write!(f, "{} {}", field, self.operator.label())?;
        match (self.operator.arity(), &self.value) {
            (Arity::None, _) | (_, None) => Ok(()),
            (_, Some(value)) => write!(f, " {}", value),
        }
    }
}

impl fmt::Display for ConditionNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_nested(f, false)
    }
}
