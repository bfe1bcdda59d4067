//! Condition Tree Core - Typed condition trees over flat records
//!
//! This crate evaluates nested AND/OR condition trees (as built by a visual
//! query builder) against flat key/value records. Field metadata comes from
//! a registry that fixes each field's semantic type and legal operators.
//!
//! ```
//! use condition_tree_core::{evaluate, parse_condition, FieldDescriptor, FieldRegistry};
//! use serde_json::json;
//!
//! let registry = FieldRegistry::new(vec![
//!     FieldDescriptor::enumeration("priority", "Priority", ["P1", "P2", "P3"]),
//! ])
//! .unwrap();
//!
//! let root = parse_condition(r#"{"field": "priority", "operator": "in", "value": ["P1", "P2"]}"#)
//!     .unwrap();
//! assert!(evaluate(root.as_ref(), &json!({"priority": "P1"}), &registry));
//! assert!(!evaluate(root.as_ref(), &json!({"priority": "P3"}), &registry));
//! ```

pub mod condition;
pub mod config;
pub mod editor;
pub mod engine;
pub mod error;
pub mod matcher;
pub mod registry;

// ============================================================================
// Condition model & evaluation
// ============================================================================

pub use condition::parser::{normalize_root, parse as parse_condition, to_json};
pub use condition::{
    check_leaf, evaluate, flatten_record, global_operators, try_evaluate, validate, Arity,
    ConditionCache, ConditionGroup, ConditionLeaf, ConditionNode, Connective, LeafValue,
    NodePath, Operator, OperatorSet, Record, Scalar, ValidationIssue,
};

// ============================================================================
// Registry, configuration & errors
// ============================================================================

pub use config::{EngineConfig, RegistryConfig, DEFAULT_MAX_DEPTH};
pub use error::{ConditionError, Result};
pub use registry::{FieldDescriptor, FieldRegistry, RegistryCache, SemanticType};

// ============================================================================
// Editing, matching & facade
// ============================================================================

pub use editor::{apply as apply_edit, can_add_group, Edit};
pub use engine::ConditionEngine;
pub use matcher::{all_matches, first_match, Conditioned};
