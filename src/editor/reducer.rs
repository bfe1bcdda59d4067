//! Tree editing as a pure reducer
//!
//! Every operation takes the current root and returns a new root, leaving
//! the input untouched. A bare-leaf root is wrapped in an AND group before
//! editing, and a root group left without children collapses to `None`.

use crate::condition::parser::normalize_root;
use crate::condition::{ConditionGroup, ConditionLeaf, ConditionNode, Connective, NodePath};
use crate::config::EngineConfig;
use crate::error::{ConditionError, Result};
use serde::{Deserialize, Serialize};

/// One structural edit, addressed by node path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Edit {
    AddLeaf { path: NodePath },
    AddGroup { path: NodePath },
    UpdateNode { path: NodePath, node: ConditionNode },
    RemoveNode { path: NodePath },
    ToggleConnective { path: NodePath },
}

/// Apply an edit to a root condition
pub fn apply(
    root: Option<&ConditionNode>,
    edit: &Edit,
    config: &EngineConfig,
) -> Result<Option<ConditionNode>> {
    match edit {
        Edit::AddLeaf { path } => add_leaf(root, path),
        Edit::AddGroup { path } => add_group(root, path, config),
        Edit::UpdateNode { path, node } => update_node(root, path, node.clone(), config),
        Edit::RemoveNode { path } => remove_node(root, path),
        Edit::ToggleConnective { path } => toggle_connective(root, path),
    }
}

/// Append a blank leaf to the group at `path`
///
/// On an empty root this creates an AND group holding the new leaf.
pub fn add_leaf(root: Option<&ConditionNode>, path: &NodePath) -> Result<Option<ConditionNode>> {
    let mut tree = editable_root(root, path)?;
    group_at_mut(&mut tree, path)?
        .children
        .push(ConditionNode::Leaf(ConditionLeaf::empty()));
    Ok(Some(tree))
}

/// Append an empty group with the opposite connective to the group at `path`
pub fn add_group(
    root: Option<&ConditionNode>,
    path: &NodePath,
    config: &EngineConfig,
) -> Result<Option<ConditionNode>> {
    // The new group sits one level below its parent group
    if new_group_depth(path) > config.max_depth {
        return Err(ConditionError::MaxDepthExceeded {
            max_depth: config.max_depth,
        });
    }

    let mut tree = editable_root(root, path)?;
    let parent = group_at_mut(&mut tree, path)?;
    let child = ConditionGroup::new(parent.connective.opposite(), Vec::new());
    parent.children.push(ConditionNode::Group(child));
    Ok(Some(tree))
}

/// Whether `add_group` would succeed at `path`
pub fn can_add_group(root: Option<&ConditionNode>, path: &NodePath, config: &EngineConfig) -> bool {
    if new_group_depth(path) > config.max_depth {
        return false;
    }
    match normalize_root(root.cloned()) {
        None => path.is_root(),
        Some(tree) => matches!(node_at(&tree, path), Some(ConditionNode::Group(_))),
    }
}

/// Replace the node at `path`
///
/// A leaf whose field changes gets its operator and value reset.
pub fn update_node(
    root: Option<&ConditionNode>,
    path: &NodePath,
    node: ConditionNode,
    config: &EngineConfig,
) -> Result<Option<ConditionNode>> {
    let tree = if path.is_root() {
        let previous = normalize_root(root.cloned());
        normalize_root(Some(reset_on_field_change(previous.as_ref(), node)))
    } else {
        let mut tree = normalize_root(root.cloned()).ok_or_else(|| empty_tree(path))?;
        let slot = node_at_mut(&mut tree, path)?;
        *slot = reset_on_field_change(Some(&*slot), node);
        Some(tree)
    };

    if let Some(tree) = &tree {
        if tree.depth() > config.max_depth {
            return Err(ConditionError::MaxDepthExceeded {
                max_depth: config.max_depth,
            });
        }
    }
    Ok(tree)
}

/// Remove the node at `path`
///
/// Removing the root, or the last child of the root group, yields `None`.
pub fn remove_node(root: Option<&ConditionNode>, path: &NodePath) -> Result<Option<ConditionNode>> {
    let Some((parent_path, index)) = path.split_last() else {
        return Ok(None);
    };

    let mut tree = normalize_root(root.cloned()).ok_or_else(|| empty_tree(path))?;
    let parent = group_at_mut(&mut tree, &parent_path)?;
    if index >= parent.children.len() {
        return Err(invalid_path(path, format!("no child at index {}", index)));
    }
    parent.children.remove(index);

    match &tree {
        ConditionNode::Group(group) if group.children.is_empty() => Ok(None),
        _ => Ok(Some(tree)),
    }
}

/// Flip AND/OR on the group at `path`; children are untouched
pub fn toggle_connective(root: Option<&ConditionNode>, path: &NodePath) -> Result<Option<ConditionNode>> {
    let mut tree = normalize_root(root.cloned()).ok_or_else(|| empty_tree(path))?;
    let group = group_at_mut(&mut tree, path)?;
    group.connective = group.connective.opposite();
    Ok(Some(tree))
}

/// Node at `path`, if the path resolves
pub fn node_at<'a>(root: &'a ConditionNode, path: &NodePath) -> Option<&'a ConditionNode> {
    let mut current = root;
    for &index in path.indices() {
        current = current.as_group()?.children.get(index)?;
    }
    Some(current)
}

// ============================================================================
// Helpers
// ============================================================================

fn new_group_depth(path: &NodePath) -> usize {
    path.len() + 2
}

fn editable_root(root: Option<&ConditionNode>, path: &NodePath) -> Result<ConditionNode> {
    match normalize_root(root.cloned()) {
        Some(tree) => Ok(tree),
        None if path.is_root() => Ok(ConditionNode::group(Connective::And, Vec::new())),
        None => Err(empty_tree(path)),
    }
}

fn reset_on_field_change(previous: Option<&ConditionNode>, next: ConditionNode) -> ConditionNode {
    match (previous, next) {
        (Some(ConditionNode::Leaf(old)), ConditionNode::Leaf(new)) if old.field != new.field => {
            ConditionNode::Leaf(ConditionLeaf::for_field(new.field))
        }
        (_, next) => next,
    }
}

fn node_at_mut<'a>(root: &'a mut ConditionNode, path: &NodePath) -> Result<&'a mut ConditionNode> {
    let mut current = root;
    for &index in path.indices() {
        current = match current {
            ConditionNode::Group(group) => group
                .children
                .get_mut(index)
                .ok_or_else(|| invalid_path(path, format!("no child at index {}", index)))?,
            ConditionNode::Leaf(_) => {
                return Err(invalid_path(path, "leaf conditions have no children"));
            }
        };
    }
    Ok(current)
}

fn group_at_mut<'a>(root: &'a mut ConditionNode, path: &NodePath) -> Result<&'a mut ConditionGroup> {
    match node_at_mut(root, path)? {
        ConditionNode::Group(group) => Ok(group),
        ConditionNode::Leaf(_) => Err(invalid_path(path, "target is not a group")),
    }
}

fn invalid_path(path: &NodePath, reason: impl Into<String>) -> ConditionError {
    ConditionError::InvalidPath {
        path: path.to_string(),
        reason: reason.into(),
    }
}

fn empty_tree(path: &NodePath) -> ConditionError {
    invalid_path(path, "the condition is empty")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::{LeafValue, Operator};

    fn config() -> EngineConfig {
        EngineConfig::default()
    }

    fn priority_is(value: &str) -> ConditionNode {
        ConditionNode::leaf("priority", Operator::Is, Some(value.into()))
    }

    fn sample() -> ConditionNode {
        ConditionNode::and(vec![
            ConditionNode::leaf("category", Operator::Is, Some("HARDWARE".into())),
            ConditionNode::or(vec![priority_is("P1"), priority_is("P2")]),
        ])
    }

    #[test]
    fn test_add_leaf_on_empty_root() {
        let tree = add_leaf(None, &NodePath::root()).unwrap().unwrap();
        assert_eq!(
            tree,
            ConditionNode::and(vec![ConditionNode::Leaf(ConditionLeaf::empty())])
        );
    }

    #[test]
    fn test_add_leaf_leaves_input_untouched() {
        let original = sample();
        let edited = add_leaf(Some(&original), &NodePath::from([1])).unwrap().unwrap();

        assert_eq!(original, sample());
        assert_ne!(edited, original);
        let nested = edited.as_group().unwrap().children[1].as_group().unwrap();
        assert_eq!(nested.children.len(), 3);
        assert_eq!(nested.children[2], ConditionNode::Leaf(ConditionLeaf::empty()));
    }

    #[test]
    fn test_add_leaf_to_leaf_is_refused() {
        let err = add_leaf(Some(&sample()), &NodePath::from([0])).unwrap_err();
        assert!(matches!(err, ConditionError::InvalidPath { .. }));

        let err = add_leaf(None, &NodePath::from([0])).unwrap_err();
        assert!(matches!(err, ConditionError::InvalidPath { .. }));
    }

    #[test]
    fn test_add_group_alternates_connective() {
        let tree = add_group(Some(&sample()), &NodePath::root(), &config()).unwrap().unwrap();
        let added = tree.as_group().unwrap().children[2].as_group().unwrap();
        assert_eq!(added.connective, Connective::Or);
        assert!(added.children.is_empty());

        let tree = add_group(Some(&sample()), &NodePath::from([1]), &config()).unwrap().unwrap();
        let added = node_at(&tree, &NodePath::from([1, 2])).unwrap().as_group().unwrap();
        assert_eq!(added.connective, Connective::And);
    }

    #[test]
    fn test_add_group_depth_guard() {
        let config = config();
        let mut tree = Some(ConditionNode::and(vec![]));
        let mut path = NodePath::root();

        // Root plus three nested groups reach the limit of four
        for _ in 0..3 {
            assert!(can_add_group(tree.as_ref(), &path, &config));
            tree = add_group(tree.as_ref(), &path, &config).unwrap();
            path = path.child(0);
        }
        assert_eq!(tree.as_ref().unwrap().depth(), 4);

        assert!(!can_add_group(tree.as_ref(), &path, &config));
        let err = add_group(tree.as_ref(), &path, &config).unwrap_err();
        assert_eq!(err, ConditionError::MaxDepthExceeded { max_depth: 4 });

        // A larger bound allows one more level
        let wider = EngineConfig::with_max_depth(5);
        assert!(add_group(tree.as_ref(), &path, &wider).is_ok());
    }

    #[test]
    fn test_can_add_group_targets() {
        let config = config();
        assert!(can_add_group(None, &NodePath::root(), &config));
        assert!(!can_add_group(None, &NodePath::from([0]), &config));
        assert!(!can_add_group(Some(&sample()), &NodePath::from([0]), &config));
        assert!(can_add_group(Some(&sample()), &NodePath::from([1]), &config));
    }

    #[test]
    fn test_update_node_resets_on_field_change() {
        let changed = ConditionNode::leaf("category", Operator::In, Some(LeafValue::list(["A"])));
        let tree = update_node(Some(&sample()), &NodePath::from([1, 0]), changed, &config())
            .unwrap()
            .unwrap();

        let leaf = node_at(&tree, &NodePath::from([1, 0])).unwrap().as_leaf().unwrap();
        assert_eq!(leaf.field, "category");
        assert_eq!(leaf.operator, Operator::Is);
        assert_eq!(leaf.value, Some(LeafValue::from("")));

        // Siblings untouched
        assert_eq!(node_at(&tree, &NodePath::from([1, 1])), Some(&priority_is("P2")));
        assert_eq!(node_at(&tree, &NodePath::from([0])), node_at(&sample(), &NodePath::from([0])));
    }

    #[test]
    fn test_update_node_keeps_same_field_edits() {
        let updated = ConditionNode::leaf("priority", Operator::In, Some(LeafValue::list(["P1", "P3"])));
        let tree = update_node(Some(&sample()), &NodePath::from([1, 0]), updated.clone(), &config())
            .unwrap()
            .unwrap();
        assert_eq!(node_at(&tree, &NodePath::from([1, 0])), Some(&updated));
    }

    #[test]
    fn test_update_node_replaces_leaf_with_group() {
        let group = ConditionNode::or(vec![priority_is("P3")]);
        let tree = update_node(Some(&sample()), &NodePath::from([0]), group.clone(), &config())
            .unwrap()
            .unwrap();
        assert_eq!(node_at(&tree, &NodePath::from([0])), Some(&group));
    }

    #[test]
    fn test_update_node_depth_guard() {
        // Four levels below the root group
        let deep = ConditionNode::or(vec![ConditionNode::and(vec![ConditionNode::or(vec![
            ConditionNode::and(vec![]),
        ])])]);
        let err = update_node(Some(&sample()), &NodePath::from([1]), deep, &config()).unwrap_err();
        assert!(matches!(err, ConditionError::MaxDepthExceeded { .. }));
    }

    #[test]
    fn test_update_root_wraps_leaf() {
        let tree = update_node(None, &NodePath::root(), priority_is("P1"), &config()).unwrap();
        assert_eq!(tree, Some(ConditionNode::and(vec![priority_is("P1")])));
    }

    #[test]
    fn test_remove_sole_child_yields_none() {
        let tree = ConditionNode::and(vec![priority_is("P1")]);
        assert_eq!(remove_node(Some(&tree), &NodePath::from([0])).unwrap(), None);

        // Bare leaf roots normalize to a one-child group first
        assert_eq!(remove_node(Some(&priority_is("P1")), &NodePath::from([0])).unwrap(), None);
        assert_eq!(remove_node(Some(&sample()), &NodePath::root()).unwrap(), None);
    }

    #[test]
    fn test_remove_nested_keeps_empty_group() {
        let tree = remove_node(Some(&sample()), &NodePath::from([1, 0])).unwrap().unwrap();
        let tree = remove_node(Some(&tree), &NodePath::from([1, 0])).unwrap().unwrap();
        let nested = node_at(&tree, &NodePath::from([1])).unwrap().as_group().unwrap();
        assert!(nested.children.is_empty());
    }

    #[test]
    fn test_remove_out_of_range() {
        let err = remove_node(Some(&sample()), &NodePath::from([5])).unwrap_err();
        assert!(matches!(err, ConditionError::InvalidPath { .. }));
        assert!(remove_node(None, &NodePath::from([0])).is_err());
    }

    #[test]
    fn test_toggle_connective() {
        let tree = toggle_connective(Some(&sample()), &NodePath::from([1])).unwrap().unwrap();
        let nested = node_at(&tree, &NodePath::from([1])).unwrap().as_group().unwrap();
        assert_eq!(nested.connective, Connective::And);
        assert_eq!(nested.children, vec![priority_is("P1"), priority_is("P2")]);
        assert_eq!(tree.as_group().unwrap().connective, Connective::And);

        let err = toggle_connective(Some(&sample()), &NodePath::from([0])).unwrap_err();
        assert!(matches!(err, ConditionError::InvalidPath { .. }));
    }

    #[test]
    fn test_apply_dispatch() {
        let edits = vec![
            Edit::AddLeaf { path: NodePath::root() },
            Edit::UpdateNode {
                path: NodePath::from([0]),
                node: priority_is("P1"),
            },
            Edit::AddGroup { path: NodePath::root() },
            Edit::AddLeaf { path: NodePath::from([1]) },
            Edit::ToggleConnective { path: NodePath::root() },
        ];

        let mut tree = None;
        for edit in &edits {
            tree = apply(tree.as_ref(), edit, &config()).unwrap();
        }

        let tree = tree.unwrap();
        let root = tree.as_group().unwrap();
        assert_eq!(root.connective, Connective::Or);
        // The first leaf moved from "" to "priority", so it was reset
        assert_eq!(root.children[0], ConditionNode::Leaf(ConditionLeaf::for_field("priority")));
        assert_eq!(root.children[1].as_group().unwrap().children.len(), 1);
    }

    #[test]
    fn test_edit_json() {
        let edit: Edit = serde_json::from_str(r#"{"type": "remove_node", "path": [1, 0]}"#).unwrap();
        assert_eq!(
            edit,
            Edit::RemoveNode {
                path: NodePath::from([1, 0])
            }
        );

        let edit: Edit = serde_json::from_str(
            r#"{"type": "update_node", "path": [0], "node": {"field": "priority", "operator": "is", "value": "P1"}}"#,
        )
        .unwrap();
        assert!(matches!(edit, Edit::UpdateNode { .. }));
    }
}
