//! Persisted condition parsing
//!
//! Stored conditions are JSON. Blank text and `null` mean "no condition"
//! (match every record). A bare leaf at the root is wrapped in an AND group.

use crate::condition::ast::{ConditionNode, Connective};
use crate::error::Result;
use serde::Deserialize;
use serde_json::Value;

/// Parse stored condition text into a normalized root
pub fn parse(text: &str) -> Result<Option<ConditionNode>> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }

    let root: Option<ConditionNode> = serde_json::from_str(text)?;
    Ok(normalize_root(root))
}

/// Read a root condition out of an already decoded JSON value
pub fn from_value(value: &Value) -> Result<Option<ConditionNode>> {
    let root = Option::<ConditionNode>::deserialize(value)?;
    Ok(normalize_root(root))
}

/// Serialize a root condition; `None` becomes `null`
pub fn to_json(root: Option<&ConditionNode>) -> Result<String> {
    Ok(serde_json::to_string(&root)?)
}

/// Wrap a bare leaf root in a one-child AND group
pub fn normalize_root(root: Option<ConditionNode>) -> Option<ConditionNode> {
    match root {
        Some(leaf @ ConditionNode::Leaf(_)) => {
            Some(ConditionNode::group(Connective::And, vec![leaf]))
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::operator::Operator;
    use crate::error::ConditionError;
    use serde_json::json;

    #[test]
    fn test_blank_and_null() {
        assert_eq!(parse("").unwrap(), None);
        assert_eq!(parse("   ").unwrap(), None);
        assert_eq!(parse("null").unwrap(), None);
        assert_eq!(from_value(&json!(null)).unwrap(), None);
    }

    #[test]
    fn test_bare_leaf_is_wrapped() {
        let root = parse(r#"{"field": "priority", "operator": "is", "value": "P1"}"#).unwrap();
        assert_eq!(
            root,
            Some(ConditionNode::and(vec![ConditionNode::leaf(
                "priority",
                Operator::Is,
                Some("P1".into())
            )]))
        );
    }

    #[test]
    fn test_group_kept() {
        let value = json!({"connective": "OR", "children": [
            {"field": "priority", "operator": "in", "value": ["P1", "P2"]}
        ]});
        let root = from_value(&value).unwrap().unwrap();
        assert_eq!(root.as_group().unwrap().connective, Connective::Or);
        let written: Value = serde_json::from_str(&to_json(Some(&root)).unwrap()).unwrap();
        assert_eq!(written, value);
    }

    #[test]
    fn test_to_json_null() {
        assert_eq!(to_json(None).unwrap(), "null");
    }

    #[test]
    fn test_malformed() {
        assert!(matches!(parse("{"), Err(ConditionError::Deserialization(_))));
        assert!(parse(r#"{"field": "a"}"#).is_err());
        assert!(parse("[1, 2]").is_err());
    }
}
