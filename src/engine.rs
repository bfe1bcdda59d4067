//! Condition engine facade
//!
//! Bundles the engine configuration with the registry snapshot cache and the
//! parsed-condition cache, so callers hold one object instead of threading
//! three through every call.

use crate::condition::{
    evaluate, try_evaluate, validate, ConditionCache, ConditionNode, NodePath, Record,
    ValidationIssue,
};
use crate::config::EngineConfig;
use crate::editor::{self, Edit};
use crate::error::Result;
use crate::matcher::{self, Conditioned};
use crate::registry::{FieldRegistry, RegistryCache};
use std::sync::Arc;

/// Condition engine with cached registry and parsed conditions
#[derive(Debug)]
pub struct ConditionEngine {
    config: EngineConfig,
    registry: RegistryCache,
    conditions: ConditionCache,
}

impl ConditionEngine {
    /// Create an engine around a fixed registry
    pub fn new(config: EngineConfig, registry: FieldRegistry) -> Result<Self> {
        config.check()?;
        Ok(Self {
            config,
            registry: RegistryCache::preloaded(registry),
            conditions: ConditionCache::new(),
        })
    }

    /// Create an engine whose registry is loaded lazily through `loader`
    pub fn with_loader<F>(config: EngineConfig, loader: F) -> Result<Self>
    where
        F: Fn() -> Result<FieldRegistry> + Send + Sync + 'static,
    {
        config.check()?;
        Ok(Self {
            config,
            registry: RegistryCache::new(loader),
            conditions: ConditionCache::new(),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Current registry snapshot
    pub fn registry(&self) -> Result<Arc<FieldRegistry>> {
        self.registry.get()
    }

    /// Swap in a new registry; evaluations already running keep the old one
    pub fn refresh_registry(&self, registry: FieldRegistry) -> Arc<FieldRegistry> {
        self.registry.replace(registry)
    }

    /// Drop the registry snapshot so the next use reloads it
    pub fn invalidate_registry(&self) {
        self.registry.invalidate();
    }

    pub fn conditions(&self) -> &ConditionCache {
        &self.conditions
    }

    // ========================================================================
    // Evaluation
    // ========================================================================

    /// Evaluate a root condition against a record
    ///
    /// Only a registry that fails to load is an error; failing leaves are
    /// non-matching.
    pub fn evaluate<R: Record + ?Sized>(
        &self,
        root: Option<&ConditionNode>,
        record: &R,
    ) -> Result<bool> {
        let registry = self.registry.get()?;
        Ok(evaluate(root, record, &registry))
    }

    /// Evaluate a root condition, propagating every error
    pub fn try_evaluate<R: Record + ?Sized>(
        &self,
        root: Option<&ConditionNode>,
        record: &R,
    ) -> Result<bool> {
        let registry = self.registry.get()?;
        try_evaluate(root, record, &registry)
    }

    /// Evaluate persisted condition text, parsing it at most once
    pub fn evaluate_stored<R: Record + ?Sized>(&self, text: &str, record: &R) -> Result<bool> {
        let registry = self.registry.get()?;
        self.conditions.check(text, record, &registry)
    }

    /// First matching policy, in order
    pub fn first_match<'a, P, R>(&self, policies: &'a [P], record: &R) -> Result<Option<&'a P>>
    where
        P: Conditioned,
        R: Record + ?Sized,
    {
        let registry = self.registry.get()?;
        Ok(matcher::first_match(policies, record, &registry))
    }

    /// Every matching policy, in order
    pub fn all_matches<'a, P, R>(&self, policies: &'a [P], record: &R) -> Result<Vec<&'a P>>
    where
        P: Conditioned,
        R: Record + ?Sized,
    {
        let registry = self.registry.get()?;
        Ok(matcher::all_matches(policies, record, &registry))
    }

    // ========================================================================
    // Validation & editing
    // ========================================================================

    /// Collect every validation issue; an empty list means the tree is valid
    pub fn validate(&self, root: Option<&ConditionNode>) -> Result<Vec<ValidationIssue>> {
        let registry = self.registry.get()?;
        Ok(validate(root, &registry, &self.config).err().unwrap_or_default())
    }

    pub fn apply_edit(
        &self,
        root: Option<&ConditionNode>,
        edit: &Edit,
    ) -> Result<Option<ConditionNode>> {
        editor::apply(root, edit, &self.config)
    }

    pub fn can_add_group(&self, root: Option<&ConditionNode>, path: &NodePath) -> bool {
        editor::can_add_group(root, path, &self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::{LeafValue, Operator};
    use crate::error::ConditionError;
    use crate::registry::{FieldDescriptor, SemanticType};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn registry() -> FieldRegistry {
        FieldRegistry::new(vec![
            FieldDescriptor::enumeration("priority", "Priority", ["P1", "P2", "P3"]),
            FieldDescriptor::new("dueDate", "Due Date", SemanticType::Date),
        ])
        .unwrap()
    }

    fn engine() -> ConditionEngine {
        ConditionEngine::new(EngineConfig::default(), registry()).unwrap()
    }

    #[test]
    fn test_rejects_bad_config() {
        let err = ConditionEngine::new(EngineConfig::with_max_depth(0), registry()).unwrap_err();
        assert!(matches!(err, ConditionError::InvalidConfig(_)));
    }

    #[test]
    fn test_evaluate_and_stored() {
        let engine = engine();
        let record = json!({"priority": "P1", "dueDate": "2024-03-01"});
        let root = ConditionNode::and(vec![
            ConditionNode::leaf("priority", Operator::In, Some(LeafValue::list(["P1", "P2"]))),
            ConditionNode::leaf("dueDate", Operator::Lt, Some("2024-06-01".into())),
        ]);

        assert!(engine.evaluate(Some(&root), &record).unwrap());
        assert!(engine.evaluate(None, &record).unwrap());

        let text = serde_json::to_string(&root).unwrap();
        assert!(engine.evaluate_stored(&text, &record).unwrap());
        assert!(engine.evaluate_stored(&text, &record).unwrap());
        assert_eq!(engine.conditions().len(), 1);
    }

    #[test]
    fn test_strict_and_lenient() {
        let engine = engine();
        let root = ConditionNode::leaf("removed", Operator::Is, Some("x".into()));
        let record = json!({});

        assert!(!engine.evaluate(Some(&root), &record).unwrap());
        let err = engine.try_evaluate(Some(&root), &record).unwrap_err();
        assert_eq!(err, ConditionError::UnknownField { key: "removed".to_string() });
    }

    #[test]
    fn test_refresh_registry() {
        let engine = engine();
        let root = ConditionNode::leaf("team", Operator::Is, Some("ops".into()));
        let record = json!({"team": "ops"});
        let before = engine.registry().unwrap();

        assert!(!engine.evaluate(Some(&root), &record).unwrap());

        engine.refresh_registry(
            FieldRegistry::new(vec![FieldDescriptor::new("team", "Team", SemanticType::String)])
                .unwrap(),
        );
        assert!(engine.evaluate(Some(&root), &record).unwrap());

        // The old snapshot is still usable by whoever holds it
        assert!(before.contains("priority"));
        assert!(!before.contains("team"));

        // Invalidating falls back to the loader
        engine.invalidate_registry();
        assert!(!engine.evaluate(Some(&root), &record).unwrap());
    }

    #[test]
    fn test_with_loader() {
        let loads = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&loads);
        let engine = ConditionEngine::with_loader(EngineConfig::default(), move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(registry())
        })
        .unwrap();

        assert_eq!(loads.load(Ordering::SeqCst), 0);
        engine.evaluate(None, &json!({})).unwrap();
        engine.evaluate(None, &json!({})).unwrap();
        assert_eq!(loads.load(Ordering::SeqCst), 1);

        engine.invalidate_registry();
        engine.registry().unwrap();
        assert_eq!(loads.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_loader_failure_surfaces() {
        let engine = ConditionEngine::with_loader(EngineConfig::default(), || {
            Err(ConditionError::InvalidRegistry("source offline".to_string()))
        })
        .unwrap();

        assert!(engine.evaluate(None, &json!({})).is_err());
        assert!(engine.validate(None).is_err());
    }

    #[test]
    fn test_validate() {
        let engine = engine();
        let root = ConditionNode::and(vec![
            ConditionNode::leaf("priority", Operator::Contains, Some("P".into())),
            ConditionNode::leaf("dueDate", Operator::Gt, Some("2024-01-01".into())),
        ]);

        let issues = engine.validate(Some(&root)).unwrap();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].path, NodePath::from([0]));

        let valid = ConditionNode::leaf("priority", Operator::Is, Some("P1".into()));
        assert!(engine.validate(Some(&valid)).unwrap().is_empty());
    }

    #[test]
    fn test_edit_through_engine() {
        let engine = ConditionEngine::new(EngineConfig::with_max_depth(2), registry()).unwrap();

        let root = engine
            .apply_edit(None, &Edit::AddGroup { path: NodePath::root() })
            .unwrap();
        assert!(!engine.can_add_group(root.as_ref(), &NodePath::from([0])));
        assert!(engine.can_add_group(root.as_ref(), &NodePath::root()));

        let err = engine
            .apply_edit(root.as_ref(), &Edit::AddGroup { path: NodePath::from([0]) })
            .unwrap_err();
        assert_eq!(err, ConditionError::MaxDepthExceeded { max_depth: 2 });
    }

    #[test]
    fn test_policy_matching() {
        let engine = engine();
        let policies = vec![
            Some(ConditionNode::leaf("priority", Operator::Is, Some("P1".into()))),
            None,
        ];

        let record = json!({"priority": "P2"});
        assert_eq!(engine.first_match(&policies, &record).unwrap(), Some(&None));
        assert_eq!(engine.all_matches(&policies, &record).unwrap().len(), 1);
    }
}
