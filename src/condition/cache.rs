//! Parsed condition cache
//!
//! Policies are stored with their condition as JSON text and the same text
//! is evaluated over and over. The cache keeps the parsed tree per text.
//! Keys are meant to be persisted policy texts; the map is bounded and is
//! emptied when full, so ad hoc texts cannot grow it without limit.

use crate::condition::ast::ConditionNode;
use crate::condition::evaluator::evaluate;
use crate::condition::parser;
use crate::condition::record::Record;
use crate::error::Result;
use crate::registry::FieldRegistry;
use ahash::AHashMap;
use parking_lot::RwLock;
use std::sync::Arc;

/// Default number of cached condition texts
pub const DEFAULT_CONDITION_CACHE_CAPACITY: usize = 1024;

/// Parsed root condition shared between cache readers
pub type CachedCondition = Option<Arc<ConditionNode>>;

/// Cache from stored condition text to parsed tree
#[derive(Debug)]
pub struct ConditionCache {
    entries: RwLock<AHashMap<String, CachedCondition>>,
    capacity: usize,
}

impl Default for ConditionCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ConditionCache {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CONDITION_CACHE_CAPACITY)
    }

    /// Cache holding at most `capacity` texts (at least one)
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: RwLock::new(AHashMap::with_capacity(capacity.min(256))),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Get or parse a stored condition
    pub fn get_or_parse(&self, text: &str) -> Result<CachedCondition> {
        // Fast path: check read lock first
        {
            let entries = self.entries.read();
            if let Some(root) = entries.get(text) {
                return Ok(root.clone());
            }
        }

        // Slow path: parse and cache; parse failures are not cached
        let root = parser::parse(text)?.map(Arc::new);
        log::debug!("condition cache miss, {} entries", self.len() + 1);

        let mut entries = self.entries.write();
        if entries.len() >= self.capacity && !entries.contains_key(text) {
            log::debug!("condition cache full at {} entries, clearing", entries.len());
            entries.clear();
        }
        entries.insert(text.to_string(), root.clone());
        Ok(root)
    }

    /// Evaluate stored condition text against a record
    ///
    /// Parse errors propagate; evaluation errors follow `evaluate`.
    pub fn check<R: Record + ?Sized>(
        &self,
        text: &str,
        record: &R,
        registry: &FieldRegistry,
    ) -> Result<bool> {
        let root = self.get_or_parse(text)?;
        Ok(evaluate(root.as_deref(), record, registry))
    }

    /// Drop one entry
    pub fn invalidate(&self, text: &str) {
        self.entries.write().remove(text);
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::FieldDescriptor;
    use serde_json::json;

    const PRIORITY_P1: &str = r#"{"field": "priority", "operator": "is", "value": "P1"}"#;

    fn registry() -> FieldRegistry {
        FieldRegistry::new(vec![FieldDescriptor::enumeration(
            "priority",
            "Priority",
            ["P1", "P2"],
        )])
        .unwrap()
    }

    #[test]
    fn test_cache_hit() {
        let cache = ConditionCache::new();
        let registry = registry();
        let record = json!({"priority": "P1"});

        // First call - cache miss
        assert!(cache.check(PRIORITY_P1, &record, &registry).unwrap());
        assert_eq!(cache.len(), 1);

        // Second call - cache hit, same shared tree
        assert!(cache.check(PRIORITY_P1, &record, &registry).unwrap());
        assert_eq!(cache.len(), 1);

        let first = cache.get_or_parse(PRIORITY_P1).unwrap().unwrap();
        let second = cache.get_or_parse(PRIORITY_P1).unwrap().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_blank_condition_matches() {
        let cache = ConditionCache::new();
        assert!(cache.check("", &json!({}), &registry()).unwrap());
        assert_eq!(cache.get_or_parse("null").unwrap(), None);
    }

    #[test]
    fn test_parse_error_not_cached() {
        let cache = ConditionCache::new();
        assert!(cache.check("{oops", &json!({}), &registry()).is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_capacity_bound() {
        let cache = ConditionCache::with_capacity(2);
        assert_eq!(cache.capacity(), 2);

        for value in ["P1", "P2", "P3", "P4", "P5"] {
            let text = format!(r#"{{"field": "priority", "operator": "is", "value": "{}"}}"#, value);
            cache.get_or_parse(&text).unwrap();
            assert!(cache.len() <= 2);
        }

        // Re-reading a cached text never evicts
        let cache = ConditionCache::with_capacity(1);
        cache.get_or_parse(PRIORITY_P1).unwrap();
        cache.get_or_parse(PRIORITY_P1).unwrap();
        assert_eq!(cache.len(), 1);
        assert_eq!(ConditionCache::with_capacity(0).capacity(), 1);
        assert_eq!(ConditionCache::default().capacity(), DEFAULT_CONDITION_CACHE_CAPACITY);
    }

    #[test]
    fn test_invalidate_and_clear() {
        let cache = ConditionCache::new();
        cache.get_or_parse(PRIORITY_P1).unwrap();
        cache.get_or_parse("null").unwrap();
        assert_eq!(cache.len(), 2);

        cache.invalidate(PRIORITY_P1);
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert!(cache.is_empty());
    }
}
