//! Field registry lookups

use crate::config::RegistryConfig;
use crate::error::{ConditionError, Result};
use crate::registry::field::FieldDescriptor;
use ahash::AHashMap;

/// Read-only mapping from field key to descriptor, in declaration order
#[derive(Debug, Clone, Default)]
pub struct FieldRegistry {
    fields: Vec<FieldDescriptor>,
    index: AHashMap<String, usize>,
}

impl FieldRegistry {
    /// Build a registry, checking every descriptor and rejecting duplicate keys
    pub fn new(fields: Vec<FieldDescriptor>) -> Result<Self> {
        let mut index = AHashMap::with_capacity(fields.len());
        let mut normalized = Vec::with_capacity(fields.len());

        for field in fields {
            let field = field.normalized()?;
            if index.contains_key(&field.key) {
                return Err(ConditionError::InvalidRegistry(format!(
                    "duplicate field key `{}`",
                    field.key
                )));
            }
            index.insert(field.key.clone(), normalized.len());
            normalized.push(field);
        }

        Ok(Self {
            fields: normalized,
            index,
        })
    }

    pub fn from_config(config: RegistryConfig) -> Result<Self> {
        Self::new(config.fields)
    }

    /// Parse a `{"fields": [...]}` document
    pub fn from_json_str(json: &str) -> Result<Self> {
        Self::from_config(RegistryConfig::from_json_str(json)?)
    }

    /// Look up a field, failing with `UnknownField`
    pub fn get(&self, key: &str) -> Result<&FieldDescriptor> {
        self.lookup(key).ok_or_else(|| ConditionError::UnknownField {
            key: key.to_string(),
        })
    }

    #[inline]
    pub fn lookup(&self, key: &str) -> Option<&FieldDescriptor> {
        self.index.get(key).map(|&i| &self.fields[i])
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// All descriptors in declaration order
    pub fn all(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
