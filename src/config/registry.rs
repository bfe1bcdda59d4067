//! Registry configuration structures

use crate::error::Result;
use crate::registry::FieldDescriptor;
use serde::{Deserialize, Serialize};

/// Field registry document: `{"fields": [...]}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegistryConfig {
    #[serde(default)]
    pub fields: Vec<FieldDescriptor>,
}

impl RegistryConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
