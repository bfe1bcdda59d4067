//! Engine configuration structures

use crate::error::{ConditionError, Result};
use serde::{Deserialize, Serialize};

/// Default maximum group nesting depth
pub const DEFAULT_MAX_DEPTH: usize = 4;

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    /// Maximum number of nested group levels, the root group included
    pub max_depth: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl EngineConfig {
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self { max_depth }
    }

    /// Parse and check a JSON configuration document
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.check()?;
        Ok(config)
    }

    pub fn check(&self) -> Result<()> {
        if self.max_depth == 0 {
            return Err(ConditionError::InvalidConfig(
                "maxDepth must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
