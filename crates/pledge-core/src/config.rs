//! Queue configuration.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Settings shared by the task queue implementations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Name attached to the queue's log events.
    pub label: String,

    /// Upper bound on jobs run by a single `ManualQueue::run_until_idle`.
    pub max_steps: usize,
}

/// ConfigError is returned when a configuration cannot be loaded.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid queue config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("max_steps must be greater than zero")]
    ZeroSteps,
}

impl QueueConfig {
    /// Default settings: label `default`, 100 000 steps per drain.
    pub fn default_v1() -> Self {
        Self {
            label: "default".to_string(),
            max_steps: 100_000,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Parse a JSON document. Missing fields take their default values.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        if config.max_steps == 0 {
            return Err(ConfigError::ZeroSteps);
        }
        Ok(config)
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self::default_v1()
    }
}
