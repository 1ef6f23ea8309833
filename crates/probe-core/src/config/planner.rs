//! Planner configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Settings that shape how call descriptors are synthesized.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlannerConfig {
    /// Scheme used when a Swagger 2 document declares no `schemes`.
    #[serde(default = "default_scheme")]
    pub default_scheme: String,

    /// Content type used when neither the operation nor the document declares one.
    #[serde(default = "default_content_type")]
    pub default_content_type: String,

    /// Literal used for parameters that cannot be synthesized.
    #[serde(default = "default_fallback_value")]
    pub fallback_value: String,

    /// Directory holding the binary placeholder file.
    /// Defaults to `<system temp>/probe`.
    #[serde(default)]
    pub placeholder_dir: Option<PathBuf>,

    /// Seed for value synthesis. Unset means a fresh random seed per run.
    #[serde(default)]
    pub seed: Option<u64>,

    /// Maximum schema nesting followed by the faker.
    #[serde(default = "default_max_schema_depth")]
    pub max_schema_depth: usize,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            default_scheme: default_scheme(),
            default_content_type: default_content_type(),
            fallback_value: default_fallback_value(),
            placeholder_dir: None,
            seed: None,
            max_schema_depth: default_max_schema_depth(),
        }
    }
}

impl PlannerConfig {
    /// Directory of the binary placeholder, with the default applied.
    pub fn placeholder_dir(&self) -> PathBuf {
        self.placeholder_dir
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("probe"))
    }
}

fn default_scheme() -> String {
    "https".to_string()
}

fn default_content_type() -> String {
    "application/json".to_string()
}

fn default_fallback_value() -> String {
    "dummy".to_string()
}

fn default_max_schema_depth() -> usize {
    8
}
