//! Executor configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// What to do with a path placeholder that neither the identifier store nor
/// the planned parameters can fill.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UnresolvedPathPolicy {
    /// Fill it: a fresh positive integer for identifier-like names, the
    /// literal path fallback otherwise.
    #[default]
    Synthesize,
    /// Do not dispatch the call; emit a `skipped` record instead.
    Skip,
}

/// Settings for dispatching calls.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExecutorConfig {
    #[serde(default)]
    pub unresolved_path_policy: UnresolvedPathPolicy,

    /// Keep path parameters out of the query string and body.
    #[serde(default = "default_true")]
    pub strip_path_params: bool,

    /// Literal used for unresolved, non-identifier path placeholders.
    #[serde(default = "default_path_fallback_value")]
    pub path_fallback_value: String,

    /// Per-request timeout applied by the transport.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            unresolved_path_policy: UnresolvedPathPolicy::default(),
            strip_path_params: default_true(),
            path_fallback_value: default_path_fallback_value(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ExecutorConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_true() -> bool {
    true
}

fn default_path_fallback_value() -> String {
    "1".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}
