//! CLI command implementations.

pub mod plan;
pub mod run;
pub mod serve;

use clap::Args;
use probe_core::{ConfigError, ProbeConfig, UnresolvedPathPolicy};
use std::path::Path;

/// Overrides shared by `run` and `plan`.
#[derive(Args, Debug, Default, Clone)]
pub struct RunOptions {
    /// Skip calls whose path parameters cannot be resolved instead of
    /// synthesizing a value.
    #[arg(long, default_value_t = false)]
    pub skip_unresolved: bool,

    /// Also send path parameters in the query string or body.
    #[arg(long, default_value_t = false)]
    pub keep_path_params: bool,

    /// Seed for value synthesis, for reproducible runs.
    #[arg(long)]
    pub seed: Option<u64>,
}

/// Load the configuration and apply command-line overrides.
pub fn load_config(path: Option<&Path>, options: &RunOptions) -> Result<ProbeConfig, ConfigError> {
    let mut config = ProbeConfig::load(path)?;
    apply_options(&mut config, options);
    Ok(config)
}

fn apply_options(config: &mut ProbeConfig, options: &RunOptions) {
    if options.skip_unresolved {
        config.executor.unresolved_path_policy = UnresolvedPathPolicy::Skip;
    }
    if options.keep_path_params {
        config.executor.strip_path_params = false;
    }
    if let Some(seed) = options.seed {
        config.planner.seed = Some(seed);
    }
}
