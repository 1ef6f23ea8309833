//! `probe plan <spec>` - print the call descriptors without executing them.

use super::{RunOptions, load_config};
use std::path::Path;

pub async fn run(spec: &str, config_path: Option<&Path>, options: &RunOptions) -> anyhow::Result<()> {
    let config = load_config(config_path, options)?;
    let descriptors = probe_runtime::plan_spec(spec, &config).await?;

    println!("{}", serde_json::to_string_pretty(&descriptors)?);
    tracing::info!(calls = descriptors.len(), "Plan printed");
    Ok(())
}
