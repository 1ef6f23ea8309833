//! One end-to-end run: load, plan, execute, report.

use crate::error::RunError;
use crate::executor::Executor;
use crate::reporter::RunSummary;
use crate::transport::HttpTransport;
use probe_core::{CallDescriptor, CallRecord, IdentifierStore, ProbeConfig};
use probe_planner::{EndpointPlanner, SpecLoader};
use std::sync::Arc;

/// Load the spec at `location` and plan its calls without executing them.
pub async fn plan_spec(location: &str, config: &ProbeConfig) -> Result<Vec<CallDescriptor>, RunError> {
    let transport = HttpTransport::new(config.executor.timeout())?;
    let loader = SpecLoader::with_client(transport.client().clone());
    let doc = loader.load(location).await?;

    let mut planner = EndpointPlanner::from_config(config.planner.clone());
    Ok(planner.plan(&doc, &IdentifierStore::new()))
}

/// Exercise every operation of the spec at `location`.
///
/// A spec that cannot be fetched or dereferenced fails the whole run with no
/// records. Everything after that produces one record per operation, in
/// declaration order.
pub async fn run_spec(location: &str, config: &ProbeConfig) -> Result<Vec<CallRecord>, RunError> {
    let transport = HttpTransport::new(config.executor.timeout())?;
    let loader = SpecLoader::with_client(transport.client().clone());

    let doc = loader.load(location).await.inspect_err(|e| {
        tracing::error!(spec = %location, error = %e, "Failed to load spec");
    })?;

    let mut store = IdentifierStore::new();
    let mut planner = EndpointPlanner::from_config(config.planner.clone());
    let descriptors = planner.plan(&doc, &store);
    tracing::info!(spec = %location, calls = descriptors.len(), "Spec planned");

    let mut executor = Executor::new(Arc::new(transport), config.executor.clone());
    if let Some(seed) = config.planner.seed {
        executor = executor.with_seed(seed);
    }
    let records = executor.execute(descriptors, &mut store).await;

    let summary = RunSummary::from_records(&records);
    tracing::info!(
        spec = %location,
        total = summary.total,
        succeeded = summary.succeeded,
        failed = summary.failed,
        skipped = summary.skipped,
        "Run finished"
    );

    Ok(records)
}
