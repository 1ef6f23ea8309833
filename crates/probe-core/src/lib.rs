//! # probe-core
//!
//! Shared model for Probe, the OpenAPI endpoint exerciser:
//!
//! - [`call`]: call descriptors and synthesized parameter values
//! - [`record`]: normalized per-call results
//! - [`identity`]: identifier roles, the role rule list and the per-run store
//! - [`config`]: configuration shared by the planner, executor and binaries

pub mod call;
pub mod config;
pub mod identity;
pub mod record;

pub use call::{
    BinaryRef, CallDescriptor, HttpMethod, ParamLocation, ParamValue, PlannedParam, placeholders,
    render_template, scalar_text,
};
pub use config::{
    ConfigError, ExecutorConfig, PlannerConfig, ProbeConfig, ServerConfig, UnresolvedPathPolicy,
};
pub use identity::{IdentifierRole, IdentifierStore, classify, is_identifier_name};
pub use record::{CallOutcome, CallRecord};
