//! # probe-runtime
//!
//! Executes planned calls against the target API in declaration order,
//! carrying identifiers from earlier responses into later requests, and
//! normalizes what happened into [`probe_core::CallRecord`]s.

pub mod error;
pub mod executor;
pub mod reporter;
pub mod run;
pub mod transport;

pub use error::{RunError, TransportError};
pub use executor::Executor;
pub use probe_planner::SpecSource;
pub use reporter::{Reporter, RunSummary};
pub use run::{plan_spec, run_spec};
pub use transport::{
    HttpTransport, MultipartPart, PreparedRequest, RequestBody, Transport, TransportResponse,
};
