//! # probe-planner
//!
//! Everything that happens before the first request is sent: loading and
//! dereferencing the spec, synthesizing parameter values and enumerating the
//! calls to make.
//!
//! ```text
//! location ──► SpecLoader ──► SpecDocument ──► EndpointPlanner ──► Vec<CallDescriptor>
//!                                                  │
//!                                             SchemaFaker
//! ```

pub mod deref;
pub mod error;
pub mod faker;
pub mod loader;
pub mod placeholder;
pub mod planner;

pub use error::{FakeError, SpecError};
pub use faker::{MAX_IDENTIFIER, RandomFaker, SchemaFaker, positive_identifier};
pub use loader::{SpecDocument, SpecLoader, SpecSource, parse_document};
pub use placeholder::{PLACEHOLDER_FILE_NAME, PLACEHOLDER_JPEG, ensure_placeholder};
pub use planner::{EndpointPlanner, base_url};
