//! Normalized per-call results.

use crate::call::HttpMethod;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Outcome of one call, flattened into the record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CallOutcome {
    /// 2xx response.
    Response { status: u16, response: Value },
    /// Non-2xx response (status set) or transport failure (no status).
    Error {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        status: Option<u16>,
        error: Value,
    },
    /// The call was not dispatched.
    Skipped { skipped: String },
}

/// One result record, in declaration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallRecord {
    pub method: HttpMethod,
    pub url: String,
    /// Parameters as sent; binary values appear as `"file: <basename>"`.
    pub parameters: Map<String, Value>,
    #[serde(flatten)]
    pub outcome: CallOutcome,
}

impl CallRecord {
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, CallOutcome::Response { .. })
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self.outcome, CallOutcome::Skipped { .. })
    }

    pub fn status(&self) -> Option<u16> {
        match &self.outcome {
            CallOutcome::Response { status, .. } => Some(*status),
            CallOutcome::Error { status, .. } => *status,
            CallOutcome::Skipped { .. } => None,
        }
    }

    pub fn response(&self) -> Option<&Value> {
        match &self.outcome {
            CallOutcome::Response { response, .. } => Some(response),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&Value> {
        match &self.outcome {
            CallOutcome::Error { error, .. } => Some(error),
            _ => None,
        }
    }
}
