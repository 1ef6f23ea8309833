//! Dependency-aware execution of planned calls.
//!
//! Calls run strictly one after another. Before each call, path placeholders
//! and identifier-named parameters are filled from the run's
//! [`IdentifierStore`]; after each successful call, identifier-named fields of
//! what was sent and what came back are written to the store, so a `POST /pet`
//! answering `{"id": 42}` makes the next `GET /pet/{petId}` fetch pet 42.

use crate::error::TransportError;
use crate::reporter::Reporter;
use crate::transport::{MultipartPart, PreparedRequest, RequestBody, Transport, TransportResponse};
use probe_core::{
    CallDescriptor, CallOutcome, CallRecord, ExecutorConfig, HttpMethod, IdentifierStore,
    ParamLocation, ParamValue, PlannedParam, UnresolvedPathPolicy, classify, is_identifier_name,
    render_template, scalar_text,
};
use probe_planner::positive_identifier;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

const MULTIPART: &str = "multipart/form-data";
const URLENCODED: &str = "application/x-www-form-urlencoded";

/// Runs call descriptors against the target API.
pub struct Executor {
    transport: Arc<dyn Transport>,
    config: ExecutorConfig,
    reporter: Reporter,
    rng: StdRng,
}

impl Executor {
    pub fn new(transport: Arc<dyn Transport>, config: ExecutorConfig) -> Self {
        Self {
            transport,
            config,
            reporter: Reporter::new(),
            rng: StdRng::from_os_rng(),
        }
    }

    /// Make synthesized path identifiers reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Execute every descriptor in order and return one record per call.
    ///
    /// Per-call failures become error records; nothing here aborts the batch.
    pub async fn execute(
        &mut self,
        descriptors: Vec<CallDescriptor>,
        store: &mut IdentifierStore,
    ) -> Vec<CallRecord> {
        let mut records = Vec::with_capacity(descriptors.len());
        for descriptor in descriptors {
            records.push(self.execute_one(descriptor, store).await);
        }
        records
    }

    /// Resolve, dispatch and record a single call.
    pub async fn execute_one(
        &mut self,
        mut descriptor: CallDescriptor,
        store: &mut IdentifierStore,
    ) -> CallRecord {
        let template = descriptor.path_template.clone();

        let path_values = match self.resolve_path(&descriptor, store) {
            Ok(values) => values,
            Err(name) => {
                tracing::warn!(
                    method = %descriptor.method,
                    path = %template,
                    param = %name,
                    "Skipping call with unresolved path parameter"
                );
                let url = format!("{}{}", descriptor.base_url, template);
                return self.reporter.record(
                    &descriptor,
                    &url,
                    CallOutcome::Skipped {
                        skipped: format!("unresolved path parameter {}", name),
                    },
                );
            }
        };

        apply_store(&mut descriptor.params, &path_values, &template, store);

        let url = format!(
            "{}{}",
            descriptor.base_url,
            render_template(&template, |name| {
                path_values
                    .get(name)
                    .and_then(scalar_text)
                    .map(|text| urlencoding::encode(&text).into_owned())
            })
        );

        let request = match self.prepare(&descriptor, &url).await {
            Ok(request) => request,
            Err(e) => {
                tracing::warn!(method = %descriptor.method, url = %url, error = %e, "Call could not be prepared");
                return self.reporter.record(
                    &descriptor,
                    &url,
                    CallOutcome::Error {
                        status: None,
                        error: Value::String(e.to_string()),
                    },
                );
            }
        };

        let outcome = match self.transport.send(request).await {
            Ok(response) if response.is_success() => {
                tracing::info!(method = %descriptor.method, url = %url, status = response.status, "Call succeeded");
                harvest(&descriptor, &response, store);
                CallOutcome::Response {
                    status: response.status,
                    response: response.body,
                }
            }
            Ok(response) => {
                tracing::warn!(method = %descriptor.method, url = %url, status = response.status, "Call failed");
                CallOutcome::Error {
                    status: Some(response.status),
                    error: response.body,
                }
            }
            Err(e) => {
                tracing::warn!(method = %descriptor.method, url = %url, error = %e, "Call failed without response");
                CallOutcome::Error {
                    status: None,
                    error: Value::String(e.to_string()),
                }
            }
        };

        self.reporter.record(&descriptor, &url, outcome)
    }

    /// Value for every placeholder of the path template. `Err` carries the
    /// first placeholder left unresolved under the skip policy.
    ///
    /// Declared path values come from the faker, so under the skip policy
    /// only the store counts as a source.
    fn resolve_path(
        &mut self,
        descriptor: &CallDescriptor,
        store: &IdentifierStore,
    ) -> Result<HashMap<String, Value>, String> {
        let mut values = HashMap::new();
        for name in descriptor.placeholders() {
            let stored = store.lookup(&name, &descriptor.path_template).cloned();
            let declared = || {
                descriptor
                    .path_param(&name)
                    .and_then(|p| p.value.to_json())
                    .filter(|v| scalar_text(v).is_some())
            };

            let value = match (stored, self.config.unresolved_path_policy) {
                (Some(value), _) => value,
                (None, UnresolvedPathPolicy::Skip) => return Err(name),
                (None, UnresolvedPathPolicy::Synthesize) => match declared() {
                    Some(value) => value,
                    None if is_identifier_name(&name) => Value::from(positive_identifier(&mut self.rng)),
                    None => Value::String(self.config.path_fallback_value.clone()),
                },
            };
            values.insert(name, value);
        }
        Ok(values)
    }

    async fn prepare(&self, descriptor: &CallDescriptor, url: &str) -> Result<PreparedRequest, TransportError> {
        let strip = self.config.strip_path_params;
        let mut query = Vec::new();
        let mut headers = Vec::new();
        let mut body_params: Vec<&PlannedParam> = Vec::new();

        for param in &descriptor.params {
            match param.location {
                ParamLocation::Header => {
                    if let Some(text) = param.value.as_text() {
                        headers.push((param.name.clone(), text));
                    }
                }
                ParamLocation::Path if strip => {}
                ParamLocation::Query => push_query(&mut query, param),
                _ if descriptor.method == HttpMethod::Get => push_query(&mut query, param),
                _ => body_params.push(param),
            }
        }

        let body = if body_params.is_empty() {
            RequestBody::Empty
        } else {
            encode_body(&descriptor.content_type, &body_params).await?
        };

        Ok(PreparedRequest {
            method: descriptor.method,
            url: url.to_string(),
            query,
            headers,
            body,
        })
    }
}

/// Overwrite planned values with stored identifiers: resolved path values,
/// identifier-named scalars, and identifier-named top-level fields of object
/// bodies.
fn apply_store(
    params: &mut [PlannedParam],
    path_values: &HashMap<String, Value>,
    template: &str,
    store: &IdentifierStore,
) {
    for param in params {
        if param.location == ParamLocation::Path {
            if let Some(value) = path_values.get(&param.name) {
                param.value = ParamValue::Scalar(value.clone());
            }
            continue;
        }

        match &mut param.value {
            ParamValue::Scalar(value) => {
                if let Some(stored) = store.lookup(&param.name, template) {
                    *value = stored.clone();
                }
            }
            ParamValue::Object(fields) => {
                for (field, value) in fields.iter_mut() {
                    if let Some(stored) = store.lookup(field, template) {
                        *value = stored.clone();
                    }
                }
            }
            ParamValue::Array(_) | ParamValue::Binary(_) => {}
        }
    }
}

fn push_query(query: &mut Vec<(String, String)>, param: &PlannedParam) {
    match &param.value {
        ParamValue::Array(items) => {
            for item in items {
                query.push((param.name.clone(), field_text(item)));
            }
        }
        ParamValue::Binary(file) => query.push((param.name.clone(), file.label())),
        other => query.push((param.name.clone(), other.to_json().map(|v| field_text(&v)).unwrap_or_default())),
    }
}

/// Text of a form or query field: scalars as-is, structures as JSON.
fn field_text(value: &Value) -> String {
    scalar_text(value).unwrap_or_else(|| value.to_string())
}

/// Fields to send as a form: a lone object body is spread into its fields.
fn form_fields(params: &[&PlannedParam]) -> Vec<(String, ParamValue)> {
    if let [param] = params {
        if let (ParamLocation::Body, ParamValue::Object(fields)) = (param.location, &param.value) {
            return fields
                .iter()
                .map(|(k, v)| (k.clone(), ParamValue::from(v.clone())))
                .collect();
        }
    }
    params
        .iter()
        .map(|p| (p.name.clone(), p.value.clone()))
        .collect()
}

async fn encode_body(content_type: &str, params: &[&PlannedParam]) -> Result<RequestBody, TransportError> {
    let media = content_type.to_ascii_lowercase();

    if media.starts_with(MULTIPART) {
        let mut parts = Vec::new();
        for (name, value) in form_fields(params) {
            let part = match value {
                ParamValue::Binary(file) => {
                    let bytes = tokio::fs::read(file.path()).await.map_err(|e| TransportError::File {
                        path: file.path().display().to_string(),
                        source: e,
                    })?;
                    MultipartPart::File {
                        name,
                        file_name: file.file_name(),
                        mime: mime_guess::from_path(file.path())
                            .first_or_octet_stream()
                            .to_string(),
                        bytes,
                    }
                }
                other => MultipartPart::Text {
                    name,
                    value: field_text(&other.to_report_value()),
                },
            };
            parts.push(part);
        }
        return Ok(RequestBody::Multipart(parts));
    }

    if media.starts_with(URLENCODED) {
        let fields = form_fields(params)
            .into_iter()
            .map(|(name, value)| (name, field_text(&value.to_report_value())))
            .collect();
        return Ok(RequestBody::Form(fields));
    }

    let value = match params {
        [param] if param.location == ParamLocation::Body => match &param.value {
            ParamValue::Binary(file) => {
                let bytes = tokio::fs::read(file.path()).await.map_err(|e| TransportError::File {
                    path: file.path().display().to_string(),
                    source: e,
                })?;
                return Ok(RequestBody::Bytes {
                    content_type: content_type.to_string(),
                    bytes,
                });
            }
            other => other.to_report_value(),
        },
        _ => Value::Object(
            params
                .iter()
                .map(|p| (p.name.clone(), p.value.to_report_value()))
                .collect(),
        ),
    };

    let bytes = serde_json::to_vec(&value).map_err(|e| TransportError::Body(e.to_string()))?;
    Ok(RequestBody::Bytes {
        content_type: content_type.to_string(),
        bytes,
    })
}

/// Record identifiers from a successful call. For write methods the values
/// that were sent come first, then the response's top-level fields, so the
/// server's answer wins.
fn harvest(descriptor: &CallDescriptor, response: &TransportResponse, store: &mut IdentifierStore) {
    let template = &descriptor.path_template;
    let mut record = |name: &str, value: &Value| {
        if let Some(role) = classify(name, template) {
            if store.record(role, value.clone()) {
                tracing::debug!(role = %role, field = %name, value = %value, "Captured identifier");
            }
        }
    };

    if descriptor.method.is_write() {
        for param in &descriptor.params {
            match (&param.location, &param.value) {
                (ParamLocation::Path | ParamLocation::Header, _) => {}
                (ParamLocation::Body, ParamValue::Object(fields)) => {
                    for (name, value) in fields {
                        record(name, value);
                    }
                }
                (_, ParamValue::Scalar(value)) => record(&param.name, value),
                _ => {}
            }
        }
    }

    if let Value::Object(fields) = &response.body {
        for (name, value) in fields {
            record(name, value);
        }
    }
}
