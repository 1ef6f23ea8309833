//! Endpoint planning: turn a dereferenced spec into call descriptors.
//!
//! One [`CallDescriptor`] is produced per supported (path, method) pair, in
//! document order. Parameter values come from the [`SchemaFaker`]; file
//! parameters point at the shared binary placeholder.

use crate::faker::{RandomFaker, SchemaFaker};
use crate::loader::SpecDocument;
use crate::placeholder::ensure_placeholder;
use probe_core::{
    BinaryRef, CallDescriptor, HttpMethod, IdentifierStore, ParamLocation, ParamValue,
    PlannedParam, PlannerConfig, render_template, scalar_text,
};
use serde_json::{Map, Value};

const MULTIPART: &str = "multipart/form-data";
const URLENCODED: &str = "application/x-www-form-urlencoded";

/// Builds call descriptors for every supported operation of a spec.
pub struct EndpointPlanner {
    config: PlannerConfig,
    faker: Box<dyn SchemaFaker>,
    placeholder: Option<BinaryRef>,
}

impl EndpointPlanner {
    pub fn new(config: PlannerConfig, faker: Box<dyn SchemaFaker>) -> Self {
        Self {
            config,
            faker,
            placeholder: None,
        }
    }

    /// Planner backed by a [`RandomFaker`] seeded from the configuration.
    pub fn from_config(config: PlannerConfig) -> Self {
        let faker = RandomFaker::from_config(&config);
        Self::new(config, Box::new(faker))
    }

    /// Plan one call per supported (path, method) pair, in declaration order.
    ///
    /// Path placeholders are rendered from `store` when it holds a value for
    /// the placeholder's role, then from the declared path parameter. Anything
    /// else stays as `{name}` for the executor to resolve.
    pub fn plan(&mut self, doc: &SpecDocument, store: &IdentifierStore) -> Vec<CallDescriptor> {
        let Some(paths) = doc.paths() else {
            return Vec::new();
        };

        let base_url = base_url(doc, &self.config);
        let doc_consumes = first_str(doc.root.get("consumes"));
        let empty = Map::new();

        let mut descriptors = Vec::new();
        for (path, item) in paths {
            let Some(item) = item.as_object() else {
                continue;
            };
            let shared = item.get("parameters").and_then(Value::as_array);

            for (key, operation) in item {
                let Some(method) = HttpMethod::from_spec_key(key) else {
                    continue;
                };
                let operation = operation.as_object().unwrap_or(&empty);

                let descriptor = self.plan_operation(
                    method,
                    path,
                    operation,
                    shared,
                    &base_url,
                    doc_consumes.as_deref(),
                    store,
                );
                tracing::debug!(
                    method = %descriptor.method,
                    url = %descriptor.url,
                    params = descriptor.params.len(),
                    content_type = %descriptor.content_type,
                    "Planned call"
                );
                descriptors.push(descriptor);
            }
        }

        descriptors
    }

    #[allow(clippy::too_many_arguments)]
    fn plan_operation(
        &mut self,
        method: HttpMethod,
        path: &str,
        operation: &Map<String, Value>,
        shared: Option<&Vec<Value>>,
        base_url: &str,
        doc_consumes: Option<&str>,
        store: &IdentifierStore,
    ) -> CallDescriptor {
        let mut params = Vec::new();
        for param in merge_parameters(shared, operation.get("parameters").and_then(Value::as_array)) {
            let Some(name) = param.get("name").and_then(Value::as_str) else {
                continue;
            };
            let location = ParamLocation::from_spec(
                param.get("in").and_then(Value::as_str).unwrap_or("query"),
            );
            let value = self.parameter_value(name, param);
            params.push(PlannedParam::new(name, location, value));
        }

        let body_media = self.plan_request_body(operation.get("requestBody"), &mut params);

        let content_type = first_str(operation.get("consumes"))
            .or_else(|| doc_consumes.map(str::to_string))
            .or(body_media)
            .unwrap_or_else(|| self.config.default_content_type.clone());

        let url = format!("{}{}", base_url, render_path(path, &params, store));

        CallDescriptor {
            method,
            base_url: base_url.to_string(),
            path_template: path.to_string(),
            url,
            params,
            content_type,
            operation_id: operation
                .get("operationId")
                .and_then(Value::as_str)
                .map(str::to_string),
        }
    }

    /// Expand an OpenAPI 3 `requestBody` into parameters. Returns the media
    /// type that was used.
    fn plan_request_body(
        &mut self,
        request_body: Option<&Value>,
        params: &mut Vec<PlannedParam>,
    ) -> Option<String> {
        let content = request_body?.get("content")?.as_object()?;
        let (media, media_obj) = content.iter().next()?;
        let schema = media_obj.get("schema");

        let is_form = media.starts_with(MULTIPART) || media.starts_with(URLENCODED);
        let properties = schema
            .and_then(|s| s.get("properties"))
            .and_then(Value::as_object);

        match (is_form, properties) {
            (true, Some(properties)) => {
                for (name, prop) in properties {
                    let value = self.schema_value(name, prop);
                    params.push(PlannedParam::new(name, ParamLocation::FormData, value));
                }
            }
            _ => {
                let value = match schema {
                    Some(schema) => self.schema_value("body", schema),
                    None => self.fallback(),
                };
                params.push(PlannedParam::new("body", ParamLocation::Body, value));
            }
        }

        Some(media.clone())
    }

    fn parameter_value(&mut self, name: &str, param: &Value) -> ParamValue {
        if let Some(schema) = param.get("schema") {
            return self.schema_value(name, schema);
        }

        let Some(ty) = param.get("type").and_then(Value::as_str) else {
            return self.fallback();
        };
        let format = param.get("format").and_then(Value::as_str);
        if ty == "file" || format == Some("binary") {
            return self.binary();
        }

        let mut schema = Map::new();
        for key in ["type", "format", "enum", "items"] {
            if let Some(v) = param.get(key) {
                schema.insert(key.to_string(), v.clone());
            }
        }
        self.fake(name, &Value::Object(schema))
    }

    fn schema_value(&mut self, name: &str, schema: &Value) -> ParamValue {
        if is_binary_schema(schema) {
            return self.binary();
        }
        self.fake(name, schema)
    }

    fn fake(&mut self, name: &str, schema: &Value) -> ParamValue {
        match self.faker.fake(schema, Some(name)) {
            Ok(value) => ParamValue::from(value),
            Err(e) => {
                tracing::warn!(param = %name, error = %e, "Falling back to literal value");
                self.fallback()
            }
        }
    }

    fn binary(&mut self) -> ParamValue {
        if let Some(file) = &self.placeholder {
            return ParamValue::Binary(file.clone());
        }

        let dir = self.config.placeholder_dir();
        match ensure_placeholder(&dir) {
            Ok(file) => {
                self.placeholder = Some(file.clone());
                ParamValue::Binary(file)
            }
            Err(e) => {
                tracing::warn!(dir = %dir.display(), error = %e, "Cannot create binary placeholder");
                self.fallback()
            }
        }
    }

    fn fallback(&self) -> ParamValue {
        ParamValue::Scalar(Value::String(self.config.fallback_value.clone()))
    }
}

/// Base URL of the API described by `doc`, without a trailing slash.
///
/// OpenAPI 3 `servers[0].url` (variables replaced by their defaults, relative
/// URLs joined to the document location) wins; otherwise the Swagger 2
/// `schemes`/`host`/`basePath` triple is used.
pub fn base_url(doc: &SpecDocument, config: &PlannerConfig) -> String {
    let root = &doc.root;

    if let Some(server) = root
        .get("servers")
        .and_then(Value::as_array)
        .and_then(|s| s.first())
    {
        if let Some(raw) = server.get("url").and_then(Value::as_str) {
            let variables = server.get("variables").and_then(Value::as_object);
            let url = render_template(raw, |name| {
                variables
                    .and_then(|v| v.get(name))
                    .and_then(|v| v.get("default"))
                    .and_then(scalar_text)
            });

            let absolute = if url.starts_with("http://") || url.starts_with("https://") {
                url
            } else if let Some(source) = doc.source.url() {
                source
                    .join(&url)
                    .map(|u| u.to_string())
                    .unwrap_or(url)
            } else {
                url
            };
            return absolute.trim_end_matches('/').to_string();
        }
    }

    let scheme = first_str(root.get("schemes")).unwrap_or_else(|| config.default_scheme.clone());
    let host = root
        .get("host")
        .and_then(Value::as_str)
        .map(str::to_string)
        .or_else(|| {
            let source = doc.source.url()?;
            let host = source.host_str()?;
            Some(match source.port() {
                Some(port) => format!("{}:{}", host, port),
                None => host.to_string(),
            })
        })
        .unwrap_or_else(|| {
            tracing::warn!("Spec declares no host, using localhost");
            "localhost".to_string()
        });
    let base_path = root.get("basePath").and_then(Value::as_str).unwrap_or("");

    format!("{}://{}{}", scheme, host, base_path)
        .trim_end_matches('/')
        .to_string()
}

/// Path-item parameters followed by operation parameters; an operation
/// parameter replaces a path-item one with the same `name` and `in`.
fn merge_parameters<'a>(shared: Option<&'a Vec<Value>>, own: Option<&'a Vec<Value>>) -> Vec<&'a Value> {
    let mut merged: Vec<&Value> = shared.map(|s| s.iter().collect()).unwrap_or_default();

    for param in own.into_iter().flatten() {
        let key = param_key(param);
        match merged.iter().position(|p| param_key(p) == key) {
            Some(index) => merged[index] = param,
            None => merged.push(param),
        }
    }
    merged
}

fn param_key(param: &Value) -> (Option<&str>, Option<&str>) {
    (
        param.get("name").and_then(Value::as_str),
        param.get("in").and_then(Value::as_str),
    )
}

fn render_path(template: &str, params: &[PlannedParam], store: &IdentifierStore) -> String {
    render_template(template, |name| {
        let text = store.lookup(name, template).and_then(scalar_text).or_else(|| {
            params
                .iter()
                .find(|p| p.location == ParamLocation::Path && p.name == name)
                .and_then(|p| p.value.as_text())
        })?;
        Some(urlencoding::encode(&text).into_owned())
    })
}

fn is_binary_schema(schema: &Value) -> bool {
    schema.get("type").and_then(Value::as_str) == Some("file")
        || schema.get("format").and_then(Value::as_str) == Some("binary")
}

fn first_str(value: Option<&Value>) -> Option<String> {
    value?.as_array()?.first()?.as_str().map(str::to_string)
}
