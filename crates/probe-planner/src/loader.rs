//! Spec loading: fetch, parse and dereference an OpenAPI/Swagger document.

use crate::deref::{Dereferencer, LoadedDocument, external_references};
use crate::error::SpecError;
use serde_json::{Map, Number, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use url::Url;

/// Upper bound on external documents pulled in through `$ref`.
const MAX_EXTERNAL_DOCUMENTS: usize = 32;

/// Where a document lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecSource {
    Url(Url),
    File(PathBuf),
}

impl SpecSource {
    /// Interpret a user-supplied location: `http(s)://` URLs, `file://` URLs
    /// or plain filesystem paths.
    pub fn parse(location: &str) -> Result<Self, SpecError> {
        let location = location.trim();
        if location.is_empty() {
            return Err(SpecError::InvalidLocation {
                location: location.to_string(),
                reason: "empty location".to_string(),
            });
        }

        if location.starts_with("http://") || location.starts_with("https://") {
            return Url::parse(location)
                .map(SpecSource::Url)
                .map_err(|e| SpecError::InvalidLocation {
                    location: location.to_string(),
                    reason: e.to_string(),
                });
        }

        if location.starts_with("file://") {
            let url = Url::parse(location).map_err(|e| SpecError::InvalidLocation {
                location: location.to_string(),
                reason: e.to_string(),
            })?;
            return url
                .to_file_path()
                .map(SpecSource::File)
                .map_err(|_| SpecError::InvalidLocation {
                    location: location.to_string(),
                    reason: "not a local file URL".to_string(),
                });
        }

        Ok(SpecSource::File(PathBuf::from(location)))
    }

    /// Stable identity used to cache documents and detect cycles.
    pub fn key(&self) -> String {
        match self {
            SpecSource::Url(url) => {
                let mut url = url.clone();
                url.set_fragment(None);
                url.to_string()
            }
            SpecSource::File(path) => path.display().to_string(),
        }
    }

    /// Resolve a reference's document part relative to this source.
    pub fn join(&self, reference: &str) -> Result<SpecSource, SpecError> {
        if reference.starts_with("http://") || reference.starts_with("https://") {
            return SpecSource::parse(reference);
        }
        match self {
            SpecSource::Url(base) => base
                .join(reference)
                .map(SpecSource::Url)
                .map_err(|e| SpecError::InvalidLocation {
                    location: reference.to_string(),
                    reason: e.to_string(),
                }),
            SpecSource::File(path) => {
                let base = path.parent().unwrap_or_else(|| Path::new("."));
                Ok(SpecSource::File(base.join(reference)))
            }
        }
    }

    /// The URL of the document, when it was fetched over HTTP.
    pub fn url(&self) -> Option<&Url> {
        match self {
            SpecSource::Url(url) => Some(url),
            SpecSource::File(_) => None,
        }
    }
}

/// A fully dereferenced spec and its origin.
#[derive(Debug, Clone)]
pub struct SpecDocument {
    pub root: Value,
    pub source: SpecSource,
}

impl SpecDocument {
    /// Build a document from an already-dereferenced value.
    pub fn new(root: Value, source: SpecSource) -> Self {
        Self { root, source }
    }

    pub fn paths(&self) -> Option<&Map<String, Value>> {
        self.root.get("paths").and_then(Value::as_object)
    }
}

/// Fetches documents over HTTP or from disk and dereferences them.
#[derive(Clone, Default)]
pub struct SpecLoader {
    client: reqwest::Client,
}

impl SpecLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use an existing HTTP client (shares its timeout and connection pool).
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Load and fully dereference the spec at `location`.
    pub async fn load(&self, location: &str) -> Result<SpecDocument, SpecError> {
        let source = SpecSource::parse(location)?;
        let root_key = source.key();

        let mut documents = HashMap::new();
        let mut pending = vec![source.clone()];

        while let Some(next) = pending.pop() {
            let key = next.key();
            if documents.contains_key(&key) {
                continue;
            }
            if documents.len() >= MAX_EXTERNAL_DOCUMENTS {
                tracing::warn!(document = %key, "Too many external documents, not following further references");
                break;
            }

            let value = self.fetch(&next).await?;
            let mut refs = Vec::new();
            external_references(&value, &mut refs);
            for reference in refs {
                let target = next.join(&reference)?;
                if !documents.contains_key(&target.key()) {
                    pending.push(target);
                }
            }
            documents.insert(key, LoadedDocument { source: next, value });
        }

        let root = Dereferencer::new(&documents).dereference(&root_key)?;
        if root.get("paths").and_then(Value::as_object).is_none() {
            return Err(SpecError::MissingPaths(root_key));
        }

        tracing::debug!(
            spec = %root_key,
            documents = documents.len(),
            "Spec loaded and dereferenced"
        );

        Ok(SpecDocument { root, source })
    }

    async fn fetch(&self, source: &SpecSource) -> Result<Value, SpecError> {
        let location = source.key();
        let text = match source {
            SpecSource::Url(url) => {
                let response = self
                    .client
                    .get(url.clone())
                    .send()
                    .await
                    .map_err(|e| SpecError::Fetch {
                        url: location.clone(),
                        source: e,
                    })?;

                let status = response.status();
                if !status.is_success() {
                    return Err(SpecError::Status {
                        url: location,
                        status: status.as_u16(),
                    });
                }

                response.text().await.map_err(|e| SpecError::Fetch {
                    url: location.clone(),
                    source: e,
                })?
            }
            SpecSource::File(path) => {
                tokio::fs::read_to_string(path)
                    .await
                    .map_err(|e| SpecError::Read {
                        path: location.clone(),
                        source: e,
                    })?
            }
        };

        parse_document(&text, &location)
    }
}

/// Parse a document as JSON, falling back to YAML. The root must be an object.
pub fn parse_document(text: &str, location: &str) -> Result<Value, SpecError> {
    let value = match serde_json::from_str::<Value>(text) {
        Ok(value) => value,
        Err(json_err) => match serde_yaml::from_str::<serde_yaml::Value>(text) {
            Ok(yaml) => yaml_to_json(yaml),
            Err(yaml_err) => {
                return Err(SpecError::Parse {
                    location: location.to_string(),
                    reason: format!("JSON: {}; YAML: {}", json_err, yaml_err),
                });
            }
        },
    };

    if !value.is_object() {
        return Err(SpecError::Parse {
            location: location.to_string(),
            reason: "document root is not an object".to_string(),
        });
    }
    Ok(value)
}

/// Convert YAML to JSON, stringifying non-string mapping keys (`200:` in
/// `responses`).
fn yaml_to_json(value: serde_yaml::Value) -> Value {
    match value {
        serde_yaml::Value::Null => Value::Null,
        serde_yaml::Value::Bool(b) => Value::Bool(b),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Number(i.into())
            } else if let Some(u) = n.as_u64() {
                Value::Number(u.into())
            } else {
                n.as_f64()
                    .and_then(Number::from_f64)
                    .map(Value::Number)
                    .unwrap_or(Value::Null)
            }
        }
        serde_yaml::Value::String(s) => Value::String(s),
        serde_yaml::Value::Sequence(items) => {
            Value::Array(items.into_iter().map(yaml_to_json).collect())
        }
        serde_yaml::Value::Mapping(mapping) => {
            let mut map = Map::with_capacity(mapping.len());
            for (k, v) in mapping {
                map.insert(yaml_key(k), yaml_to_json(v));
            }
            Value::Object(map)
        }
        serde_yaml::Value::Tagged(tagged) => yaml_to_json(tagged.value),
    }
}

fn yaml_key(key: serde_yaml::Value) -> String {
    match key {
        serde_yaml::Value::String(s) => s,
        serde_yaml::Value::Number(n) => n.to_string(),
        serde_yaml::Value::Bool(b) => b.to_string(),
        serde_yaml::Value::Null => "null".to_string(),
        other => serde_yaml::to_string(&other)
            .map(|s| s.trim().to_string())
            .unwrap_or_default(),
    }
}
