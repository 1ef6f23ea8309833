//! Call descriptors: the planned, not-yet-executed form of one HTTP call.
//!
//! The planner builds one [`CallDescriptor`] per supported (path, method)
//! pair; the executor consumes each descriptor exactly once.

use regex::Regex;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([^}/]+)\}").expect("placeholder pattern is valid"));

/// HTTP methods the planner enumerates. Anything else in a spec is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
}

impl HttpMethod {
    /// All supported methods, in the order they are usually declared.
    pub const ALL: [HttpMethod; 5] = [
        HttpMethod::Get,
        HttpMethod::Post,
        HttpMethod::Put,
        HttpMethod::Delete,
        HttpMethod::Patch,
    ];

    /// Parse a path-item key (`get`, `post`, ...). Returns `None` for keys
    /// that are not supported methods (`head`, `parameters`, `summary`, ...).
    pub fn from_spec_key(key: &str) -> Option<Self> {
        match key.to_ascii_lowercase().as_str() {
            "get" => Some(HttpMethod::Get),
            "post" => Some(HttpMethod::Post),
            "put" => Some(HttpMethod::Put),
            "delete" => Some(HttpMethod::Delete),
            "patch" => Some(HttpMethod::Patch),
            _ => None,
        }
    }

    /// Lowercase verb, as reported in call records.
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "get",
            HttpMethod::Post => "post",
            HttpMethod::Put => "put",
            HttpMethod::Delete => "delete",
            HttpMethod::Patch => "patch",
        }
    }

    /// Whether the call may create or modify a resource.
    pub fn is_write(&self) -> bool {
        matches!(self, HttpMethod::Post | HttpMethod::Put | HttpMethod::Patch)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a parameter travels in the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ParamLocation {
    Path,
    Query,
    Body,
    FormData,
    Header,
}

impl ParamLocation {
    /// Parse the `in` field of a parameter object.
    ///
    /// `cookie` and unknown locations are sent as query parameters.
    pub fn from_spec(value: &str) -> Self {
        match value {
            "path" => ParamLocation::Path,
            "body" => ParamLocation::Body,
            "formData" => ParamLocation::FormData,
            "header" => ParamLocation::Header,
            _ => ParamLocation::Query,
        }
    }
}

/// Handle to the on-disk binary placeholder used for file parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryRef {
    path: PathBuf,
}

impl BinaryRef {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Base name of the file, used as the multipart file name.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    /// Human-readable label shown instead of the binary content.
    pub fn label(&self) -> String {
        format!("file: {}", self.file_name())
    }
}

/// A synthesized parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Scalar(Value),
    Array(Vec<Value>),
    Object(Map<String, Value>),
    Binary(BinaryRef),
}

impl From<Value> for ParamValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Array(items) => ParamValue::Array(items),
            Value::Object(map) => ParamValue::Object(map),
            other => ParamValue::Scalar(other),
        }
    }
}

impl ParamValue {
    /// JSON form of the value, or `None` for binary placeholders.
    pub fn to_json(&self) -> Option<Value> {
        match self {
            ParamValue::Scalar(v) => Some(v.clone()),
            ParamValue::Array(items) => Some(Value::Array(items.clone())),
            ParamValue::Object(map) => Some(Value::Object(map.clone())),
            ParamValue::Binary(_) => None,
        }
    }

    /// JSON form with binary placeholders replaced by their label.
    pub fn to_report_value(&self) -> Value {
        match self {
            ParamValue::Binary(file) => Value::String(file.label()),
            other => other.to_json().unwrap_or(Value::Null),
        }
    }

    /// Text form of a scalar, suitable for a URL segment, query value or header.
    pub fn as_text(&self) -> Option<String> {
        match self {
            ParamValue::Scalar(v) => scalar_text(v),
            _ => None,
        }
    }

    pub fn is_binary(&self) -> bool {
        matches!(self, ParamValue::Binary(_))
    }
}

impl Serialize for ParamValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_report_value().serialize(serializer)
    }
}

/// Render a JSON scalar as plain text (strings unquoted). Objects, arrays and
/// null have no text form.
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// One parameter of a planned call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannedParam {
    pub name: String,
    pub location: ParamLocation,
    pub value: ParamValue,
}

impl PlannedParam {
    pub fn new(name: impl Into<String>, location: ParamLocation, value: ParamValue) -> Self {
        Self {
            name: name.into(),
            location,
            value,
        }
    }
}

/// A fully specified, not-yet-executed HTTP call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CallDescriptor {
    pub method: HttpMethod,
    /// Base URL the path template is appended to.
    pub base_url: String,
    /// Path template as declared in the spec, e.g. `/pet/{petId}`.
    pub path_template: String,
    /// URL rendered at plan time. Placeholders that could not be resolved
    /// are kept as `{name}`.
    pub url: String,
    pub params: Vec<PlannedParam>,
    pub content_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
}

impl CallDescriptor {
    /// Find a declared path parameter by name.
    pub fn path_param(&self, name: &str) -> Option<&PlannedParam> {
        self.params
            .iter()
            .find(|p| p.location == ParamLocation::Path && p.name == name)
    }

    /// Placeholder names of the path template, in order.
    pub fn placeholders(&self) -> Vec<String> {
        placeholders(&self.path_template)
    }

    /// Whether the planned URL still contains unresolved placeholders.
    pub fn has_unresolved(&self) -> bool {
        PLACEHOLDER.is_match(&self.url)
    }
}

/// Placeholder names in a path template (`/a/{x}/b/{y}` -> `["x", "y"]`).
pub fn placeholders(template: &str) -> Vec<String> {
    PLACEHOLDER
        .captures_iter(template)
        .map(|c| c[1].to_string())
        .collect()
}

/// Substitute `{name}` placeholders using `lookup`. Placeholders for which
/// `lookup` returns `None` are left untouched.
pub fn render_template(template: &str, mut lookup: impl FnMut(&str) -> Option<String>) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &regex::Captures<'_>| {
            lookup(&caps[1]).unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}
