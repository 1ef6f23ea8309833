//! Sample value synthesis from JSON Schema fragments.
//!
//! [`SchemaFaker`] is the seam the planner synthesizes through;
//! [`RandomFaker`] is the built-in implementation. It produces one
//! syntactically valid value per call and favours small positive integers for
//! identifier-like fields so chained calls hit plausible resource keys.

use crate::error::FakeError;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use probe_core::{PlannerConfig, is_identifier_name};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{Map, Number, Value, json};

/// Largest identifier handed out for id-like fields.
pub const MAX_IDENTIFIER: u64 = 1000;

/// Upper bound on generated array items and string padding.
const MAX_GENERATED_LEN: usize = 256;

const WORDS: &[&str] = &[
    "alpha", "bravo", "charlie", "delta", "echo", "foxtrot", "golf", "hotel", "india", "juliet",
    "kilo", "lima", "mike", "november", "oscar", "papa", "quebec", "romeo", "sierra", "tango",
];

/// Produces one sample value for a schema.
pub trait SchemaFaker: Send {
    /// Generate a value for `schema`. `field` is the property or parameter
    /// name the value is for, when known.
    fn fake(&mut self, schema: &Value, field: Option<&str>) -> Result<Value, FakeError>;
}

/// Draw a fresh identifier in `1..=MAX_IDENTIFIER`.
pub fn positive_identifier<R: Rng + ?Sized>(rng: &mut R) -> u64 {
    rng.random_range(1..=MAX_IDENTIFIER)
}

/// Seedable random faker.
pub struct RandomFaker {
    rng: StdRng,
    max_depth: usize,
}

impl RandomFaker {
    /// Faker with a fresh OS seed.
    pub fn new(max_depth: usize) -> Self {
        Self {
            rng: StdRng::from_os_rng(),
            max_depth,
        }
    }

    /// Deterministic faker.
    pub fn seeded(seed: u64, max_depth: usize) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            max_depth,
        }
    }

    pub fn from_config(config: &PlannerConfig) -> Self {
        match config.seed {
            Some(seed) => Self::seeded(seed, config.max_schema_depth),
            None => Self::new(config.max_schema_depth),
        }
    }

    fn generate(&mut self, schema: &Value, field: Option<&str>, depth: usize) -> Result<Value, FakeError> {
        if depth > self.max_depth {
            return Err(FakeError::TooDeep(self.max_depth));
        }

        let obj = match schema {
            Value::Object(obj) => obj,
            Value::Bool(true) => return Ok(Value::String(self.words(1))),
            other => return Err(FakeError::Unsupported(other.to_string())),
        };

        if let Some(value) = obj.get("const") {
            return Ok(value.clone());
        }
        if let Some(value) = obj.get("example") {
            return Ok(value.clone());
        }
        if let Some(value) = obj.get("examples").and_then(Value::as_array).and_then(|e| e.first()) {
            return Ok(value.clone());
        }
        if let Some(value) = obj.get("default") {
            return Ok(value.clone());
        }
        if let Some(options) = obj.get("enum").and_then(Value::as_array) {
            if !options.is_empty() {
                let index = self.rng.random_range(0..options.len());
                return Ok(options[index].clone());
            }
        }

        for key in ["oneOf", "anyOf"] {
            if let Some(branches) = obj.get(key).and_then(Value::as_array) {
                let mut last_err = None;
                for branch in branches {
                    match self.generate(branch, field, depth + 1) {
                        Ok(value) => return Ok(value),
                        Err(e) => last_err = Some(e),
                    }
                }
                if let Some(err) = last_err {
                    return Err(err);
                }
            }
        }

        if let Some(parts) = obj.get("allOf").and_then(Value::as_array) {
            let merged = merge_all_of(obj, parts);
            return self.generate(&merged, field, depth + 1);
        }

        match schema_type(obj) {
            Some("string") => Ok(Value::String(self.string(obj, field))),
            Some("integer") => Ok(self.integer(obj, field)),
            Some("number") => Ok(self.number(obj, field)),
            Some("boolean") => Ok(Value::Bool(self.rng.random_bool(0.5))),
            Some("null") => Ok(Value::Null),
            Some("array") => self.array(obj, field, depth),
            Some("object") => self.object(obj, depth),
            Some(other) => Err(FakeError::Unsupported(format!("type {}", other))),
            None => Err(FakeError::Unsupported(schema.to_string())),
        }
    }

    fn string(&mut self, obj: &Map<String, Value>, field: Option<&str>) -> String {
        let format = obj.get("format").and_then(Value::as_str);
        let value = match format {
            Some("date-time") => {
                let days = self.rng.random_range(0..365);
                (chrono::Utc::now() - chrono::Duration::days(days))
                    .to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
            }
            Some("date") => {
                let days = self.rng.random_range(0..365);
                (chrono::Utc::now() - chrono::Duration::days(days))
                    .date_naive()
                    .format("%Y-%m-%d")
                    .to_string()
            }
            Some("time") => format!(
                "{:02}:{:02}:{:02}",
                self.rng.random_range(0..24),
                self.rng.random_range(0..60),
                self.rng.random_range(0..60)
            ),
            Some("uuid") => uuid::Builder::from_random_bytes(self.rng.random())
                .into_uuid()
                .to_string(),
            Some("email") => format!("{}{}@example.com", self.word(), self.rng.random_range(1..100)),
            Some("uri") | Some("url") => format!("https://example.com/{}", self.word()),
            Some("hostname") => format!("{}.example.com", self.word()),
            Some("ipv4") => format!(
                "10.{}.{}.{}",
                self.rng.random_range(0..=255),
                self.rng.random_range(0..=255),
                self.rng.random_range(1..=254)
            ),
            Some("ipv6") => format!("2001:db8::{:x}", self.rng.random_range(1..=0xffff)),
            Some("byte") => BASE64.encode(self.words(2)),
            Some("password") => {
                let n = self.rng.random_range(1000..10000);
                format!("{}-{}", self.word(), n)
            }
            _ if field.is_some_and(is_identifier_name) => {
                positive_identifier(&mut self.rng).to_string()
            }
            _ => {
                let count = self.rng.random_range(1..=2);
                self.words(count)
            }
        };

        fit_length(value, obj)
    }

    fn integer(&mut self, obj: &Map<String, Value>, field: Option<&str>) -> Value {
        let (min, max) = bounds(obj);
        if field.is_some_and(is_identifier_name) {
            let low = min.map_or(1, |m| m.ceil().max(1.0) as i64);
            let high = max.map_or(MAX_IDENTIFIER as i64, |m| m.floor().min(MAX_IDENTIFIER as f64) as i64);
            if low <= high {
                return json!(self.rng.random_range(low..=high));
            }
        }

        let low = min.map_or(0, |m| m.ceil() as i64);
        let high = max.map_or(low.saturating_add(1000), |m| m.floor() as i64);
        if low >= high {
            return json!(low);
        }
        json!(self.rng.random_range(low..=high))
    }

    fn number(&mut self, obj: &Map<String, Value>, field: Option<&str>) -> Value {
        if field.is_some_and(is_identifier_name) {
            return self.integer(obj, field);
        }
        let (min, max) = bounds(obj);
        let low = min.filter(|m| m.is_finite()).unwrap_or(0.0);
        let high = max.filter(|m| m.is_finite()).unwrap_or(low + 1000.0);
        // Spans wider than f64 can represent fall back to the lower bound.
        let raw = if low < high && (high - low).is_finite() {
            self.rng.random_range(low..high)
        } else {
            low
        };
        let rounded = (raw * 100.0).round() / 100.0;
        let clamped = if rounded < low || rounded > high { raw } else { rounded };
        Number::from_f64(clamped).map(Value::Number).unwrap_or(json!(0))
    }

    fn array(&mut self, obj: &Map<String, Value>, field: Option<&str>, depth: usize) -> Result<Value, FakeError> {
        let min = obj
            .get("minItems")
            .and_then(Value::as_u64)
            .map_or(1, |m| m.min(MAX_GENERATED_LEN as u64) as usize);
        let max = obj
            .get("maxItems")
            .and_then(Value::as_u64)
            .map(|m| m as usize)
            .unwrap_or(min.max(1) + 1)
            .max(min);
        let count = self
            .rng
            .random_range(min..=max.min(min + 3))
            .min(MAX_GENERATED_LEN);

        let default_items = json!({"type": "string"});
        let items = obj.get("items").unwrap_or(&default_items);

        let mut values = Vec::with_capacity(count);
        for _ in 0..count {
            values.push(self.generate(items, field, depth + 1)?);
        }
        Ok(Value::Array(values))
    }

    fn object(&mut self, obj: &Map<String, Value>, depth: usize) -> Result<Value, FakeError> {
        let mut out = Map::new();

        if let Some(props) = obj.get("properties").and_then(Value::as_object) {
            for (name, prop) in props {
                match self.generate(prop, Some(name), depth + 1) {
                    Ok(value) => {
                        out.insert(name.clone(), value);
                    }
                    Err(e) => {
                        tracing::debug!(property = %name, error = %e, "Skipping property");
                    }
                }
            }
        } else if let Some(extra) = obj.get("additionalProperties").filter(|v| v.is_object()) {
            out.insert(
                "additionalProp1".to_string(),
                self.generate(extra, None, depth + 1)?,
            );
        }

        Ok(Value::Object(out))
    }

    fn word(&mut self) -> &'static str {
        WORDS[self.rng.random_range(0..WORDS.len())]
    }

    fn words(&mut self, count: usize) -> String {
        (0..count.max(1))
            .map(|_| self.word())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl SchemaFaker for RandomFaker {
    fn fake(&mut self, schema: &Value, field: Option<&str>) -> Result<Value, FakeError> {
        self.generate(schema, field, 0)
    }
}

/// Declared type, or one inferred from the keywords present.
fn schema_type(obj: &Map<String, Value>) -> Option<&str> {
    match obj.get("type") {
        Some(Value::String(t)) => return Some(t.as_str()),
        Some(Value::Array(types)) => {
            let first = types
                .iter()
                .filter_map(Value::as_str)
                .find(|t| *t != "null")
                .or_else(|| types.iter().filter_map(Value::as_str).next());
            if first.is_some() {
                return first;
            }
        }
        _ => {}
    }

    if obj.contains_key("properties") || obj.contains_key("additionalProperties") {
        Some("object")
    } else if obj.contains_key("items") {
        Some("array")
    } else if obj.contains_key("minimum") || obj.contains_key("maximum") {
        Some("number")
    } else if ["format", "minLength", "maxLength", "pattern"]
        .iter()
        .any(|k| obj.contains_key(*k))
    {
        Some("string")
    } else {
        None
    }
}

/// Inclusive numeric bounds, honouring both the boolean (OpenAPI 3.0) and
/// numeric (JSON Schema 2020-12) forms of `exclusiveMinimum`/`exclusiveMaximum`.
fn bounds(obj: &Map<String, Value>) -> (Option<f64>, Option<f64>) {
    let mut min = obj.get("minimum").and_then(Value::as_f64);
    let mut max = obj.get("maximum").and_then(Value::as_f64);

    match obj.get("exclusiveMinimum") {
        Some(Value::Bool(true)) => min = min.map(|m| m + 1.0),
        Some(Value::Number(n)) => min = n.as_f64().map(|m| m + 1.0),
        _ => {}
    }
    match obj.get("exclusiveMaximum") {
        Some(Value::Bool(true)) => max = max.map(|m| m - 1.0),
        Some(Value::Number(n)) => max = n.as_f64().map(|m| m - 1.0),
        _ => {}
    }
    (min, max)
}

fn fit_length(mut value: String, obj: &Map<String, Value>) -> String {
    if let Some(max) = obj.get("maxLength").and_then(Value::as_u64) {
        value = value.chars().take(max as usize).collect();
    }
    if let Some(min) = obj.get("minLength").and_then(Value::as_u64) {
        let min = min.min(MAX_GENERATED_LEN as u64) as usize;
        let missing = min.saturating_sub(value.chars().count());
        value.extend(std::iter::repeat_n('x', missing));
    }
    value
}

/// Merge `allOf` parts (and the sibling keywords) into one schema.
fn merge_all_of(base: &Map<String, Value>, parts: &[Value]) -> Value {
    let mut merged: Map<String, Value> = base
        .iter()
        .filter(|(k, _)| k.as_str() != "allOf")
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    for part in parts.iter().filter_map(Value::as_object) {
        for (key, value) in part {
            match (key.as_str(), merged.get_mut(key)) {
                ("properties", Some(Value::Object(existing))) => {
                    if let Value::Object(extra) = value {
                        for (k, v) in extra {
                            existing.insert(k.clone(), v.clone());
                        }
                    }
                }
                ("required", Some(Value::Array(existing))) => {
                    if let Value::Array(extra) = value {
                        existing.extend(extra.iter().cloned());
                    }
                }
                (_, Some(_)) => {}
                (_, None) => {
                    merged.insert(key.clone(), value.clone());
                }
            }
        }
    }
    Value::Object(merged)
}
