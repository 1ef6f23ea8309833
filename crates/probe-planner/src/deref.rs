//! `$ref` dereferencing.
//!
//! Replaces every `{"$ref": "..."}` object with the value it points at, so the
//! planner can walk a self-contained document. References are resolved
//! against a set of already-loaded documents keyed by [`SpecSource::key`];
//! the loader is responsible for fetching external documents first.
//!
//! Inlining copies a definition at every use, so a chain of definitions that
//! each reference the previous one several times grows exponentially. The
//! output is capped at [`DEFAULT_MAX_NODES`] JSON nodes.

use crate::error::SpecError;
use crate::loader::SpecSource;
use serde_json::{Map, Value};
use std::cell::Cell;
use std::collections::HashMap;

/// Node budget for one dereferenced document.
pub const DEFAULT_MAX_NODES: usize = 2_000_000;

/// A parsed document and where it came from.
#[derive(Debug, Clone)]
pub struct LoadedDocument {
    pub source: SpecSource,
    pub value: Value,
}

/// Resolves references across a set of loaded documents.
pub struct Dereferencer<'a> {
    documents: &'a HashMap<String, LoadedDocument>,
    max_nodes: usize,
    nodes: Cell<usize>,
    root: String,
}

impl<'a> Dereferencer<'a> {
    pub fn new(documents: &'a HashMap<String, LoadedDocument>) -> Self {
        Self {
            documents,
            max_nodes: DEFAULT_MAX_NODES,
            nodes: Cell::new(0),
            root: String::new(),
        }
    }

    pub fn with_max_nodes(mut self, max_nodes: usize) -> Self {
        self.max_nodes = max_nodes;
        self
    }

    /// Fully dereference the document stored under `key`.
    pub fn dereference(&mut self, key: &str) -> Result<Value, SpecError> {
        self.nodes.set(0);
        self.root = key.to_string();
        let doc = self.document(key, key)?;
        let mut stack = Vec::new();
        self.resolve_value(doc, &doc.value, &mut stack)
    }

    fn count_node(&self) -> Result<(), SpecError> {
        let nodes = self.nodes.get() + 1;
        if nodes > self.max_nodes {
            return Err(SpecError::TooLarge {
                document: self.root.clone(),
                limit: self.max_nodes,
            });
        }
        self.nodes.set(nodes);
        Ok(())
    }

    fn document(&self, key: &str, referrer: &str) -> Result<&'a LoadedDocument, SpecError> {
        self.documents
            .get(key)
            .ok_or_else(|| SpecError::UnresolvedRef {
                reference: key.to_string(),
                document: referrer.to_string(),
            })
    }

    fn resolve_value(
        &self,
        doc: &'a LoadedDocument,
        value: &Value,
        stack: &mut Vec<String>,
    ) -> Result<Value, SpecError> {
        self.count_node()?;
        match value {
            Value::Object(map) => {
                if let Some(Value::String(reference)) = map.get("$ref") {
                    return self.resolve_ref(doc, reference, map, stack);
                }
                let mut out = Map::with_capacity(map.len());
                for (k, v) in map {
                    out.insert(k.clone(), self.resolve_value(doc, v, stack)?);
                }
                Ok(Value::Object(out))
            }
            Value::Array(items) => items
                .iter()
                .map(|item| self.resolve_value(doc, item, stack))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            other => Ok(other.clone()),
        }
    }

    fn resolve_ref(
        &self,
        doc: &'a LoadedDocument,
        reference: &str,
        siblings: &Map<String, Value>,
        stack: &mut Vec<String>,
    ) -> Result<Value, SpecError> {
        let referrer = doc.source.key();
        let (doc_part, fragment) = split_reference(reference);

        let target_doc = if doc_part.is_empty() {
            doc
        } else {
            let target_key = doc.source.join(doc_part)?.key();
            self.document(&target_key, &referrer)?
        };

        let pointer = decode_fragment(fragment);
        let ref_key = format!("{}#{}", target_doc.source.key(), pointer);
        if stack.contains(&ref_key) {
            tracing::debug!(reference = %reference, document = %referrer, "Cutting circular reference");
            return Ok(Value::Object(Map::new()));
        }

        let target = target_doc
            .value
            .pointer(&pointer)
            .ok_or_else(|| SpecError::UnresolvedRef {
                reference: reference.to_string(),
                document: referrer.clone(),
            })?;

        stack.push(ref_key);
        let resolved = self.resolve_value(target_doc, target, stack);
        stack.pop();
        let mut resolved = resolved?;

        // Keys next to `$ref` (description, nullable, ...) override the target.
        if let Value::Object(ref mut out) = resolved {
            for (k, v) in siblings {
                if k != "$ref" {
                    out.insert(k.clone(), self.resolve_value(doc, v, stack)?);
                }
            }
        }
        Ok(resolved)
    }
}

/// Split `other.yaml#/Pet` into (`other.yaml`, `/Pet`).
pub(crate) fn split_reference(reference: &str) -> (&str, &str) {
    match reference.split_once('#') {
        Some((doc, fragment)) => (doc, fragment),
        None => (reference, ""),
    }
}

/// Percent-decode a fragment into a JSON pointer (`~0`/`~1` are handled by
/// `Value::pointer`).
fn decode_fragment(fragment: &str) -> String {
    let decoded = urlencoding::decode(fragment)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| fragment.to_string());
    if decoded.is_empty() || decoded.starts_with('/') {
        decoded
    } else {
        format!("/{}", decoded)
    }
}

/// Collect the document parts of all external references in `value`.
pub(crate) fn external_references(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            if let Some(Value::String(reference)) = map.get("$ref") {
                let (doc_part, _) = split_reference(reference);
                if !doc_part.is_empty() && !out.iter().any(|r| r == doc_part) {
                    out.push(doc_part.to_string());
                }
            }
            for v in map.values() {
                external_references(v, out);
            }
        }
        Value::Array(items) => {
            for item in items {
                external_references(item, out);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::path::PathBuf;

    fn single(value: Value) -> (String, HashMap<String, LoadedDocument>) {
        let source = SpecSource::File(PathBuf::from("/specs/api.json"));
        let key = source.key();
        let mut docs = HashMap::new();
        docs.insert(key.clone(), LoadedDocument { source, value });
        (key, docs)
    }

    #[test]
    fn test_internal_refs_are_inlined() {
        let (key, docs) = single(json!({
            "paths": {
                "/pet": {
                    "post": {
                        "parameters": [{"in": "body", "name": "body", "schema": {"$ref": "#/definitions/Pet"}}]
                    }
                }
            },
            "definitions": {
                "Pet": {"type": "object", "properties": {"category": {"$ref": "#/definitions/Category"}}},
                "Category": {"type": "object", "properties": {"id": {"type": "integer"}}}
            }
        }));

        let resolved = Dereferencer::new(&docs).dereference(&key).unwrap();
        let schema = &resolved["paths"]["/pet"]["post"]["parameters"][0]["schema"];
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["properties"]["category"]["properties"]["id"]["type"], "integer");
    }

    #[test]
    fn test_escaped_pointer() {
        let (key, docs) = single(json!({
            "paths": {"/a/b": {"get": {"summary": "x"}}},
            "alias": {"$ref": "#/paths/~1a~1b/get"}
        }));

        let resolved = Dereferencer::new(&docs).dereference(&key).unwrap();
        assert_eq!(resolved["alias"]["summary"], "x");
    }

    #[test]
    fn test_circular_ref_is_cut() {
        let (key, docs) = single(json!({
            "definitions": {
                "Node": {"type": "object", "properties": {"next": {"$ref": "#/definitions/Node"}}}
            },
            "root": {"$ref": "#/definitions/Node"}
        }));

        let resolved = Dereferencer::new(&docs).dereference(&key).unwrap();
        assert_eq!(resolved["root"]["type"], "object");
        assert_eq!(resolved["root"]["properties"]["next"], json!({}));
    }

    /// `D{i}` references `D{i-1}` twice, down to a string at `D0`.
    fn doubling_chain(levels: usize) -> Value {
        let mut definitions = Map::new();
        definitions.insert("D0".to_string(), json!({"type": "string"}));
        for i in 1..=levels {
            let previous = format!("#/definitions/D{}", i - 1);
            definitions.insert(
                format!("D{}", i),
                json!({
                    "type": "object",
                    "properties": {"a": {"$ref": previous}, "b": {"$ref": previous}}
                }),
            );
        }
        json!({
            "definitions": definitions,
            "root": {"$ref": format!("#/definitions/D{}", levels)}
        })
    }

    #[test]
    fn test_exponential_expansion_is_bounded() {
        let (key, docs) = single(doubling_chain(20));
        let err = Dereferencer::new(&docs)
            .with_max_nodes(10_000)
            .dereference(&key)
            .unwrap_err();
        assert!(matches!(err, SpecError::TooLarge { limit: 10_000, .. }));

        let (key, docs) = single(doubling_chain(4));
        let resolved = Dereferencer::new(&docs)
            .with_max_nodes(10_000)
            .dereference(&key)
            .unwrap();
        assert_eq!(resolved["root"]["properties"]["a"]["properties"]["b"]["type"], "object");
    }

    #[test]
    fn test_sibling_keys_override() {
        let (key, docs) = single(json!({
            "definitions": {"Id": {"type": "integer", "description": "base"}},
            "field": {"$ref": "#/definitions/Id", "description": "override"}
        }));

        let resolved = Dereferencer::new(&docs).dereference(&key).unwrap();
        assert_eq!(resolved["field"]["type"], "integer");
        assert_eq!(resolved["field"]["description"], "override");
    }

    #[test]
    fn test_unresolved_ref_fails() {
        let (key, docs) = single(json!({"a": {"$ref": "#/definitions/Missing"}}));
        let err = Dereferencer::new(&docs).dereference(&key).unwrap_err();
        assert!(matches!(err, SpecError::UnresolvedRef { .. }));
    }

    #[test]
    fn test_external_ref_across_documents() {
        let root_source = SpecSource::File(PathBuf::from("/specs/api.json"));
        let other_source = SpecSource::File(PathBuf::from("/specs/models/pet.json"));
        let mut docs = HashMap::new();
        docs.insert(
            root_source.key(),
            LoadedDocument {
                source: root_source.clone(),
                value: json!({"schema": {"$ref": "models/pet.json#/Pet"}}),
            },
        );
        docs.insert(
            other_source.key(),
            LoadedDocument {
                source: other_source,
                value: json!({"Pet": {"type": "object", "properties": {"tag": {"$ref": "#/Tag"}}}, "Tag": {"type": "string"}}),
            },
        );

        let resolved = Dereferencer::new(&docs).dereference(&root_source.key()).unwrap();
        assert_eq!(resolved["schema"]["properties"]["tag"]["type"], "string");
    }

    #[test]
    fn test_external_references_collected_once() {
        let mut refs = Vec::new();
        external_references(
            &json!({"a": {"$ref": "x.yaml#/A"}, "b": [{"$ref": "x.yaml#/B"}, {"$ref": "#/local"}]}),
            &mut refs,
        );
        assert_eq!(refs, vec!["x.yaml"]);
    }
}
