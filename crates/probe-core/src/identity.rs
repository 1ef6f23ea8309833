//! Identifier roles and the per-run identifier store.
//!
//! Identifiers discovered in one call (a created resource's id, a user's
//! login name) are fed into later calls that reference the same role. A
//! parameter, path placeholder or response field is mapped to a role by the
//! ordered [`ROLE_RULES`] list; the first decisive rule wins.
//!
//! | # | Rule | Outcome |
//! |---|------|---------|
//! | 1 | `principal-name` | `username`, `login`, `principal`, ... → `PrincipalName` |
//! | 2 | `not-identifier` | last name token is not `id`/`uuid`/`guid` → no role |
//! | 3 | `own-resource` | `petId` under a `pet`/`pets` segment: first segment → `PrimaryId`, deeper → `SecondaryId` |
//! | 4 | `foreign-reference` | prefixed id naming no segment of the path → `PrimaryId` |
//! | 5 | `bare-identifier` | plain `id`: static depth ≤ 1 → `PrimaryId`, else `SecondaryId` |
//!
//! Version and `api` prefixes (`/api/v2/...`) do not count as resource
//! segments.

use crate::call::scalar_text;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Semantic role of an identifier value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentifierRole {
    /// Key of a top-level resource (`/pet/{petId}`).
    PrimaryId,
    /// Key of a nested resource (`/store/order/{orderId}`).
    SecondaryId,
    /// Login or user name of a principal (`/user/{username}`).
    PrincipalName,
}

impl fmt::Display for IdentifierRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IdentifierRole::PrimaryId => "primary_id",
            IdentifierRole::SecondaryId => "secondary_id",
            IdentifierRole::PrincipalName => "principal_name",
        };
        f.write_str(name)
    }
}

/// Result of applying one rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Assign(IdentifierRole),
    Reject,
    Pass,
}

/// One entry of the role rule list.
pub struct RoleRule {
    pub name: &'static str,
    pub check: fn(&RoleQuery) -> Verdict,
}

/// Ordered role rules.
pub static ROLE_RULES: [RoleRule; 5] = [
    RoleRule {
        name: "principal-name",
        check: principal_name,
    },
    RoleRule {
        name: "not-identifier",
        check: not_identifier,
    },
    RoleRule {
        name: "own-resource",
        check: own_resource,
    },
    RoleRule {
        name: "foreign-reference",
        check: foreign_reference,
    },
    RoleRule {
        name: "bare-identifier",
        check: bare_identifier,
    },
];

const PRINCIPAL_NAMES: &[&str] = &["username", "login", "loginname", "principal", "principalname"];
const ID_TOKENS: &[&str] = &["id", "uuid", "guid"];

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Static(String),
    Placeholder(String),
}

/// A name looked at in the context of a path template.
#[derive(Debug, Clone)]
pub struct RoleQuery {
    name: String,
    tokens: Vec<String>,
    segments: Vec<Segment>,
}

impl RoleQuery {
    pub fn new(name: &str, template: &str) -> Self {
        Self {
            name: name.to_string(),
            tokens: name_tokens(name),
            segments: path_segments(template),
        }
    }

    fn is_identifier(&self) -> bool {
        self.tokens
            .last()
            .is_some_and(|t| ID_TOKENS.contains(&t.as_str()))
    }

    /// Resource name before the id token (`petId` -> `pet`), if any.
    fn resource_prefix(&self) -> Option<String> {
        if !self.is_identifier() || self.tokens.len() < 2 {
            return None;
        }
        Some(self.tokens[..self.tokens.len() - 1].concat())
    }

    /// Static segments that name resources, in path order.
    fn resource_segments(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Static(name) => Some(name.as_str()),
            Segment::Placeholder(_) => None,
        })
    }

    /// Number of resource segments before this name's own placeholder, else
    /// before the first placeholder, else in the whole path.
    fn depth(&self) -> usize {
        let stop = self
            .segments
            .iter()
            .position(|s| matches!(s, Segment::Placeholder(p) if *p == self.name))
            .or_else(|| {
                self.segments
                    .iter()
                    .position(|s| matches!(s, Segment::Placeholder(_)))
            })
            .unwrap_or(self.segments.len());

        self.segments[..stop]
            .iter()
            .filter(|s| matches!(s, Segment::Static(_)))
            .count()
    }
}

fn principal_name(q: &RoleQuery) -> Verdict {
    if PRINCIPAL_NAMES.contains(&q.tokens.concat().as_str()) {
        Verdict::Assign(IdentifierRole::PrincipalName)
    } else {
        Verdict::Pass
    }
}

fn not_identifier(q: &RoleQuery) -> Verdict {
    if q.is_identifier() {
        Verdict::Pass
    } else {
        Verdict::Reject
    }
}

fn own_resource(q: &RoleQuery) -> Verdict {
    let Some(prefix) = q.resource_prefix() else {
        return Verdict::Pass;
    };
    let prefix = singularize(&prefix);

    match q
        .resource_segments()
        .position(|seg| singularize(seg) == prefix)
    {
        Some(0) => Verdict::Assign(IdentifierRole::PrimaryId),
        Some(_) => Verdict::Assign(IdentifierRole::SecondaryId),
        None => Verdict::Pass,
    }
}

fn foreign_reference(q: &RoleQuery) -> Verdict {
    if q.resource_prefix().is_some() {
        Verdict::Assign(IdentifierRole::PrimaryId)
    } else {
        Verdict::Pass
    }
}

fn bare_identifier(q: &RoleQuery) -> Verdict {
    if q.depth() <= 1 {
        Verdict::Assign(IdentifierRole::PrimaryId)
    } else {
        Verdict::Assign(IdentifierRole::SecondaryId)
    }
}

/// Map a parameter or field name to its identifier role in the context of a
/// path template.
pub fn classify(name: &str, template: &str) -> Option<IdentifierRole> {
    let query = RoleQuery::new(name, template);
    for rule in &ROLE_RULES {
        match (rule.check)(&query) {
            Verdict::Assign(role) => return Some(role),
            Verdict::Reject => return None,
            Verdict::Pass => {}
        }
    }
    None
}

/// Whether a name denotes an identifier (`id`, `petId`, `order_id`, `userUUID`).
pub fn is_identifier_name(name: &str) -> bool {
    name_tokens(name)
        .last()
        .is_some_and(|t| ID_TOKENS.contains(&t.as_str()))
}

/// Split a name on camelCase, `_`, `-`, `.` and space boundaries, lowercased.
/// Acronym runs stay together (`APIKey` -> `api`, `key`).
pub fn name_tokens(name: &str) -> Vec<String> {
    let chars: Vec<char> = name.chars().collect();
    let mut tokens = Vec::new();
    let mut current = String::new();

    for (i, &c) in chars.iter().enumerate() {
        if matches!(c, '_' | '-' | '.' | ' ') {
            if !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
            continue;
        }
        if c.is_uppercase() && !current.is_empty() {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_is_lower) {
                tokens.push(std::mem::take(&mut current));
            }
        }
        current.extend(c.to_lowercase());
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

fn path_segments(template: &str) -> Vec<Segment> {
    template
        .split('/')
        .filter(|s| !s.is_empty())
        .filter_map(|s| {
            if let Some(inner) = s.strip_prefix('{').and_then(|r| r.strip_suffix('}')) {
                return Some(Segment::Placeholder(inner.to_string()));
            }
            let normalized: String = name_tokens(s).concat();
            if normalized.is_empty() || is_prefix_segment(&normalized) {
                None
            } else {
                Some(Segment::Static(normalized))
            }
        })
        .collect()
}

/// `api`, `v1`, `v2.1`: routing prefixes rather than resources.
fn is_prefix_segment(segment: &str) -> bool {
    if segment == "api" {
        return true;
    }
    segment
        .strip_prefix('v')
        .is_some_and(|rest| !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit() || c == '.'))
}

/// Resource name for a collection path segment (`pets` -> `pet`,
/// `categories` -> `category`, `addresses` -> `address`). Segments that
/// are already singular, such as `status`, pass through.
fn singularize(segment: &str) -> String {
    const IRREGULAR: &[(&str, &str)] = &[("people", "person"), ("children", "child")];
    if let Some((_, singular)) = IRREGULAR.iter().find(|(plural, _)| *plural == segment) {
        return (*singular).to_string();
    }

    if let Some(stem) = segment.strip_suffix("ies").filter(|s| !s.is_empty()) {
        return format!("{stem}y");
    }
    if ["sses", "xes", "ches", "shes"].iter().any(|suffix| segment.ends_with(suffix)) {
        return segment[..segment.len() - 2].to_string();
    }
    match segment.strip_suffix('s') {
        Some(stem) if !["s", "u", "i"].iter().any(|end| stem.ends_with(end)) => stem.to_string(),
        _ => segment.to_string(),
    }
}

/// Run-scoped identifier state.
///
/// Created empty at the start of a run, written by the executor after
/// successful calls, read when path placeholders and body fields are
/// resolved. Never shared between runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IdentifierStore {
    values: BTreeMap<IdentifierRole, Value>,
}

impl IdentifierStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, role: IdentifierRole) -> Option<&Value> {
        self.values.get(&role)
    }

    /// Record a value for a role, replacing the previous one.
    ///
    /// Only scalars with a text form are accepted; anything else is ignored
    /// and `false` is returned.
    pub fn record(&mut self, role: IdentifierRole, value: Value) -> bool {
        if scalar_text(&value).is_none() {
            return false;
        }
        self.values.insert(role, value);
        true
    }

    /// Stored value for whatever role `name` has under `template`.
    pub fn lookup(&self, name: &str, template: &str) -> Option<&Value> {
        classify(name, template).and_then(|role| self.get(role))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&IdentifierRole, &Value)> {
        self.values.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_name_tokens() {
        assert_eq!(name_tokens("petId"), vec!["pet", "id"]);
        assert_eq!(name_tokens("order_id"), vec!["order", "id"]);
        assert_eq!(name_tokens("APIKey"), vec!["api", "key"]);
        assert_eq!(name_tokens("orderID"), vec!["order", "id"]);
        assert_eq!(name_tokens("ID"), vec!["id"]);
    }

    #[test]
    fn test_is_identifier_name() {
        assert!(is_identifier_name("id"));
        assert!(is_identifier_name("petId"));
        assert!(is_identifier_name("user-uuid"));
        assert!(!is_identifier_name("valid"));
        assert!(!is_identifier_name("idType"));
        assert!(!is_identifier_name("status"));
    }

    #[test]
    fn test_principal_name_rule() {
        assert_eq!(classify("username", "/user/{username}"), Some(IdentifierRole::PrincipalName));
        assert_eq!(classify("user_name", "/user"), Some(IdentifierRole::PrincipalName));
        assert_eq!(classify("name", "/pet"), None);
    }

    #[test]
    fn test_own_resource_rule() {
        assert_eq!(classify("petId", "/pet/{petId}"), Some(IdentifierRole::PrimaryId));
        assert_eq!(classify("petId", "/pets/{petId}/photos"), Some(IdentifierRole::PrimaryId));
        assert_eq!(
            classify("orderId", "/store/order/{orderId}"),
            Some(IdentifierRole::SecondaryId)
        );
    }

    #[test]
    fn test_prefix_segments_are_ignored() {
        assert_eq!(classify("petId", "/api/v2/pets/{petId}"), Some(IdentifierRole::PrimaryId));
        assert_eq!(classify("id", "/v1/pets"), Some(IdentifierRole::PrimaryId));
    }

    #[test]
    fn test_foreign_reference_rule() {
        // An order body referencing a pet
        assert_eq!(classify("petId", "/store/order"), Some(IdentifierRole::PrimaryId));
    }

    #[test]
    fn test_bare_identifier_rule() {
        assert_eq!(classify("id", "/pet"), Some(IdentifierRole::PrimaryId));
        assert_eq!(classify("id", "/store/order"), Some(IdentifierRole::SecondaryId));
        assert_eq!(classify("id", "/store/order/{id}"), Some(IdentifierRole::SecondaryId));
        assert_eq!(classify("id", "/pet/{id}/uploadImage"), Some(IdentifierRole::PrimaryId));
    }

    #[test]
    fn test_rules_are_ordered() {
        let names: Vec<&str> = ROLE_RULES.iter().map(|r| r.name).collect();
        assert_eq!(
            names,
            vec![
                "principal-name",
                "not-identifier",
                "own-resource",
                "foreign-reference",
                "bare-identifier"
            ]
        );
    }

    #[test]
    fn test_singularize() {
        assert_eq!(singularize("pets"), "pet");
        assert_eq!(singularize("categories"), "category");
        assert_eq!(singularize("boxes"), "box");
        assert_eq!(singularize("status"), "status");
        assert_eq!(singularize("addresses"), "address");
        assert_eq!(singularize("people"), "person");
    }

    #[test]
    fn test_store_overwrites_and_rejects_non_scalars() {
        let mut store = IdentifierStore::new();
        assert!(store.is_empty());

        assert!(store.record(IdentifierRole::PrimaryId, json!(1)));
        assert!(store.record(IdentifierRole::PrimaryId, json!(42)));
        assert!(!store.record(IdentifierRole::SecondaryId, json!({"id": 3})));

        assert_eq!(store.get(IdentifierRole::PrimaryId), Some(&json!(42)));
        assert_eq!(store.get(IdentifierRole::SecondaryId), None);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_store_lookup_by_name() {
        let mut store = IdentifierStore::new();
        store.record(IdentifierRole::PrimaryId, json!(42));
        store.record(IdentifierRole::PrincipalName, json!("alice"));

        assert_eq!(store.lookup("petId", "/pet/{petId}"), Some(&json!(42)));
        assert_eq!(store.lookup("username", "/user/{username}"), Some(&json!("alice")));
        assert_eq!(store.lookup("orderId", "/store/order/{orderId}"), None);
        assert_eq!(store.lookup("status", "/pet/findByStatus"), None);
    }
}
