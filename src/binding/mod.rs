//! Property references - `${node.path}` wiring between resources
//!
//! Resource properties may reference the resolved outputs of upstream
//! resources. References are used twice:
//! - at declaration time, to infer dependency edges (`referenced_ids`)
//! - at execution time, to substitute concrete values (`resolve_properties`)
//!
//! A property that is exactly one reference keeps the referenced value's
//! type; references embedded in longer strings interpolate as text.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use rustc_hash::FxHashSet;
use serde_json::Value;

use crate::engine::StateStore;
use crate::error::PlatyError;
use crate::util::path;

/// `${node}` or `${node.path.to.value}`
static REF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([a-z][a-z0-9-]*)(?:\.([A-Za-z0-9_\-.\[\]]+))?\}").unwrap());

/// A parsed `${...}` reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyRef {
    pub node_id: String,
    pub path: Option<String>,
}

impl PropertyRef {
    fn from_captures(cap: &Captures<'_>) -> Self {
        Self {
            node_id: cap[1].to_string(),
            path: cap.get(2).map(|m| m.as_str().to_string()),
        }
    }
}

/// Parse a string that is exactly one reference (e.g. an output declaration)
pub fn parse_ref(s: &str) -> Option<PropertyRef> {
    let cap = REF_RE.captures(s)?;
    let full = cap.get(0)?;
    if full.start() == 0 && full.end() == s.len() {
        Some(PropertyRef::from_captures(&cap))
    } else {
        None
    }
}

/// Extract every reference appearing in a property tree
pub fn extract_refs(value: &Value) -> Vec<PropertyRef> {
    let mut refs = Vec::new();
    collect(value, &mut refs);
    refs
}

fn collect(value: &Value, refs: &mut Vec<PropertyRef>) {
    match value {
        Value::String(s) => {
            for cap in REF_RE.captures_iter(s) {
                refs.push(PropertyRef::from_captures(&cap));
            }
        }
        Value::Array(items) => {
            for item in items {
                collect(item, refs);
            }
        }
        Value::Object(map) => {
            for item in map.values() {
                collect(item, refs);
            }
        }
        _ => {}
    }
}

/// Unique node ids referenced by a property tree, in first-seen order
pub fn referenced_ids(value: &Value) -> Vec<String> {
    let mut seen: FxHashSet<String> = FxHashSet::default();
    extract_refs(value)
        .into_iter()
        .filter_map(|r| seen.insert(r.node_id.clone()).then_some(r.node_id))
        .collect()
}

/// Substitute all references in a property tree against resolved state.
///
/// Fails with `ReferenceNotFound` if a referenced node has no resolved
/// outputs or the path misses.
pub fn resolve_properties(value: &Value, store: &StateStore) -> Result<Value, PlatyError> {
    match value {
        Value::String(s) => resolve_str(s, store),
        Value::Array(items) => {
            let resolved: Result<Vec<Value>, PlatyError> = items
                .iter()
                .map(|item| resolve_properties(item, store))
                .collect();
            Ok(Value::Array(resolved?))
        }
        Value::Object(map) => {
            let mut resolved = serde_json::Map::with_capacity(map.len());
            for (key, item) in map {
                resolved.insert(key.clone(), resolve_properties(item, store)?);
            }
            Ok(Value::Object(resolved))
        }
        other => Ok(other.clone()),
    }
}

fn resolve_str(s: &str, store: &StateStore) -> Result<Value, PlatyError> {
    // Whole-string reference keeps the referenced value's type
    if let Some(r) = parse_ref(s) {
        return lookup(&r, s, store);
    }

    if !REF_RE.is_match(s) {
        return Ok(Value::String(s.to_string()));
    }

    // Embedded references interpolate as text
    let mut result = s.to_string();
    for cap in REF_RE.captures_iter(s) {
        let full = cap.get(0).expect("capture 0 always present").as_str();
        let r = PropertyRef::from_captures(&cap);
        let resolved = lookup(&r, full, store)?;
        let text = match resolved {
            Value::String(inner) => inner,
            other => other.to_string(),
        };
        result = result.replace(full, &text);
    }

    Ok(Value::String(result))
}

fn lookup(r: &PropertyRef, reference: &str, store: &StateStore) -> Result<Value, PlatyError> {
    let not_found = || PlatyError::ReferenceNotFound {
        reference: reference.to_string(),
        node_id: r.node_id.clone(),
    };

    let outputs = store.outputs(&r.node_id).ok_or_else(not_found)?;

    match &r.path {
        None => Ok((*outputs).clone()),
        Some(p) => path::resolve(&outputs, p)?.ok_or_else(not_found),
    }
}
