//! Output exporter - named references into resolved resource state
//!
//! `export` records a pointer to a not-yet-resolved value during the
//! declaration phase; `collect` materializes concrete values after the
//! engine run. A value exists only if its source resource succeeded.

use std::collections::BTreeMap;
use std::sync::Arc;

use rustc_hash::FxHashSet;
use serde_json::Value;

use crate::engine::{NodeStatus, StateStore};
use crate::error::PlatyError;
use crate::util::path;

/// Reference to (part of) a resource's resolved outputs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputRef {
    pub node_id: Arc<str>,
    /// Dot path into the outputs; `None` exports the whole value
    pub path: Option<String>,
}

impl OutputRef {
    /// Reference a resource's entire resolved outputs
    pub fn new(node_id: Arc<str>) -> Self {
        Self {
            node_id,
            path: None,
        }
    }

    /// Reference a path inside a resource's resolved outputs
    pub fn at(node_id: Arc<str>, path: impl Into<String>) -> Self {
        Self {
            node_id,
            path: Some(path.into()),
        }
    }
}

/// Collects named output references during declaration
#[derive(Debug, Default)]
pub struct Exporter {
    exports: Vec<(String, OutputRef)>,
    names: FxHashSet<String>,
}

impl Exporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a named output reference.
    ///
    /// Fails with `DuplicateOutput` on name reuse and `PathUnsupported` for
    /// malformed paths; both are checked at declaration time.
    pub fn export(&mut self, name: &str, output: OutputRef) -> Result<(), PlatyError> {
        if !self.names.insert(name.to_string()) {
            return Err(PlatyError::DuplicateOutput {
                name: name.to_string(),
            });
        }
        if let Some(p) = &output.path {
            path::validate(p)?;
        }
        self.exports.push((name.to_string(), output));
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.exports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exports.is_empty()
    }

    /// Declared output names, in declaration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.exports.iter().map(|(name, _)| name.as_str())
    }

    /// Declared (name, reference) pairs, in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &OutputRef)> {
        self.exports.iter().map(|(name, r)| (name.as_str(), r))
    }

    /// Collect all outputs, failing on the first unresolved one.
    ///
    /// An output is resolvable iff its source resource reached `Succeeded`
    /// and the path matches.
    pub fn collect(&self, store: &StateStore) -> Result<BTreeMap<String, Value>, PlatyError> {
        let mut values = BTreeMap::new();

        for (name, output) in &self.exports {
            match Self::resolve(output, store) {
                Resolution::Value(v) => {
                    values.insert(name.clone(), v);
                }
                Resolution::Unresolved(status) => {
                    return Err(PlatyError::UnresolvedOutput {
                        name: name.clone(),
                        node_id: output.node_id.to_string(),
                        status,
                    });
                }
                Resolution::PathMiss(p) => {
                    return Err(PlatyError::OutputPathNotFound {
                        name: name.clone(),
                        path: p,
                    });
                }
            }
        }

        Ok(values)
    }

    /// Collect what resolved, plus the unresolved list for the final report:
    /// (name, node_id, human status)
    pub fn collect_partial(
        &self,
        store: &StateStore,
    ) -> (BTreeMap<String, Value>, Vec<(String, String, String)>) {
        let mut values = BTreeMap::new();
        let mut unresolved = Vec::new();

        for (name, output) in &self.exports {
            match Self::resolve(output, store) {
                Resolution::Value(v) => {
                    values.insert(name.clone(), v);
                }
                Resolution::Unresolved(status) => {
                    unresolved.push((name.clone(), output.node_id.to_string(), status));
                }
                Resolution::PathMiss(p) => {
                    unresolved.push((
                        name.clone(),
                        output.node_id.to_string(),
                        format!("has no value at path '{}'", p),
                    ));
                }
            }
        }

        (values, unresolved)
    }

    fn resolve(output: &OutputRef, store: &StateStore) -> Resolution {
        let Some(record) = store.get(&output.node_id) else {
            return Resolution::Unresolved("was never executed".to_string());
        };

        match &record.status {
            NodeStatus::Failed(_) => return Resolution::Unresolved("failed".to_string()),
            NodeStatus::Skipped { blocked_on } => {
                return Resolution::Unresolved(format!(
                    "was skipped (blocked on '{}')",
                    blocked_on
                ));
            }
            NodeStatus::Succeeded => {}
        }

        match &output.path {
            None => Resolution::Value((*record.outputs).clone()),
            Some(p) => match path::resolve(&record.outputs, p) {
                Ok(Some(v)) => Resolution::Value(v),
                _ => Resolution::PathMiss(p.clone()),
            },
        }
    }
}

enum Resolution {
    Value(Value),
    Unresolved(String),
    PathMiss(String),
}
