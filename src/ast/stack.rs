//! Stack types - the YAML declaration front-end
//!
//! Contains the core YAML-parsed types:
//! - `Stack`: root document with resources and outputs
//! - `ResourceDecl`: one declared resource
//!
//! Stacks validate in three layers: JSON Schema (shape), schema version
//! (compatibility), graph construction (duplicates, unknown deps, cycles).

use std::collections::BTreeMap;
use std::sync::LazyLock;

use serde::Deserialize;
use serde_json::Value;

use crate::binding;
use crate::error::PlatyError;
use crate::graph::{GraphBuilder, ResourceGraph, ResourceKind};
use crate::outputs::{Exporter, OutputRef};
use crate::util::intern;

/// Expected schema version for v0.1 stacks
pub const SCHEMA_V01: &str = "platy/stack@0.1";

/// Embedded JSON Schema for stack files
static STACK_SCHEMA: LazyLock<jsonschema::Validator> = LazyLock::new(|| {
    let schema: Value = serde_json::from_str(include_str!("../../schemas/platy-stack.schema.json"))
        .expect("embedded stack schema is valid JSON");
    jsonschema::validator_for(&schema).expect("embedded stack schema compiles")
});

fn default_properties() -> Value {
    Value::Object(serde_json::Map::new())
}

/// One declared resource in a stack file
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceDecl {
    pub id: String,
    pub kind: ResourceKind,
    /// Desired properties; may contain `${node.path}` references
    #[serde(default = "default_properties")]
    pub properties: Value,
    /// Explicit dependencies, merged with references inferred from properties
    #[serde(default)]
    pub depends_on: Vec<String>,
}

/// Stack parsed from YAML
#[derive(Debug, Deserialize)]
pub struct Stack {
    pub schema: String,
    #[serde(default)]
    pub provider: Option<String>,
    pub resources: Vec<ResourceDecl>,
    /// name → `${node.path}` reference
    #[serde(default)]
    pub outputs: BTreeMap<String, String>,
}

impl Stack {
    /// Parse and fully validate a stack document.
    ///
    /// Validation order: JSON Schema (shape), then serde, then the schema
    /// version tag. Graph-level errors surface later in [`Stack::into_graph`].
    pub fn load(yaml: &str) -> Result<Self, PlatyError> {
        // Shape validation against the embedded JSON Schema first, for
        // errors that name the offending path
        let doc: serde_yaml::Value = serde_yaml::from_str(yaml)?;
        let doc_json = serde_json::to_value(&doc)?;
        let errors: Vec<String> = STACK_SCHEMA
            .iter_errors(&doc_json)
            .map(|e| format!("[{}] {}", e.instance_path, e))
            .collect();
        if !errors.is_empty() {
            return Err(PlatyError::SchemaFailed {
                details: errors.join("; "),
            });
        }

        let stack: Stack = serde_yaml::from_str(yaml)?;
        stack.validate_schema()?;
        Ok(stack)
    }

    /// Validate the schema version tag
    pub fn validate_schema(&self) -> Result<(), PlatyError> {
        if self.schema != SCHEMA_V01 {
            return Err(PlatyError::InvalidSchema {
                expected: SCHEMA_V01.to_string(),
                actual: self.schema.clone(),
            });
        }
        Ok(())
    }

    /// Compute a hash of the stack for trace correlation
    ///
    /// Uses xxhash3. The hash covers the schema version, provider, and
    /// resource ids. Returns a 16-character hex string (64-bit hash).
    pub fn compute_hash(&self) -> String {
        use xxhash_rust::xxh3::xxh3_64;

        let mut hasher_input = String::new();
        hasher_input.push_str(&self.schema);
        if let Some(provider) = &self.provider {
            hasher_input.push_str(provider);
        }
        hasher_input.push_str(&self.resources.len().to_string());
        for decl in &self.resources {
            hasher_input.push_str(&decl.id);
        }

        format!("{:016x}", xxh3_64(hasher_input.as_bytes()))
    }

    /// Lower the declarations into a frozen graph and output exporter.
    ///
    /// Explicit `depends_on` entries are merged with dependencies inferred
    /// from `${node.path}` references. Output declarations must be a single
    /// reference each.
    pub fn into_graph(&self) -> Result<(ResourceGraph, Exporter), PlatyError> {
        let mut builder = GraphBuilder::new();

        for decl in &self.resources {
            let inferred = binding::referenced_ids(&decl.properties);
            let deps: Vec<&str> = decl
                .depends_on
                .iter()
                .map(String::as_str)
                .chain(inferred.iter().map(String::as_str))
                .collect();

            builder.register(decl.kind.clone(), &decl.id, decl.properties.clone(), &deps)?;
        }

        let graph = builder.build();

        let mut exporter = Exporter::new();
        for (name, reference) in &self.outputs {
            let parsed =
                binding::parse_ref(reference).ok_or_else(|| PlatyError::ValidationError {
                    reason: format!(
                        "output '{}' must be a single ${{resource.path}} reference, got '{}'",
                        name, reference
                    ),
                })?;

            if !graph.contains(&parsed.node_id) {
                return Err(PlatyError::ReferenceNotFound {
                    reference: reference.clone(),
                    node_id: parsed.node_id,
                });
            }

            let node_id = intern(&parsed.node_id);
            let output = match parsed.path {
                Some(path) => OutputRef::at(node_id, path),
                None => OutputRef::new(node_id),
            };
            exporter.export(name, output)?;
        }

        Ok((graph, exporter))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const WEBAPP: &str = r#"
schema: platy/stack@0.1
provider: local

resources:
  - id: prod
    kind: namespace

  - id: web
    kind: deployment
    properties:
      namespace: ${prod.name}
      image: gcr.io/kuar-demo/kuard-amd64:blue
      port: 8080

  - id: web-svc
    kind: service
    properties:
      namespace: ${prod.name}
      target_port: ${web.port}
    depends_on: [web]

outputs:
  url: ${web-svc.url}
"#;

    #[test]
    fn load_parses_webapp_stack() {
        let stack = Stack::load(WEBAPP).unwrap();
        assert_eq!(stack.schema, SCHEMA_V01);
        assert_eq!(stack.provider.as_deref(), Some("local"));
        assert_eq!(stack.resources.len(), 3);
        assert_eq!(stack.outputs["url"], "${web-svc.url}");
    }

    #[test]
    fn load_rejects_wrong_schema_version() {
        let yaml = "schema: platy/stack@9.9\nresources: []";
        let err = Stack::load(yaml).unwrap_err();
        assert_eq!(err.code(), "PLATY-002");
    }

    #[test]
    fn load_rejects_unknown_top_level_field() {
        let yaml = "schema: platy/stack@0.1\nresources: []\nextra: true";
        let err = Stack::load(yaml).unwrap_err();
        assert_eq!(err.code(), "PLATY-005");
    }

    #[test]
    fn load_rejects_resource_without_kind() {
        let yaml = r#"
schema: platy/stack@0.1
resources:
  - id: web
"#;
        let err = Stack::load(yaml).unwrap_err();
        assert_eq!(err.code(), "PLATY-005");
        assert!(err.to_string().contains("kind"));
    }

    #[test]
    fn load_rejects_bad_resource_id_shape() {
        let yaml = r#"
schema: platy/stack@0.1
resources:
  - id: Bad_Id
    kind: deployment
"#;
        let err = Stack::load(yaml).unwrap_err();
        assert_eq!(err.code(), "PLATY-005");
    }

    #[test]
    fn into_graph_merges_explicit_and_inferred_deps() {
        let stack = Stack::load(WEBAPP).unwrap();
        let (graph, exporter) = stack.into_graph().unwrap();

        assert_eq!(graph.len(), 3);
        // web: inferred on prod
        assert_eq!(graph.dependencies("web").len(), 1);
        // web-svc: explicit web + inferred prod and web (deduplicated)
        let svc_deps: Vec<&str> = graph
            .dependencies("web-svc")
            .iter()
            .map(|d| d.as_ref())
            .collect();
        assert_eq!(svc_deps.len(), 2);
        assert!(svc_deps.contains(&"web"));
        assert!(svc_deps.contains(&"prod"));

        assert_eq!(exporter.len(), 1);
        assert_eq!(exporter.names().collect::<Vec<_>>(), vec!["url"]);
    }

    #[test]
    fn into_graph_rejects_duplicate_ids() {
        let yaml = r#"
schema: platy/stack@0.1
resources:
  - id: web
    kind: deployment
  - id: web
    kind: service
"#;
        let stack = Stack::load(yaml).unwrap();
        let err = stack.into_graph().unwrap_err();
        assert_eq!(err.code(), "PLATY-020");
    }

    #[test]
    fn into_graph_rejects_unknown_depends_on() {
        let yaml = r#"
schema: platy/stack@0.1
resources:
  - id: web
    kind: deployment
    depends_on: [ghost]
"#;
        let stack = Stack::load(yaml).unwrap();
        let err = stack.into_graph().unwrap_err();
        assert_eq!(err.code(), "PLATY-022");
    }

    #[test]
    fn into_graph_rejects_forward_reference() {
        // References resolve against already-declared resources only
        let yaml = r#"
schema: platy/stack@0.1
resources:
  - id: web
    kind: deployment
    properties:
      namespace: ${prod.name}
  - id: prod
    kind: namespace
"#;
        let stack = Stack::load(yaml).unwrap();
        let err = stack.into_graph().unwrap_err();
        assert_eq!(err.code(), "PLATY-022");
    }

    #[test]
    fn into_graph_rejects_non_reference_output() {
        let yaml = r#"
schema: platy/stack@0.1
resources:
  - id: web
    kind: deployment
outputs:
  url: http://hardcoded.example
"#;
        let stack = Stack::load(yaml).unwrap();
        let err = stack.into_graph().unwrap_err();
        assert_eq!(err.code(), "PLATY-004");
    }

    #[test]
    fn into_graph_rejects_output_to_unknown_resource() {
        let yaml = r#"
schema: platy/stack@0.1
resources:
  - id: web
    kind: deployment
outputs:
  url: ${ghost.url}
"#;
        let stack = Stack::load(yaml).unwrap();
        let err = stack.into_graph().unwrap_err();
        assert_eq!(err.code(), "PLATY-043");
    }

    #[test]
    fn compute_hash_is_deterministic() {
        let stack = Stack::load(WEBAPP).unwrap();
        let h1 = stack.compute_hash();
        let h2 = stack.compute_hash();
        assert_eq!(h1, h2);
        assert_eq!(h1.len(), 16);
    }

    #[test]
    fn compute_hash_changes_with_resources() {
        let a = Stack::load("schema: platy/stack@0.1\nresources: []").unwrap();
        let b = Stack::load(WEBAPP).unwrap();
        assert_ne!(a.compute_hash(), b.compute_hash());
    }

    #[test]
    fn default_properties_are_empty_object() {
        let yaml = r#"
schema: platy/stack@0.1
resources:
  - id: ns
    kind: namespace
"#;
        let stack = Stack::load(yaml).unwrap();
        assert!(stack.resources[0].properties.as_object().unwrap().is_empty());
        assert!(stack.resources[0].depends_on.is_empty());
        assert!(stack.provider.is_none());
    }
}
