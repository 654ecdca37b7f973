//! Declaration context and deployment entry points
//!
//! The API is explicitly two-phase: `declare` runs a program callback that
//! registers resources and exports outputs, returning a frozen graph; the
//! engine then executes it separately. `deploy` composes both phases and is
//! the single entry point most callers want.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;

use crate::binding;
use crate::engine::{DeploymentReport, Engine};
use crate::error::PlatyError;
use crate::graph::{GraphBuilder, ResourceGraph, ResourceKind};
use crate::outputs::{Exporter, OutputRef};
use crate::provider::Provider;

/// Handle to a registered resource, for building output references
#[derive(Debug, Clone)]
pub struct ResourceHandle {
    id: Arc<str>,
}

impl ResourceHandle {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Reference a path inside this resource's resolved outputs
    pub fn output(&self, path: impl Into<String>) -> OutputRef {
        OutputRef::at(Arc::clone(&self.id), path)
    }

    /// Reference this resource's entire resolved outputs
    pub fn outputs(&self) -> OutputRef {
        OutputRef::new(Arc::clone(&self.id))
    }
}

/// Context handed to a declaration program: `register` + `export`
#[derive(Default)]
pub struct StackContext {
    builder: GraphBuilder,
    exporter: Exporter,
}

impl StackContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a resource. Dependencies are inferred from `${node.path}`
    /// references in the properties.
    pub fn register(
        &mut self,
        kind: impl Into<ResourceKind>,
        id: &str,
        properties: Value,
    ) -> Result<ResourceHandle, PlatyError> {
        self.register_with_deps(kind, id, properties, &[])
    }

    /// Register a resource with explicit dependencies, merged with the
    /// references inferred from its properties.
    pub fn register_with_deps(
        &mut self,
        kind: impl Into<ResourceKind>,
        id: &str,
        properties: Value,
        deps: &[&str],
    ) -> Result<ResourceHandle, PlatyError> {
        let inferred = binding::referenced_ids(&properties);
        let mut merged: Vec<&str> = deps.to_vec();
        merged.extend(inferred.iter().map(String::as_str));

        let id = self.builder.register(kind.into(), id, properties, &merged)?;
        Ok(ResourceHandle { id })
    }

    /// Export a named output reference
    pub fn export(&mut self, name: &str, output: OutputRef) -> Result<(), PlatyError> {
        self.exporter.export(name, output)
    }

    fn finish(self) -> (ResourceGraph, Exporter) {
        (self.builder.build(), self.exporter)
    }
}

/// Declaration phase: run the program, return the frozen graph and exporter
pub fn declare<F>(program: F) -> Result<(ResourceGraph, Exporter), PlatyError>
where
    F: FnOnce(&mut StackContext) -> Result<(), PlatyError>,
{
    let mut ctx = StackContext::new();
    program(&mut ctx)?;
    Ok(ctx.finish())
}

/// Result of a full deployment: the run report plus collected outputs
#[derive(Debug)]
pub struct Deployment {
    pub report: DeploymentReport,
    /// Outputs whose source resource succeeded
    pub outputs: BTreeMap<String, Value>,
}

impl Deployment {
    /// Exit-code rule: success iff no resource failed
    pub fn is_success(&self) -> bool {
        self.report.is_success()
    }
}

/// Execute a declaration program against a provider and collect outputs.
///
/// Declaration errors (duplicate ids, cycles, unknown dependencies) abort
/// before execution. Provider failures are localized per resource and
/// summarized in the returned report.
pub async fn deploy<F>(provider: Arc<dyn Provider>, program: F) -> Result<Deployment, PlatyError>
where
    F: FnOnce(&mut StackContext) -> Result<(), PlatyError>,
{
    let (graph, exporter) = declare(program)?;

    let engine = Engine::new(graph, provider);
    let mut report = engine.run().await?;

    let (outputs, unresolved) = exporter.collect_partial(engine.store());
    report.unresolved_outputs = unresolved;

    Ok(Deployment { report, outputs })
}
