//! Execution engine - dependency-ordered resource materialization
//!
//! - Ready-set scheduling: a resource becomes runnable only when every
//!   dependency has succeeded; all runnable resources are spawned together
//!   on a tokio JoinSet (no artificial parallelism limit)
//! - Skip propagation: resources downstream of a failure are marked
//!   `Skipped` before each scheduling round, to fixpoint
//! - Cancellation: cooperative via CancellationToken. In-flight provider
//!   calls finish, no new resources start

use std::sync::Arc;
use std::time::Instant;

use colored::Colorize;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument};
use uuid::Uuid;

use crate::binding;
use crate::engine::{DeploymentReport, NodeRecord, StateStore};
use crate::error::PlatyError;
use crate::event::{EventKind, EventLog};
use crate::graph::{ResourceGraph, ResourceNode};
use crate::provider::{Provider, ResourceRequest};
use crate::util::PROVIDER_TIMEOUT;

/// Deployment engine over a frozen resource graph
pub struct Engine {
    graph: ResourceGraph,
    store: StateStore,
    provider: Arc<dyn Provider>,
    event_log: EventLog,
    cancel: CancellationToken,
}

impl Engine {
    pub fn new(graph: ResourceGraph, provider: Arc<dyn Provider>) -> Self {
        Self {
            graph,
            store: StateStore::new(),
            provider,
            event_log: EventLog::new(),
            cancel: CancellationToken::new(),
        }
    }

    /// Get the event log for inspection/export
    pub fn event_log(&self) -> &EventLog {
        &self.event_log
    }

    /// Terminal node states (valid after `run`)
    pub fn store(&self) -> &StateStore {
        &self.store
    }

    pub fn graph(&self) -> &ResourceGraph {
        &self.graph
    }

    /// Request cancellation: in-flight resources finish, nothing new starts
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Resources whose dependencies have all succeeded
    fn ready_nodes(&self) -> Vec<Arc<ResourceNode>> {
        self.graph
            .nodes()
            .filter(|node| {
                if self.store.contains(&node.id) {
                    return false;
                }
                self.graph
                    .dependencies(&node.id)
                    .iter()
                    .all(|dep| self.store.is_succeeded(dep))
            })
            .cloned()
            .collect()
    }

    /// Check if every resource reached a terminal state
    fn all_terminal(&self) -> bool {
        self.graph.nodes().all(|n| self.store.contains(&n.id))
    }

    /// Mark resources blocked by a non-succeeded terminal dependency as
    /// Skipped. Runs to fixpoint so skips propagate transitively.
    fn mark_skipped(&self) -> usize {
        let mut marked = 0;
        loop {
            let mut progressed = false;

            for node in self.graph.nodes() {
                if self.store.contains(&node.id) {
                    continue;
                }
                let blocked_on = self.graph.dependencies(&node.id).iter().find(|dep| {
                    self.store
                        .get(dep)
                        .is_some_and(|record| !record.is_succeeded())
                });

                if let Some(dep) = blocked_on {
                    debug!(id = %node.id, blocked_on = %dep, "Skipping resource");
                    self.store
                        .insert(Arc::clone(&node.id), NodeRecord::skipped(Arc::clone(dep)));
                    self.event_log.emit(EventKind::NodeSkipped {
                        node_id: Arc::clone(&node.id),
                        blocked_on: Arc::clone(dep),
                    });
                    println!(
                        "  {} {} {}",
                        "[↷]".yellow(),
                        &node.id,
                        format!("skipped (blocked on '{}')", dep).dimmed()
                    );
                    marked += 1;
                    progressed = true;
                }
            }

            if !progressed {
                break;
            }
        }
        marked
    }

    /// Materialize a single resource against the provider
    #[instrument(skip(node, store, provider, event_log), fields(id = %node.id, kind = %node.kind))]
    async fn materialize(
        node: Arc<ResourceNode>,
        store: StateStore,
        provider: Arc<dyn Provider>,
        event_log: EventLog,
    ) -> (Arc<str>, NodeRecord) {
        let start = Instant::now();
        let node_id = Arc::clone(&node.id);

        // Substitute ${node.path} references against upstream outputs
        let properties = match binding::resolve_properties(&node.properties, &store) {
            Ok(p) => p,
            Err(e) => {
                let duration = start.elapsed();
                event_log.emit(EventKind::NodeFailed {
                    node_id: Arc::clone(&node_id),
                    error: e.to_string(),
                    duration_ms: duration.as_millis() as u64,
                });
                return (node_id, NodeRecord::failed(e.to_string(), duration));
            }
        };

        event_log.emit(EventKind::NodeStarted {
            node_id: Arc::clone(&node_id),
            properties: properties.clone(),
        });
        event_log.emit(EventKind::ProviderCalled {
            node_id: Arc::clone(&node_id),
            provider: provider.name().to_string(),
            kind: node.kind.to_string(),
        });

        let request = ResourceRequest {
            id: Arc::clone(&node_id),
            kind: node.kind.clone(),
            properties,
        };

        let result = tokio::time::timeout(PROVIDER_TIMEOUT, provider.create_or_update(request))
            .await
            .unwrap_or_else(|_| {
                Err(PlatyError::ProviderTimeout {
                    id: node_id.to_string(),
                    timeout_secs: PROVIDER_TIMEOUT.as_secs(),
                })
            });
        let duration = start.elapsed();

        match result {
            Ok(outputs) => {
                let record = NodeRecord::succeeded(outputs, duration);
                event_log.emit(EventKind::ProviderResponded {
                    node_id: Arc::clone(&node_id),
                    output_len: record.outputs_str().len(),
                });
                event_log.emit(EventKind::NodeSucceeded {
                    node_id: Arc::clone(&node_id),
                    outputs: Arc::clone(&record.outputs),
                    duration_ms: duration.as_millis() as u64,
                });
                (node_id, record)
            }
            Err(e) => {
                event_log.emit(EventKind::NodeFailed {
                    node_id: Arc::clone(&node_id),
                    error: e.to_string(),
                    duration_ms: duration.as_millis() as u64,
                });
                (node_id, NodeRecord::failed(e.to_string(), duration))
            }
        }
    }

    /// Main execution loop
    #[instrument(skip(self), fields(resources = self.graph.len()))]
    pub async fn run(&self) -> Result<DeploymentReport, PlatyError> {
        let run_start = Instant::now();
        info!("Starting deployment");

        // Fail fast on a malformed graph
        self.graph.detect_cycles()?;

        let total = self.graph.len();
        let mut completed = 0;

        self.event_log.emit(EventKind::DeploymentStarted {
            node_count: total,
            run_id: format!("run-{}", Uuid::new_v4()),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
        });

        println!(
            "{} Deploying {} resources with provider '{}'...\n",
            "→".cyan(),
            total,
            self.provider.name().cyan().bold()
        );

        loop {
            completed += self.mark_skipped();

            if self.all_terminal() {
                break;
            }

            let ready = self.ready_nodes();
            if ready.is_empty() {
                let reason = "deadlock: no resources runnable but deployment not complete";
                self.event_log.emit(EventKind::DeploymentFailed {
                    error: reason.to_string(),
                    failed_node: None,
                });
                return Err(PlatyError::Execution {
                    reason: reason.to_string(),
                });
            }

            if self.cancel.is_cancelled() {
                let remaining = total - self.store.len();
                let reason = format!("deployment canceled: {} resources not started", remaining);
                self.event_log.emit(EventKind::DeploymentFailed {
                    error: reason.clone(),
                    failed_node: None,
                });
                return Err(PlatyError::Execution { reason });
            }

            // Spawn all ready resources in parallel (tokio handles concurrency)
            let mut join_set = JoinSet::new();

            for node in ready {
                self.event_log.emit(EventKind::NodeScheduled {
                    node_id: Arc::clone(&node.id),
                    dependencies: self.graph.dependencies(&node.id).to_vec(),
                });

                println!(
                    "  {} {} {}",
                    "[⟳]".yellow(),
                    &node.id,
                    "applying...".dimmed()
                );

                let store = self.store.clone();
                let provider = Arc::clone(&self.provider);
                let event_log = self.event_log.clone();

                join_set.spawn(Self::materialize(node, store, provider, event_log));
            }

            let mut panicked = false;
            while let Some(result) = join_set.join_next().await {
                match result {
                    Ok((node_id, record)) => {
                        completed += 1;

                        let success = record.is_succeeded();
                        let status = if success {
                            format!("[{}/{}]", completed, total).green()
                        } else {
                            format!("[{}/{}]", completed, total).red()
                        };
                        let symbol = if success { "✓".green() } else { "✗".red() };
                        let duration_str =
                            format!("({:.1}s)", record.duration.as_secs_f32()).dimmed();

                        println!("  {} {} {} {}", status, &*node_id, symbol, duration_str);
                        if let Some(err) = record.error() {
                            println!("      {} {}", "Error:".red(), err);
                        }

                        self.store.insert(node_id, record);
                    }
                    Err(e) => {
                        // Let the rest of the batch finish, start nothing new
                        error!(error = %e, "Resource task panicked");
                        self.cancel.cancel();
                        panicked = true;
                    }
                }
            }

            if panicked {
                let reason = "resource task panicked".to_string();
                self.event_log.emit(EventKind::DeploymentFailed {
                    error: reason.clone(),
                    failed_node: None,
                });
                return Err(PlatyError::Execution { reason });
            }
        }

        let duration = run_start.elapsed();
        let report = DeploymentReport::from_store(&self.graph, &self.store, duration);

        self.event_log.emit(EventKind::DeploymentCompleted {
            succeeded: report.succeeded(),
            failed: report.failed(),
            skipped: report.skipped(),
            total_duration_ms: duration.as_millis() as u64,
        });

        Ok(report)
    }
}
