//! Deployment report - per-node terminal states and run summary

use std::sync::Arc;
use std::time::Duration;

use colored::Colorize;

use crate::engine::{NodeStatus, StateStore};
use crate::graph::{ResourceGraph, ResourceKind};

/// Terminal outcome of one resource
#[derive(Debug, Clone)]
pub struct NodeOutcome {
    pub id: Arc<str>,
    pub kind: ResourceKind,
    pub status: NodeStatus,
    pub duration: Duration,
}

/// Summary of a deployment run
///
/// Lists every node's terminal state in declaration order, plus any outputs
/// that could not be resolved.
#[derive(Debug, Default)]
pub struct DeploymentReport {
    pub outcomes: Vec<NodeOutcome>,
    /// Output names whose source node never succeeded: (name, node_id, status)
    pub unresolved_outputs: Vec<(String, String, String)>,
    pub duration: Duration,
}

impl DeploymentReport {
    /// Build a report from the graph (declaration order) and terminal states
    pub fn from_store(graph: &ResourceGraph, store: &StateStore, duration: Duration) -> Self {
        let outcomes = graph
            .nodes()
            .filter_map(|node| {
                let record = store.get(&node.id)?;
                Some(NodeOutcome {
                    id: Arc::clone(&node.id),
                    kind: node.kind.clone(),
                    status: record.status,
                    duration: record.duration,
                })
            })
            .collect();

        Self {
            outcomes,
            unresolved_outputs: Vec::new(),
            duration,
        }
    }

    pub fn succeeded(&self) -> usize {
        self.count(|s| matches!(s, NodeStatus::Succeeded))
    }

    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, NodeStatus::Failed(_)))
    }

    pub fn skipped(&self) -> usize {
        self.count(|s| matches!(s, NodeStatus::Skipped { .. }))
    }

    fn count(&self, pred: impl Fn(&NodeStatus) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(&o.status)).count()
    }

    /// A run is successful iff no node failed
    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    /// Render the final report to stdout
    pub fn print(&self) {
        println!();
        for outcome in &self.outcomes {
            let duration = format!("({:.1}s)", outcome.duration.as_secs_f32()).dimmed();
            match &outcome.status {
                NodeStatus::Succeeded => {
                    println!(
                        "  {} {} [{}] {}",
                        "✓".green(),
                        outcome.id,
                        outcome.kind,
                        duration
                    );
                }
                NodeStatus::Failed(error) => {
                    println!("  {} {} [{}] {}", "✗".red(), outcome.id, outcome.kind, duration);
                    println!("      {} {}", "Error:".red(), error);
                }
                NodeStatus::Skipped { blocked_on } => {
                    println!(
                        "  {} {} [{}] {}",
                        "↷".yellow(),
                        outcome.id,
                        outcome.kind,
                        format!("skipped, blocked on '{}'", blocked_on).dimmed()
                    );
                }
            }
        }

        for (name, node_id, status) in &self.unresolved_outputs {
            println!(
                "  {} output '{}' unresolved: resource '{}' {}",
                "!".yellow(),
                name,
                node_id,
                status
            );
        }

        println!(
            "\n  {} succeeded, {} failed, {} skipped {}",
            self.succeeded().to_string().green(),
            self.failed().to_string().red(),
            self.skipped().to_string().yellow(),
            format!("in {:.1}s", self.duration.as_secs_f32()).dimmed()
        );
    }
}
