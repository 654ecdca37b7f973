//! Execution engine - dependency-ordered materialization of the graph
//!
//! - [`Engine`]: ready-set scheduler over a frozen [`crate::graph::ResourceGraph`]
//! - [`StateStore`]: per-node terminal states (the only shared mutable state)
//! - [`StackContext`] / [`deploy`]: declaration context and entry points
//! - [`DeploymentReport`]: per-node outcomes and run summary

mod context;
mod report;
mod runner;
mod state;

pub use context::{declare, deploy, Deployment, ResourceHandle, StackContext};
pub use report::{DeploymentReport, NodeOutcome};
pub use runner::Engine;
pub use state::{NodeRecord, NodeStatus, StateStore};
