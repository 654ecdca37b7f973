//! Resource graph - declaration-time DAG of infrastructure resources
//!
//! - [`ResourceNode`]: one declared resource (id, kind, desired properties)
//! - [`GraphBuilder`]: collects nodes and edges, rejects duplicates and cycles
//! - [`ResourceGraph`]: frozen graph handed to the execution engine

mod builder;
mod node;
#[allow(clippy::module_inception)]
mod graph;

pub use builder::GraphBuilder;
pub use graph::{DepVec, ResourceGraph};
pub use node::{validate_resource_id, ResourceKind, ResourceNode};
