//! GraphBuilder - declaration-phase collection of resources and edges
//!
//! All structural errors are raised eagerly, before execution:
//! duplicate ids, unknown dependencies, and cycle-closing edges. A failed
//! call leaves the builder unchanged.

use std::collections::VecDeque;
use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};
use serde_json::Value;
use tracing::debug;

use crate::error::PlatyError;
use crate::graph::{validate_resource_id, DepVec, ResourceGraph, ResourceKind, ResourceNode};
use crate::util::intern;

/// Collects resource declarations into a [`ResourceGraph`]
#[derive(Default)]
pub struct GraphBuilder {
    nodes: FxHashMap<Arc<str>, ResourceNode>,
    order: Vec<Arc<str>>,
    /// id → dependents, kept for eager reachability checks
    dependents: FxHashMap<Arc<str>, DepVec>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// Register a resource with explicit dependencies.
    ///
    /// Fails with `DuplicateResource` if `id` is taken, `InvalidResourceId`
    /// for non-DNS-label ids, and `UnknownDependency` if a dependency has not
    /// been registered. The graph is left unchanged on error.
    pub fn register(
        &mut self,
        kind: ResourceKind,
        id: &str,
        properties: Value,
        deps: &[&str],
    ) -> Result<Arc<str>, PlatyError> {
        validate_resource_id(id)?;

        if self.nodes.contains_key(id) {
            return Err(PlatyError::DuplicateResource { id: id.to_string() });
        }

        // Validate all dependencies before mutating anything
        let mut dependencies = DepVec::new();
        let mut seen: FxHashSet<&str> = FxHashSet::default();
        for dep in deps {
            if !seen.insert(*dep) {
                continue;
            }
            let Some(existing) = self.nodes.get(*dep) else {
                return Err(PlatyError::UnknownDependency {
                    id: id.to_string(),
                    dep_id: dep.to_string(),
                });
            };
            dependencies.push(Arc::clone(&existing.id));
        }

        let id = intern(id);
        debug!(id = %id, kind = %kind, deps = dependencies.len(), "Registered resource");

        for dep in &dependencies {
            self.dependents
                .entry(Arc::clone(dep))
                .or_default()
                .push(Arc::clone(&id));
        }

        self.nodes.insert(
            Arc::clone(&id),
            ResourceNode {
                id: Arc::clone(&id),
                kind,
                properties,
                dependencies,
            },
        );
        self.order.push(Arc::clone(&id));

        Ok(id)
    }

    /// Add a dependency edge to an already-registered resource.
    ///
    /// Fails with `CycleDetected` if the edge would close a cycle, checked
    /// eagerly via reachability; the graph is left unchanged on error.
    pub fn add_dependency(&mut self, id: &str, dep: &str) -> Result<(), PlatyError> {
        if !self.nodes.contains_key(id) {
            return Err(PlatyError::ValidationError {
                reason: format!("resource '{}' is not registered", id),
            });
        }
        let Some(dep_node) = self.nodes.get(dep) else {
            return Err(PlatyError::UnknownDependency {
                id: id.to_string(),
                dep_id: dep.to_string(),
            });
        };
        let dep_id = Arc::clone(&dep_node.id);

        if id == dep {
            return Err(PlatyError::CycleDetected {
                cycle: format!("{} → {}", id, dep),
            });
        }

        // Edge dep → id closes a cycle iff dep is already reachable from id
        if let Some(path) = self.path_between(id, dep) {
            return Err(PlatyError::CycleDetected {
                cycle: format!("{} → {}", path.join(" → "), id),
            });
        }

        // No-op if the edge already exists
        let node = self.nodes.get_mut(id).expect("checked above");
        if node.dependencies.iter().any(|d| d.as_ref() == dep) {
            return Ok(());
        }
        let id_arc = Arc::clone(&node.id);
        node.dependencies.push(Arc::clone(&dep_id));
        self.dependents.entry(dep_id).or_default().push(id_arc);

        Ok(())
    }

    /// BFS over dependent edges, returning the path from → ... → to if any
    fn path_between(&self, from: &str, to: &str) -> Option<Vec<String>> {
        let mut parents: FxHashMap<&str, &str> = FxHashMap::default();
        let mut queue: VecDeque<&str> = VecDeque::new();
        queue.push_back(from);

        while let Some(current) = queue.pop_front() {
            if let Some(neighbors) = self.dependents.get(current) {
                for neighbor in neighbors {
                    let neighbor = neighbor.as_ref();
                    if parents.contains_key(neighbor) || neighbor == from {
                        continue;
                    }
                    parents.insert(neighbor, current);
                    if neighbor == to {
                        // Reconstruct from → ... → to
                        let mut path = vec![neighbor.to_string()];
                        let mut cursor = current;
                        while cursor != from {
                            path.push(cursor.to_string());
                            cursor = *parents.get(cursor)?;
                        }
                        path.push(from.to_string());
                        path.reverse();
                        return Some(path);
                    }
                    queue.push_back(neighbor);
                }
            }
        }

        None
    }

    /// Freeze the builder into an immutable [`ResourceGraph`]
    pub fn build(self) -> ResourceGraph {
        let capacity = self.order.len();
        let mut nodes: FxHashMap<Arc<str>, Arc<ResourceNode>> =
            FxHashMap::with_capacity_and_hasher(capacity, Default::default());
        let mut predecessors: FxHashMap<Arc<str>, DepVec> =
            FxHashMap::with_capacity_and_hasher(capacity, Default::default());
        let mut adjacency = self.dependents;

        for id in &self.order {
            adjacency.entry(Arc::clone(id)).or_default();
        }

        for (id, node) in self.nodes {
            predecessors.insert(Arc::clone(&id), node.dependencies.clone());
            nodes.insert(id, Arc::new(node));
        }

        ResourceGraph::new(nodes, self.order, adjacency, predecessors)
    }
}
