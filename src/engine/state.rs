//! StateStore - per-node resolution state with DashMap
//!
//! The only shared mutable structure in the engine: one writer per node id,
//! readers at export and report time. Lock-free concurrent access.

use std::borrow::Cow;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use serde_json::Value;

use crate::util::path;

/// Terminal state of a resource node
#[derive(Debug, Clone)]
pub enum NodeStatus {
    /// Provider resolved the desired state
    Succeeded,
    /// Provider (or reference resolution) failed
    Failed(String),
    /// Not executed: a transitive dependency failed or was skipped
    Skipped {
        /// The direct dependency that blocked this node
        blocked_on: Arc<str>,
    },
}

impl NodeStatus {
    pub fn label(&self) -> &'static str {
        match self {
            NodeStatus::Succeeded => "succeeded",
            NodeStatus::Failed(_) => "failed",
            NodeStatus::Skipped { .. } => "skipped",
        }
    }
}

/// Terminal record of one node's execution
#[derive(Debug, Clone)]
pub struct NodeRecord {
    /// Resolved outputs (Arc for O(1) cloning of large JSON structures)
    pub outputs: Arc<Value>,
    /// Time spent in the provider (zero for skipped nodes)
    pub duration: Duration,
    /// Terminal status
    pub status: NodeStatus,
}

impl NodeRecord {
    /// Record a successful resolution
    pub fn succeeded(outputs: impl Into<Value>, duration: Duration) -> Self {
        Self {
            outputs: Arc::new(outputs.into()),
            duration,
            status: NodeStatus::Succeeded,
        }
    }

    /// Record a failure
    pub fn failed(error: impl Into<String>, duration: Duration) -> Self {
        Self {
            outputs: Arc::new(Value::Null),
            duration,
            status: NodeStatus::Failed(error.into()),
        }
    }

    /// Record a skip caused by `blocked_on`
    pub fn skipped(blocked_on: Arc<str>) -> Self {
        Self {
            outputs: Arc::new(Value::Null),
            duration: Duration::ZERO,
            status: NodeStatus::Skipped { blocked_on },
        }
    }

    pub fn is_succeeded(&self) -> bool {
        matches!(self.status, NodeStatus::Succeeded)
    }

    /// Get error message if failed
    pub fn error(&self) -> Option<&str> {
        match &self.status {
            NodeStatus::Failed(e) => Some(e),
            _ => None,
        }
    }

    /// Get outputs as string (zero-copy for String values)
    pub fn outputs_str(&self) -> Cow<'_, str> {
        match &*self.outputs {
            Value::String(s) => Cow::Borrowed(s),
            other => Cow::Owned(other.to_string()),
        }
    }
}

/// Thread-safe storage for node records (lock-free)
///
/// Uses Arc<str> keys shared with the graph and the event log.
#[derive(Clone, Default)]
pub struct StateStore {
    records: Arc<DashMap<Arc<str>, NodeRecord>>,
}

impl StateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node record (accepts Arc<str> for zero-cost key reuse)
    pub fn insert(&self, node_id: Arc<str>, record: NodeRecord) {
        self.records.insert(node_id, record);
    }

    /// Get a node record
    pub fn get(&self, node_id: &str) -> Option<NodeRecord> {
        self.records.get(node_id).map(|r| r.value().clone())
    }

    /// Check if a node has reached a terminal state
    pub fn contains(&self, node_id: &str) -> bool {
        self.records.contains_key(node_id)
    }

    /// Check if a node succeeded
    pub fn is_succeeded(&self, node_id: &str) -> bool {
        self.get(node_id).is_some_and(|r| r.is_succeeded())
    }

    /// Resolved outputs of a succeeded node (Arc for O(1) cloning)
    ///
    /// Returns `None` for failed, skipped, or unknown nodes: only a
    /// `Succeeded` node has resolvable outputs.
    pub fn outputs(&self, node_id: &str) -> Option<Arc<Value>> {
        self.records.get(node_id).and_then(|r| {
            r.is_succeeded().then(|| Arc::clone(&r.outputs))
        })
    }

    /// Number of terminal nodes
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Resolve a dot-separated path rooted at a node id
    /// (e.g., "web-svc.status.url")
    pub fn resolve_path(&self, full_path: &str) -> Option<Value> {
        let mut parts = full_path.splitn(2, '.');
        let node_id = parts.next()?;

        let outputs = self.outputs(node_id)?;

        let Some(remaining) = parts.next() else {
            return Some((*outputs).clone());
        };

        path::resolve(&outputs, remaining).ok().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::intern;
    use serde_json::json;

    #[test]
    fn insert_and_get_record() {
        let store = StateStore::new();
        store.insert(
            intern("web"),
            NodeRecord::succeeded(json!({"port": 8080}), Duration::from_secs(1)),
        );

        let record = store.get("web").unwrap();
        assert!(record.is_succeeded());
        assert_eq!(record.outputs["port"], 8080);
    }

    #[test]
    fn failed_record() {
        let store = StateStore::new();
        store.insert(
            intern("db"),
            NodeRecord::failed("connection refused", Duration::from_secs(2)),
        );

        let record = store.get("db").unwrap();
        assert!(!record.is_succeeded());
        assert_eq!(record.error(), Some("connection refused"));
        assert_eq!(record.status.label(), "failed");
    }

    #[test]
    fn skipped_record_has_zero_duration() {
        let record = NodeRecord::skipped(intern("db"));
        assert_eq!(record.duration, Duration::ZERO);
        assert!(record.error().is_none());
        assert_eq!(record.status.label(), "skipped");
        match record.status {
            NodeStatus::Skipped { blocked_on } => assert_eq!(blocked_on.as_ref(), "db"),
            other => panic!("expected Skipped, got {:?}", other),
        }
    }

    #[test]
    fn outputs_only_for_succeeded() {
        let store = StateStore::new();
        store.insert(
            intern("ok"),
            NodeRecord::succeeded(json!({"a": 1}), Duration::ZERO),
        );
        store.insert(intern("bad"), NodeRecord::failed("boom", Duration::ZERO));
        store.insert(intern("skip"), NodeRecord::skipped(intern("bad")));

        assert!(store.outputs("ok").is_some());
        assert!(store.outputs("bad").is_none());
        assert!(store.outputs("skip").is_none());
        assert!(store.outputs("ghost").is_none());
    }

    #[test]
    fn resolve_path_nested() {
        let store = StateStore::new();
        store.insert(
            intern("svc"),
            NodeRecord::succeeded(
                json!({"status": {"url": "http://svc.local"}, "ports": [80, 443]}),
                Duration::from_secs(1),
            ),
        );

        assert_eq!(
            store.resolve_path("svc.status.url").unwrap(),
            "http://svc.local"
        );
        assert_eq!(store.resolve_path("svc.ports.1").unwrap(), 443);
        assert!(store.resolve_path("svc.missing").is_none());
        assert!(store.resolve_path("ghost.url").is_none());
    }

    #[test]
    fn resolve_node_only_returns_full_outputs() {
        let store = StateStore::new();
        store.insert(
            intern("ns"),
            NodeRecord::succeeded(json!({"name": "prod"}), Duration::ZERO),
        );

        assert_eq!(store.resolve_path("ns").unwrap(), json!({"name": "prod"}));
    }

    #[test]
    fn outputs_str_cow_borrowed_for_strings() {
        let record = NodeRecord::succeeded(Value::String("hello".into()), Duration::ZERO);
        let cow = record.outputs_str();
        assert!(matches!(cow, Cow::Borrowed(_)));
        assert_eq!(&*cow, "hello");
    }

    #[test]
    fn concurrent_writes_all_stored() {
        use std::thread;

        let store = StateStore::new();

        let handles: Vec<_> = (0..100)
            .map(|i| {
                let store = store.clone();
                thread::spawn(move || {
                    store.insert(
                        intern(&format!("node-{}", i)),
                        NodeRecord::succeeded(json!({"index": i}), Duration::from_millis(i)),
                    );
                })
            })
            .collect();

        for h in handles {
            h.join().unwrap();
        }

        for i in 0..100 {
            assert!(store.contains(&format!("node-{}", i)));
        }
    }

    #[test]
    fn clone_is_shallow() {
        let store = StateStore::new();
        let cloned = store.clone();

        store.insert(
            intern("late"),
            NodeRecord::succeeded(json!(1), Duration::ZERO),
        );
        assert!(cloned.contains("late"));
    }
}
