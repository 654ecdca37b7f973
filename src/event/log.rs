//! EventLog - append-only deployment audit trail
//!
//! - Event: envelope with id + timestamp + kind
//! - EventKind: deployment-, node-, and provider-level variants
//! - EventLog: thread-safe, append-only log

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Single event in the deployment execution log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Monotonic sequence ID (for ordering)
    pub id: u64,
    /// Time since deployment start (ms)
    pub timestamp_ms: u64,
    /// Event type and data
    pub kind: EventKind,
}

/// All possible event types
///
/// Uses Arc<str> for node_id fields to enable zero-cost cloning.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    // ═══════════════════════════════════════════
    // DEPLOYMENT LEVEL
    // ═══════════════════════════════════════════
    DeploymentStarted {
        node_count: usize,
        /// Unique id for this run
        run_id: String,
        engine_version: String,
    },
    DeploymentCompleted {
        succeeded: usize,
        failed: usize,
        skipped: usize,
        total_duration_ms: u64,
    },
    DeploymentFailed {
        error: String,
        failed_node: Option<Arc<str>>,
    },

    // ═══════════════════════════════════════════
    // NODE LEVEL
    // ═══════════════════════════════════════════
    NodeScheduled {
        node_id: Arc<str>,
        dependencies: Vec<Arc<str>>,
    },
    /// Node execution begins with fully substituted properties
    NodeStarted {
        node_id: Arc<str>,
        properties: Value,
    },
    NodeSucceeded {
        node_id: Arc<str>,
        outputs: Arc<Value>,
        duration_ms: u64,
    },
    NodeFailed {
        node_id: Arc<str>,
        error: String,
        duration_ms: u64,
    },
    NodeSkipped {
        node_id: Arc<str>,
        blocked_on: Arc<str>,
    },

    // ═══════════════════════════════════════════
    // PROVIDER LEVEL
    // ═══════════════════════════════════════════
    ProviderCalled {
        node_id: Arc<str>,
        provider: String,
        kind: String,
    },
    ProviderResponded {
        node_id: Arc<str>,
        output_len: usize,
    },

    // ═══════════════════════════════════════════
    // OUTPUT LEVEL
    // ═══════════════════════════════════════════
    OutputResolved {
        name: String,
        node_id: Arc<str>,
    },
    OutputUnresolved {
        name: String,
        node_id: Arc<str>,
        reason: String,
    },
}

impl EventKind {
    /// Extract node_id if event is node-related
    pub fn node_id(&self) -> Option<&str> {
        match self {
            Self::NodeScheduled { node_id, .. }
            | Self::NodeStarted { node_id, .. }
            | Self::NodeSucceeded { node_id, .. }
            | Self::NodeFailed { node_id, .. }
            | Self::NodeSkipped { node_id, .. }
            | Self::ProviderCalled { node_id, .. }
            | Self::ProviderResponded { node_id, .. }
            | Self::OutputResolved { node_id, .. }
            | Self::OutputUnresolved { node_id, .. } => Some(node_id),
            Self::DeploymentStarted { .. }
            | Self::DeploymentCompleted { .. }
            | Self::DeploymentFailed { .. } => None,
        }
    }

    /// Check if this is a deployment-level event
    pub fn is_deployment_event(&self) -> bool {
        matches!(
            self,
            Self::DeploymentStarted { .. }
                | Self::DeploymentCompleted { .. }
                | Self::DeploymentFailed { .. }
        )
    }
}

/// Thread-safe, append-only event log
#[derive(Clone)]
pub struct EventLog {
    events: Arc<RwLock<Vec<Event>>>,
    start_time: Instant,
    next_id: Arc<AtomicU64>,
}

impl EventLog {
    /// Create a new event log (call at deployment start)
    pub fn new() -> Self {
        Self {
            events: Arc::new(RwLock::new(Vec::new())),
            start_time: Instant::now(),
            next_id: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Emit an event (thread-safe, returns event ID)
    pub fn emit(&self, kind: EventKind) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let event = Event {
            id,
            timestamp_ms: self.start_time.elapsed().as_millis() as u64,
            kind,
        };

        self.events.write().push(event);
        id
    }

    /// Get all events (cloned - use `with_events` for zero-copy access)
    pub fn events(&self) -> Vec<Event> {
        self.events.read().clone()
    }

    /// Zero-copy access to events via callback
    ///
    /// Holds the read lock for the duration of the callback - keep it short.
    pub fn with_events<T>(&self, f: impl FnOnce(&[Event]) -> T) -> T {
        f(&self.events.read())
    }

    /// Filter events by node ID
    pub fn filter_node(&self, node_id: &str) -> Vec<Event> {
        self.with_events(|events| {
            events
                .iter()
                .filter(|e| e.kind.node_id() == Some(node_id))
                .cloned()
                .collect()
        })
    }

    /// Filter deployment-level events only
    pub fn deployment_events(&self) -> Vec<Event> {
        self.with_events(|events| {
            events
                .iter()
                .filter(|e| e.kind.is_deployment_event())
                .cloned()
                .collect()
        })
    }

    /// Serialize to JSON for persistence/debugging
    pub fn to_json(&self) -> Value {
        self.with_events(|events| serde_json::to_value(events).unwrap_or(Value::Null))
    }

    /// Number of events
    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventLog").field("len", &self.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn deployment_started(node_count: usize) -> EventKind {
        EventKind::DeploymentStarted {
            node_count,
            run_id: "run-test-123".to_string(),
            engine_version: "0.4.0".to_string(),
        }
    }

    #[test]
    fn eventkind_node_id_extraction() {
        let started = EventKind::NodeStarted {
            node_id: "web".into(),
            properties: json!({}),
        };
        assert_eq!(started.node_id(), Some("web"));

        let deployment = deployment_started(5);
        assert_eq!(deployment.node_id(), None);
    }

    #[test]
    fn eventkind_is_deployment_event() {
        assert!(deployment_started(3).is_deployment_event());
        assert!(EventKind::DeploymentCompleted {
            succeeded: 3,
            failed: 0,
            skipped: 0,
            total_duration_ms: 1000,
        }
        .is_deployment_event());
        assert!(!EventKind::NodeStarted {
            node_id: "n".into(),
            properties: json!({}),
        }
        .is_deployment_event());
    }

    #[test]
    fn eventkind_serializes_with_type_tag() {
        let kind = EventKind::NodeSucceeded {
            node_id: "web".into(),
            outputs: Arc::new(json!({"url": "http://web.local"})),
            duration_ms: 150,
        };

        let json = serde_json::to_value(&kind).unwrap();
        assert_eq!(json["type"], "node_succeeded");
        assert_eq!(json["node_id"], "web");
        assert_eq!(json["outputs"]["url"], "http://web.local");
    }

    #[test]
    fn eventkind_deserializes_from_tagged_json() {
        let json = json!({
            "type": "node_skipped",
            "node_id": "svc",
            "blocked_on": "web"
        });

        let kind: EventKind = serde_json::from_value(json).unwrap();
        assert_eq!(
            kind,
            EventKind::NodeSkipped {
                node_id: "svc".into(),
                blocked_on: "web".into(),
            }
        );
    }

    #[test]
    fn eventlog_emit_returns_monotonic_ids() {
        let log = EventLog::new();

        let id1 = log.emit(deployment_started(2));
        let id2 = log.emit(EventKind::NodeStarted {
            node_id: "a".into(),
            properties: json!({}),
        });

        assert_eq!(id1, 0);
        assert_eq!(id2, 1);
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn eventlog_filter_node_returns_only_matching() {
        let log = EventLog::new();
        log.emit(deployment_started(2));
        log.emit(EventKind::NodeStarted {
            node_id: "alpha".into(),
            properties: json!({}),
        });
        log.emit(EventKind::NodeStarted {
            node_id: "beta".into(),
            properties: json!({}),
        });
        log.emit(EventKind::NodeSucceeded {
            node_id: "alpha".into(),
            outputs: Arc::new(json!("done")),
            duration_ms: 100,
        });

        let alpha = log.filter_node("alpha");
        assert_eq!(alpha.len(), 2);
        assert!(alpha.iter().all(|e| e.kind.node_id() == Some("alpha")));
        assert_eq!(log.filter_node("beta").len(), 1);
    }

    #[test]
    fn eventlog_deployment_events_only() {
        let log = EventLog::new();
        log.emit(deployment_started(1));
        log.emit(EventKind::NodeStarted {
            node_id: "n".into(),
            properties: json!({}),
        });
        log.emit(EventKind::DeploymentCompleted {
            succeeded: 1,
            failed: 0,
            skipped: 0,
            total_duration_ms: 500,
        });

        let events = log.deployment_events();
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| e.kind.is_deployment_event()));
    }

    #[test]
    fn eventlog_to_json() {
        let log = EventLog::new();
        log.emit(EventKind::NodeSkipped {
            node_id: "svc".into(),
            blocked_on: "web".into(),
        });

        let json = log.to_json();
        assert!(json.is_array());
        assert_eq!(json[0]["kind"]["type"], "node_skipped");
    }

    #[test]
    fn eventlog_clone_shares_data() {
        let log = EventLog::new();
        log.emit(deployment_started(1));

        let cloned = log.clone();
        assert_eq!(cloned.len(), 1);

        log.emit(EventKind::NodeStarted {
            node_id: "n".into(),
            properties: json!({}),
        });
        assert_eq!(cloned.len(), 2);
    }

    #[test]
    fn eventlog_thread_safe_concurrent_emits() {
        use std::thread;

        let log = EventLog::new();

        let handles: Vec<_> = (0..10)
            .map(|i| {
                let log = log.clone();
                thread::spawn(move || {
                    log.emit(EventKind::NodeStarted {
                        node_id: Arc::from(format!("node{}", i)),
                        properties: json!({}),
                    })
                })
            })
            .collect();

        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(log.len(), 10);

        let mut ids: Vec<u64> = log.events().iter().map(|e| e.id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 10);
    }

    #[test]
    fn timestamps_never_decrease() {
        let log = EventLog::new();
        log.emit(deployment_started(1));
        std::thread::sleep(std::time::Duration::from_millis(5));
        log.emit(EventKind::NodeStarted {
            node_id: "n".into(),
            properties: json!({}),
        });

        let events = log.events();
        assert!(events[1].timestamp_ms >= events[0].timestamp_ms);
    }
}
