//! Mock provider for testing
//!
//! Returns configurable outputs without materializing anything.
//! Essential for unit tests and CI pipelines.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rustc_hash::{FxHashMap, FxHashSet};
use serde_json::{json, Value};

use super::{Provider, ResourceRequest};
use crate::error::{PlatyError, Result};

/// Mock provider with canned outputs and scripted failures
#[derive(Debug, Clone, Default)]
pub struct MockProvider {
    /// Canned outputs per resource id
    outputs: Arc<Mutex<FxHashMap<String, Value>>>,
    /// Resource ids that fail on create/update
    failures: Arc<Mutex<FxHashSet<String>>>,
    /// Track all requests made (for assertions)
    requests: Arc<Mutex<Vec<ResourceRequest>>>,
}

impl MockProvider {
    /// Create a new mock provider with default echo behavior
    pub fn new() -> Self {
        Self::default()
    }

    /// Set canned outputs for a resource id
    pub fn with_output(self, id: impl Into<String>, outputs: Value) -> Self {
        self.outputs.lock().unwrap().insert(id.into(), outputs);
        self
    }

    /// Script a failure for a resource id
    pub fn failing_on(self, id: impl Into<String>) -> Self {
        self.failures.lock().unwrap().insert(id.into());
        self
    }

    /// Get all requests made to this provider
    pub fn requests(&self) -> Vec<ResourceRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Get the last request made
    pub fn last_request(&self) -> Option<ResourceRequest> {
        self.requests.lock().unwrap().last().cloned()
    }

    /// Clear all recorded requests
    pub fn clear_requests(&self) {
        self.requests.lock().unwrap().clear();
    }
}

#[async_trait]
impl Provider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn create_or_update(&self, request: ResourceRequest) -> Result<Value> {
        // Record the request
        self.requests.lock().unwrap().push(request.clone());

        if self.failures.lock().unwrap().contains(request.id.as_ref()) {
            return Err(PlatyError::Provider {
                provider: "mock".to_string(),
                reason: format!("scripted failure for '{}'", request.id),
            });
        }

        // Canned outputs, or echo the request
        if let Some(canned) = self.outputs.lock().unwrap().get(request.id.as_ref()) {
            return Ok(canned.clone());
        }

        Ok(json!({
            "id": request.id.as_ref(),
            "kind": request.kind.as_str(),
            "properties": request.properties,
        }))
    }
}
