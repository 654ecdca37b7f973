//! Resource node types - kind tags and declared desired state

use std::fmt;
use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::PlatyError;
use crate::graph::DepVec;
use crate::util::MAX_RESOURCE_ID_LEN;

/// DNS-1123 label: lowercase alphanumeric, hyphens inside
static RESOURCE_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z]([a-z0-9-]*[a-z0-9])?$").unwrap());

/// Kind tag of a declared resource
///
/// The known kinds carry provider semantics (required properties, derived
/// outputs); anything else flows through as an opaque custom kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ResourceKind {
    Namespace,
    Deployment,
    Service,
    Custom(String),
}

impl ResourceKind {
    pub fn as_str(&self) -> &str {
        match self {
            ResourceKind::Namespace => "namespace",
            ResourceKind::Deployment => "deployment",
            ResourceKind::Service => "service",
            ResourceKind::Custom(tag) => tag,
        }
    }
}

impl From<String> for ResourceKind {
    fn from(s: String) -> Self {
        match s.as_str() {
            "namespace" => ResourceKind::Namespace,
            "deployment" => ResourceKind::Deployment,
            "service" => ResourceKind::Service,
            _ => ResourceKind::Custom(s),
        }
    }
}

impl From<&str> for ResourceKind {
    fn from(s: &str) -> Self {
        ResourceKind::from(s.to_string())
    }
}

impl From<ResourceKind> for String {
    fn from(kind: ResourceKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One declared infrastructure resource
#[derive(Debug, Clone)]
pub struct ResourceNode {
    /// Unique id (DNS label, interned)
    pub id: Arc<str>,
    /// Kind tag driving provider semantics
    pub kind: ResourceKind,
    /// Desired properties (JSON object; may contain `${node.path}` refs)
    pub properties: Value,
    /// Ids of resources that must succeed before this one runs
    pub dependencies: DepVec,
}

/// Validate a resource id (DNS-1123 label, max 63 chars)
pub fn validate_resource_id(id: &str) -> Result<(), PlatyError> {
    if id.is_empty() {
        return Err(PlatyError::InvalidResourceId {
            id: id.to_string(),
            reason: "id is empty".to_string(),
        });
    }
    if id.len() > MAX_RESOURCE_ID_LEN {
        return Err(PlatyError::InvalidResourceId {
            id: id.to_string(),
            reason: format!("longer than {} characters", MAX_RESOURCE_ID_LEN),
        });
    }
    if !RESOURCE_ID_RE.is_match(id) {
        return Err(PlatyError::InvalidResourceId {
            id: id.to_string(),
            reason: "must be a DNS label: lowercase letters, digits, hyphens".to_string(),
        });
    }
    Ok(())
}
