//! Local provider - in-process resource materialization
//!
//! Materializes the production-app resource kinds without any cloud API:
//! deployments validate their required properties, services derive a stable
//! URL from the resource id. Useful for development, previews, and tests
//! that want realistic outputs.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::{json, Map, Value};
use tracing::debug;
use xxhash_rust::xxh3::xxh3_64;

use super::{Provider, ResourceRequest};
use crate::error::{PlatyError, Result};
use crate::graph::ResourceKind;

/// Default replica count for deployments
const DEFAULT_REPLICAS: u64 = 3;

/// Default service port
const DEFAULT_SERVICE_PORT: u64 = 80;

/// In-process provider with an internal registry of applied resources
#[derive(Debug, Default)]
pub struct LocalProvider {
    /// id → generation count, so re-applying a resource is an update
    registry: DashMap<Arc<str>, u64>,
}

impl LocalProvider {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_generation(&self, id: &Arc<str>) -> u64 {
        let mut entry = self.registry.entry(Arc::clone(id)).or_insert(0);
        *entry += 1;
        *entry
    }

    fn err(reason: impl Into<String>) -> PlatyError {
        PlatyError::Provider {
            provider: "local".to_string(),
            reason: reason.into(),
        }
    }

    fn materialize_namespace(id: &str, props: &Map<String, Value>) -> Value {
        json!({
            "name": id,
            "phase": "Active",
            "labels": props.get("labels").cloned().unwrap_or_else(|| json!({
                "app.production.instance/name": id,
            })),
        })
    }

    fn materialize_deployment(id: &str, props: &Map<String, Value>) -> Result<Value> {
        let image = props
            .get("image")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| Self::err("missing required property 'image'"))?;

        let port = props
            .get("port")
            .ok_or_else(|| Self::err("missing required property 'port'"))?
            .as_u64()
            .filter(|p| (1..=65535).contains(p))
            .ok_or_else(|| {
                Self::err("property 'port' must be an integer between 1 and 65535")
            })?;

        let replicas = props
            .get("replicas")
            .and_then(Value::as_u64)
            .unwrap_or(DEFAULT_REPLICAS);

        let mut outputs = json!({
            "name": id,
            "image": image,
            "port": port,
            "replicas": replicas,
            "available_replicas": replicas,
        });
        if let Some(namespace) = props.get("namespace") {
            outputs["namespace"] = namespace.clone();
        }
        Ok(outputs)
    }

    fn materialize_service(id: &str, props: &Map<String, Value>) -> Result<Value> {
        let port = match props.get("port") {
            None => DEFAULT_SERVICE_PORT,
            Some(v) => v
                .as_u64()
                .filter(|p| (1..=65535).contains(p))
                .ok_or_else(|| {
                    Self::err("property 'port' must be an integer between 1 and 65535")
                })?,
        };
        let target_port = match props.get("target_port") {
            None => port,
            Some(v) => v
                .as_u64()
                .filter(|p| (1..=65535).contains(p))
                .ok_or_else(|| {
                    Self::err("property 'target_port' must be an integer between 1 and 65535")
                })?,
        };

        // Stable address derived from the id, like an assigned cluster IP
        let hash = xxh3_64(id.as_bytes());
        let cluster_ip = format!("10.96.{}.{}", (hash >> 8) & 0xff, hash & 0xff);
        let hostname = format!("{}.local", id);

        let mut outputs = json!({
            "name": id,
            "port": port,
            "target_port": target_port,
            "cluster_ip": cluster_ip,
            "hostname": hostname,
            "url": format!("http://{}", hostname),
        });
        if let Some(namespace) = props.get("namespace") {
            outputs["namespace"] = namespace.clone();
        }
        Ok(outputs)
    }
}

#[async_trait]
impl Provider for LocalProvider {
    fn name(&self) -> &str {
        "local"
    }

    async fn create_or_update(&self, request: ResourceRequest) -> Result<Value> {
        let props = request
            .properties
            .as_object()
            .cloned()
            .unwrap_or_default();

        let mut outputs = match &request.kind {
            ResourceKind::Namespace => Self::materialize_namespace(&request.id, &props),
            ResourceKind::Deployment => Self::materialize_deployment(&request.id, &props)?,
            ResourceKind::Service => Self::materialize_service(&request.id, &props)?,
            // Unknown kinds pass their desired properties through
            ResourceKind::Custom(_) => Value::Object(props),
        };

        let generation = self.next_generation(&request.id);
        if let Some(map) = outputs.as_object_mut() {
            map.insert("generation".to_string(), json!(generation));
        }

        debug!(id = %request.id, kind = %request.kind, generation, "Materialized resource");
        Ok(outputs)
    }
}
