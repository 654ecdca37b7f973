//! # Provider Abstraction Layer
//!
//! Trait and implementations for resource providers.
//!
//! ## Overview
//!
//! A provider materializes a resource's desired state and returns its
//! resolved outputs:
//!
//! ```rust,ignore
//! #[async_trait]
//! pub trait Provider: Send + Sync {
//!     fn name(&self) -> &str;
//!     async fn create_or_update(&self, request: ResourceRequest) -> Result<Value>;
//!     fn is_available(&self) -> bool;
//! }
//! ```
//!
//! ## Available Providers
//!
//! | Provider | Use Case | Features |
//! |----------|----------|----------|
//! | `local`  | Development | In-process materialization, derived service URLs |
//! | `mock`   | Testing | Canned outputs, scripted failures, request recording |
//!
//! ## Creating Providers
//!
//! Use [`create_provider`] to instantiate a provider by name:
//!
//! ```rust
//! use platy::provider::create_provider;
//!
//! assert!(create_provider("local").is_ok());
//! assert!(create_provider("mock").is_ok());
//! assert!(create_provider("invalid").is_err());
//! ```

mod local;
mod mock;

pub use local::LocalProvider;
pub use mock::MockProvider;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{PlatyError, Result};
use crate::graph::ResourceKind;

/// One create/update request handed to a provider
#[derive(Debug, Clone)]
pub struct ResourceRequest {
    pub id: Arc<str>,
    pub kind: ResourceKind,
    /// Desired properties with all `${...}` references already substituted
    pub properties: Value,
}

/// External collaborator that materializes desired state
#[async_trait]
pub trait Provider: Send + Sync + std::fmt::Debug {
    /// Provider name (matches the factory name)
    fn name(&self) -> &str;

    /// Create or update one resource, returning its resolved outputs.
    ///
    /// Failures are per-resource: the engine records them without aborting
    /// independent branches.
    async fn create_or_update(&self, request: ResourceRequest) -> Result<Value>;

    /// Check if the provider can be used right now
    fn is_available(&self) -> bool {
        true
    }
}

/// Instantiate a provider by name
pub fn create_provider(name: &str) -> Result<Arc<dyn Provider>> {
    match name {
        "local" => Ok(Arc::new(LocalProvider::new())),
        "mock" => Ok(Arc::new(MockProvider::new())),
        _ => Err(PlatyError::ProviderNotConfigured {
            provider: name.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factory_creates_known_providers() {
        assert_eq!(create_provider("local").unwrap().name(), "local");
        assert_eq!(create_provider("mock").unwrap().name(), "mock");
    }

    #[test]
    fn factory_rejects_unknown_provider() {
        let err = create_provider("aws").unwrap_err();
        assert_eq!(err.code(), "PLATY-030");
        assert!(err.to_string().contains("aws"));
    }

    #[test]
    fn providers_report_available() {
        assert!(create_provider("local").unwrap().is_available());
        assert!(create_provider("mock").unwrap().is_available());
    }
}
