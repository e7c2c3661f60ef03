use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::error::Result;
use crate::registry::Registry;
use crate::transport::{QueryRequest, Transport};

/// Handle to one remote catalog server.
///
/// Cheap to clone; every materialized node keeps one so it can reload
/// itself. Holds the injected transport and the registry used to build
/// nodes from untyped payloads.
#[derive(Clone)]
pub struct Server {
    transport: Arc<dyn Transport>,
    registry: Arc<Registry>,
}

impl fmt::Debug for Server {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Server")
            .field("transport", &self.transport)
            .field("registered_variants", &self.registry.len())
            .finish()
    }
}

impl Server {
    pub fn new(transport: impl Transport + 'static) -> Self {
        Self::from_transport(Arc::new(transport))
    }

    pub fn from_transport(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            registry: Arc::new(Registry::new()),
        }
    }

    /// Replace the variant registry used by the `*_dyn` fetchers.
    pub fn with_registry(mut self, registry: Registry) -> Self {
        self.registry = Arc::new(registry);
        self
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// Issue one round trip. Transport failures pass through unchanged.
    pub async fn query(&self, request: QueryRequest) -> Result<Value> {
        debug!(path = %request.path, method = %request.method, "catalog query");
        Ok(self.transport.query(request).await?)
    }

    /// `GET path`.
    pub async fn get(&self, path: &str) -> Result<Value> {
        self.query(QueryRequest::get(path)).await
    }
}
