#![allow(dead_code, reason = "each test binary uses a different subset")]

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::anyhow;
use async_trait::async_trait;
use mediagraph_core::prelude::*;
use parking_lot::Mutex;
use serde_json::Value;

/// Canned catalog server keyed by request path.
#[derive(Debug, Default)]
pub struct FakeCatalog {
    responses: Mutex<HashMap<String, Value>>,
    requests: Mutex<Vec<QueryRequest>>,
}

impl FakeCatalog {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, path: &str, response: Value) -> &Self {
        self.responses.lock().insert(path.to_string(), response);
        self
    }

    pub fn requests(&self) -> Vec<QueryRequest> {
        self.requests.lock().clone()
    }

    pub fn paths(&self) -> Vec<String> {
        self.requests.lock().iter().map(|r| r.path.clone()).collect()
    }

    /// Server with every catalog variant registered.
    pub fn server(self: &Arc<Self>) -> Server {
        Server::from_transport(self.clone()).with_registry(mediagraph_model::registry())
    }
}

#[async_trait]
impl Transport for FakeCatalog {
    async fn query(&self, request: QueryRequest) -> anyhow::Result<Value> {
        let path = request.path.clone();
        self.requests.lock().push(request);
        self.responses
            .lock()
            .get(&path)
            .cloned()
            .ok_or_else(|| anyhow!("(404) not_found; {path}"))
    }
}
