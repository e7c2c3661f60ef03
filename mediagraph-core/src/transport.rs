//! The injected network capability.
//!
//! The engine never speaks HTTP itself. Everything it needs from the remote
//! server goes through [`Transport::query`], which the caller supplies (the
//! `mediagraph-client` crate ships a reqwest implementation).

use std::fmt;

use async_trait::async_trait;
use serde_json::Value;

/// Request method understood by the catalog API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Method {
    #[default]
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One round trip: a server-relative path, a method and extra headers.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QueryRequest {
    pub path: String,
    pub method: Method,
    pub headers: Vec<(String, String)>,
}

impl QueryRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(path, Method::Get)
    }

    pub fn new(path: impl Into<String>, method: Method) -> Self {
        Self {
            path: path.into(),
            method,
            headers: Vec::new(),
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// Source of response envelopes.
///
/// Implementations own headers, auth, retries and timeouts. Errors are
/// opaque to the engine and surface unchanged. An empty response body is
/// reported as [`Value::Null`].
#[async_trait]
pub trait Transport: Send + Sync + fmt::Debug {
    async fn query(&self, request: QueryRequest) -> anyhow::Result<Value>;
}
