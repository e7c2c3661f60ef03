#![allow(dead_code, reason = "each test binary uses a different subset")]

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::anyhow;
use async_trait::async_trait;
use mediagraph_core::prelude::*;
use parking_lot::Mutex;
use serde_json::Value;

/// In-memory transport answering from a path → response table and
/// recording every request it sees.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    responses: Mutex<HashMap<String, Vec<Value>>>,
    requests: Mutex<Vec<QueryRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Answer `path` with `response`. Registering the same path several
    /// times queues the responses; the last one repeats.
    pub fn respond(&self, path: &str, response: Value) {
        self.responses
            .lock()
            .entry(path.to_string())
            .or_default()
            .push(response);
    }

    pub fn requests(&self) -> Vec<QueryRequest> {
        self.requests.lock().clone()
    }

    pub fn paths(&self) -> Vec<String> {
        self.requests.lock().iter().map(|r| r.path.clone()).collect()
    }

    pub fn server(self: &Arc<Self>) -> Server {
        Server::from_transport(self.clone())
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn query(&self, request: QueryRequest) -> anyhow::Result<Value> {
        let path = request.path.clone();
        self.requests.lock().push(request);
        let mut responses = self.responses.lock();
        let queue = responses
            .get_mut(&path)
            .ok_or_else(|| anyhow!("(404) not_found; {path}"))?;
        if queue.len() > 1 {
            Ok(queue.remove(0))
        } else {
            Ok(queue[0].clone())
        }
    }
}

/// Minimal video variant: typed, partial, with marker children.
#[derive(Debug)]
pub struct Video {
    pub title: Option<String>,
    pub year: Option<i64>,
    pub markers: Vec<Arc<Node<Marker>>>,
}

impl Fields for Video {
    const TYPE: Option<&'static str> = Some("movie");
    const INCLUDES: &'static [(&'static str, Flag)] = &[
        ("includeMarkers", Flag::Int(1)),
        ("includeExtras", Flag::Int(0)),
    ];
    const EXCLUDES: &'static [&'static str] = &["excludeElements"];

    fn load(payload: &Payload<'_>) -> Self {
        Self {
            title: payload.string("title"),
            year: payload.int("year"),
            markers: payload.children::<Marker>(),
        }
    }

    fn field(&self, name: &str) -> Option<Value> {
        match name {
            "title" => self.title.clone().map(Value::from),
            "year" => self.year.map(Value::from),
            _ => None,
        }
    }
}

/// Child variant with no key of its own.
#[derive(Debug)]
pub struct Marker {
    pub kind: Option<String>,
    pub start: Option<i64>,
}

impl Fields for Marker {
    const TAG: &'static str = "Marker";

    fn load(payload: &Payload<'_>) -> Self {
        Self {
            kind: payload.string("type"),
            start: payload.int("startTimeOffset"),
        }
    }

    fn field(&self, name: &str) -> Option<Value> {
        match name {
            "type" => self.kind.clone().map(Value::from),
            "startTimeOffset" => self.start.map(Value::from),
            _ => None,
        }
    }
}

/// Untyped container variant read from `Directory`.
#[derive(Debug)]
pub struct Folder {
    pub title: Option<String>,
}

impl Fields for Folder {
    const TAG: &'static str = "Directory";

    fn load(payload: &Payload<'_>) -> Self {
        Self {
            title: payload.string("title"),
        }
    }

    fn field(&self, name: &str) -> Option<Value> {
        match name {
            "title" => self.title.clone().map(Value::from),
            _ => None,
        }
    }
}
