use thiserror::Error;

/// Failures of the HTTP transport. Surfaced to the engine wrapped in
/// `anyhow::Error`; use `downcast_ref::<HttpError>()` to inspect them.
#[derive(Debug, Error)]
pub enum HttpError {
    #[error("({status}) {reason}; {method} {path}")]
    Status {
        status: u16,
        reason: String,
        method: String,
        path: String,
        body: String,
    },

    #[error("invalid JSON from {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid header {name}: {value}")]
    InvalidHeader { name: String, value: String },
}

impl HttpError {
    /// HTTP status of a non-success response.
    pub fn status(&self) -> Option<u16> {
        match self {
            HttpError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The server answered 404.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}
