use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// A lookup that must yield exactly one item matched nothing.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The operation cannot run against this object in its current state.
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    /// Failure reported by the injected transport, passed through verbatim.
    #[error(transparent)]
    Transport(#[from] anyhow::Error),
}

impl Error {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
