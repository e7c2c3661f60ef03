//! HTTP side of mediagraph.
//!
//! Loads a [`ClientConfig`], builds an [`HttpTransport`] from it and hands
//! back a [`Server`] with every catalog variant registered, ready for the
//! typed fetchers of `mediagraph-core` and the accessors of
//! `mediagraph-model`.

/// Layered client configuration.
pub mod settings;
/// Errors raised by the HTTP transport.
pub mod error;
/// reqwest-backed transport.
pub mod http;
/// Logging setup.
pub mod telemetry;

use mediagraph_core::Server;

pub use settings::ClientConfig;
pub use error::HttpError;
pub use http::HttpTransport;

/// Connect to the server described by `config`.
pub fn connect(config: &ClientConfig) -> anyhow::Result<Server> {
    let transport = HttpTransport::new(config)?;
    Ok(Server::new(transport).with_registry(mediagraph_model::registry()))
}
