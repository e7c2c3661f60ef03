//! Client configuration.
//!
//! Sources, lowest precedence first: built-in defaults, an optional TOML
//! file, then `MEDIAGRAPH_*` environment variables
//! (`MEDIAGRAPH_BASE_URL`, `MEDIAGRAPH_TOKEN`, `MEDIAGRAPH_TIMEOUT_SECS`, ...).

use std::fmt;
use std::path::Path;
use std::time::Duration;

use ::config::{Config, Environment, File, FileFormat};
use anyhow::{Context, ensure};
use mediagraph_core::Paging;
use serde::Deserialize;
use tracing::warn;
use uuid::Uuid;

/// Prefix of the environment variables read by [`ClientConfig::load`].
pub const ENV_PREFIX: &str = "MEDIAGRAPH";

/// Defaults applied before any file or environment source.
pub const DEFAULT_BASE_URL: &str = "http://localhost:32400";
#[allow(missing_docs)]
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
#[allow(missing_docs)]
pub const DEFAULT_PRODUCT: &str = "mediagraph";
#[allow(missing_docs)]
pub const DEFAULT_PAGE_SIZE: u64 = 100;

/// Connection settings for one catalog server.
#[derive(Clone, Deserialize)]
pub struct ClientConfig {
    /// Server root, e.g. `http://localhost:32400`.
    pub base_url: String,
    /// Sent as `X-Plex-Token`; requests go out unauthenticated without it.
    pub token: Option<String>,
    /// Whole-request timeout.
    pub timeout_secs: u64,
    /// Stable per-install identifier sent as `X-Plex-Client-Identifier`.
    #[serde(default = "new_client_identifier")]
    pub client_identifier: String,
    /// Sent as `X-Plex-Product`.
    pub product: String,
    /// Page size of paged listings.
    pub page_size: u64,
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("has_token", &self.token.is_some())
            .field("timeout_secs", &self.timeout_secs)
            .field("client_identifier", &self.client_identifier)
            .field("product", &self.product)
            .field("page_size", &self.page_size)
            .finish()
    }
}

fn new_client_identifier() -> String {
    Uuid::new_v4().to_string()
}

impl ClientConfig {
    /// Load from defaults, the optional file at `path` and the environment.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        Self::load_with_env(path, Environment::with_prefix(ENV_PREFIX))
    }

    /// [`ClientConfig::load`] with an explicit environment source.
    pub fn load_with_env(path: Option<&Path>, env: Environment) -> anyhow::Result<Self> {
        let mut builder = Config::builder()
            .set_default("base_url", DEFAULT_BASE_URL)?
            .set_default("timeout_secs", DEFAULT_TIMEOUT_SECS)?
            .set_default("product", DEFAULT_PRODUCT)?
            .set_default("page_size", DEFAULT_PAGE_SIZE)?;

        if let Some(path) = path {
            let name = path
                .to_str()
                .with_context(|| format!("config path is not UTF-8: {}", path.display()))?;
            builder = builder.add_source(File::new(name, FileFormat::Toml).required(false));
        }

        let settings = builder
            .add_source(env.try_parsing(true))
            .build()
            .context("failed to read client configuration")?;
        let mut config: ClientConfig = settings
            .try_deserialize()
            .context("invalid client configuration")?;

        config.base_url = normalize_base_url(&config.base_url);
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        ensure!(self.timeout_secs > 0, "timeout_secs must be positive");
        ensure!(self.page_size > 0, "page_size must be positive");
        ensure!(
            !self.client_identifier.trim().is_empty(),
            "client_identifier must not be empty"
        );
        Ok(())
    }

    /// [`ClientConfig::timeout_secs`] as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Paging for listings, uncapped.
    pub fn paging(&self) -> Paging {
        Paging {
            page_size: usize::try_from(self.page_size).unwrap_or(usize::MAX),
            max_results: None,
        }
    }
}

/// Add `http://` when no scheme is given and drop trailing slashes, so
/// `localhost:32400/` becomes `http://localhost:32400`.
pub fn normalize_base_url(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    let normalized = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("http://{trimmed}")
    };
    if normalized != raw {
        warn!(from = raw, to = %normalized, "normalized base URL");
    }
    normalized
}
