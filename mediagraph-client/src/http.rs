//! reqwest-backed [`Transport`].

use std::fmt;

use anyhow::Context;
use async_trait::async_trait;
use mediagraph_core::{Method, QueryRequest, Transport};
use reqwest::Client;
use reqwest::header::{ACCEPT, HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;
use tracing::{debug, info};

use crate::error::HttpError;
use crate::settings::ClientConfig;

/// Authentication token, attached per request when configured.
pub const TOKEN_HEADER: &str = "X-Plex-Token";
/// Identity headers sent with every request.
pub const CLIENT_IDENTIFIER_HEADER: &str = "X-Plex-Client-Identifier";
#[allow(missing_docs)]
pub const PRODUCT_HEADER: &str = "X-Plex-Product";
#[allow(missing_docs)]
pub const VERSION_HEADER: &str = "X-Plex-Version";

/// Sends catalog queries to one server over HTTP and decodes JSON bodies.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpTransport")
            .field("base_url", &self.base_url)
            .field("has_token", &self.token.is_some())
            .finish()
    }
}

impl HttpTransport {
    /// Build the underlying client with identity headers and timeout.
    pub fn new(config: &ClientConfig) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        insert_header(&mut headers, CLIENT_IDENTIFIER_HEADER, &config.client_identifier)?;
        insert_header(&mut headers, PRODUCT_HEADER, &config.product)?;
        insert_header(&mut headers, VERSION_HEADER, env!("CARGO_PKG_VERSION"))?;

        let client = Client::builder()
            .timeout(config.timeout())
            .default_headers(headers)
            .build()
            .context("failed to build HTTP client")?;

        info!(base_url = %config.base_url, "creating catalog transport");
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            token: config.token.clone(),
        })
    }

    /// Normalized base URL every request path is joined to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL of a server-relative path.
    pub fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }
}

fn insert_header(headers: &mut HeaderMap, name: &str, value: &str) -> Result<(), HttpError> {
    let invalid = || HttpError::InvalidHeader {
        name: name.to_string(),
        value: value.to_string(),
    };
    let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| invalid())?;
    let header_value = HeaderValue::from_str(value).map_err(|_| invalid())?;
    headers.insert(header_name, header_value);
    Ok(())
}

fn http_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Delete => reqwest::Method::DELETE,
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn query(&self, request: QueryRequest) -> anyhow::Result<Value> {
        let QueryRequest {
            path,
            method,
            headers,
        } = request;

        let mut extra = HeaderMap::new();
        if let Some(token) = &self.token {
            insert_header(&mut extra, TOKEN_HEADER, token)?;
        }
        for (name, value) in &headers {
            insert_header(&mut extra, name, value)?;
        }

        let response = self
            .client
            .request(http_method(method), self.url(&path))
            .headers(extra)
            .send()
            .await
            .with_context(|| format!("{method} {path} failed"))?;

        let status = response.status();
        debug!(%method, path = %path, status = status.as_u16(), "catalog response");
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(HttpError::Status {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("unknown").to_string(),
                method: method.to_string(),
                path,
                body,
            }
            .into());
        }

        let body = response
            .bytes()
            .await
            .with_context(|| format!("reading body of {method} {path}"))?;
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&body).map_err(|source| HttpError::Decode { path, source }.into())
    }
}
