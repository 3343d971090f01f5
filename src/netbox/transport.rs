//! HTTP transport for the NetBox REST API.

use std::fmt;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use tracing::debug;
use url::Url;

use super::records::Page;
use super::Collection;
use crate::config::NetboxConfig;
use crate::error::{Error, Result};

/// Fetches one page of a collection.
///
/// The client depends on this seam rather than on reqwest directly so tests
/// can count and script requests.
pub trait Transport: Send + Sync + fmt::Debug {
    /// Fetch up to `limit` records of `collection` in one request.
    fn fetch(&self, collection: Collection, limit: u32) -> Result<Page>;
}

/// Blocking reqwest transport authenticated with a static API token.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: Url,
}

impl HttpTransport {
    /// Build a transport for `<scheme>://<host>/api/`.
    pub fn new(config: &NetboxConfig) -> Result<Self> {
        let base_url = config.base_url()?;

        let mut headers = HeaderMap::new();
        let mut token = HeaderValue::from_str(&format!("Token {}", config.token))
            .map_err(|e| Error::Config(format!("Invalid API token: {}", e)))?;
        token.set_sensitive(true);
        headers.insert(AUTHORIZATION, token);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(format!("nbgen/{}", env!("CARGO_PKG_VERSION")))
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, collection: Collection, limit: u32) -> Result<Url> {
        let mut url = self.base_url.join(collection.path()).map_err(|e| {
            Error::retrieval_with_source(collection, "Invalid endpoint URL", e)
        })?;
        url.query_pairs_mut()
            .append_pair("limit", &limit.to_string());
        Ok(url)
    }
}

impl Transport for HttpTransport {
    fn fetch(&self, collection: Collection, limit: u32) -> Result<Page> {
        let url = self.endpoint(collection, limit)?;
        debug!("GET {}", url);

        let response = self.client.get(url).send().map_err(|e| {
            let message = if e.is_timeout() {
                "Request timed out"
            } else if e.is_connect() {
                "Connection failed"
            } else {
                "HTTP request failed"
            };
            Error::retrieval_with_source(collection, message, e)
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::retrieval(
                collection,
                format!(
                    "HTTP {} {}",
                    status.as_u16(),
                    status.canonical_reason().unwrap_or("Unknown")
                ),
            ));
        }

        response.json::<Page>().map_err(|e| {
            Error::retrieval_with_source(collection, "Failed to decode response body", e)
        })
    }
}
