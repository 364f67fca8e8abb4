//! External name resolution collaborator (ENS-style names to addresses).
//!
//! The directory never performs network lookups itself; this client is an
//! optional pre-step and its output is untrusted input, so anything that
//! is not a syntactically valid address is discarded.

use crate::error::PayrailError;
use crate::recipient::address;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

#[async_trait]
pub trait NameResolver: Send + Sync {
    /// Resolve a human-readable name to a chain address. `Ok(None)` means
    /// the name does not resolve, which is not an error.
    async fn resolve(&self, name: &str) -> Result<Option<String>, PayrailError>;
}

/// Does this input look like a resolvable domain-style name rather than a
/// raw address or a plain display name?
pub fn looks_like_domain_name(input: &str) -> bool {
    let input = input.trim();
    input.ends_with(".eth") && input.len() > ".eth".len() && !input.contains(char::is_whitespace)
}

pub struct HttpNameResolver {
    endpoint: String,
    client: reqwest::Client,
}

impl HttpNameResolver {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            client: reqwest::Client::new(),
        }
    }
}

#[derive(Deserialize)]
struct ResolveResponse {
    address: Option<String>,
}

#[async_trait]
impl NameResolver for HttpNameResolver {
    async fn resolve(&self, name: &str) -> Result<Option<String>, PayrailError> {
        let url = format!("{}/{}", self.endpoint.trim_end_matches('/'), name.trim());
        debug!("Resolving name via {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| PayrailError::Resolver(e.to_string()))?;
        if !response.status().is_success() {
            return Ok(None);
        }

        let body: ResolveResponse = response
            .json()
            .await
            .map_err(|e| PayrailError::Resolver(e.to_string()))?;

        // Untrusted: keep only syntactically valid addresses.
        Ok(body
            .address
            .filter(|a| address::is_valid_address(a.trim()))
            .map(|a| address::normalize(&a)))
    }
}

/// Fixed-table resolver for tests and offline demos.
#[derive(Default)]
pub struct StaticNameResolver {
    entries: std::collections::HashMap<String, String>,
}

impl StaticNameResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(mut self, name: &str, addr: &str) -> Self {
        self.entries
            .insert(name.to_lowercase(), addr.to_string());
        self
    }
}

#[async_trait]
impl NameResolver for StaticNameResolver {
    async fn resolve(&self, name: &str) -> Result<Option<String>, PayrailError> {
        Ok(self
            .entries
            .get(&name.trim().to_lowercase())
            .filter(|a| address::is_valid_address(a))
            .map(|a| address::normalize(a)))
    }
}
