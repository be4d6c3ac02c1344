//! Minimal Vault HTTP client.
//!
//! Covers what integration tests need against a dev server: logical
//! read/write/delete/list under `/v1/`. Building a client never touches the
//! network.

pub mod secret;

pub use secret::{Secret, SecretAuth};

use crate::config::ClientConfig;
use crate::error::VaultClientError;

use common::{ErrorLocation, HttpStatusCode, RedactedSecret};

use std::panic::Location;

use log::{debug, trace};
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::Value;
use url::Url;

const API_VERSION_PREFIX: &str = "v1/";
const VAULT_TOKEN_HEADER_KEY: &str = "X-Vault-Token";
const VAULT_NAMESPACE_HEADER_KEY: &str = "X-Vault-Namespace";
const VAULT_REQUEST_HEADER_KEY: &str = "X-Vault-Request";
const LIST_QUERY_KEY: &str = "list";

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    errors: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct VaultClient {
    address: String,
    base_url: Url,
    client: Client,
    token: Option<RedactedSecret>,
    namespace: Option<String>,
}

impl VaultClient {
    pub fn new(config: ClientConfig) -> Result<Self, VaultClientError> {
        let address = config.address.trim_end_matches('/').to_string();

        let mut base_url = Url::parse(&address)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .danger_accept_invalid_certs(config.skip_verify)
            .build()?;

        debug!("Built Vault client for {address}");

        Ok(Self {
            address,
            base_url,
            client,
            token: config.token,
            namespace: config.namespace,
        })
    }

    /// Server address as configured, without a trailing slash.
    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_ref().map(RedactedSecret::expose)
    }

    pub fn set_token(&mut self, token: impl Into<String>) {
        self.token = Some(RedactedSecret::new(token));
    }

    pub fn clear_token(&mut self) {
        self.token = None;
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    fn url_for(&self, path: &str) -> Result<Url, VaultClientError> {
        let path = path.trim_start_matches('/');
        Ok(self.base_url.join(&format!("{API_VERSION_PREFIX}{path}"))?)
    }

    fn prepare_request(&self, request: RequestBuilder) -> RequestBuilder {
        let mut request = request.header(VAULT_REQUEST_HEADER_KEY, "true");
        if let Some(token) = &self.token {
            request = request.header(VAULT_TOKEN_HEADER_KEY, token.expose());
        }
        if let Some(namespace) = &self.namespace {
            request = request.header(VAULT_NAMESPACE_HEADER_KEY, namespace);
        }
        request
    }

    /// `GET /v1/<path>`. A 404 is not an error: it yields `None`.
    pub async fn read(&self, path: &str) -> Result<Option<Secret>, VaultClientError> {
        let url = self.url_for(path)?;
        trace!("Vault read {url}");

        let response = self.prepare_request(self.client.get(url)).send().await?;

        if HttpStatusCode(response.status().as_u16()).is_not_found() {
            debug!("Vault read {path}: not found");
            return Ok(None);
        }

        parse_secret(response).await
    }

    /// `PUT /v1/<path>` with `data` as the JSON body.
    pub async fn write(&self, path: &str, data: &Value) -> Result<Option<Secret>, VaultClientError> {
        let url = self.url_for(path)?;
        trace!("Vault write {url}");

        let response = self
            .prepare_request(self.client.put(url))
            .json(data)
            .send()
            .await?;

        parse_secret(response).await
    }

    /// `DELETE /v1/<path>`.
    pub async fn delete(&self, path: &str) -> Result<(), VaultClientError> {
        let url = self.url_for(path)?;
        trace!("Vault delete {url}");

        let response = self.prepare_request(self.client.delete(url)).send().await?;

        parse_secret(response).await.map(|_| ())
    }

    /// `GET /v1/<path>?list=true`. A 404 (nothing under `path`) yields `None`.
    pub async fn list(&self, path: &str) -> Result<Option<Secret>, VaultClientError> {
        let mut url = self.url_for(path)?;
        url.query_pairs_mut().append_pair(LIST_QUERY_KEY, "true");
        trace!("Vault list {url}");

        let response = self.prepare_request(self.client.get(url)).send().await?;

        if HttpStatusCode(response.status().as_u16()).is_not_found() {
            return Ok(None);
        }

        parse_secret(response).await
    }
}

async fn parse_secret(response: Response) -> Result<Option<Secret>, VaultClientError> {
    let status = HttpStatusCode(response.status().as_u16());

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(VaultClientError::Server {
            status,
            message: error_message(&body),
            location: ErrorLocation::from(Location::caller()),
        });
    }

    if status.is_no_content() {
        return Ok(None);
    }

    let body = response.text().await?;
    if body.trim().is_empty() {
        return Ok(None);
    }

    let secret: Secret = serde_json::from_str(&body)?;
    Ok(Some(secret))
}

/// Join Vault's `errors` array, or fall back to the raw body.
pub(crate) fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) if !parsed.errors.is_empty() => parsed.errors.join("; "),
        _ if body.trim().is_empty() => String::from("empty response body"),
        _ => body.trim().to_string(),
    }
}
