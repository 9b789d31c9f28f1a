//! REST client for the Yandex Disk `/v1/disk/resources` endpoints.
//!
//! Every request carries an `Authorization: OAuth <token>` header. Uploads
//! and downloads are two-step: the API hands out a short-lived `href`,
//! and the bytes go to or come from that URL without the header.

use std::time::Duration;

use serde::Deserialize;

/// Production API base URL.
pub const DEFAULT_API_URL: &str = "https://cloud-api.yandex.net/v1/disk";

/// Default timeout for metadata requests and transfers.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Most entries requested from one folder listing.
const LIST_LIMIT: u32 = 100;

/// HTTP client for one Yandex Disk account.
#[derive(Clone)]
pub struct YandexDiskApi {
    client: reqwest::Client,
    api_url: String,
    token: String,
}

/// Errors from the Yandex Disk REST layer.
#[derive(Debug, thiserror::Error)]
pub enum VaultError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The API returned an unexpected status code.
    #[error("Yandex Disk API error ({status}): {body}")]
    ApiError { status: u16, body: String },
}

/// Response of the `/upload` and `/download` endpoints.
#[derive(Debug, Deserialize)]
pub struct Link {
    pub href: String,
}

/// One entry of a folder listing.
#[derive(Debug, Deserialize)]
pub struct Resource {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub path: String,
    #[serde(rename = "type", default)]
    pub kind: String,
}

#[derive(Debug, Default, Deserialize)]
struct Embedded {
    #[serde(default)]
    items: Vec<Resource>,
}

#[derive(Debug, Deserialize)]
struct FolderMeta {
    #[serde(rename = "_embedded", default)]
    embedded: Embedded,
}

impl YandexDiskApi {
    /// Create a client against the production API.
    pub fn new(token: impl Into<String>) -> Result<Self, VaultError> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self::with_client(client, DEFAULT_API_URL, token))
    }

    /// Create a client reusing an existing [`reqwest::Client`] and a custom
    /// base URL (used by tests against a mock server).
    pub fn with_client(
        client: reqwest::Client,
        api_url: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    fn auth(&self) -> String {
        format!("OAuth {}", self.token)
    }

    fn resources(&self, suffix: &str) -> String {
        format!("{}/resources{suffix}", self.api_url)
    }

    /// Create one folder. `201 Created` and `409 Conflict` (already exists)
    /// both count as success.
    pub async fn create_folder(&self, path: &str) -> Result<(), VaultError> {
        let response = self
            .client
            .put(self.resources(""))
            .header(reqwest::header::AUTHORIZATION, self.auth())
            .query(&[("path", path)])
            .send()
            .await?;

        match response.status().as_u16() {
            201 | 409 => Ok(()),
            _ => Self::check_status(response).await,
        }
    }

    /// Ask for an upload URL, then `PUT` the bytes there.
    pub async fn upload(&self, path: &str, bytes: Vec<u8>, overwrite: bool) -> Result<(), VaultError> {
        let response = self
            .client
            .get(self.resources("/upload"))
            .header(reqwest::header::AUTHORIZATION, self.auth())
            .query(&[("path", path), ("overwrite", if overwrite { "true" } else { "false" })])
            .send()
            .await?;
        let link: Link = Self::parse_response(response).await?;

        let response = self.client.put(&link.href).body(bytes).send().await?;
        Self::check_status(response).await
    }

    /// Files directly inside a folder. A missing folder yields an empty
    /// list; sub-folders are skipped.
    pub async fn list_files(&self, path: &str) -> Result<Vec<Resource>, VaultError> {
        let limit = LIST_LIMIT.to_string();
        let response = self
            .client
            .get(self.resources(""))
            .header(reqwest::header::AUTHORIZATION, self.auth())
            .query(&[("path", path), ("limit", limit.as_str())])
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        let meta: FolderMeta = Self::parse_response(response).await?;
        Ok(meta
            .embedded
            .items
            .into_iter()
            .filter(|item| item.kind == "file")
            .collect())
    }

    /// Temporary direct download URL for a file.
    pub async fn download_url(&self, path: &str) -> Result<String, VaultError> {
        let response = self
            .client
            .get(self.resources("/download"))
            .header(reqwest::header::AUTHORIZATION, self.auth())
            .query(&[("path", path)])
            .send()
            .await?;
        let link: Link = Self::parse_response(response).await?;
        Ok(link.href)
    }

    /// Fetch a file's contents through its download URL.
    pub async fn download(&self, path: &str) -> Result<Vec<u8>, VaultError> {
        let href = self.download_url(path).await?;
        let response = self.client.get(&href).send().await?;
        let response = Self::ensure_success(response).await?;
        Ok(response.bytes().await?.to_vec())
    }

    /// Delete a resource. `202 Accepted` (async delete), `204 No Content`
    /// and `404 Not Found` all count as success.
    pub async fn delete(&self, path: &str, permanently: bool) -> Result<(), VaultError> {
        let response = self
            .client
            .delete(self.resources(""))
            .header(reqwest::header::AUTHORIZATION, self.auth())
            .query(&[("path", path), ("permanently", if permanently { "true" } else { "false" })])
            .send()
            .await?;

        match response.status().as_u16() {
            202 | 204 | 404 => Ok(()),
            _ => Self::check_status(response).await,
        }
    }

    // ---- private helpers ----

    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, VaultError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(VaultError::ApiError {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, VaultError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }

    async fn check_status(response: reqwest::Response) -> Result<(), VaultError> {
        Self::ensure_success(response).await?;
        Ok(())
    }
}
