//! Dropbox HTTP API storage backend

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, warn};

use crate::storage::backend::StorageBackend;
use crate::storage::error::BackendError;
use crate::storage::types::DirectoryEntry;

/// Default base URL for the Dropbox RPC endpoints
pub const DEFAULT_BASE_URL: &str = "https://api.dropboxapi.com";

/// Maximum number of entries requested per listing page
const LIST_PAGE_LIMIT: u32 = 500;

/// Response from files/list_folder and files/list_folder/continue
#[derive(Debug, Deserialize)]
struct ListFolderResponse {
    entries: Vec<Metadata>,
    cursor: String,
    has_more: bool,
}

#[derive(Debug, Deserialize)]
#[serde(tag = ".tag", rename_all = "lowercase")]
enum Metadata {
    Folder {
        path_display: String,
    },
    File {
        path_display: String,
        server_modified: DateTime<Utc>,
    },
    #[serde(other)]
    Other,
}

impl Metadata {
    fn into_entry(self) -> Option<DirectoryEntry> {
        match self {
            // Folders carry no modification time in the v2 API
            Metadata::Folder { path_display } => {
                Some(DirectoryEntry::directory(path_display, DateTime::<Utc>::UNIX_EPOCH))
            }
            Metadata::File {
                path_display,
                server_modified,
            } => Some(DirectoryEntry::file(path_display, server_modified)),
            Metadata::Other => None,
        }
    }
}

/// Response from sharing/create_shared_link_with_settings
#[derive(Debug, Deserialize)]
struct SharedLink {
    url: String,
}

/// Response from sharing/list_shared_links
#[derive(Debug, Deserialize)]
struct ListSharedLinksResponse {
    links: Vec<SharedLink>,
}

/// Error body returned with 409 responses
#[derive(Debug, Deserialize)]
struct ApiError {
    error_summary: String,
}

/// Storage backend for an app folder on Dropbox
pub struct DropboxBackend {
    client: reqwest::Client,
    base_url: String,
    access_token: String,
}

impl DropboxBackend {
    /// Creates a new DropboxBackend against a custom base URL
    pub fn new(base_url: &str, access_token: &str) -> Result<Self, BackendError> {
        Ok(Self {
            client: reqwest::Client::builder()
                .user_agent("artifact-linker")
                .build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            access_token: access_token.to_string(),
        })
    }

    /// The API addresses the root as "" rather than "/"
    fn api_path(path: &str) -> &str {
        if path == "/" { "" } else { path }
    }

    async fn post(
        &self,
        endpoint: &str,
        body: serde_json::Value,
    ) -> Result<reqwest::Response, BackendError> {
        let url = format!("{}/2/{}", self.base_url, endpoint);
        debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await?;

        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(BackendError::Unauthorized);
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok());
            return Err(BackendError::RateLimited {
                retry_after_secs: retry_after,
            });
        }

        Ok(response)
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, BackendError> {
        let status = response.status();
        if !status.is_success() {
            warn!("Dropbox API returned status {}: {}", status, response.url());
            return Err(BackendError::InvalidResponse(format!(
                "Unexpected status: {}",
                status
            )));
        }

        response.json().await.map_err(|e| {
            warn!("Failed to parse Dropbox response: {}", e);
            BackendError::InvalidResponse(e.to_string())
        })
    }

    async fn existing_link(&self, path: &str) -> Result<String, BackendError> {
        let response = self
            .post(
                "sharing/list_shared_links",
                json!({ "path": path, "direct_only": true }),
            )
            .await?;

        let listed: ListSharedLinksResponse = Self::decode(response).await?;
        listed
            .links
            .into_iter()
            .next()
            .map(|link| link.url)
            .ok_or_else(|| {
                BackendError::InvalidResponse(format!("No existing shared link for {}", path))
            })
    }
}

#[async_trait::async_trait]
impl StorageBackend for DropboxBackend {
    async fn list(&self, path: &str) -> Result<Vec<DirectoryEntry>, BackendError> {
        let response = self
            .post(
                "files/list_folder",
                json!({
                    "path": Self::api_path(path),
                    "recursive": false,
                    "limit": LIST_PAGE_LIMIT,
                }),
            )
            .await?;

        if response.status() == reqwest::StatusCode::CONFLICT {
            return Err(BackendError::NotFound(path.to_string()));
        }

        let mut page: ListFolderResponse = Self::decode(response).await?;
        let mut entries: Vec<DirectoryEntry> = Vec::new();

        loop {
            entries.extend(page.entries.into_iter().filter_map(Metadata::into_entry));
            if !page.has_more {
                break;
            }
            let response = self
                .post(
                    "files/list_folder/continue",
                    json!({ "cursor": page.cursor }),
                )
                .await?;
            page = Self::decode(response).await?;
        }

        Ok(entries)
    }

    async fn share_link(&self, path: &str) -> Result<String, BackendError> {
        let response = self
            .post(
                "sharing/create_shared_link_with_settings",
                json!({ "path": path }),
            )
            .await?;

        if response.status() == reqwest::StatusCode::CONFLICT {
            let body: ApiError = response
                .json()
                .await
                .map_err(|e| BackendError::InvalidResponse(e.to_string()))?;

            if body.error_summary.starts_with("shared_link_already_exists") {
                debug!("Reusing existing shared link for {}", path);
                return self.existing_link(path).await;
            }
            if body.error_summary.starts_with("path/not_found") {
                return Err(BackendError::NotFound(path.to_string()));
            }
            return Err(BackendError::InvalidResponse(body.error_summary));
        }

        let link: SharedLink = Self::decode(response).await?;
        Ok(link.url)
    }
}
