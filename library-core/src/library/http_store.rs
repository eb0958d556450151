//! Backing store over the tenant REST API
//!
//! ```text
//! GET    {base}/tenants/{tenant}/wiki                 -> TenantEntry[]
//! POST   {base}/tenants/{tenant}/wiki                 -> {id, ...}
//! DELETE {base}/tenants/{tenant}/wiki/{id}
//! GET    {base}/tenants/{tenant}/plays|banners        -> ContentRecord[]
//! GET    {base}/tenants/{tenant}/libraries            -> Library[]
//! POST   {base}/tenants/{tenant}/libraries            -> Library
//! GET    {base}/tenants/{tenant}/libraries/{id}       -> Library (404 = none)
//! PUT    {base}/tenants/{tenant}/libraries/{id}       -> Library
//! DELETE {base}/tenants/{tenant}/libraries/{id}
//! POST   {base}/libraries/{id}/install {targetTenantId} -> InstallCounts
//! ```
//!
//! Tenant, entry and library ids are percent-encoded as single path
//! segments.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Method, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::{
    ContentRecord, ContentStore, InstallCounts, Library, LibraryDraft, LibraryStore, PackEntry,
    RecordKind, TenantEntry,
};
use crate::config::LibraryConfig;
use crate::error::{LibraryError, Result};

/// REST client for one tenant of the backing store
pub struct HttpStore {
    client: reqwest::Client,
    base_url: Url,
    tenant_id: String,
    token: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InstallRequest<'a> {
    target_tenant_id: &'a str,
}

/// Create response; the store only guarantees the assigned id
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatedEntry {
    id: String,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    enabled: Option<bool>,
}

impl CreatedEntry {
    fn into_tenant_entry(self, sent: &PackEntry) -> TenantEntry {
        TenantEntry {
            id: self.id,
            content: sent.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
            enabled: self.enabled.unwrap_or(true),
        }
    }
}

impl HttpStore {
    pub fn new(
        base_url: &str,
        tenant_id: impl Into<String>,
        token: Option<String>,
        timeout: std::time::Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("overlay-library/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| LibraryError::Store(format!("Failed to create HTTP client: {e}")))?;

        let base_url = Url::parse(base_url)
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| LibraryError::Config(format!("Invalid store URL: {base_url}")))?;

        Ok(Self {
            client,
            base_url,
            tenant_id: tenant_id.into(),
            token,
        })
    }

    /// Create a store client from engine configuration
    pub fn from_config(config: &LibraryConfig) -> Result<Self> {
        let tenant = config
            .require_tenant()
            .map_err(|e| LibraryError::Config(e.to_string()))?;
        Self::new(&config.store_url, tenant, config.api_token(), config.timeout())
    }

    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    /// `base_url` extended by `segments`, each escaped as one segment
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn tenant_url(&self, rest: &[&str]) -> Url {
        let mut segments = vec!["tenants", self.tenant_id.as_str()];
        segments.extend_from_slice(rest);
        self.url(&segments)
    }

    fn request(&self, method: Method, url: &Url) -> RequestBuilder {
        let builder = self.client.request(method, url.clone());
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Send a request, mapping transport and status failures with `on_err`
    async fn send(
        &self,
        builder: RequestBuilder,
        url: &Url,
        on_err: impl Fn(String) -> LibraryError,
    ) -> Result<reqwest::Response> {
        let response = builder
            .send()
            .await
            .map_err(|e| on_err(format!("request to {url} failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::debug!("Store returned HTTP {} for {}: {}", status, url, body);
            return Err(on_err(format!("HTTP {status} from {url}")));
        }

        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &Url) -> Result<T> {
        let response = self
            .send(self.request(Method::GET, url), url, LibraryError::Store)
            .await?;
        response
            .json()
            .await
            .map_err(|e| LibraryError::Store(format!("malformed response from {url}: {e}")))
    }

    async fn send_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: Method,
        url: &Url,
        body: &B,
    ) -> Result<T> {
        let response = self
            .send(self.request(method, url).json(body), url, LibraryError::Store)
            .await?;
        response
            .json()
            .await
            .map_err(|e| LibraryError::Store(format!("malformed response from {url}: {e}")))
    }
}

#[async_trait]
impl ContentStore for HttpStore {
    async fn create(&self, entry: &PackEntry) -> Result<TenantEntry> {
        let url = self.tenant_url(&["wiki"]);
        let title = entry.title.clone();
        let response = self
            .send(
                self.request(Method::POST, &url).json(entry),
                &url,
                |reason| LibraryError::write_failed(&title, reason),
            )
            .await?;

        let created: CreatedEntry = response
            .json()
            .await
            .map_err(|e| LibraryError::write_failed(&title, format!("malformed response: {e}")))?;
        Ok(created.into_tenant_entry(entry))
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let url = self.tenant_url(&["wiki", id]);
        self.send(self.request(Method::DELETE, &url), &url, |reason| {
            LibraryError::write_failed(id, reason)
        })
        .await?;
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<TenantEntry>> {
        self.get_json(&self.tenant_url(&["wiki"])).await
    }

    async fn list_records(&self, kind: RecordKind) -> Result<Vec<ContentRecord>> {
        self.get_json(&self.tenant_url(&[kind.collection()])).await
    }
}

#[async_trait]
impl LibraryStore for HttpStore {
    async fn create_library(&self, draft: &LibraryDraft) -> Result<Library> {
        self.send_json(Method::POST, &self.tenant_url(&["libraries"]), draft)
            .await
    }

    async fn update_library(&self, id: &str, draft: &LibraryDraft) -> Result<Library> {
        self.send_json(
            Method::PUT,
            &self.tenant_url(&["libraries", id]),
            draft,
        )
        .await
    }

    async fn delete_library(&self, id: &str) -> Result<()> {
        let url = self.tenant_url(&["libraries", id]);
        self.send(self.request(Method::DELETE, &url), &url, LibraryError::Store)
            .await?;
        Ok(())
    }

    async fn get_library_by_id(&self, id: &str) -> Result<Option<Library>> {
        let url = self.tenant_url(&["libraries", id]);
        let response = self
            .request(Method::GET, &url)
            .send()
            .await
            .map_err(|e| LibraryError::Store(format!("request to {url} failed: {e}")))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(LibraryError::Store(format!(
                "HTTP {} from {url}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map(Some)
            .map_err(|e| LibraryError::Store(format!("malformed response from {url}: {e}")))
    }

    async fn list_my_libraries(&self) -> Result<Vec<Library>> {
        self.get_json(&self.tenant_url(&["libraries"])).await
    }

    async fn install_library(
        &self,
        library_id: &str,
        target_tenant_id: &str,
    ) -> Result<InstallCounts> {
        let url = self.url(&["libraries", library_id, "install"]);
        tracing::info!(
            "Requesting install of library {} into tenant {}",
            library_id,
            target_tenant_id
        );
        self.send_json(Method::POST, &url, &InstallRequest { target_tenant_id })
            .await
    }
}
