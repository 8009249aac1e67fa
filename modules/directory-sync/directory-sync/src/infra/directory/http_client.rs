//! HTTP adapter for the directory service.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};

use crate::config::DirectoryClientConfig;
use crate::domain::ports::{
    DirectoryClient, ExternalDepartment, ExternalDepartmentNode, ExternalEmployee,
    ExternalManagerLine, UpstreamError,
};

/// Feeds answer either with a bare array or wrapped as `{"data": [...]}`.
#[derive(Deserialize)]
#[serde(untagged)]
enum ListBody<T> {
    Bare(Vec<T>),
    Wrapped { data: Vec<T> },
}

impl<T> ListBody<T> {
    fn into_items(self) -> Vec<T> {
        match self {
            Self::Bare(items) | Self::Wrapped { data: items } => items,
        }
    }
}

pub struct HttpDirectoryClient {
    http: reqwest::Client,
    base_url: String,
    timeout: Duration,
    api_token: Option<SecretString>,
}

impl std::fmt::Debug for HttpDirectoryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpDirectoryClient")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("api_token", &self.api_token.as_ref().map(|_| "***"))
            .finish_non_exhaustive()
    }
}

impl HttpDirectoryClient {
    /// # Errors
    /// The underlying HTTP client cannot be built (TLS backend failure).
    pub fn new(config: &DirectoryClientConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .context("building directory service HTTP client")?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            timeout: config.request_timeout,
            api_token: config.api_token.clone(),
        })
    }

    fn transport_error(&self, path: &str, e: &reqwest::Error) -> UpstreamError {
        if e.is_timeout() {
            UpstreamError::Timeout(self.timeout)
        } else {
            UpstreamError::Unavailable(format!("GET {path}: {e}"))
        }
    }

    async fn get_list<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, bool)],
    ) -> Result<Vec<T>, UpstreamError> {
        let url = format!("{}{path}", self.base_url);
        let mut request = self.http.get(&url).query(query);
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token.expose_secret());
        }

        let response = request
            .send()
            .await
            .map_err(|e| self.transport_error(path, &e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Unavailable(format!("GET {path}: HTTP {status}")));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| self.transport_error(path, &e))?;
        let entries = serde_json::from_slice::<ListBody<serde_json::Value>>(&body)
            .map_err(|e| UpstreamError::Decode(format!("GET {path}: {e}")))?
            .into_items();
        let total = entries.len();
        let items: Vec<T> = entries
            .into_iter()
            .filter_map(|entry| match serde_json::from_value(entry) {
                Ok(item) => Some(item),
                Err(e) => {
                    warn!(path, error = %e, "skipping unreadable feed entry");
                    None
                }
            })
            .collect();
        debug!(
            path,
            count = items.len(),
            skipped = total - items.len(),
            "directory feed fetched"
        );
        Ok(items)
    }
}

#[async_trait]
impl DirectoryClient for HttpDirectoryClient {
    #[instrument(skip(self), fields(base_url = %self.base_url))]
    async fn list_departments(
        &self,
        include_empty: bool,
    ) -> Result<Vec<ExternalDepartment>, UpstreamError> {
        self.get_list("/departments", &[("includeEmpty", include_empty)])
            .await
    }

    #[instrument(skip(self), fields(base_url = %self.base_url))]
    async fn list_employees(
        &self,
        with_detail: bool,
        include_terminated: bool,
    ) -> Result<Vec<ExternalEmployee>, UpstreamError> {
        self.get_list(
            "/employees",
            &[
                ("withDetail", with_detail),
                ("includeTerminated", include_terminated),
            ],
        )
        .await
    }

    #[instrument(skip(self), fields(base_url = %self.base_url))]
    async fn list_employees_by_hierarchy(
        &self,
        include_terminated: bool,
    ) -> Result<Vec<ExternalDepartmentNode>, UpstreamError> {
        self.get_list(
            "/employees/hierarchy",
            &[("includeTerminated", include_terminated)],
        )
        .await
    }

    #[instrument(skip(self), fields(base_url = %self.base_url))]
    async fn list_manager_lines(&self) -> Result<Vec<ExternalManagerLine>, UpstreamError> {
        self.get_list("/employees/manager-lines", &[]).await
    }
}
