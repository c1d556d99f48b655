//! Notion API client: get / query / patch against the v1 REST endpoints.
//!
//! All operations validate the HTTP status before parsing and fail fast
//! with [`StoreError`]; per-record isolation is the caller's concern.

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde_json::{Map, Value, json};
use std::time::Duration;
use tracing::{debug, error};

use crate::domain::entities::{Page, QueryResponse};
use crate::domain::stores::{DocumentStore, StoreError};
use crate::infrastructure::config::AppConfig;

const API_BASE: &str = "https://api.notion.com";
const NOTION_VERSION: &str = "2022-06-28";
const REQUEST_TIMEOUT_SECS: u64 = 30;

pub struct NotionClient {
    http: reqwest::Client,
    base_url: String,
}

impl NotionClient {
    pub fn new(config: &AppConfig) -> anyhow::Result<Self> {
        Self::with_base_url(config, API_BASE)
    }

    /// Same client pointed at a different host; kept separate for tests
    /// against a local stub server.
    pub fn with_base_url(config: &AppConfig, base_url: &str) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        let bearer = HeaderValue::from_str(&format!("Bearer {}", config.notion_token))
            .map_err(|_| anyhow::anyhow!("NOTION_TOKEN contains invalid header characters"))?;
        headers.insert(AUTHORIZATION, bearer);
        headers.insert("Notion-Version", HeaderValue::from_static(NOTION_VERSION));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .default_headers(headers)
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn check_status(
        url: String,
        response: reqwest::Response,
    ) -> Result<reqwest::Response, StoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(StoreError::Status {
            url,
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl DocumentStore for NotionClient {
    async fn get_page(&self, page_id: &str) -> Result<Page, StoreError> {
        let url = format!("{}/v1/pages/{page_id}", self.base_url);
        debug!(page_id, "fetching page");

        let response = self.http.get(&url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound {
                page_id: page_id.to_string(),
            });
        }
        let response = Self::check_status(url, response).await?;
        Ok(response.json::<Page>().await?)
    }

    async fn query_database(
        &self,
        database_id: &str,
        payload: &Value,
    ) -> Result<QueryResponse, StoreError> {
        let url = format!("{}/v1/databases/{database_id}/query", self.base_url);
        debug!(database_id, "querying database");

        let response = self.http.post(&url).json(payload).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(%status, %body, "database query failed");
            return Err(StoreError::Status {
                url,
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json::<QueryResponse>().await?)
    }

    async fn update_page(
        &self,
        page_id: &str,
        properties: Map<String, Value>,
    ) -> Result<(), StoreError> {
        let url = format!("{}/v1/pages/{page_id}", self.base_url);
        debug!(page_id, props = properties.len(), "patching page");

        let response = self
            .http
            .patch(&url)
            .json(&json!({ "properties": properties }))
            .send()
            .await?;
        Self::check_status(url, response).await?;
        Ok(())
    }
}
