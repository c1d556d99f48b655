//! Supabase (PostgREST) client for the passage text table.
//!
//! Lookups are best-effort by policy: any transport or store error is
//! logged and collapsed to "not found" at the trait boundary. Internally
//! the outcome stays tagged so logs can tell an error from a miss.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::{debug, warn};

use crate::domain::stores::{SourceStore, StoreError};
use crate::infrastructure::config::AppConfig;

const REQUEST_TIMEOUT_SECS: u64 = 30;

pub struct SupabaseClient {
    http: reqwest::Client,
    base_url: String,
    key: String,
    table: String,
    col_passage: String,
    col_version: String,
    col_text: String,
    empty_text_is_missing: bool,
}

/// Internal lookup outcome, collapsed to `Option` at the trait boundary.
enum Lookup {
    Found(String),
    NotFound,
    Error(StoreError),
}

impl SupabaseClient {
    pub fn new(config: &AppConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            http,
            base_url: config.supabase_url.trim_end_matches('/').to_string(),
            key: config.supabase_key.clone(),
            table: config.supa_table.clone(),
            col_passage: config.col_passage.clone(),
            col_version: config.col_version.clone(),
            col_text: config.col_text.clone(),
            empty_text_is_missing: config.empty_text_is_missing,
        })
    }

    /// Equality lookup; `version` narrows the match when given.
    async fn select_rows(
        &self,
        passage: &str,
        version: Option<&str>,
    ) -> Result<Vec<Map<String, Value>>, StoreError> {
        let url = format!("{}/rest/v1/{}", self.base_url, self.table);
        let mut query: Vec<(&str, String)> = vec![
            ("select", self.col_text.clone()),
            (self.col_passage.as_str(), format!("eq.{passage}")),
        ];
        if let Some(version) = version {
            query.push((self.col_version.as_str(), format!("eq.{version}")));
        }

        let response = self
            .http
            .get(&url)
            .query(&query)
            .header("apikey", &self.key)
            .bearer_auth(&self.key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Status {
                url,
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json().await?)
    }

    fn text_of(&self, rows: Vec<Map<String, Value>>) -> Lookup {
        let Some(row) = rows.into_iter().next() else {
            return Lookup::NotFound;
        };
        let text = row
            .get(&self.col_text)
            .and_then(Value::as_str)
            .unwrap_or_default();
        if text.is_empty() && self.empty_text_is_missing {
            return Lookup::NotFound;
        }
        Lookup::Found(text.to_string())
    }

    async fn lookup(&self, passage: &str, version: &str) -> Lookup {
        match self.select_rows(passage, Some(version)).await {
            Ok(rows) if !rows.is_empty() => self.text_of(rows),
            // No exact match: retry on the passage key alone and take the
            // first row, whatever version it carries.
            Ok(_) => match self.select_rows(passage, None).await {
                Ok(rows) => self.text_of(rows),
                Err(e) => Lookup::Error(e),
            },
            Err(e) => Lookup::Error(e),
        }
    }
}

#[async_trait]
impl SourceStore for SupabaseClient {
    async fn fetch_text(&self, passage: &str, version: &str) -> Option<String> {
        match self.lookup(passage, version).await {
            Lookup::Found(text) => Some(text),
            Lookup::NotFound => {
                debug!(passage, version, "no source text");
                None
            }
            Lookup::Error(e) => {
                warn!(passage, version, error = %e, "source store lookup failed");
                None
            }
        }
    }
}
