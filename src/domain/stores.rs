//! Store seams for the two remote backends.
//!
//! Both clients sit behind traits so the fill service can be exercised
//! with in-memory doubles; the production implementations live in the
//! infrastructure layer.

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::domain::entities::{Page, QueryResponse};

/// Errors surfaced by the primary (document) store client.
///
/// Every operation fails fast on transport or non-2xx responses; callers
/// decide whether to isolate the failure per record or propagate it.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("page not found: {page_id}")]
    NotFound { page_id: String },

    #[error("request to {url} failed with status {status}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Primary record store: get-by-id, predicate query with cursor
/// pagination, and partial-field patch.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get_page(&self, page_id: &str) -> Result<Page, StoreError>;

    /// Posts a filter+pagination payload. The caller owns the payload
    /// shape; the store merely transports it.
    async fn query_database(
        &self,
        database_id: &str,
        payload: &Value,
    ) -> Result<QueryResponse, StoreError>;

    /// Partial update: sends only the changed properties. The remote store
    /// merges at the field level, so there is no read-then-merge here.
    async fn update_page(
        &self,
        page_id: &str,
        properties: Map<String, Value>,
    ) -> Result<(), StoreError>;
}

/// Secondary text store, best-effort by design.
///
/// `fetch_text` performs an equality lookup on (passage, version) and,
/// when that matches nothing, falls back to a lookup on passage alone,
/// returning the first match. `None` covers "no row", "empty text column"
/// (when the client is configured to coerce it) and any transport error,
/// which implementations log rather than propagate.
#[async_trait]
pub trait SourceStore: Send + Sync {
    async fn fetch_text(&self, passage: &str, version: &str) -> Option<String>;
}
