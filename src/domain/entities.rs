//! Domain entities
//!
//! Contains the records exchanged with the document store and the
//! per-batch outcome aggregates returned by the fill service.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One page of the document database: an opaque id plus its raw property map.
///
/// Properties stay as wire JSON; typed access goes through the property
/// codec rather than a struct per database schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    pub id: String,
    #[serde(default)]
    pub properties: Map<String, Value>,
}

/// One page of query results, following the `has_more`/`next_cursor`
/// pagination convention.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryResponse {
    #[serde(default)]
    pub results: Vec<Page>,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub next_cursor: Option<String>,
}

/// Outcome of filling a single page. Never persisted; aggregated in-memory
/// into a [`BatchReport`] and serialized in API/CLI responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FillOutcome {
    pub page_id: String,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chars: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub passage: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FillOutcome {
    pub fn success(
        page_id: impl Into<String>,
        chars: usize,
        passage: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            page_id: page_id.into(),
            ok: true,
            chars: Some(chars),
            passage: Some(passage.into()),
            version: Some(version.into()),
            error: None,
        }
    }

    pub fn failure(page_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            page_id: page_id.into(),
            ok: false,
            chars: None,
            passage: None,
            version: None,
            error: Some(reason.into()),
        }
    }
}

/// One entry in a batch report: a bare page id in dry-run mode, a full
/// outcome otherwise.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BatchItem {
    Id(String),
    Outcome(FillOutcome),
}

/// Aggregate result of one batch invocation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchReport {
    pub target_count: usize,
    pub updated: usize,
    pub items: Vec<BatchItem>,
}

/// Mode flags for a batch run. The two flags are independent.
#[derive(Debug, Clone, Copy, Default)]
pub struct BatchOptions {
    /// Select candidates and return their ids only; zero writes.
    pub dry_run: bool,
    /// Narrow the candidate set to pages whose text property is currently
    /// empty, dropping force-reload-only candidates.
    pub hard_empty_only: bool,
}
