//! Batch reconciliation: select pages to fill, resolve their passage text
//! and patch it back.
//!
//! Strictly sequential by design. Every remote round-trip is awaited
//! before the next starts and a fixed delay is applied between requests;
//! the upstream store enforces request-rate limits, so the throttle must
//! stay even when it looks removable. A crashed run leaves no checkpoint:
//! re-running re-selects through the same predicate, which makes the
//! batch naturally resumable.

use chrono::Local;
use serde_json::{Map, Value, json};
use std::sync::Arc;
use tokio::time::{Duration, sleep};
use tracing::{info, warn};

use crate::domain::chunk::chunk_text;
use crate::domain::entities::{BatchItem, BatchOptions, BatchReport, FillOutcome, Page};
use crate::domain::stores::{DocumentStore, SourceStore, StoreError};
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::properties::{PropertyValue, extract_property, is_checkbox};

/// Store-imposed maximum page size for database queries.
const MAX_PAGE_SIZE: u32 = 100;

const LAST_SYNCED_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

pub struct FillService {
    config: Arc<AppConfig>,
    documents: Arc<dyn DocumentStore>,
    source: Arc<dyn SourceStore>,
}

impl FillService {
    pub fn new(
        config: Arc<AppConfig>,
        documents: Arc<dyn DocumentStore>,
        source: Arc<dyn SourceStore>,
    ) -> Self {
        Self {
            config,
            documents,
            source,
        }
    }

    /// Fixed spacing between remote calls (rate-limit throttle).
    async fn throttle(&self) {
        sleep(Duration::from_millis(self.config.sleep_ms)).await;
    }

    /// A page qualifies when its force-reload checkbox is set OR its text
    /// property is empty.
    fn selection_filter(&self) -> Value {
        json!({
            "or": [
                { "property": self.config.prop_load, "checkbox": { "equals": true } },
                { "property": self.config.prop_text, "rich_text": { "is_empty": true } }
            ]
        })
    }

    /// Collects every page matching the selection predicate, following the
    /// `has_more`/`next_cursor` protocol in server-returned order.
    pub async fn fetch_candidates(
        &self,
        database_id: &str,
        limit: u32,
    ) -> Result<Vec<Page>, StoreError> {
        let mut pages = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let mut payload = json!({
                "page_size": limit.min(MAX_PAGE_SIZE),
                "filter": self.selection_filter(),
            });
            if let Some(cursor) = &cursor {
                payload["start_cursor"] = json!(cursor);
            }

            let response = self.documents.query_database(database_id, &payload).await?;
            pages.extend(response.results);
            if !response.has_more {
                break;
            }
            cursor = response.next_cursor;
            self.throttle().await;
        }

        info!(database_id, candidates = pages.len(), "selection complete");
        Ok(pages)
    }

    /// Fills a single page: resolve passage/version, fetch the source
    /// text, chunk it and patch it back together with the sync timestamp.
    ///
    /// Missing passage key and missing source text are expected outcomes,
    /// returned as failure entries; store errors propagate to the caller.
    pub async fn fill_one(&self, page_id: &str) -> Result<FillOutcome, StoreError> {
        let page = self.documents.get_page(page_id).await?;
        let props = &page.properties;

        let passage = extract_property(props, &self.config.prop_passage)
            .as_ref()
            .and_then(PropertyValue::as_text)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        let Some(passage) = passage else {
            return Ok(FillOutcome::failure(
                page_id,
                format!("page has no '{}' value", self.config.prop_passage),
            ));
        };

        let version = extract_property(props, &self.config.prop_version)
            .as_ref()
            .and_then(PropertyValue::as_text)
            .filter(|s| !s.is_empty())
            .unwrap_or(&self.config.default_version)
            .to_string();

        let Some(body) = self.source.fetch_text(&passage, &version).await else {
            return Ok(FillOutcome::failure(
                page_id,
                format!("no source text for {passage}/{version}"),
            ));
        };

        let chunks = chunk_text(&body, self.config.max_rich_text);
        let mut update = Map::new();
        update.insert(
            self.config.prop_text.clone(),
            json!({ "rich_text": chunks }),
        );
        update.insert(
            self.config.prop_last_synced.clone(),
            json!({ "date": { "start": Local::now().format(LAST_SYNCED_FORMAT).to_string() } }),
        );
        // Reset the force-reload flag only when this page actually carries
        // it as a checkbox; patching an absent property is a store error.
        if is_checkbox(props, &self.config.prop_load) {
            update.insert(self.config.prop_load.clone(), json!({ "checkbox": false }));
        }

        self.documents.update_page(page_id, update).await?;

        let chars = body.chars().count();
        info!(page_id, chars, %passage, %version, "page filled");
        Ok(FillOutcome::success(page_id, chars, passage, version))
    }

    /// Runs one batch over the database: select, optionally narrow or
    /// preview, then fill each candidate in selection order.
    ///
    /// A failure on one page never aborts the batch; it is recorded as a
    /// failure entry and processing continues. Writes already committed
    /// stay committed.
    pub async fn fill_batch(
        &self,
        database_id: &str,
        options: BatchOptions,
    ) -> Result<BatchReport, StoreError> {
        let mut pages = self.fetch_candidates(database_id, MAX_PAGE_SIZE).await?;

        if options.hard_empty_only {
            // 본문이 실제로 비어있는 페이지만 남긴다 (Load 플래그만 선택된 것 제외)
            pages.retain(|page| {
                extract_property(&page.properties, &self.config.prop_text)
                    .map_or(true, |value| value.is_falsy())
            });
        }

        let mut report = BatchReport {
            target_count: pages.len(),
            updated: 0,
            items: Vec::with_capacity(pages.len()),
        };

        if options.dry_run {
            report.items = pages.into_iter().map(|p| BatchItem::Id(p.id)).collect();
            return Ok(report);
        }

        for page in pages {
            match self.fill_one(&page.id).await {
                Ok(outcome) => {
                    if outcome.ok {
                        report.updated += 1;
                    }
                    report.items.push(BatchItem::Outcome(outcome));
                }
                Err(e) => {
                    warn!(page_id = %page.id, error = %e, "fill failed");
                    report
                        .items
                        .push(BatchItem::Outcome(FillOutcome::failure(
                            page.id,
                            e.to_string(),
                        )));
                }
            }
            self.throttle().await;
        }

        info!(
            database_id,
            target = report.target_count,
            updated = report.updated,
            "batch complete"
        );
        Ok(report)
    }
}
