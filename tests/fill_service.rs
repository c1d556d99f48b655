//! Fill service tests against in-memory store doubles.
//!
//! The doubles honor the same contracts as the production clients: the
//! document store evaluates the or-filter and serves cursor-paginated
//! results, the source store resolves (passage, version) with the
//! passage-only fallback.

use async_trait::async_trait;
use serde_json::{Map, Value, json};
use std::sync::{Arc, Mutex};

use notion_textfill::application::FillService;
use notion_textfill::domain::entities::{BatchItem, BatchOptions, Page, QueryResponse};
use notion_textfill::domain::stores::{DocumentStore, SourceStore, StoreError};
use notion_textfill::infrastructure::config::{AppConfig, defaults};

fn test_config() -> Arc<AppConfig> {
    Arc::new(AppConfig {
        notion_token: "test-token".into(),
        notion_db_id: "db-main".into(),
        prop_passage: defaults::PROP_PASSAGE.into(),
        prop_version: defaults::PROP_VERSION.into(),
        prop_text: defaults::PROP_TEXT.into(),
        prop_load: defaults::PROP_LOAD.into(),
        prop_last_synced: defaults::PROP_LAST_SYNCED.into(),
        supabase_url: "http://localhost".into(),
        supabase_key: "test-key".into(),
        supa_table: defaults::SUPA_TABLE.into(),
        col_passage: defaults::COL_PASSAGE.into(),
        col_version: defaults::COL_VERSION.into(),
        col_text: defaults::COL_TEXT.into(),
        default_version: defaults::DEFAULT_VERSION.into(),
        max_rich_text: 10,
        sleep_ms: 0,
        empty_text_is_missing: true,
    })
}

/// In-memory document store evaluating the selection filter and serving
/// cursor-paginated results; successful patches merge into stored pages
/// so re-selection observes them.
#[derive(Default)]
struct FakeDocumentStore {
    pages: Mutex<Vec<Page>>,
    updates: Mutex<Vec<(String, Map<String, Value>)>>,
}

impl FakeDocumentStore {
    fn with_pages(pages: Vec<Page>) -> Self {
        Self {
            pages: Mutex::new(pages),
            updates: Mutex::new(Vec::new()),
        }
    }

    fn update_count(&self) -> usize {
        self.updates.lock().unwrap().len()
    }

    fn matches(page: &Page, filter: &Value) -> bool {
        let Some(conditions) = filter.get("or").and_then(Value::as_array) else {
            return true;
        };
        conditions.iter().any(|condition| {
            let prop = condition.get("property").and_then(Value::as_str).unwrap();
            let value = page.properties.get(prop);
            if let Some(expected) = condition
                .get("checkbox")
                .and_then(|c| c.get("equals"))
                .and_then(Value::as_bool)
            {
                return value
                    .and_then(|v| v.get("checkbox"))
                    .and_then(Value::as_bool)
                    == Some(expected);
            }
            if condition
                .get("rich_text")
                .and_then(|c| c.get("is_empty"))
                .and_then(Value::as_bool)
                == Some(true)
            {
                return value
                    .and_then(|v| v.get("rich_text"))
                    .and_then(Value::as_array)
                    .is_none_or(|items| items.is_empty());
            }
            false
        })
    }
}

#[async_trait]
impl DocumentStore for FakeDocumentStore {
    async fn get_page(&self, page_id: &str) -> Result<Page, StoreError> {
        self.pages
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.id == page_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                page_id: page_id.to_string(),
            })
    }

    async fn query_database(
        &self,
        _database_id: &str,
        payload: &Value,
    ) -> Result<QueryResponse, StoreError> {
        let page_size = payload["page_size"].as_u64().unwrap() as usize;
        let start = payload
            .get("start_cursor")
            .and_then(Value::as_str)
            .map_or(0, |c| c.parse::<usize>().unwrap());
        let filter = &payload["filter"];

        let matching: Vec<Page> = self
            .pages
            .lock()
            .unwrap()
            .iter()
            .filter(|p| Self::matches(p, filter))
            .cloned()
            .collect();

        let results: Vec<Page> = matching.iter().skip(start).take(page_size).cloned().collect();
        let has_more = start + results.len() < matching.len();
        Ok(QueryResponse {
            next_cursor: has_more.then(|| (start + results.len()).to_string()),
            has_more,
            results,
        })
    }

    async fn update_page(
        &self,
        page_id: &str,
        properties: Map<String, Value>,
    ) -> Result<(), StoreError> {
        let mut pages = self.pages.lock().unwrap();
        let page = pages
            .iter_mut()
            .find(|p| p.id == page_id)
            .ok_or_else(|| StoreError::NotFound {
                page_id: page_id.to_string(),
            })?;
        for (key, value) in &properties {
            let mut merged = value.as_object().cloned().unwrap_or_default();
            if !merged.contains_key("type") {
                if let Some(kind) = merged.keys().next().cloned() {
                    merged.insert("type".into(), json!(kind));
                }
            }
            page.properties.insert(key.clone(), Value::Object(merged));
        }
        drop(pages);
        self.updates.lock().unwrap().push((page_id.to_string(), properties));
        Ok(())
    }
}

/// In-memory source table with the passage-only fallback.
struct FakeSourceStore {
    rows: Vec<(String, String, String)>,
}

impl FakeSourceStore {
    fn new(rows: &[(&str, &str, &str)]) -> Self {
        Self {
            rows: rows
                .iter()
                .map(|(p, v, t)| (p.to_string(), v.to_string(), t.to_string()))
                .collect(),
        }
    }
}

#[async_trait]
impl SourceStore for FakeSourceStore {
    async fn fetch_text(&self, passage: &str, version: &str) -> Option<String> {
        self.rows
            .iter()
            .find(|(p, v, _)| p == passage && v == version)
            .or_else(|| self.rows.iter().find(|(p, _, _)| p == passage))
            .map(|(_, _, t)| t.clone())
            .filter(|t| !t.is_empty())
    }
}

fn checkbox(value: bool) -> Value {
    json!({"type": "checkbox", "checkbox": value})
}

fn rich_text(content: &str) -> Value {
    let fragments: Vec<Value> = if content.is_empty() {
        Vec::new()
    } else {
        vec![json!({"plain_text": content})]
    };
    json!({"type": "rich_text", "rich_text": fragments})
}

fn select(name: &str) -> Value {
    json!({"type": "select", "select": {"name": name}})
}

fn page(id: &str, props: Value) -> Page {
    Page {
        id: id.to_string(),
        properties: props.as_object().unwrap().clone(),
    }
}

fn service(
    documents: Arc<FakeDocumentStore>,
    source: Arc<FakeSourceStore>,
) -> FillService {
    FillService::new(test_config(), documents, source)
}

#[tokio::test]
async fn selection_predicate_covers_flag_and_empty_text() {
    let documents = Arc::new(FakeDocumentStore::with_pages(vec![
        page("flagged-nonempty", json!({"Load": checkbox(true), "B_Text": rich_text("kept")})),
        page("unflagged-empty", json!({"Load": checkbox(false), "B_Text": rich_text("")})),
        page("unflagged-nonempty", json!({"Load": checkbox(false), "B_Text": rich_text("kept")})),
    ]));
    let svc = service(documents, Arc::new(FakeSourceStore::new(&[])));

    let candidates = svc.fetch_candidates("db-main", 100).await.unwrap();
    let ids: Vec<&str> = candidates.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["flagged-nonempty", "unflagged-empty"]);
}

#[tokio::test]
async fn pagination_follows_cursor_in_server_order() {
    let pages: Vec<Page> = (0..5)
        .map(|i| page(&format!("p{i}"), json!({"B_Text": rich_text("")})))
        .collect();
    let documents = Arc::new(FakeDocumentStore::with_pages(pages));
    let svc = service(documents, Arc::new(FakeSourceStore::new(&[])));

    // page_size 2 forces three round-trips
    let candidates = svc.fetch_candidates("db-main", 2).await.unwrap();
    let ids: Vec<&str> = candidates.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["p0", "p1", "p2", "p3", "p4"]);
}

#[tokio::test]
async fn dry_run_performs_zero_writes_and_lists_all_candidates() {
    let documents = Arc::new(FakeDocumentStore::with_pages(vec![
        page("a", json!({"B_Text": rich_text("")})),
        page("b", json!({"Load": checkbox(true), "B_Text": rich_text("full")})),
    ]));
    let svc = service(
        Arc::clone(&documents),
        Arc::new(FakeSourceStore::new(&[("John 3:16", "KJV", "text")])),
    );

    let report = svc
        .fill_batch(
            "db-main",
            BatchOptions {
                dry_run: true,
                hard_empty_only: false,
            },
        )
        .await
        .unwrap();

    assert_eq!(report.target_count, 2);
    assert_eq!(report.updated, 0);
    assert_eq!(documents.update_count(), 0);
    let ids: Vec<&str> = report
        .items
        .iter()
        .map(|item| match item {
            BatchItem::Id(id) => id.as_str(),
            BatchItem::Outcome(_) => panic!("dry run must return bare ids"),
        })
        .collect();
    assert_eq!(ids, vec!["a", "b"]);
}

#[tokio::test]
async fn hard_empty_only_drops_force_reload_candidates_with_text() {
    let documents = Arc::new(FakeDocumentStore::with_pages(vec![
        page(
            "flagged-full",
            json!({"Load": checkbox(true), "B_Text": rich_text("already here")}),
        ),
        page(
            "truly-empty",
            json!({"PassageKey": rich_text("John 3:16"), "B_Text": rich_text("")}),
        ),
    ]));
    let svc = service(
        Arc::clone(&documents),
        Arc::new(FakeSourceStore::new(&[("John 3:16", "KJV", "For God so loved")])),
    );

    let report = svc
        .fill_batch(
            "db-main",
            BatchOptions {
                dry_run: false,
                hard_empty_only: true,
            },
        )
        .await
        .unwrap();

    assert_eq!(report.target_count, 1);
    assert_eq!(report.updated, 1);
    let updates = documents.updates.lock().unwrap();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].0, "truly-empty");
}

#[tokio::test]
async fn batch_isolates_per_page_failures() {
    let documents = Arc::new(FakeDocumentStore::with_pages(vec![
        page("no-key", json!({"B_Text": rich_text("")})),
        page(
            "no-source",
            json!({"PassageKey": rich_text("Mark 1:1"), "B_Text": rich_text("")}),
        ),
        page(
            "resolvable",
            json!({
                "PassageKey": rich_text("John 3:16"),
                "version": select("KJV"),
                "Load": checkbox(true),
                "B_Text": rich_text("")
            }),
        ),
    ]));
    let body = "For God so loved the world";
    let svc = service(
        Arc::clone(&documents),
        Arc::new(FakeSourceStore::new(&[("John 3:16", "KJV", body)])),
    );

    let report = svc
        .fill_batch("db-main", BatchOptions::default())
        .await
        .unwrap();

    assert_eq!(report.target_count, 3);
    assert_eq!(report.updated, 1);
    assert_eq!(report.items.len(), 3);

    let outcomes: Vec<_> = report
        .items
        .iter()
        .map(|item| match item {
            BatchItem::Outcome(o) => o,
            BatchItem::Id(_) => panic!("normal mode must return full outcomes"),
        })
        .collect();

    assert!(!outcomes[0].ok);
    assert!(outcomes[0].error.as_deref().unwrap().contains("PassageKey"));
    assert!(!outcomes[1].ok);
    assert!(
        outcomes[1]
            .error
            .as_deref()
            .unwrap()
            .contains("no source text for Mark 1:1/KJV")
    );
    assert!(outcomes[2].ok);
    assert_eq!(outcomes[2].chars, Some(body.chars().count()));
    assert_eq!(outcomes[2].passage.as_deref(), Some("John 3:16"));
    assert_eq!(outcomes[2].version.as_deref(), Some("KJV"));

    // Only the resolvable page was written.
    let updates = documents.updates.lock().unwrap();
    assert_eq!(updates.len(), 1);
    let (id, props) = &updates[0];
    assert_eq!(id, "resolvable");

    // Chunked at max_rich_text=10 and lossless when concatenated.
    let chunks = props["B_Text"]["rich_text"].as_array().unwrap();
    assert!(chunks.len() > 1);
    let joined: String = chunks
        .iter()
        .map(|c| c["text"]["content"].as_str().unwrap())
        .collect();
    assert_eq!(joined, body);
    for chunk in chunks {
        assert!(chunk["text"]["content"].as_str().unwrap().chars().count() <= 10);
    }

    // Sync timestamp present, force-reload flag cleared.
    assert!(props["LastSynced"]["date"]["start"].is_string());
    assert_eq!(props["Load"], json!({"checkbox": false}));
}

#[tokio::test]
async fn load_flag_untouched_when_not_a_checkbox() {
    let documents = Arc::new(FakeDocumentStore::with_pages(vec![page(
        "no-flag",
        json!({"PassageKey": rich_text("John 3:16"), "B_Text": rich_text("")}),
    )]));
    let svc = service(
        Arc::clone(&documents),
        Arc::new(FakeSourceStore::new(&[("John 3:16", "KJV", "text")])),
    );

    let outcome = svc.fill_one("no-flag").await.unwrap();
    assert!(outcome.ok);

    let updates = documents.updates.lock().unwrap();
    assert!(!updates[0].1.contains_key("Load"));
}

#[tokio::test]
async fn fill_one_uses_default_version_when_page_has_none() {
    let documents = Arc::new(FakeDocumentStore::with_pages(vec![page(
        "versionless",
        json!({"PassageKey": rich_text("John 3:16"), "B_Text": rich_text("")}),
    )]));
    let svc = service(
        Arc::clone(&documents),
        Arc::new(FakeSourceStore::new(&[("John 3:16", "KJV", "text")])),
    );

    let outcome = svc.fill_one("versionless").await.unwrap();
    assert!(outcome.ok);
    assert_eq!(outcome.version.as_deref(), Some("KJV"));
}

#[tokio::test]
async fn fill_one_propagates_store_errors() {
    let documents = Arc::new(FakeDocumentStore::default());
    let svc = service(documents, Arc::new(FakeSourceStore::new(&[])));

    let err = svc.fill_one("ghost").await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound { .. }));
}

#[tokio::test]
async fn source_store_fallback_matrix() {
    let source = FakeSourceStore::new(&[("A", "V1", "T1"), ("A", "V2", "T2")]);

    assert_eq!(source.fetch_text("A", "V1").await.as_deref(), Some("T1"));
    assert_eq!(source.fetch_text("A", "V2").await.as_deref(), Some("T2"));
    // Unknown version falls back to the first row for the passage.
    assert_eq!(
        source.fetch_text("A", "missing-version").await.as_deref(),
        Some("T1")
    );
    assert_eq!(source.fetch_text("missing-passage", "V1").await, None);
}

#[tokio::test]
async fn rerun_after_successful_batch_converges_to_zero_targets() {
    let documents = Arc::new(FakeDocumentStore::with_pages(vec![page(
        "fillme",
        json!({
            "PassageKey": rich_text("John 3:16"),
            "Load": checkbox(true),
            "B_Text": rich_text("")
        }),
    )]));
    let svc = service(
        Arc::clone(&documents),
        Arc::new(FakeSourceStore::new(&[("John 3:16", "KJV", "For God so loved")])),
    );

    let first = svc
        .fill_batch("db-main", BatchOptions::default())
        .await
        .unwrap();
    assert_eq!(first.target_count, 1);
    assert_eq!(first.updated, 1);

    // The write filled the text and cleared the flag, so nothing matches.
    let second = svc
        .fill_batch("db-main", BatchOptions::default())
        .await
        .unwrap();
    assert_eq!(second.target_count, 0);
    assert_eq!(second.updated, 0);
    assert!(second.items.is_empty());
}
