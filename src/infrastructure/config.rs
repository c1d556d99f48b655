//! Configuration infrastructure
//!
//! All settings come from environment variables with documented defaults
//! and are validated once at startup; components receive the validated
//! config explicitly instead of reading ambient globals.

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::env;

/// Default values applied when the corresponding variable is unset.
pub mod defaults {
    pub const PROP_PASSAGE: &str = "PassageKey";
    pub const PROP_VERSION: &str = "version";
    pub const PROP_TEXT: &str = "B_Text";
    pub const PROP_LOAD: &str = "Load";
    pub const PROP_LAST_SYNCED: &str = "LastSynced";

    pub const SUPA_TABLE: &str = "노션DB";
    pub const COL_PASSAGE: &str = "PassageKey";
    pub const COL_VERSION: &str = "version";
    pub const COL_TEXT: &str = "B_Text";

    pub const DEFAULT_VERSION: &str = "KJV";
    pub const MAX_RICH_TEXT: usize = 31_000;
    pub const SLEEP_MS: u64 = 150;
    pub const EMPTY_TEXT_IS_MISSING: bool = true;
}

/// Complete application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Bearer credential for the document store API.
    pub notion_token: String,
    /// Database queried when no database id is given explicitly.
    pub notion_db_id: String,

    /// Property holding the passage key joining the two stores.
    pub prop_passage: String,
    /// Property holding the version/variant tag (select).
    pub prop_version: String,
    /// Rich-text property receiving the passage body.
    pub prop_text: String,
    /// Checkbox requesting an unconditional refill.
    pub prop_load: String,
    /// Date property stamped on every successful write.
    pub prop_last_synced: String,

    /// Supabase project base URL.
    pub supabase_url: String,
    /// Supabase service key (sent as apikey + bearer).
    pub supabase_key: String,
    pub supa_table: String,
    pub col_passage: String,
    pub col_version: String,
    pub col_text: String,

    /// Version used when a page carries none.
    pub default_version: String,
    /// Maximum characters per rich-text element.
    pub max_rich_text: usize,
    /// Fixed delay between remote requests in milliseconds. This is a
    /// rate-limit throttle imposed by the upstream store, not tuning.
    pub sleep_ms: u64,
    /// Whether an empty text column in the source store counts as
    /// not-found (true) or as a legitimate empty body (false).
    pub empty_text_is_missing: bool,
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

impl AppConfig {
    /// Loads and validates the configuration from the environment.
    /// A missing required setting is fatal at startup.
    pub fn from_env() -> Result<Self> {
        let max_rich_text = match env::var("MAX_RICH_TEXT") {
            Ok(raw) => raw
                .parse::<usize>()
                .with_context(|| format!("MAX_RICH_TEXT is not a number: {raw}"))?,
            Err(_) => defaults::MAX_RICH_TEXT,
        };
        let sleep_ms = match env::var("SLEEP_MS") {
            Ok(raw) => raw
                .parse::<u64>()
                .with_context(|| format!("SLEEP_MS is not a number: {raw}"))?,
            Err(_) => defaults::SLEEP_MS,
        };
        let empty_text_is_missing = match env::var("EMPTY_TEXT_IS_MISSING") {
            Ok(raw) => raw
                .parse::<bool>()
                .with_context(|| format!("EMPTY_TEXT_IS_MISSING is not a bool: {raw}"))?,
            Err(_) => defaults::EMPTY_TEXT_IS_MISSING,
        };

        let config = Self {
            notion_token: var_or("NOTION_TOKEN", ""),
            notion_db_id: var_or("NOTION_DB_ID", ""),
            prop_passage: var_or("NOTION_PROP_PASSAGE", defaults::PROP_PASSAGE),
            prop_version: var_or("NOTION_PROP_VERSION", defaults::PROP_VERSION),
            prop_text: var_or("NOTION_PROP_TEXT", defaults::PROP_TEXT),
            prop_load: var_or("NOTION_PROP_LOAD", defaults::PROP_LOAD),
            prop_last_synced: var_or("NOTION_PROP_LASTSYNCED", defaults::PROP_LAST_SYNCED),
            supabase_url: var_or("SUPABASE_URL", ""),
            supabase_key: var_or("SUPABASE_KEY", ""),
            supa_table: var_or("SUPA_TABLE", defaults::SUPA_TABLE),
            col_passage: var_or("SUPA_COL_PASSAGE", defaults::COL_PASSAGE),
            col_version: var_or("SUPA_COL_VERSION", defaults::COL_VERSION),
            col_text: var_or("SUPA_COL_TEXT", defaults::COL_TEXT),
            default_version: var_or("DEFAULT_VERSION", defaults::DEFAULT_VERSION),
            max_rich_text,
            sleep_ms,
            empty_text_is_missing,
        };
        config.validate()?;
        Ok(config)
    }

    /// Refuses to start with missing credentials, empty name mappings or a
    /// zero chunk size.
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("NOTION_TOKEN", &self.notion_token),
            ("NOTION_DB_ID", &self.notion_db_id),
            ("SUPABASE_URL", &self.supabase_url),
            ("SUPABASE_KEY", &self.supabase_key),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                bail!("required setting {name} is missing or empty");
            }
        }
        let names = [
            ("NOTION_PROP_PASSAGE", &self.prop_passage),
            ("NOTION_PROP_VERSION", &self.prop_version),
            ("NOTION_PROP_TEXT", &self.prop_text),
            ("NOTION_PROP_LOAD", &self.prop_load),
            ("NOTION_PROP_LASTSYNCED", &self.prop_last_synced),
            ("SUPA_TABLE", &self.supa_table),
            ("SUPA_COL_PASSAGE", &self.col_passage),
            ("SUPA_COL_VERSION", &self.col_version),
            ("SUPA_COL_TEXT", &self.col_text),
            ("DEFAULT_VERSION", &self.default_version),
        ];
        for (name, value) in names {
            if value.trim().is_empty() {
                bail!("name mapping {name} must not be empty");
            }
        }
        if self.max_rich_text == 0 {
            bail!("MAX_RICH_TEXT must be at least 1");
        }
        Ok(())
    }
}
