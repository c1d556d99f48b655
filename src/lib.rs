//! notion-textfill - fills empty Notion text properties from Supabase
//!
//! Selects database pages flagged for reload or with an empty text
//! property, resolves each page's passage text from a Supabase table,
//! chunks it to the rich-text size limit and patches it back, clearing
//! the reload flag and stamping a sync timestamp.

// Module declarations
pub mod application;
pub mod domain;
pub mod infrastructure;

// Re-export the main entry points for easier access
pub use application::FillService;
pub use domain::{BatchOptions, BatchReport, FillOutcome};
pub use infrastructure::AppConfig;
