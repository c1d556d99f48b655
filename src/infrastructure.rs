//! Infrastructure layer for configuration, logging and remote store clients.

pub mod config;
pub mod logging;
pub mod notion;
pub mod properties;
pub mod supabase;

// Re-export commonly used items
pub use config::AppConfig;
pub use notion::NotionClient;
pub use properties::{PropertyValue, extract_property};
pub use supabase::SupabaseClient;
