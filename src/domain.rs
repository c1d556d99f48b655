//! Domain module - core entities and pure logic
//!
//! Modern Rust module organization (Rust 2018+ style):
//! - Each module is its own file in the domain/ directory
//! - Public exports are defined here for convenience

pub mod chunk;
pub mod entities;
pub mod stores;

// Re-export commonly used items for convenience
pub use chunk::{TextChunk, chunk_text};
pub use entities::{BatchItem, BatchOptions, BatchReport, FillOutcome, Page, QueryResponse};
pub use stores::{DocumentStore, SourceStore, StoreError};
