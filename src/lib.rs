//! # Folio
//!
//! A thin, typed document-indexing layer over an embedded full-text engine.
//!
//! ## Features
//!
//! - Declarative schemas with a canonical, versioned JSON form
//! - Documents validated against the schema before they reach the engine
//! - Single-writer sessions with explicit commit
//! - Concurrent queries returning stored fields ordered by relevance
//! - Pluggable engine boundary, with a tantivy-backed default

// Core modules
mod data;
pub mod engine;
mod error;
pub mod index;
mod query;
pub mod schema;
pub mod transpose;
mod writer;

// Re-exports for the public API
pub use data::{Document, FieldValue};
pub use engine::{Engine, TantivyEngine};
pub use error::{FolioError, Result};
pub use index::IndexHandle;
pub use index::config::{IndexConfig, IndexConfigBuilder};
pub use query::{QueryExecutor, QueryResult, ResultDocument};
pub use schema::field::{FieldSpec, FieldType, IndexRecord, IndexingOptions, RawFieldSpec};
pub use schema::{SchemaBuilder, SchemaDefinition};
pub use transpose::DocumentTransposer;
pub use writer::{CommitAck, SessionState, WriterSession};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
