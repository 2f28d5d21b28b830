//! Boundary to the retrieval engine.
//!
//! Folio never tokenizes, scores or lays out segments itself. All of that
//! belongs to an [`Engine`], reached through six primitives:
//!
//! ```text
//! create_index(path_or_none, serialized_schema) -> index
//! open_index(path)                              -> index + serialized_schema
//! writer_open(index)                            -> writer
//! writer_add_document(index, writer, pairs)     -> ()
//! writer_commit(index, writer)                  -> opstamp
//! query(index, text, limit)                     -> [{field: [values]}]
//! ```
//!
//! The default implementation is [`TantivyEngine`].

pub mod tantivy_index;

use std::collections::BTreeMap;
use std::path::Path;

use crate::data::FieldValue;
use crate::error::Result;
use crate::transpose::FieldPairs;

pub use self::tantivy_index::TantivyEngine;

/// Capability interface of a retrieval engine.
///
/// Implementations own the index resources; Folio only holds the
/// [`Engine::Index`] and [`Engine::Writer`] values they hand out and passes
/// them back on every call.
///
/// Error mapping expected from implementations:
/// - `create_index`: [`FolioError::PathConflict`](crate::FolioError::PathConflict)
///   when index metadata already exists at the path,
///   [`FolioError::NotFound`](crate::FolioError::NotFound) when the directory
///   does not exist, [`FolioError::Schema`](crate::FolioError::Schema) when the
///   schema text is unusable.
/// - `open_index`: [`FolioError::NotFound`](crate::FolioError::NotFound) when no
///   metadata exists at the path.
/// - `query`: [`FolioError::Query`](crate::FolioError::Query) on unparsable text.
/// - anything else: [`FolioError::Engine`](crate::FolioError::Engine).
pub trait Engine: Send + Sync + std::fmt::Debug {
    /// Engine-owned index resource.
    type Index: Send + Sync;
    /// Engine-owned write context. At most one exists per index at a time.
    type Writer: Send;

    /// Create an index. `None` creates an ephemeral in-memory index.
    fn create_index(&self, path: Option<&Path>, serialized_schema: &str) -> Result<Self::Index>;

    /// Open an existing on-disk index and return the schema text stored with it.
    fn open_index(&self, path: &Path) -> Result<OpenedIndex<Self::Index>>;

    /// Open the write context of an index.
    fn writer_open(&self, index: &Self::Index) -> Result<Self::Writer>;

    /// Stage one document, given as ordered field/value pairs.
    fn writer_add_document(
        &self,
        index: &Self::Index,
        writer: &mut Self::Writer,
        pairs: FieldPairs,
    ) -> Result<()>;

    /// Durably flush staged documents and make them visible to queries.
    /// Returns the engine's opstamp for the commit.
    fn writer_commit(&self, index: &Self::Index, writer: &mut Self::Writer) -> Result<u64>;

    /// Run a query and return at most `limit` hits, best first.
    fn query(&self, index: &Self::Index, text: &str, limit: usize) -> Result<Vec<RawHit>>;
}

/// An index opened from disk together with its stored schema text.
#[derive(Debug)]
pub struct OpenedIndex<I> {
    pub index: I,
    pub serialized_schema: String,
}

/// One hit as returned by an engine.
#[derive(Debug, Clone, PartialEq)]
pub struct RawHit {
    /// Relevance score, higher is better.
    pub score: f32,
    /// Retrieved values by field name.
    pub fields: BTreeMap<String, Vec<FieldValue>>,
}
