use serde::{Deserialize, Serialize};

/// Default memory budget of an index writer, in bytes.
pub const DEFAULT_WRITER_MEMORY_BUDGET: usize = 50_000_000;

/// Default maximum number of query results.
pub const DEFAULT_QUERY_LIMIT: usize = 10;

/// Runtime configuration of an index handle.
///
/// The schema is not part of the configuration: it is fixed at index creation
/// and recovered from the index when opening.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Memory budget shared by the writer threads, in bytes.
    #[serde(default = "default_writer_memory_budget")]
    pub writer_memory_budget: usize,
    /// Number of indexing threads. `None` lets the engine decide.
    #[serde(default)]
    pub writer_threads: Option<usize>,
    /// Result limit used when a query does not give one.
    #[serde(default = "default_query_limit")]
    pub default_limit: usize,
}

fn default_writer_memory_budget() -> usize {
    DEFAULT_WRITER_MEMORY_BUDGET
}

fn default_query_limit() -> usize {
    DEFAULT_QUERY_LIMIT
}

impl IndexConfig {
    pub fn new() -> Self {
        Self {
            writer_memory_budget: DEFAULT_WRITER_MEMORY_BUDGET,
            writer_threads: None,
            default_limit: DEFAULT_QUERY_LIMIT,
        }
    }

    pub fn builder() -> IndexConfigBuilder {
        IndexConfigBuilder::default()
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Default)]
pub struct IndexConfigBuilder {
    config: IndexConfig,
}

impl IndexConfigBuilder {
    pub fn writer_memory_budget(mut self, bytes: usize) -> Self {
        self.config.writer_memory_budget = bytes;
        self
    }

    pub fn writer_threads(mut self, threads: usize) -> Self {
        self.config.writer_threads = Some(threads);
        self
    }

    pub fn default_limit(mut self, limit: usize) -> Self {
        self.config.default_limit = limit;
        self
    }

    pub fn build(self) -> IndexConfig {
        self.config
    }
}
