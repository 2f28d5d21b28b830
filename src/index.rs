//! Index handles.
//!
//! An [`IndexHandle`] is the capability to operate on one engine-owned index.
//! It holds no document data itself. A handle is open from the moment a
//! constructor returns until [`IndexHandle::dispose`] succeeds; afterwards every
//! operation fails with [`FolioError::InvalidState`].
//!
//! The handle also guards the single-writer rule of the engine: at most one
//! [`WriterSession`] can be active per handle, and a second one fails fast with
//! [`FolioError::AlreadyActive`].

pub mod config;

use std::path::{Path, PathBuf};

use log::{debug, info};
use parking_lot::{Mutex, RwLock};
use uuid::Uuid;

use crate::engine::{Engine, TantivyEngine};
use crate::error::{FolioError, Result};
use crate::query::{QueryExecutor, QueryResult};
use crate::schema::SchemaDefinition;
use crate::schema::codec;
use crate::transpose::FieldPairs;
use crate::writer::WriterSession;

use self::config::{DEFAULT_QUERY_LIMIT, IndexConfig};

enum HandleState<I> {
    Open(I),
    Disposed,
}

/// Handle to one index owned by an [`Engine`].
///
/// Handles are `Send + Sync`: queries may run from many threads at once while a
/// single [`WriterSession`] writes.
///
/// # Example
///
/// ```rust,no_run
/// use folio::{Document, IndexHandle, SchemaDefinition};
///
/// let schema = SchemaDefinition::builder()
///     .add_text_field("title", Some("en_stem"), true)
///     .add_text_field("url", None, true)
///     .build()?;
/// let index = IndexHandle::create_in_ram(&schema)?;
///
/// let mut writer = index.writer()?;
/// writer.add_document(Document::new().add_text("title", "Hello, world").add_text("url", "a:1"))?;
/// writer.commit()?;
/// drop(writer);
///
/// let results = index.query("hello")?;
/// assert_eq!(results.len(), 1);
/// # Ok::<(), folio::FolioError>(())
/// ```
pub struct IndexHandle<E: Engine = TantivyEngine> {
    engine: E,
    default_limit: usize,
    schema: SchemaDefinition,
    path: Option<PathBuf>,
    state: RwLock<HandleState<E::Index>>,
    /// Token of the active writer session, if any.
    writer_slot: Mutex<Option<Uuid>>,
}

impl<E: Engine> std::fmt::Debug for IndexHandle<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexHandle")
            .field("engine", &self.engine)
            .field("path", &self.path)
            .field("fields", &self.schema.len())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

impl IndexHandle<TantivyEngine> {
    /// Create a new on-disk index in an existing directory.
    ///
    /// Fails with [`FolioError::PathConflict`] if an index already exists there,
    /// [`FolioError::NotFound`] if the directory does not exist, and
    /// [`FolioError::Schema`] if the engine cannot use the schema.
    pub fn create_in_dir(path: impl AsRef<Path>, schema: &SchemaDefinition) -> Result<Self> {
        Self::create_in_dir_with_config(IndexConfig::default(), path, schema)
    }

    /// Open the index stored in `path`, recovering its schema.
    ///
    /// Fails with [`FolioError::NotFound`] if no index exists there.
    pub fn open_in_dir(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_in_dir_with_config(IndexConfig::default(), path)
    }

    /// Create an ephemeral in-memory index. Nothing touches the filesystem.
    pub fn create_in_ram(schema: &SchemaDefinition) -> Result<Self> {
        Self::create_in_ram_with_config(IndexConfig::default(), schema)
    }

    /// [`IndexHandle::create_in_dir`] with writer settings and query limit
    /// taken from `config`.
    pub fn create_in_dir_with_config(
        config: IndexConfig,
        path: impl AsRef<Path>,
        schema: &SchemaDefinition,
    ) -> Result<Self> {
        Ok(Self::create_in_dir_with(TantivyEngine::new(&config), path, schema)?
            .with_default_limit(config.default_limit))
    }

    /// [`IndexHandle::open_in_dir`] with writer settings and query limit taken
    /// from `config`.
    pub fn open_in_dir_with_config(config: IndexConfig, path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::open_in_dir_with(TantivyEngine::new(&config), path)?
            .with_default_limit(config.default_limit))
    }

    /// [`IndexHandle::create_in_ram`] with writer settings and query limit
    /// taken from `config`.
    pub fn create_in_ram_with_config(config: IndexConfig, schema: &SchemaDefinition) -> Result<Self> {
        Ok(Self::create_in_ram_with(TantivyEngine::new(&config), schema)?
            .with_default_limit(config.default_limit))
    }
}

impl<E: Engine> IndexHandle<E> {
    /// [`IndexHandle::create_in_dir`] on an explicit engine. Writer settings
    /// are the engine's own.
    pub fn create_in_dir_with(
        engine: E,
        path: impl AsRef<Path>,
        schema: &SchemaDefinition,
    ) -> Result<Self> {
        let path = path.as_ref();
        let index = engine.create_index(Some(path), &codec::serialize(schema)?)?;
        info!("created index at {}", path.display());
        Ok(Self::from_parts(
            engine,
            schema.clone(),
            Some(path.to_path_buf()),
            index,
        ))
    }

    /// [`IndexHandle::open_in_dir`] on an explicit engine.
    pub fn open_in_dir_with(engine: E, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let opened = engine.open_index(path)?;
        let schema = codec::parse(&opened.serialized_schema)?;
        info!(
            "opened index at {} ({} fields)",
            path.display(),
            schema.len()
        );
        Ok(Self::from_parts(
            engine,
            schema,
            Some(path.to_path_buf()),
            opened.index,
        ))
    }

    /// [`IndexHandle::create_in_ram`] on an explicit engine.
    pub fn create_in_ram_with(engine: E, schema: &SchemaDefinition) -> Result<Self> {
        let index = engine.create_index(None, &codec::serialize(schema)?)?;
        info!("created in-memory index");
        Ok(Self::from_parts(engine, schema.clone(), None, index))
    }

    fn from_parts(
        engine: E,
        schema: SchemaDefinition,
        path: Option<PathBuf>,
        index: E::Index,
    ) -> Self {
        Self {
            engine,
            default_limit: DEFAULT_QUERY_LIMIT,
            schema,
            path,
            state: RwLock::new(HandleState::Open(index)),
            writer_slot: Mutex::new(None),
        }
    }

    /// Schema of the index.
    pub fn schema(&self) -> &SchemaDefinition {
        &self.schema
    }

    /// Directory of the index, `None` for in-memory indexes.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Result limit used when a query does not give one.
    pub fn default_limit(&self) -> usize {
        self.default_limit
    }

    /// Replace the default query limit.
    pub fn with_default_limit(mut self, limit: usize) -> Self {
        self.default_limit = limit;
        self
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn is_disposed(&self) -> bool {
        matches!(*self.state.read(), HandleState::Disposed)
    }

    /// Returns true while a writer session holds this handle.
    pub fn has_active_writer(&self) -> bool {
        self.writer_slot.lock().is_some()
    }

    /// Open a writer session. Shortcut for [`WriterSession::open`].
    pub fn writer(&self) -> Result<WriterSession<'_, E>> {
        WriterSession::open(self)
    }

    /// Query with the configured default limit.
    pub fn query(&self, text: &str) -> Result<QueryResult> {
        QueryExecutor::new(self).query(text)
    }

    /// Query returning at most `limit` documents.
    pub fn query_with_limit(&self, text: &str, limit: usize) -> Result<QueryResult> {
        QueryExecutor::new(self).limit(limit).query(text)
    }

    /// Release the engine resource.
    ///
    /// Fails with [`FolioError::InvalidState`] if the handle is already
    /// disposed or a writer session is active; the handle stays open in the
    /// latter case.
    pub fn dispose(&self) -> Result<()> {
        let mut state = self.state.write();
        if matches!(*state, HandleState::Disposed) {
            return Err(FolioError::invalid_state("index handle is already disposed"));
        }
        if self.writer_slot.lock().is_some() {
            return Err(FolioError::invalid_state(
                "cannot dispose an index while a writer session is active",
            ));
        }
        *state = HandleState::Disposed;
        info!(
            "disposed index{}",
            self.path
                .as_ref()
                .map(|p| format!(" at {}", p.display()))
                .unwrap_or_default()
        );
        Ok(())
    }

    /// Run `f` against the open index, or fail if the handle is disposed.
    pub(crate) fn with_index<T>(&self, f: impl FnOnce(&E, &E::Index) -> Result<T>) -> Result<T> {
        match &*self.state.read() {
            HandleState::Open(index) => f(&self.engine, index),
            HandleState::Disposed => Err(disposed()),
        }
    }

    /// Claim the writer slot and open the engine writer.
    pub(crate) fn acquire_writer(&self) -> Result<(Uuid, E::Writer)> {
        let state = self.state.read();
        let HandleState::Open(index) = &*state else {
            return Err(disposed());
        };

        let mut slot = self.writer_slot.lock();
        if slot.is_some() {
            return Err(FolioError::AlreadyActive);
        }

        let writer = self.engine.writer_open(index)?;
        let token = Uuid::new_v4();
        *slot = Some(token);
        debug!("writer session {token} opened");
        Ok((token, writer))
    }

    /// Give the writer slot back. Unknown tokens are ignored.
    pub(crate) fn release_writer(&self, token: Uuid) {
        let mut slot = self.writer_slot.lock();
        if *slot == Some(token) {
            *slot = None;
            debug!("writer session {token} released");
        }
    }

    pub(crate) fn stage(&self, token: Uuid, writer: &mut E::Writer, pairs: FieldPairs) -> Result<()> {
        self.check_token(token)?;
        self.with_index(|engine, index| engine.writer_add_document(index, writer, pairs))
    }

    pub(crate) fn commit_writer(&self, token: Uuid, writer: &mut E::Writer) -> Result<u64> {
        self.check_token(token)?;
        self.with_index(|engine, index| engine.writer_commit(index, writer))
    }

    fn check_token(&self, token: Uuid) -> Result<()> {
        if *self.writer_slot.lock() == Some(token) {
            Ok(())
        } else {
            Err(FolioError::invalid_state(
                "writer session does not hold this index",
            ))
        }
    }
}

fn disposed() -> FolioError {
    FolioError::invalid_state("index handle has been disposed")
}
