//! Writer sessions.
//!
//! A [`WriterSession`] is the only way to add documents to an index. It holds
//! the handle's writer slot from [`WriterSession::open`] until it is dropped.
//!
//! ```text
//! open ──▶ Active ──commit ok──▶ Committed
//!            │  ▲                    │ commit: returns the same ack
//!            │  └ add_document       │ add_document: InvalidState
//!            └──commit err──▶ Failed (every call: InvalidState)
//! ```
//!
//! Dropping a session in the `Active` state abandons its staged documents.

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::Serialize;
use uuid::Uuid;

use crate::data::Document;
use crate::engine::{Engine, TantivyEngine};
use crate::error::{FolioError, Result};
use crate::index::IndexHandle;
use crate::transpose::DocumentTransposer;

/// Lifecycle state of a [`WriterSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Accepting documents.
    Active,
    /// Committed; no further writes.
    Committed,
    /// A commit failed; the session is unusable.
    Failed,
}

/// Acknowledgement of a successful commit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommitAck {
    opstamp: u64,
    documents: usize,
    committed_at: DateTime<Utc>,
    session: Uuid,
}

impl CommitAck {
    /// Engine operation stamp of the commit.
    pub fn opstamp(&self) -> u64 {
        self.opstamp
    }

    /// Number of documents made durable by the commit.
    pub fn documents(&self) -> usize {
        self.documents
    }

    pub fn committed_at(&self) -> DateTime<Utc> {
        self.committed_at
    }

    /// Token of the session that committed.
    pub fn session(&self) -> Uuid {
        self.session
    }
}

/// Exclusive write context on an [`IndexHandle`].
pub struct WriterSession<'a, E: Engine = TantivyEngine> {
    handle: &'a IndexHandle<E>,
    token: Uuid,
    writer: Option<E::Writer>,
    state: SessionState,
    staged: usize,
    ack: Option<CommitAck>,
}

impl<E: Engine> std::fmt::Debug for WriterSession<'_, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WriterSession")
            .field("token", &self.token)
            .field("state", &self.state)
            .field("staged", &self.staged)
            .finish()
    }
}

impl<'a, E: Engine> WriterSession<'a, E> {
    /// Acquire exclusive write access to `handle`.
    ///
    /// Fails with [`FolioError::AlreadyActive`] if another session is active on
    /// the same handle and with [`FolioError::InvalidState`] if the handle has
    /// been disposed.
    pub fn open(handle: &'a IndexHandle<E>) -> Result<Self> {
        let (token, writer) = handle.acquire_writer()?;
        Ok(Self {
            handle,
            token,
            writer: Some(writer),
            state: SessionState::Active,
            staged: 0,
            ack: None,
        })
    }

    /// Validate and stage one document.
    ///
    /// Fails with [`FolioError::Validation`] if the document does not fit the
    /// schema, and with [`FolioError::Engine`] if the engine rejects it. In both
    /// cases the document is not staged and the session stays usable.
    pub fn add_document(&mut self, doc: Document) -> Result<()> {
        self.ensure_active()?;
        let handle = self.handle;
        let pairs = DocumentTransposer::new(handle.schema()).transpose(&doc)?;
        let writer = self.writer.as_mut().ok_or_else(failed)?;
        handle.stage(self.token, writer, pairs)?;
        self.staged += 1;
        debug!("writer session {}: staged document #{}", self.token, self.staged);
        Ok(())
    }

    /// Stage documents one after another.
    ///
    /// Not atomic: if document `k` fails, documents before `k` stay staged and
    /// the error for `k` is returned. Returns the number of documents staged by
    /// this call.
    pub fn add_documents<I>(&mut self, docs: I) -> Result<usize>
    where
        I: IntoIterator<Item = Document>,
    {
        let mut added = 0;
        for doc in docs {
            self.add_document(doc)?;
            added += 1;
        }
        Ok(added)
    }

    /// Durably flush staged documents.
    ///
    /// After a successful commit the session accepts no more documents, and
    /// calling `commit` again returns the same acknowledgement without touching
    /// the engine. If the engine fails, the session becomes
    /// [`SessionState::Failed`] and every later call fails with
    /// [`FolioError::InvalidState`].
    pub fn commit(&mut self) -> Result<CommitAck> {
        match self.state {
            SessionState::Committed => {
                if let Some(ack) = &self.ack {
                    return Ok(ack.clone());
                }
            }
            SessionState::Failed => return Err(failed()),
            SessionState::Active => {}
        }

        let Some(writer) = self.writer.as_mut() else {
            return Err(failed());
        };

        match self.handle.commit_writer(self.token, writer) {
            Ok(opstamp) => {
                let ack = CommitAck {
                    opstamp,
                    documents: self.staged,
                    committed_at: Utc::now(),
                    session: self.token,
                };
                info!(
                    "writer session {}: committed {} documents at opstamp {}",
                    self.token, self.staged, opstamp
                );
                self.state = SessionState::Committed;
                self.staged = 0;
                self.writer = None;
                self.ack = Some(ack.clone());
                Ok(ack)
            }
            Err(err) => {
                warn!("writer session {}: commit failed: {err}", self.token);
                self.state = SessionState::Failed;
                self.writer = None;
                Err(err)
            }
        }
    }

    /// Number of documents staged and not yet committed.
    pub fn staged(&self) -> usize {
        self.staged
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Token identifying this session to its handle.
    pub fn token(&self) -> Uuid {
        self.token
    }

    fn ensure_active(&self) -> Result<()> {
        match self.state {
            SessionState::Active => Ok(()),
            SessionState::Committed => Err(FolioError::invalid_state(
                "writer session has been committed; open a new session to write again",
            )),
            SessionState::Failed => Err(failed()),
        }
    }
}

impl<E: Engine> Drop for WriterSession<'_, E> {
    fn drop(&mut self) {
        if self.state == SessionState::Active && self.staged > 0 {
            warn!(
                "writer session {}: abandoning {} uncommitted documents",
                self.token, self.staged
            );
        }
        // The engine writer must be gone before another session can claim the slot.
        drop(self.writer.take());
        self.handle.release_writer(self.token);
    }
}

fn failed() -> FolioError {
    FolioError::invalid_state("writer session failed to commit; open a new session")
}
