//! Persistence context: pending-change staging and the atomic write.
//!
//! # Responsibility
//! - Track the writes staged during one logical operation.
//! - Apply the whole pending set as a single SQLite transaction.
//!
//! # Invariants
//! - Staged writes touch the store only inside `save_changes`.
//! - A context that failed a save refuses all further work.
//! - The disposed flag is final; nothing clears it.

use crate::db::DbError;
use log::{error, info};
use parking_lot::Mutex;
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::Instant;

/// Context handle shared between a unit of work and its repositories.
///
/// Never shared across logical operations; the mutex only covers the thread
/// hop of the blocking write task.
pub type SharedContext = Arc<Mutex<StoreContext>>;

/// Commit-time persistence failures. Terminal for the owning unit of work.
#[derive(Debug)]
pub enum PersistenceError {
    /// The store rejected the transaction (constraint, I/O, connectivity).
    Write(DbError),
    /// A staged update or delete matched no row at save time.
    Conflict { key: String },
    /// The context already failed a save and must be discarded.
    Unusable,
    /// The blocking write task was cancelled or panicked.
    Background(String),
}

impl Display for PersistenceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Write(err) => write!(f, "store rejected the transaction: {err}"),
            Self::Conflict { key } => {
                write!(f, "staged write for `{key}` matched no row at save time")
            }
            Self::Unusable => write!(f, "context already failed a save and must be discarded"),
            Self::Background(message) => write!(f, "background write task failed: {message}"),
        }
    }
}

impl Error for PersistenceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Write(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for PersistenceError {
    fn from(value: DbError) -> Self {
        Self::Write(value)
    }
}

/// What kind of write a staged entry performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StagedKind {
    Insert,
    Update,
    Delete,
}

/// One deferred write, applied only inside `save_changes`.
///
/// The closure carries the captured entity state; the key is kept alongside
/// for pending-overlay lookups and log events.
pub struct StagedWrite {
    kind: StagedKind,
    key: String,
    apply: Box<dyn FnOnce(&Connection) -> rusqlite::Result<usize> + Send>,
}

impl StagedWrite {
    pub fn new(
        kind: StagedKind,
        key: impl Into<String>,
        apply: impl FnOnce(&Connection) -> rusqlite::Result<usize> + Send + 'static,
    ) -> Self {
        Self {
            kind,
            key: key.into(),
            apply: Box::new(apply),
        }
    }

    pub fn kind(&self) -> StagedKind {
        self.kind
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

/// Owner of one store connection and the pending-change set for one logical
/// operation.
pub struct StoreContext {
    conn: Connection,
    pending: Vec<StagedWrite>,
    disposed: bool,
    failed: bool,
}

impl StoreContext {
    /// Wraps an already-bootstrapped connection.
    pub fn new(conn: Connection) -> Self {
        Self {
            conn,
            pending: Vec::new(),
            disposed: false,
            failed: false,
        }
    }

    /// Moves the context behind the shared handle repositories clone.
    pub fn into_shared(self) -> SharedContext {
        Arc::new(Mutex::new(self))
    }

    /// Read access for committed-state queries.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Final; nothing clears the flag afterwards.
    pub fn mark_disposed(&mut self) {
        self.disposed = true;
    }

    pub fn is_failed(&self) -> bool {
        self.failed
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Appends one deferred write to the pending set.
    pub fn stage(&mut self, write: StagedWrite) {
        self.pending.push(write);
    }

    /// Effective staged state for a key; the latest staged write wins.
    pub fn staged_kind(&self, key: &str) -> Option<StagedKind> {
        self.pending
            .iter()
            .rev()
            .find(|write| write.key == key)
            .map(|write| write.kind)
    }

    /// Applies every pending write inside one transaction.
    ///
    /// Returns the total number of affected rows. On failure the transaction
    /// rolls back, the pending set is dropped and the context is marked
    /// failed; callers must discard the owning unit of work.
    ///
    /// # Errors
    /// - `Unusable` when a previous save already failed.
    /// - `Conflict` when a staged update/delete matched no row.
    /// - `Write` when the store rejects any statement or the commit.
    pub fn save_changes(&mut self) -> Result<usize, PersistenceError> {
        if self.failed {
            return Err(PersistenceError::Unusable);
        }

        let started_at = Instant::now();
        let writes = std::mem::take(&mut self.pending);
        let staged = writes.len();

        match apply_writes(&mut self.conn, writes) {
            Ok(affected) => {
                info!(
                    "event=save_changes module=db status=ok staged={staged} affected={affected} duration_ms={}",
                    started_at.elapsed().as_millis()
                );
                Ok(affected)
            }
            Err(err) => {
                self.failed = true;
                error!(
                    "event=save_changes module=db status=error staged={staged} duration_ms={} error={err}",
                    started_at.elapsed().as_millis()
                );
                Err(err)
            }
        }
    }
}

fn apply_writes(conn: &mut Connection, writes: Vec<StagedWrite>) -> Result<usize, PersistenceError> {
    let tx = conn
        .transaction()
        .map_err(|err| PersistenceError::Write(err.into()))?;

    let mut affected = 0usize;
    for write in writes {
        let StagedWrite { kind, key, apply } = write;
        let rows = apply(&tx).map_err(|err| PersistenceError::Write(err.into()))?;
        if rows == 0 && kind != StagedKind::Insert {
            // Row vanished between stage time and save time.
            return Err(PersistenceError::Conflict { key });
        }
        affected += rows;
    }

    tx.commit()
        .map_err(|err| PersistenceError::Write(err.into()))?;
    Ok(affected)
}
