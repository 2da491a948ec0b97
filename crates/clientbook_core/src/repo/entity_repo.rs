//! Generic repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide a store-agnostic CRUD surface over one entity type.
//! - Stage writes into the shared persistence context instead of writing
//!   through immediately.
//!
//! # Invariants
//! - Reads answer from committed state only.
//! - Existence checks for update/delete see the committed store overlaid
//!   with this unit of work's staged writes.
//! - Every operation fails with `Disposed` once the owning unit of work was
//!   torn down.

use crate::db::context::{PersistenceError, SharedContext, StagedKind, StagedWrite, StoreContext};
use crate::db::DbError;
use crate::model::ValidationError;
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::marker::PhantomData;

pub type StoreResult<T> = Result<T, StoreError>;

/// Semantic error surface for repository and unit-of-work operations.
#[derive(Debug)]
pub enum StoreError {
    /// Entity rejected at stage time.
    Validation(ValidationError),
    /// Identity absent for update/delete.
    NotFound(String),
    /// Commit-time store failure; the owning unit of work must be
    /// discarded.
    Persistence(PersistenceError),
    /// Operation attempted after the owning unit of work was disposed.
    Disposed,
    /// Transport-level store failure on a read path.
    Db(DbError),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound(key) => write!(f, "entity not found: {key}"),
            Self::Persistence(err) => write!(f, "{err}"),
            Self::Disposed => write!(f, "unit of work already disposed"),
            Self::Db(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Persistence(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound(_) | Self::Disposed => None,
        }
    }
}

impl From<ValidationError> for StoreError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<PersistenceError> for StoreError {
    fn from(value: PersistenceError) -> Self {
        Self::Persistence(value)
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Storage binding for one entity type.
///
/// Keeps every piece of SQL for the entity's table behind the repository
/// boundary; the model stays storage-free. The `Display` form of the key is
/// the staging identity used for pending-overlay lookups and log events.
pub trait EntityBinding: Clone + Send + 'static {
    type Key: Display + Clone + PartialEq + Send;

    fn key(&self) -> Self::Key;
    fn validate(&self) -> Result<(), ValidationError>;

    /// Table name; namespaces staging keys in the shared pending set.
    fn table() -> &'static str;

    fn insert(&self, conn: &Connection) -> rusqlite::Result<usize>;
    fn update(&self, conn: &Connection) -> rusqlite::Result<usize>;
    fn delete(conn: &Connection, key: &Self::Key) -> rusqlite::Result<usize>;
    fn exists(conn: &Connection, key: &Self::Key) -> rusqlite::Result<bool>;
    fn fetch(conn: &Connection, key: &Self::Key) -> StoreResult<Option<Self>>;
    fn fetch_all(conn: &Connection) -> StoreResult<Vec<Self>>;
}

/// Capability surface services consume.
///
/// All staging operations are deferred; nothing persists until the owning
/// unit of work commits.
pub trait Repository {
    type Entity: EntityBinding;

    /// Stages `entity` for insertion. No store write happens here.
    ///
    /// # Errors
    /// - `Validation` when the record is malformed or its key is already
    ///   staged for insertion in this unit of work.
    /// - `Disposed` after teardown.
    fn add(&self, entity: &Self::Entity) -> StoreResult<()>;

    /// Reads committed state by identity. `Ok(None)` when absent; no side
    /// effects.
    fn get_by_id(
        &self,
        key: &<Self::Entity as EntityBinding>::Key,
    ) -> StoreResult<Option<Self::Entity>>;

    /// Reads all committed rows. Call again for a fresh snapshot.
    fn list(&self) -> StoreResult<Vec<Self::Entity>>;

    /// Stages an update against an identity that must already exist.
    ///
    /// # Errors
    /// - `NotFound` when the identity is absent at stage time.
    fn update(&self, entity: &Self::Entity) -> StoreResult<()>;

    /// Stages a removal of an identity that must already exist.
    ///
    /// # Errors
    /// - `NotFound` when the identity is absent at stage time.
    fn delete(&self, key: &<Self::Entity as EntityBinding>::Key) -> StoreResult<()>;
}

/// SQLite-backed generic repository bound to one shared context.
///
/// Stateless apart from the context handle; cloned handles share the same
/// context and therefore the same disposal state.
#[derive(Clone)]
pub struct SqliteRepository<T: EntityBinding> {
    context: SharedContext,
    _entity: PhantomData<fn() -> T>,
}

impl<T: EntityBinding> SqliteRepository<T> {
    pub fn new(context: SharedContext) -> Self {
        Self {
            context,
            _entity: PhantomData,
        }
    }

    fn usable(ctx: &StoreContext) -> StoreResult<()> {
        if ctx.is_disposed() {
            return Err(StoreError::Disposed);
        }
        if ctx.is_failed() {
            return Err(StoreError::Persistence(PersistenceError::Unusable));
        }
        Ok(())
    }

    /// Staging identity: table-qualified so entity types sharing one
    /// context never collide in the pending set.
    fn staging_key(key: &T::Key) -> String {
        format!("{}:{}", T::table(), key)
    }

    /// Existence under this unit of work's pending overlay.
    fn key_exists(ctx: &StoreContext, key: &T::Key) -> StoreResult<bool> {
        match ctx.staged_kind(&Self::staging_key(key)) {
            Some(StagedKind::Insert) | Some(StagedKind::Update) => Ok(true),
            Some(StagedKind::Delete) => Ok(false),
            None => Ok(T::exists(ctx.connection(), key)?),
        }
    }
}

impl<T: EntityBinding> Repository for SqliteRepository<T> {
    type Entity = T;

    fn add(&self, entity: &T) -> StoreResult<()> {
        let mut ctx = self.context.lock();
        Self::usable(&ctx)?;
        entity.validate()?;

        let key = entity.key();
        let staging_key = Self::staging_key(&key);
        if matches!(
            ctx.staged_kind(&staging_key),
            Some(StagedKind::Insert) | Some(StagedKind::Update)
        ) {
            return Err(StoreError::Validation(ValidationError::DuplicateKey(
                key.to_string(),
            )));
        }

        let staged = entity.clone();
        ctx.stage(StagedWrite::new(
            StagedKind::Insert,
            staging_key,
            move |conn| staged.insert(conn),
        ));
        Ok(())
    }

    fn get_by_id(&self, key: &T::Key) -> StoreResult<Option<T>> {
        let ctx = self.context.lock();
        Self::usable(&ctx)?;
        T::fetch(ctx.connection(), key)
    }

    fn list(&self) -> StoreResult<Vec<T>> {
        let ctx = self.context.lock();
        Self::usable(&ctx)?;
        T::fetch_all(ctx.connection())
    }

    fn update(&self, entity: &T) -> StoreResult<()> {
        let mut ctx = self.context.lock();
        Self::usable(&ctx)?;
        entity.validate()?;

        let key = entity.key();
        if !Self::key_exists(&ctx, &key)? {
            return Err(StoreError::NotFound(key.to_string()));
        }

        let staged = entity.clone();
        ctx.stage(StagedWrite::new(
            StagedKind::Update,
            Self::staging_key(&key),
            move |conn| staged.update(conn),
        ));
        Ok(())
    }

    fn delete(&self, key: &T::Key) -> StoreResult<()> {
        let mut ctx = self.context.lock();
        Self::usable(&ctx)?;

        if !Self::key_exists(&ctx, key)? {
            return Err(StoreError::NotFound(key.to_string()));
        }

        let owned = key.clone();
        ctx.stage(StagedWrite::new(
            StagedKind::Delete,
            Self::staging_key(key),
            move |conn| T::delete(conn, &owned),
        ));
        Ok(())
    }
}
