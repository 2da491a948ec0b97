//! Unit of work: one atomic persistence boundary per logical operation.
//!
//! # Responsibility
//! - Own the persistence context and the repositories bound to it.
//! - Flush all staged changes as one transaction.
//! - Release request-scoped resources on every exit path.
//!
//! # Invariants
//! - The repository accessor memoizes; one instance per unit of work.
//! - Either teardown path leaves both resource slots empty and the context
//!   disposed; repeated teardown is a no-op.
//! - A failed commit makes the instance unusable; callers discard it.

use crate::db::context::{PersistenceError, SharedContext, StoreContext};
use crate::repo::client_repo::ClientRepository;
use crate::repo::entity_repo::{SqliteRepository, StoreError, StoreResult};
use crate::uow::resource::{ScopedResource, ScratchBuffer};
use log::{error, info, warn};
use once_cell::sync::OnceCell;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

/// Owner of one persistence context for the duration of one logical
/// operation (for example, one inbound request).
///
/// Created at the operation's composition root, used for zero or more
/// repository operations, committed at most until a failure, then torn
/// down. Repositories handed out by the accessors die with this owner.
pub struct UnitOfWork {
    op_id: Uuid,
    context: SharedContext,
    clients: OnceCell<ClientRepository>,
    sync_resource: Option<Box<dyn ScopedResource>>,
    async_resource: Option<Box<dyn ScopedResource>>,
}

impl UnitOfWork {
    /// Creates a unit of work over `context` with default scratch resources
    /// in both slots.
    pub fn new(context: StoreContext) -> Self {
        Self::with_resources(
            context,
            Box::new(ScratchBuffer::new()),
            Box::new(ScratchBuffer::new()),
        )
    }

    /// Creates a unit of work with caller-provided resource handles.
    ///
    /// The first handle fills the synchronous slot and must support
    /// synchronous release; the second fills the asynchronous slot and must
    /// support asynchronous release. Both are released on teardown.
    pub fn with_resources(
        context: StoreContext,
        sync_resource: Box<dyn ScopedResource>,
        async_resource: Box<dyn ScopedResource>,
    ) -> Self {
        Self {
            op_id: Uuid::new_v4(),
            context: context.into_shared(),
            clients: OnceCell::new(),
            sync_resource: Some(sync_resource),
            async_resource: Some(async_resource),
        }
    }

    /// Correlation id stamped on this unit of work's log events.
    pub fn op_id(&self) -> Uuid {
        self.op_id
    }

    /// Client repository bound to this unit of work's context.
    ///
    /// Constructed on the first call, the identical instance afterwards.
    pub fn client_repository(&self) -> &ClientRepository {
        self.clients
            .get_or_init(|| SqliteRepository::new(Arc::clone(&self.context)))
    }

    /// True once either teardown path ran.
    pub fn is_disposed(&self) -> bool {
        self.context.lock().is_disposed()
    }

    /// Count of writes staged and not yet committed.
    pub fn pending_writes(&self) -> usize {
        self.context.lock().pending_len()
    }

    /// Flushes every staged change as one atomic transaction.
    ///
    /// Returns the number of affected rows. The write runs on a blocking
    /// task so the caller's executor stays responsive. A failure leaves the
    /// pending set in an undefined state; discard this unit of work and
    /// start a fresh logical operation instead of retrying it.
    ///
    /// # Errors
    /// - `Disposed` after teardown.
    /// - `Persistence` when the store rejects the transaction, a staged
    ///   update/delete matches no row, or the write task dies.
    pub async fn commit(&self) -> StoreResult<usize> {
        let started_at = Instant::now();
        let context = Arc::clone(&self.context);

        let outcome = tokio::task::spawn_blocking(move || {
            let mut ctx = context.lock();
            if ctx.is_disposed() {
                return Err(StoreError::Disposed);
            }
            ctx.save_changes().map_err(StoreError::Persistence)
        })
        .await
        .map_err(|err| StoreError::Persistence(PersistenceError::Background(err.to_string())));

        match outcome.and_then(|inner| inner) {
            Ok(affected) => {
                info!(
                    "event=uow_commit module=uow status=ok op_id={} affected={affected} duration_ms={}",
                    self.op_id,
                    started_at.elapsed().as_millis()
                );
                Ok(affected)
            }
            Err(err) => {
                error!(
                    "event=uow_commit module=uow status=error op_id={} duration_ms={} error={err}",
                    self.op_id,
                    started_at.elapsed().as_millis()
                );
                Err(err)
            }
        }
    }

    /// Synchronous teardown.
    ///
    /// Releases the sync slot, then the async slot when it supports
    /// synchronous release (skipped with a warning otherwise). Safe to call
    /// more than once; later calls are no-ops. Runs automatically on `Drop`
    /// when no explicit teardown happened.
    pub fn dispose(&mut self) {
        if let Some(mut resource) = self.sync_resource.take() {
            release_sync(resource.as_mut(), self.op_id);
        }
        if let Some(mut resource) = self.async_resource.take() {
            if resource.supports_sync_release() {
                release_sync(resource.as_mut(), self.op_id);
            } else {
                warn!(
                    "event=resource_release module=uow status=skipped op_id={} resource={} reason=sync_release_unsupported",
                    self.op_id,
                    resource.name()
                );
            }
        }
        self.finish_teardown("sync");
    }

    /// Asynchronous teardown.
    ///
    /// Awaits release of the async slot first, then releases the sync slot
    /// asynchronously when supported, synchronously otherwise. Safe to call
    /// more than once; later calls are no-ops.
    pub async fn dispose_async(&mut self) {
        if let Some(mut resource) = self.async_resource.take() {
            release_async(resource.as_mut(), self.op_id).await;
        }
        if let Some(mut resource) = self.sync_resource.take() {
            if resource.supports_async_release() {
                release_async(resource.as_mut(), self.op_id).await;
            } else {
                release_sync(resource.as_mut(), self.op_id);
            }
        }
        self.finish_teardown("async");
    }

    fn finish_teardown(&self, path: &str) {
        let mut ctx = self.context.lock();
        if !ctx.is_disposed() {
            ctx.mark_disposed();
            info!(
                "event=uow_dispose module=uow status=ok op_id={} path={path}",
                self.op_id
            );
        }
    }
}

impl Drop for UnitOfWork {
    fn drop(&mut self) {
        // Resources must not outlive the owning scope even when the caller
        // never tore down explicitly.
        if self.sync_resource.is_some() || self.async_resource.is_some() {
            self.dispose();
        }
    }
}

fn release_sync(resource: &mut dyn ScopedResource, op_id: Uuid) {
    if let Err(err) = resource.release() {
        warn!(
            "event=resource_release module=uow status=error op_id={op_id} resource={} mode=sync error={err}",
            resource.name()
        );
    }
}

async fn release_async(resource: &mut (dyn ScopedResource + '_), op_id: Uuid) {
    if let Err(err) = resource.release_async().await {
        warn!(
            "event=resource_release module=uow status=error op_id={op_id} resource={} mode=async error={err}",
            resource.name()
        );
    }
}
