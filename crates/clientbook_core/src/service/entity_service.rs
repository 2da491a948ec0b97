//! Generic pass-through service.

use crate::repo::entity_repo::{EntityBinding, Repository, StoreResult};

/// Thin CRUD façade over a repository implementation.
///
/// Interface layers depend on this surface instead of the full
/// repository/unit-of-work API; errors pass through unchanged.
pub struct EntityService<R: Repository> {
    repo: R,
}

impl<R: Repository> EntityService<R> {
    /// Wraps the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Stages an entity for insertion.
    pub fn add(&self, entity: &R::Entity) -> StoreResult<()> {
        self.repo.add(entity)
    }

    /// Reads one entity by identity from committed state.
    pub fn get_by_id(
        &self,
        key: &<R::Entity as EntityBinding>::Key,
    ) -> StoreResult<Option<R::Entity>> {
        self.repo.get_by_id(key)
    }

    /// Reads all committed entities.
    pub fn list(&self) -> StoreResult<Vec<R::Entity>> {
        self.repo.list()
    }

    /// Stages an update against an existing identity.
    pub fn update(&self, entity: &R::Entity) -> StoreResult<()> {
        self.repo.update(entity)
    }

    /// Stages a removal by identity.
    pub fn delete(&self, key: &<R::Entity as EntityBinding>::Key) -> StoreResult<()> {
        self.repo.delete(key)
    }
}
