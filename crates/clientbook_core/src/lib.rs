//! Core data-access layer for clientbook.
//! This crate is the single source of truth for persistence invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod uow;

pub use db::context::{PersistenceError, SharedContext, StagedKind, StagedWrite, StoreContext};
pub use db::{open_db, open_db_in_memory, DbError};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::client::{Client, ClientId};
pub use model::ValidationError;
pub use repo::client_repo::ClientRepository;
pub use repo::entity_repo::{
    EntityBinding, Repository, SqliteRepository, StoreError, StoreResult,
};
pub use service::client_service::ClientService;
pub use service::entity_service::EntityService;
pub use uow::resource::{ScopedResource, ScratchBuffer};
pub use uow::unit_of_work::UnitOfWork;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
