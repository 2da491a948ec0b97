//! Client-facing service specialization.

use crate::repo::client_repo::ClientRepository;
use crate::service::entity_service::EntityService;

/// Client CRUD surface consumed by interface layers.
///
/// Placeholder specialization: client-specific use cases land here once
/// they exist.
pub type ClientService = EntityService<ClientRepository>;
