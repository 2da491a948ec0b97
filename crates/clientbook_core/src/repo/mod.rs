//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the generic data-access contract services consume.
//! - Isolate SQLite query details from service/business orchestration.
//!
//! # Invariants
//! - Repository writes enforce entity validation before staging.
//! - Staged writes become visible only after the owning unit of work
//!   commits; repositories never persist on their own.
//! - Repository APIs return semantic errors (`NotFound`, `Disposed`) in
//!   addition to store transport errors.

pub mod client_repo;
pub mod entity_repo;
