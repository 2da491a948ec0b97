//! Unit-of-work composition and request-scoped resource lifetimes.
//!
//! # Responsibility
//! - Coordinate one atomic persistence boundary per logical operation.
//! - Bound external resource lifetimes to the owning operation scope.
//!
//! # Invariants
//! - One unit of work (and one context) per logical operation; never shared
//!   across operations.
//! - Teardown runs on every exit path, explicit or scope-driven.

pub mod resource;
pub mod unit_of_work;
