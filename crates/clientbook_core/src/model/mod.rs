//! Domain model for persisted client records.
//!
//! # Responsibility
//! - Define the canonical entity shapes used by repositories and services.
//! - Keep stage-time validation rules next to the data they guard.
//!
//! # Invariants
//! - Every entity carries a caller-assigned identity that never changes
//!   once persisted.
//! - Validation runs before a write is staged, never at commit time.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod client;

/// Validation failures detected before a record reaches the staging layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Identity must be a positive integer.
    NonPositiveId(i64),
    /// A required text field is empty or whitespace.
    EmptyField(&'static str),
    /// Optional email is present but not mailbox-shaped.
    MalformedEmail(String),
    /// The identity is already staged for insertion in this unit of work.
    DuplicateKey(String),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NonPositiveId(id) => write!(f, "identity must be positive, got {id}"),
            Self::EmptyField(field) => write!(f, "required field `{field}` is empty"),
            Self::MalformedEmail(value) => write!(f, "email `{value}` is not a valid address"),
            Self::DuplicateKey(key) => {
                write!(f, "identity `{key}` is already staged for insertion")
            }
        }
    }
}

impl Error for ValidationError {}
