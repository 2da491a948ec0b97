//! Client entity.
//!
//! # Responsibility
//! - Define the persisted client record.
//! - Reject malformed records before they are staged for write.
//!
//! # Invariants
//! - `id` is caller-assigned, stable and never reused for another client.
//! - `name` is never blank in a record that passed validation.

use crate::model::ValidationError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Stable identifier for a client record.
///
/// Kept as a type alias to make semantic intent explicit in signatures.
pub type ClientId = i64;

/// Minimal mailbox shape: one `@`, no whitespace, a dot in the domain part.
/// Deliverability checks belong to outer layers, not the access core.
static EMAIL_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern compiles"));

/// Canonical persisted client record.
///
/// Attributes beyond identity are intentionally small; this record is the
/// single entity the access layer is built around.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    /// Caller-assigned stable ID. Immutable once persisted.
    pub id: ClientId,
    /// Display name. Must not be blank.
    pub name: String,
    /// Optional contact address.
    pub email: Option<String>,
}

impl Client {
    /// Creates a client with the given identity and name.
    pub fn new(id: ClientId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            email: None,
        }
    }

    /// Sets the contact address, builder style.
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Checks stage-time invariants.
    ///
    /// # Errors
    /// - `NonPositiveId` when `id < 1`.
    /// - `EmptyField` when `name` is blank.
    /// - `MalformedEmail` when `email` is present but not mailbox-shaped.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id < 1 {
            return Err(ValidationError::NonPositiveId(self.id));
        }
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyField("name"));
        }
        if let Some(email) = &self.email {
            if !EMAIL_SHAPE.is_match(email) {
                return Err(ValidationError::MalformedEmail(email.clone()));
            }
        }
        Ok(())
    }
}
