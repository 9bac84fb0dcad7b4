//! # Identity Newtypes
//!
//! Identifiers for lifecycle entities and the acting principal's role.
//! Type-level separation keeps a `ProjectId` from being passed where an
//! `AssayId` is expected.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::IdentityError;

/// Unique identifier for a laboratory project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProjectId(pub Uuid);

/// Unique identifier for an assay (a single laboratory test).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AssayId(pub Uuid);

impl ProjectId {
    /// Generate a new random project identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl AssayId {
    /// Generate a new random assay identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ProjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl Default for AssayId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "project:{}", self.0)
    }
}

impl fmt::Display for AssayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "assay:{}", self.0)
    }
}

// ── Role ────────────────────────────────────────────────────────────────────

/// The acting principal's permission class.
///
/// Roles are an open set: the identity provider may hand out any name.
/// Construction normalizes to trimmed lowercase and rejects anything
/// outside `[a-z0-9_]`, so two spellings of the same role compare equal
/// and lookups in capability tables are exact.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Role(String);

impl Role {
    /// Full-access administrator (short form used by the web client).
    pub const ADMIN: &'static str = "admin";
    /// Full-access administrator (long form).
    pub const ADMINISTRADOR: &'static str = "administrador";
    /// Laboratory coordinator; approves reviews.
    pub const COORDINADOR: &'static str = "coordinador";
    /// Technical lead.
    pub const RESPONSABLE_TECNICO: &'static str = "responsable_tecnico";
    /// Technician; executes assays, cannot sign off reviews.
    pub const TECNICO: &'static str = "tecnico";
    /// Data analyst.
    pub const ANALISTA: &'static str = "analista";
    /// External client with read-only access to their own projects.
    pub const CLIENTE: &'static str = "cliente";

    /// Validate and normalize a role identifier.
    pub fn new(input: &str) -> Result<Self, IdentityError> {
        let normalized = input.trim().to_ascii_lowercase();
        if normalized.is_empty() {
            return Err(IdentityError::InvalidRole {
                input: input.to_string(),
                reason: "role must not be empty",
            });
        }
        if !normalized
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
        {
            return Err(IdentityError::InvalidRole {
                input: input.to_string(),
                reason: "role may only contain letters, digits and underscores",
            });
        }
        Ok(Self(normalized))
    }

    /// The normalized role name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Role {
    type Error = IdentityError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Role::new(&value)
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.0
    }
}

impl std::str::FromStr for Role {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::new(s)
    }
}

impl AsRef<str> for Role {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Normalization is a fixed point: re-validating a role yields itself.
        #[test]
        fn role_normalization_is_idempotent(raw in "[ ]{0,2}[A-Za-z0-9_]{1,20}[ ]{0,2}") {
            let role = Role::new(&raw).unwrap();
            prop_assert_eq!(Role::new(role.as_str()).unwrap(), role);
        }
    }
}
