//! # Service Errors

use thiserror::Error;

use labflow_authz::Capability;
use labflow_core::{Role, StateError};

use crate::repository::RepositoryError;

/// Errors returned by application services.
///
/// `Forbidden` and `MissingCapability` are the only places where a
/// permission outcome becomes an error: the authorizer answers `false`
/// and the service translates it for callers that need a failure (e.g.
/// an HTTP layer mapping it to 403).
#[derive(Error, Debug)]
pub enum ServiceError {
    /// No entity with this identifier.
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: String },

    /// Lifecycle rule violated (unknown state, illegal edge, terminal).
    #[error(transparent)]
    State(#[from] StateError),

    /// The role may not target this state.
    #[error("role {role} may not move {kind} to {to}")]
    Forbidden {
        kind: &'static str,
        role: Role,
        to: String,
    },

    /// The role lacks a capability required for the action.
    #[error("role {role} lacks capability {capability}")]
    MissingCapability { role: Role, capability: Capability },

    /// The persistence collaborator failed.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl ServiceError {
    /// Whether this error represents a permission denial.
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, Self::Forbidden { .. } | Self::MissingCapability { .. })
    }
}
