//! # labflow-service — Application Services
//!
//! The read-decide-apply-persist sequence around lifecycle entities:
//!
//! 1. load the entity from a [`Repository`];
//! 2. ask the [`StateRegistry`](labflow_state::StateRegistry) for the
//!    structurally valid targets;
//! 3. ask the [`TransitionAuthorizer`](labflow_authz::TransitionAuthorizer)
//!    whether the acting role may take the requested one;
//! 4. apply the transition on the entity and persist it.
//!
//! Persistence itself is a collaborator behind the [`Repository`] trait.
//! [`InMemoryRepository`] backs tests and embedding; the CLI supplies a
//! file-backed implementation.

pub mod assay;
pub mod error;
pub mod repository;
pub mod transition;

pub use assay::AssayService;
pub use error::ServiceError;
pub use repository::{InMemoryRepository, Record, Repository, RepositoryError};
pub use transition::{ProjectService, Tracked, TransitionService};
