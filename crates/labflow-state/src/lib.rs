//! # labflow-state — Lifecycle State Machines
//!
//! Closed state enumerations, their hand-authored transition graphs and
//! display metadata, plus the entities that move through them.
//!
//! ## State Machines
//!
//! - **Project** (`project.rs`): `activo ⇄ pausado`, with `completado` and
//!   `cancelado` as terminal states.
//!
//! - **Assay workflow** (`workflow.rs`): the fifteen-state E1..E15 path a
//!   laboratory test follows from request to invoicing, with review loops
//!   at E9..E11 and terminal states E3 (voided) and E15 (invoiced).
//!
//! ## Registry
//!
//! [`StateRegistry`] is generic over [`Lifecycle`], so one implementation
//! backs every entity kind. It is built once, verified for dangling edges,
//! and shared behind an `Arc`. String tags enter only through the
//! registry's `*_tag` methods, which fail with `StateError::UnknownState`.

pub mod lifecycle;
pub mod project;
pub mod registry;
pub mod workflow;

pub use lifecycle::{normalize_code, Lifecycle, Phase, StateInfo, TransitionRecord};
pub use project::{Project, ProjectState, ProjectUpdate};
pub use registry::{AvailableTransition, StateRegistry};
pub use workflow::{Assay, WorkflowState};
