//! # labflow-core — Foundational Types
//!
//! Leaf crate of the labflow workspace. Every other crate depends on it;
//! it depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype wrappers for identifiers.** `ProjectId`, `AssayId` and
//!    `Role` are distinct types. A role is validated once at the boundary
//!    and never handled as a bare string afterwards.
//!
//! 2. **Errors carry context.** `StateError` carries the lifecycle kind and
//!    the offending tag so callers can render precise messages without
//!    re-deriving context. Higher crates wrap it with `#[from]`.
//!
//! 3. **UTC-only timestamps.** `Timestamp` truncates to seconds and renders
//!    with a `Z` suffix, so transition logs serialize identically on every
//!    host.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `labflow-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod error;
pub mod identity;
pub mod temporal;

pub use error::{IdentityError, StateError};
pub use identity::{AssayId, ProjectId, Role};
pub use temporal::Timestamp;
