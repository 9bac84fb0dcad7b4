//! # labflow-authz — Transition Authorization
//!
//! Layers role-based capability filtering on top of a lifecycle's
//! structural transition graph.
//!
//! ## Components
//!
//! - **Configuration** (`config.rs`): state categories (named subsets of
//!   state tags, e.g. `approval`), the restricted-role table mapping a role
//!   to the categories it may not target, and the role policy lists.
//!   Loaded from YAML; every field defaults to the built-in tables.
//!
//! - **Authorizer** (`authorizer.rs`): `filter_by_role` and
//!   `can_perform_transition`. Stateless, pure, and independent of any
//!   state registry: the caller passes the globally allowed targets in.
//!
//! - **Policy** (`policy.rs`): coarse capabilities (change state, reassign,
//!   approve/reject, flag novelty) that gate actions before any target is
//!   chosen.
//!
//! ## Fail-Closed Contract
//!
//! Denial is a `false` or an empty list, never an error. Input that does
//! not have the expected shape degrades to "nothing permitted".

pub mod authorizer;
pub mod config;
pub mod policy;

pub use authorizer::TransitionAuthorizer;
pub use config::{AuthorizerConfig, ConfigError, LabflowConfig, PolicyConfig, StateCategory};
pub use policy::{Capability, RolePolicy};
