//! # labflow-cli — Command-Line Interface
//!
//! ## Subcommands
//!
//! - `states` — list the states of a lifecycle kind with metadata
//! - `transitions` — list targets from a state, optionally role-filtered
//! - `check` — decide one transition for one role (`ALLOWED` / `DENIED`)
//! - `capabilities` — coarse capabilities held by a role
//! - `project` — create, edit, and move projects
//! - `assay` — create, move, flag, and reassign assays
//!
//! Handlers return the process exit code; business rules live in the
//! library crates.

pub mod assay;
pub mod context;
pub mod inspect;
pub mod project;
pub mod store;

/// Exit code for a permission decision that came out negative.
pub const EXIT_DENIED: u8 = 3;
