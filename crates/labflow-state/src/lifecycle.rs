//! # Lifecycle Trait
//!
//! The seam between concrete state enums and the generic
//! [`StateRegistry`](crate::StateRegistry).

use std::fmt;
use std::hash::Hash;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use labflow_core::{Role, Timestamp};

/// Coarse grouping of assay workflow states for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Waiting to be scheduled or rescheduled.
    Inicial,
    /// Bench work in progress.
    Ejecucion,
    /// Technical, coordination or direction review.
    Revision,
    /// Report dispatch and delivery.
    Entrega,
    /// No further transitions.
    Terminal,
}

/// Static display metadata for one state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StateInfo {
    /// Human-readable label.
    pub label: &'static str,
    /// Display color as `#RRGGBB`.
    pub color: &'static str,
    /// One-line description.
    pub description: &'static str,
    /// Workflow phase, when the lifecycle kind defines phases.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase: Option<Phase>,
}

/// A closed state enumeration with a static transition graph.
///
/// Implementors are plain `Copy` enums. `ALL` lists every variant in
/// display order, `edges` returns the ordered outgoing edges, and `info`
/// the display metadata. Both are exhaustive matches, so adding a variant
/// forces its graph row and its metadata to be written.
pub trait Lifecycle:
    Copy
    + Eq
    + Ord
    + Hash
    + fmt::Debug
    + fmt::Display
    + AsRef<str>
    + Serialize
    + DeserializeOwned
    + Send
    + Sync
    + 'static
{
    /// Lifecycle kind name used in errors and logs.
    const KIND: &'static str;

    /// Every state, in display order.
    const ALL: &'static [Self];

    /// The wire tag of this state.
    fn as_str(&self) -> &'static str;

    /// Parse a wire tag. `None` for anything outside the enumeration.
    fn from_tag(tag: &str) -> Option<Self>;

    /// States reachable in one step, in display order.
    fn edges(&self) -> &'static [Self];

    /// Display metadata.
    fn info(&self) -> StateInfo;
}

/// Audit entry for one applied transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionRecord<S> {
    /// State before the transition.
    pub from_state: S,
    /// State after the transition.
    pub to_state: S,
    /// When the transition was applied.
    pub timestamp: Timestamp,
    /// Role of the principal that requested it, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor: Option<Role>,
    /// Free-form reason (e.g. the novelty description).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Canonical form of a project or assay code: trimmed and uppercased, so
/// `pry-001` and `PRY-001` name the same record.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_trimmed_and_uppercased() {
        assert_eq!(normalize_code(" ens-0042\t"), "ENS-0042");
        assert_eq!(normalize_code("PRY-001"), "PRY-001");
        assert_eq!(normalize_code("   "), "");
    }
}
