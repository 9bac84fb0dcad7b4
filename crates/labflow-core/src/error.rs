//! # Error Types
//!
//! Structured errors shared across the workspace, derived with `thiserror`.
//!
//! Permission denial is deliberately absent from this module: the
//! authorizer answers with `bool`, never with an error.

use thiserror::Error;

/// Errors raised by state registries and lifecycle entities.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    /// A tag outside the closed state enumeration of `kind`.
    #[error("unknown {kind} state: {tag:?}")]
    UnknownState {
        /// Lifecycle kind (e.g. "project", "assay").
        kind: &'static str,
        /// The rejected tag, verbatim.
        tag: String,
    },

    /// The transition graph has no edge `from -> to`.
    #[error("cannot move {kind} from {from} to {to}; valid transitions: {}", display_valid(.valid))]
    InvalidTransition {
        /// Lifecycle kind.
        kind: &'static str,
        /// Current state tag.
        from: String,
        /// Requested target tag.
        to: String,
        /// Tags reachable from `from` in one step.
        valid: Vec<String>,
    },

    /// The entity is in a terminal state and accepts no further changes.
    #[error("{kind} is in terminal state {state}")]
    TerminalState {
        /// Lifecycle kind.
        kind: &'static str,
        /// The terminal state tag.
        state: String,
    },

    /// A graph edge points at a state that is not part of the enumeration.
    #[error("{kind} graph edge {from} -> {to} targets an undeclared state")]
    DanglingEdge {
        /// Lifecycle kind.
        kind: &'static str,
        /// Source state tag.
        from: String,
        /// Undeclared target tag.
        to: String,
    },

    /// An entity command was rejected for a domain reason.
    #[error("{kind} rejected: {reason}")]
    Rejected {
        /// Lifecycle kind.
        kind: &'static str,
        /// Human-readable cause.
        reason: String,
    },
}

fn display_valid(valid: &[String]) -> String {
    if valid.is_empty() {
        "none".to_string()
    } else {
        valid.join(", ")
    }
}

/// Errors in identifier validation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentityError {
    /// Role identifier is empty or contains characters outside `[a-z0-9_]`.
    #[error("invalid role {input:?}: {reason}")]
    InvalidRole {
        /// The rejected input.
        input: String,
        /// Why it was rejected.
        reason: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_transition_lists_valid_targets() {
        let err = StateError::InvalidTransition {
            kind: "project",
            from: "activo".into(),
            to: "activo".into(),
            valid: vec!["pausado".into(), "cancelado".into()],
        };
        assert_eq!(
            err.to_string(),
            "cannot move project from activo to activo; valid transitions: pausado, cancelado"
        );
    }

    #[test]
    fn invalid_transition_from_terminal_says_none() {
        let err = StateError::InvalidTransition {
            kind: "project",
            from: "completado".into(),
            to: "activo".into(),
            valid: vec![],
        };
        assert!(err.to_string().ends_with("valid transitions: none"));
    }
}
