//! # State Registry
//!
//! Single source of truth for a lifecycle kind's states, metadata and
//! transition graph. Built once at startup, read-only afterwards, and
//! shared by `Arc` with every consumer.
//!
//! The registry answers structural questions only ("is `to` one step from
//! `from`?"). Who may take a step is the authorizer's business.

use std::collections::BTreeMap;

use serde::Serialize;

use labflow_core::StateError;

use crate::lifecycle::{Lifecycle, StateInfo};

/// A reachable target together with its display metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AvailableTransition<S> {
    /// Target state.
    pub state: S,
    /// Metadata for rendering the transition.
    pub info: StateInfo,
}

/// Immutable transition graph and metadata for one [`Lifecycle`] kind.
#[derive(Debug, Clone)]
pub struct StateRegistry<S: Lifecycle> {
    graph: BTreeMap<S, Vec<S>>,
    info: BTreeMap<S, StateInfo>,
}

impl<S: Lifecycle> StateRegistry<S> {
    /// Build the registry from the kind's static tables.
    ///
    /// # Errors
    ///
    /// [`StateError::DanglingEdge`] if an edge targets a state missing from
    /// `S::ALL`. The graph is total by construction: every member of
    /// `S::ALL` gets an entry, possibly empty.
    pub fn new() -> Result<Self, StateError> {
        let mut graph = BTreeMap::new();
        let mut info = BTreeMap::new();
        for state in S::ALL {
            for target in state.edges() {
                if !S::ALL.contains(target) {
                    return Err(StateError::DanglingEdge {
                        kind: S::KIND,
                        from: state.to_string(),
                        to: target.to_string(),
                    });
                }
            }
            graph.insert(*state, state.edges().to_vec());
            info.insert(*state, state.info());
        }
        tracing::debug!(kind = S::KIND, states = graph.len(), "state registry built");
        Ok(Self { graph, info })
    }

    /// Lifecycle kind name.
    pub fn kind(&self) -> &'static str {
        S::KIND
    }

    /// Every state, in display order.
    pub fn states(&self) -> &'static [S] {
        S::ALL
    }

    /// Outgoing edges of `state`. Empty for terminal states.
    pub fn transitions_from(&self, state: S) -> &[S] {
        self.graph.get(&state).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Outgoing edges of the state tagged `tag`.
    pub fn transitions_from_tag(&self, tag: &str) -> Result<&[S], StateError> {
        Ok(self.transitions_from(self.parse(tag)?))
    }

    /// Whether `to` is one step from `from`. The sole authority on
    /// structural legality, independent of who asks.
    pub fn can_transition(&self, from: S, to: S) -> bool {
        self.transitions_from(from).contains(&to)
    }

    /// Tag-based [`can_transition`](Self::can_transition). Both tags must
    /// name members of the enumeration.
    pub fn can_transition_tags(&self, from: &str, to: &str) -> Result<bool, StateError> {
        Ok(self.can_transition(self.parse(from)?, self.parse(to)?))
    }

    /// Display metadata for `state`.
    pub fn info_of(&self, state: S) -> StateInfo {
        self.info.get(&state).copied().unwrap_or_else(|| state.info())
    }

    /// Display metadata for the state tagged `tag`.
    pub fn info_of_tag(&self, tag: &str) -> Result<StateInfo, StateError> {
        Ok(self.info_of(self.parse(tag)?))
    }

    /// Whether `state` has no outgoing edges.
    pub fn is_terminal(&self, state: S) -> bool {
        self.transitions_from(state).is_empty()
    }

    /// All terminal states, in display order.
    pub fn terminal_states(&self) -> Vec<S> {
        S::ALL
            .iter()
            .copied()
            .filter(|s| self.is_terminal(*s))
            .collect()
    }

    /// Reachable targets of `state` paired with their metadata.
    pub fn available_transitions(&self, state: S) -> Vec<AvailableTransition<S>> {
        self.transitions_from(state)
            .iter()
            .map(|target| AvailableTransition {
                state: *target,
                info: self.info_of(*target),
            })
            .collect()
    }

    /// Parse a tag, failing with [`StateError::UnknownState`].
    pub fn parse(&self, tag: &str) -> Result<S, StateError> {
        S::from_tag(tag).ok_or_else(|| StateError::UnknownState {
            kind: S::KIND,
            tag: tag.to_string(),
        })
    }
}

// ─── Tests ───────────────────────────────────────────────────────────
