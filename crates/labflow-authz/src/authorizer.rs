//! # Transition Authorizer
//!
//! Decides whether an acting role may take a particular transition.
//!
//! The authorizer never consults a transition graph. Callers pass in the
//! targets that are structurally allowed from the current state (normally
//! `StateRegistry::transitions_from`) and the authorizer narrows them by
//! role. Keeping the two apart lets the same authorizer serve every
//! lifecycle kind and keeps it testable with plain string lists.
//!
//! ## Contract
//!
//! - `filter_by_role` removes every candidate that belongs to a category
//!   forbidden for the role, and is the identity for unrestricted roles.
//!   Survivor order is preserved, so the result is idempotent.
//! - `can_perform_transition` is true iff the target is in the allowed
//!   list *and* survives the role filter.
//! - Tags are compared case-insensitively against the category members,
//!   so `e10` is withheld from a role that may not target `E10`.
//! - Neither operation errors. Denial is `false` or an empty list, and
//!   malformed untyped input (see [`TransitionAuthorizer::filter_json`])
//!   yields an empty list.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde_json::Value;

use labflow_core::Role;

use crate::config::AuthorizerConfig;

/// Stateless role filter over caller-supplied transition targets.
#[derive(Debug, Clone)]
pub struct TransitionAuthorizer {
    config: Arc<AuthorizerConfig>,
    /// Per restricted role, the union of its forbidden categories' tags,
    /// lowercased.
    forbidden: BTreeMap<Role, BTreeSet<String>>,
}

impl TransitionAuthorizer {
    /// Build an authorizer over shared configuration.
    pub fn new(config: Arc<AuthorizerConfig>) -> Self {
        let forbidden = config
            .restricted_roles
            .iter()
            .map(|(role, categories)| {
                let tags = categories
                    .iter()
                    .filter_map(|c| config.categories.get(c))
                    .flatten()
                    .map(|tag| tag.to_lowercase())
                    .collect();
                (role.clone(), tags)
            })
            .collect();
        Self { config, forbidden }
    }

    /// The configuration this authorizer was built from.
    pub fn config(&self) -> &AuthorizerConfig {
        &self.config
    }

    /// Whether `role` has any forbidden category.
    pub fn is_restricted(&self, role: &Role) -> bool {
        self.forbidden.get(role).is_some_and(|tags| !tags.is_empty())
    }

    /// Whether `role` may target the state tagged `tag`, ignoring graph
    /// structure.
    pub fn may_target(&self, tag: &str, role: &Role) -> bool {
        self.forbidden
            .get(role)
            .map_or(true, |tags| !tags.contains(&tag.to_lowercase()))
    }

    /// Subset of `candidates` that `role` may target, in input order.
    pub fn filter_by_role<T>(&self, candidates: &[T], role: &Role) -> Vec<T>
    where
        T: AsRef<str> + Clone,
    {
        candidates
            .iter()
            .filter(|c| self.may_target(c.as_ref(), role))
            .cloned()
            .collect()
    }

    /// [`filter_by_role`](Self::filter_by_role) over untyped input.
    ///
    /// Anything other than a JSON array (null, object, string, number)
    /// yields an empty list, and non-string elements are dropped. This is
    /// the boundary used for request payloads, so malformed input denies
    /// everything instead of raising.
    pub fn filter_json(&self, candidates: &Value, role: &Role) -> Vec<String> {
        let Some(items) = candidates.as_array() else {
            tracing::debug!(role = %role, "non-array transition candidates; permitting none");
            return Vec::new();
        };
        let tags: Vec<String> = items
            .iter()
            .filter_map(Value::as_str)
            .map(String::from)
            .collect();
        self.filter_by_role(&tags, role)
    }

    /// Whether `role` may move to `to`, given the targets `allowed` from the
    /// current state.
    ///
    /// `_from` is accepted for interface symmetry and is not consulted: the
    /// decision relies on the caller having derived `allowed` from the
    /// current state. Whether the authorizer should also verify the edge
    /// `from -> to` itself is an open question, and the graph check is left
    /// to the registry.
    pub fn can_perform_transition<T>(
        &self,
        _from: &str,
        to: &str,
        role: &Role,
        allowed: &[T],
    ) -> bool
    where
        T: AsRef<str> + Clone,
    {
        if !allowed.iter().any(|t| t.as_ref() == to) {
            tracing::debug!(to, role = %role, "target not among allowed transitions");
            return false;
        }
        let permitted = self
            .filter_by_role(allowed, role)
            .iter()
            .any(|t| t.as_ref() == to);
        if !permitted {
            tracing::debug!(to, role = %role, "target forbidden for role");
        }
        permitted
    }
}

impl Default for TransitionAuthorizer {
    fn default() -> Self {
        Self::new(Arc::new(AuthorizerConfig::default()))
    }
}

// ─── Tests ───────────────────────────────────────────────────────────


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn tag() -> impl Strategy<Value = String> {
        prop_oneof![
            (1u8..=20).prop_map(|n| format!("E{n}")),
            "[a-z]{3,10}",
        ]
    }

    fn any_role() -> impl Strategy<Value = Role> {
        prop_oneof![
            Just(Role::TECNICO.to_string()),
            Just(Role::ADMIN.to_string()),
            Just(Role::ADMINISTRADOR.to_string()),
            "[a-z_]{1,12}",
        ]
        .prop_map(|s| Role::new(&s).unwrap())
    }

    proptest! {
        #[test]
        fn filter_is_idempotent(candidates in prop::collection::vec(tag(), 0..12), role in any_role()) {
            let auth = TransitionAuthorizer::default();
            let once = auth.filter_by_role(&candidates, &role);
            let twice = auth.filter_by_role(&once, &role);
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn restricted_output_excludes_approval(candidates in prop::collection::vec(tag(), 0..12)) {
            let auth = TransitionAuthorizer::default();
            let out = auth.filter_by_role(&candidates, &Role::new(Role::TECNICO).unwrap());
            for t in &out {
                prop_assert!(!["E10", "E11", "E12"].contains(&t.as_str()));
            }
        }

        #[test]
        fn unrestricted_output_is_identity(candidates in prop::collection::vec(tag(), 0..12)) {
            let auth = TransitionAuthorizer::default();
            let out = auth.filter_by_role(&candidates, &Role::new(Role::ADMINISTRADOR).unwrap());
            prop_assert_eq!(out, candidates);
        }

        #[test]
        fn target_outside_allowed_is_always_denied(
            allowed in prop::collection::vec(tag(), 0..8),
            to in tag(),
            role in any_role(),
        ) {
            prop_assume!(!allowed.contains(&to));
            let auth = TransitionAuthorizer::default();
            prop_assert!(!auth.can_perform_transition("E1", &to, &role, &allowed));
        }
    }
}
