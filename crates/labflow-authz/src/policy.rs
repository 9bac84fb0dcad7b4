//! # Role Policy
//!
//! Coarse capabilities checked before a transition target is even chosen:
//! may this role touch the workflow at all, reassign technicians, sign off
//! reviews, or raise a novelty.
//!
//! These answers gate what a client offers to a role. They do not decide
//! which targets a role may take: entry into the review states is the
//! [`TransitionAuthorizer`](crate::TransitionAuthorizer)'s call, driven by
//! its own category tables.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use labflow_core::Role;

use crate::config::PolicyConfig;

/// An action gated by role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Move an assay through the workflow.
    ChangeState,
    /// Reassign an assay's technician.
    Reassign,
    /// Approve or reject a review. Reported for UI gating only; the
    /// authorizer's `restricted_roles` decide who may enter review states.
    ApproveReject,
    /// Flag an assay as a novelty.
    MarkNovelty,
}

impl Capability {
    /// Every capability, in declaration order.
    pub const ALL: [Capability; 4] = [
        Self::ChangeState,
        Self::Reassign,
        Self::ApproveReject,
        Self::MarkNovelty,
    ];

    /// Snake-case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ChangeState => "change_state",
            Self::Reassign => "reassign",
            Self::ApproveReject => "approve_reject",
            Self::MarkNovelty => "mark_novelty",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Role capability checks over shared [`PolicyConfig`].
#[derive(Debug, Clone)]
pub struct RolePolicy {
    config: Arc<PolicyConfig>,
}

impl RolePolicy {
    /// Build a policy over shared configuration.
    pub fn new(config: Arc<PolicyConfig>) -> Self {
        Self { config }
    }

    /// Whether `role` holds `capability`.
    pub fn allows(&self, role: &Role, capability: Capability) -> bool {
        let members = match capability {
            Capability::ChangeState => &self.config.change_state,
            Capability::Reassign => &self.config.reassign,
            Capability::ApproveReject => &self.config.approve_reject,
            Capability::MarkNovelty => &self.config.mark_novelty,
        };
        members.contains(role)
    }

    /// Capabilities held by `role`.
    pub fn capabilities(&self, role: &Role) -> Vec<Capability> {
        Capability::ALL
            .into_iter()
            .filter(|c| self.allows(role, *c))
            .collect()
    }

    /// Whether `role` belongs to an external client.
    pub fn is_client(&self, role: &Role) -> bool {
        self.config.client_roles.contains(role)
    }

    /// Whether an assay in state `tag` may be flagged as a novelty.
    pub fn state_accepts_novelty(&self, tag: &str) -> bool {
        !self.config.novelty_locked_states.contains(tag)
    }

    /// Whether `role` may flag a novelty on an assay in state `tag`.
    pub fn can_flag_novelty(&self, role: &Role, tag: &str) -> bool {
        self.allows(role, Capability::MarkNovelty) && self.state_accepts_novelty(tag)
    }
}

impl Default for RolePolicy {
    fn default() -> Self {
        Self::new(Arc::new(PolicyConfig::default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn role(name: &str) -> Role {
        Role::new(name).unwrap()
    }

    #[test]
    fn default_capabilities() {
        let policy = RolePolicy::default();
        assert_eq!(policy.capabilities(&role("admin")), Capability::ALL.to_vec());
        assert_eq!(
            policy.capabilities(&role("tecnico")),
            vec![Capability::ChangeState, Capability::MarkNovelty]
        );
        assert!(policy.capabilities(&role("cliente")).is_empty());
    }

    #[test]
    fn approval_is_supervisor_only() {
        let policy = RolePolicy::default();
        assert!(policy.allows(&role("coordinador"), Capability::ApproveReject));
        assert!(!policy.allows(&role("tecnico"), Capability::ApproveReject));
        assert!(!policy.allows(&role("tecnico"), Capability::Reassign));
    }

    #[test]
    fn client_role_detection() {
        let policy = RolePolicy::default();
        assert!(policy.is_client(&role("cliente")));
        assert!(!policy.is_client(&role("admin")));
    }

    #[test]
    fn novelty_locked_states() {
        let policy = RolePolicy::default();
        for tag in ["E3", "E5", "E15"] {
            assert!(!policy.state_accepts_novelty(tag));
        }
        assert!(policy.state_accepts_novelty("E6"));
        assert!(policy.can_flag_novelty(&role("tecnico"), "E6"));
        assert!(!policy.can_flag_novelty(&role("tecnico"), "E15"));
        assert!(!policy.can_flag_novelty(&role("cliente"), "E6"));
    }

    #[test]
    fn approve_reject_does_not_change_transition_decisions() {
        use crate::TransitionAuthorizer;

        let config = PolicyConfig {
            approve_reject: BTreeSet::from([role("tecnico")]),
            ..PolicyConfig::default()
        };
        let policy = RolePolicy::new(Arc::new(config));
        assert!(policy.allows(&role("tecnico"), Capability::ApproveReject));
        assert!(!policy.allows(&role("admin"), Capability::ApproveReject));

        let auth = TransitionAuthorizer::default();
        let allowed = ["E10", "E8"];
        assert!(!auth.can_perform_transition("E9", "E10", &role("tecnico"), &allowed));
        assert!(auth.can_perform_transition("E9", "E10", &role("admin"), &allowed));
    }

    #[test]
    fn capability_names() {
        assert_eq!(Capability::ApproveReject.to_string(), "approve_reject");
    }
}
