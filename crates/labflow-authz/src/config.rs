//! # Authorization Configuration
//!
//! Declarative tables consumed by [`TransitionAuthorizer`] and
//! [`RolePolicy`]. Adding a restricted role is a configuration change; the
//! decision functions never name a role.
//!
//! ```yaml
//! authorizer:
//!   categories:
//!     approval: [E10, E11, E12]
//!   restricted_roles:
//!     tecnico: [approval]
//! policy:
//!   change_state: [admin, coordinador, tecnico]
//!   approve_reject: [admin, coordinador]
//! ```
//!
//! [`LabflowConfig::load`] rewrites every state tag to its canonical form
//! (`e10` becomes `E10`, `Pausado` becomes `pausado`) and refuses tags that
//! name no state.
//!
//! [`TransitionAuthorizer`]: crate::TransitionAuthorizer
//! [`RolePolicy`]: crate::RolePolicy

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use labflow_core::Role;
use labflow_state::{Lifecycle, ProjectState, WorkflowState};

/// Errors loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The YAML did not match the expected structure.
    #[error("failed to parse config {path}: {source}")]
    YamlParse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    /// A restricted role references a category with no member list.
    #[error("role {role} is restricted from category {category:?}, which defines no states")]
    UndefinedCategory { role: Role, category: StateCategory },

    /// A category lists a blank state tag.
    #[error("category {category:?} contains a blank state tag")]
    BlankStateTag { category: StateCategory },

    /// A configured tag is not a project or assay state.
    #[error("{field} lists {tag:?}, which is not a known state")]
    UnknownStateTag { field: String, tag: String },
}

/// A named, role-sensitive subset of state tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateCategory {
    /// Review and sign-off steps.
    Approval,
}

/// Tables driving [`TransitionAuthorizer`](crate::TransitionAuthorizer).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthorizerConfig {
    /// Members of each category.
    #[serde(default = "default_categories")]
    pub categories: BTreeMap<StateCategory, BTreeSet<String>>,
    /// Categories each restricted role may not target. Roles absent from
    /// this table are unrestricted.
    #[serde(default = "default_restricted_roles")]
    pub restricted_roles: BTreeMap<Role, BTreeSet<StateCategory>>,
}

impl Default for AuthorizerConfig {
    fn default() -> Self {
        Self {
            categories: default_categories(),
            restricted_roles: default_restricted_roles(),
        }
    }
}

impl AuthorizerConfig {
    /// Reject tables that would silently restrict nothing.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (category, members) in &self.categories {
            if members.iter().any(|tag| tag.trim().is_empty()) {
                return Err(ConfigError::BlankStateTag {
                    category: *category,
                });
            }
        }
        for (role, categories) in &self.restricted_roles {
            for category in categories {
                if !self.categories.contains_key(category) {
                    return Err(ConfigError::UndefinedCategory {
                        role: role.clone(),
                        category: *category,
                    });
                }
            }
        }
        Ok(())
    }

    /// Rewrite category members to canonical tags. Members may name
    /// project or assay states.
    pub fn canonicalize(&mut self) -> Result<(), ConfigError> {
        for (category, members) in &mut self.categories {
            let field = format!("authorizer.categories.{}", category.as_str());
            *members = canonical_tags(members, &field, |tag| {
                WorkflowState::from_tag(tag)
                    .map(|s| s.as_str())
                    .or_else(|| ProjectState::from_tag(&tag.to_lowercase()).map(|s| s.as_str()))
            })?;
        }
        Ok(())
    }
}

impl StateCategory {
    /// The YAML key of this category.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approval => "approval",
        }
    }
}

fn default_categories() -> BTreeMap<StateCategory, BTreeSet<String>> {
    let approval = ["E10", "E11", "E12"].into_iter().map(String::from).collect();
    BTreeMap::from([(StateCategory::Approval, approval)])
}

fn default_restricted_roles() -> BTreeMap<Role, BTreeSet<StateCategory>> {
    roles(&[Role::TECNICO])
        .into_iter()
        .map(|role| (role, BTreeSet::from([StateCategory::Approval])))
        .collect()
}

/// Role lists driving [`RolePolicy`](crate::RolePolicy).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolicyConfig {
    /// Roles that may move assays through the workflow.
    #[serde(default = "default_change_state")]
    pub change_state: BTreeSet<Role>,
    /// Roles that may reassign the technician on an assay.
    #[serde(default = "default_supervisors")]
    pub reassign: BTreeSet<Role>,
    /// Roles reported as able to approve or reject reviews. Not consulted
    /// by the authorizer.
    #[serde(default = "default_supervisors")]
    pub approve_reject: BTreeSet<Role>,
    /// Roles that may flag an assay as a novelty.
    #[serde(default = "default_change_state")]
    pub mark_novelty: BTreeSet<Role>,
    /// Roles that belong to external clients.
    #[serde(default = "default_client_roles")]
    pub client_roles: BTreeSet<Role>,
    /// Assay states that cannot be flagged as a novelty.
    #[serde(default = "default_novelty_locked")]
    pub novelty_locked_states: BTreeSet<String>,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            change_state: default_change_state(),
            reassign: default_supervisors(),
            approve_reject: default_supervisors(),
            mark_novelty: default_change_state(),
            client_roles: default_client_roles(),
            novelty_locked_states: default_novelty_locked(),
        }
    }
}

impl PolicyConfig {
    /// Rewrite novelty-locked states to canonical assay tags.
    pub fn canonicalize(&mut self) -> Result<(), ConfigError> {
        self.novelty_locked_states = canonical_tags(
            &self.novelty_locked_states,
            "policy.novelty_locked_states",
            |tag| WorkflowState::from_tag(tag).map(|s| s.as_str()),
        )?;
        Ok(())
    }
}

fn canonical_tags(
    tags: &BTreeSet<String>,
    field: &str,
    lookup: impl Fn(&str) -> Option<&'static str>,
) -> Result<BTreeSet<String>, ConfigError> {
    tags.iter()
        .map(|tag| {
            lookup(tag.trim())
                .map(String::from)
                .ok_or_else(|| ConfigError::UnknownStateTag {
                    field: field.to_string(),
                    tag: tag.clone(),
                })
        })
        .collect()
}

fn default_change_state() -> BTreeSet<Role> {
    roles(&[Role::ADMIN, Role::COORDINADOR, Role::TECNICO])
}

fn default_supervisors() -> BTreeSet<Role> {
    roles(&[Role::ADMIN, Role::COORDINADOR])
}

fn default_client_roles() -> BTreeSet<Role> {
    roles(&[Role::CLIENTE])
}

fn default_novelty_locked() -> BTreeSet<String> {
    ["E3", "E5", "E15"].into_iter().map(String::from).collect()
}

fn roles(names: &[&str]) -> BTreeSet<Role> {
    names.iter().filter_map(|n| Role::new(n).ok()).collect()
}

/// Top-level configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LabflowConfig {
    /// Transition authorizer tables.
    #[serde(default)]
    pub authorizer: AuthorizerConfig,
    /// Role policy lists.
    #[serde(default)]
    pub policy: PolicyConfig,
}

impl LabflowConfig {
    /// Load and validate a YAML configuration file. State tags come back in
    /// canonical form.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: Self =
            serde_yaml::from_str(&content).map_err(|source| ConfigError::YamlParse {
                path: path.to_path_buf(),
                source,
            })?;
        config.authorizer.validate()?;
        config.authorizer.canonicalize()?;
        config.policy.canonicalize()?;
        tracing::debug!(
            path = %path.display(),
            restricted_roles = config.authorizer.restricted_roles.len(),
            "loaded authorization config"
        );
        Ok(config)
    }
}
