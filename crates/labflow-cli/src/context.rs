//! # Command Context
//!
//! Registries, authorizer, and policy built once per invocation from the
//! optional YAML config, plus the store location.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context as _, Result};

use labflow_authz::{LabflowConfig, RolePolicy, TransitionAuthorizer};
use labflow_service::{AssayService, ProjectService, TransitionService};
use labflow_state::{Assay, Project, ProjectState, StateRegistry, WorkflowState};

use crate::store::JsonFileRepository;

/// Shared collaborators for every subcommand.
pub struct Context {
    pub state_dir: PathBuf,
    pub projects: Arc<StateRegistry<ProjectState>>,
    pub assays: Arc<StateRegistry<WorkflowState>>,
    pub authorizer: Arc<TransitionAuthorizer>,
    pub policy: Arc<RolePolicy>,
}

impl Context {
    /// Build the context. Without a config file the built-in tables apply.
    pub fn load(config: Option<&Path>, state_dir: &Path) -> Result<Self> {
        let config = match config {
            Some(path) => LabflowConfig::load(path)
                .with_context(|| format!("failed to load config {}", path.display()))?,
            None => LabflowConfig::default(),
        };
        Ok(Self {
            state_dir: state_dir.to_path_buf(),
            projects: Arc::new(StateRegistry::new()?),
            assays: Arc::new(StateRegistry::new()?),
            authorizer: Arc::new(TransitionAuthorizer::new(Arc::new(config.authorizer))),
            policy: Arc::new(RolePolicy::new(Arc::new(config.policy))),
        })
    }

    /// Project service over `<state-dir>/projects`.
    pub fn project_service(&self) -> ProjectService<JsonFileRepository<Project>> {
        TransitionService::new(
            JsonFileRepository::new(self.state_dir.join("projects")),
            Arc::clone(&self.projects),
            Arc::clone(&self.authorizer),
        )
    }

    /// Assay service over `<state-dir>/assays`.
    pub fn assay_service(&self) -> AssayService<JsonFileRepository<Assay>> {
        AssayService::new(
            JsonFileRepository::new(self.state_dir.join("assays")),
            Arc::clone(&self.assays),
            Arc::clone(&self.authorizer),
            Arc::clone(&self.policy),
        )
    }
}
