//! # Assay Workflow Service
//!
//! Assay moves additionally require the acting role to hold a
//! [`Capability`] from the [`RolePolicy`]; the graph and approval checks
//! are shared with every other lifecycle through [`TransitionService`].

use std::sync::Arc;

use labflow_authz::{Capability, RolePolicy, TransitionAuthorizer};
use labflow_core::{AssayId, Role, StateError};
use labflow_state::{Assay, AvailableTransition, Lifecycle, StateRegistry, WorkflowState};

use crate::error::ServiceError;
use crate::repository::Repository;
use crate::transition::TransitionService;

/// Role-checked operations on assays.
pub struct AssayService<R: Repository<Assay>> {
    inner: TransitionService<Assay, R>,
    policy: Arc<RolePolicy>,
}

impl<R: Repository<Assay>> AssayService<R> {
    /// Wire the service over its collaborators.
    pub fn new(
        repo: R,
        registry: Arc<StateRegistry<WorkflowState>>,
        authorizer: Arc<TransitionAuthorizer>,
        policy: Arc<RolePolicy>,
    ) -> Self {
        Self {
            inner: TransitionService::new(repo, registry, authorizer),
            policy,
        }
    }

    /// The role policy this service consults.
    pub fn policy(&self) -> &RolePolicy {
        &self.policy
    }

    /// The underlying repository.
    pub fn repository(&self) -> &R {
        self.inner.repository()
    }

    /// Store a new assay.
    pub fn create(&self, assay: Assay) -> Result<Assay, ServiceError> {
        self.inner.create(assay)
    }

    /// Load an assay.
    pub fn get(&self, id: AssayId) -> Result<Assay, ServiceError> {
        self.inner.get(id)
    }

    /// All stored assays.
    pub fn list(&self) -> Result<Vec<Assay>, ServiceError> {
        self.inner.list()
    }

    /// Move an assay along the workflow.
    ///
    /// The role must hold [`Capability::ChangeState`]; the remaining checks
    /// are those of [`TransitionService::change_state`].
    pub fn change_state(
        &self,
        id: AssayId,
        target: WorkflowState,
        role: &Role,
        reason: Option<String>,
    ) -> Result<Assay, ServiceError> {
        self.require(role, Capability::ChangeState)?;
        self.inner.change_state(id, target, role, reason)
    }

    /// Targets `role` may take from the assay's current state. Empty when
    /// the role cannot change state at all.
    pub fn available_transitions(
        &self,
        id: AssayId,
        role: &Role,
    ) -> Result<Vec<AvailableTransition<WorkflowState>>, ServiceError> {
        if !self.policy.allows(role, Capability::ChangeState) {
            // Still surface NotFound for a bad id.
            self.inner.get(id)?;
            return Ok(Vec::new());
        }
        self.inner.available_transitions(id, role)
    }

    /// Put the assay on hold in E5 with a description of the problem.
    pub fn flag_novelty(
        &self,
        id: AssayId,
        role: &Role,
        reason: &str,
    ) -> Result<Assay, ServiceError> {
        self.require(role, Capability::MarkNovelty)?;
        let mut assay = self.inner.get(id)?;
        let from = assay.state;
        if !self.policy.state_accepts_novelty(from.as_str()) {
            return Err(StateError::Rejected {
                kind: WorkflowState::KIND,
                reason: format!("state {from} cannot be flagged as a novelty"),
            }
            .into());
        }
        assay.flag_novelty(reason, Some(role.clone()))?;
        let assay = self.inner.save(assay)?;
        tracing::info!(id = %id, role = %role, from = %from, "novelty flagged");
        Ok(assay)
    }

    /// Assign a technician. A blank name clears the assignment.
    pub fn reassign(
        &self,
        id: AssayId,
        role: &Role,
        technician: &str,
    ) -> Result<Assay, ServiceError> {
        self.require(role, Capability::Reassign)?;
        let mut assay = self.inner.get(id)?;
        assay.reassign(technician)?;
        let assay = self.inner.save(assay)?;
        tracing::info!(id = %id, role = %role, technician = ?assay.technician, "assay reassigned");
        Ok(assay)
    }

    fn require(&self, role: &Role, capability: Capability) -> Result<(), ServiceError> {
        if self.policy.allows(role, capability) {
            return Ok(());
        }
        tracing::warn!(role = %role, capability = %capability, "capability missing");
        Err(ServiceError::MissingCapability {
            role: role.clone(),
            capability,
        })
    }
}
