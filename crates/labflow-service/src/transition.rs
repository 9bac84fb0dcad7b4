//! # Role-Checked State Changes
//!
//! [`TransitionService`] runs the same sequence for every lifecycle
//! entity: load, check the graph, check the role, apply, persist. The
//! entity-specific part (how a transition is applied, what side effects
//! it has) lives behind [`Tracked`].

use std::marker::PhantomData;
use std::sync::Arc;

use labflow_authz::TransitionAuthorizer;
use labflow_core::{Role, StateError};
use labflow_state::{
    Assay, AvailableTransition, Lifecycle, Project, ProjectState, StateRegistry, WorkflowState,
};

use crate::error::ServiceError;
use crate::repository::{Record, Repository};

/// A record that moves through a [`Lifecycle`].
pub trait Tracked: Record {
    /// The lifecycle this record follows.
    type State: Lifecycle;

    /// Current state.
    fn state(&self) -> Self::State;

    /// Apply a transition the caller has already authorized.
    fn apply_transition(
        &mut self,
        to: Self::State,
        actor: Role,
        reason: Option<String>,
    ) -> Result<(), StateError>;
}

impl Tracked for Project {
    type State = ProjectState;

    fn state(&self) -> ProjectState {
        self.state
    }

    fn apply_transition(
        &mut self,
        to: ProjectState,
        actor: Role,
        reason: Option<String>,
    ) -> Result<(), StateError> {
        self.transition_to(to, Some(actor), reason)
    }
}

impl Tracked for Assay {
    type State = WorkflowState;

    fn state(&self) -> WorkflowState {
        self.state
    }

    fn apply_transition(
        &mut self,
        to: WorkflowState,
        actor: Role,
        reason: Option<String>,
    ) -> Result<(), StateError> {
        self.transition_to(to, Some(actor), reason)
    }
}

/// Load-decide-apply-persist around one record type.
pub struct TransitionService<T, R>
where
    T: Tracked,
    R: Repository<T>,
{
    repo: R,
    registry: Arc<StateRegistry<T::State>>,
    authorizer: Arc<TransitionAuthorizer>,
    _record: PhantomData<fn() -> T>,
}

/// State changes for projects.
pub type ProjectService<R> = TransitionService<Project, R>;

impl<T, R> TransitionService<T, R>
where
    T: Tracked,
    R: Repository<T>,
{
    /// Wire a service over its collaborators.
    pub fn new(
        repo: R,
        registry: Arc<StateRegistry<T::State>>,
        authorizer: Arc<TransitionAuthorizer>,
    ) -> Self {
        Self {
            repo,
            registry,
            authorizer,
            _record: PhantomData,
        }
    }

    /// The underlying repository.
    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// The registry this service consults.
    pub fn registry(&self) -> &StateRegistry<T::State> {
        &self.registry
    }

    /// The authorizer this service consults.
    pub fn authorizer(&self) -> &TransitionAuthorizer {
        &self.authorizer
    }

    /// Store a new record.
    pub fn create(&self, record: T) -> Result<T, ServiceError> {
        self.repo.insert(record.clone())?;
        tracing::info!(kind = T::KIND, id = %record.record_id(), "record created");
        Ok(record)
    }

    /// Load a record or fail with [`ServiceError::NotFound`].
    pub fn get(&self, id: T::Id) -> Result<T, ServiceError> {
        self.repo
            .find_by_id(id)?
            .ok_or_else(|| ServiceError::NotFound {
                kind: T::KIND,
                id: id.to_string(),
            })
    }

    /// All stored records.
    pub fn list(&self) -> Result<Vec<T>, ServiceError> {
        Ok(self.repo.list()?)
    }

    /// Persist a record that was modified outside a transition.
    pub fn save(&self, record: T) -> Result<T, ServiceError> {
        Ok(self.repo.update(record)?)
    }

    /// Move record `id` to `target` on behalf of `role`. `reason` is kept
    /// on the transition log.
    ///
    /// # Errors
    ///
    /// - [`ServiceError::NotFound`] if no record has this id.
    /// - [`ServiceError::State`] with [`StateError::InvalidTransition`] if
    ///   the graph has no such edge; the error lists the valid targets.
    /// - [`ServiceError::Forbidden`] if the edge exists but `role` may not
    ///   take it.
    pub fn change_state(
        &self,
        id: T::Id,
        target: T::State,
        role: &Role,
        reason: Option<String>,
    ) -> Result<T, ServiceError> {
        let mut record = self.get(id)?;
        let from = record.state();
        let allowed = self.registry.transitions_from(from);

        if !self.registry.can_transition(from, target) {
            return Err(StateError::InvalidTransition {
                kind: <T::State as Lifecycle>::KIND,
                from: from.to_string(),
                to: target.to_string(),
                valid: allowed.iter().map(|s| s.to_string()).collect(),
            }
            .into());
        }

        if !self
            .authorizer
            .can_perform_transition(from.as_str(), target.as_str(), role, allowed)
        {
            tracing::warn!(
                kind = T::KIND,
                id = %id,
                role = %role,
                from = %from,
                to = %target,
                "transition denied for role"
            );
            return Err(ServiceError::Forbidden {
                kind: T::KIND,
                role: role.clone(),
                to: target.to_string(),
            });
        }

        record.apply_transition(target, role.clone(), reason)?;
        let record = self.repo.update(record)?;
        tracing::info!(
            kind = T::KIND,
            id = %id,
            role = %role,
            from = %from,
            to = %target,
            "state changed"
        );
        Ok(record)
    }

    /// Targets `role` may take from the record's current state, with
    /// display metadata.
    pub fn available_transitions(
        &self,
        id: T::Id,
        role: &Role,
    ) -> Result<Vec<AvailableTransition<T::State>>, ServiceError> {
        let record = self.get(id)?;
        let permitted = self
            .authorizer
            .filter_by_role(self.registry.transitions_from(record.state()), role);
        Ok(permitted
            .into_iter()
            .map(|state| AvailableTransition {
                state,
                info: self.registry.info_of(state),
            })
            .collect())
    }
}
