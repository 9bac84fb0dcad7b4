//! # Project Lifecycle
//!
//! ```text
//! activo ──▶ pausado ──▶ activo (reactivation)
//!   │           │
//!   │           └──▶ cancelado (terminal)
//!   ├──▶ completado (terminal)
//!   └──▶ cancelado  (terminal)
//! ```
//!
//! Completing or cancelling a project stamps its end date. A finalized
//! project rejects every further command, including metadata edits.

use std::fmt;

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use labflow_core::{ProjectId, Role, StateError, Timestamp};

use crate::lifecycle::{normalize_code, Lifecycle, StateInfo, TransitionRecord};

// ─── Project State ───────────────────────────────────────────────────

/// Lifecycle state of a laboratory project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectState {
    /// Ongoing with normal activity.
    Activo,
    /// Temporarily stopped.
    Pausado,
    /// Finished successfully (terminal).
    Completado,
    /// Cancelled (terminal).
    Cancelado,
}

impl ProjectState {
    /// Whether this state is terminal.
    pub fn is_terminal(&self) -> bool {
        self.edges().is_empty()
    }
}

impl Lifecycle for ProjectState {
    const KIND: &'static str = "project";

    const ALL: &'static [Self] = &[
        Self::Activo,
        Self::Pausado,
        Self::Completado,
        Self::Cancelado,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            Self::Activo => "activo",
            Self::Pausado => "pausado",
            Self::Completado => "completado",
            Self::Cancelado => "cancelado",
        }
    }

    fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "activo" => Some(Self::Activo),
            "pausado" => Some(Self::Pausado),
            "completado" => Some(Self::Completado),
            "cancelado" => Some(Self::Cancelado),
            _ => None,
        }
    }

    fn edges(&self) -> &'static [Self] {
        match self {
            Self::Activo => &[Self::Pausado, Self::Completado, Self::Cancelado],
            Self::Pausado => &[Self::Activo, Self::Cancelado],
            Self::Completado => &[],
            Self::Cancelado => &[],
        }
    }

    fn info(&self) -> StateInfo {
        let (label, color, description) = match self {
            Self::Activo => ("Activo", "#10B981", "Proyecto en curso con actividad normal"),
            Self::Pausado => ("Pausado", "#F59E0B", "Proyecto temporalmente detenido"),
            Self::Completado => ("Completado", "#6B7280", "Proyecto finalizado exitosamente"),
            Self::Cancelado => ("Cancelado", "#EF4444", "Proyecto cancelado"),
        };
        StateInfo {
            label,
            color,
            description,
            phase: None,
        }
    }
}

impl AsRef<str> for ProjectState {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for ProjectState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Project ─────────────────────────────────────────────────────────

/// Editable project metadata. `None` leaves a field unchanged; an empty
/// optional text clears it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectUpdate {
    /// New display name. Must not be blank.
    pub name: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// New site location.
    pub location: Option<String>,
}

/// A laboratory project with its lifecycle state and transition history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    /// Unique identifier.
    pub id: ProjectId,
    /// Short project code (e.g. "PRY-2026-014").
    pub code: String,
    /// Display name.
    pub name: String,
    /// Owning client.
    pub client_id: String,
    /// Optional description.
    pub description: Option<String>,
    /// Optional site location.
    pub location: Option<String>,
    /// Current lifecycle state.
    pub state: ProjectState,
    /// Start date.
    pub start_date: NaiveDate,
    /// Set when the project completes or is cancelled.
    pub end_date: Option<NaiveDate>,
    /// Creation time.
    pub created_at: Timestamp,
    /// Last modification time.
    pub updated_at: Timestamp,
    /// Ordered log of applied transitions.
    pub transitions: Vec<TransitionRecord<ProjectState>>,
}

impl Project {
    /// Create a new project in `activo`.
    pub fn new(
        code: &str,
        name: &str,
        client_id: &str,
        start_date: NaiveDate,
    ) -> Result<Self, StateError> {
        let code = normalize_code(&require_text(code, "code")?);
        let name = require_text(name, "name")?;
        let client_id = require_text(client_id, "client")?;
        let now = Timestamp::now();
        Ok(Self {
            id: ProjectId::new(),
            code,
            name,
            client_id,
            description: None,
            location: None,
            state: ProjectState::Activo,
            start_date,
            end_date: None,
            created_at: now,
            updated_at: now,
            transitions: Vec::new(),
        })
    }

    /// Whether the project is completed or cancelled.
    pub fn is_finalized(&self) -> bool {
        self.state.is_terminal()
    }

    /// Whether the graph allows moving to `target`.
    pub fn can_transition_to(&self, target: ProjectState) -> bool {
        self.state.edges().contains(&target)
    }

    /// Length of the project in whole days, counting up to `today` while it
    /// is still open.
    pub fn duration_days(&self, today: NaiveDate) -> i64 {
        let end = self.end_date.unwrap_or(today);
        (end - self.start_date).num_days().abs()
    }

    /// Edit metadata. Rejected once the project is finalized.
    pub fn update(&mut self, update: ProjectUpdate) -> Result<(), StateError> {
        if self.is_finalized() {
            return Err(StateError::TerminalState {
                kind: ProjectState::KIND,
                state: self.state.to_string(),
            });
        }
        if let Some(name) = update.name {
            self.name = require_text(&name, "name")?;
        }
        if let Some(description) = update.description {
            self.description = non_blank(description);
        }
        if let Some(location) = update.location {
            self.location = non_blank(location);
        }
        self.updated_at = Timestamp::now();
        Ok(())
    }

    /// Pause the project (activo → pausado).
    pub fn pause(&mut self, actor: Option<Role>) -> Result<(), StateError> {
        self.transition_to(ProjectState::Pausado, actor, None)
    }

    /// Reactivate a paused project (pausado → activo).
    pub fn reactivate(&mut self, actor: Option<Role>) -> Result<(), StateError> {
        self.transition_to(ProjectState::Activo, actor, None)
    }

    /// Complete the project and stamp its end date.
    pub fn complete(&mut self, actor: Option<Role>) -> Result<(), StateError> {
        self.transition_to(ProjectState::Completado, actor, None)
    }

    /// Cancel the project and stamp its end date.
    pub fn cancel(&mut self, actor: Option<Role>) -> Result<(), StateError> {
        self.transition_to(ProjectState::Cancelado, actor, None)
    }

    /// Move to `target`, recording `reason` on the transition log.
    ///
    /// Reactivation is only accepted from `pausado`; completing or
    /// cancelling stamps the end date.
    pub fn transition_to(
        &mut self,
        target: ProjectState,
        actor: Option<Role>,
        reason: Option<String>,
    ) -> Result<(), StateError> {
        if target == ProjectState::Activo && self.state != ProjectState::Pausado {
            return Err(StateError::Rejected {
                kind: ProjectState::KIND,
                reason: "only paused projects can be reactivated".to_string(),
            });
        }
        self.apply(target, actor, reason.and_then(non_blank))?;
        if target.is_terminal() {
            self.end_date = Some(Utc::now().date_naive());
        }
        Ok(())
    }

    fn apply(
        &mut self,
        to: ProjectState,
        actor: Option<Role>,
        reason: Option<String>,
    ) -> Result<(), StateError> {
        if !self.can_transition_to(to) {
            return Err(StateError::InvalidTransition {
                kind: ProjectState::KIND,
                from: self.state.to_string(),
                to: to.to_string(),
                valid: self.state.edges().iter().map(|s| s.to_string()).collect(),
            });
        }
        let now = Timestamp::now();
        self.transitions.push(TransitionRecord {
            from_state: self.state,
            to_state: to,
            timestamp: now,
            actor,
            reason,
        });
        self.state = to;
        self.updated_at = now;
        Ok(())
    }
}

fn require_text(value: &str, field: &str) -> Result<String, StateError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(StateError::Rejected {
            kind: ProjectState::KIND,
            reason: format!("{field} must not be empty"),
        });
    }
    Ok(trimmed.to_string())
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

// ─── Tests ───────────────────────────────────────────────────────────
