//! # Assay Workflow
//!
//! Fifteen states an assay passes through under ISO/IEC 17025, from the
//! initial request to invoicing.
//!
//! ```text
//! E1 ─▶ E2 ─▶ E6 ─▶ E8 ─▶ E9 ─▶ E10 ─▶ E11 ─▶ E12 ─▶ E13 ─▶ E14 ─▶ E15
//!
//! side paths:  E1, E2, E5 ─▶ E3 (voided)     E2, E6 ─▶ E5 (novelty) ─▶ E2
//!              E6 ⇄ E7 ─▶ E8                 E6, E8 ─▶ E4 (repeat) ─▶ E2 | E6
//!              review steps back one stage:  E9 ─▶ E8, E10 ─▶ E9, E11 ─▶ E10
//! ```
//!
//! Tags parse case-insensitively (`"e10"` is `E10`) and always render in
//! upper case.

use std::fmt;

use serde::{Deserialize, Serialize};

use labflow_core::{AssayId, ProjectId, Role, StateError, Timestamp};

use crate::lifecycle::{normalize_code, Lifecycle, Phase, StateInfo, TransitionRecord};

/// Assay workflow state.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum WorkflowState {
    /// Not yet scheduled.
    #[default]
    E1,
    /// Scheduled.
    E2,
    /// Voided (terminal).
    E3,
    /// Needs repetition.
    E4,
    /// Novelty raised; on hold.
    E5,
    /// Running.
    E6,
    /// Waiting on other assays.
    E7,
    /// Processing data.
    E8,
    /// Technical review.
    E9,
    /// Coordination review.
    E10,
    /// Direction review.
    E11,
    /// Ready to send.
    E12,
    /// Sent to client.
    E13,
    /// Delivered and confirmed.
    E14,
    /// Invoiced (terminal).
    E15,
}

impl WorkflowState {
    /// Whether no transition leaves this state.
    pub fn is_terminal(&self) -> bool {
        self.edges().is_empty()
    }

    /// Whether an assay in this state may be flagged as a novelty.
    ///
    /// Terminal assays cannot, and an assay already in E5 is flagged.
    pub fn accepts_novelty(&self) -> bool {
        !self.is_terminal() && *self != Self::E5
    }
}

impl Lifecycle for WorkflowState {
    const KIND: &'static str = "assay";

    const ALL: &'static [Self] = &[
        Self::E1,
        Self::E2,
        Self::E3,
        Self::E4,
        Self::E5,
        Self::E6,
        Self::E7,
        Self::E8,
        Self::E9,
        Self::E10,
        Self::E11,
        Self::E12,
        Self::E13,
        Self::E14,
        Self::E15,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            Self::E1 => "E1",
            Self::E2 => "E2",
            Self::E3 => "E3",
            Self::E4 => "E4",
            Self::E5 => "E5",
            Self::E6 => "E6",
            Self::E7 => "E7",
            Self::E8 => "E8",
            Self::E9 => "E9",
            Self::E10 => "E10",
            Self::E11 => "E11",
            Self::E12 => "E12",
            Self::E13 => "E13",
            Self::E14 => "E14",
            Self::E15 => "E15",
        }
    }

    fn from_tag(tag: &str) -> Option<Self> {
        let upper = tag.to_ascii_uppercase();
        Self::ALL.iter().copied().find(|s| s.as_str() == upper)
    }

    fn edges(&self) -> &'static [Self] {
        use WorkflowState::*;
        match self {
            E1 => &[E2, E3],
            E2 => &[E6, E3, E5],
            E3 => &[],
            E4 => &[E2, E6],
            E5 => &[E2, E3],
            E6 => &[E7, E8, E4, E5],
            E7 => &[E6, E8],
            E8 => &[E9, E4],
            E9 => &[E10, E8],
            E10 => &[E11, E9],
            E11 => &[E12, E10],
            E12 => &[E13],
            E13 => &[E14],
            E14 => &[E15],
            E15 => &[],
        }
    }

    fn info(&self) -> StateInfo {
        use Phase::*;
        let (label, color, phase, description) = match self {
            Self::E1 => ("Sin programación", "#9CA3AF", Inicial, "Esperando programación"),
            Self::E2 => ("Programado", "#F59E0B", Inicial, "Programado sin ejecutar"),
            Self::E3 => ("Anulado", "#EF4444", Terminal, "Ensayo anulado"),
            Self::E4 => ("Repetición", "#F97316", Inicial, "Requiere repetición"),
            Self::E5 => ("Novedad", "#EAB308", Inicial, "Presenta novedad"),
            Self::E6 => ("En ejecución", "#3B82F6", Ejecucion, "Ensayo en curso"),
            Self::E7 => ("Espera ensayos", "#6366F1", Ejecucion, "Esperando otros ensayos"),
            Self::E8 => ("Procesamiento", "#8B5CF6", Ejecucion, "Procesando datos"),
            Self::E9 => ("Rev. Técnica", "#A855F7", Revision, "En revisión técnica"),
            Self::E10 => ("Rev. Coordinación", "#D946EF", Revision, "En revisión de coordinación"),
            Self::E11 => ("Rev. Dirección", "#EC4899", Revision, "En revisión de dirección"),
            Self::E12 => ("Por enviar", "#14B8A6", Entrega, "Listo para enviar"),
            Self::E13 => ("Enviado", "#10B981", Entrega, "Enviado al cliente"),
            Self::E14 => ("Entregado", "#22C55E", Entrega, "Entregado y confirmado"),
            Self::E15 => ("Facturado", "#16A34A", Terminal, "Facturado y cerrado"),
        };
        StateInfo {
            label,
            color,
            description,
            phase: Some(phase),
        }
    }
}

impl AsRef<str> for WorkflowState {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Assay ───────────────────────────────────────────────────────────

/// A laboratory assay and its workflow history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assay {
    /// Unique identifier.
    pub id: AssayId,
    /// Short code (e.g. "ENS-0042").
    pub code: String,
    /// Project the assay belongs to.
    pub project_id: ProjectId,
    /// Sample reference.
    pub sample: String,
    /// Test standard (e.g. "ASTM D2216").
    pub standard: String,
    /// Current workflow state.
    pub state: WorkflowState,
    /// Assigned technician, if any.
    pub technician: Option<String>,
    /// Rush flag.
    pub urgent: bool,
    /// Latest novelty description, if one was raised.
    pub novelty: Option<String>,
    /// Creation time.
    pub created_at: Timestamp,
    /// Last modification time.
    pub updated_at: Timestamp,
    /// Ordered log of applied transitions.
    pub transitions: Vec<TransitionRecord<WorkflowState>>,
}

impl Assay {
    /// Create an unscheduled assay (E1).
    pub fn new(code: &str, project_id: ProjectId, sample: &str, standard: &str) -> Self {
        let now = Timestamp::now();
        Self {
            id: AssayId::new(),
            code: normalize_code(code),
            project_id,
            sample: sample.trim().to_string(),
            standard: standard.trim().to_string(),
            state: WorkflowState::default(),
            technician: None,
            urgent: false,
            novelty: None,
            created_at: now,
            updated_at: now,
            transitions: Vec::new(),
        }
    }

    /// Move along a graph edge. A blank `reason` is dropped.
    pub fn transition_to(
        &mut self,
        target: WorkflowState,
        actor: Option<Role>,
        reason: Option<String>,
    ) -> Result<(), StateError> {
        if !self.state.edges().contains(&target) {
            return Err(StateError::InvalidTransition {
                kind: WorkflowState::KIND,
                from: self.state.to_string(),
                to: target.to_string(),
                valid: self.state.edges().iter().map(|s| s.to_string()).collect(),
            });
        }
        let reason = reason
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty());
        self.record(target, actor, reason);
        Ok(())
    }

    /// Flag a novelty: the assay is put on hold in E5 from any state that
    /// accepts one, regardless of graph edges.
    pub fn flag_novelty(&mut self, reason: &str, actor: Option<Role>) -> Result<(), StateError> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(StateError::Rejected {
                kind: WorkflowState::KIND,
                reason: "a novelty needs a description".to_string(),
            });
        }
        if !self.state.accepts_novelty() {
            return Err(StateError::Rejected {
                kind: WorkflowState::KIND,
                reason: format!("state {} cannot be flagged as a novelty", self.state),
            });
        }
        self.novelty = Some(reason.to_string());
        self.record(WorkflowState::E5, actor, Some(reason.to_string()));
        Ok(())
    }

    /// Assign a technician.
    pub fn reassign(&mut self, technician: &str) -> Result<(), StateError> {
        if self.state.is_terminal() {
            return Err(StateError::TerminalState {
                kind: WorkflowState::KIND,
                state: self.state.to_string(),
            });
        }
        let technician = technician.trim();
        self.technician = (!technician.is_empty()).then(|| technician.to_string());
        self.updated_at = Timestamp::now();
        Ok(())
    }

    fn record(&mut self, to: WorkflowState, actor: Option<Role>, reason: Option<String>) {
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
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_assay() -> Assay {
        Assay::new("ENS-0001", ProjectId::new(), "M-01", "ASTM D2216")
    }

    #[test]
    fn test_transitions_from_e1() {
        let s = WorkflowState::E1;
        assert_eq!(s.edges(), &[WorkflowState::E2, WorkflowState::E3]);
        assert!(!s.edges().contains(&WorkflowState::E6));
    }

    #[test]
    fn test_terminal_states() {
        let terminal: Vec<_> = WorkflowState::ALL
            .iter()
            .filter(|s| s.is_terminal())
            .copied()
            .collect();
        assert_eq!(terminal, vec![WorkflowState::E3, WorkflowState::E15]);
    }

    #[test]
    fn test_parse_case_insensitive() {
        assert_eq!(WorkflowState::from_tag("e5"), Some(WorkflowState::E5));
        assert_eq!(WorkflowState::from_tag("E10"), Some(WorkflowState::E10));
        assert_eq!(WorkflowState::from_tag("E99"), None);
        assert_eq!(WorkflowState::from_tag(""), None);
    }

    #[test]
    fn test_default_is_e1() {
        assert_eq!(WorkflowState::default(), WorkflowState::E1);
    }

    #[test]
    fn test_serde_tag() {
        let json = serde_json::to_string(&WorkflowState::E6).unwrap();
        assert_eq!(json, "\"E6\"");
    }

    #[test]
    fn test_review_phase_metadata() {
        let info = WorkflowState::E10.info();
        assert_eq!(info.label, "Rev. Coordinación");
        assert_eq!(info.color, "#D946EF");
        assert_eq!(info.phase, Some(Phase::Revision));
    }

    #[test]
    fn test_novelty_acceptance() {
        assert!(WorkflowState::E1.accepts_novelty());
        assert!(WorkflowState::E9.accepts_novelty());
        assert!(!WorkflowState::E3.accepts_novelty());
        assert!(!WorkflowState::E5.accepts_novelty());
        assert!(!WorkflowState::E15.accepts_novelty());
    }

    #[test]
    fn test_assay_happy_path_to_invoice() {
        use WorkflowState::*;
        let mut a = make_assay();
        for target in [E2, E6, E8, E9, E10, E11, E12, E13, E14, E15] {
            a.transition_to(target, None, None).unwrap();
        }
        assert_eq!(a.state, E15);
        assert_eq!(a.transitions.len(), 10);
        assert!(a.transition_to(E1, None, None).is_err());
    }

    #[test]
    fn test_assay_rejects_skipping_review() {
        let mut a = make_assay();
        let err = a.transition_to(WorkflowState::E9, None, None).unwrap_err();
        assert!(matches!(err, StateError::InvalidTransition { .. }));
        assert_eq!(a.state, WorkflowState::E1);
        assert!(a.transitions.is_empty());
    }

    #[test]
    fn test_assay_code_normalized_and_reason_kept() {
        let mut a = Assay::new(" ens-0042 ", ProjectId::new(), "M-01", "ASTM D2216");
        assert_eq!(a.code, "ENS-0042");
        a.transition_to(
            WorkflowState::E2,
            None,
            Some("Programado para el lunes".into()),
        )
        .unwrap();
        a.transition_to(WorkflowState::E6, None, Some(" ".into()))
            .unwrap();
        assert_eq!(
            a.transitions[0].reason.as_deref(),
            Some("Programado para el lunes")
        );
        assert!(a.transitions[1].reason.is_none());
    }

    #[test]
    fn test_flag_novelty_bypasses_graph() {
        let mut a = make_assay();
        a.flag_novelty("Muestra contaminada", None).unwrap();
        assert_eq!(a.state, WorkflowState::E5);
        assert_eq!(a.novelty.as_deref(), Some("Muestra contaminada"));
        let last = a.transitions.last().unwrap();
        assert_eq!(last.reason.as_deref(), Some("Muestra contaminada"));
    }

    #[test]
    fn test_flag_novelty_rejected_twice_and_without_reason() {
        let mut a = make_assay();
        assert!(a.flag_novelty("  ", None).is_err());
        a.flag_novelty("Equipo fuera de servicio", None).unwrap();
        assert!(a.flag_novelty("otra", None).is_err());
    }

    #[test]
    fn test_reassign_blocked_when_terminal() {
        let mut a = make_assay();
        a.reassign("J. Pérez").unwrap();
        assert_eq!(a.technician.as_deref(), Some("J. Pérez"));
        a.transition_to(WorkflowState::E3, None, None).unwrap();
        assert!(a.reassign("Otro").is_err());
    }
}
