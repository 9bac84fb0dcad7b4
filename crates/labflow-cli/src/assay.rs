//! # Assay Subcommand
//!
//! Assay workflow against the local store. Every state-changing command
//! takes the acting role; capability and approval checks run in
//! [`AssayService`](labflow_service::AssayService).

use anyhow::{bail, Context as _, Result};
use clap::{Args, Subcommand};

use labflow_core::Role;
use labflow_service::Record;
use labflow_state::{Assay, Lifecycle};

use crate::context::Context;

/// Arguments for the `labflow assay` subcommand.
#[derive(Args, Debug)]
pub struct AssayArgs {
    #[command(subcommand)]
    pub command: AssayCommand,
}

/// Assay subcommands.
#[derive(Subcommand, Debug)]
pub enum AssayCommand {
    /// Register an assay in E1 under an existing project.
    Create {
        /// Assay code (e.g. "ENS-0042").
        #[arg(long)]
        code: String,
        /// Code of the owning project.
        #[arg(long)]
        project: String,
        /// Sample reference.
        #[arg(long)]
        sample: String,
        /// Test standard.
        #[arg(long)]
        standard: String,
        /// Mark as urgent.
        #[arg(long)]
        urgent: bool,
    },

    /// Move an assay along the workflow.
    Transition {
        #[arg(long)]
        code: String,
        /// Target state tag (E1..E15).
        #[arg(long)]
        to: String,
        /// Acting role.
        #[arg(long)]
        role: Role,
        /// Note kept on the transition log.
        #[arg(long)]
        reason: Option<String>,
    },

    /// Flag a novelty, putting the assay on hold in E5.
    Novelty {
        #[arg(long)]
        code: String,
        #[arg(long)]
        role: Role,
        /// What went wrong.
        #[arg(long)]
        reason: String,
    },

    /// Assign a technician. An empty name clears the assignment.
    Reassign {
        #[arg(long)]
        code: String,
        #[arg(long)]
        role: Role,
        #[arg(long)]
        technician: String,
    },

    /// Show an assay and the transitions available to a role.
    Status {
        #[arg(long)]
        code: String,
        #[arg(long)]
        role: Option<Role>,
    },

    /// List assays, optionally for one project.
    List {
        /// Project code to filter by.
        #[arg(long)]
        project: Option<String>,
    },
}

/// Execute the assay subcommand.
pub fn run_assay(args: &AssayArgs, ctx: &Context) -> Result<u8> {
    match &args.command {
        AssayCommand::Create {
            code,
            project,
            sample,
            standard,
            urgent,
        } => cmd_create(ctx, code, project, sample, standard, *urgent),
        AssayCommand::Transition {
            code,
            to,
            role,
            reason,
        } => cmd_transition(ctx, code, to, role, reason.as_deref()),
        AssayCommand::Novelty { code, role, reason } => cmd_novelty(ctx, code, role, reason),
        AssayCommand::Reassign {
            code,
            role,
            technician,
        } => cmd_reassign(ctx, code, role, technician),
        AssayCommand::Status { code, role } => cmd_status(ctx, code, role.as_ref()),
        AssayCommand::List { project } => cmd_list(ctx, project.as_deref()),
    }
}

fn load(ctx: &Context, code: &str) -> Result<Assay> {
    match ctx.assay_service().repository().find_by_code(code)? {
        Some(assay) => Ok(assay),
        None => bail!("assay not found: {code}"),
    }
}

fn cmd_create(
    ctx: &Context,
    code: &str,
    project: &str,
    sample: &str,
    standard: &str,
    urgent: bool,
) -> Result<u8> {
    let owner = ctx
        .project_service()
        .repository()
        .find_by_code(project)?
        .with_context(|| format!("project not found: {project}"))?;
    if owner.is_finalized() {
        bail!("project {project} is {}; no new assays", owner.state);
    }

    let mut assay = Assay::new(code, owner.id, sample, standard);
    assay.urgent = urgent;
    let assay = ctx.assay_service().create(assay)?;
    println!("OK: created assay {} in {} state", assay.code, assay.state);
    Ok(0)
}

fn cmd_transition(
    ctx: &Context,
    code: &str,
    to: &str,
    role: &Role,
    reason: Option<&str>,
) -> Result<u8> {
    let target = ctx.assays.parse(to)?;
    let assay = load(ctx, code)?;
    let from = assay.state;
    let assay = ctx
        .assay_service()
        .change_state(assay.record_id(), target, role, reason.map(str::to_string))?;
    println!("OK: assay {code} transitioned {from} → {}", assay.state);
    Ok(0)
}

fn cmd_novelty(ctx: &Context, code: &str, role: &Role, reason: &str) -> Result<u8> {
    let assay = load(ctx, code)?;
    let from = assay.state;
    let assay = ctx
        .assay_service()
        .flag_novelty(assay.record_id(), role, reason)?;
    println!("OK: assay {code} flagged {from} → {}", assay.state);
    Ok(0)
}

fn cmd_reassign(ctx: &Context, code: &str, role: &Role, technician: &str) -> Result<u8> {
    let assay = load(ctx, code)?;
    let assay = ctx
        .assay_service()
        .reassign(assay.record_id(), role, technician)?;
    match &assay.technician {
        Some(name) => println!("OK: assay {code} assigned to {name}"),
        None => println!("OK: assay {code} unassigned"),
    }
    Ok(0)
}

fn cmd_status(ctx: &Context, code: &str, role: Option<&Role>) -> Result<u8> {
    let assay = load(ctx, code)?;
    let info = ctx.assays.info_of(assay.state);

    println!("Assay: {}", assay.code);
    println!("  Sample: {}", assay.sample);
    println!("  Standard: {}", assay.standard);
    println!("  State: {} ({})", assay.state, info.label);
    println!("  Technician: {}", assay.technician.as_deref().unwrap_or("-"));
    if assay.urgent {
        println!("  Urgent: yes");
    }
    if let Some(novelty) = &assay.novelty {
        println!("  Novelty: {novelty}");
    }
    println!("  Transitions: {}", assay.transitions.len());
    for (i, t) in assay.transitions.iter().enumerate() {
        let actor = t.actor.as_ref().map_or("-", |r| r.as_str());
        let reason = t.reason.as_deref().map(|r| format!(" ({r})")).unwrap_or_default();
        println!(
            "    [{i}] {} → {} at {} by {actor}{reason}",
            t.from_state, t.to_state, t.timestamp
        );
    }

    if let Some(role) = role {
        let available = ctx
            .assay_service()
            .available_transitions(assay.record_id(), role)?;
        let tags: Vec<_> = available.iter().map(|a| a.state.as_str()).collect();
        if tags.is_empty() {
            println!("  Available to {role}: none");
        } else {
            println!("  Available to {role}: {}", tags.join(", "));
        }
    }
    Ok(0)
}

fn cmd_list(ctx: &Context, project: Option<&str>) -> Result<u8> {
    let mut assays = ctx.assay_service().list()?;
    if let Some(code) = project {
        let owner = ctx
            .project_service()
            .repository()
            .find_by_code(code)?
            .with_context(|| format!("project not found: {code}"))?;
        assays.retain(|a| a.project_id == owner.id);
    }
    if assays.is_empty() {
        println!("No assays found.");
        return Ok(0);
    }
    println!("Assays ({}):", assays.len());
    for a in &assays {
        let flag = if a.urgent { " !" } else { "" };
        println!("  {}: {} [{}]{flag}", a.code, a.sample, a.state);
    }
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use labflow_state::{Project, WorkflowState};

    fn setup() -> (tempfile::TempDir, Context) {
        let dir = tempfile::tempdir().unwrap();
        let ctx = Context::load(None, dir.path()).unwrap();
        let start = NaiveDate::from_ymd_opt(2026, 5, 4).unwrap();
        let project = Project::new("PRY-001", "Laboratorio", "cli-1", start).unwrap();
        ctx.project_service().create(project).unwrap();
        cmd_create(&ctx, "ENS-0001", "PRY-001", "M-1", "ASTM D2216", false).unwrap();
        (dir, ctx)
    }

    fn role(name: &str) -> Role {
        Role::new(name).unwrap()
    }

    fn walk(ctx: &Context, tags: &[&str]) {
        for tag in tags {
            cmd_transition(ctx, "ENS-0001", tag, &role("coordinador"), None).unwrap();
        }
    }

    #[test]
    fn create_requires_open_project() {
        let (_dir, ctx) = setup();
        let err = cmd_create(&ctx, "ENS-0002", "PRY-404", "M-2", "ASTM", false).unwrap_err();
        assert!(err.to_string().contains("project not found"));
    }

    #[test]
    fn tecnico_denied_at_review_gate() {
        let (_dir, ctx) = setup();
        walk(&ctx, &["E2", "E6", "E8", "E9"]);
        let err = cmd_transition(&ctx, "ENS-0001", "E10", &role("tecnico"), None).unwrap_err();
        assert!(err.to_string().contains("may not move assay to E10"));
        cmd_transition(&ctx, "ENS-0001", "e10", &role("coordinador"), None).unwrap();
        assert_eq!(load(&ctx, "ENS-0001").unwrap().state, WorkflowState::E10);
    }

    #[test]
    fn novelty_and_recovery() {
        let (_dir, ctx) = setup();
        walk(&ctx, &["E2", "E6"]);
        cmd_novelty(&ctx, "ENS-0001", &role("tecnico"), "equipo descalibrado").unwrap();
        let assay = load(&ctx, "ENS-0001").unwrap();
        assert_eq!(assay.state, WorkflowState::E5);
        assert_eq!(
            assay.transitions.last().and_then(|t| t.reason.as_deref()),
            Some("equipo descalibrado")
        );
        cmd_transition(&ctx, "ENS-0001", "E2", &role("tecnico"), None).unwrap();
        assert_eq!(cmd_status(&ctx, "ENS-0001", Some(&role("tecnico"))).unwrap(), 0);
    }

    #[test]
    fn transition_reason_and_code_case() {
        let (_dir, ctx) = setup();
        let note = Some("Turno de mañana");
        cmd_transition(&ctx, "ens-0001", "E2", &role("tecnico"), note).unwrap();
        let assay = load(&ctx, "ENS-0001").unwrap();
        assert_eq!(assay.state, WorkflowState::E2);
        assert_eq!(
            assay.transitions.last().and_then(|t| t.reason.as_deref()),
            Some("Turno de mañana")
        );
    }

    #[test]
    fn reassign_needs_capability() {
        let (_dir, ctx) = setup();
        assert!(cmd_reassign(&ctx, "ENS-0001", &role("tecnico"), "Luis").is_err());
        cmd_reassign(&ctx, "ENS-0001", &role("admin"), "Luis").unwrap();
        assert_eq!(
            load(&ctx, "ENS-0001").unwrap().technician.as_deref(),
            Some("Luis")
        );
    }

    #[test]
    fn list_by_project() {
        let (_dir, ctx) = setup();
        assert_eq!(cmd_list(&ctx, Some("PRY-001")).unwrap(), 0);
        assert!(cmd_list(&ctx, Some("PRY-404")).is_err());
        assert_eq!(cmd_list(&ctx, None).unwrap(), 0);
    }
}
