//! # Project Subcommand
//!
//! Project lifecycle against the local store: create, update, transition,
//! status, list. Projects are addressed by code.

use anyhow::{bail, Context as _, Result};
use chrono::{NaiveDate, Utc};
use clap::{Args, Subcommand};

use labflow_core::Role;
use labflow_service::Record;
use labflow_state::{Lifecycle, Project, ProjectUpdate};

use crate::context::Context;

/// Arguments for the `labflow project` subcommand.
#[derive(Args, Debug)]
pub struct ProjectArgs {
    #[command(subcommand)]
    pub command: ProjectCommand,
}

/// Project subcommands.
#[derive(Subcommand, Debug)]
pub enum ProjectCommand {
    /// Create a project in `activo`.
    Create {
        /// Project code (e.g. "PRY-001").
        #[arg(long)]
        code: String,
        /// Project name.
        #[arg(long)]
        name: String,
        /// Client identifier.
        #[arg(long)]
        client: String,
        /// Start date (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        start: Option<NaiveDate>,
    },

    /// Edit project metadata. Refused once the project is finalized.
    Update {
        /// Project code.
        #[arg(long)]
        code: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        location: Option<String>,
    },

    /// Move a project to another state.
    Transition {
        /// Project code.
        #[arg(long)]
        code: String,
        /// Target state tag.
        #[arg(long)]
        to: String,
        /// Acting role.
        #[arg(long)]
        role: Role,
        /// Note kept on the transition log.
        #[arg(long)]
        reason: Option<String>,
    },

    /// Show a project and the transitions available to a role.
    Status {
        /// Project code.
        #[arg(long)]
        code: String,
        /// Role to list available transitions for.
        #[arg(long)]
        role: Option<Role>,
    },

    /// List all projects.
    List,
}

/// Execute the project subcommand.
pub fn run_project(args: &ProjectArgs, ctx: &Context) -> Result<u8> {
    match &args.command {
        ProjectCommand::Create {
            code,
            name,
            client,
            start,
        } => cmd_create(ctx, code, name, client, *start),
        ProjectCommand::Update {
            code,
            name,
            description,
            location,
        } => cmd_update(
            ctx,
            code,
            ProjectUpdate {
                name: name.clone(),
                description: description.clone(),
                location: location.clone(),
            },
        ),
        ProjectCommand::Transition {
            code,
            to,
            role,
            reason,
        } => cmd_transition(ctx, code, to, role, reason.as_deref()),
        ProjectCommand::Status { code, role } => cmd_status(ctx, code, role.as_ref()),
        ProjectCommand::List => cmd_list(ctx),
    }
}

fn load(ctx: &Context, code: &str) -> Result<Project> {
    match ctx.project_service().repository().find_by_code(code)? {
        Some(project) => Ok(project),
        None => bail!("project not found: {code}"),
    }
}

fn cmd_create(
    ctx: &Context,
    code: &str,
    name: &str,
    client: &str,
    start: Option<NaiveDate>,
) -> Result<u8> {
    let start = start.unwrap_or_else(|| Utc::now().date_naive());
    let project = Project::new(code, name, client, start).context("invalid project")?;
    let project = ctx.project_service().create(project)?;
    println!(
        "OK: created project {} in {} state",
        project.code, project.state
    );
    Ok(0)
}

fn cmd_update(ctx: &Context, code: &str, update: ProjectUpdate) -> Result<u8> {
    let mut project = load(ctx, code)?;
    project.update(update)?;
    ctx.project_service().save(project)?;
    println!("OK: updated project {code}");
    Ok(0)
}

fn cmd_transition(
    ctx: &Context,
    code: &str,
    to: &str,
    role: &Role,
    reason: Option<&str>,
) -> Result<u8> {
    let target = ctx.projects.parse(to)?;
    let project = load(ctx, code)?;
    let from = project.state;
    let project = ctx
        .project_service()
        .change_state(project.record_id(), target, role, reason.map(str::to_string))?;
    println!("OK: project {code} transitioned {from} → {}", project.state);
    Ok(0)
}

fn cmd_status(ctx: &Context, code: &str, role: Option<&Role>) -> Result<u8> {
    let project = load(ctx, code)?;
    let info = ctx.projects.info_of(project.state);

    println!("Project: {}", project.code);
    println!("  Name: {}", project.name);
    println!("  Client: {}", project.client_id);
    println!("  State: {} ({})", project.state, info.label);
    if let Some(description) = &project.description {
        println!("  Description: {description}");
    }
    if let Some(location) = &project.location {
        println!("  Location: {location}");
    }
    println!("  Start: {}", project.start_date);
    if let Some(end) = project.end_date {
        println!("  End: {end}");
    }
    println!(
        "  Duration: {} days",
        project.duration_days(Utc::now().date_naive())
    );
    println!("  Transitions: {}", project.transitions.len());
    for (i, t) in project.transitions.iter().enumerate() {
        let actor = t.actor.as_ref().map_or("-", |r| r.as_str());
        let reason = t.reason.as_deref().map(|r| format!(" ({r})")).unwrap_or_default();
        println!(
            "    [{i}] {} → {} at {} by {actor}{reason}",
            t.from_state, t.to_state, t.timestamp
        );
    }

    if let Some(role) = role {
        let available = ctx
            .project_service()
            .available_transitions(project.record_id(), role)?;
        let tags: Vec<_> = available.iter().map(|a| a.state.as_str()).collect();
        if tags.is_empty() {
            println!("  Available to {role}: none");
        } else {
            println!("  Available to {role}: {}", tags.join(", "));
        }
    }
    Ok(0)
}

fn cmd_list(ctx: &Context) -> Result<u8> {
    let projects = ctx.project_service().list()?;
    if projects.is_empty() {
        println!("No projects found.");
        return Ok(0);
    }
    println!("Projects ({}):", projects.len());
    for p in &projects {
        println!("  {}: {} [{}]", p.code, p.name, p.state);
    }
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use labflow_state::ProjectState;

    fn setup() -> (tempfile::TempDir, Context) {
        let dir = tempfile::tempdir().unwrap();
        let ctx = Context::load(None, dir.path()).unwrap();
        (dir, ctx)
    }

    fn role(name: &str) -> Role {
        Role::new(name).unwrap()
    }

    fn create(ctx: &Context, code: &str) {
        let start = NaiveDate::from_ymd_opt(2026, 4, 1);
        cmd_create(ctx, code, "Estudio de suelos", "cli-1", start).unwrap();
    }

    #[test]
    fn create_and_status() {
        let (_dir, ctx) = setup();
        create(&ctx, "PRY-001");
        assert_eq!(cmd_status(&ctx, "PRY-001", Some(&role("tecnico"))).unwrap(), 0);
        let stored = load(&ctx, "PRY-001").unwrap();
        assert_eq!(stored.state, ProjectState::Activo);
    }

    #[test]
    fn create_duplicate_rejected() {
        let (_dir, ctx) = setup();
        create(&ctx, "PRY-001");
        let err = cmd_create(&ctx, "PRY-001", "Otro", "cli-2", None).unwrap_err();
        assert!(err.to_string().contains("already exists"));
    }

    #[test]
    fn transition_pause_reactivate_complete() {
        let (dir, ctx) = setup();
        create(&ctx, "PRY-001");
        cmd_transition(&ctx, "PRY-001", "pausado", &role("coordinador"), None).unwrap();
        cmd_transition(&ctx, "PRY-001", "activo", &role("coordinador"), None).unwrap();
        cmd_transition(&ctx, "PRY-001", "completado", &role("admin"), None).unwrap();

        let stored = load(&ctx, "PRY-001").unwrap();
        assert_eq!(stored.state, ProjectState::Completado);
        assert_eq!(stored.transitions.len(), 3);
        assert!(stored.end_date.is_some());
        assert!(dir.path().join("projects").join("PRY-001.json").exists());
    }

    #[test]
    fn lowercase_code_addresses_the_same_project() {
        let (dir, ctx) = setup();
        create(&ctx, "pry-002");
        assert!(dir.path().join("projects").join("PRY-002.json").exists());
        cmd_transition(
            &ctx,
            "Pry-002",
            "pausado",
            &role("coordinador"),
            Some("Lluvias en obra"),
        )
        .unwrap();

        let stored = load(&ctx, "PRY-002").unwrap();
        assert_eq!(stored.code, "PRY-002");
        assert_eq!(stored.state, ProjectState::Pausado);
        assert_eq!(stored.transitions[0].reason.as_deref(), Some("Lluvias en obra"));
        let err = cmd_create(&ctx, "PRY-002", "Otro", "cli-2", None).unwrap_err();
        assert!(err.to_string().contains("already exists"));
    }

    #[test]
    fn invalid_transition_reports_valid_targets() {
        let (_dir, ctx) = setup();
        create(&ctx, "PRY-001");
        cmd_transition(&ctx, "PRY-001", "cancelado", &role("admin"), None).unwrap();
        let err = cmd_transition(&ctx, "PRY-001", "activo", &role("admin"), None).unwrap_err();
        assert!(err.to_string().contains("valid transitions: none"));
    }

    #[test]
    fn unknown_target_tag_rejected() {
        let (_dir, ctx) = setup();
        create(&ctx, "PRY-001");
        let err = cmd_transition(&ctx, "PRY-001", "archivado", &role("admin"), None).unwrap_err();
        assert!(err.to_string().contains("unknown project state"));
    }

    #[test]
    fn update_refused_after_completion() {
        let (_dir, ctx) = setup();
        create(&ctx, "PRY-001");
        let update = ProjectUpdate {
            location: Some("Km 12".to_string()),
            ..ProjectUpdate::default()
        };
        cmd_update(&ctx, "PRY-001", update.clone()).unwrap();
        assert_eq!(load(&ctx, "PRY-001").unwrap().location.as_deref(), Some("Km 12"));

        cmd_transition(&ctx, "PRY-001", "completado", &role("admin"), None).unwrap();
        assert!(cmd_update(&ctx, "PRY-001", update).is_err());
    }

    #[test]
    fn missing_project() {
        let (_dir, ctx) = setup();
        let err = cmd_status(&ctx, "PRY-404", None).unwrap_err();
        assert!(err.to_string().contains("project not found"));
        assert_eq!(cmd_list(&ctx).unwrap(), 0);
    }
}
