//! # Inspection Subcommands
//!
//! Read-only queries against the registries and the authorizer. Nothing
//! here touches the store.

use anyhow::Result;
use clap::{Args, ValueEnum};

use labflow_core::Role;
use labflow_state::{Lifecycle, StateRegistry};

use crate::context::Context;
use crate::EXIT_DENIED;

/// Lifecycle kind selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Kind {
    /// Project lifecycle (activo, pausado, completado, cancelado).
    Project,
    /// Assay workflow (E1..E15).
    Assay,
}

/// Arguments for `labflow states`.
#[derive(Args, Debug)]
pub struct StatesArgs {
    /// Lifecycle kind.
    #[arg(long, value_enum)]
    pub kind: Kind,

    /// Emit JSON instead of a table.
    #[arg(long)]
    pub json: bool,
}

/// Arguments for `labflow transitions`.
#[derive(Args, Debug)]
pub struct TransitionsArgs {
    /// Lifecycle kind.
    #[arg(long, value_enum)]
    pub kind: Kind,

    /// Current state tag.
    #[arg(long)]
    pub from: String,

    /// Only list targets this role may take.
    #[arg(long)]
    pub role: Option<Role>,
}

/// Arguments for `labflow check`.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Lifecycle kind.
    #[arg(long, value_enum)]
    pub kind: Kind,

    /// Current state tag.
    #[arg(long)]
    pub from: String,

    /// Requested target tag.
    #[arg(long)]
    pub to: String,

    /// Acting role.
    #[arg(long)]
    pub role: Role,
}

/// Arguments for `labflow capabilities`.
#[derive(Args, Debug)]
pub struct CapabilitiesArgs {
    /// Role to describe.
    #[arg(long)]
    pub role: Role,
}

/// Execute `labflow states`.
pub fn run_states(args: &StatesArgs, ctx: &Context) -> Result<u8> {
    match args.kind {
        Kind::Project => print_states(&ctx.projects, args.json),
        Kind::Assay => print_states(&ctx.assays, args.json),
    }
}

/// Execute `labflow transitions`.
pub fn run_transitions(args: &TransitionsArgs, ctx: &Context) -> Result<u8> {
    let targets = match args.kind {
        Kind::Project => targets(&ctx.projects, ctx, &args.from, args.role.as_ref())?,
        Kind::Assay => targets(&ctx.assays, ctx, &args.from, args.role.as_ref())?,
    };
    if targets.is_empty() {
        println!("No transitions from {}.", args.from);
    } else {
        for (tag, label) in targets {
            println!("  {tag}: {label}");
        }
    }
    Ok(0)
}

/// Execute `labflow check`. Prints `ALLOWED` (exit 0) or `DENIED`.
pub fn run_check(args: &CheckArgs, ctx: &Context) -> Result<u8> {
    let allowed = match args.kind {
        Kind::Project => decide(&ctx.projects, ctx, args)?,
        Kind::Assay => decide(&ctx.assays, ctx, args)?,
    };
    if allowed {
        println!("ALLOWED");
        Ok(0)
    } else {
        println!("DENIED");
        Ok(EXIT_DENIED)
    }
}

/// Execute `labflow capabilities`.
pub fn run_capabilities(args: &CapabilitiesArgs, ctx: &Context) -> Result<u8> {
    let caps = ctx.policy.capabilities(&args.role);
    println!("Role: {}", args.role);
    println!("  Client: {}", ctx.policy.is_client(&args.role));
    println!("  Restricted: {}", ctx.authorizer.is_restricted(&args.role));
    if caps.is_empty() {
        println!("  Capabilities: none");
    } else {
        let names: Vec<_> = caps.iter().map(|c| c.as_str()).collect();
        println!("  Capabilities: {}", names.join(", "));
    }
    Ok(0)
}

fn print_states<S: Lifecycle>(registry: &StateRegistry<S>, json: bool) -> Result<u8> {
    if json {
        let rows: Vec<_> = registry
            .states()
            .iter()
            .map(|s| {
                serde_json::json!({
                    "state": s.as_str(),
                    "info": registry.info_of(*s),
                    "transitions": registry.transitions_from(*s),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(0);
    }

    println!("States ({}):", registry.kind());
    for state in registry.states() {
        let info = registry.info_of(*state);
        let targets: Vec<_> = registry
            .transitions_from(*state)
            .iter()
            .map(|t| t.as_str())
            .collect();
        let targets = if targets.is_empty() {
            "(terminal)".to_string()
        } else {
            format!("-> {}", targets.join(", "))
        };
        println!(
            "  {:<11} {:<22} {}  {}",
            state.as_str(),
            info.label,
            info.color,
            targets
        );
    }
    Ok(0)
}

fn targets<S: Lifecycle>(
    registry: &StateRegistry<S>,
    ctx: &Context,
    from: &str,
    role: Option<&Role>,
) -> Result<Vec<(&'static str, &'static str)>> {
    let allowed = registry.transitions_from_tag(from)?;
    let permitted = match role {
        Some(role) => ctx.authorizer.filter_by_role(allowed, role),
        None => allowed.to_vec(),
    };
    Ok(permitted
        .into_iter()
        .map(|s| (s.as_str(), registry.info_of(s).label))
        .collect())
}

fn decide<S: Lifecycle>(
    registry: &StateRegistry<S>,
    ctx: &Context,
    args: &CheckArgs,
) -> Result<bool> {
    let allowed = registry.transitions_from_tag(&args.from)?;
    let to = S::from_tag(&args.to).map_or(args.to.as_str(), |s| s.as_str());
    Ok(ctx
        .authorizer
        .can_perform_transition(&args.from, to, &args.role, allowed))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> (tempfile::TempDir, Context) {
        let dir = tempfile::tempdir().unwrap();
        let ctx = Context::load(None, dir.path()).unwrap();
        (dir, ctx)
    }

    fn check(kind: Kind, from: &str, to: &str, role: &str) -> CheckArgs {
        CheckArgs {
            kind,
            from: from.to_string(),
            to: to.to_string(),
            role: Role::new(role).unwrap(),
        }
    }

    fn exit_of(args: CheckArgs) -> u8 {
        let (_dir, ctx) = ctx();
        run_check(&args, &ctx).unwrap()
    }

    #[test]
    fn check_exit_codes() {
        assert_eq!(exit_of(check(Kind::Assay, "E9", "E10", "tecnico")), EXIT_DENIED);
        assert_eq!(exit_of(check(Kind::Assay, "E9", "E10", "coordinador")), 0);
        assert_eq!(exit_of(check(Kind::Assay, "E9", "E8", "tecnico")), 0);
    }

    #[test]
    fn check_normalizes_target_case() {
        assert_eq!(exit_of(check(Kind::Assay, "e9", "e8", "tecnico")), 0);
    }

    #[test]
    fn check_denies_targets_off_the_graph() {
        assert_eq!(exit_of(check(Kind::Assay, "E1", "E15", "admin")), EXIT_DENIED);
        assert_eq!(exit_of(check(Kind::Assay, "E1", "E20", "admin")), EXIT_DENIED);
        assert_eq!(
            exit_of(check(Kind::Project, "completado", "activo", "admin")),
            EXIT_DENIED
        );
    }

    #[test]
    fn unknown_current_state_is_an_error() {
        let (_dir, ctx) = ctx();
        let args = check(Kind::Project, "archivado", "activo", "admin");
        assert!(run_check(&args, &ctx).is_err());
    }

    #[test]
    fn role_filtered_targets() {
        let (_dir, ctx) = ctx();
        let tecnico = Role::new("tecnico").unwrap();
        let listed = targets(&ctx.assays, &ctx, "E11", Some(&tecnico)).unwrap();
        let tags: Vec<_> = listed.iter().map(|(t, _)| *t).collect();
        assert_eq!(tags, vec!["E10"]);
        let listed = targets(&ctx.assays, &ctx, "E11", None).unwrap();
        assert_eq!(listed.len(), 2);
    }

    #[test]
    fn states_listing_succeeds() {
        let (_dir, ctx) = ctx();
        let args = StatesArgs {
            kind: Kind::Project,
            json: true,
        };
        assert_eq!(run_states(&args, &ctx).unwrap(), 0);
        let args = StatesArgs {
            kind: Kind::Assay,
            json: false,
        };
        assert_eq!(run_states(&args, &ctx).unwrap(), 0);
    }
}
