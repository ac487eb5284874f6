//! Command-line definition and dispatch

use crate::render;
use anyhow::{bail, Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use roadmap_core::{
    ActionPatch, Proposal, RoadmapConfig, RoadmapError, RoadmapService, StoreError,
    CONFIG_FILE_NAME,
};
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

/// Exit code for a corrupt document
pub const EXIT_CORRUPT: u8 = 2;
/// Exit code for lock contention; retrying later may succeed
pub const EXIT_BUSY: u8 = 75;

/// Build the `roadmapctl` command
pub fn build_cli() -> Command {
    Command::new("roadmapctl")
        .version(roadmap_core::VERSION)
        .about("Inspect and maintain a project roadmap")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("dir")
                .long("dir")
                .global(true)
                .default_value(".")
                .value_parser(value_parser!(PathBuf))
                .help("Project directory holding the roadmap"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help(format!("Config file (default: <dir>/{CONFIG_FILE_NAME} if present)")),
        )
        .subcommand(
            Command::new("show").about("Print the current roadmap").arg(
                Arg::new("json")
                    .long("json")
                    .action(ArgAction::SetTrue)
                    .help("Output as JSON"),
            ),
        )
        .subcommand(Command::new("check").about("Decode and validate the roadmap file"))
        .subcommand(
            Command::new("merge")
                .about("Create the roadmap or merge a proposal into it")
                .arg(
                    Arg::new("file")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("YAML or JSON proposal"),
                ),
        )
        .subcommand(
            Command::new("update")
                .about("Change one action's status and/or description")
                .arg(Arg::new("number").required(true).help("Action number, e.g. 1.01"))
                .arg(Arg::new("status").long("status").help("New status"))
                .arg(Arg::new("description").long("description").help("New description")),
        )
        .subcommand(Command::new("archive").about("Archive the current roadmap"))
        .subcommand(Command::new("archives").about("List archived roadmaps, oldest first"))
        .subcommand(
            Command::new("clean-temps")
                .about("Remove temp files left behind by crashed writers")
                .arg(
                    Arg::new("older-than-secs")
                        .long("older-than-secs")
                        .default_value("300")
                        .value_parser(value_parser!(u64))
                        .help("Only remove temp files at least this old"),
                ),
        )
}

fn open_service(matches: &ArgMatches) -> Result<RoadmapService> {
    let dir = matches
        .get_one::<PathBuf>("dir")
        .cloned()
        .unwrap_or_else(|| PathBuf::from("."));

    let service = match matches.get_one::<PathBuf>("config") {
        Some(path) => {
            let config = RoadmapConfig::load(path)?;
            RoadmapService::open(dir, config)?
        }
        None => RoadmapService::discover(dir)?,
    };
    Ok(service)
}

/// Run a parsed command line, writing results to `out`
///
/// # Errors
/// Any service failure; use [`exit_code`] to map it for the process
pub fn run(matches: &ArgMatches, out: &mut impl Write) -> Result<()> {
    let service = open_service(matches)?;
    tracing::debug!(
        command = matches.subcommand_name().unwrap_or_default(),
        dir = %service.dir().display(),
        "running command"
    );

    match matches.subcommand() {
        Some(("show", args)) => {
            let Some(document) = service.get()? else {
                bail!(RoadmapError::NoRoadmap {
                    path: service.store().document_path(),
                });
            };
            if args.get_flag("json") {
                writeln!(out, "{}", serde_json::to_string_pretty(&document)?)?;
            } else {
                write!(out, "{}", render::document(&document))?;
            }
        }
        Some(("check", _)) => match service.get()? {
            Some(document) => writeln!(
                out,
                "ok: {} features, {} actions, {} incomplete",
                document.roadmap.features.len(),
                document.roadmap.action_count(),
                document
                    .roadmap
                    .actions()
                    .filter(|a| a.status.is_incomplete())
                    .count()
            )?,
            None => writeln!(out, "no roadmap in {}", service.dir().display())?,
        },
        Some(("merge", args)) => {
            let Some(path) = args.get_one::<PathBuf>("file") else {
                bail!("missing proposal file");
            };
            let text = fs::read_to_string(path)
                .with_context(|| format!("cannot read {}", path.display()))?;
            let proposal: Proposal = serde_yaml::from_str(&text)
                .with_context(|| format!("invalid proposal {}", path.display()))?;

            let outcome = service.create_or_merge(proposal)?;
            writeln!(out, "{}", render::merge_report(&outcome))?;
        }
        Some(("update", args)) => {
            let number = args.get_one::<String>("number").map_or("", String::as_str);
            let mut patch = ActionPatch::new();
            if let Some(status) = args.get_one::<String>("status") {
                patch = patch.with_status(status.as_str());
            }
            if let Some(description) = args.get_one::<String>("description") {
                patch = patch.with_description(description.as_str());
            }

            let outcome = service.update_action(number, &patch)?;
            writeln!(
                out,
                "{}: {} -> {}",
                outcome.action.number, outcome.previous_status, outcome.action.status
            )?;
            if outcome.archived {
                writeln!(out, "all actions done, roadmap archived")?;
            }
        }
        Some(("archive", _)) => {
            let archived = service.archive()?;
            writeln!(out, "archived to {}", archived.display())?;
        }
        Some(("archives", _)) => {
            for path in service.archives()? {
                writeln!(out, "{}", path.display())?;
            }
        }
        Some(("clean-temps", args)) => {
            let secs = args.get_one::<u64>("older-than-secs").copied().unwrap_or(300);
            let removed = service.store().clean_stale_temps(Duration::from_secs(secs))?;
            writeln!(out, "removed {removed} temp files")?;
        }
        Some((other, _)) => bail!("unknown command: {other}"),
        None => bail!("no command given"),
    }
    Ok(())
}

/// Process exit code for a failed run
pub fn exit_code(err: &anyhow::Error) -> u8 {
    let store_error = err
        .downcast_ref::<RoadmapError>()
        .and_then(|e| match e {
            RoadmapError::Store(e) => Some(e),
            _ => None,
        })
        .or_else(|| err.downcast_ref::<StoreError>());

    match store_error {
        Some(e) if e.is_retryable() => EXIT_BUSY,
        Some(e) if e.is_corruption() => EXIT_CORRUPT,
        _ => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roadmap_core::LockError;
    use std::path::Path;

    #[test]
    fn command_definition_is_consistent() {
        build_cli().debug_assert();
    }

    #[test]
    fn globals_after_subcommand() {
        let matches = build_cli()
            .try_get_matches_from(["roadmapctl", "show", "--json", "--dir", "/tmp/project"])
            .unwrap();
        assert_eq!(
            matches.get_one::<PathBuf>("dir").map(PathBuf::as_path),
            Some(Path::new("/tmp/project"))
        );
        let (name, args) = matches.subcommand().unwrap();
        assert_eq!(name, "show");
        assert!(args.get_flag("json"));
    }

    #[test]
    fn subcommand_is_required() {
        assert!(build_cli().try_get_matches_from(["roadmapctl"]).is_err());
    }

    #[test]
    fn exit_codes() {
        let busy: anyhow::Error = RoadmapError::from(StoreError::from(LockError::Timeout {
            path: PathBuf::from("ROADMAP.md.lock"),
            waited: Duration::from_secs(5),
        }))
        .into();
        assert_eq!(exit_code(&busy), EXIT_BUSY);
        assert_eq!(exit_code(&anyhow::anyhow!("other")), 1);
    }
}
