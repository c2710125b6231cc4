//! Command implementations

pub mod build;
pub mod clean;
pub mod configure;
pub mod help;
pub mod install;
pub mod run;
pub mod uninstall;

use std::path::PathBuf;

use anyhow::anyhow;
use clap::ArgMatches;

use srbuild::core::{Project, ProjectError, Target};
use srbuild::ops::{InstallDirs, InstallSelection};
use srbuild::util::diagnostic::suggestions;
use srbuild::util::shell::Status;
use srbuild::util::GlobalContext;

use crate::cli::profile_id;

/// Positional target names, in the order given.
pub fn target_names(matches: &ArgMatches) -> Vec<String> {
    matches
        .get_many::<String>("targets")
        .map(|values| values.cloned().collect())
        .unwrap_or_default()
}

/// Each declared profile paired with whether its flag was given.
pub fn profile_flags(project: &Project, matches: &ArgMatches) -> Vec<(String, bool)> {
    project
        .profile_names()
        .into_iter()
        .map(|name| (name.to_string(), matches.get_flag(&profile_id(name))))
        .collect()
}

/// Installation directories: command-line flags over configuration.
pub fn install_dirs(matches: &ArgMatches, ctx: &GlobalContext) -> InstallDirs {
    let defaults = ctx.install_dirs();
    let dir = |id: &str, default: PathBuf| {
        matches
            .get_one::<PathBuf>(id)
            .map(|path| ctx.resolve_path(path))
            .unwrap_or(default)
    };

    InstallDirs {
        headers: dir("headers", defaults.headers),
        libraries: dir("libraries", defaults.libraries),
        executables: dir("executables", defaults.executables),
    }
}

/// Report internal targets that were named but are left out.
pub fn report_skipped(selection: &InstallSelection<'_>, ctx: &GlobalContext) {
    for target in &selection.skipped {
        ctx.shell().status(
            Status::Skipped,
            format!("`{}`: internal targets are not installed", target.name),
        );
    }
}

/// Short list of target names for status lines.
pub fn describe(targets: &[&Target]) -> String {
    if targets.is_empty() {
        return "no targets".to_string();
    }
    targets
        .iter()
        .map(|t| t.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Convert a collaborator error, pointing at `configure` when the project
/// itself is not in a usable state.
pub fn delegate<T>(result: Result<T, ProjectError>) -> anyhow::Result<T> {
    result.map_err(|e| {
        if e.is_project_state() {
            anyhow!("{}\n{}", e, suggestions::NOT_CONFIGURED)
        } else {
            e.into()
        }
    })
}
