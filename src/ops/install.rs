//! Install, uninstall and clean planning.
//!
//! These functions only compute a [`MutationPlan`]; whether it is applied
//! is decided by the caller's `--force` flag.

use std::path::{Path, PathBuf};

use crate::core::{Project, Target, TargetKind};
use crate::ops::plan::{FsAction, MutationPlan};
use crate::ops::resolve::{resolve_targets, ResolveError};

/// Destination directories for installation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallDirs {
    pub headers: PathBuf,
    pub libraries: PathBuf,
    pub executables: PathBuf,
}

impl InstallDirs {
    /// Directory artifacts of `kind` are installed into.
    pub fn for_kind(&self, kind: TargetKind) -> Option<&Path> {
        match kind {
            TargetKind::Library => Some(self.libraries.as_path()),
            TargetKind::Executable => Some(self.executables.as_path()),
            TargetKind::Test => None,
        }
    }
}

/// Targets and headers selected for install or uninstall.
#[derive(Debug)]
pub struct InstallSelection<'a> {
    pub targets: Vec<&'a Target>,
    pub headers: Vec<&'a Path>,
    /// Internal targets that were named but are never installed
    pub skipped: Vec<&'a Target>,
}

/// Split install arguments into target names and public headers.
///
/// A name that is not a library or executable but matches a public header,
/// either by path or by file name, selects that header. Anything else is
/// kept as a target name so resolution can report it.
pub fn split_install_names<'a>(project: &'a Project, names: &[String]) -> (Vec<String>, Vec<&'a Path>) {
    let mut target_names = Vec::new();
    let mut headers = Vec::new();

    for name in names {
        if project.contains(name) {
            target_names.push(name.clone());
            continue;
        }

        let matched: Vec<&Path> = project
            .public_headers()
            .iter()
            .filter(|h| header_matches(h, name))
            .map(PathBuf::as_path)
            .collect();

        if matched.is_empty() {
            target_names.push(name.clone());
        } else {
            headers.extend(matched);
        }
    }

    if headers.is_empty() {
        headers = project.public_headers().iter().map(PathBuf::as_path).collect();
    }

    (target_names, headers)
}

fn header_matches(header: &Path, name: &str) -> bool {
    header.ends_with(name) || header.file_name().is_some_and(|f| f == name)
}

/// Resolve what `install`/`uninstall` should act on.
///
/// Only libraries and executables are considered. Internal targets are
/// dropped; those that were named explicitly are reported in `skipped`.
pub fn select_install<'a>(project: &'a Project, names: &[String]) -> Result<InstallSelection<'a>, ResolveError> {
    let (target_names, headers) = split_install_names(project, names);
    let kinds: Vec<TargetKind> = TargetKind::ALL
        .into_iter()
        .filter(TargetKind::is_installable)
        .collect();
    let collections = project.collections(&kinds);
    let resolved = resolve_targets(&target_names, &collections)?;

    let (internal, targets): (Vec<&Target>, Vec<&Target>) =
        resolved.into_iter().partition(|target| target.internal);
    let skipped = if target_names.is_empty() { Vec::new() } else { internal };

    Ok(InstallSelection {
        targets,
        headers,
        skipped,
    })
}

fn destination(dir: &Path, source: &Path) -> Option<PathBuf> {
    source.file_name().map(|name| dir.join(name))
}

/// Copy each selected artifact and header to its installation directory.
pub fn install_plan(selection: &InstallSelection<'_>, profiles: &[String], dirs: &InstallDirs) -> MutationPlan {
    let mut plan = MutationPlan::new();

    for target in &selection.targets {
        let Some(dir) = dirs.for_kind(target.kind()) else {
            continue;
        };
        for profile in profiles {
            let Some(artifact) = target.artifact(profile) else {
                tracing::debug!("{} has no artifact for profile {}", target, profile);
                continue;
            };
            if let Some(to) = destination(dir, artifact) {
                plan.push(FsAction::Copy {
                    from: artifact.to_path_buf(),
                    to,
                });
            }
        }
    }

    for header in &selection.headers {
        if let Some(to) = destination(&dirs.headers, header) {
            plan.push(FsAction::Copy {
                from: header.to_path_buf(),
                to,
            });
        }
    }

    plan
}

/// Remove every installed destination that currently exists.
pub fn uninstall_plan(selection: &InstallSelection<'_>, profiles: &[String], dirs: &InstallDirs) -> MutationPlan {
    install_plan(selection, profiles, dirs)
        .actions()
        .iter()
        .filter_map(|action| match action {
            FsAction::Copy { to, .. } if to.exists() => Some(FsAction::RemoveFile(to.clone())),
            _ => None,
        })
        .collect()
}

/// Remove existing artifacts of every target for the given profiles.
pub fn clean_plan<'a>(targets: impl IntoIterator<Item = &'a Target>, profiles: &[String]) -> MutationPlan {
    let mut plan = MutationPlan::new();
    for target in targets {
        for profile in profiles {
            if let Some(artifact) = target.artifact(profile).filter(|p| p.exists()) {
                plan.push(FsAction::RemoveFile(artifact.to_path_buf()));
            }
        }
    }
    plan
}

/// Remove the whole build directory and the project file.
pub fn nuke_plan(build_dir: &Path, project_file: &Path) -> MutationPlan {
    let mut plan = MutationPlan::new();
    plan.push(FsAction::RemoveDir(build_dir.to_path_buf()));
    plan.push(FsAction::RemoveFile(project_file.to_path_buf()));
    plan
}
