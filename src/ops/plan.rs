//! Filesystem mutation plans.
//!
//! `install`, `uninstall` and `clean` first compute every filesystem action
//! they would take, then either report the plan (the default) or perform
//! it when `--force` is given. The plan is identical in both cases.

use std::fmt;
use std::path::PathBuf;

use anyhow::{bail, Result};

use crate::util::diagnostic::suggestions;
use crate::util::fs::{copy_file, remove_dir_all_if_exists, remove_file_if_exists};
use crate::util::shell::{Shell, Status};

/// A single filesystem action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FsAction {
    /// Copy a file, creating parent directories of the destination.
    Copy { from: PathBuf, to: PathBuf },
    /// Remove a file.
    RemoveFile(PathBuf),
    /// Remove a directory and everything below it.
    RemoveDir(PathBuf),
}

impl fmt::Display for FsAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FsAction::Copy { from, to } => write!(f, "copy {} -> {}", from.display(), to.display()),
            FsAction::RemoveFile(path) => write!(f, "remove {}", path.display()),
            FsAction::RemoveDir(path) => write!(f, "remove directory {}", path.display()),
        }
    }
}

/// An ordered list of filesystem actions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MutationPlan {
    actions: Vec<FsAction>,
}

/// What executing a plan did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Applied {
    /// Actions that changed the filesystem
    pub performed: usize,
    /// Removals whose target was already gone
    pub skipped: usize,
    /// Whether this was a dry run
    pub dry_run: bool,
}

impl MutationPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, action: FsAction) {
        self.actions.push(action);
    }

    pub fn actions(&self) -> &[FsAction] {
        &self.actions
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Report the plan, or perform it if `force` is set.
    pub fn execute(&self, force: bool, shell: &Shell) -> Result<Applied> {
        if self.actions.is_empty() {
            shell.note("nothing to do");
            return Ok(Applied {
                dry_run: !force,
                ..Applied::default()
            });
        }

        if !force {
            for action in &self.actions {
                shell.status(Status::Would, action);
            }
            shell.note(suggestions::DRY_RUN);
            return Ok(Applied {
                dry_run: true,
                ..Applied::default()
            });
        }

        let mut applied = Applied::default();
        for action in &self.actions {
            if apply(action)? {
                applied.performed += 1;
                match action {
                    FsAction::Copy { to, .. } => shell.status(Status::Copied, to.display()),
                    FsAction::RemoveFile(path) | FsAction::RemoveDir(path) => {
                        shell.status(Status::Removed, path.display())
                    }
                }
            } else {
                applied.skipped += 1;
                if shell.is_verbose() {
                    shell.status(Status::Skipped, format!("{} (already gone)", action));
                }
            }
        }

        Ok(applied)
    }
}

impl FromIterator<FsAction> for MutationPlan {
    fn from_iter<I: IntoIterator<Item = FsAction>>(iter: I) -> Self {
        MutationPlan {
            actions: iter.into_iter().collect(),
        }
    }
}

/// Perform one action. Returns false if there was nothing to remove.
fn apply(action: &FsAction) -> Result<bool> {
    match action {
        FsAction::Copy { from, to } => {
            if !from.exists() {
                bail!(
                    "cannot copy {}: file does not exist\n{}",
                    from.display(),
                    suggestions::BUILD_FIRST
                );
            }
            copy_file(from, to)?;
            Ok(true)
        }
        FsAction::RemoveFile(path) => remove_file_if_exists(path),
        FsAction::RemoveDir(path) => remove_dir_all_if_exists(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::shell::{ColorChoice, Verbosity};
    use std::fs;
    use tempfile::TempDir;

    fn shell() -> Shell {
        Shell::new(Verbosity::Normal, ColorChoice::Never)
    }

    fn plan(tmp: &TempDir) -> MutationPlan {
        [
            FsAction::Copy {
                from: tmp.path().join("src/app"),
                to: tmp.path().join("prefix/bin/app"),
            },
            FsAction::RemoveFile(tmp.path().join("stale.o")),
            FsAction::RemoveDir(tmp.path().join("obj")),
        ]
        .into_iter()
        .collect()
    }

    fn setup(tmp: &TempDir) {
        fs::create_dir_all(tmp.path().join("src")).unwrap();
        fs::write(tmp.path().join("src/app"), "binary").unwrap();
        fs::write(tmp.path().join("stale.o"), "obj").unwrap();
        fs::create_dir_all(tmp.path().join("obj/nested")).unwrap();
    }

    #[test]
    fn test_dry_run_changes_nothing() {
        let tmp = TempDir::new().unwrap();
        setup(&tmp);
        let plan = plan(&tmp);

        for _ in 0..3 {
            let applied = plan.execute(false, &shell()).unwrap();
            assert!(applied.dry_run);
            assert_eq!(applied.performed, 0);
        }

        assert!(!tmp.path().join("prefix").exists());
        assert!(tmp.path().join("stale.o").exists());
        assert!(tmp.path().join("obj/nested").exists());
    }

    #[test]
    fn test_force_applies_plan_and_repeats_safely() {
        let tmp = TempDir::new().unwrap();
        setup(&tmp);
        let plan = plan(&tmp);

        let applied = plan.execute(true, &shell()).unwrap();
        assert_eq!(applied.performed, 3);
        assert_eq!(fs::read_to_string(tmp.path().join("prefix/bin/app")).unwrap(), "binary");
        assert!(!tmp.path().join("stale.o").exists());
        assert!(!tmp.path().join("obj").exists());

        let again = plan.execute(true, &shell()).unwrap();
        assert_eq!(again.performed, 1);
        assert_eq!(again.skipped, 2);
    }

    #[test]
    fn test_copy_of_missing_source_fails() {
        let tmp = TempDir::new().unwrap();
        let plan: MutationPlan = std::iter::once(FsAction::Copy {
            from: tmp.path().join("missing"),
            to: tmp.path().join("dest"),
        })
        .collect();

        assert!(plan.execute(false, &shell()).is_ok());
        let err = plan.execute(true, &shell()).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn test_action_display() {
        let action = FsAction::RemoveDir(PathBuf::from("/tmp/build"));
        assert_eq!(action.to_string(), "remove directory /tmp/build");
        assert!(MutationPlan::new().is_empty());
    }
}
