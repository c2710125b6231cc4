//! `srbuild clean` command

use std::path::Path;

use anyhow::Result;
use clap::ArgMatches;

use srbuild::core::Project;
use srbuild::ops::{clean_plan, nuke_plan, select_profiles, ProfileDefault};
use srbuild::util::GlobalContext;

use super::profile_flags;

/// Returns true when the project file was removed and the loaded project
/// must not be used any more.
pub fn execute(project: &Project, project_file: &Path, matches: &ArgMatches, ctx: &GlobalContext) -> Result<bool> {
    let force = matches.get_flag("force");
    let nuke = matches.get_flag("nuke");

    let plan = if nuke {
        nuke_plan(project.build_dir(), project_file)
    } else {
        let profiles = select_profiles(
            &profile_flags(project, matches),
            &project.profile_names(),
            ProfileDefault::AllDeclared,
        )?;
        clean_plan(project.all_targets(), &profiles)
    };

    let applied = plan.execute(force, ctx.shell())?;
    tracing::debug!(
        "clean: {} removed, {} already gone",
        applied.performed,
        applied.skipped
    );

    Ok(nuke && force)
}
