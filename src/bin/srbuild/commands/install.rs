//! `srbuild install` command

use anyhow::Result;
use clap::ArgMatches;

use srbuild::core::Project;
use srbuild::ops::{install_plan, select_install, select_profiles, ProfileDefault};
use srbuild::util::shell::Status;
use srbuild::util::GlobalContext;

use super::{delegate, describe, install_dirs, profile_flags, report_skipped, target_names};

pub fn execute(project: &Project, matches: &ArgMatches, ctx: &GlobalContext) -> Result<()> {
    let selection = select_install(project, &target_names(matches))?;
    report_skipped(&selection, ctx);
    let profiles = select_profiles(
        &profile_flags(project, matches),
        &project.profile_names(),
        ProfileDefault::install(),
    )?;
    let dirs = install_dirs(matches, ctx);
    let force = matches.get_flag("force");

    tracing::debug!(
        "installing {} and {} header(s) for [{}]",
        describe(&selection.targets),
        selection.headers.len(),
        profiles.join(", ")
    );

    // Artifacts are only brought up to date when they will really be copied.
    if force && !selection.targets.is_empty() {
        ctx.shell().status(
            Status::Building,
            format!("{} [{}]", describe(&selection.targets), profiles.join(", ")),
        );
        delegate(project.build(&selection.targets, &profiles))?;
    }

    let plan = install_plan(&selection, &profiles, &dirs);
    plan.execute(force, ctx.shell())?;
    Ok(())
}
