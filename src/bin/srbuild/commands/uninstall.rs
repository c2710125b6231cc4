//! `srbuild uninstall` command

use anyhow::Result;
use clap::ArgMatches;

use srbuild::core::Project;
use srbuild::ops::{select_install, select_profiles, uninstall_plan, ProfileDefault};
use srbuild::util::GlobalContext;

use super::{install_dirs, profile_flags, report_skipped, target_names};

pub fn execute(project: &Project, matches: &ArgMatches, ctx: &GlobalContext) -> Result<()> {
    let selection = select_install(project, &target_names(matches))?;
    report_skipped(&selection, ctx);
    let profiles = select_profiles(
        &profile_flags(project, matches),
        &project.profile_names(),
        ProfileDefault::install(),
    )?;
    let dirs = install_dirs(matches, ctx);

    let plan = uninstall_plan(&selection, &profiles, &dirs);
    plan.execute(matches.get_flag("force"), ctx.shell())?;
    Ok(())
}
