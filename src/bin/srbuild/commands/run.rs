//! `srbuild run` command

use anyhow::{anyhow, Result};
use clap::ArgMatches;

use srbuild::core::{Project, TargetKind};
use srbuild::ops::{resolve_targets, select_profiles, ProfileDefault};
use srbuild::util::shell::Status;
use srbuild::util::GlobalContext;

use super::{delegate, profile_flags};

pub fn execute(project: &Project, matches: &ArgMatches, ctx: &GlobalContext) -> Result<()> {
    let name = matches
        .get_one::<String>("target")
        .ok_or_else(|| anyhow!("no executable given"))?;

    // Only executables can be run.
    let targets = resolve_targets(
        std::slice::from_ref(name),
        &project.collections(&[TargetKind::Executable]),
    )?;
    let profiles = select_profiles(
        &profile_flags(project, matches),
        &project.profile_names(),
        ProfileDefault::AllDeclared,
    )?;

    for target in targets {
        ctx.shell()
            .status(Status::Running, format!("{} [{}]", target.name, profiles.join(", ")));
        delegate(project.run(target, &profiles))?;
    }
    Ok(())
}
