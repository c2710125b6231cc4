//! `srbuild build` command

use std::time::Instant;

use anyhow::Result;
use clap::ArgMatches;

use srbuild::core::Project;
use srbuild::ops::{resolve_targets, select_profiles, ProfileDefault};
use srbuild::util::shell::{format_duration, Status};
use srbuild::util::GlobalContext;

use super::{delegate, describe, profile_flags, target_names};

pub fn execute(project: &Project, matches: &ArgMatches, ctx: &GlobalContext) -> Result<()> {
    let start = Instant::now();

    let targets = resolve_targets(&target_names(matches), &project.all_collections())?;
    let profiles = select_profiles(
        &profile_flags(project, matches),
        &project.profile_names(),
        ProfileDefault::AllDeclared,
    )?;

    ctx.shell().status(
        Status::Building,
        format!("{} [{}]", describe(&targets), profiles.join(", ")),
    );
    delegate(project.build(&targets, &profiles))?;

    ctx.shell().status(
        Status::Finished,
        format!("build in {}", format_duration(start.elapsed())),
    );
    Ok(())
}
