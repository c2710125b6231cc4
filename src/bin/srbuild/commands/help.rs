//! `srbuild help` command

use anyhow::Result;
use clap::ArgMatches;

use srbuild::core::project::describe_targets;
use srbuild::core::Project;
use srbuild::ops::resolve_targets;
use srbuild::util::GlobalContext;

use super::target_names;

pub fn execute(project: &Project, matches: &ArgMatches, ctx: &GlobalContext) -> Result<()> {
    let targets = resolve_targets(&target_names(matches), &project.all_collections())?;
    print!("{}", describe_targets(project, &targets, ctx.cwd()));
    Ok(())
}
