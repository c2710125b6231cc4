//! `srbuild configure` command

use std::time::Instant;

use anyhow::Result;

use srbuild::ops::{ConfigureOptions, LifecycleGate};
use srbuild::util::shell::{format_duration, Status};
use srbuild::util::GlobalContext;

pub fn execute(gate: &mut LifecycleGate, options: ConfigureOptions, ctx: &GlobalContext) -> Result<()> {
    let start = Instant::now();
    ctx.shell()
        .status(Status::Configuring, options.build_script.display());

    let project = gate.configure(options)?;

    ctx.shell().status(
        Status::Configured,
        format!(
            "{} target(s) for profiles [{}] in {}",
            project.all_targets().count(),
            project.profile_names().join(", "),
            format_duration(start.elapsed())
        ),
    );
    tracing::debug!("wrote {}", gate.project_file().display());
    Ok(())
}
