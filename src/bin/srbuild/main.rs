//! srbuild CLI - command orchestration for script-configured native builds

use std::io::IsTerminal;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::Invocation;
use srbuild::ops::{ConfigureOptions, LifecycleGate};
use srbuild::util::shell::Status;
use srbuild::util::{GlobalContext, Verbosity};

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

fn init_logging(verbosity: Verbosity) {
    let filter = EnvFilter::try_from_env("SRBUILD_LOG")
        .unwrap_or_else(|_| EnvFilter::new(verbosity.filter_directive()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .init();
}

fn run() -> Result<()> {
    let args: Vec<String> = std::env::args_os()
        .map(|arg| arg.to_string_lossy().into_owned())
        .collect();

    // Phase 0: global options only
    let bootstrap = cli::parse_bootstrap(&args);
    let verbosity = bootstrap.globals.verbosity();
    init_logging(verbosity);

    let ctx = GlobalContext::new(verbosity)?;
    let project_file = match &bootstrap.globals.project_file {
        Some(path) => ctx.resolve_path(path),
        None => ctx.default_project_file(),
    };
    tracing::debug!("project file: {}", project_file.display());

    let mut gate = LifecycleGate::new(&project_file, ctx.build_dir())
        .with_interpreter(ctx.config().configure.interpreter.clone());

    // Phase 1: configure or load
    match bootstrap.invocation() {
        Invocation::Configure(args) => {
            if bootstrap.help {
                print!("{}", cli::configure_help());
                return Ok(());
            }
            let script = match &args.build_script {
                Some(path) => ctx.resolve_path(path),
                None => ctx.default_build_script(),
            };
            let options = ConfigureOptions::new(script).with_targets(args.targets.clone());
            return commands::configure::execute(&mut gate, options, &ctx);
        }
        Invocation::Bare if !project_file.exists() => {
            if bootstrap.help {
                print!("{}", cli::Bootstrap::render_help());
                println!("\nNo project file at {}; project commands become available after `srbuild configure`.", project_file.display());
                return Ok(());
            }
            tracing::debug!("no project file yet; configuring with the default build script");
            return commands::configure::execute(&mut gate, ConfigureOptions::new(ctx.default_build_script()), &ctx);
        }
        Invocation::Bare => {
            gate.load()?;
        }
        Invocation::Command(name) => {
            tracing::debug!("loading project for `{}`", name);
            gate.load()?;
        }
    }

    // Phase 2: the grammar for this project
    let project = gate.project()?;
    let mut cmd = cli::project_command(project, &ctx);
    let matches = cli::parse_project(&mut cmd, &args);

    let invalidate = match matches.subcommand() {
        Some(("help", sub)) => commands::help::execute(project, sub, &ctx).map(|_| false),
        Some(("build", sub)) => commands::build::execute(project, sub, &ctx).map(|_| false),
        Some(("run", sub)) => commands::run::execute(project, sub, &ctx).map(|_| false),
        Some(("test", sub)) => commands::test::execute(project, sub, &ctx).map(|_| false),
        Some(("install", sub)) => commands::install::execute(project, sub, &ctx).map(|_| false),
        Some(("uninstall", sub)) => commands::uninstall::execute(project, sub, &ctx).map(|_| false),
        Some(("clean", sub)) => commands::clean::execute(project, gate.project_file(), sub, &ctx),
        // configure was handled before the project was loaded
        Some(("configure", _)) => Ok(false),
        _ => {
            cmd.print_help()?;
            Ok(false)
        }
    }?;

    if invalidate {
        gate.invalidate();
        ctx.shell().status(
            Status::Info,
            "project removed; run `srbuild configure` before further commands",
        );
    }

    Ok(())
}
