//! CLI definitions using clap.
//!
//! The command line is parsed twice. The bootstrap parse knows only the
//! global options and `configure`, which is all that is needed to locate
//! and load the project. Once the project is loaded, [`project_command`]
//! builds the full grammar, with one `--<profile>` flag per declared
//! profile, and the arguments are parsed again against it.

use std::path::PathBuf;

use clap::error::ErrorKind;
use clap::{Arg, ArgAction, ArgGroup, ArgMatches, Args, Command, CommandFactory, Parser, Subcommand};

use srbuild::core::Project;
use srbuild::util::{GlobalContext, Verbosity};

const ABOUT: &str = "Configure, build, test and install script-described native projects";

/// Options accepted by every invocation, before and after the subcommand.
#[derive(Debug, Clone, Args)]
pub struct GlobalArgs {
    /// Path to the project file [default: build/project.srbuild]
    #[arg(
        short = 'p',
        long,
        global = true,
        value_name = "PATH",
        env = "SRBUILD_PROJECT_FILE"
    )]
    pub project_file: Option<PathBuf>,

    /// Enable verbose output (-vv for trace output)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Enable trace output
    #[arg(long = "very-verbose", global = true)]
    pub very_verbose: bool,
}

impl GlobalArgs {
    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.verbose, self.very_verbose)
    }
}

/// The bootstrap grammar: global options and `configure` only.
#[derive(Debug, Parser)]
#[command(
    name = "srbuild",
    version,
    about = ABOUT,
    disable_help_flag = true,
    disable_help_subcommand = true
)]
pub struct Bootstrap {
    /// Print help
    #[arg(short = 'h', long, global = true)]
    pub help: bool,

    #[command(flatten)]
    pub globals: GlobalArgs,

    #[command(subcommand)]
    pub command: Option<BootstrapCommand>,

    /// First positional token, if any
    #[arg(skip)]
    pub subcommand: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum BootstrapCommand {
    /// Run the build script and generate the project file
    #[command(disable_help_flag = true)]
    Configure(ConfigureArgs),
}

#[derive(Debug, Clone, Args)]
pub struct ConfigureArgs {
    /// Build script that writes the project file [default: build.py]
    #[arg(long, value_name = "PATH")]
    pub build_script: Option<PathBuf>,

    /// Targets to configure (default: all)
    pub targets: Vec<String>,
}

/// What the bootstrap parse found.
#[derive(Debug)]
pub enum Invocation<'a> {
    /// `configure`, explicitly requested
    Configure(&'a ConfigureArgs),
    /// No subcommand at all
    Bare,
    /// A project subcommand, not known until the project is loaded
    Command(&'a str),
}

impl Bootstrap {
    pub fn invocation(&self) -> Invocation<'_> {
        match (&self.command, &self.subcommand) {
            (Some(BootstrapCommand::Configure(args)), _) => Invocation::Configure(args),
            (None, None) => Invocation::Bare,
            (None, Some(name)) => Invocation::Command(name),
        }
    }

    /// Help for the bootstrap grammar, shown when there is no project yet.
    pub fn render_help() -> String {
        Bootstrap::command().render_help().to_string()
    }
}

/// Help for `srbuild configure`.
pub fn configure_help() -> String {
    ConfigureArgs::augment_args(
        Command::new("configure")
            .about("Run the build script and generate the project file")
            .bin_name("srbuild configure"),
    )
    .render_help()
    .to_string()
}

/// Parse the global options, tolerating project subcommands.
///
/// Nothing is printed unless the arguments are wrong in a way the project
/// grammar cannot fix: a bad `configure` invocation or bad global options.
pub fn parse_bootstrap(args: &[String]) -> Bootstrap {
    let mut bootstrap = match Bootstrap::try_parse_from(args) {
        Ok(bootstrap) => bootstrap,
        Err(e) if e.kind() == ErrorKind::DisplayVersion => e.exit(),
        Err(e) if first_positional(args) == Some("configure") => e.exit(),
        // A subcommand that only exists once the project is loaded.
        Err(_) => Bootstrap::try_parse_from(retain_global_tokens(args)).unwrap_or_else(|e| e.exit()),
    };
    bootstrap.subcommand = first_positional(args).map(str::to_string);
    bootstrap
}

/// Check if a token is a global option that takes a value.
fn takes_value(token: &str) -> bool {
    token == "-p" || token == "--project-file"
}

fn is_global_flag(token: &str) -> bool {
    matches!(token, "-h" | "--help" | "--verbose" | "--very-verbose")
        || (token.len() > 1 && token.starts_with('-') && token[1..].chars().all(|c| c == 'v'))
}

/// Keep only the tokens the bootstrap grammar understands.
pub fn retain_global_tokens(args: &[String]) -> Vec<String> {
    let mut retained = Vec::new();
    let mut tokens = args.iter();

    if let Some(program) = tokens.next() {
        retained.push(program.clone());
    }

    while let Some(token) = tokens.next() {
        if token == "--" {
            break;
        }
        if takes_value(token) {
            retained.push(token.clone());
            if let Some(value) = tokens.next() {
                retained.push(value.clone());
            }
        } else if is_global_flag(token)
            || token.starts_with("--project-file=")
            || (token.starts_with("-p") && token.len() > 2)
        {
            retained.push(token.clone());
        }
    }

    retained
}

/// The first token that is not an option or an option's value.
pub fn first_positional(args: &[String]) -> Option<&str> {
    let mut tokens = args.iter().skip(1);
    while let Some(token) = tokens.next() {
        if token == "--" {
            return None;
        }
        if takes_value(token) {
            tokens.next();
            continue;
        }
        if token.starts_with('-') {
            continue;
        }
        return Some(token);
    }
    None
}

/// The fixed part of the project grammar.
pub fn base_command() -> Command {
    let configure = ConfigureArgs::augment_args(
        Command::new("configure").about("Run the build script and generate the project file"),
    );

    GlobalArgs::augment_args(
        Command::new("srbuild")
            .version(env!("CARGO_PKG_VERSION"))
            .about(ABOUT),
    )
    .disable_help_subcommand(true)
    .subcommand(configure)
}

fn targets_arg(help: &'static str) -> Arg {
    Arg::new("targets")
        .value_name("TARGETS")
        .num_args(0..)
        .help(help)
}

fn force_arg(help: &'static str) -> Arg {
    Arg::new("force")
        .short('f')
        .long("force")
        .action(ArgAction::SetTrue)
        .help(help)
}

/// Argument id of a profile flag.
pub fn profile_id(profile: &str) -> String {
    format!("profile:{}", profile)
}

/// Add one `--<profile>` flag per declared profile.
fn with_profiles(mut cmd: Command, profiles: &[&str], verb: &str, exclusive: bool) -> Command {
    for profile in profiles {
        cmd = cmd.arg(
            Arg::new(profile_id(profile))
                .long(profile.to_string())
                .action(ArgAction::SetTrue)
                .help(format!("{} targets for the {} profile", verb, profile)),
        );
    }
    if exclusive && profiles.len() > 1 {
        cmd = cmd.group(
            ArgGroup::new("profile")
                .args(profiles.iter().map(|p| profile_id(p)))
                .multiple(false),
        );
    }
    cmd
}

fn install_command(name: &'static str, about: &'static str, verb: &str, profiles: &[&str], ctx: &GlobalContext) -> Command {
    let dirs = ctx.install_dirs();
    let dir_arg = |id: &'static str, short: char, what: &str, default: &std::path::Path| {
        Arg::new(id)
            .short(short)
            .long(id)
            .value_name("DIR")
            .value_parser(clap::value_parser!(PathBuf))
            .help(format!(
                "Installation directory for {} [default: {}]",
                what,
                default.display()
            ))
    };

    let cmd = Command::new(name)
        .about(about)
        .arg(targets_arg(
            "Targets or public headers (default: all public targets and headers)",
        ))
        .arg(dir_arg("headers", 'I', "headers", dirs.headers.as_path()))
        .arg(dir_arg("libraries", 'L', "libraries", dirs.libraries.as_path()))
        .arg(dir_arg("executables", 'X', "executables", dirs.executables.as_path()))
        .arg(force_arg("Apply the changes; without this flag only a dry run is performed"));

    with_profiles(cmd, profiles, verb, false)
}

/// The full grammar for a loaded project.
pub fn project_command(project: &Project, ctx: &GlobalContext) -> Command {
    let profiles = project.profile_names();

    let help = Command::new("help")
        .about("Show targets, their artifacts and the public interface")
        .arg(targets_arg("Targets to describe (default: all)"));

    let build = Command::new("build")
        .about("Build targets")
        .arg(targets_arg("Targets to build (default: all)"));

    let run = Command::new("run").about("Build and run an executable").arg(
        Arg::new("target")
            .value_name("TARGET")
            .required(true)
            .help("Executable to run"),
    );

    let test = Command::new("test")
        .about("Build and run tests")
        .arg(targets_arg("Tests to run (default: all tests)"));

    let clean = Command::new("clean")
        .about("Remove build artifacts")
        .arg(
            Arg::new("nuke")
                .long("nuke")
                .action(ArgAction::SetTrue)
                .help("Remove the whole build directory and the project file; the project must be reconfigured afterwards"),
        )
        .arg(force_arg("Apply the changes; without this flag only a dry run is performed"));

    base_command()
        .subcommand(help)
        .subcommand(with_profiles(build, &profiles, "Build", false))
        .subcommand(with_profiles(run, &profiles, "Run", true))
        .subcommand(with_profiles(test, &profiles, "Test", false))
        .subcommand(install_command(
            "install",
            "Install targets and public headers (release profile by default)",
            "Install",
            &profiles,
            ctx,
        ))
        .subcommand(install_command(
            "uninstall",
            "Uninstall targets and public headers (release profile by default)",
            "Uninstall",
            &profiles,
            ctx,
        ))
        .subcommand(with_profiles(clean, &profiles, "Clean", false))
}

/// Parse the full argument vector against the project grammar.
///
/// Grammar errors and `--help` exit the process through clap.
pub fn parse_project(cmd: &mut Command, args: &[String]) -> ArgMatches {
    cmd.try_get_matches_from_mut(args).unwrap_or_else(|e| e.exit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use srbuild::core::Target;
    use srbuild::util::Config;

    fn args(tokens: &[&str]) -> Vec<String> {
        std::iter::once("srbuild")
            .chain(tokens.iter().copied())
            .map(String::from)
            .collect()
    }

    fn ctx() -> GlobalContext {
        GlobalContext::with_config(PathBuf::from("/work"), Config::default(), Verbosity::Normal)
    }

    fn project() -> Project {
        Project::new("/work/build")
            .with_profile("debug")
            .with_profile("release")
            .with_target(Target::executable("app"))
    }

    #[test]
    fn test_bootstrap_tolerates_project_subcommands() {
        let bootstrap = parse_bootstrap(&args(&["build", "app", "--release", "-v"]));
        assert!(bootstrap.command.is_none());
        assert_eq!(bootstrap.globals.verbosity(), Verbosity::Verbose);
        assert!(matches!(bootstrap.invocation(), Invocation::Command("build")));
    }

    #[test]
    fn test_bootstrap_configure() {
        let bootstrap = parse_bootstrap(&args(&["-p", "out/p.srbuild", "configure", "--build-script", "gen.py", "app"]));
        match bootstrap.invocation() {
            Invocation::Configure(configure) => {
                assert_eq!(configure.build_script, Some(PathBuf::from("gen.py")));
                assert_eq!(configure.targets, vec!["app"]);
            }
            other => panic!("unexpected invocation: {other:?}"),
        }
        assert_eq!(bootstrap.globals.project_file, Some(PathBuf::from("out/p.srbuild")));
    }

    #[test]
    fn test_bootstrap_bare_and_help() {
        let bootstrap = parse_bootstrap(&args(&["-vv"]));
        assert!(matches!(bootstrap.invocation(), Invocation::Bare));
        assert_eq!(bootstrap.globals.verbosity(), Verbosity::VeryVerbose);

        let bootstrap = parse_bootstrap(&args(&["configure", "--help"]));
        assert!(bootstrap.help);
        assert!(matches!(bootstrap.invocation(), Invocation::Configure(_)));
    }

    #[test]
    fn test_retain_global_tokens() {
        let retained = retain_global_tokens(&args(&[
            "install", "-I", "/opt/include", "-p", "x.srbuild", "--very-verbose", "--force", "--", "-v",
        ]));
        assert_eq!(retained, args(&["-p", "x.srbuild", "--very-verbose"]));

        let retained = retain_global_tokens(&args(&["--project-file=a", "-pb", "-vv", "-h"]));
        assert_eq!(retained, args(&["--project-file=a", "-pb", "-vv", "-h"]));
    }

    #[test]
    fn test_first_positional_skips_option_values() {
        assert_eq!(first_positional(&args(&["-p", "build", "run", "app"])), Some("run"));
        assert_eq!(first_positional(&args(&["-v", "--", "build"])), None);
        assert_eq!(first_positional(&args(&[])), None);
    }

    #[test]
    fn test_project_grammar_registers_profiles() {
        let mut cmd = project_command(&project(), &ctx());
        let matches = parse_project(&mut cmd, &args(&["build", "app", "--release"]));
        let (name, sub) = matches.subcommand().unwrap();
        assert_eq!(name, "build");
        assert!(sub.get_flag(&profile_id("release")));
        assert!(!sub.get_flag(&profile_id("debug")));
        let targets: Vec<&String> = sub.get_many::<String>("targets").unwrap().collect();
        assert_eq!(targets, vec!["app"]);
    }

    #[test]
    fn test_global_options_after_subcommand() {
        let mut cmd = project_command(&project(), &ctx());
        let result = cmd.try_get_matches_from_mut(args(&["clean", "--nuke", "-v", "-p", "x"]));
        assert!(result.is_ok());
    }

    #[test]
    fn test_run_profiles_are_exclusive() {
        let mut cmd = project_command(&project(), &ctx());
        assert!(cmd
            .try_get_matches_from_mut(args(&["run", "app", "--debug", "--release"]))
            .is_err());
        assert!(cmd.try_get_matches_from_mut(args(&["run"])).is_err());
    }

    #[test]
    fn test_unknown_profile_flag_is_rejected() {
        let mut cmd = project_command(&project(), &ctx());
        let err = cmd
            .try_get_matches_from_mut(args(&["build", "--profiling"]))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownArgument);
    }

    #[test]
    fn test_grammar_is_consistent() {
        project_command(&project(), &ctx()).debug_assert();
        Bootstrap::command().debug_assert();
    }

    #[test]
    fn test_configure_help_mentions_build_script() {
        assert!(configure_help().contains("--build-script"));
        assert!(Bootstrap::render_help().contains("configure"));
    }
}
