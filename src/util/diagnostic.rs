//! Remediation hints shared by error messages.
//!
//! Every fatal error that the user can fix by running another command ends
//! with one of these lines.

/// Common suggestion messages for consistent error handling.
pub mod suggestions {
    /// The project file is missing, unreadable or outdated.
    pub const RUN_CONFIGURE: &str = "help: run `srbuild configure` to generate the project file";

    /// The build script could not be found.
    pub const BUILD_SCRIPT: &str =
        "help: pass `--build-script <PATH>` or set `configure.build_script` in .srbuild/config.toml";

    /// A target name did not resolve.
    pub const LIST_TARGETS: &str = "help: run `srbuild help` to list all targets";

    /// A delegated operation reported that the project is not in a usable state.
    pub const NOT_CONFIGURED: &str =
        "help: has this project been configured? Try `srbuild configure`, then build again";

    /// The build backend failed.
    pub const BUILD_FAILED: &str =
        "help: reconfiguring the project or running a clean build may resolve this";

    /// An artifact to install has not been built.
    pub const BUILD_FIRST: &str = "help: build the target first with `srbuild build`";

    /// A mutating command ran as a dry run.
    pub const DRY_RUN: &str = "pass `--force` to apply these changes";
}
