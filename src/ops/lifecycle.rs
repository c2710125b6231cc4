//! The lifecycle gate between a serialized project and the running tool.
//!
//! Every invocation starts with no project. The gate either loads the
//! existing project file, or runs the build script to produce a new one
//! (configure), and refuses to hand out a project written for another API
//! version.
//!
//! ```text
//! Unloaded --configure--> Configuring --ok--> Loaded
//! Unloaded --load-------------------------> Loaded
//! ```
//!
//! A failed configure returns the gate to `Unloaded`; `clean --nuke`
//! invalidates a loaded project.

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::Context;
use thiserror::Error;

use crate::core::{Project, ProjectError, ProjectHeader, PROJECT_API_VERSION};
use crate::ops::resolve::{resolve_targets, ResolveError};
use crate::util::diagnostic::suggestions;
use crate::util::fs::{absolutize, ensure_dir, modified};
use crate::util::process::{describe_status, format_output, script_process};

/// Lifecycle phase of the project within one invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Unloaded,
    Configuring,
    Loaded,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Unloaded => "unloaded",
            Phase::Configuring => "configuring",
            Phase::Loaded => "loaded",
        })
    }
}

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("project file `{}` does not exist\n{}", .path.display(), suggestions::RUN_CONFIGURE)]
    MissingProjectFile { path: PathBuf },

    #[error(
        "project file `{}` was written for API version {found}, but this srbuild expects version {expected}\n{}",
        .path.display(),
        suggestions::RUN_CONFIGURE
    )]
    VersionMismatch { path: PathBuf, found: u32, expected: u32 },

    #[error("build script `{}` does not exist\n{}", .path.display(), suggestions::BUILD_SCRIPT)]
    MissingBuildScript { path: PathBuf },

    #[error("build script `{}` failed with {status}\n{output}", .script.display())]
    ScriptFailed {
        script: PathBuf,
        status: String,
        output: String,
    },

    #[error("build script `{}` did not write a project file to `{}`", .script.display(), .path.display())]
    NoProjectWritten { script: PathBuf, path: PathBuf },

    #[error(
        "build script `{}` produced a project for API version {found}, but this srbuild expects version {expected}",
        .script.display()
    )]
    IncompatibleScript { script: PathBuf, found: u32, expected: u32 },

    #[error("failed to load project file `{}`: {reason}\n{}", .path.display(), suggestions::RUN_CONFIGURE)]
    Unreadable { path: PathBuf, reason: String },

    #[error("build script `{}` produced an invalid project: {reason}", .script.display())]
    Regenerated { script: PathBuf, reason: String },

    #[error(transparent)]
    Project(#[from] ProjectError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("cannot {action} the project while it is {phase}")]
    InvalidTransition { action: &'static str, phase: Phase },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Render an error with its sources on one line.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

/// What `configure` should run and prepare.
#[derive(Debug, Clone)]
pub struct ConfigureOptions {
    /// Build script to run
    pub build_script: PathBuf,

    /// Targets to configure; empty means all
    pub targets: Vec<String>,
}

impl ConfigureOptions {
    pub fn new(build_script: impl Into<PathBuf>) -> Self {
        ConfigureOptions {
            build_script: build_script.into(),
            targets: Vec::new(),
        }
    }

    pub fn with_targets(mut self, targets: Vec<String>) -> Self {
        self.targets = targets;
        self
    }
}

#[derive(Debug)]
enum State {
    Unloaded,
    Configuring,
    Loaded(Project),
}

/// Owns the project for the rest of the invocation once it is loaded.
#[derive(Debug)]
pub struct LifecycleGate {
    /// Absolute path of the project file
    project_file: PathBuf,

    /// Build directory handed to the build script
    build_dir: PathBuf,

    /// Interpreter override for the build script
    interpreter: Option<String>,

    state: State,
}

impl LifecycleGate {
    /// Create a gate for the given project file. Both paths should be
    /// absolute since the build script runs from its own directory.
    pub fn new(project_file: impl Into<PathBuf>, build_dir: impl Into<PathBuf>) -> Self {
        LifecycleGate {
            project_file: project_file.into(),
            build_dir: build_dir.into(),
            interpreter: None,
            state: State::Unloaded,
        }
    }

    /// Run build scripts through this interpreter instead of inferring one.
    pub fn with_interpreter(mut self, interpreter: Option<String>) -> Self {
        self.interpreter = interpreter;
        self
    }

    pub fn phase(&self) -> Phase {
        match self.state {
            State::Unloaded => Phase::Unloaded,
            State::Configuring => Phase::Configuring,
            State::Loaded(_) => Phase::Loaded,
        }
    }

    pub fn project_file(&self) -> &Path {
        &self.project_file
    }

    fn expect_phase(&self, expected: Phase, action: &'static str) -> Result<(), LifecycleError> {
        let phase = self.phase();
        if phase != expected {
            return Err(LifecycleError::InvalidTransition { action, phase });
        }
        Ok(())
    }

    /// The loaded project.
    pub fn project(&self) -> Result<&Project, LifecycleError> {
        match &self.state {
            State::Loaded(project) => Ok(project),
            _ => Err(LifecycleError::InvalidTransition {
                action: "use",
                phase: self.phase(),
            }),
        }
    }

    /// Load the existing project file.
    ///
    /// If the build script that produced it has changed since, the project
    /// is regenerated first.
    pub fn load(&mut self) -> Result<&Project, LifecycleError> {
        self.expect_phase(Phase::Unloaded, "load")?;

        let path = self.project_file.clone();
        if !path.exists() {
            return Err(LifecycleError::MissingProjectFile { path });
        }

        let header = ProjectHeader::read(&path).map_err(|e| LifecycleError::Unreadable {
            path: path.clone(),
            reason: error_chain(&e),
        })?;
        if header.api_version != PROJECT_API_VERSION {
            return Err(LifecycleError::VersionMismatch {
                path,
                found: header.api_version,
                expected: PROJECT_API_VERSION,
            });
        }

        let project = Project::load(&path).map_err(|e| LifecycleError::Unreadable {
            path: path.clone(),
            reason: error_chain(&e),
        })?;

        if let Some(script) = project.build_script() {
            if is_newer(script, &path) {
                tracing::info!(
                    "build script {} changed since the project was configured; reconfiguring",
                    script.display()
                );
                let options = ConfigureOptions::new(script);
                return self.configure(options);
            }
        }

        self.state = State::Loaded(project);
        self.project()
    }

    /// Run the build script and load the project it writes.
    pub fn configure(&mut self, options: ConfigureOptions) -> Result<&Project, LifecycleError> {
        self.expect_phase(Phase::Unloaded, "configure")?;
        self.state = State::Configuring;

        match self.run_configure(&options) {
            Ok(project) => {
                self.state = State::Loaded(project);
                self.project()
            }
            Err(e) => {
                self.state = State::Unloaded;
                Err(e)
            }
        }
    }

    fn run_configure(&self, options: &ConfigureOptions) -> Result<Project, LifecycleError> {
        let cwd = std::env::current_dir().context("failed to get current directory")?;
        let script = absolutize(&options.build_script, &cwd);
        if !script.is_file() {
            return Err(LifecycleError::MissingBuildScript { path: script });
        }
        let script_dir = script.parent().map(Path::to_path_buf).unwrap_or(cwd);

        if let Some(parent) = self.project_file.parent() {
            ensure_dir(parent)?;
        }
        let previous = modified(&self.project_file);

        let process = script_process(&script, self.interpreter.as_deref())?
            .cwd(&script_dir)
            .env("SRBUILD_PROJECT_FILE", &self.project_file)
            .env("SRBUILD_API_VERSION", PROJECT_API_VERSION.to_string())
            .env("SRBUILD_BUILD_DIR", &self.build_dir);

        tracing::debug!("running build script: {}", process.display_command());
        let output = process.exec()?;
        if !output.status.success() {
            return Err(LifecycleError::ScriptFailed {
                script,
                status: describe_status(&output.status),
                output: format_output(&output),
            });
        }
        tracing::trace!("build script output:\n{}", format_output(&output));

        let written = modified(&self.project_file);
        if written.is_none() || written == previous {
            return Err(LifecycleError::NoProjectWritten {
                script,
                path: self.project_file.clone(),
            });
        }

        let regenerated = |e: ProjectError| LifecycleError::Regenerated {
            script: script.clone(),
            reason: error_chain(&e),
        };

        let header = ProjectHeader::read(&self.project_file).map_err(regenerated)?;
        if header.api_version != PROJECT_API_VERSION {
            return Err(LifecycleError::IncompatibleScript {
                script: script.clone(),
                found: header.api_version,
                expected: PROJECT_API_VERSION,
            });
        }

        let mut project = Project::load(&self.project_file).map_err(regenerated)?;
        project.set_origin(&script_dir, &script).map_err(regenerated)?;

        let collections = project.all_collections();
        let targets = resolve_targets(&options.targets, &collections)?;
        let profiles: Vec<String> = project.profile_names().into_iter().map(String::from).collect();
        project.configure(&targets, &profiles)?;
        project.export(&self.project_file)?;

        tracing::debug!(
            "configured {} target(s) from {}",
            targets.len(),
            script.display()
        );
        Ok(project)
    }

    /// Drop the loaded project, e.g. after its project file was removed.
    pub fn invalidate(&mut self) {
        if matches!(self.state, State::Loaded(_)) {
            tracing::debug!("project invalidated; it must be reconfigured before further use");
        }
        self.state = State::Unloaded;
    }
}

/// Whether `path` was modified after `than`.
fn is_newer(path: &Path, than: &Path) -> bool {
    match (modified(path), modified(than)) {
        (Some(a), Some(b)) => a > b,
        _ => false,
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::fs;
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;

    fn project_json(api_version: u32) -> String {
        serde_json::json!({
            "api_version": api_version,
            "build_dir": "build",
            "profiles": [{ "name": "debug" }, { "name": "release" }],
            "libraries": [{ "name": "core", "artifacts": { "release": "build/release/libcore.so" } }],
            "executables": [{ "name": "app", "artifacts": { "release": "build/release/app" } }],
            "tests": [{ "name": "core_test", "artifacts": { "debug": "build/debug/core_test" } }],
            "public_headers": ["include/core.h"]
        })
        .to_string()
    }

    fn write_script(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("build.sh");
        fs::write(&path, format!("#!/bin/sh\necho run >> runs.log\n{}\n", body)).unwrap();
        path
    }

    fn writing_script(dir: &Path, api_version: u32) -> PathBuf {
        write_script(
            dir,
            &format!(
                "cat > \"$SRBUILD_PROJECT_FILE\" <<'EOF'\n{}\nEOF",
                project_json(api_version)
            ),
        )
    }

    fn gate(dir: &Path) -> LifecycleGate {
        LifecycleGate::new(dir.join("build/project.srbuild"), dir.join("build"))
    }

    fn runs(dir: &Path) -> usize {
        fs::read_to_string(dir.join("runs.log")).map(|s| s.lines().count()).unwrap_or(0)
    }

    #[test]
    fn test_configure_then_load() {
        let tmp = TempDir::new().unwrap();
        let script = writing_script(tmp.path(), PROJECT_API_VERSION);

        let mut gate = gate(tmp.path());
        assert_eq!(gate.phase(), Phase::Unloaded);
        let project = gate.configure(ConfigureOptions::new(&script)).unwrap();
        assert_eq!(project.root(), Some(tmp.path()));
        assert_eq!(project.build_script(), Some(script.as_path()));
        assert_eq!(gate.phase(), Phase::Loaded);
        assert!(tmp.path().join("build/debug").is_dir());
        assert!(tmp.path().join("build/release").is_dir());

        let mut reloaded = self::gate(tmp.path());
        let project = reloaded.load().unwrap();
        assert_eq!(project.api_version(), PROJECT_API_VERSION);
        assert_eq!(project.profile_names(), vec!["debug", "release"]);
        assert_eq!(project.all_targets().count(), 3);
        assert_eq!(runs(tmp.path()), 1);
    }

    #[test]
    fn test_failing_script_reports_output() {
        let tmp = TempDir::new().unwrap();
        let script = write_script(tmp.path(), "echo 'syntax error in build.sh' >&2\nexit 3");

        let mut gate = gate(tmp.path());
        let err = gate.configure(ConfigureOptions::new(&script)).unwrap_err();
        assert!(matches!(err, LifecycleError::ScriptFailed { .. }));
        let message = err.to_string();
        assert!(message.contains("exit code 3"));
        assert!(message.contains("syntax error in build.sh"));
        assert_eq!(gate.phase(), Phase::Unloaded);
    }

    #[test]
    fn test_script_that_writes_nothing() {
        let tmp = TempDir::new().unwrap();
        let script = write_script(tmp.path(), "true");

        let err = gate(tmp.path()).configure(ConfigureOptions::new(&script)).unwrap_err();
        assert!(matches!(err, LifecycleError::NoProjectWritten { .. }));
    }

    #[test]
    fn test_missing_build_script() {
        let tmp = TempDir::new().unwrap();
        let err = gate(tmp.path())
            .configure(ConfigureOptions::new(tmp.path().join("build.py")))
            .unwrap_err();
        assert!(matches!(err, LifecycleError::MissingBuildScript { .. }));
    }

    #[test]
    fn test_script_writing_other_api_version() {
        let tmp = TempDir::new().unwrap();
        let script = writing_script(tmp.path(), PROJECT_API_VERSION + 1);
        let err = gate(tmp.path()).configure(ConfigureOptions::new(&script)).unwrap_err();
        assert!(matches!(err, LifecycleError::IncompatibleScript { .. }));
    }

    #[test]
    fn test_configure_unknown_target() {
        let tmp = TempDir::new().unwrap();
        let script = writing_script(tmp.path(), PROJECT_API_VERSION);
        let mut gate = gate(tmp.path());
        let err = gate
            .configure(ConfigureOptions::new(&script).with_targets(vec!["nope".to_string()]))
            .unwrap_err();
        assert!(matches!(err, LifecycleError::Resolve(_)));
        assert_eq!(gate.phase(), Phase::Unloaded);
    }

    #[test]
    fn test_load_missing_project_file() {
        let tmp = TempDir::new().unwrap();
        let err = gate(tmp.path()).load().unwrap_err();
        assert!(matches!(err, LifecycleError::MissingProjectFile { .. }));
        assert!(err.to_string().contains("does not exist"));
        assert!(err.to_string().contains("srbuild configure"));
    }

    #[test]
    fn test_version_mismatch_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("build/project.srbuild");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, r#"{"api_version": 2, "targets": "a newer format"}"#).unwrap();

        let mut gate = gate(tmp.path());
        let err = gate.load().unwrap_err();
        match &err {
            LifecycleError::VersionMismatch { found, expected, .. } => {
                assert_eq!(*found, 2);
                assert_eq!(*expected, PROJECT_API_VERSION);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(gate.project().is_err());
    }

    #[test]
    fn test_malformed_project_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("build/project.srbuild");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "not json").unwrap();

        let err = gate(tmp.path()).load().unwrap_err();
        assert!(matches!(err, LifecycleError::Unreadable { .. }));
    }

    #[test]
    fn test_stale_project_is_reconfigured() {
        let tmp = TempDir::new().unwrap();
        let script = writing_script(tmp.path(), PROJECT_API_VERSION);
        gate(tmp.path()).configure(ConfigureOptions::new(&script)).unwrap();

        let future = SystemTime::now() + Duration::from_secs(60);
        fs::File::options()
            .write(true)
            .open(&script)
            .unwrap()
            .set_modified(future)
            .unwrap();

        let mut gate = gate(tmp.path());
        gate.load().unwrap();
        assert_eq!(gate.phase(), Phase::Loaded);
        assert_eq!(runs(tmp.path()), 2);
    }

    #[test]
    fn test_invalid_transitions() {
        let tmp = TempDir::new().unwrap();
        let script = writing_script(tmp.path(), PROJECT_API_VERSION);

        let mut gate = gate(tmp.path());
        assert!(matches!(
            gate.project(),
            Err(LifecycleError::InvalidTransition { phase: Phase::Unloaded, .. })
        ));

        gate.configure(ConfigureOptions::new(&script)).unwrap();
        assert!(matches!(
            gate.load(),
            Err(LifecycleError::InvalidTransition { phase: Phase::Loaded, .. })
        ));

        gate.invalidate();
        assert_eq!(gate.phase(), Phase::Unloaded);
        assert!(gate.project().is_err());
    }
}
