//! Project - the loaded project description.
//!
//! A project is produced by the user's build script, serialized to the
//! project file as JSON, and loaded again by every later invocation. It owns
//! the target collections and the declared profiles; the orchestration
//! layer only borrows from it.
//!
//! The build, run and test operations are delegated to an external build
//! backend (any program that accepts artifact paths to bring up to date).

use std::collections::HashSet;
use std::fmt::Write as _;
use std::io::{self, Write as _};
use std::path::{Component, Path, PathBuf};
use std::time::Instant;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::profile::{self, Profile};
use crate::core::target::{Target, TargetKind};
use crate::util::diagnostic::suggestions;
use crate::util::fs::{absolutize, ensure_dir, is_inside, normalize_path};
use crate::util::process::{describe_status, format_output, ProcessBuilder};
use crate::util::shell::format_duration;

/// API version of the project file format understood by this build of srbuild.
///
/// A project file written with a different version must be regenerated.
pub const PROJECT_API_VERSION: u32 = 1;

/// Errors raised by the project collaborator.
#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("failed to read project file `{}`", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("project file `{}` is malformed", .path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write project file `{}`", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid project description: {0}")]
    Invalid(String),

    #[error("profile `{0}` is not declared by this project")]
    UnknownProfile(String),

    #[error("no build backend is configured for this project")]
    NoBackend,

    #[error("artifact for `{target}` ({profile}) does not exist: {}", .path.display())]
    MissingArtifact {
        target: String,
        profile: String,
        path: PathBuf,
    },

    #[error("`{target}` is not built under profile(s) {}", .profiles.join(", "))]
    NoArtifact { target: String, profiles: Vec<String> },

    #[error("`{command}` failed with {status}\n{output}{}", suggestions::BUILD_FAILED)]
    BuildFailed {
        command: String,
        status: String,
        output: String,
    },

    #[error("`{target}` ({profile}) failed with {status}")]
    RunFailed {
        target: String,
        profile: String,
        status: String,
    },

    #[error("{} test(s) failed: {}", .failed.len(), .failed.join(", "))]
    TestsFailed { failed: Vec<String> },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ProjectError {
    /// Whether the error indicates the project itself is not ready for the
    /// operation (as opposed to the operation failing).
    pub fn is_project_state(&self) -> bool {
        matches!(
            self,
            ProjectError::NoBackend
                | ProjectError::MissingArtifact { .. }
                | ProjectError::UnknownProfile(_)
        )
    }
}

/// The external program that builds artifacts.
///
/// Invoked as `program args... <artifact paths>` from the project root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Backend {
    /// Program to run
    pub program: PathBuf,

    /// Arguments placed before the artifact paths
    #[serde(default)]
    pub args: Vec<String>,
}

impl Backend {
    /// Create a backend running `program`.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Backend {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Add leading arguments.
    pub fn with_args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }
}

/// The part of the project file that is stable across API versions.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ProjectHeader {
    /// API version the file was written with
    pub api_version: u32,
}

impl ProjectHeader {
    /// Read only the header of a project file.
    pub fn read(path: &Path) -> Result<Self, ProjectError> {
        let contents = read_project_file(path)?;
        serde_json::from_str(&contents).map_err(|source| ProjectError::Malformed {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Outcome of a successful test run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TestSummary {
    pub passed: usize,
}

/// A loaded project description.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    /// API version the description was written with
    api_version: u32,

    /// Directory relative paths are resolved against
    #[serde(default, skip_serializing_if = "Option::is_none")]
    root: Option<PathBuf>,

    /// Build script that generated this description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    build_script: Option<PathBuf>,

    /// Build output directory
    build_dir: PathBuf,

    /// Declared profiles, in declaration order
    profiles: Vec<Profile>,

    #[serde(default)]
    libraries: Vec<Target>,

    #[serde(default)]
    executables: Vec<Target>,

    #[serde(default)]
    tests: Vec<Target>,

    /// Headers that form the public interface
    #[serde(default)]
    public_headers: Vec<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    backend: Option<Backend>,
}

impl Project {
    /// Create an empty project with the current API version.
    pub fn new(build_dir: impl Into<PathBuf>) -> Self {
        Project {
            api_version: PROJECT_API_VERSION,
            root: None,
            build_script: None,
            build_dir: build_dir.into(),
            profiles: Vec::new(),
            libraries: Vec::new(),
            executables: Vec::new(),
            tests: Vec::new(),
            public_headers: Vec::new(),
            backend: None,
        }
    }

    /// Declare a profile. Its build directory defaults to `<build dir>/<name>`.
    pub fn with_profile(mut self, name: impl Into<String>) -> Self {
        let profile = Profile::new(name);
        self.profiles.push(profile);
        self.normalize();
        self
    }

    /// Add a target to the collection matching its kind.
    pub fn with_target(mut self, target: Target) -> Self {
        self.collection_mut(target.kind()).push(target);
        self
    }

    /// Add a public header.
    pub fn with_public_header(mut self, header: impl Into<PathBuf>) -> Self {
        self.public_headers.push(header.into());
        self
    }

    /// Set the build backend.
    pub fn with_backend(mut self, backend: Backend) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Override the API version tag.
    pub fn with_api_version(mut self, version: u32) -> Self {
        self.api_version = version;
        self
    }

    /// Load a project description from disk.
    ///
    /// The API version is not checked here; see the lifecycle gate.
    pub fn load(path: &Path) -> Result<Self, ProjectError> {
        let contents = read_project_file(path)?;
        let mut project: Project =
            serde_json::from_str(&contents).map_err(|source| ProjectError::Malformed {
                path: path.to_path_buf(),
                source,
            })?;

        project.normalize();
        project.validate()?;

        tracing::debug!(
            "loaded project from {} ({} libraries, {} executables, {} tests, profiles: {:?})",
            path.display(),
            project.libraries.len(),
            project.executables.len(),
            project.tests.len(),
            project.profile_names()
        );

        Ok(project)
    }

    /// Serialize the project description to disk.
    ///
    /// The file is written to a temporary sibling and renamed into place so a
    /// failed export never leaves a truncated project file behind.
    pub fn export(&self, path: &Path) -> Result<(), ProjectError> {
        let write_err = |source: io::Error| ProjectError::Write {
            path: path.to_path_buf(),
            source,
        };

        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        ensure_dir(parent)?;

        let mut file = tempfile::NamedTempFile::new_in(parent).map_err(write_err)?;
        serde_json::to_writer_pretty(&mut file, self)
            .map_err(|e| write_err(io::Error::new(io::ErrorKind::Other, e)))?;
        file.write_all(b"\n").map_err(write_err)?;
        file.persist(path).map_err(|e| write_err(e.error))?;

        tracing::debug!("exported project to {}", path.display());
        Ok(())
    }

    /// Fill in derived fields: target kinds and default profile directories.
    fn normalize(&mut self) {
        for kind in TargetKind::ALL {
            for target in self.collection_mut(kind) {
                target.set_kind(kind);
            }
        }

        let build_dir = self.build_dir.clone();
        for profile in &mut self.profiles {
            if !profile.has_build_dir() {
                profile.build_dir = build_dir.join(&profile.name);
            }
        }
    }

    /// Check the invariants the orchestration layer depends on.
    fn validate(&self) -> Result<(), ProjectError> {
        let mut seen = HashSet::new();
        for profile in &self.profiles {
            profile::validate_name(&profile.name).map_err(ProjectError::Invalid)?;
            if !seen.insert(profile.name.as_str()) {
                return Err(ProjectError::Invalid(format!(
                    "profile `{}` is declared more than once",
                    profile.name
                )));
            }
        }

        self.check_build_dir()?;

        for kind in TargetKind::ALL {
            let mut names = HashSet::new();
            for target in self.collection(kind) {
                if !names.insert(target.name.as_str()) {
                    return Err(ProjectError::Invalid(format!(
                        "{} `{}` is declared more than once",
                        kind, target.name
                    )));
                }
                if let Some(profile) = target.artifacts.keys().find(|p| !seen.contains(p.as_str())) {
                    return Err(ProjectError::Invalid(format!(
                        "{} `{}` has an artifact for undeclared profile `{}`",
                        kind, target.name, profile
                    )));
                }
            }
        }

        Ok(())
    }

    /// The build directory is removed wholesale by `clean --nuke`, so it may
    /// not be the project root or one of its ancestors.
    fn check_build_dir(&self) -> Result<(), ProjectError> {
        let contains_root = match &self.root {
            Some(root) => is_inside(
                &normalize_path(root),
                &normalize_path(&absolutize(&self.build_dir, root)),
            ),
            // Not anchored yet: the path is relative to the project root.
            None => {
                let build_dir = normalize_path(&self.build_dir);
                build_dir.is_relative()
                    && !matches!(build_dir.components().next(), Some(Component::Normal(_)))
            }
        };

        if contains_root {
            return Err(ProjectError::Invalid(format!(
                "build directory `{}` contains the project root",
                self.build_dir.display()
            )));
        }
        Ok(())
    }

    /// Record where the project came from and make all paths absolute.
    pub fn set_origin(&mut self, root: &Path, build_script: &Path) -> Result<(), ProjectError> {
        self.build_dir = absolutize(&self.build_dir, root);
        for profile in &mut self.profiles {
            profile.build_dir = absolutize(&profile.build_dir, root);
        }
        for kind in TargetKind::ALL {
            for target in self.collection_mut(kind) {
                for path in target.artifacts.values_mut() {
                    *path = absolutize(path, root);
                }
            }
        }
        for header in &mut self.public_headers {
            *header = absolutize(header, root);
        }

        self.root = Some(root.to_path_buf());
        self.build_script = Some(absolutize(build_script, root));
        self.check_build_dir()
    }

    /// API version the description was written with.
    pub fn api_version(&self) -> u32 {
        self.api_version
    }

    /// Project root, if recorded.
    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    /// Build script that generated this description, if recorded.
    pub fn build_script(&self) -> Option<&Path> {
        self.build_script.as_deref()
    }

    /// Build output directory.
    pub fn build_dir(&self) -> &Path {
        &self.build_dir
    }

    /// Declared profiles in declaration order.
    pub fn profiles(&self) -> &[Profile] {
        &self.profiles
    }

    /// Declared profile names in declaration order.
    pub fn profile_names(&self) -> Vec<&str> {
        self.profiles.iter().map(|p| p.name.as_str()).collect()
    }

    /// Look up a declared profile.
    pub fn profile(&self, name: &str) -> Option<&Profile> {
        self.profiles.iter().find(|p| p.name == name)
    }

    /// Targets of one kind, in declaration order.
    pub fn collection(&self, kind: TargetKind) -> &[Target] {
        match kind {
            TargetKind::Library => &self.libraries,
            TargetKind::Executable => &self.executables,
            TargetKind::Test => &self.tests,
        }
    }

    fn collection_mut(&mut self, kind: TargetKind) -> &mut Vec<Target> {
        match kind {
            TargetKind::Library => &mut self.libraries,
            TargetKind::Executable => &mut self.executables,
            TargetKind::Test => &mut self.tests,
        }
    }

    /// All targets: libraries, then executables, then tests.
    pub fn all_targets(&self) -> impl Iterator<Item = &Target> {
        TargetKind::ALL
            .into_iter()
            .flat_map(move |kind| self.collection(kind).iter())
    }

    /// Test targets.
    pub fn test_targets(&self) -> &[Target] {
        &self.tests
    }

    /// Check if a library or executable has this name.
    pub fn contains(&self, name: &str) -> bool {
        [TargetKind::Library, TargetKind::Executable]
            .into_iter()
            .any(|kind| self.collection(kind).iter().any(|t| t.name == name))
    }

    /// Public headers.
    pub fn public_headers(&self) -> &[PathBuf] {
        &self.public_headers
    }

    fn require_profile(&self, name: &str) -> Result<&Profile, ProjectError> {
        self.profile(name)
            .ok_or_else(|| ProjectError::UnknownProfile(name.to_string()))
    }

    /// Prepare the build tree for the given targets and profiles.
    pub fn configure(&self, targets: &[&Target], profile_names: &[String]) -> Result<(), ProjectError> {
        ensure_dir(&self.build_dir)?;
        for name in profile_names {
            let profile = self.require_profile(name)?;
            ensure_dir(&profile.build_dir)?;
        }

        tracing::debug!(
            "configured {} target(s) for profiles {:?}",
            targets.len(),
            profile_names
        );
        Ok(())
    }

    /// Build the given targets under each profile.
    pub fn build(&self, targets: &[&Target], profile_names: &[String]) -> Result<(), ProjectError> {
        let start = Instant::now();
        let mut paths = Vec::new();

        for name in profile_names {
            let profile = self.require_profile(name)?;
            ensure_dir(&profile.build_dir)?;

            for target in targets {
                match target.artifact(name) {
                    Some(path) => {
                        tracing::trace!("{} ({}) -> {}", target, name, path.display());
                        paths.push(path);
                    }
                    None => tracing::debug!(
                        "skipping {} for profile {}: no artifact declared",
                        target,
                        name
                    ),
                }
            }
        }

        if paths.is_empty() {
            tracing::debug!("nothing to build");
            return Ok(());
        }

        let backend = self.backend.as_ref().ok_or(ProjectError::NoBackend)?;
        let mut process = ProcessBuilder::new(&backend.program)
            .args(&backend.args)
            .args(&paths);
        if let Some(root) = &self.root {
            process = process.cwd(root);
        }

        let output = process.exec()?;
        if !output.status.success() {
            return Err(ProjectError::BuildFailed {
                command: process.display_command(),
                status: describe_status(&output.status),
                output: format_output(&output),
            });
        }

        tracing::info!(
            "built {} target(s) for {} profile(s) in {}",
            targets.len(),
            profile_names.len(),
            format_duration(start.elapsed())
        );
        Ok(())
    }

    fn existing_artifact(&self, target: &Target, profile: &str) -> Result<PathBuf, ProjectError> {
        match target.artifact(profile) {
            Some(path) if path.exists() => Ok(path.to_path_buf()),
            Some(path) => Err(ProjectError::MissingArtifact {
                target: target.name.clone(),
                profile: profile.to_string(),
                path: path.to_path_buf(),
            }),
            None => Err(ProjectError::MissingArtifact {
                target: target.name.clone(),
                profile: profile.to_string(),
                path: self.require_profile(profile)?.build_dir.join(&target.name),
            }),
        }
    }

    /// Build and run an executable under each profile.
    ///
    /// Profiles the target declares no artifact for are skipped; it is an
    /// error only if none of the requested profiles produce one.
    pub fn run(&self, target: &Target, profile_names: &[String]) -> Result<(), ProjectError> {
        let profiles: Vec<String> = profile_names
            .iter()
            .filter(|name| {
                let declared = target.artifact(name).is_some();
                if !declared {
                    tracing::debug!("not running {} for profile {}: no artifact declared", target, name);
                }
                declared
            })
            .cloned()
            .collect();

        if profiles.is_empty() {
            return Err(ProjectError::NoArtifact {
                target: target.name.clone(),
                profiles: profile_names.to_vec(),
            });
        }

        self.build(&[target], &profiles)?;

        for name in &profiles {
            let path = self.existing_artifact(target, name)?;
            let status = ProcessBuilder::new(&path).status()?;
            if !status.success() {
                return Err(ProjectError::RunFailed {
                    target: target.name.clone(),
                    profile: name.clone(),
                    status: describe_status(&status),
                });
            }
        }
        Ok(())
    }

    /// Build and run tests under each profile.
    ///
    /// Every test runs even if an earlier one fails; the failures are
    /// reported together.
    pub fn run_tests(
        &self,
        targets: &[&Target],
        profile_names: &[String],
    ) -> Result<TestSummary, ProjectError> {
        self.build(targets, profile_names)?;

        let mut summary = TestSummary::default();
        let mut failed = Vec::new();

        for name in profile_names {
            for target in targets {
                if target.artifact(name).is_none() {
                    continue;
                }
                let path = self.existing_artifact(target, name)?;
                let label = format!("{} ({})", target.name, name);

                let status = ProcessBuilder::new(&path).status()?;
                if status.success() {
                    println!("test {} ... ok", label);
                    summary.passed += 1;
                } else {
                    println!("test {} ... FAILED ({})", label, describe_status(&status));
                    failed.push(label);
                }
            }
        }

        if !failed.is_empty() {
            return Err(ProjectError::TestsFailed { failed });
        }
        Ok(summary)
    }
}

fn read_project_file(path: &Path) -> Result<String, ProjectError> {
    std::fs::read_to_string(path).map_err(|source| ProjectError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Render the project's targets and public interface for `srbuild help`.
pub fn describe_targets(project: &Project, targets: &[&Target], cwd: &Path) -> String {
    let display = |path: &Path| crate::util::fs::relative_path(cwd, path).display().to_string();
    let mut out = String::new();

    let _ = writeln!(out, "{:=^60}", " Targets ");
    for target in targets {
        let internal = if target.internal { " (internal)" } else { "" };
        let _ = writeln!(out, "Target: {}{}. Available profiles:", target, internal);
        for profile in project.profile_names() {
            if let Some(path) = target.artifact(profile) {
                let _ = writeln!(out, "    Profile: {}. Path: {}", profile, display(path));
            }
        }
    }

    let _ = writeln!(out, "\n{:=^60}", " Public Interface ");
    let headers: Vec<String> = project.public_headers().iter().map(|h| display(h.as_path())).collect();
    if headers.is_empty() {
        let _ = writeln!(out, "Headers: (none)");
    } else {
        let _ = writeln!(out, "Headers: {}", headers.join(", "));
    }
    out
}
