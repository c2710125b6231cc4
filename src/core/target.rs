//! Target definitions - what the project can build.
//!
//! A Target is a named artifact (library, executable or test) with one
//! artifact path per build profile. Targets are owned by the [`Project`]
//! and only ever borrowed by the orchestration layer.
//!
//! [`Project`]: crate::core::Project

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// The collection a target belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    /// Shared or static library
    Library,

    /// Executable binary
    Executable,

    /// Test executable, never installed
    Test,
}

impl Default for TargetKind {
    fn default() -> Self {
        TargetKind::Executable
    }
}

impl TargetKind {
    /// All kinds, in the order collections are searched.
    pub const ALL: [TargetKind; 3] = [TargetKind::Library, TargetKind::Executable, TargetKind::Test];

    /// Singular name, e.g. "library".
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetKind::Library => "library",
            TargetKind::Executable => "executable",
            TargetKind::Test => "test",
        }
    }

    /// Name of the collection holding targets of this kind, e.g. "libraries".
    pub fn collection_name(&self) -> &'static str {
        match self {
            TargetKind::Library => "libraries",
            TargetKind::Executable => "executables",
            TargetKind::Test => "tests",
        }
    }

    /// Check if targets of this kind can be installed.
    pub fn is_installable(&self) -> bool {
        matches!(self, TargetKind::Library | TargetKind::Executable)
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A buildable target with its per-profile artifacts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    /// Target name, unique within its collection
    pub name: String,

    /// Collection kind. Not serialized: the collection a target is listed
    /// under determines it.
    #[serde(skip)]
    kind: TargetKind,

    /// Internal targets are hidden from installation
    #[serde(default)]
    pub internal: bool,

    /// Profile name -> artifact path
    #[serde(default)]
    pub artifacts: BTreeMap<String, PathBuf>,
}

impl Target {
    /// Create a new target with no artifacts.
    pub fn new(name: impl Into<String>, kind: TargetKind) -> Self {
        Target {
            name: name.into(),
            kind,
            internal: kind == TargetKind::Test,
            artifacts: BTreeMap::new(),
        }
    }

    /// Create a library target.
    pub fn library(name: impl Into<String>) -> Self {
        Self::new(name, TargetKind::Library)
    }

    /// Create an executable target.
    pub fn executable(name: impl Into<String>) -> Self {
        Self::new(name, TargetKind::Executable)
    }

    /// Create a test target. Tests are always internal.
    pub fn test(name: impl Into<String>) -> Self {
        Self::new(name, TargetKind::Test)
    }

    /// Mark the target as internal.
    pub fn internal(mut self) -> Self {
        self.internal = true;
        self
    }

    /// Add the artifact produced for `profile`.
    pub fn with_artifact(mut self, profile: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.artifacts.insert(profile.into(), path.into());
        self
    }

    /// The collection kind.
    pub fn kind(&self) -> TargetKind {
        self.kind
    }

    pub(crate) fn set_kind(&mut self, kind: TargetKind) {
        self.kind = kind;
        if kind == TargetKind::Test {
            self.internal = true;
        }
    }

    /// Artifact path for a profile, if the target is built under it.
    pub fn artifact(&self, profile: &str) -> Option<&Path> {
        self.artifacts.get(profile).map(PathBuf::as_path)
    }

    /// Check if the target is visible in public listings and installs.
    pub fn is_public(&self) -> bool {
        !self.internal
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tests_are_internal() {
        assert!(Target::test("unit").internal);
        assert!(!Target::library("core").internal);
        assert!(Target::executable("tool").internal().internal);
    }

    #[test]
    fn test_set_kind_forces_internal_tests() {
        let mut target = Target::executable("smoke");
        target.set_kind(TargetKind::Test);
        assert_eq!(target.kind(), TargetKind::Test);
        assert!(!target.is_public());
    }

    #[test]
    fn test_artifact_lookup() {
        let target = Target::library("core")
            .with_artifact("debug", "build/debug/libcore.so")
            .with_artifact("release", "build/release/libcore.so");

        assert_eq!(
            target.artifact("release"),
            Some(Path::new("build/release/libcore.so"))
        );
        assert_eq!(target.artifact("profiling"), None);
    }

    #[test]
    fn test_target_display() {
        assert_eq!(Target::executable("app").to_string(), "app (executable)");
        assert_eq!(TargetKind::Library.collection_name(), "libraries");
    }

    #[test]
    fn test_kind_serde() {
        let json = serde_json::to_string(&TargetKind::Executable).unwrap();
        assert_eq!(json, "\"executable\"");
    }
}
