//! Build profiles.
//!
//! A profile is a named build configuration ("debug", "release", ...).
//! Every profile becomes a `--<name>` flag on the command line, so names
//! are restricted to what can be spelled as a long flag and must not shadow
//! the fixed options.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Long option names that profiles may not take.
pub const RESERVED_NAMES: &[&str] = &[
    "help",
    "version",
    "verbose",
    "very-verbose",
    "project-file",
    "build-script",
    "force",
    "nuke",
    "headers",
    "libraries",
    "executables",
];

/// A named build configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Profile name
    pub name: String,

    /// Output directory for this profile's artifacts. Defaults to
    /// `<build dir>/<name>` when omitted.
    #[serde(default, skip_serializing_if = "path_is_empty")]
    pub build_dir: PathBuf,
}

fn path_is_empty(path: &Path) -> bool {
    path.as_os_str().is_empty()
}

impl Profile {
    /// Create a profile whose build directory is derived later.
    pub fn new(name: impl Into<String>) -> Self {
        Profile {
            name: name.into(),
            build_dir: PathBuf::new(),
        }
    }

    /// Set the build directory.
    pub fn with_build_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.build_dir = dir.into();
        self
    }

    pub(crate) fn has_build_dir(&self) -> bool {
        !path_is_empty(&self.build_dir)
    }
}

/// Check that a profile name can be registered as a command-line flag.
pub fn validate_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("profile name is empty".to_string());
    }
    if name.starts_with('-') {
        return Err(format!("profile name `{}` may not start with '-'", name));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(format!(
            "profile name `{}` may only contain ASCII letters, digits, '-' and '_'",
            name
        ));
    }
    if RESERVED_NAMES.contains(&name) {
        return Err(format!(
            "profile name `{}` collides with a built-in option",
            name
        ));
    }
    Ok(())
}
