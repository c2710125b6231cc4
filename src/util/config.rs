//! Configuration file support for srbuild.
//!
//! srbuild reads two configuration file locations:
//! - Global: `<user config dir>/srbuild/config.toml` - User-wide defaults
//! - Project: `.srbuild/config.toml` - Project-specific overrides
//!
//! Project config takes precedence over global config, and command-line
//! flags take precedence over both.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::util::shell::ColorChoice;

/// Default build script, relative to the working directory.
pub const DEFAULT_BUILD_SCRIPT: &str = "build.py";

/// Default build output directory, relative to the working directory.
pub const DEFAULT_BUILD_DIR: &str = "build";

/// File name of the serialized project inside the build directory.
pub const PROJECT_FILE_NAME: &str = "project.srbuild";

/// srbuild configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Configure settings
    pub configure: ConfigureConfig,

    /// Build settings
    pub build: BuildConfig,

    /// Installation settings
    pub install: InstallConfig,

    /// Terminal settings
    pub term: TermConfig,
}

/// Settings for running the build script.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigureConfig {
    /// Build script used when `--build-script` is not given
    pub build_script: Option<PathBuf>,

    /// Interpreter (with optional arguments) used to run the build script
    pub interpreter: Option<String>,
}

/// Build-related configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Build output directory; the project file lives inside it
    pub dir: Option<PathBuf>,
}

/// Default installation directories.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InstallConfig {
    /// Directory for public headers
    pub headers: Option<PathBuf>,

    /// Directory for libraries
    pub libraries: Option<PathBuf>,

    /// Directory for executables
    pub executables: Option<PathBuf>,
}

/// Terminal output configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TermConfig {
    /// Color output: "auto", "always" or "never"
    pub color: Option<String>,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {:#}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        if other.configure.build_script.is_some() {
            self.configure.build_script = other.configure.build_script;
        }
        if other.configure.interpreter.is_some() {
            self.configure.interpreter = other.configure.interpreter;
        }

        if other.build.dir.is_some() {
            self.build.dir = other.build.dir;
        }

        if other.install.headers.is_some() {
            self.install.headers = other.install.headers;
        }
        if other.install.libraries.is_some() {
            self.install.libraries = other.install.libraries;
        }
        if other.install.executables.is_some() {
            self.install.executables = other.install.executables;
        }

        if other.term.color.is_some() {
            self.term.color = other.term.color;
        }
    }

    /// Parse the color choice, falling back to auto-detection.
    pub fn color(&self) -> ColorChoice {
        match self.term.color.as_deref().map(str::parse::<ColorChoice>) {
            Some(Ok(choice)) => choice,
            Some(Err(e)) => {
                tracing::warn!("{}", e);
                ColorChoice::Auto
            }
            None => ColorChoice::Auto,
        }
    }

    /// The build script to run when none is given on the command line.
    pub fn build_script(&self) -> PathBuf {
        self.configure
            .build_script
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_BUILD_SCRIPT))
    }

    /// The build output directory.
    pub fn build_dir(&self) -> PathBuf {
        self.build
            .dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_BUILD_DIR))
    }

    /// Installation directory for headers.
    pub fn header_install_dir(&self) -> PathBuf {
        self.install
            .headers
            .clone()
            .unwrap_or_else(|| install_prefix().join("include"))
    }

    /// Installation directory for libraries.
    pub fn library_install_dir(&self) -> PathBuf {
        self.install
            .libraries
            .clone()
            .unwrap_or_else(|| install_prefix().join("lib"))
    }

    /// Installation directory for executables.
    pub fn executable_install_dir(&self) -> PathBuf {
        self.install
            .executables
            .clone()
            .unwrap_or_else(|| install_prefix().join("bin"))
    }
}

#[cfg(windows)]
fn install_prefix() -> PathBuf {
    std::env::var_os("ProgramFiles")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("C:\\Program Files"))
}

#[cfg(not(windows))]
fn install_prefix() -> PathBuf {
    PathBuf::from("/usr/local")
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.srbuild/config.toml)
/// 2. Global config (<user config dir>/srbuild/config.toml)
/// 3. Defaults
pub fn load_config(global_path: Option<&Path>, project_path: &Path) -> Config {
    let mut config = Config::default();

    if let Some(global_path) = global_path {
        if global_path.exists() {
            config.merge(Config::load_or_default(global_path));
        }
    }

    if project_path.exists() {
        config.merge(Config::load_or_default(project_path));
    }

    config
}

/// Get the global srbuild config directory.
pub fn global_config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("org", "srbuild", "srbuild")
        .map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the project config path (.srbuild/config.toml).
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(".srbuild").join("config.toml")
}
