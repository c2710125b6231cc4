//! Global context for srbuild operations.
//!
//! Built once per invocation, right after the global flags are parsed, and
//! passed by reference from there on. It owns the merged configuration and
//! the output verbosity, neither of which changes afterwards.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::ops::install::InstallDirs;
use crate::util::config::{self, Config, PROJECT_FILE_NAME};
use crate::util::shell::{Shell, Verbosity};

/// Global context containing configuration, paths and output settings.
#[derive(Debug, Clone)]
pub struct GlobalContext {
    /// Current working directory
    cwd: PathBuf,

    /// Merged global + project configuration
    config: Config,

    /// Status output
    shell: Shell,
}

impl GlobalContext {
    /// Create a context for the current directory, loading configuration.
    pub fn new(verbosity: Verbosity) -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to get current directory")?;
        Ok(Self::with_cwd(cwd, verbosity))
    }

    /// Create a context rooted at a specific working directory.
    pub fn with_cwd(cwd: PathBuf, verbosity: Verbosity) -> Self {
        let global = config::global_config_dir().map(|dir| dir.join("config.toml"));
        let config = config::load_config(global.as_deref(), &config::project_config_path(&cwd));
        Self::with_config(cwd, config, verbosity)
    }

    /// Create a context from an already loaded configuration.
    pub fn with_config(cwd: PathBuf, config: Config, verbosity: Verbosity) -> Self {
        let shell = Shell::new(verbosity, config.color());
        GlobalContext { cwd, config, shell }
    }

    /// Get the current working directory.
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Get the merged configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get the shell for status output.
    pub fn shell(&self) -> &Shell {
        &self.shell
    }

    /// The build output directory.
    pub fn build_dir(&self) -> PathBuf {
        self.cwd.join(self.config.build_dir())
    }

    /// Where the project file lives when `--project-file` is not given.
    pub fn default_project_file(&self) -> PathBuf {
        self.build_dir().join(PROJECT_FILE_NAME)
    }

    /// The build script to run when `--build-script` is not given.
    pub fn default_build_script(&self) -> PathBuf {
        self.cwd.join(self.config.build_script())
    }

    /// Resolve a user-supplied path against the working directory.
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        crate::util::fs::absolutize(path, &self.cwd)
    }

    /// Default installation directories from configuration.
    pub fn install_dirs(&self) -> InstallDirs {
        InstallDirs {
            headers: self.config.header_install_dir(),
            libraries: self.config.library_install_dir(),
            executables: self.config.executable_install_dir(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_context_paths() {
        let tmp = TempDir::new().unwrap();
        let ctx = GlobalContext::with_config(
            tmp.path().to_path_buf(),
            Config::default(),
            Verbosity::Normal,
        );

        assert_eq!(ctx.build_dir(), tmp.path().join("build"));
        assert_eq!(
            ctx.default_project_file(),
            tmp.path().join("build").join("project.srbuild")
        );
        assert_eq!(ctx.default_build_script(), tmp.path().join("build.py"));
        assert_eq!(ctx.resolve_path(Path::new("/abs")), PathBuf::from("/abs"));
    }

    #[test]
    fn test_project_config_is_loaded() {
        let tmp = TempDir::new().unwrap();
        let config_path = config::project_config_path(tmp.path());
        std::fs::create_dir_all(config_path.parent().unwrap()).unwrap();
        std::fs::write(
            &config_path,
            "[configure]\nbuild_script = \"gen.sh\"\n[build]\ndir = \"out\"\n",
        )
        .unwrap();

        let ctx = GlobalContext::with_cwd(tmp.path().to_path_buf(), Verbosity::Verbose);
        assert_eq!(ctx.default_build_script(), tmp.path().join("gen.sh"));
        assert_eq!(ctx.default_project_file(), tmp.path().join("out/project.srbuild"));
        assert!(ctx.shell().is_verbose());
    }
}
