//! Subprocess execution utilities.

use std::collections::BTreeMap;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Output, Stdio};

use anyhow::{anyhow, Context, Result};

/// Builder for subprocess execution.
#[derive(Debug, Clone)]
pub struct ProcessBuilder {
    program: PathBuf,
    args: Vec<OsString>,
    env: BTreeMap<OsString, OsString>,
    cwd: Option<PathBuf>,
}

impl ProcessBuilder {
    /// Create a new process builder for the given program.
    pub fn new(program: impl AsRef<Path>) -> Self {
        ProcessBuilder {
            program: program.as_ref().to_path_buf(),
            args: Vec::new(),
            env: BTreeMap::new(),
            cwd: None,
        }
    }

    /// Add a single argument.
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    /// Add multiple arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|s| s.as_ref().to_os_string()));
        self
    }

    /// Set an environment variable.
    pub fn env(mut self, key: impl AsRef<OsStr>, value: impl AsRef<OsStr>) -> Self {
        self.env
            .insert(key.as_ref().to_os_string(), value.as_ref().to_os_string());
        self
    }

    /// Set the working directory.
    pub fn cwd(mut self, cwd: impl AsRef<Path>) -> Self {
        self.cwd = Some(cwd.as_ref().to_path_buf());
        self
    }

    fn build_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd.envs(&self.env);

        if let Some(ref cwd) = self.cwd {
            cmd.current_dir(cwd);
        }

        cmd
    }

    /// Execute the command with captured stdout/stderr and wait for completion.
    pub fn exec(&self) -> Result<Output> {
        let mut cmd = self.build_command();
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        tracing::debug!("executing `{}`", self.display_command());

        let child = cmd
            .spawn()
            .with_context(|| format!("failed to spawn `{}`", self.program.display()))?;

        child
            .wait_with_output()
            .with_context(|| format!("failed to wait for `{}`", self.program.display()))
    }

    /// Execute with inherited stdio and return the exit status.
    pub fn status(&self) -> Result<ExitStatus> {
        tracing::debug!("running `{}`", self.display_command());

        self.build_command()
            .status()
            .with_context(|| format!("failed to execute `{}`", self.program.display()))
    }

    /// Display the command for error messages.
    pub fn display_command(&self) -> String {
        let mut parts = vec![self.program.display().to_string()];
        parts.extend(self.args.iter().map(|arg| arg.to_string_lossy().into_owned()));
        parts.join(" ")
    }
}

/// Render captured output for a failure report.
///
/// Empty streams are omitted; if both are empty a placeholder is returned.
pub fn format_output(output: &Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);

    let mut report = String::new();
    if !stdout.trim().is_empty() {
        report.push_str("--- stdout ---\n");
        report.push_str(stdout.trim_end());
        report.push('\n');
    }
    if !stderr.trim().is_empty() {
        report.push_str("--- stderr ---\n");
        report.push_str(stderr.trim_end());
        report.push('\n');
    }
    if report.is_empty() {
        report.push_str("(no output)\n");
    }
    report
}

/// Describe how a process exited.
pub fn describe_status(status: &ExitStatus) -> String {
    match status.code() {
        Some(code) => format!("exit code {}", code),
        None => "termination by signal".to_string(),
    }
}

/// Find an executable in PATH.
pub fn find_executable(name: &str) -> Option<PathBuf> {
    which::which(name).ok()
}

/// Build a process that runs `script`, optionally through an interpreter.
///
/// `interpreter` may carry arguments (`"python3 -u"`). Without an explicit
/// interpreter, `.py` scripts run under `python3`, `.sh` scripts under
/// `sh`, and anything else is executed directly.
pub fn script_process(script: &Path, interpreter: Option<&str>) -> Result<ProcessBuilder> {
    let inferred = match script.extension().and_then(OsStr::to_str) {
        Some("py") => Some("python3"),
        Some("sh") => Some("sh"),
        _ => None,
    };

    let Some(interpreter) = interpreter.or(inferred) else {
        return Ok(ProcessBuilder::new(script));
    };

    let mut words = interpreter.split_whitespace();
    let name = words
        .next()
        .ok_or_else(|| anyhow!("interpreter for `{}` is empty", script.display()))?;
    let program = find_executable(name).ok_or_else(|| {
        anyhow!(
            "interpreter `{}` for build script `{}` was not found in PATH",
            name,
            script.display()
        )
    })?;

    Ok(ProcessBuilder::new(program).args(words).arg(script))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_command() {
        let pb = ProcessBuilder::new("ninja").args(["-C", "build", "app"]);
        assert_eq!(pb.display_command(), "ninja -C build app");
    }

    #[cfg(unix)]
    #[test]
    fn test_exec_captures_output() {
        let output = ProcessBuilder::new("sh")
            .args(["-c", "echo out; echo err >&2; exit 3"])
            .exec()
            .unwrap();

        assert_eq!(output.status.code(), Some(3));
        let report = format_output(&output);
        assert!(report.contains("--- stdout ---\nout"));
        assert!(report.contains("--- stderr ---\nerr"));
        assert_eq!(describe_status(&output.status), "exit code 3");
    }

    #[cfg(unix)]
    #[test]
    fn test_env_and_cwd() {
        let tmp = tempfile::TempDir::new().unwrap();
        let output = ProcessBuilder::new("sh")
            .args(["-c", "echo \"$SRBUILD_TEST_VAR\"; pwd"])
            .env("SRBUILD_TEST_VAR", "hello")
            .cwd(tmp.path())
            .exec()
            .unwrap();

        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.starts_with("hello\n"));
        let dir_name = tmp.path().file_name().unwrap().to_string_lossy();
        assert!(stdout.contains(dir_name.as_ref()));
    }

    #[cfg(unix)]
    #[test]
    fn test_script_process_infers_interpreter() {
        let pb = script_process(Path::new("/work/build.sh"), None).unwrap();
        let command = pb.display_command();
        assert!(command.starts_with('/'));
        assert!(command.ends_with("sh /work/build.sh"));

        let direct = script_process(Path::new("/work/configure"), None).unwrap();
        assert_eq!(direct.display_command(), "/work/configure");
    }

    #[cfg(unix)]
    #[test]
    fn test_script_process_interpreter_args() {
        let pb = script_process(Path::new("gen.py"), Some("sh -e")).unwrap();
        assert!(pb.display_command().ends_with("sh -e gen.py"));
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_arguments_pass_through() {
        use std::os::unix::ffi::{OsStrExt, OsStringExt};

        let name = OsStr::from_bytes(b"lib\xffcore.so");
        let output = ProcessBuilder::new("sh")
            .args(["-c", "printf '%s|%s' \"$1\" \"$SRBUILD_TEST_PATH\"", "sh"])
            .arg(name)
            .env("SRBUILD_TEST_PATH", name)
            .exec()
            .unwrap();

        let mut expected = name.to_os_string().into_vec();
        expected.push(b'|');
        expected.extend_from_slice(name.as_bytes());
        assert_eq!(output.stdout, expected);
    }

    #[test]
    fn test_script_process_missing_interpreter() {
        let err = script_process(Path::new("build.x"), Some("no-such-interpreter-srbuild"))
            .unwrap_err();
        assert!(err.to_string().contains("was not found in PATH"));
    }

    #[test]
    fn test_format_output_empty() {
        let output = Output {
            status: ExitStatus::default(),
            stdout: Vec::new(),
            stderr: Vec::new(),
        };
        assert_eq!(format_output(&output), "(no output)\n");
    }
}
