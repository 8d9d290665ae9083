//! External command execution utilities.
//!
//! Provides a Builder-based API for running external programs, plus the
//! [`CommandRunner`] seam the deploy pipeline uses to reach them.
//!
//! # Examples
//!
//! ```ignore
//! use crate::utils::exec::Cmd;
//!
//! // Inherited stdio, exit code returned as-is
//! let code = Cmd::new("ghp-import").args(["-n", "-p", "output"]).cwd(root).status()?;
//!
//! // All output discarded (availability checks)
//! let code = Cmd::new("ghp-import").arg("-h").quiet()?;
//! ```

use std::{
    ffi::{OsStr, OsString},
    fmt, io,
    path::{Path, PathBuf},
    process::{Command, ExitStatus, Stdio},
};

// ============================================================================
// Builder API
// ============================================================================

/// Command builder for external process execution.
#[derive(Debug, Clone, Default)]
pub struct Cmd {
    program: OsString,
    args: Vec<OsString>,
    cwd: Option<PathBuf>,
}

impl Cmd {
    /// Create a new command builder.
    pub fn new<S: AsRef<OsStr>>(program: S) -> Self {
        Self {
            program: program.as_ref().to_owned(),
            ..Default::default()
        }
    }

    /// Add a single argument.
    pub fn arg<S: AsRef<OsStr>>(mut self, arg: S) -> Self {
        let arg = arg.as_ref();
        if !arg.is_empty() {
            self.args.push(arg.to_owned());
        }
        self
    }

    /// Add multiple arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        for arg in args {
            let arg = arg.as_ref();
            if !arg.is_empty() {
                self.args.push(arg.to_owned());
            }
        }
        self
    }

    /// Set working directory.
    pub fn cwd<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.cwd = Some(dir.as_ref().to_owned());
        self
    }

    pub fn program(&self) -> &OsStr {
        &self.program
    }

    pub fn get_args(&self) -> &[OsString] {
        &self.args
    }

    pub fn get_cwd(&self) -> Option<&Path> {
        self.cwd.as_deref()
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        if let Some(dir) = &self.cwd {
            cmd.current_dir(dir);
        }
        cmd
    }

    /// Execute with inherited stdio and return the exit code.
    ///
    /// Only spawn failures are errors; a nonzero exit is a normal result.
    pub fn status(self) -> io::Result<i32> {
        self.command().status().map(|status| exit_code(&status))
    }

    /// Execute with all output discarded. Only spawn failures are errors.
    pub fn quiet(self) -> io::Result<i32> {
        self.command()
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|status| exit_code(&status))
    }
}

/// Shell-like rendering, used when logging the command being run.
impl fmt::Display for Cmd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", quote(&self.program.to_string_lossy()))?;
        for arg in &self.args {
            write!(f, " {}", quote(&arg.to_string_lossy()))?;
        }
        Ok(())
    }
}

fn quote(s: &str) -> String {
    if !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=:@+,".contains(c))
    {
        s.to_string()
    } else {
        format!("'{}'", s.replace('\'', r"'\''"))
    }
}

/// Map an exit status to a shell-style exit code.
///
/// Processes killed by a signal report `128 + signal` on unix.
pub fn exit_code(status: &ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    1
}

// ============================================================================
// Runner seam
// ============================================================================

/// Executes external commands on behalf of a pipeline.
pub trait CommandRunner {
    /// Check that `cmd` can be located and started. Its exit code is
    /// returned but carries no meaning for availability.
    fn run_silent(&self, cmd: Cmd) -> io::Result<i32>;

    /// Run `cmd` to completion with inherited stdio, returning its exit code.
    fn status(&self, cmd: Cmd) -> io::Result<i32>;
}

/// Runs commands as real child processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run_silent(&self, cmd: Cmd) -> io::Result<i32> {
        which::which(cmd.program()).map_err(|e| io::Error::new(io::ErrorKind::NotFound, e))?;
        cmd.quiet()
    }

    fn status(&self, cmd: Cmd) -> io::Result<i32> {
        cmd.status()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cmd_builder() {
        let cmd = Cmd::new("echo")
            .arg("hello")
            .args(["world", "!"])
            .cwd("/tmp");

        assert_eq!(cmd.program(), OsStr::new("echo"));
        assert_eq!(cmd.get_args().len(), 3);
        assert_eq!(cmd.cwd, Some(PathBuf::from("/tmp")));
    }

    #[test]
    fn test_empty_args_filtered() {
        let cmd = Cmd::new("echo").arg("").args(["a", "", "b"]);
        assert_eq!(cmd.get_args().len(), 2);
    }

    #[test]
    fn test_display_quotes_when_needed() {
        let cmd = Cmd::new("ghp-import")
            .args(["-n", "-m", "Skiff auto commit.\n\nit's done", "-b", "gh-pages"]);
        assert_eq!(
            cmd.to_string(),
            "ghp-import -n -m 'Skiff auto commit.\n\nit'\\''s done' -b gh-pages"
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_status_returns_exit_code() {
        let code = Cmd::new("sh").args(["-c", "exit 3"]).quiet().unwrap();
        assert_eq!(code, 3);
    }

    #[test]
    fn test_run_silent_missing_program() {
        let err = SystemRunner
            .run_silent(Cmd::new("skiff-definitely-not-installed").arg("-h"))
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
