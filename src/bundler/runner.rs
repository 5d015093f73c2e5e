//! External command execution.
//!
//! Packagers describe the command they need as a [`ShellCommand`] and hand
//! it to an injected [`CommandRunner`]. The runner decides how privilege
//! elevation is applied, so the program and arguments a packager builds are
//! identical with or without `sudo`.

use crate::bundler::{Error, Result};
use async_trait::async_trait;
use std::{
    ffi::OsString,
    fmt,
    io::Write,
    path::{Path, PathBuf},
    process::Stdio,
};
use tokio::{io::AsyncReadExt, process::Command};

/// Privilege elevation wrapper used by [`SystemRunner`].
pub const ELEVATION_PROGRAM: &str = "sudo";

/// A command to run.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ShellCommand {
    program: PathBuf,
    args: Vec<OsString>,
    elevated: bool,
}

impl ShellCommand {
    /// Command running `program` with no arguments.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            elevated: false,
        }
    }

    /// Append one argument.
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Request privilege elevation.
    pub fn elevated(mut self, elevated: bool) -> Self {
        self.elevated = elevated;
        self
    }

    /// Program to execute.
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Arguments, excluding the program.
    pub fn get_args(&self) -> &[OsString] {
        &self.args
    }

    /// Whether elevation was requested.
    pub fn is_elevated(&self) -> bool {
        self.elevated
    }
}

impl fmt::Display for ShellCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.elevated {
            write!(f, "{ELEVATION_PROGRAM} ")?;
        }
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

/// Result of a finished command.
#[derive(Clone, Debug, Default)]
pub struct CommandOutput {
    /// Exit code, `None` when killed by a signal.
    pub code: Option<i32>,
    /// Whether the command exited successfully.
    pub success: bool,
    /// stdout and stderr, interleaved in arrival order.
    pub output: String,
}

/// Executes [`ShellCommand`]s.
///
/// Implementations must forward every chunk of output to `output` as soon as
/// it is read and return the combined output once the command exits.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `command` to completion.
    async fn run(
        &self,
        command: &ShellCommand,
        output: &mut (dyn Write + Send),
    ) -> Result<CommandOutput>;
}

/// Runs commands as child processes of this process.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemRunner;

impl SystemRunner {
    fn build_command(command: &ShellCommand) -> Command {
        let mut cmd = if command.is_elevated() {
            let mut cmd = Command::new(ELEVATION_PROGRAM);
            cmd.arg(command.program());
            cmd
        } else {
            Command::new(command.program())
        };
        cmd.args(command.get_args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(
        &self,
        command: &ShellCommand,
        output: &mut (dyn Write + Send),
    ) -> Result<CommandOutput> {
        let failed = |error: std::io::Error| Error::CommandFailed {
            command: command.to_string(),
            error,
        };

        log::debug!("Running: {command}");
        let mut child = Self::build_command(command).spawn().map_err(failed)?;
        let (Some(mut stdout), Some(mut stderr)) = (child.stdout.take(), child.stderr.take())
        else {
            return Err(Error::GenericError(format!(
                "{command}: output pipes were not captured"
            )));
        };

        let mut stdout_buf = vec![0u8; 8192];
        let mut stderr_buf = vec![0u8; 8192];
        let mut captured = Vec::new();
        let mut stdout_done = false;
        let mut stderr_done = false;

        while !(stdout_done && stderr_done) {
            let (from_stdout, read) = tokio::select! {
                read = stdout.read(&mut stdout_buf), if !stdout_done => (true, read),
                read = stderr.read(&mut stderr_buf), if !stderr_done => (false, read),
            };
            let n = read.map_err(failed)?;
            if n == 0 {
                if from_stdout {
                    stdout_done = true;
                } else {
                    stderr_done = true;
                }
                continue;
            }
            let chunk = if from_stdout {
                &stdout_buf[..n]
            } else {
                &stderr_buf[..n]
            };
            captured.extend_from_slice(chunk);
            output.write_all(chunk).map_err(failed)?;
        }

        let status = child.wait().await.map_err(failed)?;
        Ok(CommandOutput {
            code: status.code(),
            success: status.success(),
            output: String::from_utf8_lossy(&captured).into_owned(),
        })
    }
}

/// Run `command` and fail with [`Error::ToolFailed`] on a non-zero exit.
pub async fn invoke_tool(
    runner: &dyn CommandRunner,
    command: &ShellCommand,
    output: &mut (dyn Write + Send),
) -> Result<CommandOutput> {
    let result = runner.run(command, output).await?;
    if !result.success {
        return Err(Error::ToolFailed {
            command: command.to_string(),
            code: result.code,
            output: result.output,
        });
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_with_and_without_elevation() {
        let cmd = ShellCommand::new("/usr/sbin/mkinstallp").args(["-d", "/tmp/s"]);
        assert_eq!(cmd.to_string(), "/usr/sbin/mkinstallp -d /tmp/s");

        let elevated = cmd.clone().elevated(true);
        assert_eq!(elevated.to_string(), "sudo /usr/sbin/mkinstallp -d /tmp/s");
        assert_eq!(elevated.program(), cmd.program());
        assert_eq!(elevated.get_args(), cmd.get_args());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_system_runner_streams_both_pipes() {
        let cmd = ShellCommand::new("/bin/sh").args(["-c", "echo out; echo err 1>&2"]);
        let mut sink = Vec::new();
        let result = SystemRunner.run(&cmd, &mut sink).await.unwrap();

        assert!(result.success);
        assert_eq!(result.code, Some(0));
        assert!(result.output.contains("out\n"));
        assert!(result.output.contains("err\n"));
        assert_eq!(sink.len(), result.output.len());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_invoke_tool_reports_failure_output() {
        let cmd = ShellCommand::new("/bin/sh").args(["-c", "echo broken; exit 3"]);
        let mut sink = Vec::new();
        let err = invoke_tool(&SystemRunner, &cmd, &mut sink).await.unwrap_err();
        match err {
            Error::ToolFailed { code, output, .. } => {
                assert_eq!(code, Some(3));
                assert_eq!(output, "broken\n");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_missing_program_is_command_failed() {
        let cmd = ShellCommand::new("/nonexistent/definitely-not-here");
        let mut sink = Vec::new();
        let err = SystemRunner.run(&cmd, &mut sink).await.unwrap_err();
        assert!(matches!(err, Error::CommandFailed { .. }));
    }
}
