//! Utility functions for chega-check
//! This module provides command execution with timeout and executable lookup.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use wait_timeout::ChildExt;

/// Timeout for `--version` probes (2 seconds)
pub const VERSION_COMMAND_TIMEOUT: Duration = Duration::from_secs(2);

/// Short timeout for quick commands (5 seconds)
pub const SHORT_COMMAND_TIMEOUT: Duration = Duration::from_secs(5);

/// Long timeout for slower commands such as `docker-compose config` (10 seconds)
pub const LONG_COMMAND_TIMEOUT: Duration = Duration::from_secs(10);

/// Captured output of a finished command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn new(code: i32, stdout: &str) -> Self {
        Self {
            code: Some(code),
            stdout: stdout.to_string(),
            stderr: String::new(),
        }
    }
}

/// Result of running a command with timeout
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandResult {
    /// Command completed successfully with output
    Success(CommandOutput),
    /// Command exited with a non-zero status
    Failed(CommandOutput),
    /// Command timed out and was killed
    TimedOut,
    /// Command could not be started
    SpawnError(String),
}

impl CommandResult {
    /// Returns true if the command succeeded
    pub fn is_success(&self) -> bool {
        matches!(self, CommandResult::Success(_))
    }

    /// Get the output if the command completed (success or failure)
    pub fn output(&self) -> Option<&CommandOutput> {
        match self {
            CommandResult::Success(o) | CommandResult::Failed(o) => Some(o),
            _ => None,
        }
    }

    /// Get stdout if the command succeeded
    pub fn success_stdout(&self) -> Option<&str> {
        match self {
            CommandResult::Success(o) => Some(o.stdout.as_str()),
            _ => None,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            CommandResult::Success(_) => "success",
            CommandResult::Failed(_) => "failed",
            CommandResult::TimedOut => "timed out",
            CommandResult::SpawnError(_) => "spawn error",
        }
    }
}

/// Seam between the checks and the operating system.
///
/// Checks only talk to subprocesses through this trait, which lets tests
/// script tool availability and command output.
pub trait CommandRunner {
    /// Run `program args...` in `cwd` (or the current directory) with a timeout.
    fn run(&self, program: &str, args: &[&str], cwd: Option<&Path>, timeout: Duration)
        -> CommandResult;

    /// Find `program` on `PATH`.
    fn locate(&self, program: &str) -> Option<PathBuf>;
}

/// Runs real processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(
        &self,
        program: &str,
        args: &[&str],
        cwd: Option<&Path>,
        timeout: Duration,
    ) -> CommandResult {
        run_command_with_timeout(program, args, cwd, timeout)
    }

    fn locate(&self, program: &str) -> Option<PathBuf> {
        which::which(program).ok()
    }
}

/// Run a command with a timeout
///
/// # Arguments
/// * `cmd` - The command to run
/// * `args` - Arguments to pass to the command
/// * `cwd` - Working directory, `None` for the current one
/// * `timeout` - Maximum time to wait for the command
///
/// # Returns
/// A `CommandResult` indicating success, failure, timeout, or spawn error
pub fn run_command_with_timeout(
    cmd: &str,
    args: &[&str],
    cwd: Option<&Path>,
    timeout: Duration,
) -> CommandResult {
    tracing::debug!(command = cmd, ?args, ?timeout, "spawning");

    let mut command = Command::new(cmd);
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    if let Some(dir) = cwd {
        command.current_dir(dir);
    }

    let mut child = match command.spawn() {
        Ok(c) => c,
        Err(e) => {
            return CommandResult::SpawnError(format!("Failed to start '{}': {}", cmd, e))
        }
    };

    // Drain both pipes while waiting so a chatty child never blocks on a full pipe
    let stdout_reader = drain(child.stdout.take());
    let stderr_reader = drain(child.stderr.take());

    let result = match child.wait_timeout(timeout) {
        Ok(Some(status)) => {
            let output = CommandOutput {
                code: status.code(),
                stdout: collect(stdout_reader),
                stderr: collect(stderr_reader),
            };
            if status.success() {
                CommandResult::Success(output)
            } else {
                CommandResult::Failed(output)
            }
        }
        Ok(None) => {
            // Timeout - kill the process and reap it. Readers are left detached:
            // a grandchild may still hold the pipes open.
            let _ = child.kill();
            let _ = child.wait();
            tracing::warn!(command = cmd, ?timeout, "command timed out");
            CommandResult::TimedOut
        }
        Err(e) => {
            let _ = child.kill();
            let _ = child.wait();
            CommandResult::SpawnError(format!("Failed to wait for '{}': {}", cmd, e))
        }
    };

    tracing::debug!(command = cmd, outcome = result.label(), "finished");
    result
}

/// Read a child pipe to the end on its own thread
fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Option<JoinHandle<Vec<u8>>> {
    pipe.map(|mut pipe| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = pipe.read_to_end(&mut buf);
            buf
        })
    })
}

fn collect(reader: Option<JoinHandle<Vec<u8>>>) -> String {
    reader
        .and_then(|handle| handle.join().ok())
        .map(|buf| String::from_utf8_lossy(&buf).into_owned())
        .unwrap_or_default()
}

/// First line of `text`, trimmed and cut to at most `max` characters.
pub fn first_line(text: &str, max: usize) -> Option<String> {
    let line = text.lines().next()?.trim();
    if line.is_empty() {
        return None;
    }
    Some(line.chars().take(max).collect())
}

/// Count the non-blank lines of command output.
pub fn count_lines(text: &str) -> usize {
    text.lines().filter(|l| !l.trim().is_empty()).count()
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_command_success() {
        #[cfg(windows)]
        let result = run_command_with_timeout("cmd", &["/c", "echo", "hello"], None, SHORT_COMMAND_TIMEOUT);
        #[cfg(not(windows))]
        let result = run_command_with_timeout("echo", &["hello"], None, SHORT_COMMAND_TIMEOUT);

        assert!(result.is_success());
        assert!(result.success_stdout().unwrap().contains("hello"));
    }

    #[test]
    fn test_run_command_spawn_error() {
        let result = run_command_with_timeout(
            "nonexistent_command_xyz_123",
            &[],
            None,
            SHORT_COMMAND_TIMEOUT,
        );

        assert!(matches!(result, CommandResult::SpawnError(_)));
        assert!(result.output().is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_run_command_non_zero_exit() {
        let result = run_command_with_timeout("false", &[], None, SHORT_COMMAND_TIMEOUT);
        assert!(matches!(result, CommandResult::Failed(_)));
        assert!(result.success_stdout().is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_run_command_large_output_completes() {
        let result = run_command_with_timeout(
            "sh",
            &["-c", "head -c 200000 /dev/zero | tr '\\0' 'a'; echo done >&2"],
            None,
            SHORT_COMMAND_TIMEOUT,
        );

        assert!(result.is_success(), "got {:?}", result.label());
        let output = result.output().unwrap();
        assert_eq!(output.stdout.len(), 200_000);
        assert_eq!(output.stderr.trim(), "done");
    }

    #[cfg(unix)]
    #[test]
    fn test_run_command_times_out() {
        let result =
            run_command_with_timeout("sleep", &["5"], None, Duration::from_millis(200));
        assert_eq!(result, CommandResult::TimedOut);
    }

    #[test]
    fn test_first_line_truncates() {
        assert_eq!(first_line("v20.11.0\nextra", 50), Some("v20.11.0".to_string()));
        assert_eq!(first_line("abcdef", 3), Some("abc".to_string()));
        assert_eq!(first_line("", 10), None);
        assert_eq!(first_line("   \nsecond", 10), None);
    }

    #[test]
    fn test_count_lines_skips_blank() {
        assert_eq!(count_lines("a1b2\n\nc3d4\n"), 2);
        assert_eq!(count_lines(""), 0);
    }
}
