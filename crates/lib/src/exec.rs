//! Execution layer: run an external program and capture its exit code and output.
//! No shell is used; arguments are passed as a list so parameters are never interpreted.
//!
//! The dispatcher only sees the [`CommandRunner`] trait, so tests can substitute a recorder.

use std::process::Command;

/// Captured result of one external process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// stdout and stderr joined by a newline, skipping empty parts.
    pub fn diagnostics(&self) -> String {
        let mut msg = self.stdout.trim_end().to_string();
        let stderr = self.stderr.trim_end();
        if !stderr.is_empty() {
            if !msg.is_empty() {
                msg.push('\n');
            }
            msg.push_str(stderr);
        }
        msg
    }
}

/// Runs `argv[0]` with `argv[1..]` and blocks until it exits.
pub trait CommandRunner: Send + Sync {
    fn run(&self, argv: &[String]) -> std::io::Result<CommandOutput>;
}

/// Runs commands on the host with [`std::process::Command`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, argv: &[String]) -> std::io::Result<CommandOutput> {
        let (program, args) = argv.split_first().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "empty command line")
        })?;
        let output = Command::new(program).args(args).output()?;
        Ok(CommandOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
