//! Shared test helpers: a recording command runner and isolated phonebook paths.

#![allow(dead_code)]

use mobilectl::exec::{CommandOutput, CommandRunner};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Records every argv and answers with a fixed output (or a launch error).
#[derive(Clone, Default)]
pub struct RecordingRunner {
    pub calls: Arc<Mutex<Vec<Vec<String>>>>,
    pub exit_code: i32,
    pub stderr: String,
    pub launch_error: Option<std::io::ErrorKind>,
    pub delay: Option<Duration>,
}

impl RecordingRunner {
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }
}

impl CommandRunner for RecordingRunner {
    fn run(&self, argv: &[String]) -> std::io::Result<CommandOutput> {
        self.calls.lock().unwrap().push(argv.to_vec());
        if let Some(d) = self.delay {
            std::thread::sleep(d);
        }
        if let Some(kind) = self.launch_error {
            return Err(std::io::Error::new(kind, "cannot launch"));
        }
        Ok(CommandOutput {
            exit_code: Some(self.exit_code),
            stdout: String::new(),
            stderr: self.stderr.clone(),
        })
    }
}

/// Path to a phonebook file inside a fresh temp directory (the directory is not created).
pub fn temp_phonebook() -> PathBuf {
    std::env::temp_dir()
        .join(format!("mobilectl-test-{}", uuid::Uuid::new_v4()))
        .join("phonebook.json")
}
