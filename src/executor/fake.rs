//! Fake Executor
//!
//! Returns canned output keyed by program and subcommand, and records every
//! invocation so tests can assert on the exact argument vector.

use super::render_command;
use crate::domain::ports::CommandExecutor;
use crate::error::ExecutionError;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// A command seen by the fake executor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl RecordedCommand {
    pub fn subcommand(&self) -> Option<&str> {
        self.args.first().map(String::as_str)
    }
}

#[derive(Debug, Clone)]
enum Response {
    Output(Vec<u8>),
    Failure { status: i32, stderr: String },
    Timeout,
}

/// Executor that never spawns a process
///
/// Responses are looked up by `(program, first argument)`, then by program
/// alone. Commands without a configured response succeed with empty stdout.
#[derive(Debug, Default)]
pub struct FakeExecutor {
    responses: Mutex<HashMap<(String, Option<String>), Response>>,
    commands: Mutex<Vec<RecordedCommand>>,
}

impl FakeExecutor {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Reply to `program subcommand ...` with `stdout`
    pub fn set_output(&self, program: &str, subcommand: &str, stdout: impl Into<Vec<u8>>) {
        self.insert(program, Some(subcommand), Response::Output(stdout.into()));
    }

    /// Fail `program subcommand ...` with a non-zero exit status
    pub fn set_failure(&self, program: &str, subcommand: &str, status: i32, stderr: &str) {
        self.insert(
            program,
            Some(subcommand),
            Response::Failure {
                status,
                stderr: stderr.to_string(),
            },
        );
    }

    /// Fail every invocation of `program` with a non-zero exit status
    pub fn set_program_failure(&self, program: &str, status: i32, stderr: &str) {
        self.insert(
            program,
            None,
            Response::Failure {
                status,
                stderr: stderr.to_string(),
            },
        );
    }

    /// Make `program subcommand ...` time out
    pub fn set_timeout(&self, program: &str, subcommand: &str) {
        self.insert(program, Some(subcommand), Response::Timeout);
    }

    /// All commands seen so far, in call order
    pub fn commands(&self) -> Vec<RecordedCommand> {
        self.commands.lock().clone()
    }

    /// Forget recorded commands and configured responses
    pub fn reset(&self) {
        self.commands.lock().clear();
        self.responses.lock().clear();
    }

    fn insert(&self, program: &str, subcommand: Option<&str>, response: Response) {
        self.responses.lock().insert(
            (program.to_string(), subcommand.map(str::to_string)),
            response,
        );
    }

    fn lookup(&self, program: &str, args: &[String]) -> Option<Response> {
        let responses = self.responses.lock();
        args.first()
            .and_then(|sub| responses.get(&(program.to_string(), Some(sub.clone()))))
            .or_else(|| responses.get(&(program.to_string(), None)))
            .cloned()
    }
}

#[async_trait]
impl CommandExecutor for FakeExecutor {
    async fn output(&self, program: &str, args: &[String]) -> Result<Vec<u8>, ExecutionError> {
        self.commands.lock().push(RecordedCommand {
            program: program.to_string(),
            args: args.to_vec(),
        });

        match self.lookup(program, args) {
            None => Ok(Vec::new()),
            Some(Response::Output(stdout)) => Ok(stdout),
            Some(Response::Failure { status, stderr }) => Err(ExecutionError::Failed {
                command: render_command(program, args),
                status: Some(status),
                stderr,
            }),
            Some(Response::Timeout) => Err(ExecutionError::Timeout {
                command: render_command(program, args),
                timeout: Duration::ZERO,
            }),
        }
    }
}
