//! Test support utilities shared across unit and integration tests.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::ffi::OsString;
use std::rc::Rc;

use crate::remote::{
    CommandOutput, CommandRunner, RemoteCommand, RemoteCommandOutput, RemoteError, RemoteExecutor,
};
use crate::services::{Confirmer, Decision, StopFailure};

/// Scripted process runner that returns pre-seeded outputs in FIFO order.
///
/// Used to drive [`SshExecutor`](crate::remote::SshExecutor) without
/// spawning processes.
#[derive(Clone, Debug, Default)]
pub struct ScriptedRunner {
    responses: Rc<RefCell<VecDeque<CommandOutput>>>,
    invocations: Rc<RefCell<Vec<CommandInvocation>>>,
}

/// Records a single invocation made through [`ScriptedRunner`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CommandInvocation {
    /// Program name as passed to the runner.
    pub program: String,
    /// Arguments passed to the program.
    pub args: Vec<OsString>,
}

impl CommandInvocation {
    /// Returns a shell-like command string for assertions.
    #[must_use]
    pub fn command_string(&self) -> String {
        let mut parts = Vec::with_capacity(self.args.len() + 1);
        parts.push(self.program.clone());
        parts.extend(
            self.args
                .iter()
                .map(|arg| arg.to_string_lossy().into_owned()),
        );
        parts.join(" ")
    }

    /// Last argument, which carries the remote command for `ssh`.
    #[must_use]
    pub fn last_arg(&self) -> Option<String> {
        self.args
            .last()
            .map(|arg| arg.to_string_lossy().into_owned())
    }
}

impl ScriptedRunner {
    /// Creates a new runner with no queued responses.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of all invocations recorded so far.
    #[must_use]
    pub fn invocations(&self) -> Vec<CommandInvocation> {
        self.invocations.borrow().clone()
    }

    /// Pushes a successful exit status.
    pub fn push_success(&self) {
        self.push_output(Some(0), "", "");
    }

    /// Pushes a failing exit code with stderr text.
    pub fn push_failure(&self, code: i32) {
        self.push_output(Some(code), "", "simulated failure");
    }

    /// Pushes an explicit command output response.
    pub fn push_output(
        &self,
        code: Option<i32>,
        stdout: impl Into<String>,
        stderr: impl Into<String>,
    ) {
        self.responses.borrow_mut().push_back(CommandOutput {
            code,
            stdout: stdout.into(),
            stderr: stderr.into(),
        });
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, program: &str, args: &[OsString]) -> Result<CommandOutput, RemoteError> {
        self.invocations.borrow_mut().push(CommandInvocation {
            program: program.to_owned(),
            args: args.to_vec(),
        });
        self.responses
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| RemoteError::Spawn {
                program: program.to_owned(),
                message: String::from("no scripted response available"),
            })
    }
}

/// Scripted remote executor recording every [`RemoteCommand`].
///
/// Queued responses are consumed in FIFO order; once the queue is empty,
/// commands succeed with empty output.
#[derive(Clone, Debug, Default)]
pub struct ScriptedExecutor {
    responses: Rc<RefCell<VecDeque<ScriptedResponse>>>,
    invocations: Rc<RefCell<Vec<RemoteCommand>>>,
}

/// Response queued on a [`ScriptedExecutor`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ScriptedResponse {
    /// The command ran and produced this output.
    Output(RemoteCommandOutput),
    /// The command could not be dispatched through `program`.
    SpawnFailure {
        /// Program reported as failing to start.
        program: String,
    },
}

impl ScriptedExecutor {
    /// Creates an executor with no queued responses.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of all commands executed so far.
    #[must_use]
    pub fn invocations(&self) -> Vec<RemoteCommand> {
        self.invocations.borrow().clone()
    }

    /// Command texts executed so far, in order.
    #[must_use]
    pub fn commands(&self) -> Vec<String> {
        self.invocations
            .borrow()
            .iter()
            .map(|command| command.command.clone())
            .collect()
    }

    /// Queues a successful response.
    pub fn push_success(&self) {
        self.push_output(Some(0), "", "");
    }

    /// Queues a failing exit code with stderr text.
    pub fn push_failure(&self, code: i32) {
        self.push_output(Some(code), "", "simulated failure");
    }

    /// Queues an explicit response.
    pub fn push_output(
        &self,
        exit_code: Option<i32>,
        stdout: impl Into<String>,
        stderr: impl Into<String>,
    ) {
        self.responses
            .borrow_mut()
            .push_back(ScriptedResponse::Output(RemoteCommandOutput {
                exit_code,
                stdout: stdout.into(),
                stderr: stderr.into(),
            }));
    }

    /// Queues a dispatch failure.
    pub fn push_spawn_failure(&self, program: &str) {
        self.responses
            .borrow_mut()
            .push_back(ScriptedResponse::SpawnFailure {
                program: program.to_owned(),
            });
    }
}

impl RemoteExecutor for ScriptedExecutor {
    fn execute(&self, command: &RemoteCommand) -> Result<RemoteCommandOutput, RemoteError> {
        self.invocations.borrow_mut().push(command.clone());
        match self.responses.borrow_mut().pop_front() {
            Some(ScriptedResponse::Output(output)) => Ok(output),
            Some(ScriptedResponse::SpawnFailure { program }) => Err(RemoteError::Spawn {
                program,
                message: String::from("simulated spawn failure"),
            }),
            None => Ok(RemoteCommandOutput {
                exit_code: Some(0),
                ..RemoteCommandOutput::default()
            }),
        }
    }
}

/// Scripted confirmer returning queued decisions.
///
/// Declines once the queue is empty.
#[derive(Clone, Debug, Default)]
pub struct ScriptedConfirmer {
    answers: Rc<RefCell<VecDeque<Decision>>>,
    prompts: Rc<RefCell<Vec<String>>>,
}

impl ScriptedConfirmer {
    /// Creates a confirmer with no queued decisions.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a decision.
    pub fn push(&self, decision: Decision) {
        self.answers.borrow_mut().push_back(decision);
    }

    /// Services the confirmer was asked about, in order.
    #[must_use]
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.borrow().clone()
    }
}

impl Confirmer for ScriptedConfirmer {
    fn confirm(&mut self, failure: &StopFailure<'_>) -> Decision {
        self.prompts.borrow_mut().push(failure.service.to_owned());
        self.answers
            .borrow_mut()
            .pop_front()
            .unwrap_or(Decision::Abort)
    }
}
