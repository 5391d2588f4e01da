//! Shared test utilities for the recipe crate.

use crate::error::{RecipeError, Result};
use crate::executor::CommandExecutor;
use camino::{Utf8Path, Utf8PathBuf};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::process::{ExitStatus, Output};

/// Creates an `ExitStatus` from an exit code (Unix implementation).
#[cfg(unix)]
#[must_use]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::unix::process::ExitStatusExt;

    ExitStatus::from_raw(code << 8)
}

/// Creates an `ExitStatus` from an exit code (Windows implementation).
#[cfg(windows)]
#[must_use]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::windows::process::ExitStatusExt;

    ExitStatus::from_raw(code as u32)
}

/// Creates a successful command `Output` with empty stdout and stderr.
#[must_use]
pub fn success_output() -> Output {
    output_with_stdout("")
}

/// Creates a successful command `Output` with the given stdout.
#[must_use]
pub fn output_with_stdout(stdout: &str) -> Output {
    Output {
        status: exit_status(0),
        stdout: stdout.as_bytes().to_vec(),
        stderr: Vec::new(),
    }
}

/// Creates a failed command `Output` with the given stderr message.
#[must_use]
pub fn failure_output(stderr: &str) -> Output {
    Output {
        status: exit_status(1),
        stdout: Vec::new(),
        stderr: stderr.as_bytes().to_vec(),
    }
}

/// Represents an expected command invocation for testing.
#[derive(Debug)]
pub struct ExpectedCall {
    /// The command to execute (e.g., "cmake").
    pub cmd: String,
    /// The arguments to pass to the command.
    pub args: Vec<String>,
    /// The result to return when this command is invoked.
    pub result: Result<Output>,
}

impl ExpectedCall {
    /// Expect `cmd` with `args`, answering with `result`.
    #[must_use]
    pub fn new<S: AsRef<str>>(cmd: impl Into<String>, args: &[S], result: Result<Output>) -> Self {
        Self {
            cmd: cmd.into(),
            args: args.iter().map(|arg| arg.as_ref().to_owned()).collect(),
            result,
        }
    }

    /// Expect `cmd` with `args` and answer with a successful, silent output.
    #[must_use]
    pub fn succeeding<S: AsRef<str>>(cmd: impl Into<String>, args: &[S]) -> Self {
        Self::new(cmd, args, Ok(success_output()))
    }
}

/// A command invocation observed by [`StubExecutor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    /// The command that was run.
    pub cmd: String,
    /// The arguments it received.
    pub args: Vec<String>,
    /// The working directory it ran in.
    pub cwd: Utf8PathBuf,
}

/// A scripted implementation of `CommandExecutor` for testing.
///
/// Expected invocations are consumed in order. A call that does not match
/// the next expectation yields [`RecipeError::StubMismatch`].
#[derive(Debug)]
pub struct StubExecutor {
    expected: RefCell<VecDeque<ExpectedCall>>,
    recorded: RefCell<Vec<RecordedCall>>,
}

impl StubExecutor {
    /// Creates a new `StubExecutor` with the given expected calls.
    #[must_use]
    pub fn new(expected: Vec<ExpectedCall>) -> Self {
        Self {
            expected: RefCell::new(expected.into()),
            recorded: RefCell::new(Vec::new()),
        }
    }

    /// Returns every invocation observed so far.
    #[must_use]
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.recorded.borrow().clone()
    }

    /// Asserts that all expected command invocations have been consumed.
    ///
    /// # Panics
    ///
    /// Panics if there are remaining expected calls that were not invoked.
    pub fn assert_finished(&self) {
        assert!(
            self.expected.borrow().is_empty(),
            "expected no further command invocations, {} remaining",
            self.expected.borrow().len()
        );
    }
}

impl CommandExecutor for StubExecutor {
    fn run(&self, cmd: &str, args: &[&str], cwd: &Utf8Path) -> Result<Output> {
        self.recorded.borrow_mut().push(RecordedCall {
            cmd: cmd.to_owned(),
            args: args.iter().map(|&arg| arg.to_owned()).collect(),
            cwd: cwd.to_owned(),
        });

        let Some(call) = self.expected.borrow_mut().pop_front() else {
            return Err(RecipeError::StubMismatch {
                message: format!("unexpected invocation of {cmd} {args:?}"),
            });
        };

        if call.cmd != cmd || call.args != args {
            return Err(RecipeError::StubMismatch {
                message: format!(
                    "expected {} {:?}, got {cmd} {args:?}",
                    call.cmd, call.args
                ),
            });
        }

        call.result
    }
}
