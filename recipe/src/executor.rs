//! External command execution.
//!
//! Every interaction with CMake, the dependency manager, or the consumer
//! binary goes through [`CommandExecutor`] so tests can script the exact
//! invocations without spawning processes.

use crate::error::{RecipeError, Result};
use camino::Utf8Path;
use log::debug;
use std::process::{Command, Output};

/// Abstraction for running external commands.
pub trait CommandExecutor {
    /// Runs `cmd` with `args` inside `cwd` and returns the captured output.
    ///
    /// # Errors
    ///
    /// Returns any I/O errors encountered while spawning or running the command.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use camino::Utf8Path;
    /// use gtest_recipe::executor::{CommandExecutor, SystemCommandExecutor};
    ///
    /// let executor = SystemCommandExecutor;
    /// let output = executor.run("cmake", &["--version"], Utf8Path::new("."))?;
    /// assert!(output.status.success());
    /// # Ok::<(), gtest_recipe::error::RecipeError>(())
    /// ```
    fn run(&self, cmd: &str, args: &[&str], cwd: &Utf8Path) -> Result<Output>;
}

/// Executes commands on the host system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCommandExecutor;

impl CommandExecutor for SystemCommandExecutor {
    fn run(&self, cmd: &str, args: &[&str], cwd: &Utf8Path) -> Result<Output> {
        debug!("running `{}` in {cwd}", render_command(cmd, args));
        Command::new(cmd)
            .args(args)
            .current_dir(cwd.as_std_path())
            .output()
            .map_err(RecipeError::from)
    }
}

/// Runs a command and converts a non-zero exit into [`RecipeError::CommandFailed`].
///
/// The captured stdout is returned so callers can parse it.
///
/// # Errors
///
/// Returns an error if the command cannot be spawned or exits unsuccessfully.
pub fn run_checked(
    executor: &dyn CommandExecutor,
    step: &'static str,
    cmd: &str,
    args: &[&str],
    cwd: &Utf8Path,
) -> Result<String> {
    let output = executor.run(cmd, args, cwd)?;
    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(RecipeError::CommandFailed {
            step,
            command: render_command(cmd, args),
            status: output.status.to_string(),
            stderr: stderr.trim().to_owned(),
        });
    }

    if !stdout.is_empty() {
        debug!("{step} output:\n{}", stdout.trim_end());
    }
    Ok(stdout)
}

/// Render a command and its arguments as a single display string.
#[must_use]
pub fn render_command(cmd: &str, args: &[&str]) -> String {
    std::iter::once(cmd)
        .chain(args.iter().copied())
        .collect::<Vec<_>>()
        .join(" ")
}
