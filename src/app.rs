//! Run planning and execution for `gtest-build`.
//!
//! Planning resolves credentials, discovers the package reference and
//! expands the configured matrix. Execution hands the plan to a packaging
//! driver and reports each packaged cell.

use crate::cli::Cli;
use crate::config::{Credentials, PackagerConfig};
use crate::error::Result;
use camino::{Utf8Path, Utf8PathBuf};
use gtest_recipe::driver::{LocalDriver, PackagingDriver};
use gtest_recipe::executor::CommandExecutor;
use gtest_recipe::googletest::RecipeTools;
use gtest_recipe::matrix::{MatrixBuilder, MatrixReport};
use gtest_recipe::reference::{Reference, discover_reference};
use gtest_recipe::test_package::find_test_package;
use log::warn;
use std::fmt::Display;
use std::io::Write;

/// Everything decided before the first build starts.
#[derive(Debug, Clone)]
pub struct RunPlan {
    /// Reference as discovered, before owner binding.
    pub reference: Reference,
    /// Resolved account, channel and package override.
    pub credentials: Credentials,
    /// Matrix with every configured cell queued.
    pub matrix: MatrixBuilder,
    /// Work directory for sources, builds and packages.
    pub work_dir: Utf8PathBuf,
    /// Consumer project, when one was found.
    pub test_package: Option<Utf8PathBuf>,
}

impl RunPlan {
    /// Create the in-process driver for this plan.
    #[must_use]
    pub fn local_driver<'a>(&self, tools: RecipeTools<'a>) -> LocalDriver<'a> {
        let driver = LocalDriver::new(&self.work_dir, tools);
        match &self.test_package {
            Some(dir) => driver.with_test_package(dir.clone()),
            None => driver,
        }
    }
}

/// Build a [`RunPlan`] for `cli` and `config`, reading credentials from the
/// process environment.
///
/// # Errors
///
/// See [`plan_with`].
pub fn plan(
    cli: &Cli,
    config: &PackagerConfig,
    executor: &dyn CommandExecutor,
    project_dir: &Utf8Path,
) -> Result<RunPlan> {
    let credentials = Credentials::resolve(cli.credential_flags(), &config.defaults)?;
    plan_for(cli, config, credentials, executor, project_dir)
}

/// Build a [`RunPlan`] for `cli` and `config`.
///
/// Relative paths are resolved against `project_dir`, where discovery also
/// runs. `lookup` reads environment variables.
///
/// # Errors
///
/// Returns an error if credentials are missing, the reference cannot be
/// discovered or parsed, or the package name override is invalid.
pub fn plan_with<F>(
    cli: &Cli,
    config: &PackagerConfig,
    executor: &dyn CommandExecutor,
    project_dir: &Utf8Path,
    lookup: F,
) -> Result<RunPlan>
where
    F: Fn(&str) -> Option<String>,
{
    let credentials = Credentials::resolve_with(cli.credential_flags(), &config.defaults, lookup)?;
    plan_for(cli, config, credentials, executor, project_dir)
}

fn plan_for(
    cli: &Cli,
    config: &PackagerConfig,
    credentials: Credentials,
    executor: &dyn CommandExecutor,
    project_dir: &Utf8Path,
) -> Result<RunPlan> {
    let discovered = match &cli.reference {
        Some(text) => text.parse::<Reference>()?,
        None => discover_reference(executor, project_dir, &config.discovery.command)?,
    };
    let reference = match &credentials.package {
        Some(name) => discovered.with_name(name),
        None => discovered,
    };

    let mut matrix = MatrixBuilder::new(&reference, &credentials.user, &credentials.channel)
        .with_options(config.options);
    matrix.add_all(&config.matrix);

    let test_package_dir = project_dir.join(&cli.test_package);
    let test_package = find_test_package(&test_package_dir);
    if test_package.is_none() {
        warn!("no consumer project in {test_package_dir}; packages will not be verified");
    }

    Ok(RunPlan {
        reference,
        credentials,
        matrix,
        work_dir: project_dir.join(&cli.work_dir),
        test_package,
    })
}

/// Describe the plan without running it.
pub fn write_dry_run(plan: &RunPlan, stderr: &mut dyn Write) {
    write_stderr_line(stderr, "Dry run - no builds will be performed");
    write_stderr_line(stderr, "");
    write_stderr_line(stderr, format!("Reference: {}", plan.matrix.reference()));
    write_stderr_line(stderr, format!("Version: {}", plan.reference.version()));
    write_stderr_line(stderr, format!("Work directory: {}", plan.work_dir));
    match &plan.test_package {
        Some(dir) => write_stderr_line(stderr, format!("Test package: {dir}")),
        None => write_stderr_line(stderr, "Test package: none"),
    }
    write_stderr_line(stderr, format!("Cells ({}):", plan.matrix.cells().len()));
    for cell in plan.matrix.cells() {
        let settings = cell
            .settings()
            .pairs()
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join(" ");
        write_stderr_line(stderr, format!("  {}: {settings}", cell.id()));
    }
}

/// Package every cell of the plan with `driver`.
///
/// # Errors
///
/// Returns the first failing cell.
pub fn execute(
    plan: &RunPlan,
    driver: &dyn PackagingDriver,
    quiet: bool,
    stderr: &mut dyn Write,
) -> Result<MatrixReport> {
    if !quiet {
        write_stderr_line(
            stderr,
            format!(
                "Packaging {} ({} cells)...",
                plan.matrix.reference(),
                plan.matrix.cells().len()
            ),
        );
    }
    let report = plan.matrix.run(driver)?;
    if !quiet {
        for outcome in &report.cells {
            write_stderr_line(
                stderr,
                format!("  {}: {}", outcome.cell, outcome.package_folder),
            );
        }
        write_stderr_line(stderr, "All cells packaged successfully.");
    }
    Ok(report)
}

/// Write a line to `stderr`, ignoring write failures.
pub fn write_stderr_line(stderr: &mut dyn Write, message: impl Display) {
    if writeln!(stderr, "{message}").is_err() {
        // Best-effort logging; ignore write failures.
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use gtest_recipe::test_utils::{ExpectedCall, StubExecutor, output_with_stdout};
    use rstest::rstest;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("gtest-build").chain(args.iter().copied()))
            .expect("valid arguments")
    }

    #[rstest]
    fn explicit_reference_skips_discovery() {
        let executor = StubExecutor::new(Vec::new());
        let plan = plan_with(
            &cli(&["--local", "--reference", "googletest/1.10.0"]),
            &PackagerConfig::default(),
            &executor,
            Utf8Path::new("/project"),
            |_| None,
        )
        .expect("plan");

        assert!(executor.calls().is_empty());
        assert_eq!(
            plan.matrix.reference().to_string(),
            "googletest/1.10.0@demo/testing"
        );
        assert_eq!(plan.work_dir, Utf8PathBuf::from("/project/.packager"));
    }

    #[rstest]
    fn package_override_renames_reference() {
        let executor = StubExecutor::new(vec![ExpectedCall::new(
            "conan",
            &["info"],
            Ok(output_with_stdout("googletest/1.8.0@PROJECT\n")),
        )]);
        let plan = plan_with(
            &cli(&["-u", "acme", "-c", "stable"]),
            &PackagerConfig::default(),
            &executor,
            Utf8Path::new("/project"),
            |name| (name == "CONAN_PACKAGE").then(|| "gtest".to_owned()),
        )
        .expect("plan");

        assert_eq!(plan.matrix.reference().to_string(), "gtest/1.8.0@acme/stable");
        executor.assert_finished();
    }

    #[rstest]
    fn renamed_package_is_the_one_the_consumer_requires() {
        let executor = StubExecutor::new(Vec::new());
        let plan = plan_with(
            &cli(&["--local", "--reference", "googletest/1.8.0"]),
            &PackagerConfig::default(),
            &executor,
            Utf8Path::new("/project"),
            |name| (name == "CONAN_PACKAGE").then(|| "gtest".to_owned()),
        )
        .expect("plan");
        let cell = plan.matrix.cells().first().expect("configured cell");

        let job = plan.matrix.job_for(cell);
        let required = job.consumer_requirement().expect("valid requirement");

        assert_eq!(&required, plan.matrix.reference());
        assert_eq!(required.to_string(), "gtest/1.8.0@demo/testing");
    }

    #[rstest]
    fn dry_run_lists_cells() {
        let executor = StubExecutor::new(Vec::new());
        let plan = plan_with(
            &cli(&["--local", "--reference", "googletest/1.8.0"]),
            &PackagerConfig::default(),
            &executor,
            Utf8Path::new("/project"),
            |_| None,
        )
        .expect("plan");
        let mut stderr = Vec::new();

        write_dry_run(&plan, &mut stderr);

        let text = String::from_utf8(stderr).expect("utf-8 output");
        assert!(text.contains("Reference: googletest/1.8.0@demo/testing"));
        assert!(text.contains("x86_64-release-md:"));
        assert!(text.contains("compiler.runtime=MDd"));
    }
}
