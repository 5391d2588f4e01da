//! `gtest-build` CLI entrypoint.
//!
//! This binary discovers the googletest package reference, then builds,
//! packages and verifies it for every cell of the configured build matrix.

use camino::Utf8PathBuf;
use clap::Parser;
use gtest_packager::app::{execute, plan, write_dry_run, write_stderr_line};
use gtest_packager::cli::Cli;
use gtest_packager::config::PackagerConfig;
use gtest_packager::error::{PackagerError, Result};
use gtest_recipe::executor::SystemCommandExecutor;
use gtest_recipe::googletest::RecipeTools;
use gtest_recipe::source::{HttpDownloader, ZipExtractor};
use std::io::Write;

fn main() {
    let cli = Cli::parse();
    init_logging(&cli);
    let mut stderr = std::io::stderr();
    let run_result = run(&cli, &mut stderr);
    let exit_code = exit_code_for_run_result(run_result, &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

fn init_logging(cli: &Cli) {
    env_logger::Builder::new()
        .filter_level(cli.log_level())
        .parse_default_env()
        .format_timestamp(None)
        .init();
}

fn run(cli: &Cli, stderr: &mut dyn Write) -> Result<()> {
    let project_dir = current_dir()?;
    let config = PackagerConfig::resolve(cli.config.as_deref())?;
    let executor = SystemCommandExecutor;

    let plan = plan(cli, &config, &executor, &project_dir)?;

    // Dry-run mode: show the matrix without side effects
    if cli.dry_run {
        write_dry_run(&plan, stderr);
        return Ok(());
    }

    let downloader = HttpDownloader;
    let extractor = ZipExtractor;
    let driver = plan.local_driver(RecipeTools {
        executor: &executor,
        downloader: &downloader,
        extractor: &extractor,
    });
    execute(&plan, &driver, cli.quiet, stderr)?;
    Ok(())
}

fn current_dir() -> Result<Utf8PathBuf> {
    let cwd = std::env::current_dir()?;
    Utf8PathBuf::try_from(cwd).map_err(|e| PackagerError::NonUtf8Path {
        path: e.into_path_buf().display().to_string(),
    })
}

fn exit_code_for_run_result(result: Result<()>, stderr: &mut dyn Write) -> i32 {
    match result {
        Ok(()) => 0,
        Err(err) => {
            write_stderr_line(stderr, format!("error: {err}"));
            1
        }
    }
}
