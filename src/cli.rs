//! CLI argument definitions for `gtest-build`.
//!
//! This module defines the command-line interface using clap. It is separated
//! from the main entrypoint to keep the binary small and focused on
//! orchestration.

use crate::config::CredentialFlags;
use camino::Utf8PathBuf;
use clap::{ArgAction, Parser};
use log::LevelFilter;

/// Build and package googletest for every cell of the build matrix.
#[derive(Parser, Debug)]
#[command(name = "gtest-build")]
#[command(version, about)]
#[command(long_about = concat!(
    "Build and package googletest for every cell of the build matrix.\n\n",
    "The package reference is discovered from the dependency manager's ",
    "introspection output (`conan info` by default), unless --reference is ",
    "given. Each matrix cell is built with CMake, staged into a package ",
    "layout, and verified with the consumer project in test_package/.\n\n",
    "Without --local, CONAN_USERNAME and CONAN_CHANNEL must be set. ",
    "CONAN_PACKAGE overrides the package name.",
))]
#[command(after_help = concat!(
    "EXAMPLES:\n",
    "  Build the configured matrix locally as demo/testing:\n",
    "    $ gtest-build --local\n\n",
    "  Publish under an explicit owner:\n",
    "    $ gtest-build -u acme -c stable\n\n",
    "  Preview the matrix without building:\n",
    "    $ gtest-build --local --dry-run\n",
))]
pub struct Cli {
    /// Local run: fall back to the configured user and channel.
    #[arg(short, long)]
    pub local: bool,

    /// Account to publish packages under [env: CONAN_USERNAME].
    #[arg(short, long, value_name = "USER")]
    pub user: Option<String>,

    /// Channel to publish packages in [env: CONAN_CHANNEL].
    #[arg(short, long, value_name = "CHANNEL")]
    pub channel: Option<String>,

    /// Package reference (`name/version`), skipping discovery.
    #[arg(long, value_name = "REF")]
    pub reference: Option<String>,

    /// Configuration file [default: packager.toml if present].
    #[arg(long, value_name = "FILE")]
    pub config: Option<Utf8PathBuf>,

    /// Directory holding sources, build trees and packages.
    #[arg(long, value_name = "DIR", default_value = ".packager")]
    pub work_dir: Utf8PathBuf,

    /// Consumer project used to verify each package.
    #[arg(long, value_name = "DIR", default_value = "test_package")]
    pub test_package: Utf8PathBuf,

    /// Show what would be built without building.
    #[arg(long)]
    pub dry_run: bool,

    /// Increase log verbosity (repeatable).
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress output.
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

impl Cli {
    /// Log level implied by `--verbose` and `--quiet`.
    #[must_use]
    pub fn log_level(&self) -> LevelFilter {
        if self.quiet {
            return LevelFilter::Error;
        }
        match self.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }

    /// Credential inputs taken from the command line.
    #[must_use]
    pub fn credential_flags(&self) -> CredentialFlags<'_> {
        CredentialFlags {
            local: self.local,
            user: self.user.as_deref(),
            channel: self.channel.as_deref(),
        }
    }
}
