//! Build-matrix driver for the googletest package recipe.
//!
//! This crate holds the `gtest-build` command-line surface: argument
//! parsing, `packager.toml` and environment configuration, and the planning
//! and reporting around [`gtest_recipe::matrix::MatrixBuilder`].
//!
//! # Modules
//!
//! - [`app`] - Run planning, dry-run output and execution
//! - [`cli`] - Command-line argument definitions
//! - [`config`] - Configuration file and credential resolution
//! - [`error`] - Error types for the driver

pub mod app;
pub mod cli;
pub mod config;
pub mod error;
