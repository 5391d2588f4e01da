//! googletest packaging recipe library.
//!
//! This crate discovers the package reference of a local recipe, builds
//! googletest with CMake for every cell of a build matrix, stages the
//! results into a package layout, and verifies each package with a consumer
//! project. It is used by the `gtest-build` CLI binary.
//!
//! # Modules
//!
//! - [`cmake`] - CMake command-line derivation from settings and options
//! - [`cpp_info`] - Consumable package metadata and its manifest
//! - [`driver`] - Packaging drivers running one matrix cell
//! - [`error`] - Error types for every recipe operation
//! - [`executor`] - External command execution abstraction
//! - [`generator`] - `conanbuildinfo.cmake` generation for consumers
//! - [`googletest`] - The googletest recipe hooks
//! - [`lifecycle`] - Recipe traits and stage sequencing
//! - [`matrix`] - Build matrix cells and runner
//! - [`options`] - Package options
//! - [`reference`] - Reference discovery and parsing
//! - [`settings`] - Typed build settings
//! - [`source`] - Upstream archive download and extraction
//! - [`stager`] - Glob-based artifact staging
//! - [`test_package`] - Consumer project verifying a package

pub mod cmake;
pub mod cpp_info;
pub mod driver;
pub mod error;
pub mod executor;
pub mod generator;
pub mod googletest;
pub mod lifecycle;
pub mod matrix;
pub mod options;
pub mod reference;
pub mod settings;
pub mod source;
pub mod stager;
pub mod test_package;

#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;
