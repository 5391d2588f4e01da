//! Error types for the `gtest-build` driver.

use camino::Utf8PathBuf;
use gtest_recipe::error::RecipeError;
use thiserror::Error;

/// Errors that can occur while planning or running a packaging run.
#[derive(Debug, Error)]
pub enum PackagerError {
    /// A recipe, matrix, or discovery step failed.
    #[error(transparent)]
    Recipe(#[from] RecipeError),

    /// The configuration file could not be read.
    #[error("failed to read configuration {path}: {source}")]
    ConfigRead {
        /// Path of the configuration file.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid.
    #[error("invalid configuration {path}: {source}")]
    ConfigParse {
        /// Path of the configuration file.
        path: Utf8PathBuf,
        /// The TOML parser's error.
        #[source]
        source: Box<toml::de::Error>,
    },

    /// A non-local run needs a variable that is not set.
    #[error("{variable} must be set unless --local is given")]
    MissingEnvironment {
        /// Name of the missing variable.
        variable: &'static str,
    },

    /// The working directory is not valid UTF-8.
    #[error("current directory is not valid UTF-8: {path}")]
    NonUtf8Path {
        /// Lossy rendering of the path.
        path: String,
    },

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using [`PackagerError`].
pub type Result<T> = std::result::Result<T, PackagerError>;
