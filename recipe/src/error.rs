//! Error types for the googletest recipe and build matrix.
//!
//! Every failure in this crate is fatal to the run that raised it. The
//! variants exist so the CLI can print an actionable message (including the
//! diagnostic emitted by a failing external tool) before exiting.

use crate::lifecycle::RecipeStage;
use crate::source::{DownloadError, ExtractionError};
use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors that can occur while discovering, building, or packaging.
#[derive(Debug, Error)]
pub enum RecipeError {
    /// The introspection output did not contain a `PROJECT` reference line.
    #[error("no package reference found in output of `{command}`")]
    ReferenceNotFound {
        /// The command whose output was searched.
        command: String,
    },

    /// A reference string did not have the `name/version[@user/channel]` shape.
    #[error("invalid package reference {reference:?}: {reason}")]
    InvalidReference {
        /// The offending reference text.
        reference: String,
        /// Why the reference was rejected.
        reason: String,
    },

    /// An external command exited unsuccessfully.
    #[error("{step} failed: `{command}` exited with {status}\n{stderr}")]
    CommandFailed {
        /// Lifecycle step or operation that spawned the command.
        step: &'static str,
        /// The rendered command line.
        command: String,
        /// Exit status description.
        status: String,
        /// Captured standard error of the command.
        stderr: String,
    },

    /// Fetching the source archive failed.
    #[error("source download failed: {0}")]
    Download(#[from] DownloadError),

    /// Unpacking the source archive failed.
    #[error("source extraction failed: {0}")]
    Extraction(#[from] ExtractionError),

    /// Copying artifacts into the package layout failed.
    #[error("staging failed: {reason}")]
    StagingFailed {
        /// Description of the staging failure.
        reason: String,
    },

    /// A lifecycle hook was invoked out of order.
    #[error("cannot run {requested} while recipe is {current}")]
    StageOrder {
        /// Stage the recipe was in.
        current: RecipeStage,
        /// Stage the caller attempted to reach.
        requested: RecipeStage,
    },

    /// A matrix cell failed; the whole run is reported as failed.
    #[error("matrix cell {cell} failed: {source}")]
    CellFailed {
        /// Identifier of the failing cell.
        cell: String,
        /// The underlying failure.
        #[source]
        source: Box<RecipeError>,
    },

    /// The package manifest could not be written or read.
    #[error("package manifest {path}: {reason}")]
    Manifest {
        /// Path of the manifest file.
        path: Utf8PathBuf,
        /// Description of the failure.
        reason: String,
    },

    /// A filesystem path was not valid UTF-8.
    #[error("path is not valid UTF-8: {path}")]
    NonUtf8Path {
        /// Lossy rendering of the path.
        path: String,
    },

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Test stub received an unexpected or mismatched command invocation.
    #[cfg(any(test, feature = "test-support"))]
    #[error("stub mismatch: {message}")]
    StubMismatch {
        /// Description of what was expected versus what was received.
        message: String,
    },
}

/// Result type alias using [`RecipeError`].
pub type Result<T> = std::result::Result<T, RecipeError>;
