//! Source acquisition for the googletest recipe.
//!
//! The upstream release archive is downloaded once into a shared source
//! folder, unpacked, and removed. A completion marker lets later matrix cells
//! reuse the unpacked tree instead of fetching it again.

pub mod download;
pub mod extraction;

pub use download::{ArchiveDownloader, DownloadError, HttpDownloader};
pub use extraction::{ArchiveExtractor, ExtractionError, ZipExtractor};

use crate::error::Result;
use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, info};
use std::fs;

/// Base URL of the upstream repository.
pub const UPSTREAM_REPOSITORY: &str = "https://github.com/google/googletest";

/// File name of the release archive for `version`.
#[must_use]
pub fn archive_name(version: &str) -> String {
    format!("release-{version}.zip")
}

/// Download URL of the release archive for `version`.
///
/// # Examples
///
/// ```
/// use gtest_recipe::source::archive_url;
///
/// assert_eq!(
///     archive_url("1.8.0"),
///     "https://github.com/google/googletest/archive/release-1.8.0.zip"
/// );
/// ```
#[must_use]
pub fn archive_url(version: &str) -> String {
    format!("{UPSTREAM_REPOSITORY}/archive/{}", archive_name(version))
}

/// Name of the top-level directory inside the release archive.
#[must_use]
pub fn source_dir_name(version: &str) -> String {
    format!("googletest-release-{version}")
}

fn marker_path(source_folder: &Utf8Path, version: &str) -> Utf8PathBuf {
    source_folder.join(format!(".{}.complete", source_dir_name(version)))
}

/// Make the unpacked sources for `version` available under `source_folder`.
///
/// Returns the root of the unpacked tree. The archive is deleted once it has
/// been extracted.
///
/// # Errors
///
/// Returns [`crate::error::RecipeError::Download`] or
/// [`crate::error::RecipeError::Extraction`] when fetching or unpacking
/// fails, and [`crate::error::RecipeError::Io`] for filesystem errors.
pub fn acquire_source(
    downloader: &dyn ArchiveDownloader,
    extractor: &dyn ArchiveExtractor,
    version: &str,
    source_folder: &Utf8Path,
) -> Result<Utf8PathBuf> {
    let source_root = source_folder.join(source_dir_name(version));
    let marker = marker_path(source_folder, version);
    if marker.is_file() && source_root.is_dir() {
        info!("reusing sources at {source_root}");
        return Ok(source_root);
    }

    fs::create_dir_all(source_folder)?;
    let url = archive_url(version);
    let archive = source_folder.join(archive_name(version));

    info!("downloading {url}");
    downloader.download(&url, &archive)?;

    let files = extractor.extract(&archive, source_folder)?;
    debug!("extracted {} files from {archive}", files.len());

    fs::remove_file(&archive)?;
    fs::write(&marker, version)?;
    Ok(source_root)
}
