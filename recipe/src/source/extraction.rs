//! Zip extraction for upstream source archives.
//!
//! Entries are validated with [`zip::read::ZipFile::enclosed_name`] so an
//! archive cannot write outside the destination directory.

use camino::Utf8Path;
use std::fs;
use std::io::BufReader;

/// Trait for extracting source archives, enabling test mocking.
#[cfg_attr(test, mockall::automock)]
pub trait ArchiveExtractor {
    /// Extract the archive at `archive_path` into `dest_dir`.
    ///
    /// Returns the relative paths of the files that were extracted.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError::PathTraversal`] if any entry escapes the
    /// destination, [`ExtractionError::EmptyArchive`] if no files are found,
    /// [`ExtractionError::Archive`] if the archive is malformed, and
    /// [`ExtractionError::Io`] on I/O failures.
    fn extract(&self, archive_path: &Utf8Path, dest_dir: &Utf8Path)
    -> Result<Vec<String>, ExtractionError>;
}

/// Errors arising from archive extraction.
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    /// I/O error during extraction.
    #[error("extraction I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The archive could not be read as a zip file.
    #[error("malformed archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// A path in the archive attempts to traverse outside the destination.
    #[error("path traversal detected: {path}")]
    PathTraversal {
        /// The offending entry name.
        path: String,
    },

    /// The archive contains no files.
    #[error("archive contains no files")]
    EmptyArchive,
}

/// Default extractor using the `zip` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZipExtractor;

impl ArchiveExtractor for ZipExtractor {
    fn extract(
        &self,
        archive_path: &Utf8Path,
        dest_dir: &Utf8Path,
    ) -> Result<Vec<String>, ExtractionError> {
        let file = fs::File::open(archive_path)?;
        let mut archive = zip::ZipArchive::new(BufReader::new(file))?;
        let mut extracted = Vec::new();

        for index in 0..archive.len() {
            let mut entry = archive.by_index(index)?;
            let relative = entry
                .enclosed_name()
                .ok_or_else(|| ExtractionError::PathTraversal {
                    path: entry.name().to_owned(),
                })?;
            let dest_path = dest_dir.as_std_path().join(&relative);

            if entry.is_dir() {
                fs::create_dir_all(&dest_path)?;
                continue;
            }

            if let Some(parent) = dest_path.parent() {
                fs::create_dir_all(parent)?;
            }
            let mut outfile = fs::File::create(&dest_path)?;
            std::io::copy(&mut entry, &mut outfile)?;

            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                if let Some(mode) = entry.unix_mode() {
                    fs::set_permissions(&dest_path, fs::Permissions::from_mode(mode))?;
                }
            }

            extracted.push(relative.to_string_lossy().into_owned());
        }

        if extracted.is_empty() {
            return Err(ExtractionError::EmptyArchive);
        }

        Ok(extracted)
    }
}
