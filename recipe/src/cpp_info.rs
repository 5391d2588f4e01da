//! Consumable metadata published by a package.
//!
//! The orchestrator writes [`CppInfo`] to `cpp_info.json` in the package
//! folder once the `package_info` hook has run, and consumers read it back to
//! generate their build files.

use crate::error::{RecipeError, Result};
use camino::Utf8Path;
use serde::{Deserialize, Serialize};

/// File name of the published manifest inside a package folder.
pub const MANIFEST_FILE: &str = "cpp_info.json";

/// Include/library/binary directories, library names and defines a consumer
/// needs to link against a package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CppInfo {
    /// Header directories relative to the package root.
    pub include_dirs: Vec<String>,
    /// Library directories relative to the package root.
    pub lib_dirs: Vec<String>,
    /// Runtime binary directories relative to the package root.
    pub bin_dirs: Vec<String>,
    /// Library names to link, in link order.
    pub libs: Vec<String>,
    /// Preprocessor definitions consumers must set.
    pub defines: Vec<String>,
}

impl Default for CppInfo {
    fn default() -> Self {
        Self {
            include_dirs: vec!["include".to_owned()],
            lib_dirs: vec!["lib".to_owned()],
            bin_dirs: vec!["bin".to_owned()],
            libs: Vec::new(),
            defines: Vec::new(),
        }
    }
}

impl CppInfo {
    /// Write the manifest into `package_folder`.
    ///
    /// # Errors
    ///
    /// Returns [`RecipeError::Manifest`] if serialisation or the write fails.
    pub fn publish(&self, package_folder: &Utf8Path) -> Result<()> {
        let path = package_folder.join(MANIFEST_FILE);
        let manifest_error = |reason: String| RecipeError::Manifest {
            path: path.clone(),
            reason,
        };
        let json = serde_json::to_string_pretty(self).map_err(|e| manifest_error(e.to_string()))?;
        std::fs::write(&path, json).map_err(|e| manifest_error(e.to_string()))
    }

    /// Read the manifest published in `package_folder`.
    ///
    /// # Errors
    ///
    /// Returns [`RecipeError::Manifest`] if the file is missing or malformed.
    pub fn load(package_folder: &Utf8Path) -> Result<Self> {
        let path = package_folder.join(MANIFEST_FILE);
        let manifest_error = |reason: String| RecipeError::Manifest {
            path: path.clone(),
            reason,
        };
        let contents = std::fs::read_to_string(&path).map_err(|e| manifest_error(e.to_string()))?;
        serde_json::from_str(&contents).map_err(|e| manifest_error(e.to_string()))
    }
}
