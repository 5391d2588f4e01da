//! Artifact staging into the package layout.
//!
//! Files are selected with glob patterns relative to a source root and copied
//! into a destination folder, either flattened or keeping their relative
//! path. Staging is purely additive: existing destination files are
//! overwritten and nothing is ever removed, so staging the same tree twice
//! leaves the same set of files.

use crate::error::{RecipeError, Result};
use camino::{Utf8Path, Utf8PathBuf};
use glob::Pattern;
use log::debug;
use std::fs;

/// One copy instruction of a package step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CopyRule {
    /// File-name pattern, e.g. `*.so*`.
    pub pattern: &'static str,
    /// Destination folder relative to the package root.
    pub dest: &'static str,
    /// Keep the path relative to the source root instead of flattening.
    pub keep_path: bool,
}

impl CopyRule {
    /// A rule that flattens matches into `dest`.
    #[must_use]
    pub const fn flat(pattern: &'static str, dest: &'static str) -> Self {
        Self {
            pattern,
            dest,
            keep_path: false,
        }
    }

    /// A rule that keeps each match's relative path under `dest`.
    #[must_use]
    pub const fn keeping_path(pattern: &'static str, dest: &'static str) -> Self {
        Self {
            pattern,
            dest,
            keep_path: true,
        }
    }

    /// Apply the rule from `src_root` into `package_root`.
    ///
    /// # Errors
    ///
    /// See [`copy_matching`].
    pub fn apply(&self, src_root: &Utf8Path, package_root: &Utf8Path) -> Result<Vec<Utf8PathBuf>> {
        copy_matching(
            src_root,
            self.pattern,
            &package_root.join(self.dest),
            self.keep_path,
        )
    }
}

/// Copy every file below `src_root` whose name matches `pattern` into
/// `dest_root`.
///
/// Returns the destination paths written. A missing `src_root` matches
/// nothing.
///
/// # Errors
///
/// Returns [`RecipeError::StagingFailed`] if the pattern is invalid or a file
/// cannot be copied, and [`RecipeError::NonUtf8Path`] for non-UTF-8 matches.
///
/// # Examples
///
/// ```no_run
/// use camino::Utf8Path;
/// use gtest_recipe::stager::copy_matching;
///
/// let copied = copy_matching(
///     Utf8Path::new("googletest/include"),
///     "*.h",
///     Utf8Path::new("package/include"),
///     true,
/// )?;
/// # Ok::<(), gtest_recipe::error::RecipeError>(())
/// ```
pub fn copy_matching(
    src_root: &Utf8Path,
    pattern: &str,
    dest_root: &Utf8Path,
    keep_path: bool,
) -> Result<Vec<Utf8PathBuf>> {
    let full_pattern = format!("{}/**/{pattern}", Pattern::escape(src_root.as_str()));
    let entries = glob::glob(&full_pattern).map_err(|e| RecipeError::StagingFailed {
        reason: format!("invalid pattern {full_pattern}: {e}"),
    })?;

    let mut copied = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| RecipeError::StagingFailed {
            reason: format!("cannot read {}: {}", e.path().display(), e.error()),
        })?;
        let path = Utf8PathBuf::try_from(path).map_err(|e| RecipeError::NonUtf8Path {
            path: e.into_path_buf().display().to_string(),
        })?;
        if !path.is_file() {
            continue;
        }

        let dest = destination_for(&path, src_root, dest_root, keep_path)?;
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(&path, &dest).map_err(|e| RecipeError::StagingFailed {
            reason: format!("failed to copy {path} to {dest}: {e}"),
        })?;
        debug!("staged {path} -> {dest}");
        copied.push(dest);
    }

    Ok(copied)
}

fn destination_for(
    path: &Utf8Path,
    src_root: &Utf8Path,
    dest_root: &Utf8Path,
    keep_path: bool,
) -> Result<Utf8PathBuf> {
    if keep_path {
        let relative = path
            .strip_prefix(src_root)
            .map_err(|_| RecipeError::StagingFailed {
                reason: format!("{path} is outside {src_root}"),
            })?;
        return Ok(dest_root.join(relative));
    }
    let file_name = path.file_name().ok_or_else(|| RecipeError::StagingFailed {
        reason: format!("{path} has no file name"),
    })?;
    Ok(dest_root.join(file_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use tempfile::TempDir;

    fn utf8_temp() -> (TempDir, Utf8PathBuf) {
        let temp = TempDir::new().expect("temp dir");
        let path = Utf8PathBuf::try_from(temp.path().to_owned()).expect("utf-8 temp path");
        (temp, path)
    }

    fn touch(path: &Utf8Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent");
        }
        fs::write(path, path.as_str()).expect("write file");
    }

    fn listing(root: &Utf8Path) -> BTreeSet<String> {
        let pattern = format!("{}/**/*", Pattern::escape(root.as_str()));
        glob::glob(&pattern)
            .expect("valid pattern")
            .filter_map(std::result::Result::ok)
            .filter(|path| path.is_file())
            .map(|path| path.display().to_string())
            .collect()
    }

    #[test]
    fn keep_path_preserves_header_hierarchy() {
        let (_temp, root) = utf8_temp();
        let include = root.join("googletest/include");
        touch(&include.join("gtest/gtest.h"));
        touch(&include.join("gtest/internal/gtest-port.h"));
        touch(&include.join("gtest/README.md"));

        let copied = copy_matching(&include, "*.h", &root.join("pkg/include"), true)
            .expect("copy headers");

        assert_eq!(copied.len(), 2);
        assert!(root.join("pkg/include/gtest/internal/gtest-port.h").is_file());
        assert!(!root.join("pkg/include/gtest/README.md").exists());
    }

    #[test]
    fn flat_copy_collects_versioned_shared_objects() {
        let (_temp, root) = utf8_temp();
        let build = root.join("_build");
        touch(&build.join("googlemock/gtest/libgtest.so"));
        touch(&build.join("googlemock/gtest/libgtest.so.1.8.0"));
        touch(&build.join("googlemock/libgmock.a"));

        CopyRule::flat("*.so*", "lib")
            .apply(&build, &root.join("pkg"))
            .expect("copy shared objects");

        assert!(root.join("pkg/lib/libgtest.so").is_file());
        assert!(root.join("pkg/lib/libgtest.so.1.8.0").is_file());
        assert!(!root.join("pkg/lib/libgmock.a").exists());
    }

    #[test]
    fn missing_source_root_copies_nothing() {
        let (_temp, root) = utf8_temp();
        let copied = copy_matching(&root.join("absent"), "*.dll", &root.join("bin"), false)
            .expect("missing root is not an error");
        assert!(copied.is_empty());
    }

    #[test]
    fn staging_twice_yields_identical_set() {
        let (_temp, root) = utf8_temp();
        let build = root.join("_build");
        touch(&build.join("Release/gtest.lib"));
        touch(&build.join("Release/gtest.dll"));
        let package = root.join("pkg");
        let rules = [CopyRule::flat("*.lib", "lib"), CopyRule::flat("*.dll", "bin")];

        for rule in &rules {
            rule.apply(&build, &package).expect("first staging");
        }
        let first = listing(&package);
        for rule in &rules {
            rule.apply(&build, &package).expect("second staging");
        }

        assert_eq!(listing(&package), first);
        assert_eq!(first.len(), 2);
    }
}
