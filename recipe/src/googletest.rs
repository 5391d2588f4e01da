//! The googletest package recipe.
//!
//! [`GoogleTestRecipe`] implements the [`Recipe`] hooks: fetch the upstream
//! release, build it with CMake in `_build`, stage headers and libraries,
//! and describe the result for consumers.

use crate::cmake::{BuildFlags, CMAKE, CMake};
use crate::cpp_info::CppInfo;
use crate::error::Result;
use crate::executor::{CommandExecutor, run_checked};
use crate::lifecycle::Recipe;
use crate::options::PackageOptions;
use crate::settings::{Os, Settings};
use crate::source::{ArchiveDownloader, ArchiveExtractor, acquire_source, source_dir_name};
use crate::stager::CopyRule;
use camino::{Utf8Path, Utf8PathBuf};
use log::{info, warn};
use std::fs;
use std::io::ErrorKind;

/// Package name of the recipe.
pub const PACKAGE_NAME: &str = "googletest";

/// Name of the CMake binary directory inside the build folder.
pub const BUILD_SUBDIR: &str = "_build";

/// Define consumers need when linking the shared libraries.
pub const SHARED_DEFINE: &str = "GTEST_LINKED_AS_SHARED_LIBRARY=1";

const LIBRARY_RULES: [CopyRule; 5] = [
    CopyRule::flat("*.a", "lib"),
    CopyRule::flat("*.lib", "lib"),
    CopyRule::flat("*.dll", "bin"),
    CopyRule::flat("*.so*", "lib"),
    CopyRule::flat("*.dylib*", "lib"),
];

/// Folders a recipe works in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeLayout {
    /// Where the upstream archive is unpacked. May be shared between cells.
    pub source_folder: Utf8PathBuf,
    /// Per-cell build folder; CMake runs in its `_build` subdirectory.
    pub build_folder: Utf8PathBuf,
    /// Per-cell package folder receiving `include/`, `lib/` and `bin/`.
    pub package_folder: Utf8PathBuf,
}

/// External tools a recipe drives.
#[derive(Clone, Copy)]
pub struct RecipeTools<'a> {
    /// Runs CMake and other commands.
    pub executor: &'a dyn CommandExecutor,
    /// Fetches the upstream archive.
    pub downloader: &'a dyn ArchiveDownloader,
    /// Unpacks the upstream archive.
    pub extractor: &'a dyn ArchiveExtractor,
}

/// Recipe building one googletest configuration.
pub struct GoogleTestRecipe<'a> {
    version: String,
    settings: Settings,
    options: PackageOptions,
    layout: RecipeLayout,
    tools: RecipeTools<'a>,
}

impl<'a> GoogleTestRecipe<'a> {
    /// Declare a recipe for `version` with the given settings and options.
    #[must_use]
    pub fn new(
        version: &str,
        settings: Settings,
        options: PackageOptions,
        layout: RecipeLayout,
        tools: RecipeTools<'a>,
    ) -> Self {
        Self {
            version: version.to_owned(),
            settings,
            options,
            layout,
            tools,
        }
    }

    /// Root of the unpacked upstream tree.
    #[must_use]
    pub fn source_root(&self) -> Utf8PathBuf {
        self.layout.source_folder.join(source_dir_name(&self.version))
    }

    /// CMake binary directory.
    #[must_use]
    pub fn build_dir(&self) -> Utf8PathBuf {
        self.layout.build_folder.join(BUILD_SUBDIR)
    }

    fn header_roots(&self) -> Vec<Utf8PathBuf> {
        let source_root = self.source_root();
        let mut roots = vec![source_root.join("googletest").join("include")];
        if self.options.build_gmock {
            roots.push(source_root.join("googlemock").join("include"));
        }
        roots
    }
}

impl Recipe for GoogleTestRecipe<'_> {
    fn source(&self) -> Result<()> {
        acquire_source(
            self.tools.downloader,
            self.tools.extractor,
            &self.version,
            &self.layout.source_folder,
        )?;
        Ok(())
    }

    fn build(&self) -> Result<()> {
        let build_dir = self.build_dir();
        fs::create_dir_all(&self.layout.build_folder)?;
        ensure_build_dir(&build_dir)?;

        let cmake = CMake::new(&self.settings);
        let flags = BuildFlags::from_options(&self.options);
        let source_root = self.source_root();

        let mut configure: Vec<String> = vec![source_root.to_string()];
        configure.extend(cmake.command_line());
        configure.extend(flags.as_slice().iter().cloned());
        info!("configuring googletest {} with {flags}", self.version);
        run_checked(
            self.tools.executor,
            "configure",
            CMAKE,
            &as_strs(&configure),
            &build_dir,
        )?;

        let mut build: Vec<String> = vec!["--build".to_owned(), ".".to_owned()];
        build.extend(cmake.build_config());
        run_checked(self.tools.executor, "build", CMAKE, &as_strs(&build), &build_dir)?;
        Ok(())
    }

    fn package(&self) -> Result<()> {
        let package = &self.layout.package_folder;
        let mut staged = 0;
        for root in self.header_roots() {
            staged += CopyRule::keeping_path("*.h", "include")
                .apply(&root, package)?
                .len();
        }
        let build_dir = self.build_dir();
        for rule in &LIBRARY_RULES {
            staged += rule.apply(&build_dir, package)?.len();
        }
        info!("staged {staged} files into {package}");
        Ok(())
    }

    fn package_info(&self) -> CppInfo {
        let mut libs = vec!["gtest".to_owned(), "gtest_main".to_owned()];
        if self.options.build_gmock {
            libs.push("gmock".to_owned());
        }
        if self.settings.os == Os::Linux {
            libs.push("pthread".to_owned());
        }
        let defines = if self.options.shared {
            vec![SHARED_DEFINE.to_owned()]
        } else {
            Vec::new()
        };
        CppInfo {
            libs,
            defines,
            ..CppInfo::default()
        }
    }
}

/// Create the CMake binary directory, tolerating one left by an earlier run.
pub(crate) fn ensure_build_dir(build_dir: &Utf8Path) -> Result<()> {
    match fs::create_dir(build_dir) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
            warn!("reusing existing build directory {build_dir}");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

pub(crate) fn as_strs(args: &[String]) -> Vec<&str> {
    args.iter().map(String::as_str).collect()
}
