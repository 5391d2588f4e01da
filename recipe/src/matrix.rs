//! Build matrix: the settings combinations a package is built for.
//!
//! A [`MatrixBuilder`] expands each [`BuildCell`] into a [`PackageJob`] and
//! hands it to a [`PackagingDriver`]. Cells run sequentially and the first
//! failure aborts the run.

use crate::driver::{PackageJob, PackagingDriver};
use crate::error::{RecipeError, Result};
use crate::options::PackageOptions;
use crate::reference::Reference;
use crate::settings::{Arch, BuildType, Compiler, Linkage, Os, Runtime, Settings};
use camino::Utf8PathBuf;
use log::{info, warn};
use serde::{Deserialize, Serialize};

/// One platform/compiler/build-type combination.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BuildCell {
    settings: Settings,
}

impl BuildCell {
    /// Create a cell. On MSVC the runtime is derived from `linkage` and
    /// `build_type`, so a Debug cell always carries a debug runtime.
    ///
    /// # Examples
    ///
    /// ```
    /// use gtest_recipe::matrix::BuildCell;
    /// use gtest_recipe::settings::{Arch, BuildType, Linkage, Os};
    ///
    /// let cell = BuildCell::new(
    ///     Os::Windows,
    ///     Arch::X86_64,
    ///     BuildType::Debug,
    ///     "Visual Studio",
    ///     None,
    ///     Linkage::Dynamic,
    /// );
    /// assert_eq!(cell.id(), "x86_64-debug-mdd");
    /// ```
    #[must_use]
    pub fn new(
        os: Os,
        arch: Arch,
        build_type: BuildType,
        compiler: &str,
        compiler_version: Option<&str>,
        linkage: Linkage,
    ) -> Self {
        let mut compiler = Compiler {
            name: compiler.to_owned(),
            version: compiler_version.map(str::to_owned),
            runtime: None,
        };
        if compiler.is_visual_studio() {
            compiler.runtime = Some(Runtime::for_build(linkage, build_type));
        }
        Self {
            settings: Settings {
                os,
                arch,
                compiler,
                build_type,
            },
        }
    }

    /// The cell's settings.
    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Filesystem-safe identifier, e.g. `x86_64-release-md`.
    #[must_use]
    pub fn id(&self) -> String {
        let mut id = format!(
            "{}-{}",
            self.settings.arch,
            self.settings.build_type.as_str().to_lowercase()
        );
        if let Some(runtime) = self.settings.compiler.runtime {
            id.push('-');
            id.push_str(&runtime.as_str().to_lowercase());
        }
        id
    }
}

/// Matrix description read from configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MatrixConfig {
    /// Target operating system.
    pub os: Os,
    /// Compiler toolset name.
    pub compiler: String,
    /// Compiler toolset version.
    pub compiler_version: Option<String>,
    /// Architectures to build.
    pub archs: Vec<Arch>,
    /// Build types to build for each architecture.
    pub build_types: Vec<BuildType>,
    /// C runtime linkage for MSVC cells.
    pub runtime: Linkage,
}

impl Default for MatrixConfig {
    fn default() -> Self {
        Self {
            os: Os::Windows,
            compiler: Compiler::VISUAL_STUDIO.to_owned(),
            compiler_version: None,
            archs: vec![Arch::X86_64],
            build_types: vec![BuildType::Release, BuildType::Debug],
            runtime: Linkage::Dynamic,
        }
    }
}

impl MatrixConfig {
    /// Expand into cells, architecture-major.
    #[must_use]
    pub fn cells(&self) -> Vec<BuildCell> {
        self.archs
            .iter()
            .flat_map(|&arch| {
                self.build_types.iter().map(move |&build_type| {
                    BuildCell::new(
                        self.os,
                        arch,
                        build_type,
                        &self.compiler,
                        self.compiler_version.as_deref(),
                        self.runtime,
                    )
                })
            })
            .collect()
    }
}

/// Result of one successfully packaged cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellOutcome {
    /// Identifier of the cell.
    pub cell: String,
    /// Package folder the driver produced.
    pub package_folder: Utf8PathBuf,
}

/// Summary of a completed matrix run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatrixReport {
    /// Outcomes in run order.
    pub cells: Vec<CellOutcome>,
}

/// Accumulates cells and runs them through a [`PackagingDriver`].
#[derive(Debug, Clone)]
pub struct MatrixBuilder {
    reference: Reference,
    options: PackageOptions,
    cells: Vec<BuildCell>,
}

impl MatrixBuilder {
    /// Start a matrix for `reference`, published under `user`/`channel`.
    #[must_use]
    pub fn new(reference: &Reference, user: &str, channel: &str) -> Self {
        Self {
            reference: reference.with_owner(user, channel),
            options: PackageOptions::default(),
            cells: Vec::new(),
        }
    }

    /// Use `options` for every cell.
    #[must_use]
    pub fn with_options(mut self, options: PackageOptions) -> Self {
        self.options = options;
        self
    }

    /// Append one cell.
    pub fn add(&mut self, cell: BuildCell) -> &mut Self {
        self.cells.push(cell);
        self
    }

    /// Append every cell of `config`.
    pub fn add_all(&mut self, config: &MatrixConfig) -> &mut Self {
        self.cells.extend(config.cells());
        self
    }

    /// The reference every job publishes.
    #[must_use]
    pub fn reference(&self) -> &Reference {
        &self.reference
    }

    /// Cells queued so far.
    #[must_use]
    pub fn cells(&self) -> &[BuildCell] {
        &self.cells
    }

    /// The job that would be handed to the driver for `cell`.
    #[must_use]
    pub fn job_for(&self, cell: &BuildCell) -> PackageJob {
        PackageJob {
            reference: self.reference.clone(),
            cell: cell.clone(),
            options: self.options,
            version: self.reference.version().to_owned(),
        }
    }

    /// Package every cell in order.
    ///
    /// # Errors
    ///
    /// Returns [`RecipeError::CellFailed`] for the first cell whose
    /// packaging fails; later cells are not attempted.
    pub fn run(&self, driver: &dyn PackagingDriver) -> Result<MatrixReport> {
        if self.cells.is_empty() {
            warn!("build matrix for {} is empty", self.reference);
        }
        let mut report = MatrixReport::default();
        for cell in &self.cells {
            let id = cell.id();
            info!("packaging {} [{id}]", self.reference);
            let package_folder =
                driver
                    .package(&self.job_for(cell))
                    .map_err(|source| RecipeError::CellFailed {
                        cell: id.clone(),
                        source: Box::new(source),
                    })?;
            report.cells.push(CellOutcome {
                cell: id,
                package_folder,
            });
        }
        Ok(report)
    }
}
