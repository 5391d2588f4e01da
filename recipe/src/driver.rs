//! Packaging drivers: run one matrix cell from source to verified package.

use crate::error::Result;
use crate::googletest::{GoogleTestRecipe, RecipeLayout, RecipeTools};
use crate::lifecycle::{LifecycleRunner, run_test_recipe};
use crate::matrix::BuildCell;
use crate::options::PackageOptions;
use crate::reference::Reference;
use crate::test_package::{TEST_PACKAGE_NAME, TestPackageLayout, TestPackageRecipe, requirement};
use camino::{Utf8Path, Utf8PathBuf};
use log::info;

/// Everything a driver needs to package one cell.
///
/// The version travels here explicitly instead of through the process
/// environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageJob {
    /// Reference the package is published under, including owner.
    pub reference: Reference,
    /// Settings combination to build.
    pub cell: BuildCell,
    /// Recipe options.
    pub options: PackageOptions,
    /// Upstream version to fetch and build.
    pub version: String,
}

impl PackageJob {
    /// The reference the consumer project requires for this job.
    ///
    /// It names the published package, so a renamed package is still the one
    /// being verified.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::RecipeError::InvalidReference`] if the parts do
    /// not form a valid reference.
    pub fn consumer_requirement(&self) -> Result<Reference> {
        let required = requirement(
            Some(&self.version),
            self.reference.user(),
            self.reference.channel(),
        )?;
        Ok(required.with_name(self.reference.name()))
    }
}

/// Builds and packages one [`PackageJob`].
#[cfg_attr(test, mockall::automock)]
pub trait PackagingDriver {
    /// Package `job` and return the resulting package folder.
    ///
    /// # Errors
    ///
    /// Returns the first failing lifecycle step.
    fn package(&self, job: &PackageJob) -> Result<Utf8PathBuf>;
}

/// Runs recipes in-process under a local work directory.
///
/// Layout below the work directory:
///
/// ```text
/// source/              shared unpacked sources
/// build/<cell>/        per-cell build folder
/// package/<cell>/      per-cell package folder
/// test/<cell>/         per-cell consumer build
/// ```
pub struct LocalDriver<'a> {
    work_dir: Utf8PathBuf,
    tools: RecipeTools<'a>,
    test_package: Option<Utf8PathBuf>,
}

impl<'a> LocalDriver<'a> {
    /// Create a driver rooted at `work_dir`.
    #[must_use]
    pub fn new(work_dir: &Utf8Path, tools: RecipeTools<'a>) -> Self {
        Self {
            work_dir: work_dir.to_owned(),
            tools,
            test_package: None,
        }
    }

    /// Verify each package with the consumer project in `dir`.
    #[must_use]
    pub fn with_test_package(mut self, dir: Utf8PathBuf) -> Self {
        self.test_package = Some(dir);
        self
    }

    /// Folders used for `cell`.
    #[must_use]
    pub fn layout_for(&self, cell: &BuildCell) -> RecipeLayout {
        let id = cell.id();
        RecipeLayout {
            source_folder: self.work_dir.join("source"),
            build_folder: self.work_dir.join("build").join(&id),
            package_folder: self.work_dir.join("package").join(&id),
        }
    }
}

impl PackagingDriver for LocalDriver<'_> {
    fn package(&self, job: &PackageJob) -> Result<Utf8PathBuf> {
        let layout = self.layout_for(&job.cell);
        let package_folder = layout.package_folder.clone();
        let recipe = GoogleTestRecipe::new(
            &job.version,
            job.cell.settings().clone(),
            job.options,
            layout,
            self.tools,
        );
        LifecycleRunner::new(&recipe, &package_folder).run_all()?;
        info!("packaged {} into {package_folder}", job.reference);

        if let Some(source_folder) = &self.test_package {
            let required = job.consumer_requirement()?;
            info!("verifying {required} with {TEST_PACKAGE_NAME}");
            let consumer = TestPackageRecipe::new(
                job.cell.settings().clone(),
                TestPackageLayout {
                    source_folder: source_folder.clone(),
                    build_folder: self.work_dir.join("test").join(job.cell.id()),
                    dependency_folder: package_folder.clone(),
                },
                self.tools.executor,
            );
            run_test_recipe(&consumer)?;
        }

        Ok(package_folder)
    }
}
