//! Recipe lifecycle: the hook traits and the runner that sequences them.
//!
//! A package recipe moves through a fixed sequence of stages and never goes
//! back:
//!
//! ```text
//! Declared -> SourceAcquired -> Built -> Packaged -> InfoPublished
//! ```
//!
//! Recipes only implement the hooks; [`LifecycleRunner`] owns the ordering
//! and publishes the consumable metadata once the last hook has run.

use crate::cpp_info::CppInfo;
use crate::error::{RecipeError, Result};
use camino::{Utf8Path, Utf8PathBuf};
use log::info;
use std::fmt;

/// Position of a recipe in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RecipeStage {
    /// Declared with its settings and options; nothing has run.
    Declared,
    /// Upstream sources are unpacked.
    SourceAcquired,
    /// The build tree holds compiled libraries.
    Built,
    /// Headers and libraries are staged into the package layout.
    Packaged,
    /// Consumable metadata has been published.
    InfoPublished,
}

impl RecipeStage {
    /// The stage that follows this one, if any.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Declared => Some(Self::SourceAcquired),
            Self::SourceAcquired => Some(Self::Built),
            Self::Built => Some(Self::Packaged),
            Self::Packaged => Some(Self::InfoPublished),
            Self::InfoPublished => None,
        }
    }
}

impl fmt::Display for RecipeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Declared => "declared",
            Self::SourceAcquired => "source acquired",
            Self::Built => "built",
            Self::Packaged => "packaged",
            Self::InfoPublished => "info published",
        };
        f.write_str(label)
    }
}

/// Hooks of a package recipe.
///
/// Implementations perform one step each and leave sequencing to
/// [`LifecycleRunner`].
#[cfg_attr(test, mockall::automock)]
pub trait Recipe {
    /// Acquire the upstream sources.
    ///
    /// # Errors
    ///
    /// Returns an error if the sources cannot be fetched or unpacked.
    fn source(&self) -> Result<()>;

    /// Configure and compile the sources.
    ///
    /// # Errors
    ///
    /// Returns an error if the build tool exits unsuccessfully.
    fn build(&self) -> Result<()>;

    /// Stage headers and libraries into the package folder.
    ///
    /// # Errors
    ///
    /// Returns an error if any artifact cannot be copied.
    fn package(&self) -> Result<()>;

    /// Describe how consumers link against the package.
    fn package_info(&self) -> CppInfo;
}

/// Hooks of a consumer project that verifies a built package.
#[cfg_attr(test, mockall::automock)]
pub trait TestRecipe {
    /// Configure and compile the consumer against the package.
    ///
    /// # Errors
    ///
    /// Returns an error if the build tool exits unsuccessfully.
    fn build(&self) -> Result<()>;

    /// Copy the package's runtime libraries next to the consumer binary.
    ///
    /// # Errors
    ///
    /// Returns an error if a library cannot be copied.
    fn imports(&self) -> Result<()>;

    /// Run the consumer binary.
    ///
    /// # Errors
    ///
    /// Returns an error unless the binary exits with status zero.
    fn test(&self) -> Result<()>;
}

/// Drives a [`Recipe`] through its stages in order.
pub struct LifecycleRunner<'a, R: Recipe + ?Sized> {
    recipe: &'a R,
    package_folder: Utf8PathBuf,
    stage: RecipeStage,
}

impl<'a, R: Recipe + ?Sized> LifecycleRunner<'a, R> {
    /// Start a lifecycle for `recipe`, publishing into `package_folder`.
    #[must_use]
    pub fn new(recipe: &'a R, package_folder: &Utf8Path) -> Self {
        Self {
            recipe,
            package_folder: package_folder.to_owned(),
            stage: RecipeStage::Declared,
        }
    }

    /// Current stage.
    #[must_use]
    pub const fn stage(&self) -> RecipeStage {
        self.stage
    }

    /// Run the `source` hook.
    ///
    /// # Errors
    ///
    /// Returns [`RecipeError::StageOrder`] unless the recipe is
    /// [`RecipeStage::Declared`], or the hook's own error.
    pub fn source(&mut self) -> Result<()> {
        self.advance(RecipeStage::SourceAcquired)?;
        self.recipe.source()?;
        self.complete(RecipeStage::SourceAcquired);
        Ok(())
    }

    /// Run the `build` hook.
    ///
    /// # Errors
    ///
    /// Returns [`RecipeError::StageOrder`] unless the sources were acquired,
    /// or the hook's own error.
    pub fn build(&mut self) -> Result<()> {
        self.advance(RecipeStage::Built)?;
        self.recipe.build()?;
        self.complete(RecipeStage::Built);
        Ok(())
    }

    /// Run the `package` hook.
    ///
    /// # Errors
    ///
    /// Returns [`RecipeError::StageOrder`] unless the recipe was built, or
    /// the hook's own error.
    pub fn package(&mut self) -> Result<()> {
        self.advance(RecipeStage::Packaged)?;
        std::fs::create_dir_all(&self.package_folder)?;
        self.recipe.package()?;
        self.complete(RecipeStage::Packaged);
        Ok(())
    }

    /// Run the `package_info` hook and publish its result as
    /// [`crate::cpp_info::MANIFEST_FILE`] in the package folder.
    ///
    /// # Errors
    ///
    /// Returns [`RecipeError::StageOrder`] unless the recipe was packaged,
    /// or [`RecipeError::Manifest`] if the manifest cannot be written.
    pub fn publish_info(&mut self) -> Result<CppInfo> {
        self.advance(RecipeStage::InfoPublished)?;
        let info = self.recipe.package_info();
        info.publish(&self.package_folder)?;
        self.complete(RecipeStage::InfoPublished);
        Ok(info)
    }

    /// Run every remaining hook in order.
    ///
    /// # Errors
    ///
    /// Returns the first hook failure.
    pub fn run_all(&mut self) -> Result<CppInfo> {
        self.source()?;
        self.build()?;
        self.package()?;
        self.publish_info()
    }

    fn advance(&self, requested: RecipeStage) -> Result<()> {
        if self.stage.next() == Some(requested) {
            return Ok(());
        }
        Err(RecipeError::StageOrder {
            current: self.stage,
            requested,
        })
    }

    fn complete(&mut self, stage: RecipeStage) {
        info!("recipe {stage}");
        self.stage = stage;
    }
}

/// Run a consumer project's hooks: build, import runtime libraries, test.
///
/// # Errors
///
/// Returns the first hook failure.
pub fn run_test_recipe(recipe: &dyn TestRecipe) -> Result<()> {
    recipe.build()?;
    recipe.imports()?;
    recipe.test()
}
