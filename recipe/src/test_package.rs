//! Consumer project that verifies a built googletest package.
//!
//! The test package compiles a small program against the staged headers and
//! libraries, copies the runtime libraries next to it and runs it. A package
//! is only considered good if that program exits with status zero.

use crate::cmake::{CMAKE, CMake};
use crate::cpp_info::CppInfo;
use crate::error::Result;
use crate::executor::{CommandExecutor, run_checked};
use crate::generator::write_build_info;
use crate::googletest::{PACKAGE_NAME, as_strs, ensure_build_dir};
use crate::lifecycle::TestRecipe;
use crate::reference::Reference;
use crate::settings::Settings;
use crate::stager::copy_matching;
use camino::{Utf8Path, Utf8PathBuf};
use log::info;

/// Name of the consumer project and its executable.
pub const TEST_PACKAGE_NAME: &str = "test_package_googletest";

/// googletest version required when the orchestrator supplies none.
pub const DEFAULT_VERSION: &str = "1.8.0";

/// Owner used when no user is configured.
pub const DEFAULT_USER: &str = "demo";

/// Channel used when no channel is configured.
pub const DEFAULT_CHANNEL: &str = "testing";

/// The googletest reference a consumer project requires.
///
/// Each part falls back to its default when absent.
///
/// # Examples
///
/// ```
/// use gtest_recipe::test_package::requirement;
///
/// let reference = requirement(None, None, Some("stable")).expect("valid reference");
/// assert_eq!(reference.to_string(), "googletest/1.8.0@demo/stable");
/// ```
///
/// # Errors
///
/// Returns [`crate::error::RecipeError::InvalidReference`] if the parts do
/// not form a valid reference.
pub fn requirement(
    version: Option<&str>,
    user: Option<&str>,
    channel: Option<&str>,
) -> Result<Reference> {
    format!(
        "{PACKAGE_NAME}/{}@{}/{}",
        version.unwrap_or(DEFAULT_VERSION),
        user.unwrap_or(DEFAULT_USER),
        channel.unwrap_or(DEFAULT_CHANNEL)
    )
    .parse()
}

/// Folders of a consumer project run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestPackageLayout {
    /// Consumer project sources (holding `CMakeLists.txt`).
    pub source_folder: Utf8PathBuf,
    /// Where the consumer is configured and built.
    pub build_folder: Utf8PathBuf,
    /// Package folder of the dependency under test.
    pub dependency_folder: Utf8PathBuf,
}

/// Consumer project recipe for one built package.
pub struct TestPackageRecipe<'a> {
    settings: Settings,
    layout: TestPackageLayout,
    executor: &'a dyn CommandExecutor,
}

impl<'a> TestPackageRecipe<'a> {
    /// Declare a consumer run for the package in `layout.dependency_folder`.
    #[must_use]
    pub fn new(
        settings: Settings,
        layout: TestPackageLayout,
        executor: &'a dyn CommandExecutor,
    ) -> Self {
        Self {
            settings,
            layout,
            executor,
        }
    }

    /// Folder the consumer's runtime files are collected in.
    #[must_use]
    pub fn bin_dir(&self) -> Utf8PathBuf {
        self.layout.build_folder.join("bin")
    }

    /// Path of the consumer executable.
    #[must_use]
    pub fn executable(&self) -> Utf8PathBuf {
        self.bin_dir()
            .join(format!("{TEST_PACKAGE_NAME}{}", std::env::consts::EXE_SUFFIX))
    }
}

impl TestRecipe for TestPackageRecipe<'_> {
    fn build(&self) -> Result<()> {
        let build_dir = &self.layout.build_folder;
        if let Some(parent) = build_dir.parent() {
            std::fs::create_dir_all(parent)?;
        }
        ensure_build_dir(build_dir)?;

        let info = CppInfo::load(&self.layout.dependency_folder)?;
        write_build_info(&info, &self.layout.dependency_folder, build_dir)?;

        let cmake = CMake::new(&self.settings);
        let mut configure = vec![self.layout.source_folder.to_string()];
        configure.extend(cmake.command_line());
        run_checked(
            self.executor,
            "test package configure",
            CMAKE,
            &as_strs(&configure),
            build_dir,
        )?;

        let mut build = vec!["--build".to_owned(), ".".to_owned()];
        build.extend(cmake.build_config());
        run_checked(
            self.executor,
            "test package build",
            CMAKE,
            &as_strs(&build),
            build_dir,
        )?;
        Ok(())
    }

    fn imports(&self) -> Result<()> {
        let dependency = &self.layout.dependency_folder;
        let bin_dir = self.bin_dir();
        let mut imported = copy_matching(&dependency.join("bin"), "*.dll", &bin_dir, false)?;
        imported.extend(copy_matching(
            &dependency.join("lib"),
            "*.dylib",
            &bin_dir,
            false,
        )?);
        info!("imported {} runtime libraries into {bin_dir}", imported.len());
        Ok(())
    }

    fn test(&self) -> Result<()> {
        let executable = self.executable();
        run_checked(
            self.executor,
            "test package run",
            executable.as_str(),
            &[],
            &self.layout.build_folder,
        )?;
        info!("{TEST_PACKAGE_NAME} passed");
        Ok(())
    }
}

/// Locate the consumer project sources, if `dir` holds one.
#[must_use]
pub fn find_test_package(dir: &Utf8Path) -> Option<Utf8PathBuf> {
    dir.join("CMakeLists.txt").is_file().then(|| dir.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RecipeError;
    use crate::settings::{Arch, BuildType, Compiler, Os};
    use crate::test_utils::{ExpectedCall, StubExecutor, failure_output};
    use rstest::{fixture, rstest};
    use std::fs;
    use tempfile::TempDir;

    struct Consumer {
        _temp: TempDir,
        layout: TestPackageLayout,
    }

    #[fixture]
    fn consumer() -> Consumer {
        let temp = TempDir::new().expect("temp dir");
        let root = Utf8PathBuf::try_from(temp.path().to_owned()).expect("utf-8 temp path");
        Consumer {
            _temp: temp,
            layout: TestPackageLayout {
                source_folder: root.join("test_package"),
                build_folder: root.join("test").join("x86_64-release"),
                dependency_folder: root.join("package"),
            },
        }
    }

    fn settings() -> Settings {
        Settings {
            os: Os::Linux,
            arch: Arch::X86_64,
            compiler: Compiler {
                name: "gcc".to_owned(),
                version: None,
                runtime: None,
            },
            build_type: BuildType::Release,
        }
    }

    fn publish_manifest(folder: &Utf8Path) {
        fs::create_dir_all(folder).expect("package folder");
        CppInfo {
            libs: vec!["gtest".to_owned()],
            ..CppInfo::default()
        }
        .publish(folder)
        .expect("publish manifest");
    }

    #[rstest]
    #[case::defaults(None, None, None, "googletest/1.8.0@demo/testing")]
    #[case::explicit(Some("1.10.0"), Some("acme"), Some("stable"), "googletest/1.10.0@acme/stable")]
    fn requirement_falls_back_to_defaults(
        #[case] version: Option<&str>,
        #[case] user: Option<&str>,
        #[case] channel: Option<&str>,
        #[case] expected: &str,
    ) {
        let reference = requirement(version, user, channel).expect("valid requirement");
        assert_eq!(reference.to_string(), expected);
    }

    #[rstest]
    fn build_writes_build_info_and_runs_cmake(consumer: Consumer) {
        let layout = &consumer.layout;
        publish_manifest(&layout.dependency_folder);
        let executor = StubExecutor::new(vec![
            ExpectedCall::succeeding(
                "cmake",
                &[
                    layout.source_folder.as_str(),
                    "-G",
                    "Unix Makefiles",
                    "-DCMAKE_BUILD_TYPE=Release",
                    "-DCONAN_COMPILER=gcc",
                    "-DCMAKE_C_FLAGS=-m64",
                    "-DCMAKE_CXX_FLAGS=-m64",
                ],
            ),
            ExpectedCall::succeeding("cmake", &["--build", "."]),
        ]);

        TestPackageRecipe::new(settings(), layout.clone(), &executor)
            .build()
            .expect("consumer build");

        executor.assert_finished();
        assert!(layout.build_folder.join("conanbuildinfo.cmake").is_file());
    }

    #[rstest]
    fn build_requires_published_manifest(consumer: Consumer) {
        let executor = StubExecutor::new(Vec::new());

        let err = TestPackageRecipe::new(settings(), consumer.layout.clone(), &executor)
            .build()
            .expect_err("no manifest published");

        assert!(matches!(err, RecipeError::Manifest { .. }));
    }

    #[rstest]
    fn imports_copy_runtime_libraries(consumer: Consumer) {
        let dependency = &consumer.layout.dependency_folder;
        fs::create_dir_all(dependency.join("bin")).expect("bin dir");
        fs::create_dir_all(dependency.join("lib")).expect("lib dir");
        fs::write(dependency.join("bin/gtest.dll"), b"dll").expect("dll");
        fs::write(dependency.join("lib/libgtest.dylib"), b"dylib").expect("dylib");
        fs::write(dependency.join("lib/libgtest.a"), b"archive").expect("archive");
        let executor = StubExecutor::new(Vec::new());
        let recipe = TestPackageRecipe::new(settings(), consumer.layout.clone(), &executor);

        recipe.imports().expect("imports");

        assert!(recipe.bin_dir().join("gtest.dll").is_file());
        assert!(recipe.bin_dir().join("libgtest.dylib").is_file());
        assert!(!recipe.bin_dir().join("libgtest.a").exists());
    }

    #[rstest]
    fn test_fails_unless_consumer_exits_zero(consumer: Consumer) {
        let executable = consumer.layout.build_folder.join("bin").join(format!(
            "{TEST_PACKAGE_NAME}{}",
            std::env::consts::EXE_SUFFIX
        ));
        let executor = StubExecutor::new(vec![ExpectedCall::new(
            executable.as_str(),
            &[] as &[&str],
            Ok(failure_output("[  FAILED  ] 1 test")),
        )]);

        let err = TestPackageRecipe::new(settings(), consumer.layout.clone(), &executor)
            .test()
            .expect_err("failing consumer");

        assert!(matches!(
            err,
            RecipeError::CommandFailed { step: "test package run", .. }
        ));
    }
}
