//! CMake invocation derived from build settings and package options.
//!
//! This module turns a [`Settings`] value into the generator and cache
//! definitions passed to `cmake`, and turns [`PackageOptions`] into the
//! googletest-specific flags of the configure step.

use crate::options::PackageOptions;
use crate::settings::{Arch, Compiler, Os, Settings};
use std::fmt;

/// The CMake executable name.
pub const CMAKE: &str = "cmake";

/// CMake invocation helper for one set of settings.
#[derive(Debug, Clone, Copy)]
pub struct CMake<'a> {
    settings: &'a Settings,
}

impl<'a> CMake<'a> {
    /// Create a helper for the given settings.
    #[must_use]
    pub const fn new(settings: &'a Settings) -> Self {
        Self { settings }
    }

    /// Whether the selected generator builds several configurations from one
    /// tree, in which case the build type is chosen at build time.
    #[must_use]
    pub fn is_multi_config(&self) -> bool {
        self.settings.compiler.is_visual_studio()
    }

    /// Name of the CMake generator for these settings.
    #[must_use]
    pub fn generator(&self) -> String {
        let compiler = &self.settings.compiler;
        if compiler.is_visual_studio() {
            return visual_studio_generator(compiler, self.settings.arch);
        }
        match self.settings.os {
            Os::Windows => "MinGW Makefiles".to_owned(),
            Os::Linux | Os::Macos => "Unix Makefiles".to_owned(),
        }
    }

    /// Arguments for the configure step, excluding the source directory.
    ///
    /// # Examples
    ///
    /// ```
    /// use gtest_recipe::cmake::CMake;
    /// use gtest_recipe::settings::{Arch, BuildType, Compiler, Os, Settings};
    ///
    /// let settings = Settings {
    ///     os: Os::Linux,
    ///     arch: Arch::X86_64,
    ///     compiler: Compiler { name: "gcc".into(), version: Some("13".into()), runtime: None },
    ///     build_type: BuildType::Debug,
    /// };
    /// let args = CMake::new(&settings).command_line();
    /// assert!(args.contains(&"-DCMAKE_BUILD_TYPE=Debug".to_owned()));
    /// ```
    #[must_use]
    pub fn command_line(&self) -> Vec<String> {
        let settings = self.settings;
        let compiler = &settings.compiler;
        let mut args = vec!["-G".to_owned(), self.generator()];

        if let Some(platform) = visual_studio_platform(compiler, settings.arch) {
            args.push("-A".to_owned());
            args.push(platform.to_owned());
        }

        if !self.is_multi_config() {
            args.push(format!("-DCMAKE_BUILD_TYPE={}", settings.build_type));
        }

        args.push(format!("-DCONAN_COMPILER={}", compiler.name));
        if let Some(version) = &compiler.version {
            args.push(format!("-DCONAN_COMPILER_VERSION={version}"));
        }

        if compiler.is_visual_studio() {
            if let Some(runtime) = compiler.runtime {
                args.push(format!("-DCONAN_LINK_RUNTIME=/{runtime}"));
            }
        } else {
            let bits = match settings.arch {
                Arch::X86 => "-m32",
                Arch::X86_64 => "-m64",
            };
            args.push(format!("-DCMAKE_C_FLAGS={bits}"));
            args.push(format!("-DCMAKE_CXX_FLAGS={bits}"));
        }

        args
    }

    /// Extra arguments for `cmake --build .`.
    ///
    /// Multi-config generators need the configuration named explicitly.
    #[must_use]
    pub fn build_config(&self) -> Vec<String> {
        if self.is_multi_config() {
            vec![
                "--config".to_owned(),
                self.settings.build_type.to_string(),
            ]
        } else {
            Vec::new()
        }
    }
}

/// Default Visual Studio version when the settings do not name one.
const DEFAULT_VS_VERSION: &str = "14";

fn visual_studio_generator(compiler: &Compiler, arch: Arch) -> String {
    let version = compiler.version.as_deref().unwrap_or(DEFAULT_VS_VERSION);
    let year = match version {
        "12" => Some("2013"),
        "14" => Some("2015"),
        "15" => Some("2017"),
        "16" => Some("2019"),
        "17" => Some("2022"),
        _ => None,
    };
    let mut generator = match year {
        Some(year) => format!("Visual Studio {version} {year}"),
        None => format!("Visual Studio {version}"),
    };
    if arch == Arch::X86_64 && !uses_platform_flag(version) {
        generator.push_str(" Win64");
    }
    generator
}

/// Visual Studio 2019 and later select the platform with `-A`.
fn uses_platform_flag(version: &str) -> bool {
    version.parse::<u32>().is_ok_and(|major| major >= 16)
}

fn visual_studio_platform(compiler: &Compiler, arch: Arch) -> Option<&'static str> {
    let version = compiler.version.as_deref().unwrap_or(DEFAULT_VS_VERSION);
    if !compiler.is_visual_studio() || !uses_platform_flag(version) {
        return None;
    }
    Some(match arch {
        Arch::X86 => "Win32",
        Arch::X86_64 => "x64",
    })
}

/// Googletest configure flags derived from [`PackageOptions`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildFlags(Vec<String>);

impl BuildFlags {
    /// Derive the flags for the given options.
    ///
    /// `-Dgtest_force_shared_crt=ON` is always present so that static and
    /// shared builds link against the same C runtime as their consumers.
    ///
    /// # Examples
    ///
    /// ```
    /// use gtest_recipe::cmake::BuildFlags;
    /// use gtest_recipe::options::PackageOptions;
    ///
    /// let flags = BuildFlags::from_options(&PackageOptions::default()).to_string();
    /// assert!(flags.contains("-DBUILD_SHARED_LIBS=1"));
    /// assert!(!flags.contains("-DBUILD_GTEST=ON"));
    /// ```
    #[must_use]
    pub fn from_options(options: &PackageOptions) -> Self {
        let mut flags = Vec::with_capacity(4);
        if options.shared {
            flags.push("-DBUILD_SHARED_LIBS=1".to_owned());
        }
        flags.push("-Dgtest_force_shared_crt=ON".to_owned());
        if options.build_gtest {
            flags.push("-DBUILD_GTEST=ON".to_owned());
        }
        if options.build_gmock {
            flags.push("-DBUILD_GMOCK=ON".to_owned());
        }
        Self(flags)
    }

    /// The flags as individual arguments.
    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for BuildFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(" "))
    }
}
