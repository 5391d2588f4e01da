//! Build settings: the platform and toolchain a package is built for.
//!
//! Settings use the dependency manager's spelling (`x86_64`, `Release`,
//! `Visual Studio`, `MDd`) for their textual forms so that values can be read
//! straight from configuration files and echoed back in logs.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Target operating system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Os {
    /// Microsoft Windows.
    Windows,
    /// Linux.
    Linux,
    /// Apple macOS.
    Macos,
}

impl Os {
    /// Textual form of the setting.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Windows => "Windows",
            Self::Linux => "Linux",
            Self::Macos => "Macos",
        }
    }
}

/// Target CPU architecture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Arch {
    /// 32-bit x86.
    #[serde(rename = "x86")]
    X86,
    /// 64-bit x86.
    #[serde(rename = "x86_64")]
    X86_64,
}

impl Arch {
    /// Textual form of the setting.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::X86 => "x86",
            Self::X86_64 => "x86_64",
        }
    }
}

/// Optimisation profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuildType {
    /// Optimised build.
    Release,
    /// Debug build.
    Debug,
}

impl BuildType {
    /// Textual form of the setting.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Release => "Release",
            Self::Debug => "Debug",
        }
    }
}

/// How the C runtime is linked on MSVC toolchains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Linkage {
    /// DLL runtime (`/MD`, `/MDd`).
    #[default]
    Dynamic,
    /// Static runtime (`/MT`, `/MTd`).
    Static,
}

/// MSVC C runtime flavour (`compiler.runtime`).
///
/// [`Runtime::for_build`] is the only constructor, so a runtime always
/// matches the build type it was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Runtime {
    linkage: Linkage,
    debug: bool,
}

impl Runtime {
    /// Derive the runtime matching `build_type` for the given linkage.
    ///
    /// # Examples
    ///
    /// ```
    /// use gtest_recipe::settings::{BuildType, Linkage, Runtime};
    ///
    /// assert_eq!(Runtime::for_build(Linkage::Dynamic, BuildType::Debug).as_str(), "MDd");
    /// assert_eq!(Runtime::for_build(Linkage::Static, BuildType::Release).as_str(), "MT");
    /// ```
    #[must_use]
    pub const fn for_build(linkage: Linkage, build_type: BuildType) -> Self {
        Self {
            linkage,
            debug: matches!(build_type, BuildType::Debug),
        }
    }

    /// Textual form of the setting.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match (self.linkage, self.debug) {
            (Linkage::Dynamic, false) => "MD",
            (Linkage::Dynamic, true) => "MDd",
            (Linkage::Static, false) => "MT",
            (Linkage::Static, true) => "MTd",
        }
    }
}

/// Compiler toolset together with its optional version and runtime.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Compiler {
    /// Toolset name, e.g. `Visual Studio` or `gcc`.
    pub name: String,
    /// Toolset version, e.g. `14`.
    pub version: Option<String>,
    /// C runtime, only meaningful for MSVC.
    pub runtime: Option<Runtime>,
}

impl Compiler {
    /// Toolset name used by MSVC settings.
    pub const VISUAL_STUDIO: &'static str = "Visual Studio";

    /// Whether this is the MSVC toolset.
    #[must_use]
    pub fn is_visual_studio(&self) -> bool {
        self.name == Self::VISUAL_STUDIO
    }
}

/// Complete settings for one build.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Settings {
    /// Target operating system.
    pub os: Os,
    /// Target architecture.
    pub arch: Arch,
    /// Compiler toolset.
    pub compiler: Compiler,
    /// Optimisation profile.
    pub build_type: BuildType,
}

impl Settings {
    /// Render the settings as `key=value` pairs in a stable order.
    #[must_use]
    pub fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("os", self.os.to_string()),
            ("arch", self.arch.to_string()),
            ("compiler", self.compiler.name.clone()),
        ];
        if let Some(version) = &self.compiler.version {
            pairs.push(("compiler.version", version.clone()));
        }
        if let Some(runtime) = self.compiler.runtime {
            pairs.push(("compiler.runtime", runtime.to_string()));
        }
        pairs.push(("build_type", self.build_type.to_string()));
        pairs
    }
}

macro_rules! display_via_as_str {
    ($($ty:ty),*) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        })*
    };
}

display_via_as_str!(Os, Arch, BuildType, Runtime);
