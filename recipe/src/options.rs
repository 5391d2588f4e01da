//! Package options exposed by the googletest recipe.

use serde::{Deserialize, Serialize};

/// Boolean toggles that shape what the recipe builds.
///
/// Defaults match the published package: shared libraries with googlemock
/// and without the standalone googletest build switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PackageOptions {
    /// Build shared libraries instead of static archives.
    pub shared: bool,
    /// Pass `-DBUILD_GTEST=ON` to the configure step.
    pub build_gtest: bool,
    /// Pass `-DBUILD_GMOCK=ON` and package the googlemock headers.
    pub build_gmock: bool,
}

impl Default for PackageOptions {
    fn default() -> Self {
        Self {
            shared: true,
            build_gtest: false,
            build_gmock: true,
        }
    }
}
