//! Run configuration: `packager.toml` plus environment credentials.
//!
//! Every table is optional. Missing values fall back to the published
//! googletest matrix (x86_64 Release/MD and Debug/MDd with Visual Studio),
//! the default package options, and the `demo`/`testing` owner.

use crate::error::{PackagerError, Result};
use camino::Utf8Path;
use gtest_recipe::matrix::MatrixConfig;
use gtest_recipe::options::PackageOptions;
use gtest_recipe::test_package::{DEFAULT_CHANNEL, DEFAULT_USER};
use log::debug;
use serde::Deserialize;

/// Configuration file read when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "packager.toml";

/// Variable naming the account packages are published under.
pub const USERNAME_VAR: &str = "CONAN_USERNAME";

/// Variable naming the distribution channel.
pub const CHANNEL_VAR: &str = "CONAN_CHANNEL";

/// Variable overriding the package name taken from the reference.
pub const PACKAGE_VAR: &str = "CONAN_PACKAGE";

/// Contents of `packager.toml`.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct PackagerConfig {
    /// Settings combinations to build.
    pub matrix: MatrixConfig,
    /// Recipe options applied to every cell.
    pub options: PackageOptions,
    /// Fallback owner for local runs.
    pub defaults: OwnerDefaults,
    /// How the package reference is discovered.
    pub discovery: DiscoveryConfig,
}

impl PackagerConfig {
    /// Parse configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`PackagerError::ConfigParse`] if the text is not valid.
    pub fn from_toml(path: &Utf8Path, text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|source| PackagerError::ConfigParse {
            path: path.to_owned(),
            source: Box::new(source),
        })
    }

    /// Read configuration from `path`, which must exist.
    ///
    /// # Errors
    ///
    /// Returns [`PackagerError::ConfigRead`] if the file cannot be read, or
    /// [`PackagerError::ConfigParse`] if it is not valid.
    pub fn load(path: &Utf8Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| PackagerError::ConfigRead {
            path: path.to_owned(),
            source,
        })?;
        Self::from_toml(path, &text)
    }

    /// Read `path` if it exists, otherwise use the defaults.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`Self::load`] for an existing file.
    pub fn load_or_default(path: &Utf8Path) -> Result<Self> {
        if path.is_file() {
            return Self::load(path);
        }
        debug!("no configuration at {path}, using defaults");
        Ok(Self::default())
    }

    /// Load the explicitly requested file, or the optional default file.
    ///
    /// # Errors
    ///
    /// See [`Self::load`].
    pub fn resolve(explicit: Option<&Utf8Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::load(path),
            None => Self::load_or_default(Utf8Path::new(DEFAULT_CONFIG_FILE)),
        }
    }
}

/// Owner used by local runs when neither flags nor environment name one.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct OwnerDefaults {
    /// Default account.
    pub user: String,
    /// Default channel.
    pub channel: String,
}

impl Default for OwnerDefaults {
    fn default() -> Self {
        Self {
            user: DEFAULT_USER.to_owned(),
            channel: DEFAULT_CHANNEL.to_owned(),
        }
    }
}

/// Reference discovery settings.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct DiscoveryConfig {
    /// Introspection command and its arguments.
    pub command: Vec<String>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            command: vec!["conan".to_owned(), "info".to_owned()],
        }
    }
}

/// Account, channel and optional package-name override of a run.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Credentials {
    /// Account packages are published under.
    pub user: String,
    /// Distribution channel.
    pub channel: String,
    /// Replacement package name, if any.
    pub package: Option<String>,
}

/// Inputs to credential resolution taken from the command line.
#[derive(Clone, Copy, Debug, Default)]
pub struct CredentialFlags<'a> {
    /// `--local` was given.
    pub local: bool,
    /// Value of `--user`.
    pub user: Option<&'a str>,
    /// Value of `--channel`.
    pub channel: Option<&'a str>,
}

impl Credentials {
    /// Resolve credentials from flags and the process environment.
    ///
    /// # Errors
    ///
    /// See [`Self::resolve_with`].
    pub fn resolve(flags: CredentialFlags<'_>, defaults: &OwnerDefaults) -> Result<Self> {
        Self::resolve_with(flags, defaults, |name| std::env::var(name).ok())
    }

    /// Resolve credentials using the supplied environment lookup.
    ///
    /// Flags win over the environment. Local runs fall back to `defaults`;
    /// other runs require [`USERNAME_VAR`] and [`CHANNEL_VAR`].
    ///
    /// # Errors
    ///
    /// Returns [`PackagerError::MissingEnvironment`] for a non-local run
    /// without the account or channel.
    ///
    /// # Examples
    ///
    /// ```
    /// use gtest_packager::config::{CredentialFlags, Credentials, OwnerDefaults};
    ///
    /// let flags = CredentialFlags { local: true, ..CredentialFlags::default() };
    /// let credentials = Credentials::resolve_with(flags, &OwnerDefaults::default(), |_| None)?;
    /// assert_eq!(credentials.user, "demo");
    /// assert_eq!(credentials.channel, "testing");
    /// # Ok::<(), gtest_packager::error::PackagerError>(())
    /// ```
    pub fn resolve_with<F>(
        flags: CredentialFlags<'_>,
        defaults: &OwnerDefaults,
        lookup: F,
    ) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let pick = |flag: Option<&str>, variable: &'static str, fallback: &str| {
            if let Some(value) = flag {
                return Ok(value.to_owned());
            }
            match lookup(variable) {
                Some(value) => Ok(value),
                None if flags.local => Ok(fallback.to_owned()),
                None => Err(PackagerError::MissingEnvironment { variable }),
            }
        };

        Ok(Self {
            user: pick(flags.user, USERNAME_VAR, &defaults.user)?,
            channel: pick(flags.channel, CHANNEL_VAR, &defaults.channel)?,
            package: lookup(PACKAGE_VAR),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gtest_recipe::settings::{Arch, BuildType};
    use rstest::rstest;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[rstest]
    fn defaults_describe_published_matrix() {
        let config = PackagerConfig::default();
        let cells = config.matrix.cells();

        assert_eq!(cells.len(), 2);
        assert_eq!(config.discovery.command, ["conan", "info"]);
        assert_eq!(config.defaults.user, "demo");
    }

    #[rstest]
    fn deserialises_matrix_and_options() {
        let source = concat!(
            "[matrix]\n",
            "os = \"Linux\"\n",
            "compiler = \"gcc\"\n",
            "compiler_version = \"13\"\n",
            "archs = [\"x86\", \"x86_64\"]\n",
            "build_types = [\"Debug\"]\n",
            "\n",
            "[options]\n",
            "shared = false\n",
        );

        let config = PackagerConfig::from_toml(Utf8Path::new("packager.toml"), source)
            .expect("expected configuration to parse successfully");

        assert_eq!(config.matrix.archs, [Arch::X86, Arch::X86_64]);
        assert_eq!(config.matrix.build_types, [BuildType::Debug]);
        assert!(!config.options.shared);
        assert!(config.options.build_gmock);
    }

    #[rstest]
    fn rejects_unknown_tables() {
        let outcome = PackagerConfig::from_toml(Utf8Path::new("packager.toml"), "[upload]\n");
        assert!(matches!(outcome, Err(PackagerError::ConfigParse { .. })));
    }

    #[rstest]
    fn flags_override_environment() {
        let flags = CredentialFlags {
            local: false,
            user: Some("flag-user"),
            channel: None,
        };
        let lookup = env(&[(USERNAME_VAR, "env-user"), (CHANNEL_VAR, "stable")]);

        let credentials = Credentials::resolve_with(flags, &OwnerDefaults::default(), lookup)
            .expect("credentials resolve");

        assert_eq!(credentials.user, "flag-user");
        assert_eq!(credentials.channel, "stable");
    }

    #[rstest]
    #[case::missing_user(&[(CHANNEL_VAR, "stable")], USERNAME_VAR)]
    #[case::missing_channel(&[(USERNAME_VAR, "acme")], CHANNEL_VAR)]
    #[case::blank_user(&[(USERNAME_VAR, "  "), (CHANNEL_VAR, "stable")], USERNAME_VAR)]
    fn non_local_runs_require_environment(
        #[case] pairs: &[(&str, &str)],
        #[case] expected: &str,
    ) {
        let outcome =
            Credentials::resolve_with(CredentialFlags::default(), &OwnerDefaults::default(), env(pairs));

        assert!(matches!(
            outcome,
            Err(PackagerError::MissingEnvironment { variable }) if variable == expected
        ));
    }

    #[rstest]
    fn local_runs_fall_back_to_defaults() {
        let flags = CredentialFlags {
            local: true,
            ..CredentialFlags::default()
        };
        let lookup = env(&[(PACKAGE_VAR, "gtest")]);

        let credentials = Credentials::resolve_with(flags, &OwnerDefaults::default(), lookup)
            .expect("credentials resolve");

        assert_eq!(credentials.user, "demo");
        assert_eq!(credentials.channel, "testing");
        assert_eq!(credentials.package.as_deref(), Some("gtest"));
    }
}
