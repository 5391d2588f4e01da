//! Package reference discovery and parsing.
//!
//! The dependency manager's introspection command (`conan info` by default)
//! prints the reference of the local recipe on a line ending with the
//! `PROJECT` sentinel, for example `googletest/1.8.0@PROJECT`. This module
//! finds that line and parses it into a structured [`Reference`] instead of
//! splitting on `/` by position.

use crate::error::{RecipeError, Result};
use crate::executor::{CommandExecutor, run_checked};
use camino::Utf8Path;
use log::info;
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

/// Sentinel token that marks the local project's reference line.
pub const PROJECT_SENTINEL: &str = "PROJECT";

/// A package reference of shape `name/version[@user/channel]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Reference {
    name: String,
    version: String,
    user: Option<String>,
    channel: Option<String>,
}

impl Reference {
    /// Create a reference without user or channel.
    ///
    /// # Errors
    ///
    /// Returns [`RecipeError::InvalidReference`] if either part is empty or
    /// contains a separator.
    pub fn new(name: &str, version: &str) -> Result<Self> {
        format!("{name}/{version}").parse()
    }

    /// Package name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Package version.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Owning account, if present.
    #[must_use]
    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    /// Distribution channel, if present.
    #[must_use]
    pub fn channel(&self) -> Option<&str> {
        self.channel.as_deref()
    }

    /// The `name/version` part of the reference.
    #[must_use]
    pub fn name_version(&self) -> String {
        format!("{}/{}", self.name, self.version)
    }

    /// Return a copy bound to the given user and channel.
    #[must_use]
    pub fn with_owner(&self, user: &str, channel: &str) -> Self {
        Self {
            user: Some(user.to_owned()),
            channel: Some(channel.to_owned()),
            ..self.clone()
        }
    }

    /// Return a copy with the package name replaced.
    #[must_use]
    pub fn with_name(&self, name: &str) -> Self {
        Self {
            name: name.to_owned(),
            ..self.clone()
        }
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.name, self.version)?;
        if let (Some(user), Some(channel)) = (&self.user, &self.channel) {
            write!(f, "@{user}/{channel}")?;
        }
        Ok(())
    }
}

impl FromStr for Reference {
    type Err = RecipeError;

    fn from_str(s: &str) -> Result<Self> {
        let text = s.trim();
        let invalid = |reason: &str| RecipeError::InvalidReference {
            reference: text.to_owned(),
            reason: reason.to_owned(),
        };

        let (head, owner) = match text.split_once('@') {
            Some((head, owner)) => (head, Some(owner)),
            None => (text, None),
        };

        let (name, version) = head
            .split_once('/')
            .ok_or_else(|| invalid("expected name/version"))?;
        if name.is_empty() || version.is_empty() {
            return Err(invalid("name and version must not be empty"));
        }
        if version.contains('/') {
            return Err(invalid("version must not contain '/'"));
        }

        let (user, channel) = match owner.filter(|owner| !owner.is_empty()) {
            None => (None, None),
            Some(owner) => {
                let (user, channel) = owner
                    .split_once('/')
                    .ok_or_else(|| invalid("expected user/channel after '@'"))?;
                if user.is_empty() || channel.is_empty() || channel.contains('/') {
                    return Err(invalid("malformed user/channel"));
                }
                (Some(user.to_owned()), Some(channel.to_owned()))
            }
        };

        Ok(Self {
            name: name.to_owned(),
            version: version.to_owned(),
            user,
            channel,
        })
    }
}

#[expect(
    clippy::expect_used,
    reason = "the pattern is built from constants and covered by tests"
)]
static REFERENCE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!("^([^@].*?)@?{PROJECT_SENTINEL}$")).expect("reference pattern is valid")
});

/// Find the first line of `text` ending in the `PROJECT` sentinel and return
/// the reference text before it.
///
/// A trailing `@` directly before the sentinel is not part of the reference.
/// The sentinel may also appear inside the package name.
/// Lines without the sentinel are skipped; when none match, `None` is
/// returned.
///
/// # Examples
///
/// ```
/// use gtest_recipe::reference::extract_reference;
///
/// let output = "PROJECT\nfoo/2.0.1@acme/stablePROJECT\n";
/// assert_eq!(extract_reference(output).as_deref(), Some("foo/2.0.1@acme/stable"));
/// assert_eq!(extract_reference("nothing here\n"), None);
/// ```
#[must_use]
pub fn extract_reference(text: &str) -> Option<String> {
    text.lines().find_map(|line| {
        REFERENCE_LINE
            .captures(line.trim())
            .and_then(|captures| captures.get(1))
            .map(|found| found.as_str().trim())
            .filter(|found| !found.is_empty())
            .map(str::to_owned)
    })
}

/// Run the introspection command in `project_dir` and parse the reference it
/// reports.
///
/// # Errors
///
/// Returns [`RecipeError::CommandFailed`] if the command exits unsuccessfully,
/// [`RecipeError::ReferenceNotFound`] if no sentinel line is printed, and
/// [`RecipeError::InvalidReference`] if the line cannot be parsed.
pub fn discover_reference(
    executor: &dyn CommandExecutor,
    project_dir: &Utf8Path,
    command: &[String],
) -> Result<Reference> {
    let rendered = command.join(" ");
    let Some((program, args)) = command.split_first() else {
        return Err(RecipeError::ReferenceNotFound { command: rendered });
    };
    let args: Vec<&str> = args.iter().map(String::as_str).collect();

    let stdout = run_checked(executor, "reference discovery", program, &args, project_dir)?;
    let text = extract_reference(&stdout)
        .ok_or(RecipeError::ReferenceNotFound { command: rendered })?;
    let reference: Reference = text.parse()?;

    info!("discovered reference {reference}");
    Ok(reference)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{ExpectedCall, StubExecutor, failure_output, output_with_stdout};
    use rstest::rstest;

    #[rstest]
    #[case::local_recipe("googletest/1.8.0@PROJECT", "googletest/1.8.0")]
    #[case::owned_reference("foo/2.0.1@acme/stablePROJECT", "foo/2.0.1@acme/stable")]
    #[case::indented("   name/1.2.3@PROJECT", "name/1.2.3")]
    #[case::windows_line_ending("name/1.2.3@PROJECT\r", "name/1.2.3")]
    #[case::sentinel_inside_name("MYPROJECT/1.0@PROJECT", "MYPROJECT/1.0")]
    fn extracts_reference_before_sentinel(#[case] line: &str, #[case] expected: &str) {
        let text = format!("Requirements\n{line}\n    Remote: None\n");
        assert_eq!(extract_reference(&text).as_deref(), Some(expected));
    }

    #[rstest]
    #[case::empty("")]
    #[case::no_sentinel("googletest/1.8.0@demo/testing\n    URL: https://example.test\n")]
    #[case::bare_sentinel("PROJECT\n@PROJECT\n")]
    fn missing_sentinel_yields_none(#[case] text: &str) {
        assert_eq!(extract_reference(text), None);
    }

    #[test]
    fn first_matching_line_wins() {
        let text = "a/1.0@PROJECT\nb/2.0@PROJECT\n";
        assert_eq!(extract_reference(text).as_deref(), Some("a/1.0"));
    }

    #[rstest]
    #[case::local("name/1.2.3@PROJECT")]
    #[case::owned("name/1.2.3@user/channelPROJECT")]
    fn extracted_reference_parses_to_name_and_version(#[case] line: &str) {
        let text = extract_reference(line).expect("sentinel present");
        let reference: Reference = text.parse().expect("valid reference");
        assert_eq!(reference.name_version(), "name/1.2.3");
    }

    #[test]
    fn parses_full_reference() {
        let reference: Reference = "foo/2.0.1@acme/stable".parse().expect("valid reference");
        assert_eq!(reference.name(), "foo");
        assert_eq!(reference.version(), "2.0.1");
        assert_eq!(reference.user(), Some("acme"));
        assert_eq!(reference.channel(), Some("stable"));
        assert_eq!(reference.to_string(), "foo/2.0.1@acme/stable");
    }

    #[rstest]
    #[case::no_version("googletest")]
    #[case::empty_name("/1.8.0")]
    #[case::nested_version("googletest/1.8.0/extra")]
    #[case::half_owner("googletest/1.8.0@demo")]
    #[case::nested_channel("googletest/1.8.0@demo/testing/x")]
    fn rejects_malformed_references(#[case] text: &str) {
        let outcome = text.parse::<Reference>();
        assert!(
            matches!(outcome, Err(RecipeError::InvalidReference { .. })),
            "expected {text:?} to be rejected"
        );
    }

    #[test]
    fn with_owner_and_name_rebind_reference() {
        let reference = Reference::new("googletest", "1.8.0").expect("valid reference");
        let bound = reference.with_owner("demo", "testing").with_name("gtest");
        assert_eq!(bound.to_string(), "gtest/1.8.0@demo/testing");
    }

    #[test]
    fn discover_reference_runs_introspection_command() {
        let executor = StubExecutor::new(vec![ExpectedCall::new(
            "conan",
            &["info"],
            Ok(output_with_stdout(
                "googletest/1.8.0@PROJECT\n    ID: 123\nRequirements\n",
            )),
        )]);
        let command = vec!["conan".to_owned(), "info".to_owned()];

        let reference = discover_reference(&executor, Utf8Path::new("."), &command)
            .expect("discovery should succeed");

        assert_eq!(reference.name(), "googletest");
        assert_eq!(reference.version(), "1.8.0");
        executor.assert_finished();
    }

    #[test]
    fn discover_reference_surfaces_not_found() {
        let executor = StubExecutor::new(vec![ExpectedCall::new(
            "conan",
            &["info"],
            Ok(output_with_stdout("no recipe here\n")),
        )]);
        let command = vec!["conan".to_owned(), "info".to_owned()];

        let err = discover_reference(&executor, Utf8Path::new("."), &command)
            .expect_err("no reference should be found");

        assert!(matches!(err, RecipeError::ReferenceNotFound { .. }));
    }

    #[test]
    fn discover_reference_propagates_command_failure() {
        let executor = StubExecutor::new(vec![ExpectedCall::new(
            "conan",
            &["info"],
            Ok(failure_output("ERROR: conanfile.py not found")),
        )]);
        let command = vec!["conan".to_owned(), "info".to_owned()];

        let err = discover_reference(&executor, Utf8Path::new("."), &command)
            .expect_err("command failure should propagate");

        assert!(matches!(err, RecipeError::CommandFailed { .. }));
    }
}
