//! Shell command lines destined for the remote gateway host.
//!
//! Every job and scope operation renders exactly one [`RemoteCommand`] per
//! remote invocation. Values that originate outside the gateway (database
//! URIs, credentials, queries, user paths) are quoted with
//! `shell_escape::unix::escape`, which wraps them in single quotes and
//! rewrites embedded quotes as `'\''`. That is the only sanitisation applied
//! and it does not defend against every injection vector.

use std::borrow::Cow;
use std::fmt;

use shell_escape::unix::escape;

const REDACTED: &str = "'***'";

/// Quotes `value` for interpolation into a POSIX shell command line.
///
/// # Examples
///
/// ```
/// use mrgate::command::quote;
///
/// assert_eq!(quote("O'Brien"), r"'O'\''Brien'");
/// assert_eq!(quote("a b"), "'a b'");
/// ```
#[must_use]
pub fn quote(value: &str) -> String {
    escape(Cow::Borrowed(value)).into_owned()
}

/// Fully assembled command line that runs as a single remote shell
/// invocation.
///
/// Once built the command is opaque: it is executed verbatim via
/// [`RemoteCommand::as_shell`] or logged via its [`fmt::Display`]
/// implementation, which masks any argument added with
/// [`RemoteCommand::secret`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RemoteCommand {
    line: String,
    redacted: String,
}

impl RemoteCommand {
    /// Starts a command with a trusted program prefix such as
    /// `hadoop fs -mkdir -p`. The prefix is not escaped.
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        let line = program.into();
        Self {
            redacted: line.clone(),
            line,
        }
    }

    /// Appends a value, shell-escaped.
    #[must_use]
    pub fn arg(self, value: impl AsRef<str>) -> Self {
        let quoted = quote(value.as_ref());
        self.push(&quoted, &quoted)
    }

    /// Appends each value of `values`, shell-escaped.
    #[must_use]
    pub fn args<I, S>(self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        values
            .into_iter()
            .fold(self, |command, value| command.arg(value))
    }

    /// Appends a trusted fragment (flag names, literals) without escaping.
    #[must_use]
    pub fn raw(self, fragment: &str) -> Self {
        self.push(fragment, fragment)
    }

    /// Appends `--flag <value>` with the value shell-escaped.
    #[must_use]
    pub fn flag(self, name: &str, value: impl AsRef<str>) -> Self {
        self.raw(name).arg(value)
    }

    /// Appends `--flag <value>` where the value is masked in the rendered
    /// display form while still reaching the remote shell escaped.
    #[must_use]
    pub fn secret(self, name: &str, value: impl AsRef<str>) -> Self {
        let quoted = quote(value.as_ref());
        self.raw(name).push(&quoted, REDACTED)
    }

    /// Returns the exact line handed to the remote shell.
    #[must_use]
    pub fn as_shell(&self) -> &str {
        &self.line
    }

    fn push(mut self, line_part: &str, redacted_part: &str) -> Self {
        for (target, part) in [(&mut self.line, line_part), (&mut self.redacted, redacted_part)] {
            if !target.is_empty() {
                target.push(' ');
            }
            target.push_str(part);
        }
        self
    }
}

impl fmt::Display for RemoteCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.redacted)
    }
}
