//! Secret references in settings values.
//!
//! A value may point at a secret kept outside `config.toml`:
//!
//! - `pass::path/in/store` is the first line of `pass show path/in/store`
//! - `env::VAR_NAME` is the value of `$VAR_NAME`
//! - anything else is the secret itself

use std::process::Command;

use crate::error::{ClientError, ClientResult};

/// A parsed settings value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretRef<'a> {
    /// Entry in the `pass` password store.
    Pass(&'a str),
    /// Environment variable name.
    Env(&'a str),
    /// Literal value.
    Plain(&'a str),
}

impl<'a> SecretRef<'a> {
    /// Parses `value` by its prefix.
    pub fn parse(value: &'a str) -> Self {
        if let Some(path) = value.strip_prefix("pass::") {
            Self::Pass(path)
        } else if let Some(var) = value.strip_prefix("env::") {
            Self::Env(var)
        } else {
            Self::Plain(value)
        }
    }

    /// Returns the secret the reference points at.
    pub fn resolve(self) -> ClientResult<String> {
        match self {
            Self::Pass(path) => pass_show(path),
            Self::Env(var) => std::env::var(var)
                .map_err(|_| ClientError::Secret(format!("environment variable `{var}` is not set"))),
            Self::Plain(value) => Ok(value.to_string()),
        }
    }
}

/// Resolves a settings value that may be a secret reference.
pub fn resolve(value: &str) -> ClientResult<String> {
    SecretRef::parse(value).resolve()
}

fn pass_show(path: &str) -> ClientResult<String> {
    let output = Command::new("pass")
        .args(["show", path])
        .output()
        .map_err(|e| ClientError::Secret(format!("failed to run `pass show {path}`: {e}")))?;

    if !output.status.success() {
        return Err(ClientError::Secret(format!(
            "`pass show {path}` failed ({}): {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    String::from_utf8_lossy(&output.stdout)
        .lines()
        .next()
        .map(str::to_string)
        .ok_or_else(|| ClientError::Secret(format!("`pass show {path}` printed nothing")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_by_prefix() {
        assert_eq!(SecretRef::parse("pass::google/id"), SecretRef::Pass("google/id"));
        assert_eq!(SecretRef::parse("env::GOOGLE_ID"), SecretRef::Env("GOOGLE_ID"));
        assert_eq!(SecretRef::parse("abc"), SecretRef::Plain("abc"));
        assert_eq!(SecretRef::parse("passthrough"), SecretRef::Plain("passthrough"));
    }

    #[test]
    fn plain_values_pass_through() {
        assert_eq!(resolve("").unwrap(), "");
        assert_eq!(
            resolve("x.apps.googleusercontent.com").unwrap(),
            "x.apps.googleusercontent.com"
        );
    }

    #[test]
    fn env_reference_reads_variable() {
        unsafe {
            std::env::set_var("_CALMUX_TEST_SECRET", "s3cret");
        }
        assert_eq!(resolve("env::_CALMUX_TEST_SECRET").unwrap(), "s3cret");
        unsafe {
            std::env::remove_var("_CALMUX_TEST_SECRET");
        }
    }

    #[test]
    fn missing_env_variable_errors() {
        let err = resolve("env::_CALMUX_UNSET_VARIABLE_4711").unwrap_err();
        assert!(err.to_string().contains("not set"));
    }

    #[test]
    fn unknown_pass_entry_errors() {
        assert!(resolve("pass::calmux/no/such/entry/4711").is_err());
    }
}
