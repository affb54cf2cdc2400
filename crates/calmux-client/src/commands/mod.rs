//! Command implementations.
//!
//! Commands return what they would print so `main` owns the terminal.

pub mod events;
pub mod sources;

/// Text produced by a command.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Output {
    /// Printed to stdout.
    pub stdout: String,
    /// Printed to stderr, one per line.
    pub warnings: Vec<String>,
}

impl Output {
    /// Output with only stdout text.
    pub fn text(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            warnings: Vec::new(),
        }
    }
}
