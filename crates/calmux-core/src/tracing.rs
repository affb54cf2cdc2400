//! Tracing setup for calmux.
//!
//! The binary installs one subscriber at startup with [`init_tracing`].
//! Library components never reach for a global logger of their own: each
//! one is handed a [`Span`] when it is constructed (see [`component_span`]
//! for the default) and records its events inside it.
//!
//! ```ignore
//! use calmux_core::tracing::{init_tracing, TracingConfig};
//!
//! init_tracing(TracingConfig::default().with_level_name("debug")?)?;
//! ```

use std::str::FromStr;

use thiserror::Error;
use tracing::{Level, Span};
use tracing_subscriber::{EnvFilter, fmt::format::FmtSpan, prelude::*};

/// Why logging could not be set up.
#[derive(Debug, Error)]
pub enum TracingError {
    /// Another subscriber was installed first.
    #[error("a global tracing subscriber is already installed: {0}")]
    AlreadyInstalled(#[from] tracing::subscriber::SetGlobalDefaultError),

    /// The filter directive does not parse.
    #[error("invalid log filter: {0}")]
    Filter(#[from] tracing_subscriber::filter::ParseError),

    /// Unknown level or format name in the settings.
    #[error("invalid logging setting: {0}")]
    InvalidSetting(String),
}

/// How log lines are rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TracingOutputFormat {
    /// Multi-line, for reading while debugging.
    Pretty,
    /// One line per event.
    #[default]
    Compact,
    /// JSON lines.
    Json,
}

impl FromStr for TracingOutputFormat {
    type Err = TracingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            other => Err(TracingError::InvalidSetting(format!(
                "unknown log format '{other}'"
            ))),
        }
    }
}

/// Subscriber settings.
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Level of the `calmux` target when `RUST_LOG` is unset.
    pub level: Level,
    /// Line rendering.
    pub format: TracingOutputFormat,
    /// Print source file and line.
    pub source_location: bool,
    /// Log span creation and close, with timings.
    pub span_lifecycle: bool,
    /// Full filter directive replacing both `level` and `RUST_LOG`.
    pub filter: Option<String>,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            level: Level::WARN,
            format: TracingOutputFormat::default(),
            source_location: false,
            span_lifecycle: false,
            filter: None,
        }
    }
}

impl TracingConfig {
    /// Config for `--debug` runs.
    #[must_use]
    pub fn debug() -> Self {
        Self {
            level: Level::DEBUG,
            source_location: true,
            ..Self::default()
        }
    }

    /// Sets the level of the `calmux` target.
    #[must_use]
    pub fn with_level(self, level: Level) -> Self {
        Self { level, ..self }
    }

    /// Sets the level from its name (`"info"`, `"debug"`, ...).
    pub fn with_level_name(self, name: &str) -> Result<Self, TracingError> {
        let level = Level::from_str(name)
            .map_err(|_| TracingError::InvalidSetting(format!("unknown log level '{name}'")))?;
        Ok(self.with_level(level))
    }

    /// Sets the line rendering.
    #[must_use]
    pub fn with_format(self, format: TracingOutputFormat) -> Self {
        Self { format, ..self }
    }

    /// Replaces level and `RUST_LOG` with a full filter directive.
    #[must_use]
    pub fn with_filter(self, directive: impl Into<String>) -> Self {
        Self {
            filter: Some(directive.into()),
            ..self
        }
    }

    fn env_filter(&self) -> Result<EnvFilter, TracingError> {
        match &self.filter {
            Some(directive) => Ok(EnvFilter::try_new(directive)?),
            None => Ok(EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(format!("calmux={}", self.level)))),
        }
    }
}

/// Installs the global subscriber described by `config`.
///
/// # Errors
///
/// Fails if a subscriber is already installed or the filter does not parse.
pub fn init_tracing(config: TracingConfig) -> Result<(), TracingError> {
    let filter = config.env_filter()?;
    let spans = if config.span_lifecycle {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_file(config.source_location)
        .with_line_number(config.source_location)
        .with_span_events(spans);
    let fmt_layer = match config.format {
        TracingOutputFormat::Pretty => fmt_layer.pretty().boxed(),
        TracingOutputFormat::Compact => fmt_layer.compact().boxed(),
        TracingOutputFormat::Json => fmt_layer.json().boxed(),
    };

    tracing::subscriber::set_global_default(
        tracing_subscriber::registry().with(filter).with(fmt_layer),
    )?;
    Ok(())
}

/// Default span handed to a component that was not given one explicitly.
pub fn component_span(component: &'static str) -> Span {
    tracing::info_span!("calmux", component)
}

/// Span for `component` nested under `parent`.
pub fn child_span(parent: &Span, component: &'static str) -> Span {
    tracing::info_span!(parent: parent, "calmux", component)
}
