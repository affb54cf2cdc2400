//! Client settings.
//!
//! All settings live in `~/.config/calmux/config.toml` by default:
//!
//! ```toml
//! data_dir = "/home/me/.local/share/calmux"
//! default_window_days = 4
//! fetch_timeout_secs = 30
//!
//! [google]
//! client_id = "env::CALMUX_GOOGLE_CLIENT_ID"
//! client_secret = "pass::calmux/google"
//! calendar_id = "primary"
//!
//! [logging]
//! level = "info"
//! format = "json"
//! ```
//!
//! The configured sources themselves are not kept here but in
//! `<data_dir>/config.json`, together with the fallback snapshots and
//! stored credentials.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use calmux_core::{DEFAULT_WINDOW_DAYS, TracingConfig};
use calmux_providers::{GoogleConfig, OAuthCredentials};

use crate::error::{ClientError, ClientResult};
use crate::secret;

/// Settings of the `calmux` binary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Directory holding the source list, snapshots and credentials.
    pub data_dir: Option<PathBuf>,

    /// Window used when `--days` is not given.
    pub default_window_days: i64,

    /// Bound on every network call, in seconds.
    pub fetch_timeout_secs: u64,

    /// Google sources. They are unavailable without this section.
    pub google: Option<GoogleSettings>,

    /// Logging.
    pub logging: LoggingSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: None,
            default_window_days: DEFAULT_WINDOW_DAYS,
            fetch_timeout_secs: 30,
            google: None,
            logging: LoggingSettings::default(),
        }
    }
}

/// Google OAuth client settings.
///
/// `client_id` and `client_secret` accept secret references.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GoogleSettings {
    /// OAuth client id.
    pub client_id: Option<String>,
    /// OAuth client secret.
    pub client_secret: Option<String>,
    /// Calendar to read, `primary` when unset.
    pub calendar_id: Option<String>,
}

/// Log output settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default level (`warn` when unset). `RUST_LOG` takes precedence.
    pub level: Option<String>,
    /// `compact`, `pretty` or `json`.
    pub format: Option<String>,
}

impl Settings {
    /// Loads settings from the default path; a missing file gives defaults.
    pub fn load() -> ClientResult<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Loads settings from `path`.
    pub fn load_from(path: &Path) -> ClientResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ClientError::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::parse(&content)
    }

    /// Parses settings from TOML text.
    pub fn parse(content: &str) -> ClientResult<Self> {
        toml::from_str(content)
            .map_err(|e| ClientError::Config(format!("failed to parse settings: {e}")))
    }

    /// Returns the default settings file path.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("calmux")
            .join("config.toml")
    }

    /// Returns the data directory, falling back to the platform default.
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("calmux")
        })
    }

    /// Returns the network call bound.
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    /// Returns the window for a run, preferring `requested` when given.
    pub fn window_days(&self, requested: Option<i64>) -> i64 {
        requested.unwrap_or(self.default_window_days)
    }

    /// Builds the tracing setup. `debug` forces debug level.
    pub fn tracing_config(&self, debug: bool) -> ClientResult<TracingConfig> {
        let mut config = if debug {
            TracingConfig::debug()
        } else {
            TracingConfig::default()
        };
        if !debug && let Some(level) = &self.logging.level {
            config = config.with_level_name(level)?;
        }
        if let Some(format) = &self.logging.format {
            config = config.with_format(format.parse()?);
        }
        Ok(config)
    }
}

impl GoogleSettings {
    /// Resolves the credentials and builds the Google source configuration.
    pub fn to_provider_config(&self, timeout: Duration) -> ClientResult<GoogleConfig> {
        let credentials = self.resolve_credentials()?;
        credentials
            .validate()
            .map_err(|e| ClientError::Config(format!("invalid Google credentials: {e}")))?;

        let mut config = GoogleConfig::new(credentials).with_timeout(timeout);
        if let Some(calendar_id) = &self.calendar_id {
            config = config.with_calendar_id(calendar_id);
        }
        Ok(config)
    }

    fn resolve_credentials(&self) -> ClientResult<OAuthCredentials> {
        let missing = |field: &str| {
            ClientError::Config(format!(
                "{field} is missing from the [google] section of {}",
                Settings::default_path().display()
            ))
        };
        let client_id = self.client_id.as_deref().ok_or_else(|| missing("client_id"))?;
        let client_secret = self
            .client_secret
            .as_deref()
            .ok_or_else(|| missing("client_secret"))?;

        Ok(OAuthCredentials::new(
            secret::resolve(client_id)?,
            secret::resolve(client_secret)?,
        ))
    }
}
