//! Persistence of the configured source list.
//!
//! The whole list is read and written at once. Callers serialize writers
//! (see [`SourceManager`](crate::SourceManager)); the stores do no
//! read-modify-write locking of their own.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::debug;

use calmux_core::SourceConfig;
use calmux_providers::write_json_atomic;

use crate::error::{ServerError, ServerResult};

/// Ordered storage of source configurations.
pub trait ConfigStore: Send + Sync {
    /// Returns every configured source, in persisted order.
    fn list_sources(&self) -> ServerResult<Vec<SourceConfig>>;

    /// Replaces the stored list with `sources`.
    fn persist(&self, sources: &[SourceConfig]) -> ServerResult<()>;
}

/// On-disk shape of `config.json`.
#[derive(Debug, Default, Serialize, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    calendars: Vec<SourceConfig>,
}

/// [`ConfigStore`] backed by a `{"calendars": [...]}` JSON file.
///
/// A missing file is an empty list. Writes go to a temp file that is then
/// renamed over the original.
#[derive(Debug, Clone)]
pub struct JsonConfigStore {
    path: PathBuf,
}

impl JsonConfigStore {
    /// File name used inside the data directory.
    pub const FILE_NAME: &'static str = "config.json";

    /// Creates a store at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Creates a store at `<data_dir>/config.json`.
    pub fn in_dir(data_dir: impl AsRef<Path>) -> Self {
        Self::new(data_dir.as_ref().join(Self::FILE_NAME))
    }

    /// Returns the file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn error(&self, message: impl Into<String>) -> ServerError {
        ServerError::persistence(self.path.display().to_string(), message)
    }
}

impl ConfigStore for JsonConfigStore {
    fn list_sources(&self) -> ServerResult<Vec<SourceConfig>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("no source config at {:?}", self.path);
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        let file: ConfigFile = serde_json::from_str(&content)
            .map_err(|e| self.error(format!("invalid source config: {e}")))?;
        Ok(file.calendars)
    }

    fn persist(&self, sources: &[SourceConfig]) -> ServerResult<()> {
        let file = ConfigFile {
            calendars: sources.to_vec(),
        };
        write_json_atomic(&self.path, &file, false).map_err(|e| self.error(e.to_string()))?;

        debug!(sources = sources.len(), "saved source config to {:?}", self.path);
        Ok(())
    }
}

/// In-memory [`ConfigStore`], for embedding and tests.
#[derive(Debug, Default)]
pub struct MemoryConfigStore {
    sources: Mutex<Vec<SourceConfig>>,
}

impl MemoryConfigStore {
    /// Creates a store holding `sources`.
    pub fn new(sources: Vec<SourceConfig>) -> Self {
        Self {
            sources: Mutex::new(sources),
        }
    }
}

impl ConfigStore for MemoryConfigStore {
    fn list_sources(&self) -> ServerResult<Vec<SourceConfig>> {
        Ok(self
            .sources
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone())
    }

    fn persist(&self, sources: &[SourceConfig]) -> ServerResult<()> {
        *self
            .sources
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = sources.to_vec();
        Ok(())
    }
}
