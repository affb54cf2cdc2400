//! JSON file helpers shared by the file-backed stores.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{ProviderError, ProviderResult};

/// Reads and deserializes `path`. A missing file is `Ok(None)`.
pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> ProviderResult<Option<T>> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(
                ProviderError::persistence(format!("failed to read {}", path.display()))
                    .with_cause(e),
            );
        }
    };

    serde_json::from_str(&content).map(Some).map_err(|e| {
        ProviderError::persistence(format!("failed to parse {}", path.display())).with_cause(e)
    })
}

/// Serializes `value` to `path`, replacing any previous content.
///
/// The JSON is written to a sibling temp file that is then renamed over
/// `path`, so readers never observe a half-written file. With `private`
/// set the file is made owner-only on unix. A failed write or rename
/// removes the temp file.
pub fn write_json_atomic<T: Serialize>(
    path: &Path,
    value: &T,
    private: bool,
) -> ProviderResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            ProviderError::persistence(format!("failed to create {}", parent.display()))
                .with_cause(e)
        })?;
    }

    let content = serde_json::to_string_pretty(value)
        .map_err(|e| ProviderError::internal("failed to serialize record").with_cause(e))?;

    let temp_path = path.with_extension("json.tmp");
    fs::write(&temp_path, content).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        ProviderError::persistence(format!("failed to write {}", temp_path.display()))
            .with_cause(e)
    })?;

    #[cfg(unix)]
    if private {
        use std::os::unix::fs::PermissionsExt;
        let _ = fs::set_permissions(&temp_path, fs::Permissions::from_mode(0o600));
    }
    #[cfg(not(unix))]
    let _ = private;

    fs::rename(&temp_path, path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        ProviderError::persistence(format!("failed to replace {}", path.display())).with_cause(e)
    })
}

/// Removes `path`. A missing file is not an error.
pub(crate) fn remove_file(path: &Path) -> ProviderResult<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(
            ProviderError::persistence(format!("failed to remove {}", path.display()))
                .with_cause(e),
        ),
    }
}

/// Maps an id to a string that is safe to embed in a file name.
pub(crate) fn file_key(id: &str) -> String {
    id.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
