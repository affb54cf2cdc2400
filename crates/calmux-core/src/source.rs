//! Calendar source configuration.
//!
//! A [`SourceConfig`] is one configured calendar origin. The persisted JSON
//! uses the short field names of the on-disk `config.json` (`name`,
//! `provider`), the Rust side uses descriptive ones.

use serde::{Deserialize, Serialize};

/// A configured calendar source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Opaque, globally unique identifier. Never derived from user input.
    pub id: String,

    /// Display name, unique among sources.
    #[serde(rename = "name")]
    pub display_name: String,

    /// Provider tag resolved through the source registry (e.g. `"Google"`, `"iCal"`).
    #[serde(rename = "provider")]
    pub provider_kind: String,

    /// Display colour, unique among sources.
    pub colour: String,

    /// Feed URL(s), newline separated. Only used by feed sources.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Key of the stored credential, for sources that need one.
    #[serde(default, rename = "credential", skip_serializing_if = "Option::is_none")]
    pub credential_ref: Option<String>,
}

impl SourceConfig {
    /// Creates a new source configuration.
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        provider_kind: impl Into<String>,
        colour: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            provider_kind: provider_kind.into(),
            colour: colour.into(),
            url: None,
            credential_ref: None,
        }
    }

    /// Builder method to set the feed URL(s).
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Builder method to set the credential reference.
    pub fn with_credential_ref(mut self, credential_ref: impl Into<String>) -> Self {
        self.credential_ref = Some(credential_ref.into());
        self
    }

    /// Returns the individual feed URLs, in order.
    ///
    /// Lines are split on `\n`, carriage returns and surrounding whitespace
    /// are stripped and blank lines skipped.
    pub fn feed_urls(&self) -> Vec<&str> {
        self.url
            .as_deref()
            .map(|urls| {
                urls.split('\n')
                    .map(|line| line.trim_matches(|c: char| c == '\r' || c.is_whitespace()))
                    .filter(|line| !line.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Returns the key under which this source's credential is stored.
    pub fn credential_key(&self) -> &str {
        self.credential_ref.as_deref().unwrap_or(&self.id)
    }
}

/// User input for creating a source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSource {
    /// Display name.
    #[serde(rename = "name")]
    pub display_name: String,
    /// Provider tag.
    #[serde(rename = "provider")]
    pub provider_kind: String,
    /// Display colour.
    pub colour: String,
    /// Feed URL(s), for feed sources.
    pub url: Option<String>,
    /// One-time authorization code, for authenticated sources.
    pub auth_code: Option<String>,
}

impl NewSource {
    /// Creates a new source request.
    pub fn new(
        display_name: impl Into<String>,
        provider_kind: impl Into<String>,
        colour: impl Into<String>,
    ) -> Self {
        Self {
            display_name: display_name.into(),
            provider_kind: provider_kind.into(),
            colour: colour.into(),
            url: None,
            auth_code: None,
        }
    }

    /// Builder method to set the feed URL(s).
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Builder method to set the authorization code.
    pub fn with_auth_code(mut self, code: impl Into<String>) -> Self {
        self.auth_code = Some(code.into());
        self
    }
}

/// User edits to an existing source. The id and provider are never edited.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceEdits {
    /// New display name.
    #[serde(rename = "name")]
    pub display_name: String,
    /// New colour.
    pub colour: String,
    /// Replacement feed URL(s); the existing value is kept when `None`.
    pub url: Option<String>,
}

impl SourceEdits {
    /// Creates a new edit set.
    pub fn new(display_name: impl Into<String>, colour: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            colour: colour.into(),
            url: None,
        }
    }

    /// Builder method to replace the feed URL(s).
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }
}

/// Name and colour of a source, for legends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceName {
    /// Display name.
    pub name: String,
    /// Display colour.
    pub colour: String,
}

impl From<&SourceConfig> for SourceName {
    fn from(config: &SourceConfig) -> Self {
        Self {
            name: config.display_name.clone(),
            colour: config.colour.clone(),
        }
    }
}
