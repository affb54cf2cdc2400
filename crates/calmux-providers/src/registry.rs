//! Provider tag to source variant lookup.
//!
//! The [`SourceRegistry`] is built once at startup with every available
//! variant. Resolving an unregistered tag fails immediately with an
//! `UnknownProvider` error. The registry is also where configuration
//! changes are validated: uniqueness checks across sources and id
//! allocation happen here, field checks are delegated to the variant.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use tracing::{Instrument, Span, info, warn};
use uuid::Uuid;

use calmux_core::{NewSource, SourceConfig, SourceEdits, component_span};

use crate::error::{ProviderError, ProviderResult};
use crate::source::CalendarSource;

/// Message of the error raised when a display name is already taken.
pub const DUPLICATE_NAME: &str = "This name has already been used";

/// Message of the error raised when a colour is already taken.
pub const DUPLICATE_COLOUR: &str = "This colour has already been used";

/// Lookup table of source variants keyed by provider tag.
#[derive(Clone)]
pub struct SourceRegistry {
    sources: BTreeMap<String, Arc<dyn CalendarSource>>,
    span: Span,
}

impl Default for SourceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            sources: BTreeMap::new(),
            span: component_span("source_registry"),
        }
    }

    /// Records registry activity inside `span` instead of the default one.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Registers `source` under its [`kind`](CalendarSource::kind),
    /// replacing any variant registered under the same tag.
    pub fn register(&mut self, source: Arc<dyn CalendarSource>) {
        let kind = source.kind().to_string();
        if self.sources.insert(kind.clone(), source).is_some() {
            warn!(parent: &self.span, kind = %kind, "replaced registered source variant");
        }
    }

    /// Builder form of [`register`](Self::register).
    pub fn with_source(mut self, source: Arc<dyn CalendarSource>) -> Self {
        self.register(source);
        self
    }

    /// Returns the registered provider tags, sorted.
    pub fn kinds(&self) -> Vec<&str> {
        self.sources.keys().map(String::as_str).collect()
    }

    /// Returns the variant registered for `kind`.
    pub fn resolve(&self, kind: &str) -> ProviderResult<Arc<dyn CalendarSource>> {
        self.sources
            .get(kind)
            .cloned()
            .ok_or_else(|| ProviderError::unknown_provider(kind))
    }

    /// Validates `input` for creation next to `existing` sources.
    ///
    /// On success the returned config carries a fresh random id that no
    /// source in `existing` uses.
    pub async fn validate_for_create(
        &self,
        input: &NewSource,
        existing: &[SourceConfig],
    ) -> ProviderResult<SourceConfig> {
        let source = self.resolve(&input.provider_kind)?;
        check_unique(&input.display_name, &input.colour, existing.iter())?;

        let taken: HashSet<&str> = existing.iter().map(|c| c.id.as_str()).collect();
        let id = loop {
            let candidate = Uuid::new_v4().to_string();
            if !taken.contains(candidate.as_str()) {
                break candidate;
            }
        };

        let span = tracing::info_span!(parent: &self.span, "create", source = %id);
        let config = source
            .validate_new(id, input)
            .instrument(span.clone())
            .await?;
        info!(parent: &span, kind = %config.provider_kind, "validated new source");
        Ok(config)
    }

    /// Validates `edits` to `existing` against the `others` sources.
    ///
    /// The id and provider of `existing` are preserved.
    pub fn validate_for_update(
        &self,
        existing: &SourceConfig,
        edits: &SourceEdits,
        others: &[SourceConfig],
    ) -> ProviderResult<SourceConfig> {
        let source = self.resolve(&existing.provider_kind)?;
        check_unique(
            &edits.display_name,
            &edits.colour,
            others.iter().filter(|c| c.id != existing.id),
        )?;

        let mut updated = source.validate_update(existing, edits)?;
        updated.id = existing.id.clone();
        updated.provider_kind = existing.provider_kind.clone();
        Ok(updated)
    }

    /// Lets the variant of a removed source release its resources.
    ///
    /// Failures are logged and otherwise ignored.
    pub async fn on_removed(&self, config: &SourceConfig) {
        let result = match self.resolve(&config.provider_kind) {
            Ok(source) => source.on_removed(config).await,
            Err(e) => Err(e),
        };
        if let Err(e) = result {
            warn!(parent: &self.span, source = %config.id, error = %e, "cleanup after removal failed");
        }
    }
}

fn check_unique<'a>(
    name: &str,
    colour: &str,
    others: impl Iterator<Item = &'a SourceConfig>,
) -> ProviderResult<()> {
    let name = name.trim();
    let colour = colour.trim();
    for other in others {
        if !name.is_empty() && other.display_name == name {
            return Err(ProviderError::configuration(DUPLICATE_NAME));
        }
        if !colour.is_empty() && other.colour == colour {
            return Err(ProviderError::configuration(DUPLICATE_COLOUR));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::source::{BoxFuture, FetchOutcome, require};
    use calmux_core::EventBatch;
    use std::sync::Mutex;

    /// Variant accepting any input and recording removals.
    #[derive(Default)]
    struct StubSource {
        removed: Mutex<Vec<String>>,
        fail_removal: bool,
    }

    impl CalendarSource for StubSource {
        fn kind(&self) -> &str {
            "Stub"
        }

        fn fetch_events<'a>(
            &'a self,
            _source: &'a SourceConfig,
            window_days: i64,
        ) -> BoxFuture<'a, FetchOutcome> {
            Box::pin(async move { FetchOutcome::fresh(EventBatch::empty(window_days)) })
        }

        fn validate_new<'a>(
            &'a self,
            id: String,
            input: &'a NewSource,
        ) -> BoxFuture<'a, ProviderResult<SourceConfig>> {
            Box::pin(async move {
                let name = require(&input.display_name, "Name")?;
                let colour = require(&input.colour, "Colour")?;
                Ok(SourceConfig::new(id, name, "Stub", colour))
            })
        }

        fn validate_update(
            &self,
            existing: &SourceConfig,
            edits: &SourceEdits,
        ) -> ProviderResult<SourceConfig> {
            let mut updated = existing.clone();
            updated.display_name = edits.display_name.clone();
            updated.colour = edits.colour.clone();
            updated.id = "tampered".to_string();
            Ok(updated)
        }

        fn on_removed<'a>(
            &'a self,
            source: &'a SourceConfig,
        ) -> BoxFuture<'a, ProviderResult<()>> {
            Box::pin(async move {
                self.removed.lock().unwrap().push(source.id.clone());
                if self.fail_removal {
                    Err(ProviderError::persistence("disk gone"))
                } else {
                    Ok(())
                }
            })
        }
    }

    fn registry() -> (SourceRegistry, Arc<StubSource>) {
        let stub = Arc::new(StubSource::default());
        (SourceRegistry::new().with_source(stub.clone()), stub)
    }

    fn existing() -> Vec<SourceConfig> {
        vec![
            SourceConfig::new("id-1", "Work", "Stub", "blue"),
            SourceConfig::new("id-2", "Home", "Stub", "green"),
        ]
    }

    #[test]
    fn resolve_unknown_kind_fails() {
        let (registry, _) = registry();
        assert_eq!(registry.kinds(), vec!["Stub"]);
        assert!(registry.resolve("Stub").is_ok());

        let err = registry.resolve("Outlook").err().unwrap();
        assert_eq!(err.kind(), ErrorKind::UnknownProvider);
    }

    #[tokio::test]
    async fn create_allocates_fresh_id() {
        let (registry, _) = registry();
        let existing = existing();

        let config = registry
            .validate_for_create(&NewSource::new("Gym", "Stub", "red"), &existing)
            .await
            .unwrap();

        assert_eq!(config.display_name, "Gym");
        assert!(Uuid::parse_str(&config.id).is_ok());
        assert!(existing.iter().all(|c| c.id != config.id));
    }

    #[tokio::test]
    async fn create_ids_are_distinct() {
        let (registry, _) = registry();
        let mut configs = Vec::new();
        for i in 0..20 {
            let input = NewSource::new(format!("cal-{i}"), "Stub", format!("#{i:06}"));
            let config = registry.validate_for_create(&input, &configs).await.unwrap();
            configs.push(config);
        }

        let ids: HashSet<_> = configs.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids.len(), 20);
    }

    #[tokio::test]
    async fn create_rejects_duplicates() {
        let (registry, _) = registry();

        let err = registry
            .validate_for_create(&NewSource::new("Work", "Stub", "red"), &existing())
            .await
            .unwrap_err();
        assert_eq!(err.message(), DUPLICATE_NAME);

        let err = registry
            .validate_for_create(&NewSource::new("Gym", "Stub", "green"), &existing())
            .await
            .unwrap_err();
        assert_eq!(err.message(), DUPLICATE_COLOUR);
    }

    #[tokio::test]
    async fn create_with_unknown_kind_fails() {
        let (registry, _) = registry();
        let err = registry
            .validate_for_create(&NewSource::new("Gym", "Outlook", "red"), &[])
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownProvider);
    }

    #[tokio::test]
    async fn create_delegates_field_checks() {
        let (registry, _) = registry();
        let err = registry
            .validate_for_create(&NewSource::new("", "Stub", "red"), &[])
            .await
            .unwrap_err();
        assert_eq!(err.message(), "Name must be specified");
    }

    #[test]
    fn update_preserves_identity() {
        let (registry, _) = registry();
        let sources = existing();

        let updated = registry
            .validate_for_update(&sources[0], &SourceEdits::new("Office", "blue"), &sources)
            .unwrap();

        assert_eq!(updated.id, "id-1");
        assert_eq!(updated.provider_kind, "Stub");
        assert_eq!(updated.display_name, "Office");
    }

    #[test]
    fn update_checks_other_sources_only() {
        let (registry, _) = registry();
        let sources = existing();

        assert!(
            registry
                .validate_for_update(&sources[0], &SourceEdits::new("Work", "blue"), &sources)
                .is_ok()
        );

        let err = registry
            .validate_for_update(&sources[0], &SourceEdits::new("Home", "blue"), &sources)
            .unwrap_err();
        assert_eq!(err.message(), DUPLICATE_NAME);
    }

    #[tokio::test]
    async fn removal_failures_are_swallowed() {
        let stub = Arc::new(StubSource {
            fail_removal: true,
            ..StubSource::default()
        });
        let registry = SourceRegistry::new().with_source(stub.clone());
        let config = SourceConfig::new("id-1", "Work", "Stub", "blue");

        registry.on_removed(&config).await;
        registry
            .on_removed(&SourceConfig::new("id-9", "Gone", "Outlook", "red"))
            .await;

        assert_eq!(*stub.removed.lock().unwrap(), vec!["id-1".to_string()]);
    }
}
