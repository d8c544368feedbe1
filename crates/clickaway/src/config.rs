//! Outside-click configuration
//!
//! Two optional string options, named the way component props spell them:
//!
//! - `triggerEvents`: comma-separated event type names (default `"click"`)
//! - `exclude`: selector list of elements whose subtrees count as inside
//!
//! ```toml
//! triggerEvents = "click, keydown"
//! exclude = "#toolbar, .popover"
//! ```

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use clickaway_core::{event_types, Document, NodeId, SelectorList};

use crate::error::ConfigError;

/// Trigger event used when `triggerEvents` is unset or empty
pub const DEFAULT_TRIGGER_EVENT: &str = event_types::CLICK;

/// Outside-click options supplied at registration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OutsideConfig {
    /// Comma-separated trigger event type names
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trigger_events: Option<String>,
    /// Selector list for excluded elements
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude: Option<String>,
}

impl OutsideConfig {
    /// Default configuration: `click`, no exclusions
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the comma-separated trigger event list
    pub fn with_trigger_events(mut self, events: impl Into<String>) -> Self {
        self.trigger_events = Some(events.into());
        self
    }

    /// Set the exclusion selector
    pub fn with_exclude(mut self, selector: impl Into<String>) -> Self {
        self.exclude = Some(selector.into());
        self
    }

    /// Load from a TOML table with `triggerEvents` / `exclude` keys
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    /// See [`resolve_trigger_events`]
    pub fn trigger_events(&self) -> Vec<String> {
        resolve_trigger_events(self)
    }

    /// See [`resolve_excluded_nodes`]
    pub fn excluded_nodes(&self, document: &Document) -> Vec<NodeId> {
        resolve_excluded_nodes(self, document)
    }
}

/// Resolve the ordered, deduplicated trigger event list
///
/// Entries are trimmed and empty entries dropped; the first occurrence of a
/// repeated name keeps its position. Falls back to `["click"]` when nothing
/// remains.
pub fn resolve_trigger_events(config: &OutsideConfig) -> Vec<String> {
    let events: IndexSet<&str> = config
        .trigger_events
        .as_deref()
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .collect();

    if events.is_empty() {
        return vec![DEFAULT_TRIGGER_EVENT.to_string()];
    }
    events.into_iter().map(str::to_string).collect()
}

/// Snapshot the elements currently matching `exclude`
///
/// A malformed selector is logged as a warning and yields an empty set so
/// registration can proceed without exclusions.
pub fn resolve_excluded_nodes(config: &OutsideConfig, document: &Document) -> Vec<NodeId> {
    let Some(source) = config.exclude.as_deref().map(str::trim) else {
        return Vec::new();
    };
    if source.is_empty() {
        return Vec::new();
    }

    match SelectorList::parse(source) {
        Ok(selector) => selector.query_all(document),
        Err(err) => {
            tracing::warn!(
                selector = source,
                offset = err.offset,
                "ignoring malformed exclude selector: {}",
                err.message
            );
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tracing_subscriber::layer::{Context, SubscriberExt};
    use tracing_subscriber::Layer;

    /// Counts `WARN` events seen by the subscriber
    struct WarnCount(Arc<AtomicUsize>);

    impl<S: tracing::Subscriber> Layer<S> for WarnCount {
        fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
            if *event.metadata().level() == tracing::Level::WARN {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    fn warnings_during(f: impl FnOnce()) -> usize {
        let count = Arc::new(AtomicUsize::new(0));
        let subscriber = tracing_subscriber::registry().with(WarnCount(Arc::clone(&count)));
        tracing::subscriber::with_default(subscriber, f);
        count.load(Ordering::SeqCst)
    }

    #[test]
    fn test_default_trigger_is_click() {
        assert_eq!(resolve_trigger_events(&OutsideConfig::new()), vec!["click"]);
        assert_eq!(
            OutsideConfig::new().with_trigger_events("").trigger_events(),
            vec!["click"]
        );
        assert_eq!(
            OutsideConfig::new().with_trigger_events(" , ,").trigger_events(),
            vec!["click"]
        );
    }

    #[test]
    fn test_trigger_events_are_trimmed_in_order() {
        let config = OutsideConfig::new().with_trigger_events("click, keydown");
        assert_eq!(resolve_trigger_events(&config), vec!["click", "keydown"]);

        let config = OutsideConfig::new().with_trigger_events("  touchstart ,mousedown  ");
        assert_eq!(config.trigger_events(), vec!["touchstart", "mousedown"]);
    }

    #[test]
    fn test_trigger_events_are_deduplicated() {
        let config = OutsideConfig::new().with_trigger_events("keydown,click, keydown,,click");
        assert_eq!(config.trigger_events(), vec!["keydown", "click"]);
    }

    #[test]
    fn test_excluded_nodes_snapshot() {
        let mut doc = Document::new();
        let root = doc.root();
        let toolbar = doc.append_element(root, "div").unwrap();
        doc.set_id(toolbar, "toolbar").unwrap();
        let popover = doc.append_element(root, "div").unwrap();
        doc.add_class(popover, "popover").unwrap();

        let config = OutsideConfig::new().with_exclude(".popover, #toolbar");
        assert_eq!(config.excluded_nodes(&doc), vec![toolbar, popover]);

        // Later tree changes don't affect an existing snapshot
        let snapshot = config.excluded_nodes(&doc);
        let late = doc.append_element(root, "div").unwrap();
        doc.add_class(late, "popover").unwrap();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(config.excluded_nodes(&doc).len(), 3);
    }

    #[test]
    fn test_unset_or_blank_exclude_is_empty() {
        let doc = Document::new();
        assert!(resolve_excluded_nodes(&OutsideConfig::new(), &doc).is_empty());
        assert!(OutsideConfig::new().with_exclude("  ").excluded_nodes(&doc).is_empty());
    }

    #[test]
    fn test_malformed_exclude_fails_open() {
        let mut doc = Document::new();
        let root = doc.root();
        doc.append_element(root, "div").unwrap();

        let config = OutsideConfig::new().with_exclude("div[");
        assert!(resolve_excluded_nodes(&config, &doc).is_empty());
    }

    #[test]
    fn test_malformed_exclude_logs_warning() {
        let mut doc = Document::new();
        let root = doc.root();
        doc.append_element(root, "div").unwrap();

        let malformed = OutsideConfig::new().with_exclude("div >");
        let warnings = warnings_during(|| {
            assert!(malformed.excluded_nodes(&doc).is_empty());
        });
        assert_eq!(warnings, 1);

        let valid = OutsideConfig::new().with_exclude("div");
        let blank = OutsideConfig::new().with_exclude(" ");
        let warnings = warnings_during(|| {
            assert_eq!(valid.excluded_nodes(&doc).len(), 1);
            assert!(blank.excluded_nodes(&doc).is_empty());
        });
        assert_eq!(warnings, 0);
    }

    #[test]
    fn test_deserialize_component_props() {
        let config: OutsideConfig =
            serde_json::from_str(r##"{ "triggerEvents": "click, keydown", "exclude": "#menu" }"##)
                .unwrap();
        assert_eq!(
            config,
            OutsideConfig::new()
                .with_trigger_events("click, keydown")
                .with_exclude("#menu")
        );

        let empty: OutsideConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(empty, OutsideConfig::default());
    }

    #[test]
    fn test_from_toml() {
        let config = OutsideConfig::from_toml_str(
            r#"
            triggerEvents = "pointerdown"
            exclude = ".keep"
            "#,
        )
        .unwrap();
        assert_eq!(config.trigger_events(), vec!["pointerdown"]);
        assert_eq!(config.exclude.as_deref(), Some(".keep"));

        assert!(OutsideConfig::from_toml_str("triggerEvents = 3").is_err());
    }
}
