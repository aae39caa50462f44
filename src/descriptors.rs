//! Asset Descriptors - Declarative Style/Script Configuration

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use crate::tags::{AttrValue, TagAttributes};

pub type Handle = String;

/// Phase a descriptor fires on when none is configured.
pub const DEFAULT_EVENT: &str = "init";
/// Priority used when an event is named without one.
pub const DEFAULT_PRIORITY: i64 = 10;

fn default_media() -> String {
    "all".to_string()
}

/// Lifecycle events a descriptor fires on, in insertion order.
///
/// Accepts either a priority map (`{"init": 10}`) or a bare list of event
/// names (`["init"]`), the latter defaulting every priority to 10.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "EventMapRepr")]
pub struct EventMap(IndexMap<String, i64>);

#[derive(Deserialize)]
#[serde(untagged)]
enum EventMapRepr {
    Names(Vec<String>),
    Priorities(IndexMap<String, i64>),
}

impl From<EventMapRepr> for EventMap {
    fn from(repr: EventMapRepr) -> Self {
        match repr {
            EventMapRepr::Names(names) => EventMap(
                names
                    .into_iter()
                    .map(|name| (name, DEFAULT_PRIORITY))
                    .collect(),
            ),
            EventMapRepr::Priorities(map) => EventMap(map),
        }
    }
}

impl Default for EventMap {
    fn default() -> Self {
        EventMap(IndexMap::from([(
            DEFAULT_EVENT.to_string(),
            DEFAULT_PRIORITY,
        )]))
    }
}

impl EventMap {
    pub fn single(event: impl Into<String>, priority: i64) -> Self {
        EventMap(IndexMap::from([(event.into(), priority)]))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> {
        self.0.iter().map(|(name, priority)| (name.as_str(), *priority))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Fire-time configuration override: receives the descriptor's resolved JSON
/// config and its handle, returns an optional patch merged on top.
#[derive(Clone)]
pub struct ConfigOverride(Arc<dyn Fn(&Value, &str) -> Option<Value> + Send + Sync>);

impl ConfigOverride {
    pub fn new(callback: impl Fn(&Value, &str) -> Option<Value> + Send + Sync + 'static) -> Self {
        ConfigOverride(Arc::new(callback))
    }

    pub fn apply(&self, config: &Value, handle: &str) -> Option<Value> {
        (self.0)(config, handle)
    }
}

impl fmt::Debug for ConfigOverride {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ConfigOverride")
    }
}

/// A stylesheet descriptor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleConfig {
    /// Location, relative to the manager's base URL unless `external`.
    /// Empty means inline-only; the enqueue step silently skips it.
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub dependencies: Vec<String>,
    /// Cache-buster; the manager-wide version applies when unset.
    #[serde(default)]
    pub version: Option<String>,
    /// Path of a generated manifest file, relative to the asset root,
    /// merged into this config on every fire.
    #[serde(default)]
    pub manifest: Option<String>,
    /// Extra attributes spliced into the rendered tag.
    #[serde(default)]
    pub attributes: TagAttributes,
    /// Non-empty triggers synthesis of a `<handle>-preload` sibling.
    #[serde(default)]
    pub preload: IndexMap<String, String>,
    /// Register only; do not enqueue.
    #[serde(default)]
    pub register: bool,
    /// Use `url` verbatim instead of joining the base URL.
    #[serde(default)]
    pub external: bool,
    #[serde(default)]
    pub events: EventMap,
    #[serde(default = "default_media")]
    pub media: String,
    #[serde(default)]
    pub with_path: bool,
    #[serde(default)]
    pub defer_as: Option<String>,
    #[serde(skip)]
    pub callback: Option<ConfigOverride>,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            dependencies: Vec::new(),
            version: None,
            manifest: None,
            attributes: TagAttributes::new(),
            preload: IndexMap::new(),
            register: false,
            external: false,
            events: EventMap::default(),
            media: default_media(),
            with_path: false,
            defer_as: None,
            callback: None,
        }
    }
}

impl StyleConfig {
    /// Derive the `<handle>-preload` sibling: the preload map becomes the
    /// attribute set with `rel=preload` forced, recursion disabled.
    pub fn preload_variant(&self) -> StyleConfig {
        StyleConfig {
            preload: IndexMap::new(),
            attributes: preload_attributes(&self.preload),
            register: false,
            with_path: false,
            defer_as: None,
            callback: None,
            ..self.clone()
        }
    }
}

/// A script descriptor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub manifest: Option<String>,
    #[serde(default)]
    pub attributes: TagAttributes,
    #[serde(default)]
    pub preload: IndexMap<String, String>,
    #[serde(default)]
    pub register: bool,
    #[serde(default)]
    pub external: bool,
    #[serde(default)]
    pub events: EventMap,
    #[serde(default)]
    pub in_footer: bool,
    /// Localization payloads, variable name to JSON value, emitted inline
    /// before the script tag.
    #[serde(default)]
    pub data: IndexMap<String, Value>,
    #[serde(skip)]
    pub callback: Option<ConfigOverride>,
}

impl Default for ScriptConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            dependencies: Vec::new(),
            version: None,
            manifest: None,
            attributes: TagAttributes::new(),
            preload: IndexMap::new(),
            register: false,
            external: false,
            events: EventMap::default(),
            in_footer: false,
            data: IndexMap::new(),
            callback: None,
        }
    }
}

impl ScriptConfig {
    pub fn preload_variant(&self) -> ScriptConfig {
        ScriptConfig {
            preload: IndexMap::new(),
            attributes: preload_attributes(&self.preload),
            register: false,
            data: IndexMap::new(),
            callback: None,
            ..self.clone()
        }
    }
}

fn preload_attributes(preload: &IndexMap<String, String>) -> TagAttributes {
    let mut attributes: TagAttributes = preload
        .iter()
        .map(|(name, value)| (name.clone(), AttrValue::value(value.clone())))
        .collect();
    attributes.insert("rel".to_string(), AttrValue::value("preload"));
    attributes
}
