//! Assets Manager - Central Registry and Deferred Dispatcher
//!
//! Descriptors are registered up front and resolved lazily: `run()` wires
//! every descriptor into the phased schedule, and each `dispatch()` of a
//! lifecycle event re-resolves the fired descriptors (override callback,
//! then manifest merge) before handing them to the backend. Resolution is
//! recomputed on every fire, never cached.

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::path::PathBuf;

use crate::descriptors::{ConfigOverride, EventMap, Handle, ScriptConfig, StyleConfig};
use crate::host::AssetBackend;
use crate::manifest::load_manifest;
use crate::merge::merge_into;
use crate::schedule::EventSchedule;
use crate::tags::{apply_script_attributes, apply_style_attributes, HtmlTag, ScriptTag};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Style,
    Script,
}

/// Scheduled action payload: which registry and which handle to resolve
/// when the subscribed event fires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRef {
    pub kind: AssetKind,
    pub handle: Handle,
}

/// Central registry and deferred resolver for page assets. One instance per
/// render pass.
#[derive(Debug)]
pub struct AssetsManager {
    base_url: String,
    root_path: PathBuf,
    version: String,
    styles: IndexMap<Handle, StyleConfig>,
    orphan_styles: Vec<Handle>,
    scripts: IndexMap<Handle, ScriptConfig>,
    orphan_scripts: Vec<Handle>,
    schedule: EventSchedule<AssetRef>,
    did_run: bool,
}

impl AssetsManager {
    /// `url` is the assets root URL (trailing slash enforced), `path` the
    /// asset root on disk, `version` the default cache-buster.
    pub fn new(
        url: impl Into<String>,
        path: impl Into<PathBuf>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            base_url: trailing_slash(url.into()),
            root_path: path.into(),
            version: version.into(),
            styles: IndexMap::new(),
            orphan_styles: Vec::new(),
            scripts: IndexMap::new(),
            orphan_scripts: Vec::new(),
            schedule: EventSchedule::new(),
            did_run: false,
        }
    }

    /// Assets root URL, optionally extended with a relative location.
    /// Empty when no base URL is configured.
    pub fn url(&self, relative: &str) -> String {
        if self.base_url.is_empty() {
            String::new()
        } else {
            format!("{}{relative}", self.base_url)
        }
    }

    /// Like [`url`](Self::url), with the versioning query argument attached.
    pub fn versioned_url(&self, relative: &str) -> String {
        let url = self.url(relative);
        if url.is_empty() {
            return url;
        }
        let sep = if url.contains('?') { '&' } else { '?' };
        format!("{url}{sep}ver={}", self.version)
    }

    /// Assets root path, optionally extended with a relative location.
    pub fn path(&self, relative: &str) -> PathBuf {
        if relative.is_empty() {
            self.root_path.clone()
        } else {
            self.root_path.join(relative)
        }
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn did_run(&self) -> bool {
        self.did_run
    }

    // --- Styles ---

    /// Insert a style descriptor. Re-adding an existing handle is a no-op.
    /// After the startup sweep, new descriptors wire their subscriptions
    /// immediately.
    pub fn add_style(&mut self, handle: &str, config: StyleConfig) -> &mut Self {
        if !self.styles.contains_key(handle) {
            if self.did_run {
                self.wire(AssetKind::Style, handle, &config.events);
            }
            self.styles.insert(handle.to_string(), config);
        }
        self
    }

    /// Replace an existing style descriptor; unknown handles are ignored.
    pub fn update_style(&mut self, handle: &str, config: StyleConfig) -> &mut Self {
        if let Some(existing) = self.styles.get_mut(handle) {
            *existing = config;
        }
        self
    }

    /// Drop a style descriptor. Already-wired subscriptions stay behind and
    /// no-op on their next fire.
    pub fn remove_style(&mut self, handle: &str) -> &mut Self {
        self.styles.shift_remove(handle);
        self
    }

    pub fn get_style(&self, handle: &str) -> Option<&StyleConfig> {
        self.styles.get(handle)
    }

    pub fn styles(&self) -> &IndexMap<Handle, StyleConfig> {
        &self.styles
    }

    pub fn has_orphan_style(&self, handle: &str) -> bool {
        self.orphan_styles.iter().any(|h| h == handle)
    }

    /// One-time registration of a handle-only inline style. Bypasses the
    /// descriptor model; idempotent per handle.
    pub fn add_orphan_style(&mut self, handle: &str, css: &str, backend: &mut dyn AssetBackend) {
        if !self.has_orphan_style(handle) {
            self.orphan_styles.push(handle.to_string());
            backend.register_or_enqueue_style(handle, None, &[], None, "all", true);
            backend.register_or_enqueue_style(handle, None, &[], None, "all", false);
            backend.add_inline_style(handle, css);
        }
    }

    // --- Scripts ---

    /// Insert a script descriptor. Re-adding an existing handle is a no-op.
    pub fn add_script(&mut self, handle: &str, config: ScriptConfig) -> &mut Self {
        if !self.scripts.contains_key(handle) {
            if self.did_run {
                self.wire(AssetKind::Script, handle, &config.events);
            }
            self.scripts.insert(handle.to_string(), config);
        }
        self
    }

    /// Replace an existing script descriptor; unknown handles are ignored.
    pub fn update_script(&mut self, handle: &str, config: ScriptConfig) -> &mut Self {
        if let Some(existing) = self.scripts.get_mut(handle) {
            *existing = config;
        }
        self
    }

    pub fn remove_script(&mut self, handle: &str) -> &mut Self {
        self.scripts.shift_remove(handle);
        self
    }

    pub fn get_script(&self, handle: &str) -> Option<&ScriptConfig> {
        self.scripts.get(handle)
    }

    pub fn scripts(&self) -> &IndexMap<Handle, ScriptConfig> {
        &self.scripts
    }

    pub fn has_orphan_script(&self, handle: &str) -> bool {
        self.orphan_scripts.iter().any(|h| h == handle)
    }

    /// One-time registration of a handle-only inline script.
    pub fn add_orphan_script(
        &mut self,
        handle: &str,
        js: &str,
        in_footer: bool,
        backend: &mut dyn AssetBackend,
    ) {
        if !self.has_orphan_script(handle) {
            self.orphan_scripts.push(handle.to_string());
            backend.register_or_enqueue_script(handle, None, &[], None, in_footer, true);
            backend.register_or_enqueue_script(handle, None, &[], None, in_footer, false);
            backend.add_inline_script(handle, js);
        }
    }

    /// Deep-merge a localization payload into an existing script's data bag
    /// under `name`. The newer payload wins on overlapping keys; other keys
    /// survive. Unknown handles are ignored.
    pub fn localize_script(&mut self, handle: &str, name: &str, data: Value) -> &mut Self {
        if let Some(config) = self.scripts.get_mut(handle) {
            match config.data.get_mut(name) {
                Some(existing) => merge_into(existing, &data),
                None => {
                    config.data.insert(name.to_string(), data);
                }
            }
        }
        self
    }

    // --- Lifecycle ---

    /// One-time startup sweep: wire every registered descriptor into the
    /// schedule. Descriptors with no base URL configured are reported but
    /// not fatal; their enqueue steps will no-op.
    pub fn run(&mut self) {
        if self.did_run {
            return;
        }

        if (!self.styles.is_empty() || !self.scripts.is_empty()) && self.base_url.is_empty() {
            log::warn!("assets manager base URL is not configured");
        }

        let styles: Vec<(Handle, EventMap)> = self
            .styles
            .iter()
            .map(|(handle, config)| (handle.clone(), config.events.clone()))
            .collect();
        for (handle, events) in styles {
            self.wire(AssetKind::Style, &handle, &events);
        }

        let scripts: Vec<(Handle, EventMap)> = self
            .scripts
            .iter()
            .map(|(handle, config)| (handle.clone(), config.events.clone()))
            .collect();
        for (handle, events) in scripts {
            self.wire(AssetKind::Script, &handle, &events);
        }

        self.did_run = true;
    }

    /// Resolve and enqueue everything subscribed to one lifecycle event, in
    /// (priority, subscription) order. Driven by the host render pipeline.
    pub fn dispatch(&mut self, event: &str, backend: &mut dyn AssetBackend) {
        let fired: Vec<AssetRef> = self.schedule.fire(event).into_iter().cloned().collect();
        for asset in fired {
            match asset.kind {
                AssetKind::Style => self.enqueue_style(&asset.handle, backend),
                AssetKind::Script => self.enqueue_script(&asset.handle, backend),
            }
        }
    }

    /// Event names with pending subscriptions, in first-seen order.
    pub fn scheduled_events(&self) -> Vec<String> {
        self.schedule.events().map(str::to_string).collect()
    }

    fn wire(&mut self, kind: AssetKind, handle: &str, events: &EventMap) {
        for (event, priority) in events.iter() {
            self.schedule.subscribe(
                event,
                priority,
                AssetRef {
                    kind,
                    handle: handle.to_string(),
                },
            );
        }
    }

    // --- Dependency edits against host-owned assets ---

    /// Append dependencies to an asset registered by the host itself.
    pub fn register_script_dependency(
        &self,
        handle: &str,
        deps: &[String],
        backend: &mut dyn AssetBackend,
    ) {
        if !deps.is_empty() {
            backend.append_script_dependencies(handle, deps);
        }
    }

    /// Resolve a registered block's front or editor script handle and append
    /// dependencies to it. Core-namespaced blocks share the bundled block
    /// library handle.
    pub fn register_block_script_dependency(
        &self,
        block_name: &str,
        editor: bool,
        deps: &[String],
        backend: &mut dyn AssetBackend,
    ) {
        if let Some(handle) = backend.block_script_handle(block_name, editor) {
            self.register_script_dependency(&handle, deps, backend);
        }
    }

    // --- Output tag rewriting ---

    /// Rewrite hook for rendered stylesheet tags. Applied by the host only
    /// after the tag filter was hooked; descriptors without attributes leave
    /// the tag untouched.
    pub fn filter_style_tag(&self, mut tag: HtmlTag, handle: &str) -> HtmlTag {
        if let Some(config) = self.styles.get(handle) {
            if !config.attributes.is_empty() {
                apply_style_attributes(&mut tag, &config.attributes);
            }
        }
        tag
    }

    /// Rewrite hook for rendered script tags, splitting out the inline
    /// before/after code fragments.
    pub fn filter_script_tag(&self, mut tag: ScriptTag, handle: &str) -> ScriptTag {
        if let Some(config) = self.scripts.get(handle) {
            if !config.attributes.is_empty() {
                apply_script_attributes(&mut tag, &config.attributes);
            }
        }
        tag
    }

    // --- Resolution ---

    fn enqueue_style(&mut self, handle: &str, backend: &mut dyn AssetBackend) {
        // a dangling subscription left by remove_style lands here
        let Some(config) = self.styles.get(handle).cloned() else {
            return;
        };
        let Some(resolved) =
            self.resolve_config::<StyleConfig>(handle, &config, config.callback.as_ref())
        else {
            return;
        };
        if resolved.url.is_empty() {
            return;
        }

        if !resolved.preload.is_empty() {
            let variant = resolved.preload_variant();
            let preload_handle = format!("{handle}-preload");
            self.add_style(&preload_handle, variant.clone());
            self.emit_style(&preload_handle, &variant, backend);
        }

        self.emit_style(handle, &resolved, backend);
    }

    fn emit_style(&self, handle: &str, config: &StyleConfig, backend: &mut dyn AssetBackend) {
        if !config.attributes.is_empty() {
            backend.hook_style_tag_filter();
        }

        let src = if config.external {
            config.url.clone()
        } else {
            self.url(&config.url)
        };
        let version = config.version.clone().unwrap_or_else(|| self.version.clone());
        backend.register_or_enqueue_style(
            handle,
            Some(src.as_str()),
            &config.dependencies,
            Some(version.as_str()),
            &config.media,
            config.register,
        );

        if config.with_path && !config.external {
            backend.set_style_path(handle, &self.url(&config.url));
        }
        if let Some(defer_as) = &config.defer_as {
            backend.mark_style_deferred(handle, defer_as);
        }
    }

    fn enqueue_script(&mut self, handle: &str, backend: &mut dyn AssetBackend) {
        let Some(config) = self.scripts.get(handle).cloned() else {
            return;
        };
        let Some(resolved) =
            self.resolve_config::<ScriptConfig>(handle, &config, config.callback.as_ref())
        else {
            return;
        };
        if resolved.url.is_empty() {
            return;
        }

        if !resolved.preload.is_empty() {
            let variant = resolved.preload_variant();
            let preload_handle = format!("{handle}-preload");
            self.add_script(&preload_handle, variant.clone());
            self.emit_script(&preload_handle, &variant, backend);
        }

        self.emit_script(handle, &resolved, backend);

        for (name, data) in &resolved.data {
            backend.localize_script(handle, name, data);
        }
    }

    fn emit_script(&self, handle: &str, config: &ScriptConfig, backend: &mut dyn AssetBackend) {
        if !config.attributes.is_empty() {
            backend.hook_script_tag_filter();
        }

        let src = if config.external {
            config.url.clone()
        } else {
            self.url(&config.url)
        };
        let version = config.version.clone().unwrap_or_else(|| self.version.clone());
        backend.register_or_enqueue_script(
            handle,
            Some(src.as_str()),
            &config.dependencies,
            Some(version.as_str()),
            config.in_footer,
            config.register,
        );
    }

    /// Fire-time merge: the stored config, patched by its override callback,
    /// then by the manifest file if one resolves. Internal keys are stripped
    /// before the result is rebuilt.
    fn resolve_config<T>(
        &self,
        handle: &str,
        config: &T,
        callback: Option<&ConfigOverride>,
    ) -> Option<T>
    where
        T: Serialize + DeserializeOwned,
    {
        let mut value = match serde_json::to_value(config) {
            Ok(value) => value,
            Err(err) => {
                log::debug!("could not serialize config for {handle}: {err}");
                return None;
            }
        };

        if let Some(callback) = callback {
            if let Some(patch) = callback.apply(&value, handle) {
                merge_into(&mut value, &patch);
            }
        }

        let manifest = value
            .get("manifest")
            .and_then(Value::as_str)
            .map(str::to_string);
        if let Some(relative) = manifest {
            match load_manifest(&self.path(&relative)) {
                Ok(Some(extra)) => merge_into(&mut value, &extra),
                Ok(None) => {}
                Err(err) => log::debug!("skipping manifest for {handle}: {err}"),
            }
        }

        if let Some(map) = value.as_object_mut() {
            map.remove("events");
        }

        match serde_json::from_value(value) {
            Ok(resolved) => Some(resolved),
            Err(err) => {
                log::debug!("could not resolve config for {handle}: {err}");
                None
            }
        }
    }
}

fn trailing_slash(url: String) -> String {
    if url.is_empty() || url.ends_with('/') {
        url
    } else {
        format!("{url}/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slash() {
        assert_eq!(trailing_slash("https://a.test".into()), "https://a.test/");
        assert_eq!(trailing_slash("https://a.test/".into()), "https://a.test/");
        assert_eq!(trailing_slash(String::new()), "");
    }

    #[test]
    fn test_versioned_url() {
        let manager = AssetsManager::new("https://a.test/assets", "/tmp", "2.0");
        assert_eq!(
            manager.versioned_url("app.css"),
            "https://a.test/assets/app.css?ver=2.0"
        );
        assert_eq!(
            manager.versioned_url("app.css?x=1"),
            "https://a.test/assets/app.css?x=1&ver=2.0"
        );
    }

    #[test]
    fn test_url_empty_without_base() {
        let manager = AssetsManager::new("", "/tmp", "2.0");
        assert_eq!(manager.url("app.css"), "");
        assert_eq!(manager.versioned_url("app.css"), "");
    }
}
