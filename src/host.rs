//! Host Backend Contract and In-Crate Page Host
//!
//! [`AssetBackend`] is the seam to the platform's low-level asset
//! primitives. [`PageHost`] is this crate's own implementation: plain
//! registered-asset tables plus a deterministic head/footer renderer,
//! standing in for the platform's render pipeline. Later writes to the same
//! handle win.

use indexmap::IndexMap;
use serde_json::Value;

use crate::blocks::{BlockRegistry, MimeMap, BLOCK_LIBRARY_HANDLE};
use crate::manager::AssetsManager;
use crate::tags::{HtmlTag, ScriptTag};

/// Host-owned asset registration/output primitives the manager delegates to.
pub trait AssetBackend {
    /// Register a stylesheet, and enqueue it unless `register_only`.
    /// `src: None` registers a source-less (inline carrier) handle.
    fn register_or_enqueue_style(
        &mut self,
        handle: &str,
        src: Option<&str>,
        deps: &[String],
        version: Option<&str>,
        media: &str,
        register_only: bool,
    );

    fn register_or_enqueue_script(
        &mut self,
        handle: &str,
        src: Option<&str>,
        deps: &[String],
        version: Option<&str>,
        in_footer: bool,
        register_only: bool,
    );

    fn add_inline_style(&mut self, handle: &str, css: &str);

    fn add_inline_script(&mut self, handle: &str, js: &str);

    /// Attach a JSON payload under a variable name, emitted inline before
    /// the script tag.
    fn localize_script(&mut self, handle: &str, name: &str, data: &Value);

    /// Append dependencies to an already-registered script, deduplicated.
    fn append_script_dependencies(&mut self, handle: &str, deps: &[String]);

    fn set_style_path(&mut self, handle: &str, path: &str);

    fn mark_style_deferred(&mut self, handle: &str, defer_as: &str);

    /// Subscribe the stylesheet tag rewrite filter; repeated calls are
    /// deduplicated.
    fn hook_style_tag_filter(&mut self);

    fn hook_script_tag_filter(&mut self);

    /// Resolve a registered block's front or editor script handle.
    fn block_script_handle(&self, block_name: &str, editor: bool) -> Option<String>;
}

/// A stylesheet row in the host tables.
#[derive(Debug, Clone)]
pub struct RegisteredStyle {
    pub src: Option<String>,
    pub dependencies: Vec<String>,
    pub version: Option<String>,
    pub media: String,
    pub enqueued: bool,
    pub inline: Vec<String>,
    pub path: Option<String>,
    pub defer_as: Option<String>,
}

impl Default for RegisteredStyle {
    fn default() -> Self {
        Self {
            src: None,
            dependencies: Vec::new(),
            version: None,
            media: "all".to_string(),
            enqueued: false,
            inline: Vec::new(),
            path: None,
            defer_as: None,
        }
    }
}

/// A script row in the host tables.
#[derive(Debug, Clone, Default)]
pub struct RegisteredScript {
    pub src: Option<String>,
    pub dependencies: Vec<String>,
    pub version: Option<String>,
    pub in_footer: bool,
    pub enqueued: bool,
    pub inline: Vec<String>,
    pub localized: IndexMap<String, Value>,
}

trait HostAsset {
    fn dependencies(&self) -> &[String];
    fn is_enqueued(&self) -> bool;
}

impl HostAsset for RegisteredStyle {
    fn dependencies(&self) -> &[String] {
        &self.dependencies
    }
    fn is_enqueued(&self) -> bool {
        self.enqueued
    }
}

impl HostAsset for RegisteredScript {
    fn dependencies(&self) -> &[String] {
        &self.dependencies
    }
    fn is_enqueued(&self) -> bool {
        self.enqueued
    }
}

/// In-crate page host: asset tables, block registry, upload MIME map, and
/// the render driver.
#[derive(Debug, Clone, Default)]
pub struct PageHost {
    styles: IndexMap<String, RegisteredStyle>,
    scripts: IndexMap<String, RegisteredScript>,
    blocks: BlockRegistry,
    mimes: MimeMap,
    style_filter_hooked: bool,
    script_filter_hooked: bool,
}

impl PageHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn style(&self, handle: &str) -> Option<&RegisteredStyle> {
        self.styles.get(handle)
    }

    pub fn styles(&self) -> &IndexMap<String, RegisteredStyle> {
        &self.styles
    }

    pub fn script(&self, handle: &str) -> Option<&RegisteredScript> {
        self.scripts.get(handle)
    }

    pub fn scripts(&self) -> &IndexMap<String, RegisteredScript> {
        &self.scripts
    }

    pub fn deregister_script(&mut self, handle: &str) {
        self.scripts.shift_remove(handle);
    }

    pub fn set_script_in_footer(&mut self, handle: &str, in_footer: bool) {
        if let Some(script) = self.scripts.get_mut(handle) {
            script.in_footer = in_footer;
        }
    }

    pub fn blocks(&self) -> &BlockRegistry {
        &self.blocks
    }

    pub fn blocks_mut(&mut self) -> &mut BlockRegistry {
        &mut self.blocks
    }

    pub fn mimes(&self) -> &MimeMap {
        &self.mimes
    }

    pub fn mimes_mut(&mut self) -> &mut MimeMap {
        &mut self.mimes
    }

    pub fn is_style_filter_hooked(&self) -> bool {
        self.style_filter_hooked
    }

    pub fn is_script_filter_hooked(&self) -> bool {
        self.script_filter_hooked
    }

    /// Stylesheet links, inline styles and head scripts, dependencies before
    /// dependents, tag filters applied when hooked.
    pub fn render_head(&self, assets: &AssetsManager) -> String {
        let mut out = String::new();
        for handle in dependency_order(&self.styles) {
            let style = &self.styles[&handle];
            if let Some(src) = style.src.as_deref().filter(|s| !s.is_empty()) {
                let mut tag = HtmlTag::new("link")
                    .with_attr("rel", "stylesheet")
                    .with_attr("id", format!("{handle}-css"))
                    .with_attr("href", versioned_src(src, style.version.as_deref()))
                    .with_attr("media", style.media.clone());
                if self.style_filter_hooked {
                    tag = assets.filter_style_tag(tag, &handle);
                }
                out.push_str(&tag.render());
                out.push('\n');
            }
            for css in &style.inline {
                out.push_str(&format!("<style id=\"{handle}-inline-css\">{css}</style>\n"));
            }
        }
        out.push_str(&self.render_scripts(assets, false));
        out
    }

    /// Footer-group scripts.
    pub fn render_footer(&self, assets: &AssetsManager) -> String {
        self.render_scripts(assets, true)
    }

    /// A full page skeleton around [`render_head`](Self::render_head) and
    /// [`render_footer`](Self::render_footer).
    pub fn render_page(&self, assets: &AssetsManager) -> String {
        format!(
            "<!doctype html>\n<html>\n<head>\n{}</head>\n<body>\n{}</body>\n</html>\n",
            self.render_head(assets),
            self.render_footer(assets)
        )
    }

    fn render_scripts(&self, assets: &AssetsManager, footer: bool) -> String {
        let mut out = String::new();
        for handle in dependency_order(&self.scripts) {
            let script = &self.scripts[&handle];
            if script.in_footer != footer {
                continue;
            }
            for (name, data) in &script.localized {
                out.push_str(&format!(
                    "<script id=\"{handle}-js-extra\">var {name} = {data};</script>\n"
                ));
            }
            if let Some(src) = script.src.as_deref().filter(|s| !s.is_empty()) {
                let tag = HtmlTag::new("script")
                    .with_attr("src", versioned_src(src, script.version.as_deref()))
                    .with_attr("id", format!("{handle}-js"))
                    .with_body("");
                let mut script_tag = ScriptTag::new(tag);
                if self.script_filter_hooked {
                    script_tag = assets.filter_script_tag(script_tag, &handle);
                }
                if let Some(code) = &script_tag.before {
                    out.push_str(&format!(
                        "<script id=\"{handle}-js-before\">{code}</script>\n"
                    ));
                }
                out.push_str(&script_tag.tag.render());
                out.push('\n');
                if let Some(code) = &script_tag.after {
                    out.push_str(&format!(
                        "<script id=\"{handle}-js-after\">{code}</script>\n"
                    ));
                }
            }
            for js in &script.inline {
                out.push_str(&format!("<script id=\"{handle}-js-after\">{js}</script>\n"));
            }
        }
        out
    }
}

impl AssetBackend for PageHost {
    fn register_or_enqueue_style(
        &mut self,
        handle: &str,
        src: Option<&str>,
        deps: &[String],
        version: Option<&str>,
        media: &str,
        register_only: bool,
    ) {
        let style = self.styles.entry(handle.to_string()).or_default();
        if let Some(src) = src {
            style.src = Some(src.to_string());
        }
        style.dependencies = deps.to_vec();
        if let Some(version) = version {
            style.version = Some(version.to_string());
        }
        style.media = media.to_string();
        if !register_only {
            style.enqueued = true;
        }
    }

    fn register_or_enqueue_script(
        &mut self,
        handle: &str,
        src: Option<&str>,
        deps: &[String],
        version: Option<&str>,
        in_footer: bool,
        register_only: bool,
    ) {
        let script = self.scripts.entry(handle.to_string()).or_default();
        if let Some(src) = src {
            script.src = Some(src.to_string());
        }
        script.dependencies = deps.to_vec();
        if let Some(version) = version {
            script.version = Some(version.to_string());
        }
        script.in_footer = in_footer;
        if !register_only {
            script.enqueued = true;
        }
    }

    fn add_inline_style(&mut self, handle: &str, css: &str) {
        if let Some(style) = self.styles.get_mut(handle) {
            style.inline.push(css.to_string());
        }
    }

    fn add_inline_script(&mut self, handle: &str, js: &str) {
        if let Some(script) = self.scripts.get_mut(handle) {
            script.inline.push(js.to_string());
        }
    }

    fn localize_script(&mut self, handle: &str, name: &str, data: &Value) {
        if let Some(script) = self.scripts.get_mut(handle) {
            script.localized.insert(name.to_string(), data.clone());
        }
    }

    fn append_script_dependencies(&mut self, handle: &str, deps: &[String]) {
        if let Some(script) = self.scripts.get_mut(handle) {
            for dep in deps {
                if !script.dependencies.contains(dep) {
                    script.dependencies.push(dep.clone());
                }
            }
        }
    }

    fn set_style_path(&mut self, handle: &str, path: &str) {
        if let Some(style) = self.styles.get_mut(handle) {
            style.path = Some(path.to_string());
        }
    }

    fn mark_style_deferred(&mut self, handle: &str, defer_as: &str) {
        if let Some(style) = self.styles.get_mut(handle) {
            style.defer_as = Some(defer_as.to_string());
        }
    }

    fn hook_style_tag_filter(&mut self) {
        self.style_filter_hooked = true;
    }

    fn hook_script_tag_filter(&mut self) {
        self.script_filter_hooked = true;
    }

    fn block_script_handle(&self, block_name: &str, editor: bool) -> Option<String> {
        let block = self.blocks.get(block_name)?;
        if block_name.starts_with("core/") {
            return Some(BLOCK_LIBRARY_HANDLE.to_string());
        }
        if editor {
            block.editor_script.clone()
        } else {
            block.script.clone()
        }
    }
}

/// Handles in print order: dependencies first, then dependents, insertion
/// order otherwise. Registered-only dependencies of an enqueued asset are
/// included; cycles are cut at the back edge.
fn dependency_order<T: HostAsset>(table: &IndexMap<String, T>) -> Vec<String> {
    fn visit<T: HostAsset>(
        table: &IndexMap<String, T>,
        handle: &str,
        order: &mut Vec<String>,
        visiting: &mut Vec<String>,
    ) {
        if order.iter().any(|h| h == handle) || visiting.iter().any(|h| h == handle) {
            return;
        }
        let Some(entry) = table.get(handle) else {
            return;
        };
        visiting.push(handle.to_string());
        for dep in entry.dependencies() {
            visit(table, dep, order, visiting);
        }
        visiting.pop();
        order.push(handle.to_string());
    }

    let mut order = Vec::new();
    let mut visiting = Vec::new();
    for (handle, entry) in table {
        if entry.is_enqueued() {
            visit(table, handle, &mut order, &mut visiting);
        }
    }
    order
}

fn versioned_src(src: &str, version: Option<&str>) -> String {
    match version.filter(|v| !v.is_empty()) {
        Some(version) => {
            let sep = if src.contains('?') { '&' } else { '?' };
            format!("{src}{sep}ver={version}")
        }
        None => src.to_string(),
    }
}
