//! Block Types and the Plugin Bootstrap
//!
//! Explicit typed registries replace the host platform's reflective
//! component container. The Lottie block is the one block this plugin ships.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::host::PageHost;

/// Script handle shared by all core-namespaced blocks.
pub const BLOCK_LIBRARY_HANDLE: &str = "block-library";

/// A registered block type and its asset handles.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockType {
    pub name: String,
    #[serde(default)]
    pub script: Option<String>,
    #[serde(default)]
    pub editor_script: Option<String>,
    #[serde(default)]
    pub style: Option<String>,
    #[serde(default)]
    pub editor_style: Option<String>,
}

/// Block type registry.
#[derive(Debug, Clone, Default)]
pub struct BlockRegistry {
    blocks: IndexMap<String, BlockType>,
}

impl BlockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a block type. Returns false when the name is already taken.
    pub fn register(&mut self, block: BlockType) -> bool {
        if self.blocks.contains_key(&block.name) {
            return false;
        }
        self.blocks.insert(block.name.clone(), block);
        true
    }

    pub fn get(&self, name: &str) -> Option<&BlockType> {
        self.blocks.get(name)
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.blocks.contains_key(name)
    }

    pub fn list(&self) -> Vec<&BlockType> {
        self.blocks.values().collect()
    }
}

/// Accepted upload file types, extension to MIME type.
#[derive(Debug, Clone, Default)]
pub struct MimeMap {
    types: IndexMap<String, String>,
}

impl MimeMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allow(&mut self, extension: &str, mime: &str) {
        self.types.insert(extension.to_string(), mime.to_string());
    }

    pub fn mime_for(&self, extension: &str) -> Option<&str> {
        self.types.get(extension).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

/// Whether the page renders for a public visitor or inside the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderTarget {
    Public,
    Editor,
}

/// Plugin identity consumed by the asset layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginInfo {
    pub name: String,
    pub version: String,
    pub text_domain: String,
}

/// The Lottie animation block.
pub struct LottieBlock;

impl LottieBlock {
    pub const NAME: &'static str = "xpac/lottie";
    pub const VIEW_SCRIPT: &'static str = "xpac-lottie-view";
    pub const EDITOR_SCRIPT: &'static str = "xpac-lottie-editor";
    pub const STYLE: &'static str = "xpac-lottie-style";

    pub fn block_type() -> BlockType {
        BlockType {
            name: Self::NAME.to_string(),
            script: Some(Self::VIEW_SCRIPT.to_string()),
            editor_script: Some(Self::EDITOR_SCRIPT.to_string()),
            style: Some(Self::STYLE.to_string()),
            editor_style: None,
        }
    }

    /// Register the block and adjust its view script for the render target:
    /// the editor drops it, public pages load it in the footer group.
    pub fn register(target: RenderTarget, host: &mut PageHost) -> bool {
        if !host.blocks_mut().register(Self::block_type()) {
            return false;
        }
        match target {
            RenderTarget::Editor => host.deregister_script(Self::VIEW_SCRIPT),
            RenderTarget::Public => host.set_script_in_footer(Self::VIEW_SCRIPT, true),
        }
        true
    }
}

/// Plugin bootstrap: the startup wiring the plugin performs on the host.
#[derive(Debug, Clone)]
pub struct Bootstrap {
    pub info: PluginInfo,
}

impl Bootstrap {
    pub fn new(info: PluginInfo) -> Self {
        Self { info }
    }

    pub fn lottie() -> Self {
        Self::new(PluginInfo {
            name: "XPAC Lottie Interactive Animations".to_string(),
            version: "1.0.0".to_string(),
            text_domain: "xpac-lottie".to_string(),
        })
    }

    /// Upload MIME filter: Lottie animation JSON uploads are stored as text.
    pub fn update_mimes(&self, mimes: &mut MimeMap) {
        mimes.allow("json", "text/plain");
    }

    /// Startup wiring against the host.
    pub fn install(&self, host: &mut PageHost) {
        self.update_mimes(host.mimes_mut());
    }

    /// Init-phase block registration, ahead of the default-priority asset
    /// enqueues.
    pub fn register_blocks(&self, target: RenderTarget, host: &mut PageHost) {
        LottieBlock::register(target, host);
    }
}
