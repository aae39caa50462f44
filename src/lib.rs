//! PageAssets Core - Declarative Page Asset Pipeline
//!
//! A registry of named style/script descriptors with deferred, phase-driven
//! resolution: descriptors subscribe to lifecycle events, and each dispatch
//! re-resolves their configuration (override callbacks, generated manifest
//! files) before delegating to the host's registration primitives. Includes
//! preload-variant synthesis, inline code injection, typed HTML tag
//! rewriting, and the Lottie block bootstrap built on top of it.

pub mod blocks;
pub mod descriptors;
pub mod host;
pub mod manager;
pub mod manifest;
pub mod merge;
pub mod schedule;
pub mod tags;

pub use blocks::{
    BlockRegistry, BlockType, Bootstrap, LottieBlock, MimeMap, PluginInfo, RenderTarget,
};
pub use descriptors::{ConfigOverride, EventMap, Handle, ScriptConfig, StyleConfig};
pub use host::{AssetBackend, PageHost, RegisteredScript, RegisteredStyle};
pub use manager::{AssetKind, AssetRef, AssetsManager};
pub use manifest::{load_manifest, ManifestError};
pub use merge::{merge_into, merged};
pub use schedule::EventSchedule;
pub use tags::{AttrValue, HtmlTag, ScriptTag, TagAttributes};

pub const CORE_VERSION: &str = env!("CARGO_PKG_VERSION");
