//! Pipeline Invariant Tests

use serde_json::json;
use std::fs;

use pageassets_core::{
    AssetBackend, AssetsManager, AttrValue, BlockType, ConfigOverride, EventMap, LottieBlock,
    PageHost, ScriptConfig, StyleConfig,
};

fn demo_manager() -> AssetsManager {
    AssetsManager::new("https://example.test/assets/", "/nonexistent", "1.0.0")
}

fn style(url: &str) -> StyleConfig {
    StyleConfig {
        url: url.to_string(),
        ..Default::default()
    }
}

fn script(url: &str) -> ScriptConfig {
    ScriptConfig {
        url: url.to_string(),
        ..Default::default()
    }
}

#[test]
fn invariant_add_style_is_idempotent() {
    let mut manager = demo_manager();
    manager.add_style("app", style("app.css"));
    manager.add_style("app", style("other.css"));

    assert_eq!(manager.get_style("app").unwrap().url, "app.css");
}

#[test]
fn invariant_removed_handle_readds_with_fresh_defaults() {
    let mut manager = demo_manager();
    let mut config = style("app.css");
    config.media = "print".to_string();
    manager.add_style("app", config);

    manager.remove_style("app");
    manager.add_style("app", style("app.css"));

    assert_eq!(manager.get_style("app").unwrap().media, "all");
}

#[test]
fn invariant_update_unknown_handle_is_noop() {
    let mut manager = demo_manager();
    manager.update_style("ghost", style("ghost.css"));
    manager.update_script("ghost", script("ghost.js"));

    assert!(manager.get_style("ghost").is_none());
    assert!(manager.get_script("ghost").is_none());
}

#[test]
fn invariant_preload_synthesizes_single_sibling() {
    let mut manager = demo_manager();
    let mut config = style("app.css");
    config.preload.insert("as".to_string(), "style".to_string());
    manager.add_style("app", config);
    manager.run();

    let mut host = PageHost::new();
    manager.dispatch("init", &mut host);

    let preload = manager.get_style("app-preload").unwrap();
    assert!(preload.preload.is_empty());
    assert_eq!(
        preload.attributes.get("rel").and_then(AttrValue::as_str),
        Some("preload")
    );
    assert!(host.style("app-preload").unwrap().enqueued);

    // a second fire does not multiply siblings
    manager.dispatch("init", &mut host);
    assert_eq!(manager.styles().len(), 2);
}

#[test]
fn invariant_manifest_remerge_is_idempotent_and_live() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = dir.path().join("app.asset.json");
    fs::write(&manifest, r#"{"dependencies": ["runtime"], "version": "abc"}"#).unwrap();

    let mut manager = AssetsManager::new("https://example.test/", dir.path(), "1.0.0");
    let mut config = style("app.css");
    config.dependencies = vec!["base".to_string()];
    config.manifest = Some("app.asset.json".to_string());
    manager.add_style("app", config);
    manager.run();

    let mut host = PageHost::new();
    manager.dispatch("init", &mut host);
    assert_eq!(host.style("app").unwrap().dependencies, ["base", "runtime"]);
    assert_eq!(host.style("app").unwrap().version.as_deref(), Some("abc"));

    // re-firing with an identical manifest adds nothing
    manager.dispatch("init", &mut host);
    assert_eq!(host.style("app").unwrap().dependencies, ["base", "runtime"]);

    // a rebuilt manifest takes effect on the next fire, without re-registration
    fs::write(
        &manifest,
        r#"{"dependencies": ["runtime", "dom"], "version": "def"}"#,
    )
    .unwrap();
    manager.dispatch("init", &mut host);
    assert_eq!(
        host.style("app").unwrap().dependencies,
        ["base", "runtime", "dom"]
    );
    assert_eq!(host.style("app").unwrap().version.as_deref(), Some("def"));
}

#[test]
fn invariant_localize_merges_payloads() {
    let mut manager = demo_manager();
    manager.add_script("app", script("app.js"));
    manager.localize_script("app", "appSettings", json!({"api": {"base": "/v1"}, "keep": true}));
    manager.localize_script("app", "appSettings", json!({"api": {"base": "/v2", "timeout": 5}}));

    let data = &manager.get_script("app").unwrap().data["appSettings"];
    assert_eq!(
        *data,
        json!({"api": {"base": "/v2", "timeout": 5}, "keep": true})
    );
}

#[test]
fn invariant_localize_unknown_handle_is_noop() {
    let mut manager = demo_manager();
    manager.localize_script("ghost", "data", json!({"a": 1}));
    assert!(manager.get_script("ghost").is_none());
}

#[test]
fn invariant_empty_attributes_strip_from_rendered_tag() {
    let mut manager = demo_manager();
    let mut config = style("demo.css");
    config.attributes.insert("id".to_string(), AttrValue::value("x"));
    config.attributes.insert("media".to_string(), AttrValue::value(""));
    config.attributes.insert("rel".to_string(), AttrValue::value(""));
    manager.add_style("demo", config);
    manager.run();

    let mut host = PageHost::new();
    manager.dispatch("init", &mut host);
    let head = host.render_head(&manager);

    assert!(head.contains(r#"id="x""#));
    assert!(!head.contains("rel="));
    assert!(!head.contains("media="));
    assert!(head.contains("demo.css?ver=1.0.0"));
}

#[test]
fn invariant_orphan_script_registers_once() {
    let mut manager = demo_manager();
    let mut host = PageHost::new();
    manager.add_orphan_script("inline1", "console.log(1)", true, &mut host);
    manager.add_orphan_script("inline1", "console.log(1)", true, &mut host);

    let registered = host.script("inline1").unwrap();
    assert_eq!(registered.inline, ["console.log(1)"]);
    assert!(registered.enqueued);
    assert!(registered.in_footer);
}

#[test]
fn invariant_orphan_style_renders_inline_only() {
    let mut manager = demo_manager();
    let mut host = PageHost::new();
    manager.add_orphan_style("critical", "body{margin:0}", &mut host);

    let head = host.render_head(&manager);
    assert!(head.contains(r#"<style id="critical-inline-css">body{margin:0}</style>"#));
    assert!(!head.contains("critical-css"));
}

#[test]
fn invariant_dispatch_order_is_priority_then_insertion() {
    let mut manager = demo_manager();
    let mut late = style("late.css");
    late.events = EventMap::single("init", 20);
    let mut early = style("early.css");
    early.events = EventMap::single("init", 5);
    manager.add_style("late", late);
    manager.add_style("early", early);
    manager.add_style("mid", style("mid.css"));
    manager.run();

    let mut host = PageHost::new();
    manager.dispatch("init", &mut host);

    let order: Vec<&str> = host.styles().keys().map(String::as_str).collect();
    assert_eq!(order, ["early", "mid", "late"]);
}

#[test]
fn invariant_descriptors_added_after_run_fire() {
    let mut manager = demo_manager();
    manager.run();
    manager.add_style("late", style("late.css"));

    let mut host = PageHost::new();
    manager.dispatch("init", &mut host);
    assert!(host.style("late").is_some());
}

#[test]
fn invariant_removed_descriptor_subscription_noops() {
    let mut manager = demo_manager();
    manager.add_style("app", style("app.css"));
    manager.run();
    manager.remove_style("app");

    let mut host = PageHost::new();
    manager.dispatch("init", &mut host);
    assert!(host.style("app").is_none());
}

#[test]
fn invariant_register_only_does_not_enqueue() {
    let mut manager = demo_manager();
    let mut config = style("app.css");
    config.register = true;
    manager.add_style("app", config);
    manager.run();

    let mut host = PageHost::new();
    manager.dispatch("init", &mut host);
    let registered = host.style("app").unwrap();
    assert!(!registered.enqueued);
    assert!(host.render_head(&manager).is_empty());
}

#[test]
fn invariant_external_url_used_verbatim() {
    let mut manager = demo_manager();
    let mut config = script("https://cdn.example.test/player.js");
    config.external = true;
    manager.add_script("player", config);
    manager.run();

    let mut host = PageHost::new();
    manager.dispatch("init", &mut host);
    assert_eq!(
        host.script("player").unwrap().src.as_deref(),
        Some("https://cdn.example.test/player.js")
    );
}

#[test]
fn invariant_urlless_descriptor_enqueue_noops() {
    let mut manager = demo_manager();
    manager.add_style("bare", StyleConfig::default());
    manager.run();

    let mut host = PageHost::new();
    manager.dispatch("init", &mut host);
    assert!(host.style("bare").is_none());
}

#[test]
fn invariant_callback_patch_applies_at_fire_time() {
    let mut manager = demo_manager();
    let mut config = style("app.css");
    config.callback = Some(ConfigOverride::new(|_, _| Some(json!({"media": "print"}))));
    manager.add_style("app", config);
    manager.run();

    let mut host = PageHost::new();
    manager.dispatch("init", &mut host);
    assert_eq!(host.style("app").unwrap().media, "print");
    // the stored descriptor is untouched; resolution recomputes per fire
    assert_eq!(manager.get_style("app").unwrap().media, "all");
}

#[test]
fn invariant_block_dependency_edits() {
    let mut host = PageHost::new();
    host.register_or_enqueue_script(
        LottieBlock::EDITOR_SCRIPT,
        Some("blocks/lottie/editor.js"),
        &[],
        None,
        false,
        false,
    );
    host.register_or_enqueue_script("block-library", Some("blocks.js"), &[], None, false, false);
    host.blocks_mut().register(LottieBlock::block_type());
    host.blocks_mut().register(BlockType {
        name: "core/paragraph".to_string(),
        script: None,
        editor_script: None,
        style: None,
        editor_style: None,
    });

    let manager = demo_manager();
    manager.register_block_script_dependency(
        LottieBlock::NAME,
        true,
        &["lottie-player".to_string()],
        &mut host,
    );
    assert_eq!(
        host.script(LottieBlock::EDITOR_SCRIPT).unwrap().dependencies,
        ["lottie-player"]
    );

    // core-namespaced blocks resolve to the shared block library handle
    manager.register_block_script_dependency(
        "core/paragraph",
        false,
        &["polyfill".to_string()],
        &mut host,
    );
    assert_eq!(
        host.script("block-library").unwrap().dependencies,
        ["polyfill"]
    );

    // duplicate and unknown-block edits are ignored
    manager.register_block_script_dependency(
        "core/paragraph",
        false,
        &["polyfill".to_string()],
        &mut host,
    );
    assert_eq!(
        host.script("block-library").unwrap().dependencies,
        ["polyfill"]
    );
    manager.register_block_script_dependency(
        "xpac/unknown",
        false,
        &["nothing".to_string()],
        &mut host,
    );
    assert!(host.script("nothing").is_none());
}

#[test]
fn invariant_render_orders_dependencies_and_inlines() {
    let mut manager = demo_manager();
    let mut app = script("app.js");
    app.dependencies = vec!["vendor".to_string()];
    app.data
        .insert("appSettings".to_string(), json!({"locale": "en"}));
    app.attributes.insert(
        "inline-before".to_string(),
        AttrValue::value("window.__boot=1;"),
    );
    manager.add_script("app", app);
    manager.add_script("vendor", script("vendor.js"));
    manager.run();

    let mut host = PageHost::new();
    manager.dispatch("init", &mut host);
    let head = host.render_head(&manager);

    let vendor_at = head.find("vendor.js").unwrap();
    let app_at = head.find("app.js").unwrap();
    assert!(vendor_at < app_at);

    let extra_at = head
        .find(r#"<script id="app-js-extra">var appSettings = {"locale":"en"};</script>"#)
        .unwrap();
    let before_at = head
        .find(r#"<script id="app-js-before">window.__boot=1;</script>"#)
        .unwrap();
    assert!(extra_at < app_at);
    assert!(before_at < app_at);
}

#[test]
fn invariant_footer_scripts_leave_the_head() {
    let mut manager = demo_manager();
    let mut config = script("app.js");
    config.in_footer = true;
    manager.add_script("app", config);
    manager.run();

    let mut host = PageHost::new();
    manager.dispatch("init", &mut host);

    assert!(!host.render_head(&manager).contains("app.js"));
    assert!(host.render_footer(&manager).contains("app.js"));
}
