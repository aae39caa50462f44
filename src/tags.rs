//! Typed HTML Tag Model
//!
//! Replaces string-spliced tag rewriting with an ordered attribute map and
//! an explicit serializer. Rewrite hooks operate on `HtmlTag` values, never
//! on raw markup.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Reserved attribute key carrying literal code emitted before a script tag.
pub const INLINE_BEFORE: &str = "inline-before";
/// Reserved attribute key carrying literal code emitted after a script tag.
pub const INLINE_AFTER: &str = "inline-after";

/// An attribute value: either a presence-only flag (`async`, `defer`) or a
/// quoted value. A `Flag(false)` is treated as absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Flag(bool),
    Value(String),
}

impl AttrValue {
    pub fn value(text: impl Into<String>) -> Self {
        AttrValue::Value(text.into())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Value(text) => Some(text),
            AttrValue::Flag(_) => None,
        }
    }
}

/// Descriptor-supplied extra attributes, in insertion order.
pub type TagAttributes = IndexMap<String, AttrValue>;

/// A single HTML element with ordered attributes. Tags without a body render
/// in self-closing form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlTag {
    name: String,
    attributes: IndexMap<String, AttrValue>,
    body: Option<String>,
}

impl HtmlTag {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: IndexMap::new(),
            body: None,
        }
    }

    /// Builder form of [`set_attr`](Self::set_attr).
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Set a quoted attribute. An existing attribute keeps its position.
    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attributes
            .insert(name.into(), AttrValue::Value(value.into()));
    }

    /// Set a presence-only attribute.
    pub fn set_flag(&mut self, name: impl Into<String>) {
        self.attributes.insert(name.into(), AttrValue::Flag(true));
    }

    pub fn remove_attr(&mut self, name: &str) {
        self.attributes.shift_remove(name);
    }

    pub fn attr(&self, name: &str) -> Option<&AttrValue> {
        self.attributes.get(name)
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push('<');
        out.push_str(&self.name);
        for (name, value) in &self.attributes {
            match value {
                AttrValue::Flag(true) => {
                    out.push(' ');
                    out.push_str(name);
                }
                AttrValue::Flag(false) => {}
                AttrValue::Value(text) => {
                    out.push(' ');
                    out.push_str(name);
                    out.push_str("=\"");
                    out.push_str(&escape_attr(text));
                    out.push('"');
                }
            }
        }
        match &self.body {
            Some(body) => {
                out.push('>');
                out.push_str(body);
                out.push_str("</");
                out.push_str(&self.name);
                out.push('>');
            }
            None => out.push_str(" />"),
        }
        out
    }
}

impl fmt::Display for HtmlTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// A script tag plus the literal code fragments emitted around it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptTag {
    pub before: Option<String>,
    pub tag: HtmlTag,
    pub after: Option<String>,
}

impl ScriptTag {
    pub fn new(tag: HtmlTag) -> Self {
        Self {
            before: None,
            tag,
            after: None,
        }
    }
}

/// Merge descriptor attributes into a stylesheet tag.
///
/// `rel` and `media` replace any existing attribute of the same name; an
/// empty value removes the attribute entirely. Other names are set in
/// descriptor order.
pub fn apply_style_attributes(tag: &mut HtmlTag, attributes: &TagAttributes) {
    for (name, value) in attributes {
        match value {
            AttrValue::Value(text) if name == "rel" || name == "media" => {
                tag.remove_attr(name);
                if !text.is_empty() {
                    tag.set_attr(name, text);
                }
            }
            AttrValue::Value(text) => tag.set_attr(name, text),
            AttrValue::Flag(true) => tag.set_flag(name),
            AttrValue::Flag(false) => {}
        }
    }
}

/// Merge descriptor attributes into a script tag, extracting the reserved
/// `inline-before` / `inline-after` code fragments.
pub fn apply_script_attributes(tag: &mut ScriptTag, attributes: &TagAttributes) {
    for (name, value) in attributes {
        match (name.as_str(), value) {
            (INLINE_BEFORE, AttrValue::Value(code)) => tag.before = Some(code.clone()),
            (INLINE_AFTER, AttrValue::Value(code)) => tag.after = Some(code.clone()),
            (INLINE_BEFORE | INLINE_AFTER, AttrValue::Flag(_)) => {}
            (_, AttrValue::Value(text)) => tag.tag.set_attr(name, text),
            (_, AttrValue::Flag(true)) => tag.tag.set_flag(name),
            (_, AttrValue::Flag(false)) => {}
        }
    }
}

fn escape_attr(text: &str) -> String {
    text.replace('&', "&amp;").replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_self_closing() {
        let tag = HtmlTag::new("link")
            .with_attr("rel", "stylesheet")
            .with_attr("href", "a.css");
        assert_eq!(tag.render(), r#"<link rel="stylesheet" href="a.css" />"#);
    }

    #[test]
    fn test_render_flag_and_body() {
        let mut tag = HtmlTag::new("script").with_attr("src", "a.js").with_body("");
        tag.set_flag("defer");
        assert_eq!(tag.render(), r#"<script src="a.js" defer></script>"#);
    }

    #[test]
    fn test_empty_rel_and_media_removed() {
        let mut tag = HtmlTag::new("link")
            .with_attr("rel", "stylesheet")
            .with_attr("href", "a.css")
            .with_attr("media", "all");

        let mut attrs = TagAttributes::new();
        attrs.insert("id".into(), AttrValue::value("x"));
        attrs.insert("media".into(), AttrValue::value(""));
        attrs.insert("rel".into(), AttrValue::value(""));
        apply_style_attributes(&mut tag, &attrs);

        assert_eq!(tag.render(), r#"<link href="a.css" id="x" />"#);
    }

    #[test]
    fn test_inline_fragments_extracted() {
        let mut tag = ScriptTag::new(HtmlTag::new("script").with_attr("src", "a.js").with_body(""));

        let mut attrs = TagAttributes::new();
        attrs.insert(INLINE_BEFORE.into(), AttrValue::value("window.a=1;"));
        attrs.insert("async".into(), AttrValue::Flag(true));
        apply_script_attributes(&mut tag, &attrs);

        assert_eq!(tag.before.as_deref(), Some("window.a=1;"));
        assert!(tag.after.is_none());
        assert_eq!(tag.tag.render(), r#"<script src="a.js" async></script>"#);
    }

    #[test]
    fn test_attr_escaping() {
        let tag = HtmlTag::new("link").with_attr("title", r#"a "b" & c"#);
        assert_eq!(tag.render(), r#"<link title="a &quot;b&quot; &amp; c" />"#);
    }
}
