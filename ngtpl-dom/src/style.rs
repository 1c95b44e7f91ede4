//! Inline `style` attribute access, one declaration at a time.

use crate::{Document, NodeId};

/// Split an inline style into `(property, value)` declarations.
pub fn parse_declarations(style: &str) -> Vec<(String, String)> {
    let mut out = Vec::new();
    for decl in style.split(';') {
        let d = decl.trim();
        if d.is_empty() {
            continue;
        }
        if let Some((k, v)) = d.split_once(':') {
            out.push((k.trim().to_string(), v.trim().to_string()));
        }
    }
    out
}

pub fn serialize_declarations(decls: &[(String, String)]) -> String {
    decls
        .iter()
        .map(|(k, v)| format!("{k}: {v};"))
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn style_lookup(style: Option<&str>, key: &str) -> Option<String> {
    parse_declarations(style?)
        .into_iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v)
}

impl Document {
    pub fn style_property(&self, node: NodeId, prop: &str) -> Option<String> {
        let style = self.attr(node, "style");
        style_lookup(style.as_deref(), prop)
    }

    /// Set one declaration of the inline style. An empty value removes it, and
    /// the `style` attribute itself once nothing is left.
    pub fn set_style_property(&self, node: NodeId, prop: &str, value: &str) {
        let style = self.attr(node, "style");
        match with_declaration(style.as_deref(), prop, value) {
            Some(style) => self.set_attr(node, "style", style),
            None => self.remove_attr(node, "style"),
        }
    }
}

/// `style` with `prop` set to `value` (removed when `value` is blank), or
/// `None` when no declaration is left.
pub fn with_declaration(style: Option<&str>, prop: &str, value: &str) -> Option<String> {
    let mut decls = style.map(parse_declarations).unwrap_or_default();
    let value = value.trim();
    if value.is_empty() {
        decls.retain(|(k, _)| k != prop);
    } else {
        match decls.iter_mut().find(|(k, _)| k == prop) {
            Some(slot) => slot.1 = value.to_string(),
            None => decls.push((prop.to_string(), value.to_string())),
        }
    }
    (!decls.is_empty()).then(|| serialize_declarations(&decls))
}
