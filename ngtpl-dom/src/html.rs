//! Markup serialization.

use crate::{Document, NodeData, NodeId, is_void};

impl Document {
    pub fn outer_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.write_node(node, &mut out);
        out
    }

    pub fn inner_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        for child in self.children(node) {
            self.write_node(child, &mut out);
        }
        out
    }

    /// Concatenated text of every text node in the subtree.
    pub fn text_content(&self, node: NodeId) -> String {
        match self.data(node) {
            NodeData::Text(t) => t,
            NodeData::Element { .. } => self
                .children(node)
                .into_iter()
                .map(|c| self.text_content(c))
                .collect(),
        }
    }

    fn write_node(&self, node: NodeId, out: &mut String) {
        match self.data(node) {
            NodeData::Text(t) => out.push_str(&escape_text(&t)),
            NodeData::Element { tag, attrs } => {
                out.push('<');
                out.push_str(&tag);
                for a in &attrs {
                    out.push(' ');
                    out.push_str(&a.name);
                    out.push_str("=\"");
                    out.push_str(&escape_attr(&a.value));
                    out.push('"');
                }
                out.push('>');
                if is_void(&tag) {
                    return;
                }
                for child in self.children(node) {
                    self.write_node(child, out);
                }
                out.push_str("</");
                out.push_str(&tag);
                out.push('>');
            }
        }
    }
}

pub fn escape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(ch),
        }
    }
    out
}

pub fn escape_attr(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(ch),
        }
    }
    out
}
