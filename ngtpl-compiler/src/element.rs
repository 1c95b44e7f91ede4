use std::ops::Range;

use futures::FutureExt;
use futures::future::LocalBoxFuture;
use ngtpl_dom::{Document, NodeId};
use ngtpl_expr::EvalError;
use tracing::{debug, trace};

use crate::attributes::Flow;
use crate::directive::OUTLET_ATTR;
use crate::error::CompileError;
use crate::evaluator::Evaluator;
use crate::options::CompileOptions;
use crate::template::TemplateRegistry;

/// Upper bound on substitutions in one text node.
const MAX_INTERPOLATIONS: usize = 10_000;

/// State shared by every node of one top-level compile.
pub(crate) struct Session<'a> {
    pub(crate) doc: &'a Document,
    pub(crate) registry: &'a TemplateRegistry,
    pub(crate) options: &'a CompileOptions,
}

impl Session<'_> {
    pub(crate) fn compile_element(
        &self,
        node: NodeId,
        evaluator: Evaluator,
    ) -> LocalBoxFuture<'_, Result<(), CompileError>> {
        async move {
            let Some(tag) = self.doc.tag(node) else {
                return self.interpolate(node, &evaluator).await;
            };
            if tag == self.options.fragment_tag {
                return Ok(());
            }
            if tag == self.options.container_tag {
                return match self.doc.attr(node, OUTLET_ATTR) {
                    Some(name) => self.expand_outlet(node, name.trim(), &evaluator).await,
                    None => self.unwrap_container(node, evaluator).await,
                };
            }

            let Flow::Continue(evaluator) = self.process_attributes(node, evaluator).await? else {
                return Ok(());
            };
            for child in self.doc.element_children(node).into_iter().rev() {
                self.compile_element(child, evaluator.clone()).await?;
            }
            for child in self.doc.children(node) {
                if !self.doc.is_element(child) {
                    self.interpolate(child, &evaluator).await?;
                }
            }
            Ok(())
        }
        .boxed_local()
    }

    pub(crate) fn require_parent(&self, node: NodeId) -> Result<NodeId, CompileError> {
        self.doc.parent(node).ok_or_else(|| CompileError::Detached {
            tag: self.doc.tag(node).unwrap_or_default(),
        })
    }

    /// Replace an outlet with a compiled copy of the fragment it names.
    async fn expand_outlet(
        &self,
        outlet: NodeId,
        name: &str,
        evaluator: &Evaluator,
    ) -> Result<(), CompileError> {
        let key = format!("{}{}", self.options.marker_prefix, name);
        match self.registry.get(&key) {
            None => debug!(fragment = %key, "outlet names an unknown fragment"),
            Some(fragment) => {
                self.require_parent(outlet)?;
                debug!(fragment = %key, "expanding outlet");
                let content = self.doc.children(fragment);
                if self.doc.element_children(fragment).is_empty() {
                    let wrapper = self.doc.create_element(self.options.text_wrapper_tag.as_str());
                    for child in content {
                        let copy = self.doc.deep_clone(child);
                        self.doc.append_child(wrapper, copy)?;
                    }
                    self.doc.insert_before(outlet, wrapper)?;
                    self.compile_element(wrapper, evaluator.clone()).await?;
                } else {
                    for child in content {
                        let copy = self.doc.deep_clone(child);
                        self.doc.insert_before(outlet, copy)?;
                        self.compile_element(copy, evaluator.clone()).await?;
                    }
                }
            }
        }
        self.doc.remove(outlet);
        Ok(())
    }

    /// Put compiled copies of a grouping container's children in its place.
    async fn unwrap_container(
        &self,
        container: NodeId,
        evaluator: Evaluator,
    ) -> Result<(), CompileError> {
        let Flow::Continue(evaluator) = self.process_attributes(container, evaluator).await? else {
            return Ok(());
        };
        for child in self.doc.children(container) {
            self.require_parent(container)?;
            let copy = self.doc.deep_clone(child);
            self.doc.insert_before(container, copy)?;
            self.compile_element(copy, evaluator.clone()).await?;
        }
        self.doc.remove(container);
        Ok(())
    }

    /// Resolve `{{ expr }}` markers in a text node, always taking the first
    /// one left, so markers produced by a substitution are resolved as well.
    async fn interpolate(&self, node: NodeId, evaluator: &Evaluator) -> Result<(), CompileError> {
        let Some(mut text) = self.doc.text(node) else {
            return Ok(());
        };
        let mut replaced = 0;
        while let Some((span, expr)) = find_interpolation(&text, 0) {
            if replaced == MAX_INTERPOLATIONS {
                return Err(EvalError::Type(format!(
                    "interpolation did not settle after {MAX_INTERPOLATIONS} substitutions"
                ))
                .into());
            }
            let expr = expr.to_string();
            let value = evaluator.eval(&expr).await?;
            let replacement = if value.is_nullish() {
                String::new()
            } else {
                value.to_string()
            };
            trace!(expr = %expr, value = %replacement, "interpolated");
            text.replace_range(span, &replacement);
            replaced += 1;
        }
        if replaced > 0 {
            self.doc.set_text(node, text);
        }
        Ok(())
    }
}

/// Expressions of every `{{ expr }}` marker in `text`, in order.
pub fn interpolations(text: &str) -> Vec<&str> {
    let mut found = Vec::new();
    let mut from = 0;
    while let Some((span, expr)) = find_interpolation(text, from) {
        found.push(expr);
        from = span.end;
    }
    found
}

/// The first `{{ expr }}` marker at or after byte `from`: its span and the
/// expression inside.
fn find_interpolation(text: &str, from: usize) -> Option<(Range<usize>, &str)> {
    let mut cursor = from;
    while let Some(offset) = text.get(cursor..)?.find("{{") {
        let start = cursor + offset;
        let body = start + 2;
        let close = text[body..].find('}').map_or(text.len(), |i| body + i);
        if text[close..].starts_with("}}") {
            return Some((start..close + 2, text[body..close].trim_start()));
        }
        cursor = start + 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_markers_in_order() {
        let text = "{{a}}: {{ a + b }}";
        let (span, expr) = find_interpolation(text, 0).unwrap();
        assert_eq!((span.clone(), expr), (0..5, "a"));
        let (span, expr) = find_interpolation(text, span.end).unwrap();
        assert_eq!((span, expr), (7..18, "a + b "));
    }

    #[test]
    fn lists_every_marker() {
        assert_eq!(interpolations("{{a}} and {{ b.c }}!"), vec!["a", "b.c "]);
        assert!(interpolations("plain").is_empty());
    }

    #[test]
    fn unclosed_or_broken_markers_are_text() {
        assert_eq!(find_interpolation("{{ a }", 0), None);
        assert_eq!(find_interpolation("{{ a } }}", 0), None);
        assert_eq!(find_interpolation("no markers", 0), None);
        assert_eq!(
            find_interpolation("{{ x } {{y}}", 0).map(|(_, e)| e),
            Some("y")
        );
    }
}
