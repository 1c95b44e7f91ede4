use futures::future::try_join_all;
use ngtpl_dom::style::with_declaration;
use ngtpl_dom::{Attr, NodeId};
use ngtpl_expr::{EvalError, Value};
use tracing::debug;

use crate::directive::Directive;
use crate::element::Session;
use crate::error::CompileError;
use crate::evaluator::Evaluator;

/// Outcome of resolving the directives on one node.
pub(crate) enum Flow {
    /// Keep compiling the node's children with this evaluator.
    Continue(Evaluator),
    /// The node was removed or already compiled in full.
    Handled,
}

/// Attribute list being rebuilt for one node.
///
/// Bound attributes that do not replace an existing one go after every plain
/// attribute, and `[class.x]` toggles are merged in last.
#[derive(Default)]
struct Output {
    plain: Vec<Attr>,
    bound: Vec<Attr>,
    classes: String,
}

impl Output {
    fn keep(&mut self, attr: &Attr) {
        let value = match self.bound.iter().position(|a| a.name == attr.name) {
            Some(i) => self.bound.remove(i).value,
            None => attr.value.clone(),
        };
        self.plain.push(Attr::new(attr.name.clone(), value));
    }

    fn bind(&mut self, name: &str, value: String) {
        let existing = self
            .plain
            .iter_mut()
            .chain(self.bound.iter_mut())
            .find(|a| a.name == name);
        match existing {
            Some(a) => a.value = value,
            None => self.bound.push(Attr::new(name, value)),
        }
    }

    /// Write one style declaration into whichever `style` attribute the node
    /// ends up with, including one that is still `pending`.
    fn set_style(&mut self, pending: &[Attr], prop: &str, value: &str) {
        let current = self
            .plain
            .iter()
            .chain(&self.bound)
            .chain(pending)
            .find(|a| a.name == "style")
            .map(|a| a.value.clone());
        match with_declaration(current.as_deref(), prop, value) {
            Some(style) => self.bind("style", style),
            None => {
                self.plain.retain(|a| a.name != "style");
                self.bound.retain(|a| a.name != "style");
            }
        }
    }

    fn add_class(&mut self, class: &str) {
        self.classes.push(' ');
        self.classes.push_str(class);
    }

    /// Final list; `pending` are attributes not yet processed, kept in their place.
    fn finish(self, pending: &[Attr]) -> Vec<Attr> {
        let Output {
            plain,
            bound,
            classes,
        } = self;
        let mut attrs = plain;
        attrs.extend(pending.iter().cloned());
        attrs.extend(bound);
        if !classes.is_empty() {
            match attrs.iter_mut().find(|a| a.name == "class") {
                Some(class) => class.value.push_str(&classes),
                None => attrs.push(Attr::new("class", classes.trim())),
            }
        }
        attrs
    }
}

impl Session<'_> {
    /// Resolve every directive attribute on `node` in source order.
    pub(crate) async fn process_attributes(
        &self,
        node: NodeId,
        evaluator: Evaluator,
    ) -> Result<Flow, CompileError> {
        let attrs = self.doc.attrs(node);
        let mut evaluator = evaluator;
        let mut out = Output::default();

        for (i, attr) in attrs.iter().enumerate() {
            match Directive::classify(&attr.name, &attr.value) {
                Directive::If { test, alias } => {
                    let value = evaluator.eval(test).await?;
                    if !value.is_truthy() {
                        debug!(test, "condition is falsy, removing node");
                        self.doc.remove(node);
                        return Ok(Flow::Handled);
                    }
                    if let Some(alias) = alias {
                        evaluator = evaluator.bind(alias, value);
                    }
                }
                Directive::For { var, source } => {
                    let items = evaluator.eval(source).await?;
                    let template = out.finish(&attrs[i + 1..]);
                    self.doc.set_attrs(node, template);
                    return self.unroll(node, var, items, &evaluator).await;
                }
                Directive::Property { name, expr } => {
                    let value = evaluator.eval(expr).await?;
                    if value.is_nullish() {
                        return Err(EvalError::Type(format!(
                            "cannot bind {} to [{name}]",
                            value.type_name()
                        ))
                        .into());
                    }
                    out.bind(name, value.to_string());
                }
                Directive::ClassToggle { class, expr } => {
                    if evaluator.eval(expr).await?.is_truthy() {
                        out.add_class(class);
                    }
                }
                Directive::Style { prop, raw } => out.set_style(&attrs[i + 1..], prop, raw),
                Directive::StyleUnit { prop, unit, expr } => {
                    let value = evaluator.eval(expr).await?;
                    out.set_style(&attrs[i + 1..], prop, &format!("{value}{unit}"));
                }
                Directive::Outlet { .. } | Directive::Plain => out.keep(attr),
            }
        }

        self.doc.set_attrs(node, out.finish(&[]));
        Ok(Flow::Continue(evaluator))
    }

    /// Turn `node` into one instance per item and compile them all.
    async fn unroll(
        &self,
        node: NodeId,
        var: &str,
        items: Value,
        evaluator: &Evaluator,
    ) -> Result<Flow, CompileError> {
        let items = items.as_array().map(<[Value]>::to_vec).unwrap_or_default();
        debug!(var, count = items.len(), "unrolling loop");
        if items.is_empty() {
            self.doc.remove(node);
            return Ok(Flow::Handled);
        }
        if items.len() > 1 {
            self.require_parent(node)?;
        }

        let mut instances = vec![node];
        let mut previous = node;
        for _ in 1..items.len() {
            let copy = self.doc.deep_clone(node);
            self.doc.insert_after(previous, copy)?;
            instances.push(copy);
            previous = copy;
        }

        try_join_all(
            instances
                .into_iter()
                .zip(items)
                .map(|(instance, item)| self.compile_element(instance, evaluator.bind(var, item))),
        )
        .await?;
        Ok(Flow::Handled)
    }
}
