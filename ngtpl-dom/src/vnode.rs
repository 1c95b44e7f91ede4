use crate::{Attr, Document, DomError, NodeData, NodeId};

/// Immutable structural view of a subtree.
#[derive(Debug, Clone, PartialEq)]
pub enum VNode {
    Element {
        tag: String,
        props: Props,
        children: Vec<VNode>,
    },
    Text(String),
}

/// Attributes in source order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Props {
    pub attrs: Vec<(String, String)>,
}

impl Props {
    pub fn new() -> Self {
        Self { attrs: Vec::new() }
    }
    pub fn set(mut self, k: impl Into<String>, v: impl Into<String>) -> Self {
        let k = k.into();
        let v = v.into();
        match self.attrs.iter_mut().find(|(name, _)| *name == k) {
            Some(slot) => slot.1 = v,
            None => self.attrs.push((k, v)),
        }
        self
    }
    pub fn get(&self, k: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(name, _)| name == k)
            .map(|(_, v)| v.as_str())
    }
}

// Allow concise props creation
impl From<()> for Props {
    fn from(_: ()) -> Self {
        Props::default()
    }
}
impl From<Vec<(&str, &str)>> for Props {
    fn from(v: Vec<(&str, &str)>) -> Self {
        v.into_iter().fold(Props::new(), |p, (k, v)| p.set(k, v))
    }
}

pub fn h(tag: impl Into<String>, props: impl Into<Props>, children: Vec<VNode>) -> VNode {
    VNode::Element {
        tag: tag.into(),
        props: props.into(),
        children,
    }
}
pub fn text(t: impl Into<String>) -> VNode {
    VNode::Text(t.into())
}

impl Document {
    /// Capture `node` and its subtree as a [`VNode`].
    pub fn snapshot(&self, node: NodeId) -> VNode {
        match self.data(node) {
            NodeData::Text(t) => VNode::Text(t),
            NodeData::Element { tag, attrs } => VNode::Element {
                tag,
                props: Props {
                    attrs: attrs.into_iter().map(|a| (a.name, a.value)).collect(),
                },
                children: self
                    .children(node)
                    .into_iter()
                    .map(|c| self.snapshot(c))
                    .collect(),
            },
        }
    }

    /// Materialize a [`VNode`] as a new detached subtree.
    pub fn build(&self, vnode: &VNode) -> Result<NodeId, DomError> {
        match vnode {
            VNode::Text(t) => Ok(self.create_text(t.clone())),
            VNode::Element {
                tag,
                props,
                children,
            } => {
                let el = self.create_element(tag.clone());
                self.set_attrs(
                    el,
                    props
                        .attrs
                        .iter()
                        .map(|(k, v)| Attr::new(k.clone(), v.clone()))
                        .collect(),
                );
                for child in children {
                    let c = self.build(child)?;
                    self.append_child(el, c)?;
                }
                Ok(el)
            }
        }
    }
}
