use std::collections::HashMap;

use ngtpl_dom::{Document, NodeId};
use ngtpl_expr::{Engine, Scope};
use tracing::debug;

use crate::element::Session;
use crate::error::CompileError;
use crate::evaluator::EvaluatorFactory;
use crate::options::CompileOptions;

/// Named fragments found in a tree, keyed by their marker attribute (`#name`).
#[derive(Debug, Default)]
pub struct TemplateRegistry {
    fragments: HashMap<String, NodeId>,
}

impl TemplateRegistry {
    /// Register every fragment definition below `root` under the first of its
    /// attributes that starts with the marker prefix.
    pub fn scan(doc: &Document, root: NodeId, options: &CompileOptions) -> Self {
        let mut fragments = HashMap::new();
        for fragment in doc.descendants_by_tag(root, &options.fragment_tag) {
            let marker = doc
                .attrs(fragment)
                .into_iter()
                .find(|a| a.name.starts_with(options.marker_prefix.as_str()));
            if let Some(marker) = marker {
                debug!(name = %marker.name, "registered fragment");
                fragments.insert(marker.name, fragment);
            }
        }
        Self { fragments }
    }

    pub fn get(&self, name: &str) -> Option<NodeId> {
        self.fragments.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }
}

/// Compiles directive-annotated trees in place.
#[derive(Clone, Default)]
pub struct Compiler {
    factory: EvaluatorFactory,
    options: CompileOptions,
}

impl Compiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_engine(mut self, engine: impl Engine + 'static) -> Self {
        self.factory = EvaluatorFactory::new(engine);
        self
    }

    pub fn with_options(mut self, options: CompileOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    /// Resolve every directive below and including `root` against `context`,
    /// then drop all fragment definitions from the tree.
    ///
    /// The first evaluation failure aborts the compile; the tree keeps
    /// whatever changes were already made.
    pub async fn compile(
        &self,
        doc: &Document,
        root: NodeId,
        context: Scope,
    ) -> Result<(), CompileError> {
        let registry = TemplateRegistry::scan(doc, root, &self.options);
        let session = Session {
            doc,
            registry: &registry,
            options: &self.options,
        };
        session
            .compile_element(root, self.factory.make(context))
            .await?;

        for fragment in doc.descendants_by_tag(root, &self.options.fragment_tag) {
            doc.remove(fragment);
        }
        Ok(())
    }
}

/// [`Compiler::compile`] with the built-in interpreter and default options.
pub async fn compile_template(
    doc: &Document,
    root: NodeId,
    context: Scope,
) -> Result<(), CompileError> {
    Compiler::new().compile(doc, root, context).await
}
