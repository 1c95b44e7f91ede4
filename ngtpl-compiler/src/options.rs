/// Tag names and markers the compiler recognises.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOptions {
    /// Tag of named, never-rendered fragment definitions.
    pub fragment_tag: String,
    /// Tag of grouping containers and outlets.
    pub container_tag: String,
    /// Prefix of the attribute that names a fragment, e.g. `#`.
    pub marker_prefix: String,
    /// Element wrapped around a text-only fragment when it is expanded.
    pub text_wrapper_tag: String,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            fragment_tag: "ng-template".to_string(),
            container_tag: "ng-container".to_string(),
            marker_prefix: "#".to_string(),
            text_wrapper_tag: "span".to_string(),
        }
    }
}

impl CompileOptions {
    pub fn with_text_wrapper(mut self, tag: impl Into<String>) -> Self {
        self.text_wrapper_tag = tag.into();
        self
    }
}
