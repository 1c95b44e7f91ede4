use anyhow::{Context, Result};
use ngtpl_compiler::{CompileOptions, Compiler, Directive, interpolations};
use ngtpl_dom::{Document, NodeId};
use ngtpl_expr::Scope;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

/// Install a stderr `fmt` subscriber. `RUST_LOG` wins; otherwise the level
/// is `warn`, raised by each `-v`.
pub fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_filter(filter),
        )
        .init();
}

#[derive(Debug, Clone, Default)]
pub struct RenderArgs {
    /// JSON object whose keys become template variables.
    pub context: Option<PathBuf>,
    /// Write here instead of returning the output for stdout.
    pub out: Option<PathBuf>,
    /// Emit trimmed text content instead of markup.
    pub text: bool,
    pub wrapper_tag: Option<String>,
}

/// Read a JSON context file into a [`Scope`]; no file means an empty scope.
pub fn load_context(path: Option<&Path>) -> Result<Scope> {
    let Some(path) = path else {
        return Ok(Scope::new());
    };
    let src =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let json: serde_json::Value = serde_json::from_str(&src)
        .with_context(|| format!("{} is not valid JSON", path.display()))?;
    Scope::from_json(json).with_context(|| format!("bad context in {}", path.display()))
}

/// Compile a template file against a context and return the rendered output.
///
/// With `args.out` set the output is also written to that file.
pub fn render_cmd(input: &Path, args: &RenderArgs) -> Result<String> {
    let src =
        fs::read_to_string(input).with_context(|| format!("failed to read {}", input.display()))?;
    let scope = load_context(args.context.as_deref())?;

    let mut options = CompileOptions::default();
    if let Some(tag) = &args.wrapper_tag {
        options = options.with_text_wrapper(tag.as_str());
    }
    let compiler = Compiler::new().with_options(options);

    let doc = Document::new();
    let root = doc
        .parse_element(&src)
        .with_context(|| format!("failed to parse {}", input.display()))?;
    pollster::block_on(compiler.compile(&doc, root, scope))
        .with_context(|| format!("failed to compile {}", input.display()))?;

    let output = if args.text {
        doc.text_content(root).trim().to_string()
    } else {
        doc.outer_html(root)
    };

    if let Some(out) = &args.out {
        if let Some(dir) = out.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .with_context(|| format!("failed to create {}", dir.display()))?;
        }
        fs::write(out, &output).with_context(|| format!("failed to write {}", out.display()))?;
        tracing::info!(path = %out.display(), "wrote output");
    }
    Ok(output)
}

/// Directives found by [`check_cmd`], plus whatever looks wrong with them.
#[derive(Debug, Default)]
pub struct CheckReport {
    pub directives: Vec<String>,
    pub problems: Vec<String>,
}

impl CheckReport {
    pub fn is_clean(&self) -> bool {
        self.problems.is_empty()
    }
}

/// List the directives of a template file and check that every expression in
/// them parses. Nothing is evaluated.
pub fn check_cmd(input: &Path) -> Result<CheckReport> {
    let src =
        fs::read_to_string(input).with_context(|| format!("failed to read {}", input.display()))?;
    let doc = Document::new();
    let roots = doc
        .parse_fragment(&src)
        .with_context(|| format!("failed to parse {}", input.display()))?;

    let mut report = CheckReport::default();
    for root in roots {
        check_node(&doc, root, &mut report);
    }
    Ok(report)
}

fn check_node(doc: &Document, node: NodeId, report: &mut CheckReport) {
    let Some(tag) = doc.tag(node) else {
        if let Some(text) = doc.text(node) {
            for expr in interpolations(&text) {
                report.directives.push(format!("{{{{ {} }}}}", expr.trim()));
                check_expr(expr, "interpolation", report);
            }
        }
        return;
    };

    for attr in doc.attrs(node) {
        let at = format!("<{tag}> {}", attr.name);
        match Directive::classify(&attr.name, &attr.value) {
            Directive::If { test, alias } => {
                report.directives.push(match alias {
                    Some(alias) => format!("{at}: if {test} as {alias}"),
                    None => format!("{at}: if {test}"),
                });
                check_expr(test, &at, report);
            }
            Directive::For { var, source } => {
                report.directives.push(format!("{at}: for {var} of {source}"));
                check_expr(source, &at, report);
            }
            Directive::Property { name, expr } => {
                report.directives.push(format!("{at}: bind {name}"));
                check_expr(expr, &at, report);
            }
            Directive::ClassToggle { class, expr } => {
                report.directives.push(format!("{at}: toggle class {class}"));
                check_expr(expr, &at, report);
            }
            Directive::Style { prop, raw } => {
                report.directives.push(format!("{at}: style {prop} = {raw}"));
            }
            Directive::StyleUnit { prop, unit, expr } => {
                report.directives.push(format!("{at}: style {prop} in {unit}"));
                check_expr(expr, &at, report);
            }
            Directive::Outlet { fragment } => {
                report.directives.push(format!("{at}: outlet #{fragment}"));
            }
            Directive::Plain if attr.name == ngtpl_compiler::FOR_ATTR => {
                report.problems.push(format!(
                    "{at}: expected `let <name> of <expr>`, got `{}`",
                    attr.value
                ));
            }
            Directive::Plain => {}
        }
    }

    for child in doc.children(node) {
        check_node(doc, child, report);
    }
}

fn check_expr(code: &str, at: &str, report: &mut CheckReport) {
    if let Err(e) = ngtpl_expr::parse(code) {
        report.problems.push(format!("{at}: {e}"));
    }
}
