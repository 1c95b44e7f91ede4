use anyhow::{bail, Result};
use clap::{ArgAction, Parser, Subcommand};
use ngtpl_cli::{check_cmd, init_tracing, render_cmd, RenderArgs};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ngtpl", version, about = "Compile directive templates against a JSON context")]
struct Cli {
    /// More log output (-v info, -vv debug, -vvv trace). RUST_LOG overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a template and print the result.
    Render {
        /// Template markup file
        template: PathBuf,
        /// JSON object file providing template variables
        #[arg(long)]
        context: Option<PathBuf>,
        /// Write the result to this file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
        /// Print text content instead of markup
        #[arg(long)]
        text: bool,
        /// Element used to wrap text-only fragments (default: span)
        #[arg(long)]
        wrapper_tag: Option<String>,
    },
    /// List directives and check their expressions without evaluating them.
    Check {
        /// Template markup file
        template: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.command {
        Commands::Render {
            template,
            context,
            out,
            text,
            wrapper_tag,
        } => {
            let to_stdout = out.is_none();
            let args = RenderArgs {
                context,
                out,
                text,
                wrapper_tag,
            };
            let output = render_cmd(&template, &args)?;
            if to_stdout {
                println!("{output}");
            }
        }
        Commands::Check { template } => {
            let report = check_cmd(&template)?;
            for line in &report.directives {
                println!("{line}");
            }
            for problem in &report.problems {
                eprintln!("error: {problem}");
            }
            if !report.is_clean() {
                bail!("{} problem(s) in {}", report.problems.len(), template.display());
            }
        }
    }
    Ok(())
}
