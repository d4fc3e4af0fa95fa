//! `tap`: render text templates against a YAML context.
use anyhow::{Context as _, Result};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

mod ctx;
mod error;
mod render;
mod util;

use ctx::Context;

#[derive(Parser)]
#[command(name = "tap", version, about = "Render templates against a YAML context")]
struct Cli {
    /// Log debug detail
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Args)]
struct Inputs {
    /// YAML file providing the template context
    #[arg(short, long, env = "TAP_CONTEXT")]
    context: PathBuf,

    /// Template file, or a directory of templates
    #[arg(short, long)]
    template: PathBuf,
}

#[derive(Subcommand)]
enum Cmd {
    /// Render templates into an output directory
    Render {
        #[command(flatten)]
        inputs: Inputs,

        /// Directory rendered files are written to (created if missing)
        #[arg(short, long, env = "TAP_OUTPUT")]
        output: PathBuf,
    },

    /// Parse templates and report undefined keys without writing anything
    Check {
        #[command(flatten)]
        inputs: Inputs,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    match cli.cmd {
        Cmd::Render { inputs, output } => cmd_render(&inputs, &output),
        Cmd::Check { inputs } => cmd_check(&inputs),
    }
}

fn init_tracing(verbose: bool, quiet: bool) {
    let default = match (verbose, quiet) {
        (true, _) => "debug",
        (_, true) => "warn",
        _ => "info",
    };
    let filter = EnvFilter::try_from_env("TAP_LOG").unwrap_or_else(|_| EnvFilter::new(default));
    // A subscriber may already be installed; keep it.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .ok();
}

fn cmd_render(inputs: &Inputs, output: &Path) -> Result<()> {
    let ctx = load_context(&inputs.context)?;
    let is_dir = is_directory(&inputs.template)?;

    let written = render::render_all(&ctx, output, &inputs.template, is_dir)
        .inspect_err(|e| {
            if e.is_missing_key() {
                tracing::warn!("run `tap check` to list every undefined key");
            }
        })
        .context("render templates")?;

    for path in written {
        println!("{}", path.display());
    }
    Ok(())
}

fn cmd_check(inputs: &Inputs) -> Result<()> {
    let ctx = load_context(&inputs.context)?;
    let is_dir = is_directory(&inputs.template)?;

    let mut failures = 0usize;
    for tpl in render::templates(&inputs.template, is_dir).context("list templates")? {
        match render::check(&ctx, &tpl) {
            Ok(missing) if missing.is_empty() => {
                println!("ok {}", tpl.display());
            }
            Ok(missing) => {
                failures += 1;
                for key in &missing {
                    tracing::warn!(template = %tpl.display(), key = %key, "undefined key");
                    println!("missing {}: {key}", tpl.display());
                }
            }
            Err(e) => {
                failures += 1;
                tracing::warn!(template = %tpl.display(), "{e}");
                println!("error {}: {e}", tpl.display());
            }
        }
    }

    anyhow::ensure!(failures == 0, "{failures} template(s) failed the check");
    Ok(())
}

fn load_context(path: &Path) -> Result<Context> {
    let ctx = Context::load(path).context("load context")?;
    if ctx.is_empty() {
        tracing::warn!(path = %path.display(), "context is empty");
    } else {
        tracing::debug!(count = ctx.len(), keys = ?ctx.keys().collect::<Vec<_>>(), "context keys");
    }
    Ok(ctx)
}

/// Decide whether the template source is a directory; a missing path is
/// reported as unreadable.
fn is_directory(path: &Path) -> Result<bool> {
    let meta = std::fs::metadata(path).map_err(|source| error::Error::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(meta.is_dir())
}
