#![warn(clippy::all, clippy::dbg_macro)]

use std::fs::File;
use std::io::{Write, stdout};

use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use clap_verbosity_flag::InfoLevel;
use github_webhook_capabilities::{CapabilityMap, WORKFLOW_TRIGGERS, classify};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt as _, util::SubscriberInitExt as _};

mod openapi;
mod resolve;

/// The context root every webhook payload expands under.
const CONTEXT_ROOT: &str = "github.event";

/// Maps GitHub webhook payload fields to expansion capabilities.
///
/// Walks the webhook payload schemas in GitHub's OpenAPI document and
/// classifies every reachable context pattern by how much an attacker can
/// influence its value, emitting the result as a `pattern,capability` CSV
/// for consumption by a template injection analyzer.
#[derive(Parser)]
#[command(about, version)]
struct App {
    /// The git ref of octokit/openapi-webhooks to fetch schemas from.
    ///
    /// Refs starting with `v` are treated as tags; anything else is
    /// treated as a branch.
    #[arg(long, env = "WEBHOOKS_REF", default_value = "main")]
    webhooks_ref: String,

    /// Use a local OpenAPI document instead of fetching one.
    #[arg(short, long)]
    input: Option<Utf8PathBuf>,

    /// The list of known-safe context patterns to pin to `fixed`.
    #[arg(long, default_value = "support/known-safe-contexts.txt")]
    known_safe: Utf8PathBuf,

    /// Where to write the resulting CSV; `-` means stdout.
    #[arg(short, long, default_value = "support/context-capabilities.csv")]
    output: Utf8PathBuf,

    #[command(flatten)]
    verbose: clap_verbosity_flag::Verbosity<InfoLevel>,
}

fn main() -> Result<()> {
    let app = App::parse();

    let filter = EnvFilter::builder()
        .with_default_directive(app.verbose.tracing_level_filter().into())
        .from_env()?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().without_time())
        .with(filter)
        .init();

    run(&app)
}

fn run(app: &App) -> Result<()> {
    let safe_contexts = load_known_safe(&app.known_safe)?;
    tracing::info!(
        "loaded {count} known safe contexts",
        count = safe_contexts.len()
    );

    let document = match &app.input {
        Some(input) => openapi::load(input)?,
        None => openapi::fetch(&app.webhooks_ref)?,
    };

    let schemas = openapi::webhook_schemas(&document)?;
    tracing::info!(
        "isolated {count} webhook payload schemas",
        count = schemas.len()
    );

    let mut capabilities = classify(&schemas, WORKFLOW_TRIGGERS, CONTEXT_ROOT)?;
    tracing::info!(
        "classified {count} context patterns",
        count = capabilities.len()
    );

    // Finally, fill in the manually vetted contexts; these always win.
    for context in &safe_contexts {
        capabilities.pin_fixed(context.as_str());
    }

    write_csv(&capabilities, &app.output)
        .with_context(|| format!("couldn't write {output}", output = app.output))?;

    Ok(())
}

/// Loads the known-safe context list: one pattern per line, with blank
/// lines and `#` comments skipped.
fn load_known_safe(path: &Utf8Path) -> Result<Vec<String>> {
    let raw =
        std::fs::read_to_string(path).with_context(|| format!("couldn't read {path}"))?;

    Ok(raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(Into::into)
        .collect())
}

/// Writes the mapping as two-column CSV rows, sorted by pattern.
fn write_csv(capabilities: &CapabilityMap, output: &Utf8Path) -> Result<()> {
    let io: Box<dyn Write> = match output.as_str() {
        "-" => Box::new(stdout()),
        path => Box::new(File::create(path)?),
    };

    let mut writer = csv::Writer::from_writer(io);
    for (pattern, capability) in capabilities.iter() {
        writer.write_record([pattern, capability.as_str()])?;
    }
    writer.flush()?;

    Ok(())
}
