//! Command-line host for the evaluator (§6's host-to-core contract,
//! driven from a terminal instead of a service): reads one document,
//! evaluates it, prints the computed value and any diagnostics, and
//! optionally signs the outcome. A minimal host to exercise the core
//! end to end, not a product surface in its own right.

mod config;
mod logging;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use config::Config;

#[derive(Parser)]
#[command(name = "ldc", about = "Evaluates linked-data computation documents")]
struct Cli {
    /// Path to the host configuration (capabilities, limits, signing key env var).
    #[arg(long, global = true, default_value = "ldc.toml")]
    config: PathBuf,

    /// Emit logs as JSON instead of human-readable lines.
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Evaluate a document and print its computed value and diagnostics.
    Eval {
        /// Path to a JSON document.
        document: PathBuf,

        /// Sign the outcome with the key named by `[signing]` in the config.
        #[arg(long)]
        sign: bool,

        /// Additional capability scopes, on top of `[eval].capabilities`.
        #[arg(long = "capability")]
        capabilities: Vec<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.json_logs);

    let config = Config::load(&cli.config)?;

    match &cli.command {
        Command::Eval { document, sign, capabilities } => run_once(document, &config, *sign, capabilities),
    }
}

fn build_context(config: &Config, extra_capabilities: &[String]) -> Result<ldc_eval::EvalContext<'static>> {
    let mut capabilities = config.eval.capabilities.clone();
    capabilities.extend(extra_capabilities.iter().cloned());
    ldc_eval::EvalContext::new(capabilities).context("building evaluation context")
}

fn run_once(path: &PathBuf, config: &Config, sign: bool, extra_capabilities: &[String]) -> Result<()> {
    tracing::info!(document = %path.display(), "evaluating");

    let raw = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let document: serde_json::Value =
        serde_json::from_str(&raw).with_context(|| format!("parsing {} as JSON", path.display()))?;

    let ctx = build_context(config, extra_capabilities)?;
    let options = config.eval.to_options();
    let outcome = ldc_eval::evaluate(&document, &ctx, &options);

    print_outcome(&outcome, config, sign)
}

fn print_outcome(outcome: &ldc_eval::EvalOutcome, config: &Config, sign: bool) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&outcome.value)?);

    for d in &outcome.diagnostics {
        eprintln!(
            "{} {}{}",
            d.code.as_str(),
            d.path.as_deref().unwrap_or("<document>"),
            d.message.as_deref().map(|m| format!(": {m}")).unwrap_or_default(),
        );
    }
    if outcome.aborted {
        eprintln!("evaluation aborted before completion (timeout or cancellation)");
    }

    if sign {
        let key_env = config
            .signing
            .key_env
            .as_deref()
            .context("--sign requires [signing].key_env in the config")?;
        let secret = std::env::var(key_env).with_context(|| format!("reading signing key from ${key_env}"))?;
        let kid = config.signing.kid.as_deref().unwrap_or("default");
        println!("{}", outcome.sign(secret.as_bytes(), kid));
    }

    Ok(())
}
