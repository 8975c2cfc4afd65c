//! Variant viewer: headless driver for scene variant descriptions

mod cli;
mod commands;
mod config;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use variant_core::BuildOptions;

use crate::cli::{Cli, Command};
use crate::commands::{
    activation_text, list_report, list_text, load_scene, render, run_activate, state_report,
    state_text,
};
use crate::config::CliConfig;

fn main() {
    let cli = Cli::parse();
    init_tracing(&cli);

    if let Err(e) = run(cli) {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

/// Explicit -v/-q flags win over RUST_LOG
fn init_tracing(cli: &Cli) {
    let level = cli.verbosity.tracing_level_filter();
    let default_filter = || EnvFilter::new(format!("variant_cli={level},variant_core={level}"));

    let filter = if cli.verbosity.is_present() {
        default_filter()
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter())
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let config = CliConfig::load(cli.config.as_deref());
    let format = cli.format.map(Into::into).unwrap_or(config.output);
    let options = BuildOptions {
        strict_defaults: cli.strict || config.strict_defaults,
    };

    let output = match &cli.command {
        Command::State { file } => {
            let loaded = load_scene(file, options)?;
            render(format, &state_report(&loaded.manager), |s| state_text(s))?
        }
        Command::List { file } => {
            let loaded = load_scene(file, options)?;
            render(format, &list_report(&loaded.manager), |l| list_text(l))?
        }
        Command::Activate { file, targets } => {
            let mut loaded = load_scene(file, options)?;
            let report = run_activate(&mut loaded.manager, targets)?;
            render(format, &report, activation_text)?
        }
    };

    print!("{}", output);
    if !output.ends_with('\n') {
        println!();
    }
    Ok(())
}
