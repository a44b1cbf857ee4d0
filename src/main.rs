use std::io::{self, Write};
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing::{debug, info};

use cmdrunner::cli::Cli;
use cmdrunner::config::Config;
use cmdrunner::logging::init_tracing;
use cmdrunner::pipeline::Session;
use cmdrunner::repl::{render, Repl};
use cmdrunner::stage::Registry;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .context("Failed to load configuration")?;
    debug!(?config, "Configuration loaded");

    let registry = Registry::global();
    let ctx = config.defaults.run_context();
    signal_hook::flag::register(signal_hook::consts::SIGINT, ctx.interrupt_flag())
        .context("Failed to install SIGINT handler")?;

    let loaded = cli.session.is_some();
    let session = match &cli.session {
        Some(path) => Session::load(registry, path)?,
        None => {
            let runner = cli.runner.as_deref().unwrap_or(config.defaults.runner.as_str());
            Session::with_runner_named(registry, runner)?
        }
    };
    info!(runner = session.runner().name(), "Session ready");

    if let Some(command) = &cli.command {
        let execution = session.execute(command, &ctx)?;
        for warning in &execution.warnings {
            eprintln!("[!] {}", warning);
        }
        print!("{}", execution.output);
        io::stdout().flush()?;
        return Ok(());
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if loaded {
        render::write_session(&mut out, &session)?;
    } else {
        render::write_catalog(&mut out, "Runners", &registry.runners)?;
        render::write_catalog(&mut out, "Encoders", &registry.encoders)?;
        render::write_catalog(&mut out, "Decoders", &registry.decoders)?;
    }

    let mut repl = Repl::new(registry, config.repl, ctx, session);
    repl.run(io::stdin().lock(), &mut out)?;
    Ok(())
}
