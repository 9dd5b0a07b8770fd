use clap::Parser;
use color_eyre::{eyre::eyre, Result};
use vidledger_core::CommandContext;

mod cli;
mod dispatch;
mod output;
mod style;

use cli::VidledgerCli;
use dispatch::dispatch_command;
use output::{emit_output, OutputOptions};

fn main() -> Result<()> {
    color_eyre::install()?;

    // Existing environment variables win over the .env file.
    let dotenv = dotenvy::dotenv();

    let cli = VidledgerCli::parse();
    init_tracing(cli.trace, cli.verbose, cli.quiet);

    match dotenv {
        Ok(path) => tracing::debug!(path = %path.display(), "loaded .env"),
        Err(err) if err.not_found() => {}
        Err(err) => tracing::warn!(error = %err, "ignoring unreadable .env file"),
    }

    let ctx = CommandContext::new();

    let (info, outcome) = dispatch_command(&ctx, &cli.command).map_err(|err| eyre!("{err:?}"))?;
    let opts = OutputOptions {
        quiet: cli.quiet,
        json: cli.json,
        no_color: cli.no_color,
    };
    let code = emit_output(&opts, info, &outcome)?;

    if code == 0 {
        Ok(())
    } else {
        std::process::exit(code);
    }
}

fn init_tracing(trace: bool, verbose: u8, quiet: bool) {
    let level = if trace {
        "trace"
    } else if quiet {
        "warn"
    } else {
        match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = format!(
        "vidledger={level},vidledger_cli={level},vidledger_core={level},vidledger_domain={level}"
    );
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}
