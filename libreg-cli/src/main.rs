use clap::Parser;
use tracing_subscriber::EnvFilter;

mod args;
mod cmd;
mod commands;
mod exit_codes;
mod output;
mod setup;

pub use args::*;
use commands::Command;

#[derive(Debug, Parser)]
#[command(name = "libreg", version, about = "Library provider registry and resolver")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_tracing();

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("error: failed to create tokio runtime: {e}");
            std::process::exit(exit_codes::RUNTIME_ERROR);
        }
    };

    let exit_code = rt.block_on(run_command(cli.command));
    std::process::exit(exit_code);
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

async fn run_command(command: Command) -> i32 {
    match command {
        Command::Providers {
            events,
            output,
            source,
            http,
        } => cmd::providers::providers_cmd(events, output, source, http).await,
        Command::Search {
            text,
            events,
            output,
            source,
            http,
        } => cmd::search::search_cmd(&text, events, output, source, http).await,
        Command::Resolve {
            id,
            events,
            output,
            source,
            http,
            resolver,
        } => cmd::resolve::resolve_cmd(&id, events, output, source, http, resolver).await,
        Command::CheckAuthDoc {
            target,
            warnings_as_errors,
            output,
            http,
        } => {
            cmd::check_auth_doc::check_auth_doc_cmd(&target, warnings_as_errors, output, http).await
        }
    }
}
