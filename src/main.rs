//! Taskmark CLI entry point.

use clap::Parser;
use std::process::ExitCode;
use taskmark::cli::commands;
use taskmark::cli::{Cli, Commands};
use taskmark::error::Error;

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }

    // Set up tracing based on verbosity
    init_tracing(cli.verbose, cli.quiet);

    // Resolve effective JSON mode: --json OR non-TTY stdout
    let json = cli.json || !std::io::IsTerminal::is_terminal(&std::io::stdout());

    // Run the command and handle errors
    match run(&cli, json) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if json {
                eprintln!("{}", e.to_structured_json());
            } else if !cli.quiet {
                if let Some(hint) = e.hint() {
                    eprintln!("Error: {e}\n  Hint: {hint}");
                } else {
                    eprintln!("Error: {e}");
                }
            }
            ExitCode::from(e.exit_code())
        }
    }
}

fn init_tracing(verbose: u8, quiet: bool) {
    use tracing_subscriber::EnvFilter;

    if quiet {
        return;
    }

    // Honor RUST_LOG if set, otherwise use verbosity flag
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        match verbose {
            0 => EnvFilter::new("warn"),
            1 => EnvFilter::new("info"),
            2 => EnvFilter::new("debug,reqwest=info,hyper=info"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn run(cli: &Cli, json: bool) -> Result<(), Error> {
    match &cli.command {
        Commands::Init { force } => commands::init::execute(*force, cli.config.as_ref(), json),
        Commands::Auth => commands::auth::execute(cli.config.as_ref(), json),
        Commands::Sources { command } => {
            commands::sources::execute(command, cli.config.as_ref(), json)
        }
        Commands::Sync { source } => {
            commands::sync::execute(source.as_deref(), cli.config.as_ref(), json)
        }
        Commands::Watch => commands::watch::execute(cli.config.as_ref(), cli.json),
        Commands::Status => commands::status::execute(cli.config.as_ref(), json),
        Commands::Projects { project_gid } => {
            commands::projects::execute(project_gid.as_deref(), cli.config.as_ref(), json)
        }
        Commands::Add(args) => commands::add::execute(args, cli.config.as_ref(), json),
        Commands::Completions { shell } => commands::completions::execute(shell),
        Commands::Version => commands::version::execute(json),
    }
}
