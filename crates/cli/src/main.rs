mod commands;
mod exit_code;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::batch::BatchArgs;
use commands::request::RequestArgs;
use commands::GlobalArgs;
use exit_code::ExitCode;

#[derive(Parser)]
#[command(name = "gqlreq")]
#[command(about = "Send GraphQL requests from the command line", long_about = None)]
#[command(version)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send one query or mutation and print the response
    Request(RequestArgs),

    /// Send several documents in one HTTP request and print the results in order
    Batch(BatchArgs),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing();

    // `colored` already honors NO_COLOR and CLICOLOR; the flag only forces colors off
    if cli.no_color {
        colored::control::set_override(false);
    }

    let result = match &cli.command {
        Commands::Request(args) => commands::request::run(&cli.global, args).await,
        Commands::Batch(args) => commands::batch::run(&cli.global, args).await,
    };

    let code = match result {
        Ok(()) => ExitCode::Success,
        Err(error) => {
            let code = ExitCode::from_error(&error);
            tracing::debug!(%code, "Command failed");
            eprintln!("{} {error:#}", "error:".red().bold());
            code
        }
    };
    code.exit();
}

/// Initialize basic tracing, written to stderr and off unless `RUST_LOG` is set
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("off")),
        )
        .with_writer(std::io::stderr)
        .init();
}
