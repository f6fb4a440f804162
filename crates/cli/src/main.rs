use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use shopinit_cli::cli::CliArgs;
use shopinit_cli::error::EXIT_FAILURE;

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let args = CliArgs::parse();

    let default_filter = if args.verbose {
        "shopinit=debug"
    } else if args.quiet {
        "shopinit=warn"
    } else {
        "shopinit=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match shopinit_cli::run(args).await {
        Ok(status) => exit_code(status),
        Err(err) => {
            err.report();
            ExitCode::from(EXIT_FAILURE)
        }
    }
}

/// Statuses that fit a process exit code pass through; anything else is 1.
fn exit_code(status: i32) -> ExitCode {
    match u8::try_from(status) {
        Ok(code) => ExitCode::from(code),
        Err(_) => ExitCode::from(EXIT_FAILURE),
    }
}
