use colored::*;
use std::process;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli_args = portctl::cli::parse_args();

    // Setup tracing subscriber. Show INFO by default, or DEBUG/TRACE if
    // -v/-vv is set; PORTCTL_LOG overrides everything.
    let default_level = match cli_args.verbose {
        0 => LevelFilter::INFO,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };

    let env_filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .with_env_var("PORTCTL_LOG")
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    // Execute the command
    if let Err(e) = portctl::cli::run(cli_args).await {
        // Print user-facing error message clearly
        eprintln!("{}: {}", "Error".red().bold(), e);
        process::exit(1);
    }
}
