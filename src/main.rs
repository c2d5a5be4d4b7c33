mod aggregate;
mod baseline;
mod cli;
mod config;
mod model;
mod orchestrator;
mod render;
mod stats;
mod storage;
mod table;
mod text_summary;

use clap::Parser;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let args = match cli::Cli::try_parse() {
        Ok(args) => args,
        // Help and version go to stdout with status 0; usage errors exit 1.
        Err(e) if !e.use_stderr() => e.exit(),
        Err(e) => {
            let _ = e.print();
            std::process::exit(1);
        }
    };

    if let Err(e) = cli::run(args) {
        eprintln!("{e:#}");
        std::process::exit(1);
    }
}
