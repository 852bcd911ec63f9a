//! # kbrefine: Knowledge-Base Refinement CLI
//!
//! Thin entrypoint; all logic lives in the `kbrefine_cli` library crate.

use anyhow::Result;
use clap::Parser;
use kbrefine_cli::{run, Cli};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Setup logging
    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(EnvFilter::from_default_env().add_directive("kbrefine=info".parse()?))
        .with_ansi(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // 2. Parse CLI arguments
    let cli = Cli::parse();

    // 3. Run and map any failure to a non-zero exit status
    if let Err(e) = run(cli).await {
        eprintln!("[kbrefine error] {e:?}");
        std::process::exit(1);
    }

    Ok(())
}
