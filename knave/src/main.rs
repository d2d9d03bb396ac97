//! Knave character keeper.
//!
//! A terminal front end for generating and maintaining Knave character
//! sheets. Characters are saved to a data directory after every change.
//!
//! ```bash
//! cargo run -p knave -- --edition 1 --data-dir ./saves
//! ```

mod commands;
mod config;
mod headless;

use anyhow::Context;
use knave_core::{session_rng, FileStore, RuleSet, SheetStore};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use commands::Session;
use config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "knave=info,knave_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_help();
        return Ok(());
    }

    let config = AppConfig::from_env()?.with_args(&args)?;
    tracing::info!(
        data_dir = %config.data_dir.display(),
        edition = %config.edition,
        seeded = config.seed.is_some(),
        "Configuration loaded"
    );

    let storage = FileStore::open(&config.data_dir).with_context(|| {
        format!("Failed to open data directory {}", config.data_dir.display())
    })?;
    let store = SheetStore::load(
        storage,
        RuleSet::for_edition(config.edition),
        session_rng(config.seed),
    );

    headless::run_headless(Session::new(store)).await?;
    Ok(())
}

fn print_help() {
    println!("Knave character keeper");
    println!();
    println!("USAGE:");
    println!("    knave [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("    --data-dir <PATH>   Where characters are saved (default ./knave-data)");
    println!("    --edition <1|2>     Rules edition (default 2)");
    println!("    --seed <N>          Fixed dice seed for a reproducible session");
    println!("    -h, --help          Print help information");
    println!();
    println!("ENVIRONMENT:");
    println!("    KNAVE_DATA_DIR, KNAVE_EDITION, KNAVE_SEED   Same as the options above");
    println!("    RUST_LOG                                    Log filter (logs go to stderr)");
    println!();
    println!("Type help at the prompt for the command list.");
}
