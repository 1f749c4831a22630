//! Combat simulator binary.
//!
//! Composition root that assembles content, logging and the runtime, then
//! plays a scripted encounter and prints JSON snapshots to stdout.
//!
//! # Environment
//!
//! - `COMBAT_CONFIG`: content directory (default: bundled data)
//! - `COMBAT_ROUNDS`: rounds to play (default: 4)
//! - `COMBAT_EVENT_LOG`: trailing log entries to print (default: 12)
//! - `RUST_LOG`: tracing filter (default: `info`)
//!
//! ```bash
//! COMBAT_ROUNDS=6 RUST_LOG=runtime::ai=debug cargo run -p combat-sim
//! ```

mod config;
mod scenario;

use anyhow::Result;

use config::SimConfig;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = SimConfig::from_env();
    tracing::info!(rounds = config.rounds, content = ?config.content_dir, "starting simulation");

    let report = scenario::run(&config).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    tracing::info!("simulation complete");
    Ok(())
}
