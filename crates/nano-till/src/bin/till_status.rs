//! # Till Status
//!
//! Prints each shop's till for today as JSON, the way the owner's dashboard
//! shows it.
//!
//! ## Usage
//! ```bash
//! cargo run -p nano-till --bin till-status -- --user owner-1
//! cargo run -p nano-till --bin till-status -- --user owner-1 --config ./till.toml
//! ```

use std::env;
use std::path::PathBuf;

use nano_core::dashboard::LocationSummary;
use nano_till::telemetry::init_tracing;
use nano_till::{open_sqlite, ApiError, SqliteTillStore, TillConfig, TillEngine, TillResult};

async fn dashboard_for(
    engine: &TillEngine<SqliteTillStore>,
    user_id: &str,
) -> TillResult<Vec<LocationSummary>> {
    engine.store().sign_in(user_id).await?;
    let session = engine.establish_session().await?;
    engine.dashboard(&session, None).await
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let args: Vec<String> = env::args().collect();
    let mut user_id = "owner-1".to_string();
    let mut config_path: Option<PathBuf> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--user" | "-u" => {
                if i + 1 < args.len() {
                    user_id = args[i + 1].clone();
                    i += 1;
                }
            }
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    config_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Nano POS Till Status");
                println!();
                println!("Usage: till-status [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -u, --user <ID>      Owner profile to sign in as (default: owner-1)");
                println!("  -c, --config <PATH>  till.toml to load");
                println!("  -h, --help           Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    let config = TillConfig::load(config_path)?;
    let engine = open_sqlite(&config).await?;

    match dashboard_for(&engine, &user_id).await {
        Ok(rows) => println!("{}", serde_json::to_string_pretty(&rows)?),
        Err(err) => {
            let api = ApiError::from(err);
            eprintln!("{}", serde_json::to_string_pretty(&api)?);
            std::process::exit(1);
        }
    }

    engine.store().database().close().await;
    Ok(())
}
