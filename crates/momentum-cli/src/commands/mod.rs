pub mod config;
pub mod item;
pub mod ledger;
pub mod suggest;

use momentum_core::{Config, Database, MomentumService};

pub type CliResult = Result<(), Box<dyn std::error::Error>>;

/// Service over the on-disk database with the on-disk config.
pub fn open_service() -> Result<MomentumService<Database>, Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let db = Database::open()?;
    tracing::debug!(config = ?Config::path().ok(), "opened momentum store");
    Ok(MomentumService::with_config(db, config))
}

pub fn print_json<T: serde::Serialize>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
