use chrono::Utc;
use clap::Subcommand;

use super::{open_service, print_json, CliResult};

#[derive(Subcommand)]
pub enum LedgerAction {
    /// Create the ledger if it does not exist yet
    Init,
    /// Show the current ledger
    Show,
}

pub fn run(user: &str, action: LedgerAction) -> CliResult {
    let service = open_service()?;
    let ledger = match action {
        LedgerAction::Init => service.get_or_create(user, Utc::now())?,
        LedgerAction::Show => service.ledger(user)?,
    };

    let mut json = serde_json::to_value(&ledger)?;
    json["momentum_percentage"] = serde_json::json!(ledger.momentum_percentage());
    print_json(&json)
}

pub fn decay(user: &str) -> CliResult {
    let service = open_service()?;
    let result = service.apply_decay(user, Utc::now())?;
    print_json(&result)
}

pub fn streak(user: &str) -> CliResult {
    let service = open_service()?;
    let update = service.update_streak(user, Utc::now().date_naive())?;
    print_json(&update)
}

pub fn gain(user: &str, amount: i64) -> CliResult {
    let service = open_service()?;
    let now = Utc::now();
    // First recorded activity creates the ledger.
    service.get_or_create(user, now)?;
    let outcome = service.add_momentum(user, amount, now)?;
    print_json(&outcome)
}
