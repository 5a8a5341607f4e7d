use chrono::Utc;

use super::{open_service, print_json, CliResult};

pub fn run(user: &str) -> CliResult {
    let service = open_service()?;
    let suggestions = service.suggestions(user, service.store(), Utc::now().date_naive())?;
    print_json(&suggestions)
}
