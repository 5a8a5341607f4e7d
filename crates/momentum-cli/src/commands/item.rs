use chrono::Utc;
use clap::Subcommand;
use momentum_core::{StoreError, WorkItem, WorkItemFilter, WorkItemSource, WorkItemStatus};
use serde_json::json;

use super::{open_service, print_json, CliResult};

#[derive(Subcommand)]
pub enum ItemAction {
    /// Add a pending work item
    Add {
        /// Item title
        title: String,
        /// Momentum credited on completion
        #[arg(long, default_value_t = 1)]
        weight: u32,
        /// Ids of items this one depends on
        #[arg(long = "depends-on")]
        depends_on: Vec<String>,
        /// Position within an ordered sequence
        #[arg(long)]
        sequence: Option<i64>,
    },
    /// List work items
    List {
        /// Only items with this status (pending, done, blocked)
        #[arg(long)]
        status: Option<WorkItemStatus>,
    },
    /// Complete a pending item and credit its weight
    Done {
        /// Item id
        id: String,
    },
}

pub fn run(user: &str, action: ItemAction) -> CliResult {
    let service = open_service()?;
    let db = service.store();

    match action {
        ItemAction::Add {
            title,
            weight,
            depends_on,
            sequence,
        } => {
            let mut item = WorkItem::new(user, title, weight);
            item.depends_on = depends_on;
            item.sequence_order = sequence;
            db.create_work_item(&item)?;
            print_json(&item)
        }
        ItemAction::List { status } => {
            let mut filter = WorkItemFilter::for_user(user);
            if let Some(status) = status {
                filter = filter.with_status(status);
            }
            print_json(&db.list(&filter)?)
        }
        ItemAction::Done { id } => {
            let owned = db
                .get_work_item(&id)?
                .filter(|item| item.user_id == user)
                .ok_or_else(|| StoreError::NotFound(format!("work item {id}")))?;

            let now = Utc::now();
            service.get_or_create(user, now)?;
            let (item, outcome) = db.complete_work_item_with(&owned.id, now, |done| {
                service.add_momentum(user, i64::from(done.momentum_weight), now)
            })?;
            let milestone = outcome.milestone_reached.map(|m| m.to_suggestion());

            print_json(&json!({
                "item": item,
                "outcome": outcome,
                "milestone_suggestion": milestone,
            }))
        }
    }
}
