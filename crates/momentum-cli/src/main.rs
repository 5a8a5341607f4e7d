use clap::{Parser, Subcommand};
use std::env;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;

#[derive(Parser)]
#[command(name = "momentum", version, about = "Momentum ledger CLI")]
struct Cli {
    /// User whose ledger to operate on
    #[arg(long, global = true, env = "MOMENTUM_USER", default_value = "default")]
    user: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ledger inspection and creation
    Ledger {
        #[command(subcommand)]
        action: commands::ledger::LedgerAction,
    },
    /// Apply elapsed decay periods
    Decay,
    /// Record today's activity against the streak
    Streak,
    /// Credit momentum for a completed piece of work
    Gain {
        /// Momentum to add
        #[arg(allow_negative_numbers = true)]
        amount: i64,
    },
    /// Work item management
    Item {
        #[command(subcommand)]
        action: commands::item::ItemAction,
    },
    /// Print momentum suggestions
    Suggest,
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("MOMENTUM_LOG")
        .unwrap_or_else(|_| EnvFilter::new("momentum_core=info,momentum=info,warn"));

    let format = env::var("MOMENTUM_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn main() {
    init_tracing();

    let cli = Cli::parse();
    let user = cli.user;
    let result = match cli.command {
        Commands::Ledger { action } => commands::ledger::run(&user, action),
        Commands::Decay => commands::ledger::decay(&user),
        Commands::Streak => commands::ledger::streak(&user),
        Commands::Gain { amount } => commands::ledger::gain(&user, amount),
        Commands::Item { action } => commands::item::run(&user, action),
        Commands::Suggest => commands::suggest::run(&user),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
