//! # Momentum Core Library
//!
//! This library provides the core business logic for momentum tracking: a
//! per-user accumulator that decays over time, grows with completed work,
//! tracks a daily-return streak, and feeds a suggestion generator. It
//! follows a CLI-first philosophy where all operations are available via a
//! standalone CLI binary over the same library.
//!
//! ## Architecture
//!
//! - **Ledger**: pure decay, streak, gain and cap calculations
//! - **Store**: the ledger persistence seam, with compare-and-swap writes
//! - **Service**: read-modify-write operations over any store
//! - **Suggestions**: ranked nudges from a ledger snapshot and work items
//! - **Storage**: SQLite persistence and TOML-based configuration
//!
//! ## Key Components
//!
//! - [`MomentumService`]: decay, streak and gain operations
//! - [`SuggestionGenerator`]: momentum nudges
//! - [`Database`]: ledger and work-item persistence
//! - [`Config`]: engine configuration

pub mod error;
pub mod ledger;
pub mod service;
pub mod storage;
pub mod store;
pub mod suggest;
pub mod work;

pub use error::{ConfigError, MomentumError, StoreError, ValidationError};
pub use ledger::{
    compute_cap, compute_decay, DecayResult, GainOutcome, Milestone, MomentumLedger, StreakUpdate,
};
pub use service::MomentumService;
pub use storage::{Config, Database};
pub use store::{LedgerPatch, LedgerStore, MemoryStore};
pub use suggest::{Suggestion, SuggestionGenerator, SuggestionKind, Urgency};
pub use work::{WorkItem, WorkItemFilter, WorkItemSource, WorkItemStatus};
