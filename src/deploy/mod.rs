//! Stack update orchestration and environment merging

pub mod env;
pub mod updater;

pub use env::merge_env;
pub use updater::{find_stack, StackUpdater, UpdateOutcome, UpdateState};
