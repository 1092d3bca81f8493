//! C8: process state and listener registry (spec.md Section 4.8).

mod listeners;
mod state;
mod ticker;

pub use listeners::Listeners;
pub use state::State;
pub use ticker::{Ticker, DEFAULT_TICK_INTERVAL};
