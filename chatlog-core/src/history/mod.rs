//! Per-day conversation history
//!
//! Every completed exchange is recorded as a [`Turn`]. The turns of one
//! calendar day live in a single pretty-printed JSON array named after the
//! date (`history/2026-10-19.json`).

pub mod store;
pub mod turn;

pub use store::HistoryStore;
pub use turn::{HistoryLog, TokenUsage, Turn};
