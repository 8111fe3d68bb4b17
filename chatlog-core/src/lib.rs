//! Core types and traits for chatlog
//!
//! This crate provides configuration loading, logging setup and the
//! per-day history store shared by the other chatlog components.

pub mod config;
pub mod error;
pub mod history;
pub mod logging;
pub mod utils;

pub use error::{Error, Result};
pub use history::{HistoryLog, HistoryStore, TokenUsage, Turn};
