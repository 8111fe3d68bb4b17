//! History data structures

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Token accounting reported by the completion service.
///
/// Only the three common counters are modeled. Any other keys the service
/// (or an older day file) carries stay in `extra` and are written back
/// unchanged, so a recorded turn never loses data on a later append.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Tokens consumed by the request messages
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_tokens: Option<u64>,
    /// Tokens produced in the reply
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_tokens: Option<u64>,
    /// Total tokens billed for the exchange
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_tokens: Option<u64>,
    /// Fields without a dedicated slot, e.g. `prompt_tokens_details`
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TokenUsage {
    /// Create a usage record, deriving the total from its parts
    pub fn new(prompt_tokens: u64, completion_tokens: u64) -> Self {
        Self {
            prompt_tokens: Some(prompt_tokens),
            completion_tokens: Some(completion_tokens),
            total_tokens: Some(prompt_tokens + completion_tokens),
            extra: Map::new(),
        }
    }

    /// Create a record that only knows the total
    pub fn total(total_tokens: u64) -> Self {
        Self {
            total_tokens: Some(total_tokens),
            ..Self::default()
        }
    }
}

/// One completed exchange between the user and the completion service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    /// Text the user entered
    pub input: String,
    /// Reply text returned by the service
    pub output: String,
    /// Usage metadata, when the service reported it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<TokenUsage>,
}

impl Turn {
    /// Create a new turn
    pub fn new(input: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            usage: None,
        }
    }

    /// Attach usage metadata
    pub fn with_usage(mut self, usage: Option<TokenUsage>) -> Self {
        self.usage = usage;
        self
    }
}

/// The ordered turns recorded for one calendar day.
///
/// Turns are only ever appended; the log never reorders or drops entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryLog {
    date: String,
    turns: Vec<Turn>,
}

impl HistoryLog {
    /// Create an empty log for `date` (`YYYY-MM-DD`)
    pub fn new(date: impl Into<String>) -> Self {
        Self::with_turns(date, Vec::new())
    }

    /// Create a log from turns already recorded for `date`
    pub fn with_turns(date: impl Into<String>, turns: Vec<Turn>) -> Self {
        Self {
            date: date.into(),
            turns,
        }
    }

    /// Date key this log belongs to
    pub fn date(&self) -> &str {
        &self.date
    }

    /// Recorded turns, oldest first
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Append a completed turn
    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}
