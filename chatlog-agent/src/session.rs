//! Chat session: owns the context and the day's history

use chatlog_core::{HistoryLog, HistoryStore, Turn};
use tracing::{info, warn};

use crate::context::SessionContext;
use crate::engine::{ConversationEngine, Reply};
use crate::error::AgentResult;

/// Result of a successful exchange
#[derive(Debug)]
pub struct TurnOutcome {
    /// What the provider answered
    pub reply: Reply,
    /// Set when the turn could not be written to disk. The turn is still
    /// part of the in-memory context and history.
    pub persist_error: Option<chatlog_core::Error>,
}

/// One user's conversation: session context, history log and the store the
/// log is written to.
///
/// [`ChatSession::submit`] takes `&mut self`, so a session never has more
/// than one request in flight.
pub struct ChatSession {
    engine: ConversationEngine,
    store: HistoryStore,
    context: SessionContext,
    history: HistoryLog,
}

impl ChatSession {
    /// Create a session around an already loaded history log
    pub fn new(engine: ConversationEngine, store: HistoryStore, history: HistoryLog) -> Self {
        Self {
            engine,
            store,
            context: SessionContext::new(),
            history,
        }
    }

    /// Prepare the history directory and load the log for `date_key`.
    ///
    /// Fails when the day file exists but cannot be read or parsed.
    pub async fn open(
        engine: ConversationEngine,
        store: HistoryStore,
        date_key: &str,
    ) -> AgentResult<Self> {
        let history = store.open_day(date_key).await?;
        info!(
            "Opened session for {} with {} recorded turns",
            date_key,
            history.len()
        );
        Ok(Self::new(engine, store, history))
    }

    /// Run one exchange.
    ///
    /// On provider failure the error is returned and neither the context nor
    /// the history changes. On success the exchange is appended to both and
    /// the day file is rewritten; a failed write is reported in the outcome
    /// rather than as an error.
    pub async fn submit(&mut self, input: &str) -> AgentResult<TurnOutcome> {
        let reply = self.engine.respond(&self.context, input).await?;

        self.context.push_exchange(input, reply.output.clone());
        let turn = Turn::new(input, reply.output.clone()).with_usage(reply.usage.clone());

        let persist_error = match self.store.append(&mut self.history, turn).await {
            Ok(()) => None,
            Err(e) => {
                warn!(
                    "Failed to persist history to {}: {}",
                    self.store.path_for(self.history.date()).display(),
                    e
                );
                Some(e)
            }
        };

        Ok(TurnOutcome {
            reply,
            persist_error,
        })
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    pub fn history(&self) -> &HistoryLog {
        &self.history
    }

    pub fn store(&self) -> &HistoryStore {
        &self.store
    }

    pub fn engine(&self) -> &ConversationEngine {
        &self.engine
    }
}
