//! Conversation engine and chat session for chatlog

pub mod context;
pub mod engine;
pub mod error;
pub mod session;

pub use context::SessionContext;
pub use engine::{ConversationEngine, Reply};
pub use error::{AgentError, AgentResult};
pub use session::{ChatSession, TurnOutcome};
