//! Error type for the session layer

use chatlog_providers::ProviderError;
use thiserror::Error;

/// Errors surfaced by a chat session
#[derive(Error, Debug)]
pub enum AgentError {
    /// The completion call failed; nothing was recorded
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// Loading or writing the history failed
    #[error(transparent)]
    History(#[from] chatlog_core::Error),
}

pub type AgentResult<T> = Result<T, AgentError>;
