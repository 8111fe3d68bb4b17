//! Session context: the message sequence sent with every request

use chatlog_providers::Message;

/// Ordered user/assistant messages for the lifetime of a session.
///
/// The context only grows; completed exchanges are appended as a
/// (user, assistant) pair.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionContext {
    messages: Vec<Message>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a completed exchange
    pub fn push_exchange(&mut self, input: impl Into<String>, output: impl Into<String>) {
        self.messages.push(Message::user(input));
        self.messages.push(Message::assistant(output));
    }

    /// All messages, oldest first
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// The trailing messages to send with a request.
    ///
    /// With a cap the window starts on a user message so the provider never
    /// sees an orphaned assistant reply.
    pub fn window(&self, max_messages: Option<usize>) -> &[Message] {
        let Some(max) = max_messages else {
            return &self.messages;
        };
        let mut start = self.messages.len().saturating_sub(max);
        if start % 2 == 1 {
            start += 1;
        }
        &self.messages[start..]
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatlog_providers::Role;

    fn context_with(turns: usize) -> SessionContext {
        let mut context = SessionContext::new();
        for i in 0..turns {
            context.push_exchange(format!("q{}", i), format!("a{}", i));
        }
        context
    }

    #[test]
    fn test_push_exchange_appends_pair() {
        let mut context = SessionContext::new();
        context.push_exchange("A", "B");
        context.push_exchange("C", "D");

        let roles: Vec<Role> = context.messages().iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![Role::User, Role::Assistant, Role::User, Role::Assistant]
        );
        assert_eq!(context.messages()[2].content, "C");
    }

    #[test]
    fn test_window_without_cap_is_everything() {
        let context = context_with(30);
        assert_eq!(context.window(None).len(), 60);
    }

    #[test]
    fn test_window_keeps_latest_messages() {
        let context = context_with(5);
        let window = context.window(Some(4));
        assert_eq!(window.len(), 4);
        assert_eq!(window[0].content, "q3");
        assert_eq!(window[3].content, "a4");
    }

    #[test]
    fn test_odd_window_starts_on_user_message() {
        let context = context_with(5);
        let window = context.window(Some(3));
        assert_eq!(window.len(), 2);
        assert_eq!(window[0].role, Role::User);
        assert_eq!(window[0].content, "q4");
    }

    #[test]
    fn test_window_larger_than_context() {
        let context = context_with(2);
        assert_eq!(context.window(Some(100)).len(), 4);
    }
}
