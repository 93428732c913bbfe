use serde::{Deserialize, Serialize};

/// Session tokens and context of an established conversation.
///
/// A fresh conversation has no state at all, so `session_id` and
/// `session_aux` are always present together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationState {
    pub session_id: String,
    pub session_aux: String,
    pub last_reply: String,
    /// Alternating user message and reply, oldest first.
    pub history: Vec<String>,
}

impl ConversationState {
    /// State after a successful turn on top of `prior`.
    ///
    /// Tokens and `last_reply` are replaced; `history` is the prior history
    /// with `message` and `reply` appended.
    #[must_use]
    pub fn after_turn(
        prior: Option<&ConversationState>,
        message: impl Into<String>,
        reply: impl Into<String>,
        session_id: impl Into<String>,
        session_aux: impl Into<String>,
    ) -> Self {
        let reply = reply.into();
        let mut history = prior
            .map(|state| state.history.clone())
            .unwrap_or_default();
        history.reserve(2);
        history.push(message.into());
        history.push(reply.clone());

        Self {
            session_id: session_id.into(),
            session_aux: session_aux.into(),
            last_reply: reply,
            history,
        }
    }

    /// Number of completed message/reply pairs.
    #[must_use]
    pub fn turns(&self) -> usize {
        self.history.len() / 2
    }
}
