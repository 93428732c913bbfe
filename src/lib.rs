//! Conversation-level Cleverbot client.
//!
//! [`ConversationService`] is the single entry point a host (chat bot, CLI)
//! needs: `query(key, message)` runs one turn on the conversation identified by
//! `key`, threading the service's session tokens and context between turns,
//! and `reset(key)` forgets that conversation.
//!
//! Wire-level concerns (signing, escaping, cookie bootstrap, retries) live in
//! [`cleverbot_api`]; per-key state lives in [`conversation_store`].

pub mod service;
pub mod transport;

pub use cleverbot_api::{CancellationSignal, CleverbotApiError, CleverbotConfig};
pub use conversation_store::{ConversationState, ConversationStore};
pub use service::ConversationService;
pub use transport::ConversationTransport;
