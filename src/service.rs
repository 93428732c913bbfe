use std::sync::Arc;

use cleverbot_api::{
    parse_response, CancellationSignal, CleverbotApiError, CleverbotClient, CleverbotConfig,
    CleverbotRequest, RequestContext,
};
use conversation_store::{ConversationState, ConversationStore};
use tracing::{debug, info, warn};

use crate::transport::ConversationTransport;

const SUCCESS_STATUS: u16 = 200;

/// Runs conversation turns against the service and keeps per-key state.
///
/// Turns on the same key are serialized for their whole duration; turns on
/// different keys run concurrently. State is only written after a response
/// parsed successfully, so a failed turn leaves the conversation exactly as it
/// was.
pub struct ConversationService {
    transport: Arc<dyn ConversationTransport>,
    store: ConversationStore,
}

impl ConversationService {
    /// Creates a service talking to the public endpoint.
    pub fn new() -> Result<Self, CleverbotApiError> {
        Self::with_config(CleverbotConfig::default())
    }

    pub fn with_config(config: CleverbotConfig) -> Result<Self, CleverbotApiError> {
        let client = CleverbotClient::new(config)?;
        Ok(Self::with_transport(Arc::new(client)))
    }

    pub fn with_transport(transport: Arc<dyn ConversationTransport>) -> Self {
        Self::from_parts(transport, ConversationStore::new())
    }

    pub fn from_parts(transport: Arc<dyn ConversationTransport>, store: ConversationStore) -> Self {
        Self { transport, store }
    }

    /// Sends `message` on conversation `key` and returns the reply.
    pub async fn query(&self, key: &str, message: &str) -> Result<String, CleverbotApiError> {
        self.query_with_cancel(key, message, None).await
    }

    /// Like [`query`](Self::query), aborting with `Cancelled` once
    /// `cancellation` is set.
    pub async fn query_with_cancel(
        &self,
        key: &str,
        message: &str,
        cancellation: Option<&CancellationSignal>,
    ) -> Result<String, CleverbotApiError> {
        let mut slot = self.store.lock(key).await;

        let prior = slot.state();
        let request = CleverbotRequest::build(message, prior.map(request_context));
        debug!(
            key = %key,
            context_lines = prior.map_or(0, |state| state.history.len()),
            body_len = request.body.len(),
            "sending turn"
        );

        let response = self.transport.post(&request, cancellation).await?;
        if response.status != SUCCESS_STATUS {
            warn!(key = %key, status = response.status, "unexpected response status");
            return Err(CleverbotApiError::UnexpectedStatus(response.status));
        }

        let parsed = parse_response(&response.text).inspect_err(|error| {
            warn!(key = %key, %error, "rejected response");
        })?;

        let next = ConversationState::after_turn(
            slot.state(),
            message,
            parsed.reply.as_str(),
            parsed.session_id,
            parsed.session_aux,
        );
        let turns = next.turns();
        slot.replace(next);
        info!(key = %key, turns, "turn completed");

        Ok(parsed.reply)
    }

    /// Forgets conversation `key`; the next query starts a fresh conversation.
    pub async fn reset(&self, key: &str) {
        if self.store.remove(key).await.is_some() {
            info!(key = %key, "conversation reset");
        }
    }

    /// Snapshot of conversation `key`, `None` while it is fresh.
    pub async fn conversation(&self, key: &str) -> Option<ConversationState> {
        self.store.get(key).await
    }
}

fn request_context(state: &ConversationState) -> RequestContext<'_> {
    RequestContext {
        history: &state.history,
        last_reply: &state.last_reply,
        session_id: &state.session_id,
        session_aux: &state.session_aux,
    }
}
