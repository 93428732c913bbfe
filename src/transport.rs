use async_trait::async_trait;
use cleverbot_api::{
    CancellationSignal, CleverbotApiError, CleverbotClient, CleverbotRequest, RawResponse,
};

/// Sends a signed request and returns the response that ended the retry loop.
///
/// [`CleverbotClient`] is the production implementation; tests substitute
/// scripted transports.
#[async_trait]
pub trait ConversationTransport: Send + Sync {
    async fn post(
        &self,
        request: &CleverbotRequest,
        cancellation: Option<&CancellationSignal>,
    ) -> Result<RawResponse, CleverbotApiError>;
}

#[async_trait]
impl ConversationTransport for CleverbotClient {
    async fn post(
        &self,
        request: &CleverbotRequest,
        cancellation: Option<&CancellationSignal>,
    ) -> Result<RawResponse, CleverbotApiError> {
        CleverbotClient::post(self, request, cancellation).await
    }
}
