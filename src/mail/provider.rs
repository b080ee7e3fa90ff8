use async_trait::async_trait;

use crate::auth::credentials::AccessToken;
use crate::domain::message::{EncodedPayload, MessageId, RawMessage, SendResult};
use crate::error::ProviderError;

/// The remote message store the mailbox reads from and sends through.
#[async_trait]
pub trait MailProvider: Send + Sync {
    /// Ids of up to `max_results` messages carrying every label in `label_ids`.
    async fn list_messages(
        &self,
        token: &AccessToken,
        label_ids: &[String],
        max_results: u32,
    ) -> Result<Vec<MessageId>, ProviderError>;

    async fn get_message(
        &self,
        token: &AccessToken,
        id: &str,
    ) -> Result<RawMessage, ProviderError>;

    async fn send_message(
        &self,
        token: &AccessToken,
        payload: &EncodedPayload,
    ) -> Result<SendResult, ProviderError>;
}
