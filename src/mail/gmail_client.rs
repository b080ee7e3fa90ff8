//! Gmail REST API (v1) implementation of [`MailProvider`].
//!
//! Only the three calls the mailbox needs are implemented:
//! `users.messages.list`, `users.messages.get` (full format) and
//! `users.messages.send`.

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use log::debug;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use url::Url;

use crate::auth::credentials::AccessToken;
use crate::config::{Config, resolve_api_base, resolve_user_id};
use crate::domain::message::{EncodedPayload, MessageId, RawMessage, SendResult};
use crate::error::ProviderError;
use crate::mail::provider::MailProvider;

pub struct GmailClient {
    http: Client,
    base: Url,
    user: String,
}

impl GmailClient {
    pub fn new(base: Url, user: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base,
            user: user.into(),
        }
    }

    pub fn from_config(cfg: &Config) -> Result<Self> {
        let base = resolve_api_base(cfg)?;
        if base.cannot_be_a_base() {
            return Err(anyhow!("api_base is not a hierarchical URL: {base}"));
        }
        Ok(Self::new(base, resolve_user_id(cfg)))
    }

    /// `{base}/users/{user}/messages[/{extra}...]`
    fn messages_url(&self, extra: &[&str]) -> Result<Url, ProviderError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| ProviderError::Malformed(format!("bad api base {}", self.base)))?
            .pop_if_empty()
            .extend(["users", self.user.as_str(), "messages"])
            .extend(extra);
        Ok(url)
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        token: &AccessToken,
    ) -> Result<T, ProviderError> {
        let response = request.bearer_auth(token.secret()).send().await?;
        let response = check_status(response).await?;
        Ok(response.json::<T>().await?)
    }
}

async fn check_status(response: Response) -> Result<Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    Err(ProviderError::Status {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl MailProvider for GmailClient {
    async fn list_messages(
        &self,
        token: &AccessToken,
        label_ids: &[String],
        max_results: u32,
    ) -> Result<Vec<MessageId>, ProviderError> {
        let url = self.messages_url(&[])?;
        let mut query: Vec<(&str, String)> = label_ids
            .iter()
            .map(|l| ("labelIds", l.clone()))
            .collect();
        query.push(("maxResults", max_results.to_string()));

        let listed: api::ListMessagesResponse =
            self.execute(self.http.get(url).query(&query), token).await?;
        let ids: Vec<MessageId> = listed
            .messages
            .unwrap_or_default()
            .into_iter()
            .map(|m| m.id)
            .collect();
        debug!("listed {} message ids for {:?}", ids.len(), label_ids);
        Ok(ids)
    }

    async fn get_message(
        &self,
        token: &AccessToken,
        id: &str,
    ) -> Result<RawMessage, ProviderError> {
        let url = self.messages_url(&[id])?;
        let message: api::GmailMessage = self
            .execute(self.http.get(url).query(&[("format", "full")]), token)
            .await?;
        message.try_into()
    }

    async fn send_message(
        &self,
        token: &AccessToken,
        payload: &EncodedPayload,
    ) -> Result<SendResult, ProviderError> {
        let url = self.messages_url(&["send"])?;
        let body = api::SendRequest {
            raw: payload.as_str(),
        };
        let sent: api::SendResponse = self.execute(self.http.post(url).json(&body), token).await?;
        Ok(SendResult {
            id: sent.id,
            thread_id: sent.thread_id,
            label_ids: sent.label_ids.unwrap_or_default(),
        })
    }
}

/// Wire types for the Gmail API.
pub mod api {
    use serde::{Deserialize, Serialize};

    use crate::domain::message::{Header as DomainHeader, MessagePart as DomainPart, RawMessage};
    use crate::error::ProviderError;

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ListMessagesResponse {
        pub messages: Option<Vec<MessageRef>>,
        pub next_page_token: Option<String>,
        pub result_size_estimate: Option<u32>,
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct MessageRef {
        pub id: String,
        pub thread_id: Option<String>,
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct GmailMessage {
        pub id: String,
        pub label_ids: Option<Vec<String>>,
        pub internal_date: Option<String>,
        pub payload: Option<MessagePart>,
    }

    #[derive(Debug, Deserialize)]
    pub struct Header {
        pub name: String,
        pub value: String,
    }

    #[derive(Debug, Deserialize)]
    pub struct MessageBody {
        pub size: Option<u64>,
        pub data: Option<String>,
    }

    /// Used both for the top-level payload and for nested parts.
    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct MessagePart {
        pub mime_type: Option<String>,
        pub headers: Option<Vec<Header>>,
        pub body: Option<MessageBody>,
        pub parts: Option<Vec<MessagePart>>,
    }

    #[derive(Debug, Serialize)]
    pub struct SendRequest<'a> {
        pub raw: &'a str,
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct SendResponse {
        pub id: String,
        pub thread_id: Option<String>,
        pub label_ids: Option<Vec<String>>,
    }

    impl From<MessagePart> for DomainPart {
        fn from(part: MessagePart) -> Self {
            let mime_type = part.mime_type.unwrap_or_default();
            let children = part.parts.unwrap_or_default();
            if !children.is_empty() {
                return DomainPart::multipart(
                    mime_type,
                    children.into_iter().map(DomainPart::from).collect(),
                );
            }
            match part.body.and_then(|b| b.data).filter(|d| !d.is_empty()) {
                Some(data) => DomainPart::leaf(mime_type, data),
                None => DomainPart::empty(mime_type),
            }
        }
    }

    impl TryFrom<GmailMessage> for RawMessage {
        type Error = ProviderError;

        fn try_from(msg: GmailMessage) -> Result<Self, Self::Error> {
            let mut payload = msg.payload.ok_or_else(|| {
                ProviderError::Malformed(format!("message {} has no payload", msg.id))
            })?;
            let headers = payload
                .headers
                .take()
                .unwrap_or_default()
                .into_iter()
                .map(|h| DomainHeader::new(h.name, h.value))
                .collect();

            Ok(RawMessage {
                id: msg.id,
                headers,
                internal_timestamp: msg.internal_date,
                labels: msg.label_ids.unwrap_or_default().into_iter().collect(),
                root: payload.into(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::message::MessagePart;

    #[test]
    fn full_message_json_converts_to_tagged_tree() {
        let json = r#"{
            "id": "18c2f",
            "threadId": "18c2f",
            "labelIds": ["INBOX", "UNREAD"],
            "internalDate": "1700000000000",
            "payload": {
                "mimeType": "multipart/alternative",
                "headers": [
                    {"name": "From", "value": "Ann <ann@example.com>"},
                    {"name": "Subject", "value": "Hi"}
                ],
                "body": {"size": 0},
                "parts": [
                    {"mimeType": "text/plain", "body": {"size": 2, "data": "aGk"}},
                    {"mimeType": "text/html", "body": {"size": 0, "data": ""}}
                ]
            }
        }"#;
        let wire: api::GmailMessage = serde_json::from_str(json).unwrap();
        let raw = RawMessage::try_from(wire).unwrap();

        assert_eq!(raw.id, "18c2f");
        assert_eq!(raw.header("Subject"), Some("Hi"));
        assert_eq!(raw.internal_timestamp.as_deref(), Some("1700000000000"));
        assert!(raw.labels.contains("UNREAD"));
        assert_eq!(
            raw.root,
            MessagePart::multipart(
                "multipart/alternative",
                vec![
                    MessagePart::leaf("text/plain", "aGk"),
                    MessagePart::empty("text/html"),
                ]
            )
        );
    }

    #[test]
    fn message_without_payload_is_malformed() {
        let wire: api::GmailMessage = serde_json::from_str(r#"{"id": "x"}"#).unwrap();
        let err = RawMessage::try_from(wire).unwrap_err();
        assert!(matches!(err, ProviderError::Malformed(_)));
    }

    #[test]
    fn empty_listing_has_no_messages_field() {
        let listed: api::ListMessagesResponse =
            serde_json::from_str(r#"{"resultSizeEstimate": 0}"#).unwrap();
        assert!(listed.messages.is_none());
    }

    #[test]
    fn urls_are_built_under_the_user() {
        let client = GmailClient::new(
            Url::parse("https://gmail.googleapis.com/gmail/v1/").unwrap(),
            "me",
        );
        assert_eq!(
            client.messages_url(&["abc"]).unwrap().as_str(),
            "https://gmail.googleapis.com/gmail/v1/users/me/messages/abc"
        );
        assert_eq!(
            client.messages_url(&["send"]).unwrap().as_str(),
            "https://gmail.googleapis.com/gmail/v1/users/me/messages/send"
        );
    }
}
