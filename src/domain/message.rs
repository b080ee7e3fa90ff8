use std::collections::BTreeSet;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};

pub type MessageId = String;

pub const MIME_TEXT_PLAIN: &str = "text/plain";
pub const MIME_TEXT_HTML: &str = "text/html";

/// One node of the provider's body tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessagePart {
    /// A part carrying an encoded payload (base64 of the raw bytes).
    Leaf { mime_type: String, data: String },
    /// A part with neither payload nor children.
    Empty { mime_type: String },
    /// A part with at least one child.
    Multipart {
        mime_type: String,
        children: Vec<MessagePart>,
    },
}

impl MessagePart {
    pub fn leaf(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self::Leaf {
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    pub fn empty(mime_type: impl Into<String>) -> Self {
        Self::Empty {
            mime_type: mime_type.into(),
        }
    }

    /// Builds a composite node; an empty child list collapses to `Empty`.
    pub fn multipart(mime_type: impl Into<String>, children: Vec<MessagePart>) -> Self {
        let mime_type = mime_type.into();
        if children.is_empty() {
            Self::Empty { mime_type }
        } else {
            Self::Multipart {
                mime_type,
                children,
            }
        }
    }

    pub fn mime_type(&self) -> &str {
        match self {
            Self::Leaf { mime_type, .. }
            | Self::Empty { mime_type }
            | Self::Multipart { mime_type, .. } => mime_type,
        }
    }

    pub fn is_multipart(&self) -> bool {
        matches!(self, Self::Multipart { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub name: String,
    pub value: String,
}

impl Header {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Full message detail as returned by the provider.
#[derive(Debug, Clone)]
pub struct RawMessage {
    pub id: MessageId,
    pub headers: Vec<Header>,
    /// Provider receipt time, epoch milliseconds as text.
    pub internal_timestamp: Option<String>,
    pub labels: BTreeSet<String>,
    pub root: MessagePart,
}

impl RawMessage {
    /// First header with exactly this name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|h| h.name == name)
            .map(|h| h.value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizedMessage {
    pub id: MessageId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    pub to: String,
    pub subject: String,
    pub body: String,
    #[serde(serialize_with = "serialize_iso_millis")]
    pub date: DateTime<Utc>,
    /// Set when neither the `Date` header nor the receipt time could be used.
    pub date_estimated: bool,
    pub read: bool,
}

impl NormalizedMessage {
    pub fn date_iso(&self) -> String {
        render_date(&self.date)
    }
}

/// ISO-8601, UTC, millisecond precision, `Z` suffix.
pub fn render_date(date: &DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn serialize_iso_millis<S: Serializer>(date: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&render_date(date))
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutboundDraft {
    pub to: String,
    pub subject: String,
    pub message: String,
}

impl OutboundDraft {
    pub fn new(
        to: impl Into<String>,
        subject: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            to: to.into(),
            subject: subject.into(),
            message: message.into(),
        }
    }
}

/// Transport-ready message: URL-safe base64 without padding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedPayload(pub String);

impl EncodedPayload {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SendResult {
    pub id: MessageId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
    pub label_ids: Vec<String>,
}
