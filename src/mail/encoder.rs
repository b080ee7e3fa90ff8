use base64::{Engine as _, engine::general_purpose};

use crate::domain::message::{EncodedPayload, OutboundDraft};
use crate::error::{MailError, Result};

/// Checks that every draft field is present, reporting the first empty one.
pub fn validate(draft: &OutboundDraft) -> Result<()> {
    let fields = [
        ("to", &draft.to),
        ("subject", &draft.subject),
        ("message", &draft.message),
    ];
    match fields.into_iter().find(|(_, v)| v.is_empty()) {
        Some((field, _)) => Err(MailError::Validation { field }),
        None => Ok(()),
    }
}

/// Renders the draft as a minimal plain-text RFC 822 message.
pub fn build_raw_message(draft: &OutboundDraft) -> String {
    [
        format!("To: {}", draft.to),
        "Content-Type: text/plain; charset=utf-8".to_string(),
        "MIME-Version: 1.0".to_string(),
        format!("Subject: {}", draft.subject),
        String::new(),
        draft.message.clone(),
    ]
    .join("\n")
}

/// Encodes the draft for the provider's `raw` field: URL-safe base64
/// (`-` and `_` instead of `+` and `/`) with padding stripped.
pub fn encode(draft: &OutboundDraft) -> Result<EncodedPayload> {
    validate(draft)?;
    let raw = build_raw_message(draft);
    Ok(EncodedPayload(
        general_purpose::URL_SAFE_NO_PAD.encode(raw.as_bytes()),
    ))
}
