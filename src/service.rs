use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;

use crate::auth::credentials::AccessToken;
use crate::domain::message::{NormalizedMessage, OutboundDraft, SendResult};
use crate::error::{MailError, Result};
use crate::mail::provider::MailProvider;
use crate::mailbox::Mailbox;
use crate::mailbox::normalize::Clock;

/// Folders the mailbox view can show, each backed by one provider label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum Folder {
    Inbox,
    Sent,
    Drafts,
    Trash,
    Primary,
}

impl Folder {
    pub const ALL: [Folder; 5] = [
        Folder::Inbox,
        Folder::Sent,
        Folder::Drafts,
        Folder::Trash,
        Folder::Primary,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Folder::Inbox => "INBOX",
            Folder::Sent => "SENT",
            Folder::Drafts => "DRAFT",
            Folder::Trash => "TRASH",
            Folder::Primary => "CATEGORY_PRIMARY",
        }
    }

    pub fn label_filter(self) -> Vec<String> {
        vec![self.label().to_string()]
    }

    pub fn name(self) -> &'static str {
        match self {
            Folder::Inbox => "inbox",
            Folder::Sent => "sent",
            Folder::Drafts => "drafts",
            Folder::Trash => "trash",
            Folder::Primary => "primary",
        }
    }
}

impl fmt::Display for Folder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Folder {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Folder::ALL
            .into_iter()
            .find(|f| f.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown folder '{s}'"))
    }
}

/// Entry points for callers. Both operations refuse to run without a
/// credential, before touching the provider.
pub struct MailService<P, C> {
    mailbox: Mailbox<P, C>,
}

impl<P: MailProvider, C: Clock> MailService<P, C> {
    pub fn new(mailbox: Mailbox<P, C>) -> Self {
        Self { mailbox }
    }

    pub fn mailbox(&self) -> &Mailbox<P, C> {
        &self.mailbox
    }

    pub async fn get_folder(
        &self,
        credential: Option<&AccessToken>,
        folder: Folder,
    ) -> Result<Vec<NormalizedMessage>> {
        let token = credential.ok_or(MailError::Unauthenticated)?;
        self.mailbox
            .fetch_folder(token, &folder.label_filter())
            .await
    }

    pub async fn send_draft(
        &self,
        credential: Option<&AccessToken>,
        draft: &OutboundDraft,
    ) -> Result<SendResult> {
        let token = credential.ok_or(MailError::Unauthenticated)?;
        self.mailbox.send(token, draft).await
    }
}
