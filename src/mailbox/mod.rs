//! Folder retrieval and sending on top of a [`MailProvider`].
//!
//! A folder fetch lists message ids once, then fetches every message's detail
//! concurrently. A message that fails to fetch is logged and left out; only a
//! failed listing fails the whole request. Output order always matches the
//! listing order.

pub mod normalize;

use futures::stream::{FuturesUnordered, StreamExt};
use log::{error, info, warn};

use crate::auth::credentials::AccessToken;
use crate::config::DEFAULT_MAX_RESULTS;
use crate::domain::message::{NormalizedMessage, OutboundDraft, SendResult};
use crate::error::{MailError, Result};
use crate::mail::encoder;
use crate::mail::provider::MailProvider;

use normalize::{Clock, SystemClock, normalize};

pub struct Mailbox<P, C = SystemClock> {
    provider: P,
    clock: C,
    max_results: u32,
}

impl<P: MailProvider> Mailbox<P> {
    pub fn new(provider: P) -> Self {
        Self::with_clock(provider, SystemClock)
    }
}

impl<P: MailProvider, C: Clock> Mailbox<P, C> {
    pub fn with_clock(provider: P, clock: C) -> Self {
        Self {
            provider,
            clock,
            max_results: DEFAULT_MAX_RESULTS,
        }
    }

    /// Listing page size, which is also the fetch concurrency.
    pub fn max_results(mut self, max_results: u32) -> Self {
        self.max_results = max_results;
        self
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub async fn fetch_folder(
        &self,
        token: &AccessToken,
        label_filter: &[String],
    ) -> Result<Vec<NormalizedMessage>> {
        let ids = self
            .provider
            .list_messages(token, label_filter, self.max_results)
            .await
            .map_err(|e| {
                error!("listing {label_filter:?} failed: {e}");
                MailError::Listing(e)
            })?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        // Every fetch writes only its own slot, so completion order is irrelevant.
        let mut slots: Vec<Option<NormalizedMessage>> = vec![None; ids.len()];
        let mut pending: FuturesUnordered<_> = ids
            .iter()
            .enumerate()
            .map(move |(idx, id)| async move {
                (idx, self.provider.get_message(token, id).await)
            })
            .collect();

        while let Some((idx, fetched)) = pending.next().await {
            match fetched {
                Ok(raw) => slots[idx] = Some(normalize(&raw, &self.clock)),
                Err(e) => warn!("skipping message {}: {e}", ids[idx]),
            }
        }

        let messages: Vec<NormalizedMessage> = slots.into_iter().flatten().collect();
        info!(
            "fetched {}/{} messages for {:?}",
            messages.len(),
            ids.len(),
            label_filter
        );
        Ok(messages)
    }

    /// Validates, encodes and submits the draft. One attempt, no retry.
    pub async fn send(&self, token: &AccessToken, draft: &OutboundDraft) -> Result<SendResult> {
        let payload = encoder::encode(draft)?;
        match self.provider.send_message(token, &payload).await {
            Ok(sent) => {
                info!("sent message {} to {}", sent.id, draft.to);
                Ok(sent)
            }
            Err(e) => {
                error!("sending to {} failed: {e}", draft.to);
                Err(MailError::Provider(e))
            }
        }
    }
}
