//! Unread message fetcher — lists, fetches, extracts, and orders.

use futures::future::try_join_all;

use crate::auth::AccessCredentials;
use crate::error::MailError;
use crate::mail::codec;
use crate::mail::transport::MailTransport;
use crate::mail::types::{MessageEnvelope, PlainMessage};

const DEFAULT_SUBJECT: &str = "(No Subject)";

/// Fetch up to `limit` unread messages, newest first.
///
/// Envelope fetches are independent reads and run concurrently. Any
/// single failure aborts the whole call — per-item degradation is the
/// enrichment side's job, not the fetcher's.
pub async fn fetch_unread(
    transport: &dyn MailTransport,
    creds: &AccessCredentials,
    limit: usize,
) -> Result<Vec<PlainMessage>, MailError> {
    let ids = transport.list_unread_ids(creds, limit).await?;
    if ids.is_empty() {
        tracing::debug!("No unread messages");
        return Ok(Vec::new());
    }

    let envelopes: Vec<MessageEnvelope> =
        try_join_all(ids.iter().map(|id| transport.get_envelope(creds, id))).await?;

    let mut messages: Vec<PlainMessage> = envelopes.iter().map(to_plain_message).collect();
    // Stable: ties keep their fetch order.
    messages.sort_by(|a, b| b.date.cmp(&a.date));

    tracing::info!(count = messages.len(), "Fetched unread messages");
    Ok(messages)
}

/// The authenticated user's address, from the provider profile.
pub async fn profile_email(
    transport: &dyn MailTransport,
    creds: &AccessCredentials,
) -> Result<String, MailError> {
    transport.get_profile_email(creds).await
}

/// Build a `PlainMessage` from one envelope.
fn to_plain_message(envelope: &MessageEnvelope) -> PlainMessage {
    let headers = envelope
        .payload
        .as_ref()
        .map(|p| p.headers.as_slice())
        .unwrap_or(&[]);

    let subject = codec::header_value(headers, "Subject")
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_SUBJECT)
        .to_string();
    let sender = codec::extract_sender(codec::header_value(headers, "From").unwrap_or(""));
    let date = codec::message_date(headers, envelope.internal_date.as_deref());

    let body = envelope
        .payload
        .as_ref()
        .map(codec::extract_body)
        .unwrap_or_default();
    let snippet = if body.is_empty() {
        envelope.snippet.clone()
    } else {
        body
    };

    PlainMessage {
        id: envelope.id.clone(),
        subject,
        sender,
        date,
        snippet,
    }
}
