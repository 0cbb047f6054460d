//! Mail data model — Gmail REST wire types and the plain record the
//! rest of the core consumes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single message header. Names are matched case-insensitively,
/// first match wins (see [`crate::mail::codec::header_value`]).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Header {
    pub name: String,
    pub value: String,
}

/// Inline body content of one MIME part, base64url-encoded.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct BodyData {
    #[serde(rename = "attachmentId", default)]
    pub attachment_id: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub data: Option<String>,
}

/// One node of the (possibly multipart) body tree.
///
/// A node carries inline data, or child parts, or neither. Containers
/// like `multipart/alternative` have empty `body.data` and populated
/// `parts`; leaves are the other way round.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct BodyNode {
    #[serde(rename = "mimeType", default)]
    pub mime_type: String,
    #[serde(default)]
    pub headers: Vec<Header>,
    #[serde(default)]
    pub body: Option<BodyData>,
    #[serde(default)]
    pub parts: Vec<BodyNode>,
}

/// A full message envelope as returned by `format=full`.
#[derive(Debug, Clone, Deserialize)]
pub struct MessageEnvelope {
    pub id: String,
    /// Provider-supplied short preview, the fallback when body
    /// extraction comes up empty.
    #[serde(default)]
    pub snippet: String,
    /// Epoch milliseconds as a string, per the Gmail API.
    #[serde(rename = "internalDate", default)]
    pub internal_date: Option<String>,
    #[serde(default)]
    pub payload: Option<BodyNode>,
}

/// Reference entry from the message list endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct MessageRef {
    pub id: String,
    #[serde(rename = "threadId", default)]
    pub thread_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct MessageListResponse {
    #[serde(default)]
    pub messages: Option<Vec<MessageRef>>,
    #[serde(rename = "nextPageToken", default)]
    pub next_page_token: Option<String>,
    #[serde(rename = "resultSizeEstimate", default)]
    pub result_size_estimate: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct Profile {
    #[serde(rename = "emailAddress", default)]
    pub email_address: Option<String>,
    #[serde(rename = "messagesTotal", default)]
    pub messages_total: Option<u64>,
}

/// A fully extracted message, ready for display or enrichment.
/// Immutable once built by the fetcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlainMessage {
    pub id: String,
    pub subject: String,
    /// Bare address, already run through sender extraction.
    pub sender: String,
    pub date: DateTime<Utc>,
    pub snippet: String,
}
