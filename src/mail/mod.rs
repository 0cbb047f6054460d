//! Unread mail fetching — wire types, body extraction, transport, fetcher.

pub mod codec;
pub mod fetcher;
pub mod transport;
pub mod types;

pub use fetcher::{fetch_unread, profile_email};
pub use transport::{GmailTransport, MailTransport};
pub use types::{BodyNode, Header, MessageEnvelope, PlainMessage};
