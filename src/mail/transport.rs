//! Mail transport — the narrow read-only surface the fetcher consumes,
//! plus the Gmail REST implementation.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::auth::AccessCredentials;
use crate::error::MailError;
use crate::mail::types::{MessageEnvelope, MessageListResponse, Profile};

const GMAIL_API_BASE: &str = "https://gmail.googleapis.com/gmail/v1";

/// Read-only message transport. Implementations must be side-effect
/// free per call so envelope fetches can fan out concurrently.
#[async_trait]
pub trait MailTransport: Send + Sync {
    /// List up to `limit` unread message identifiers.
    async fn list_unread_ids(
        &self,
        creds: &AccessCredentials,
        limit: usize,
    ) -> Result<Vec<String>, MailError>;

    /// Fetch one full message envelope.
    async fn get_envelope(
        &self,
        creds: &AccessCredentials,
        id: &str,
    ) -> Result<MessageEnvelope, MailError>;

    /// The authenticated profile's address.
    async fn get_profile_email(&self, creds: &AccessCredentials) -> Result<String, MailError>;
}

/// Gmail REST v1 transport.
pub struct GmailTransport {
    client: reqwest::Client,
    base_url: String,
}

impl GmailTransport {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();
        Self {
            client,
            base_url: GMAIL_API_BASE.to_string(),
        }
    }

    /// Point the transport at a different endpoint (local stubs).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn get(
        &self,
        creds: &AccessCredentials,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<reqwest::Response, MailError> {
        if !creds.has_token() {
            return Err(MailError::Auth("no access token available".into()));
        }

        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .bearer_auth(creds.bearer())
            .query(query)
            .send()
            .await?;

        check_status(response).await
    }
}

impl Default for GmailTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MailTransport for GmailTransport {
    async fn list_unread_ids(
        &self,
        creds: &AccessCredentials,
        limit: usize,
    ) -> Result<Vec<String>, MailError> {
        let query = [
            ("q", "is:unread".to_string()),
            ("maxResults", limit.to_string()),
        ];
        let response = self.get(creds, "/users/me/messages", &query).await?;
        let list: MessageListResponse = response.json().await?;

        let ids: Vec<String> = list
            .messages
            .unwrap_or_default()
            .into_iter()
            .map(|m| m.id)
            .collect();
        tracing::debug!(count = ids.len(), "Listed unread messages");
        Ok(ids)
    }

    async fn get_envelope(
        &self,
        creds: &AccessCredentials,
        id: &str,
    ) -> Result<MessageEnvelope, MailError> {
        let path = format!("/users/me/messages/{id}");
        let query = [("format", "full".to_string())];
        let response = self.get(creds, &path, &query).await?;
        Ok(response.json().await?)
    }

    async fn get_profile_email(&self, creds: &AccessCredentials) -> Result<String, MailError> {
        let response = self.get(creds, "/users/me/profile", &[]).await?;
        let profile: Profile = response.json().await?;
        Ok(profile.email_address.unwrap_or_default())
    }
}

/// Google-style error body: `{"error": {"code": ..., "message": ...}}`.
#[derive(Debug, Default, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    error: Option<ApiErrorDetail>,
}

#[derive(Debug, Default, Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    message: Option<String>,
}

/// Map non-success statuses onto the typed taxonomy; 2xx passes through.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, MailError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response
        .json::<ApiErrorBody>()
        .await
        .ok()
        .and_then(|b| b.error)
        .and_then(|e| e.message);

    Err(map_status(status.as_u16(), message))
}

fn map_status(status: u16, message: Option<String>) -> MailError {
    match status {
        401 => MailError::Unauthorized,
        403 => MailError::Forbidden,
        404 => MailError::NotFound,
        429 => MailError::RateLimited,
        _ => MailError::Api {
            status,
            message: message
                .unwrap_or_else(|| format!("API request failed with status {status}")),
        },
    }
}
