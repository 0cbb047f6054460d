//! Generation transport — the conversation/run surface the enricher
//! consumes, plus the OpenAI Assistants implementation.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;

use crate::error::GenerationError;

const OPENAI_API_BASE: &str = "https://api.openai.com/v1";
const ASSISTANTS_BETA_HEADER: &str = "assistants=v2";

/// Handle for one asynchronous generation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunHandle {
    pub conversation_id: String,
    pub run_id: String,
}

/// External text-generation service, modeled as a conversation with
/// asynchronous runs. One conversation per enrichment batch.
#[async_trait]
pub trait GenerationTransport: Send + Sync {
    /// Open a fresh conversation, returning its identifier.
    async fn create_conversation(&self) -> Result<String, GenerationError>;

    /// Append a user message to a conversation.
    async fn post_message(
        &self,
        conversation_id: &str,
        text: &str,
    ) -> Result<(), GenerationError>;

    /// Start an asynchronous run over the conversation.
    async fn start_run(&self, conversation_id: &str) -> Result<RunHandle, GenerationError>;

    /// Current status string of a run (`queued`, `in_progress`,
    /// `completed`, `failed`, `cancelled`, ...).
    async fn get_run_status(&self, handle: &RunHandle) -> Result<String, GenerationError>;

    /// Assistant reply texts for a conversation, newest first.
    async fn list_replies(&self, conversation_id: &str) -> Result<Vec<String>, GenerationError>;
}

/// OpenAI Assistants v2 transport (threads + runs over REST).
pub struct AssistantTransport {
    client: reqwest::Client,
    api_key: SecretString,
    assistant_id: String,
    base_url: String,
}

impl AssistantTransport {
    pub fn new(api_key: SecretString, assistant_id: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();
        Self {
            client,
            api_key,
            assistant_id: assistant_id.into(),
            base_url: OPENAI_API_BASE.to_string(),
        }
    }

    /// Point the transport at a different endpoint (local stubs).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.base_url, path))
            .bearer_auth(self.api_key.expose_secret())
            .header("OpenAI-Beta", ASSISTANTS_BETA_HEADER)
    }
}

#[async_trait]
impl GenerationTransport for AssistantTransport {
    async fn create_conversation(&self) -> Result<String, GenerationError> {
        let response = self
            .request(reqwest::Method::POST, "/threads")
            .json(&json!({}))
            .send()
            .await?;
        let thread: ThreadResponse = check_status(response).await?.json().await?;
        tracing::debug!(thread = %thread.id, "Created conversation");
        Ok(thread.id)
    }

    async fn post_message(
        &self,
        conversation_id: &str,
        text: &str,
    ) -> Result<(), GenerationError> {
        let response = self
            .request(
                reqwest::Method::POST,
                &format!("/threads/{conversation_id}/messages"),
            )
            .json(&json!({ "role": "user", "content": text }))
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }

    async fn start_run(&self, conversation_id: &str) -> Result<RunHandle, GenerationError> {
        let response = self
            .request(
                reqwest::Method::POST,
                &format!("/threads/{conversation_id}/runs"),
            )
            .json(&json!({ "assistant_id": self.assistant_id }))
            .send()
            .await?;
        let run: RunResponse = check_status(response).await?.json().await?;
        Ok(RunHandle {
            conversation_id: conversation_id.to_string(),
            run_id: run.id,
        })
    }

    async fn get_run_status(&self, handle: &RunHandle) -> Result<String, GenerationError> {
        let path = format!(
            "/threads/{}/runs/{}",
            handle.conversation_id, handle.run_id
        );
        let response = self.request(reqwest::Method::GET, &path).send().await?;
        let run: RunResponse = check_status(response).await?.json().await?;
        Ok(run.status)
    }

    async fn list_replies(&self, conversation_id: &str) -> Result<Vec<String>, GenerationError> {
        let response = self
            .request(
                reqwest::Method::GET,
                &format!("/threads/{conversation_id}/messages"),
            )
            .send()
            .await?;
        let listing: MessageListing = check_status(response).await?.json().await?;

        Ok(listing
            .data
            .into_iter()
            .filter(|m| m.role == "assistant")
            .map(|m| {
                m.content
                    .into_iter()
                    .filter(|c| c.kind == "text")
                    .filter_map(|c| c.text.map(|t| t.value))
                    .collect::<Vec<_>>()
                    .join("\n")
            })
            .filter(|text| !text.is_empty())
            .collect())
    }
}

// ── Wire types ──────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ThreadResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct RunResponse {
    id: String,
    #[serde(default)]
    status: String,
}

#[derive(Debug, Default, Deserialize)]
struct MessageListing {
    #[serde(default)]
    data: Vec<ThreadMessage>,
}

#[derive(Debug, Deserialize)]
struct ThreadMessage {
    #[serde(default)]
    role: String,
    #[serde(default)]
    content: Vec<ContentPart>,
}

#[derive(Debug, Deserialize)]
struct ContentPart {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    text: Option<TextValue>,
}

#[derive(Debug, Deserialize)]
struct TextValue {
    #[serde(default)]
    value: String,
}

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

async fn check_status(
    response: reqwest::Response,
) -> Result<reqwest::Response, GenerationError> {
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

fn map_status(status: u16, message: Option<String>) -> GenerationError {
    match status {
        401 => GenerationError::Unauthorized,
        403 => GenerationError::Forbidden,
        404 => GenerationError::NotFound,
        429 => GenerationError::RateLimited,
        _ => GenerationError::Api {
            status,
            message: message
                .unwrap_or_else(|| format!("API request failed with status {status}")),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping_is_typed() {
        assert!(matches!(map_status(401, None), GenerationError::Unauthorized));
        assert!(matches!(map_status(429, None), GenerationError::RateLimited));
        assert!(matches!(map_status(500, None), GenerationError::Api { .. }));
    }

    #[test]
    fn reply_listing_filters_assistant_text() {
        let raw = r#"{
            "data": [
                {"role": "assistant", "content": [{"type": "text", "text": {"value": "newest"}}]},
                {"role": "user", "content": [{"type": "text", "text": {"value": "prompt"}}]},
                {"role": "assistant", "content": [{"type": "image_file"}]},
                {"role": "assistant", "content": [{"type": "text", "text": {"value": "older"}}]}
            ]
        }"#;
        let listing: MessageListing = serde_json::from_str(raw).unwrap();
        let replies: Vec<String> = listing
            .data
            .into_iter()
            .filter(|m| m.role == "assistant")
            .map(|m| {
                m.content
                    .into_iter()
                    .filter(|c| c.kind == "text")
                    .filter_map(|c| c.text.map(|t| t.value))
                    .collect::<Vec<_>>()
                    .join("\n")
            })
            .filter(|t| !t.is_empty())
            .collect();
        assert_eq!(replies, vec!["newest".to_string(), "older".to_string()]);
    }

    #[test]
    fn run_response_parses_status() {
        let run: RunResponse =
            serde_json::from_str(r#"{"id": "run_1", "status": "in_progress"}"#).unwrap();
        assert_eq!(run.id, "run_1");
        assert_eq!(run.status, "in_progress");
    }
}
