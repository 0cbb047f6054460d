//! Batch enrichment correlator.
//!
//! Sends a whole page of messages to one generation conversation,
//! then re-associates each reply fragment with its source message by
//! identifier. The reply is untrusted: it may be a JSON array, a bare
//! JSON object, or free text, and it may echo identifiers partially
//! or not at all. Every degradation is a value — the output always
//! has one entry per input, in input order.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::enrich::transport::GenerationTransport;
use crate::enrich::waiter::{CompletionOutcome, await_completion};
use crate::error::GenerationError;
use crate::mail::types::PlainMessage;

const FAILED_SUMMARY: &str = "AI processing failed";
const UNMATCHED_SUMMARY: &str = "No AI response available for this message";
const BLOCK_DELIMITER: &str = "---";

const DEFAULT_BATCH_SIZE: usize = 10;
const DEFAULT_RUN_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_BATCH_DELAY: Duration = Duration::from_secs(1);

/// Enrichment output for one message. Degraded outcomes reuse the
/// same shape with a fixed summary and confidence, so batch length
/// invariants never depend on success.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichmentResult {
    pub summary: String,
    pub translated_text: Option<String>,
    pub language: Option<String>,
    /// In `[0, 1]`. `0` marks a failed batch, `0.5` an identifier the
    /// model did not echo back, `0.7` an unstructured reply.
    pub confidence: Option<f64>,
}

impl EnrichmentResult {
    fn failed() -> Self {
        Self {
            summary: FAILED_SUMMARY.to_string(),
            translated_text: None,
            language: None,
            confidence: Some(0.0),
        }
    }

    fn unmatched() -> Self {
        Self {
            summary: UNMATCHED_SUMMARY.to_string(),
            translated_text: None,
            language: None,
            confidence: Some(0.5),
        }
    }

    fn unstructured(raw: &str) -> Self {
        Self {
            summary: raw.to_string(),
            translated_text: None,
            language: None,
            confidence: Some(0.7),
        }
    }
}

/// One entry of a structured model reply. All fields optional — the
/// model is asked for this shape but not trusted to produce it.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyEntry {
    #[serde(default)]
    pub message_id: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub translated_content: Option<String>,
    #[serde(default)]
    pub detected_language: Option<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
}

impl ReplyEntry {
    fn into_result(self) -> EnrichmentResult {
        EnrichmentResult {
            summary: self.summary.unwrap_or_default(),
            translated_text: self.translated_content,
            language: self.detected_language,
            confidence: self.confidence.or(Some(0.8)),
        }
    }
}

/// Decoded shape of a model reply. Strict decode first, fallback
/// variants after — never exception-driven control flow.
#[derive(Debug)]
pub enum ReplyShape {
    /// A JSON array of per-message entries.
    StructuredList(Vec<ReplyEntry>),
    /// A single JSON object with no per-message breakdown.
    StructuredSingle(ReplyEntry),
    /// Anything that failed to parse as structured data.
    Unstructured(String),
}

/// Try to decode a raw reply: list, then single object, then raw text.
pub fn parse_reply(raw: &str) -> ReplyShape {
    if let Ok(entries) = serde_json::from_str::<Vec<ReplyEntry>>(raw) {
        return ReplyShape::StructuredList(entries);
    }
    if let Ok(entry) = serde_json::from_str::<ReplyEntry>(raw) {
        return ReplyShape::StructuredSingle(entry);
    }
    ReplyShape::Unstructured(raw.to_string())
}

/// Build the combined prompt for one batch: instructions, then one
/// labeled block per message separated by a fixed delimiter line.
pub fn build_prompt(messages: &[PlainMessage]) -> String {
    let mut prompt = String::from(
        "Please process each of the email messages below. For every message provide:\n\
         1. A brief summary of the content\n\
         2. A translation if the content is not in English\n\
         3. The detected language code if not English\n\n\
         Respond with a JSON array containing one object per message, each with:\n\
         - messageId: the message identifier, echoed back exactly\n\
         - summary: a brief summary of the email\n\
         - translatedContent: translation if needed (optional)\n\
         - detectedLanguage: the detected language code (optional)\n\
         - confidence: your confidence level 0-1 (optional)\n\n",
    );

    for message in messages {
        prompt.push_str(&format!(
            "Message ID: {}\nSubject: {}\nFrom: {}\nContent: {}\n{}\n",
            message.id, message.subject, message.sender, message.snippet, BLOCK_DELIMITER
        ));
    }

    prompt
}

/// Map one batch's reply back onto its input messages, in order.
pub fn correlate(messages: &[PlainMessage], raw_reply: &str) -> Vec<EnrichmentResult> {
    match parse_reply(raw_reply) {
        ReplyShape::StructuredList(entries) => messages
            .iter()
            .map(|message| {
                // Linear scan, first match wins. Duplicate ids in the
                // reply shadow later entries; that is accepted.
                let matched = entries
                    .iter()
                    .find(|e| e.message_id.as_deref() == Some(message.id.as_str()));
                match matched {
                    Some(entry) if entry.summary.as_deref().is_some_and(|s| !s.is_empty()) => {
                        entry.clone().into_result()
                    }
                    _ => EnrichmentResult::unmatched(),
                }
            })
            .collect(),
        ReplyShape::StructuredSingle(entry) => {
            let mut result = entry.into_result();
            if result.summary.is_empty() {
                result.summary = raw_reply.to_string();
            }
            vec![result; messages.len()]
        }
        ReplyShape::Unstructured(raw) => {
            vec![EnrichmentResult::unstructured(&raw); messages.len()]
        }
    }
}

/// Batch enrichment driver. One conversation round trip per batch,
/// batches strictly sequential with a fixed delay in between.
pub struct Enricher {
    transport: Arc<dyn GenerationTransport>,
    batch_size: usize,
    run_timeout: Duration,
    batch_delay: Duration,
}

impl Enricher {
    pub fn new(transport: Arc<dyn GenerationTransport>) -> Self {
        Self {
            transport,
            batch_size: DEFAULT_BATCH_SIZE,
            run_timeout: DEFAULT_RUN_TIMEOUT,
            batch_delay: DEFAULT_BATCH_DELAY,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_run_timeout(mut self, run_timeout: Duration) -> Self {
        self.run_timeout = run_timeout;
        self
    }

    pub fn with_batch_delay(mut self, batch_delay: Duration) -> Self {
        self.batch_delay = batch_delay;
        self
    }

    /// Enrich every message. The output has exactly one entry per
    /// input message, in input order; failures degrade to values and
    /// never abort the batch.
    pub async fn enrich(&self, messages: &[PlainMessage]) -> Vec<EnrichmentResult> {
        if messages.is_empty() {
            return Vec::new();
        }

        let mut results = Vec::with_capacity(messages.len());
        for (index, batch) in messages.chunks(self.batch_size).enumerate() {
            if index > 0 {
                // Fixed pause between batches to respect the
                // provider's rate limit.
                tokio::time::sleep(self.batch_delay).await;
            }
            results.extend(self.enrich_batch(batch).await);
        }
        results
    }

    async fn enrich_batch(&self, batch: &[PlainMessage]) -> Vec<EnrichmentResult> {
        match self.run_batch(batch).await {
            Ok(reply) => correlate(batch, &reply),
            Err(e) => {
                tracing::error!(batch_len = batch.len(), error = %e, "Enrichment batch failed");
                vec![EnrichmentResult::failed(); batch.len()]
            }
        }
    }

    /// One conversation round trip: create, post the combined prompt,
    /// run, wait, read the newest reply.
    async fn run_batch(&self, batch: &[PlainMessage]) -> Result<String, GenerationError> {
        let conversation = self.transport.create_conversation().await?;
        self.transport
            .post_message(&conversation, &build_prompt(batch))
            .await?;
        let handle = self.transport.start_run(&conversation).await?;

        match await_completion(self.transport.as_ref(), &handle, self.run_timeout).await {
            CompletionOutcome::Completed => {}
            CompletionOutcome::Failed(reason) => return Err(GenerationError::RunFailed(reason)),
            CompletionOutcome::TimedOut => return Err(GenerationError::Timeout),
        }

        let replies = self.transport.list_replies(&conversation).await?;
        replies
            .into_iter()
            .next()
            .ok_or_else(|| GenerationError::InvalidResponse("no assistant reply".into()))
    }
}
