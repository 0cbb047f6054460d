//! AI enrichment — batched prompt build, run polling, and reply
//! correlation back to source messages.

pub mod correlator;
pub mod transport;
pub mod waiter;

pub use correlator::{Enricher, EnrichmentResult, ReplyShape};
pub use transport::{AssistantTransport, GenerationTransport, RunHandle};
pub use waiter::{CompletionOutcome, await_completion};
