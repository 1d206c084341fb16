//! Replaying adapter for the `LlmClient` port.

use std::sync::{Mutex, PoisonError};

use super::{next_matching_output, replay_result};
use crate::cassette::replayer::CassetteReplayer;
use crate::error::UpstreamError;
use crate::ports::{CompletionRequest, LlmClient, LlmFuture};

/// Serves recorded LLM completions from a cassette.
///
/// A call gets the earliest recorded completion with the same messages, so
/// concurrent folder analyses replay correctly whatever order they run in.
pub struct ReplayingLlmClient {
    replayer: Mutex<CassetteReplayer>,
}

impl ReplayingLlmClient {
    /// Create a replaying LLM client backed by the given replayer.
    #[must_use]
    pub fn new(replayer: CassetteReplayer) -> Self {
        Self { replayer: Mutex::new(replayer) }
    }

    /// Recorded completions not yet served.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.replayer.lock().unwrap_or_else(PoisonError::into_inner).remaining("llm", "complete")
    }
}

fn upstream_from_json(value: serde_json::Value) -> UpstreamError {
    match value {
        serde_json::Value::String(message) => UpstreamError::transport(message),
        other => serde_json::from_value(other.clone())
            .unwrap_or_else(|_| UpstreamError::transport(other.to_string())),
    }
}

impl LlmClient for ReplayingLlmClient {
    fn complete(&self, request: &CompletionRequest) -> LlmFuture<'_> {
        let messages = serde_json::to_value(&request.messages).ok();
        let output = next_matching_output(&self.replayer, "llm", "complete", |input| {
            messages.is_some() && input.get("messages") == messages.as_ref()
        });
        Box::pin(async move { replay_result(output, "llm::complete", upstream_from_json) })
    }
}
