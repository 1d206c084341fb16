//! Recording adapter for the `LlmClient` port.

use std::sync::{Arc, Mutex};

use super::{fill_interaction, reserve_interaction};
use crate::cassette::recorder::CassetteRecorder;
use crate::ports::{CompletionRequest, LlmClient, LlmFuture};

/// Records LLM interactions while delegating to an inner implementation.
///
/// Errors keep their structure (`{"err": {"status", "message"}}`) so replays
/// reproduce the same retry decisions. Each call takes its cassette slot when
/// it is issued, so concurrent calls are stored in request order.
pub struct RecordingLlmClient {
    inner: Box<dyn LlmClient>,
    recorder: Arc<Mutex<CassetteRecorder>>,
}

impl RecordingLlmClient {
    /// Creates a new recording LLM client wrapping the given implementation.
    pub fn new(inner: Box<dyn LlmClient>, recorder: Arc<Mutex<CassetteRecorder>>) -> Self {
        Self { inner, recorder }
    }
}

impl LlmClient for RecordingLlmClient {
    fn complete(&self, request: &CompletionRequest) -> LlmFuture<'_> {
        let slot = reserve_interaction(&self.recorder, "llm", "complete", request);
        let request = request.clone();

        Box::pin(async move {
            let result = self.inner.complete(&request).await;

            let output = match &result {
                Ok(response) => serde_json::json!({ "ok": response }),
                Err(err) => serde_json::json!({ "err": err }),
            };
            fill_interaction(&self.recorder, slot, output);

            result
        })
    }
}
