//! Recording adapters that capture interactions to cassettes.

pub mod filesystem;
pub mod llm;

use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;

use crate::cassette::recorder::CassetteRecorder;

pub use filesystem::RecordingFileSystem;
pub use llm::RecordingLlmClient;

/// Record an interaction with a simple (non-Result) return value.
///
/// Mirror of `replaying::next_output`.
pub(crate) fn record_interaction<I, O>(
    recorder: &Arc<Mutex<CassetteRecorder>>,
    port: &str,
    method: &str,
    input: &I,
    output: &O,
) where
    I: Serialize,
    O: Serialize,
{
    let input_json = serde_json::to_value(input).unwrap_or_else(|e| {
        tracing::warn!(port, method, error = %e, "failed to serialize recording input");
        serde_json::Value::Null
    });
    let output_json = serde_json::to_value(output).unwrap_or_else(|e| {
        tracing::warn!(port, method, error = %e, "failed to serialize recording output");
        serde_json::Value::Null
    });

    // A poisoned recorder still holds every interaction captured before the panic.
    let mut guard = recorder.lock().unwrap_or_else(PoisonError::into_inner);
    guard.record(port, method, input_json, output_json);
}

/// Claim a cassette slot for a call whose output arrives later.
///
/// Pair with [`fill_interaction`]; the slot fixes the call's position in
/// request order.
pub(crate) fn reserve_interaction<I: Serialize>(
    recorder: &Arc<Mutex<CassetteRecorder>>,
    port: &str,
    method: &str,
    input: &I,
) -> usize {
    let input_json = serde_json::to_value(input).unwrap_or_else(|e| {
        tracing::warn!(port, method, error = %e, "failed to serialize recording input");
        serde_json::Value::Null
    });
    let mut guard = recorder.lock().unwrap_or_else(PoisonError::into_inner);
    guard.reserve(port, method, input_json)
}

/// Store the output of a slot from [`reserve_interaction`].
pub(crate) fn fill_interaction(
    recorder: &Arc<Mutex<CassetteRecorder>>,
    slot: usize,
    output: serde_json::Value,
) {
    let mut guard = recorder.lock().unwrap_or_else(PoisonError::into_inner);
    guard.fill(slot, output);
}

/// Record a `Result<T, E>` interaction using the ok/err JSON convention.
///
/// Mirror of `replaying::replay_result`:
/// - `Ok(v)` is serialized as `{"ok": v}`
/// - `Err(e)` is serialized as `{"err": e.to_string()}`
pub(crate) fn record_result<T, E, I>(
    recorder: &Arc<Mutex<CassetteRecorder>>,
    port: &str,
    method: &str,
    input: &I,
    result: &Result<T, E>,
) where
    T: Serialize,
    E: std::fmt::Display,
    I: Serialize,
{
    let output = match result {
        Ok(v) => serde_json::json!({ "ok": v }),
        Err(e) => serde_json::json!({ "err": e.to_string() }),
    };
    record_interaction(recorder, port, method, input, &output);
}
