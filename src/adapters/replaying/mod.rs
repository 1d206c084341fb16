//! Replaying adapters that serve recorded interactions.

pub mod filesystem;
pub mod llm;

use std::sync::{Mutex, PoisonError};

use crate::cassette::replayer::CassetteReplayer;

pub use filesystem::ReplayingFileSystem;
pub use llm::ReplayingLlmClient;

/// Pull the output of the next recorded `port::method` interaction.
///
/// # Panics
///
/// Panics when the cassette has no more interactions for the pair.
pub(crate) fn next_output(
    replayer: &Mutex<CassetteReplayer>,
    port: &str,
    method: &str,
) -> serde_json::Value {
    let mut replayer = replayer.lock().unwrap_or_else(PoisonError::into_inner);
    replayer.next_interaction(port, method).output
}

/// Like [`next_output`], preferring the interaction whose recorded input
/// satisfies `matches`.
pub(crate) fn next_matching_output(
    replayer: &Mutex<CassetteReplayer>,
    port: &str,
    method: &str,
    matches: impl Fn(&serde_json::Value) -> bool,
) -> serde_json::Value {
    let mut replayer = replayer.lock().unwrap_or_else(PoisonError::into_inner);
    replayer.next_matching(port, method, matches).output
}

/// Decode an `{"ok": v}` / `{"err": e}` output recorded by `recording::record_result`.
///
/// Outputs with neither key are treated as a bare `ok` value.
pub(crate) fn replay_result<T, E, F>(
    output: serde_json::Value,
    context: &str,
    to_err: F,
) -> Result<T, E>
where
    T: serde::de::DeserializeOwned,
    F: Fn(serde_json::Value) -> E,
{
    if let Some(err) = output.get("err") {
        return Err(to_err(err.clone()));
    }
    let value = output.get("ok").cloned().unwrap_or(output);
    serde_json::from_value(value)
        .map_err(|e| to_err(serde_json::Value::String(format!("{context}: failed to deserialize: {e}"))))
}
