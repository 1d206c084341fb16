//! Port traits defining external boundaries.
//!
//! Each trait represents a boundary between the analysis core and an
//! external system (filesystem, text-generation service, progress display).
//! Implementations live in `src/adapters/`.

pub mod filesystem;
pub mod llm;
pub mod progress;

pub use filesystem::{FileSystem, FsError};
pub use llm::{ChatMessage, CompletionRequest, CompletionResponse, LlmClient, LlmFuture};
pub use progress::{ProgressEvent, ProgressSink};
