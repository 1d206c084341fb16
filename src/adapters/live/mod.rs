//! Live adapters for real external interactions.

pub mod filesystem;
pub mod llm;
pub mod progress;
