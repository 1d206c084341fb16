//! Cassette data structures for recording and replaying interactions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single recorded interaction with an external port.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Interaction {
    /// Sequence number (assigned automatically by the recorder).
    pub seq: u64,
    /// Port name (`"llm"` or `"fs"`).
    pub port: String,
    /// Method name invoked on the port.
    pub method: String,
    /// Input data sent to the port.
    pub input: serde_json::Value,
    /// Output data returned from the port.
    pub output: serde_json::Value,
}

/// A cassette containing a sequence of recorded interactions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Cassette {
    /// Human-readable name for this cassette.
    pub name: String,
    /// When this cassette was recorded.
    pub recorded_at: DateTime<Utc>,
    /// Git commit hash of the analyzed project at recording time.
    pub commit: String,
    /// Ordered list of interactions.
    pub interactions: Vec<Interaction>,
}

impl Cassette {
    /// Builds an in-memory cassette, numbering interactions in order.
    #[must_use]
    pub fn from_interactions(name: impl Into<String>, interactions: Vec<Interaction>) -> Self {
        let interactions = interactions
            .into_iter()
            .enumerate()
            .map(|(seq, interaction)| Interaction { seq: seq as u64, ..interaction })
            .collect();
        Self { name: name.into(), recorded_at: Utc::now(), commit: "unknown".into(), interactions }
    }
}

impl Interaction {
    /// An interaction whose `seq` is assigned later by the cassette.
    pub fn new(
        port: impl Into<String>,
        method: impl Into<String>,
        input: serde_json::Value,
        output: serde_json::Value,
    ) -> Self {
        Self { seq: 0, port: port.into(), method: method.into(), input, output }
    }
}
