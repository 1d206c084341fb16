//! Completion gateway: credential rotation with fixed-delay bounded retry.
//!
//! Every attempt takes the next credential from the pool. Transient
//! rate-limiting is absorbed by rotating keys, not by growing the delay, so
//! the wait between attempts is constant and has no jitter.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::config::{DEFAULT_MODEL, DEFAULT_TEMPERATURE};
use crate::error::{GatewayError, UpstreamError};
use crate::ports::{ChatMessage, CompletionRequest, LlmClient};

/// Ordered API keys with a shared round-robin cursor.
#[derive(Debug, Default)]
pub struct CredentialPool {
    keys: Vec<String>,
    cursor: AtomicUsize,
}

impl CredentialPool {
    /// Creates a pool that starts rotation at the first key.
    #[must_use]
    pub fn new(keys: Vec<String>) -> Self {
        Self { keys, cursor: AtomicUsize::new(0) }
    }

    /// Number of keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Returns `true` if the pool holds no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Takes the next key in rotation. Never blocks; concurrent callers get
    /// distinct cursor positions.
    pub fn next_key(&self) -> Option<&str> {
        if self.keys.is_empty() {
            return None;
        }
        let index = self.cursor.fetch_add(1, Ordering::Relaxed) % self.keys.len();
        Some(&self.keys[index])
    }
}

/// How many times, and how patiently, the gateway retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Fixed wait after each failed attempt.
    pub backoff: Duration,
    /// Attempts granted per credential.
    pub attempts_per_credential: usize,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { backoff: Duration::from_secs(1), attempts_per_credential: 2 }
    }
}

impl RetryPolicy {
    /// Two attempts per credential with no wait, for tests and replays.
    #[must_use]
    pub fn immediate() -> Self {
        Self { backoff: Duration::ZERO, ..Self::default() }
    }

    /// Total attempt budget for a pool of `pool_size` keys.
    #[must_use]
    pub fn max_attempts(&self, pool_size: usize) -> usize {
        pool_size.max(1) * self.attempts_per_credential.max(1)
    }
}

/// Sends chat prompts through an [`LlmClient`], rotating credentials on failure.
pub struct CompletionGateway<'a> {
    llm: &'a dyn LlmClient,
    pool: CredentialPool,
    policy: RetryPolicy,
    model: String,
    temperature: f32,
}

impl<'a> CompletionGateway<'a> {
    /// Creates a gateway with the default model settings.
    pub fn new(llm: &'a dyn LlmClient, pool: CredentialPool, policy: RetryPolicy) -> Self {
        Self {
            llm,
            pool,
            policy,
            model: DEFAULT_MODEL.into(),
            temperature: DEFAULT_TEMPERATURE,
        }
    }

    /// Overrides the model and sampling temperature.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>, temperature: f32) -> Self {
        self.model = model.into();
        self.temperature = temperature;
        self
    }

    /// Sends `messages` and returns the generated text.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::NoCredentials`] for an empty pool and
    /// [`GatewayError::Exhausted`] once the attempt budget is spent.
    pub async fn complete(&self, messages: Vec<ChatMessage>) -> Result<String, GatewayError> {
        let max_attempts = self.policy.max_attempts(self.pool.len());
        let mut last = None;

        for attempt in 1..=max_attempts {
            let credential = self.pool.next_key().ok_or(GatewayError::NoCredentials)?;
            let request = CompletionRequest {
                model: self.model.clone(),
                messages: messages.clone(),
                temperature: self.temperature,
                credential: credential.to_string(),
            };

            match self.llm.complete(&request).await {
                Ok(response) => {
                    if attempt > 1 {
                        tracing::info!(attempt, "completion succeeded after retry");
                    }
                    return Ok(response.text);
                }
                Err(err) => {
                    tracing::warn!(
                        attempt,
                        max_attempts,
                        status = ?err.status,
                        error = %err.message,
                        "completion attempt failed"
                    );
                    last = Some(err);
                    if attempt < max_attempts && !self.policy.backoff.is_zero() {
                        tokio::time::sleep(self.policy.backoff).await;
                    }
                }
            }
        }

        Err(GatewayError::Exhausted {
            attempts: max_attempts,
            last: last.unwrap_or_else(|| UpstreamError::transport("no attempt was made")),
        })
    }
}
