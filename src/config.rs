//! Runtime configuration for the analysis pipeline.
//!
//! Values come from the process environment (after `.env` is loaded by
//! `dotenvy`) and can be overridden by CLI flags.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;

const DEFAULT_BASE_URL: &str = "https://api.xiaomimimo.com/v1";
/// Model used when neither `HORIZON_MODEL` nor `--model` is given.
pub const DEFAULT_MODEL: &str = "mimo-v2-flash";
/// Sampling temperature used when `HORIZON_TEMPERATURE` is unset.
pub const DEFAULT_TEMPERATURE: f32 = 0.1;

/// Every tunable of a pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    /// Ordered credential pool.
    pub api_keys: Vec<String>,
    /// Base URL of the OpenAI-compatible completion endpoint.
    pub base_url: String,
    /// Model identifier sent with each request.
    pub model: String,
    /// Sampling temperature; kept low for near-deterministic output.
    pub temperature: f32,
    /// Per-file character budget before prompting.
    pub max_chars: usize,
    /// Maximum files analyzed per folder aggregation.
    pub max_files: usize,
    /// Files larger than this are excluded from folder aggregation.
    pub max_file_bytes: usize,
    /// Character cap on the reduce-stage context document.
    pub max_context_chars: usize,
    /// Pause between per-file calls in a serial run.
    pub inter_call_delay: Duration,
    /// Fixed wait between failed gateway attempts.
    pub backoff: Duration,
    /// Attempts granted per credential before the gateway gives up.
    pub attempts_per_credential: usize,
    /// Entry limit of the analysis cache.
    pub cache_capacity: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            api_keys: Vec::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_chars: 6_000,
            max_files: 30,
            max_file_bytes: 200 * 1024,
            max_context_chars: 50_000,
            inter_call_delay: Duration::from_millis(600),
            backoff: Duration::from_secs(1),
            attempts_per_credential: 2,
            cache_capacity: 1024,
        }
    }
}

impl AnalysisConfig {
    /// Reads configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric variable is set but does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Reads configuration through an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric variable is set but does not parse.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let keys = lookup("HORIZON_API_KEYS").or_else(|| lookup("MIMO_API_KEY")).unwrap_or_default();

        Ok(Self {
            api_keys: parse_key_list(&keys),
            base_url: lookup("HORIZON_BASE_URL").unwrap_or(defaults.base_url),
            model: lookup("HORIZON_MODEL").unwrap_or(defaults.model),
            temperature: parsed(&lookup, "HORIZON_TEMPERATURE", defaults.temperature)?,
            max_chars: parsed(&lookup, "HORIZON_MAX_CHARS", defaults.max_chars)?,
            max_files: parsed(&lookup, "HORIZON_MAX_FILES", defaults.max_files)?,
            max_file_bytes: parsed(&lookup, "HORIZON_MAX_FILE_BYTES", defaults.max_file_bytes)?,
            max_context_chars: parsed(
                &lookup,
                "HORIZON_MAX_CONTEXT_CHARS",
                defaults.max_context_chars,
            )?,
            inter_call_delay: Duration::from_millis(parsed(&lookup, "HORIZON_DELAY_MS", 600)?),
            backoff: Duration::from_millis(parsed(&lookup, "HORIZON_BACKOFF_MS", 1000)?),
            attempts_per_credential: parsed(
                &lookup,
                "HORIZON_ATTEMPTS_PER_KEY",
                defaults.attempts_per_credential,
            )?,
            cache_capacity: parsed(&lookup, "HORIZON_CACHE_CAPACITY", defaults.cache_capacity)?,
        })
    }
}

/// Splits a comma-delimited credential list, trimming and dropping empties.
#[must_use]
pub fn parse_key_list(raw: &str) -> Vec<String> {
    raw.split(',').map(str::trim).filter(|k| !k.is_empty()).map(str::to_string).collect()
}

fn parsed<T, F>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key: key.to_string(), value: raw }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_environment_is_empty() {
        let config = AnalysisConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, AnalysisConfig::default());
        assert_eq!(config.max_files, 30);
        assert_eq!(config.inter_call_delay, Duration::from_millis(600));
    }

    #[test]
    fn key_list_is_comma_delimited() {
        assert_eq!(parse_key_list(" a , b,,c "), vec!["a", "b", "c"]);
        assert!(parse_key_list("").is_empty());
    }

    #[test]
    fn falls_back_to_legacy_key_variable() {
        let config = AnalysisConfig::from_lookup(lookup_from(&[("MIMO_API_KEY", "k1,k2")])).unwrap();
        assert_eq!(config.api_keys, vec!["k1", "k2"]);

        let config = AnalysisConfig::from_lookup(lookup_from(&[
            ("MIMO_API_KEY", "legacy"),
            ("HORIZON_API_KEYS", "primary"),
        ]))
        .unwrap();
        assert_eq!(config.api_keys, vec!["primary"]);
    }

    #[test]
    fn numeric_overrides_are_parsed() {
        let config = AnalysisConfig::from_lookup(lookup_from(&[
            ("HORIZON_MAX_FILES", "12"),
            ("HORIZON_DELAY_MS", "0"),
            ("HORIZON_TEMPERATURE", "0.3"),
        ]))
        .unwrap();
        assert_eq!(config.max_files, 12);
        assert_eq!(config.inter_call_delay, Duration::ZERO);
        assert!((config.temperature - 0.3).abs() < f32::EPSILON);
    }

    #[test]
    fn invalid_number_is_reported() {
        let err =
            AnalysisConfig::from_lookup(lookup_from(&[("HORIZON_MAX_CHARS", "lots")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::Invalid { key: "HORIZON_MAX_CHARS".into(), value: "lots".into() }
        );
    }
}
