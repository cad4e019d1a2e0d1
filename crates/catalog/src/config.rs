//! Catalog client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `DEAL_API_BASE_URL` - Base URL of the Catalog Data Source
//!   (e.g. `https://api.deal.example/api`)
//!
//! ## Optional
//! - `DEAL_API_TOKEN` - Bearer token sent with every request
//! - `DEAL_CACHE_CAPACITY` - Maximum cached entries per resource tag (default: 1000)
//! - `DEAL_CACHE_TTL_SECS` - Expire cached snapshots after this many seconds (default: never)
//! - `DEAL_HTTP_TIMEOUT_SECS` - Per-request timeout (default: 10)

use std::collections::HashMap;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const DEFAULT_CACHE_CAPACITY: u64 = 1000;
const DEFAULT_TIMEOUT_SECS: u64 = 10;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Settings for [`CatalogClient`](crate::CatalogClient).
///
/// Implements `Debug` manually to redact the token.
#[derive(Clone)]
pub struct CatalogConfig {
    /// Base URL; resource paths are appended as segments.
    pub base_url: Url,
    pub api_token: Option<SecretString>,
    /// Maximum entries per cache tag.
    pub cache_capacity: u64,
    /// `None` keeps snapshots until a mutation invalidates them.
    pub cache_ttl: Option<Duration>,
    pub request_timeout: Duration,
}

impl std::fmt::Debug for CatalogConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogConfig")
            .field("base_url", &self.base_url.as_str())
            .field("api_token", &self.api_token.as_ref().map(|_| "[REDACTED]"))
            .field("cache_capacity", &self.cache_capacity)
            .field("cache_ttl", &self.cache_ttl)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl CatalogConfig {
    /// Defaults for everything but the base URL.
    #[must_use]
    pub const fn new(base_url: Url) -> Self {
        Self {
            base_url,
            api_token: None,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            cache_ttl: None,
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(SecretString::from(token.into()));
        self
    }

    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the base URL is missing or invalid, a number
    /// does not parse, or the token looks like a placeholder.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Same as [`CatalogConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);

        let raw_url = env.required("DEAL_API_BASE_URL")?;
        let base_url = parse_base_url(&raw_url)
            .map_err(|reason| ConfigError::InvalidEnvVar("DEAL_API_BASE_URL".to_string(), reason))?;

        let api_token = match env.optional("DEAL_API_TOKEN") {
            Some(token) => {
                validate_secret_strength(&token, "DEAL_API_TOKEN")?;
                Some(SecretString::from(token))
            }
            None => None,
        };

        let cache_capacity = env
            .parsed::<u64>("DEAL_CACHE_CAPACITY")?
            .unwrap_or(DEFAULT_CACHE_CAPACITY);
        let cache_ttl = env
            .parsed::<u64>("DEAL_CACHE_TTL_SECS")?
            .map(Duration::from_secs);
        let request_timeout = Duration::from_secs(
            env.parsed::<u64>("DEAL_HTTP_TIMEOUT_SECS")?
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
        );

        Ok(Self {
            base_url,
            api_token,
            cache_capacity,
            cache_ttl,
            request_timeout,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

struct Env<F>(F);

impl<F: Fn(&str) -> Option<String>> Env<F> {
    /// Get a required environment variable.
    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.optional(key)
            .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    /// Get an optional environment variable. Blank counts as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|value| !value.trim().is_empty())
    }

    fn parsed<T>(&self, key: &str) -> Result<Option<T>, ConfigError>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        self.optional(key)
            .map(|value| {
                value
                    .trim()
                    .parse::<T>()
                    .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
            })
            .transpose()
    }
}

/// Parse the base URL and make sure segments can be appended to it.
fn parse_base_url(raw: &str) -> Result<Url, String> {
    let url = Url::parse(raw.trim()).map_err(|e| e.to_string())?;
    if url.cannot_be_a_base() {
        return Err(format!("'{raw}' cannot be used as a base URL"));
    }
    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("unsupported scheme '{}'", url.scheme()));
    }
    Ok(url)
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // Token length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    if let Some(pattern) = PLACEHOLDER_PATTERNS.iter().find(|p| lower.contains(*p)) {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!("appears to be a placeholder (contains '{pattern}')"),
        ));
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1})"
            ),
        ));
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;

    const TOKEN: &str = "eyJhbGciOiJIUzI1NiJ9.aB3xY9mK2nL5pQ7rT0uW4zC6";

    fn load(vars: &[(&str, &str)]) -> Result<CatalogConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        CatalogConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("DEAL_API_BASE_URL", "http://localhost:8080/api")]).unwrap();
        assert_eq!(config.base_url.as_str(), "http://localhost:8080/api");
        assert!(config.api_token.is_none());
        assert_eq!(config.cache_capacity, 1000);
        assert!(config.cache_ttl.is_none());
        assert_eq!(config.request_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_missing_base_url() {
        let err = load(&[]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref key) if key == "DEAL_API_BASE_URL"));
    }

    #[test]
    fn test_rejects_non_http_base_url() {
        let err = load(&[("DEAL_API_BASE_URL", "mailto:ops@deal.example")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(_, _)));
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("DEAL_API_BASE_URL", "https://api.deal.test/api/"),
            ("DEAL_API_TOKEN", TOKEN),
            ("DEAL_CACHE_CAPACITY", "50"),
            ("DEAL_CACHE_TTL_SECS", "300"),
            ("DEAL_HTTP_TIMEOUT_SECS", " 3 "),
        ])
        .unwrap();
        assert_eq!(config.api_token.unwrap().expose_secret(), TOKEN);
        assert_eq!(config.cache_capacity, 50);
        assert_eq!(config.cache_ttl, Some(Duration::from_secs(300)));
        assert_eq!(config.request_timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_invalid_number() {
        let err = load(&[
            ("DEAL_API_BASE_URL", "http://localhost/api"),
            ("DEAL_CACHE_CAPACITY", "lots"),
        ])
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidEnvVar(ref key, _) if key == "DEAL_CACHE_CAPACITY"
        ));
    }

    #[test]
    fn test_placeholder_token_rejected() {
        let err = load(&[
            ("DEAL_API_BASE_URL", "http://localhost/api"),
            ("DEAL_API_TOKEN", "your-token-here"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
    }

    #[test]
    fn test_low_entropy_token_rejected() {
        assert!(validate_secret_strength("aaaaaaaaaaaaaaaa", "DEAL_API_TOKEN").is_err());
    }

    #[test]
    fn test_debug_redacts_token() {
        let config =
            CatalogConfig::new(Url::parse("http://localhost/api").unwrap()).with_token(TOKEN);
        let debug = format!("{config:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains(TOKEN));
    }
}
