//! Process configuration, read once at startup from environment
//! variables. Every knob has a working local default, so a bare
//! `sightcheck` against a local Ollama needs no configuration at all.

use std::net::SocketAddr;

/// Runtime configuration for the service.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the model server.
    pub vlm_base_url: String,
    /// Primary vision model and its per-call timeout.
    pub primary_model: String,
    pub primary_timeout_secs: u64,
    /// Fallback vision model and its (shorter) per-call timeout.
    pub fallback_model: String,
    pub fallback_timeout_secs: u64,
    /// Extra primary attempts for transient errors, per invocation.
    pub transient_retries: usize,
    /// HTTP bind address.
    pub bind_addr: SocketAddr,
    /// Upload size cap enforced at the HTTP layer, in bytes.
    pub max_upload_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            vlm_base_url: "http://localhost:11434".to_string(),
            primary_model: "qwen2.5vl:7b".to_string(),
            primary_timeout_secs: 45,
            fallback_model: "qwen2.5vl:3b".to_string(),
            fallback_timeout_secs: 30,
            transient_retries: 2,
            bind_addr: ([0, 0, 0, 0], 8080).into(),
            max_upload_bytes: 50 * 1024 * 1024,
        }
    }
}

impl Config {
    /// Build from `SIGHTCHECK_*` environment variables, falling back to
    /// the defaults for anything unset or unparseable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            vlm_base_url: env_str("SIGHTCHECK_VLM_URL", defaults.vlm_base_url),
            primary_model: env_str("SIGHTCHECK_PRIMARY_MODEL", defaults.primary_model),
            primary_timeout_secs: env_parse(
                "SIGHTCHECK_PRIMARY_TIMEOUT_SECS",
                defaults.primary_timeout_secs,
            ),
            fallback_model: env_str("SIGHTCHECK_FALLBACK_MODEL", defaults.fallback_model),
            fallback_timeout_secs: env_parse(
                "SIGHTCHECK_FALLBACK_TIMEOUT_SECS",
                defaults.fallback_timeout_secs,
            ),
            transient_retries: env_parse("SIGHTCHECK_TRANSIENT_RETRIES", defaults.transient_retries),
            bind_addr: env_parse("SIGHTCHECK_BIND_ADDR", defaults.bind_addr),
            max_upload_bytes: env_parse("SIGHTCHECK_MAX_UPLOAD_BYTES", defaults.max_upload_bytes),
        }
    }
}

fn env_str(key: &str, default: String) -> String {
    match std::env::var(key) {
        Ok(v) if !v.trim().is_empty() => v,
        _ => default,
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
