use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::error;

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_OPENAI_URL: &str = "https://api.openai.com";
const DEFAULT_MODEL: &str = "gpt-4o";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

// ─── TOML config file ─────────────────────────────────────────────────────────

/// `config.toml` — all fields are optional overrides.
/// Priority: CLI / env var  >  TOML  >  built-in default.
#[derive(Deserialize, Default)]
struct TomlConfig {
    /// HTTP API port (default: 3000).
    port: Option<u16>,
    /// Bind address (default: "127.0.0.1"; use "0.0.0.0" for LAN access).
    bind_address: Option<String>,
    /// Log level filter string, e.g. "debug", "info,agencyd=trace" (default: "info").
    log: Option<String>,
    /// Log output format: "pretty" (default) | "json" (structured for log aggregators).
    log_format: Option<String>,
    /// External store endpoint, e.g. https://xyz.supabase.co.
    store_url: Option<String>,
    /// External store API key.
    store_key: Option<String>,
    /// Reasoning-service API key.
    openai_api_key: Option<String>,
    /// Override the reasoning-service base URL (default: https://api.openai.com).
    openai_base_url: Option<String>,
    /// Completion model id (default: gpt-4o).
    model: Option<String>,
    /// Outbound HTTP timeout in seconds for both clients (default: 30).
    http_timeout_secs: Option<u64>,
}

fn load_toml(path: &Path) -> Option<TomlConfig> {
    let contents = std::fs::read_to_string(path).ok()?;
    match toml::from_str::<TomlConfig>(&contents) {
        Ok(cfg) => Some(cfg),
        Err(e) => {
            error!(path = %path.display(), err = %e, "failed to parse config.toml — using defaults");
            None
        }
    }
}

// ─── AgencyConfig ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct AgencyConfig {
    pub port: u16,
    pub bind_address: String,
    pub log: String,
    /// "pretty" (default) | "json".
    pub log_format: String,
    /// External store endpoint (SUPABASE_URL). None = not configured;
    /// `serve` refuses to start without it, `doctor` reports it as a failed check.
    pub store_url: Option<String>,
    /// External store API key (SUPABASE_KEY).
    pub store_key: Option<String>,
    /// Reasoning-service API key (OPENAI_API_KEY).
    pub openai_api_key: Option<String>,
    /// Reasoning-service base URL (AGENCYD_OPENAI_URL).
    pub openai_base_url: String,
    /// Completion model id (AGENCYD_MODEL).
    pub model: String,
    /// Outbound HTTP timeout applied to the store and reasoning clients.
    pub http_timeout_secs: u64,
}

impl AgencyConfig {
    /// Build config from CLI/env args + optional TOML file.
    ///
    /// Priority (highest to lowest):
    ///   1. CLI / env — passed as `Some(value)` from clap
    ///   2. TOML file (default path: ./config.toml)
    ///   3. Built-in defaults
    pub fn new(
        port: Option<u16>,
        bind_address: Option<String>,
        log: Option<String>,
        config_path: Option<PathBuf>,
    ) -> Self {
        let path = config_path.unwrap_or_else(|| PathBuf::from("config.toml"));
        let toml = load_toml(&path).unwrap_or_default();

        let port = port.or(toml.port).unwrap_or(DEFAULT_PORT);
        let bind_address = bind_address
            .or(toml.bind_address)
            .unwrap_or_else(default_bind_address);
        let log = log.or(toml.log).unwrap_or_else(|| "info".to_string());

        let log_format = std::env::var("AGENCYD_LOG_FORMAT")
            .ok()
            .filter(|s| !s.is_empty())
            .or(toml.log_format)
            .unwrap_or_else(|| "pretty".to_string());

        let store_url = std::env::var("SUPABASE_URL")
            .ok()
            .filter(|s| !s.is_empty())
            .or(toml.store_url);

        let store_key = std::env::var("SUPABASE_KEY")
            .ok()
            .filter(|s| !s.is_empty())
            .or(toml.store_key);

        let openai_api_key = std::env::var("OPENAI_API_KEY")
            .ok()
            .filter(|s| !s.is_empty())
            .or(toml.openai_api_key);

        let openai_base_url = std::env::var("AGENCYD_OPENAI_URL")
            .ok()
            .filter(|s| !s.is_empty())
            .or(toml.openai_base_url)
            .unwrap_or_else(|| DEFAULT_OPENAI_URL.to_string());

        let model = std::env::var("AGENCYD_MODEL")
            .ok()
            .filter(|s| !s.is_empty())
            .or(toml.model)
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let http_timeout_secs = std::env::var("AGENCYD_HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .or(toml.http_timeout_secs)
            .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS);

        Self {
            port,
            bind_address,
            log,
            log_format,
            store_url,
            store_key,
            openai_api_key,
            openai_base_url,
            model,
            http_timeout_secs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_beats_toml_beats_default() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "port = 4100\nmodel = \"gpt-4o-mini\"\n").unwrap();

        let cfg = AgencyConfig::new(Some(5000), None, None, Some(path.clone()));
        assert_eq!(cfg.port, 5000);
        assert_eq!(cfg.model, "gpt-4o-mini");

        let cfg = AgencyConfig::new(None, None, None, Some(path));
        assert_eq!(cfg.port, 4100);
        assert_eq!(cfg.bind_address, "127.0.0.1");
    }

    #[test]
    fn missing_or_broken_toml_falls_back_to_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let missing = dir.path().join("nope.toml");
        let cfg = AgencyConfig::new(None, None, None, Some(missing));
        assert_eq!(cfg.port, DEFAULT_PORT);
        assert_eq!(cfg.http_timeout_secs, DEFAULT_HTTP_TIMEOUT_SECS);

        let broken = dir.path().join("config.toml");
        std::fs::write(&broken, "port = \"not a number").unwrap();
        let cfg = AgencyConfig::new(None, None, None, Some(broken));
        assert_eq!(cfg.port, DEFAULT_PORT);
    }
}
