//! Configuration for the Scribe binary.
//!
//! All configuration is loaded from environment variables. Nothing is
//! required: without `DATABASE_URL` the service runs on the in-memory store,
//! and without `REWRITER_BACKEND` answers are emitted unchanged.

use std::str::FromStr;
use std::time::Duration;

use scribe_api::ServerConfig;
use scribe_core::{DEFAULT_REWRITE_CONCURRENCY, DEFAULT_REWRITE_TIMEOUT};

use crate::error::ScribeError;

/// Template loaded when `SOW_TEMPLATE_PATH` is unset.
const DEFAULT_TEMPLATE_PATH: &str = "templates/sow_template.json";

/// Pool size used when `DB_MAX_CONNECTIONS` is unset.
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;

/// Complete binary configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// HTTP bind address.
    pub server: ServerConfig,
    /// Database settings; `None` selects the in-memory store.
    pub database: Option<DatabaseSettings>,
    /// Path to the SOW template JSON.
    pub template_path: String,
    /// Which rewriter to build.
    pub rewriter: RewriterSettings,
    /// Per-answer rewrite deadline.
    pub rewrite_timeout: Duration,
    /// Rewrites in flight per document.
    pub rewrite_concurrency: usize,
    /// Optional override for the rewrite prompt template.
    pub prompt_path: Option<String>,
    /// Log output format.
    pub log_format: LogFormat,
}

/// `PostgreSQL` connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseSettings {
    /// Connection URL.
    pub url: String,
    /// Pool size.
    pub max_connections: u32,
    /// Apply embedded migrations at startup.
    pub run_migrations: bool,
}

/// Rewriter backend selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RewriterSettings {
    /// Emit answers unchanged.
    Passthrough,
    /// Anthropic Messages API.
    Anthropic {
        /// Base API URL (e.g. `https://api.anthropic.com/v1`).
        api_url: String,
        /// API key.
        api_key: String,
        /// Model identifier.
        model: String,
    },
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines.
    Text,
    /// One JSON object per line.
    Json,
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// Optional variables:
    /// - `DATABASE_URL` -- Postgres URL; unset selects the in-memory store
    /// - `DB_MAX_CONNECTIONS` -- pool size (default 10)
    /// - `RUN_MIGRATIONS` -- apply migrations at startup (default `true`)
    /// - `HOST` / `PORT` -- bind address (default `0.0.0.0:8080`)
    /// - `SOW_TEMPLATE_PATH` -- template file (default `templates/sow_template.json`)
    /// - `REWRITER_BACKEND` -- `passthrough` (default) or `anthropic`
    /// - `REWRITER_API_URL`, `REWRITER_API_KEY`, `REWRITER_MODEL` -- required for `anthropic`
    /// - `REWRITE_TIMEOUT_MS` -- per-answer deadline (default 15000)
    /// - `REWRITE_CONCURRENCY` -- rewrites in flight per document (default 4)
    /// - `REWRITER_PROMPT_PATH` -- override for the rewrite prompt template
    /// - `LOG_FORMAT` -- `text` (default) or `json`
    pub fn from_env() -> Result<Self, ScribeError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// Blank values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ScribeError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let defaults = ServerConfig::default();
        let server = ServerConfig {
            host: get("HOST").unwrap_or(defaults.host),
            port: parse_or(&get, "PORT", defaults.port)?,
        };

        let database = match get("DATABASE_URL") {
            Some(url) => Some(DatabaseSettings {
                url,
                max_connections: parse_or(&get, "DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS)?,
                run_migrations: parse_or(&get, "RUN_MIGRATIONS", true)?,
            }),
            None => None,
        };

        let rewriter = match get("REWRITER_BACKEND")
            .map(|backend| backend.trim().to_lowercase())
            .as_deref()
        {
            None | Some("passthrough" | "none") => RewriterSettings::Passthrough,
            Some("anthropic" | "claude") => RewriterSettings::Anthropic {
                api_url: required(&get, "REWRITER_API_URL")?,
                api_key: required(&get, "REWRITER_API_KEY")?,
                model: required(&get, "REWRITER_MODEL")?,
            },
            Some(other) => {
                return Err(ScribeError::Config(format!(
                    "unknown rewriter backend: {other}"
                )));
            }
        };

        let default_timeout_ms = u64::try_from(DEFAULT_REWRITE_TIMEOUT.as_millis()).unwrap_or(u64::MAX);
        let rewrite_timeout_ms: u64 = parse_or(&get, "REWRITE_TIMEOUT_MS", default_timeout_ms)?;

        let log_format = match get("LOG_FORMAT").map(|f| f.trim().to_lowercase()).as_deref() {
            None | Some("text" | "pretty") => LogFormat::Text,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(ScribeError::Config(format!("unknown LOG_FORMAT: {other}")));
            }
        };

        Ok(Self {
            server,
            database,
            template_path: get("SOW_TEMPLATE_PATH")
                .unwrap_or_else(|| DEFAULT_TEMPLATE_PATH.to_owned()),
            rewriter,
            rewrite_timeout: Duration::from_millis(rewrite_timeout_ms),
            rewrite_concurrency: parse_or(&get, "REWRITE_CONCURRENCY", DEFAULT_REWRITE_CONCURRENCY)?,
            prompt_path: get("REWRITER_PROMPT_PATH"),
            log_format,
        })
    }
}

/// Read a required variable.
fn required<F>(get: &F, name: &str) -> Result<String, ScribeError>
where
    F: Fn(&str) -> Option<String>,
{
    get(name).ok_or_else(|| ScribeError::Config(format!("missing required env var {name}")))
}

/// Parse an optional variable, falling back to `default` when unset.
fn parse_or<F, T>(get: &F, name: &str, default: T) -> Result<T, ScribeError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get(name).map_or(Ok(default), |raw| {
        raw.trim()
            .parse()
            .map_err(|e| ScribeError::Config(format!("invalid {name}: {e}")))
    })
}
