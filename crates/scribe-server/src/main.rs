//! Scribe binary.
//!
//! Wires together the SOW store, the template, the answer rewriter and the
//! HTTP API, then serves until Ctrl-C.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from the environment
//! 2. Initialize structured logging (tracing)
//! 3. Load the SOW template
//! 4. Build the rewriter
//! 5. Connect to `PostgreSQL` and run migrations, or fall back to memory
//! 6. Serve the API until Ctrl-C
//! 7. Close the pool

mod config;
mod error;

use std::sync::Arc;

use scribe_api::{AppState, start_server};
use scribe_core::{AnthropicConfig, AnthropicRewriter, RewritePrompt, Rewriter, load_template};
use scribe_db::{PostgresConfig, PostgresPool, RecordStore};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::{AppConfig, LogFormat, RewriterSettings};
use crate::error::ScribeError;

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration, template loading, the database or the
/// HTTP server fails.
#[tokio::main]
async fn main() -> Result<(), ScribeError> {
    // 1. Load configuration.
    let config = AppConfig::from_env()?;

    // 2. Initialize structured logging.
    init_tracing(config.log_format);
    info!("scribe-server starting");

    // 3. Load the template.
    let template = load_template(&config.template_path)?;
    info!(
        path = %config.template_path,
        template = template.document_metadata.display_name(),
        sections = template.sections.len(),
        "Template loaded"
    );

    // 4. Build the rewriter.
    let rewriter = build_rewriter(&config)?;
    info!(
        rewriter = rewriter.name(),
        timeout_ms = config.rewrite_timeout.as_millis(),
        concurrency = config.rewrite_concurrency,
        "Rewriter ready"
    );

    // 5. Connect the store.
    let (store, pool) = match &config.database {
        Some(db) => {
            let pg_config =
                PostgresConfig::new(&db.url).with_max_connections(db.max_connections);
            let pool = PostgresPool::connect(&pg_config).await?;
            if db.run_migrations {
                pool.run_migrations().await?;
                info!("Migrations applied");
            }
            (RecordStore::Postgres(pool.clone()), Some(pool))
        }
        None => {
            warn!("DATABASE_URL not set, using in-memory store; data is lost on exit");
            (RecordStore::memory(), None)
        }
    };
    info!(backend = store.backend_name(), "Store ready");

    // 6. Serve.
    let state = AppState::new(store, template, rewriter)
        .with_rewrite_concurrency(config.rewrite_concurrency);
    let served = start_server(&config.server, Arc::new(state), shutdown_signal()).await;

    // 7. Close the pool whether or not serving succeeded.
    if let Some(pool) = pool {
        pool.close().await;
        info!("PostgreSQL pool closed");
    }

    served?;
    info!("scribe-server stopped");
    Ok(())
}

/// Install the global tracing subscriber.
fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match format {
        LogFormat::Text => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init(),
    }
}

/// Build the configured rewriter backend.
fn build_rewriter(config: &AppConfig) -> Result<Rewriter, ScribeError> {
    match &config.rewriter {
        RewriterSettings::Passthrough => Ok(Rewriter::Passthrough),
        RewriterSettings::Anthropic {
            api_url,
            api_key,
            model,
        } => {
            let prompt = match &config.prompt_path {
                Some(path) => RewritePrompt::from_file(path)?,
                None => RewritePrompt::default(),
            };
            let settings =
                AnthropicConfig::new(api_url, api_key, model).with_timeout(config.rewrite_timeout);
            Ok(Rewriter::Anthropic(Box::new(AnthropicRewriter::new(
                settings, prompt,
            ))))
        }
    }
}

/// Resolve on Ctrl-C.
async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => {
            warn!(error = %e, "failed to listen for Ctrl-C, serving until killed");
            std::future::pending::<()>().await;
        }
    }
}
