//! Per-answer text rewriting.
//!
//! The assembler is generic over [`TextRewriter`]. Production uses the
//! [`Rewriter`] enum, which dispatches to the Anthropic Messages API or to a
//! passthrough that returns its input unchanged. Enum dispatch keeps the
//! backends usable behind one concrete type without boxing async futures.
//!
//! A rewrite is a pure text transform with no side effects, so retrying one
//! is always safe.

use std::future::Future;
use std::time::Duration;

use minijinja::Environment;

use crate::error::{RewriteError, TemplateError};

/// Default rewrite instructions. `{{ text }}` is the trimmed answer.
pub const DEFAULT_REWRITE_PROMPT: &str = "You are a professional SOW writer.\n\
Please rewrite the following answer as a polished, client-ready paragraph:\n\n\
{{ text }}";

/// Default upper bound on reply length.
pub const DEFAULT_MAX_TOKENS: u32 = 1000;

/// Default sampling temperature.
pub const DEFAULT_TEMPERATURE: f64 = 0.3;

/// Default nucleus sampling cutoff.
pub const DEFAULT_TOP_P: f64 = 0.9;

/// Default per-call deadline.
pub const DEFAULT_REWRITE_TIMEOUT: Duration = Duration::from_secs(15);

/// Anthropic API version header value.
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Anything that can turn a raw answer into polished text.
pub trait TextRewriter: Send + Sync {
    /// Rewrite one non-empty, trimmed answer.
    fn rewrite(&self, text: &str) -> impl Future<Output = Result<String, RewriteError>> + Send;
}

/// Compiled rewrite prompt.
pub struct RewritePrompt {
    env: Environment<'static>,
}

impl RewritePrompt {
    /// Compile a prompt template. The template receives one variable, `text`.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::Prompt`] if the template does not compile.
    pub fn new(source: impl Into<String>) -> Result<Self, TemplateError> {
        let mut env = Environment::new();
        env.add_template_owned("rewrite", source.into())
            .map_err(|e| TemplateError::Prompt(format!("failed to add rewrite template: {e}")))?;
        Ok(Self { env })
    }

    /// Load a prompt template from disk.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::Io`] if the file cannot be read, or
    /// [`TemplateError::Prompt`] if it does not compile.
    pub fn from_file(path: &str) -> Result<Self, TemplateError> {
        let source = std::fs::read_to_string(path).map_err(|source| TemplateError::Io {
            path: path.to_owned(),
            source,
        })?;
        Self::new(source)
    }

    /// Render the prompt for one answer.
    ///
    /// # Errors
    ///
    /// Returns [`RewriteError::Prompt`] if rendering fails.
    pub fn render(&self, text: &str) -> Result<String, RewriteError> {
        self.env
            .get_template("rewrite")
            .map_err(|e| RewriteError::Prompt(format!("missing rewrite template: {e}")))?
            .render(minijinja::context! { text => text })
            .map_err(|e| RewriteError::Prompt(format!("rewrite render failed: {e}")))
    }
}

impl Default for RewritePrompt {
    fn default() -> Self {
        let mut env = Environment::new();
        if let Err(e) = env.add_template("rewrite", DEFAULT_REWRITE_PROMPT) {
            tracing::error!(error = %e, "built-in rewrite prompt failed to compile");
        }
        Self { env }
    }
}

/// Connection and sampling settings for the Anthropic backend.
#[derive(Debug, Clone)]
pub struct AnthropicConfig {
    /// Base API URL, e.g. `https://api.anthropic.com/v1`.
    pub api_url: String,
    /// API key sent as `x-api-key`.
    pub api_key: String,
    /// Model identifier.
    pub model: String,
    /// Upper bound on reply length.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f64,
    /// Nucleus sampling cutoff.
    pub top_p: f64,
    /// Per-call deadline.
    pub timeout: Duration,
}

impl AnthropicConfig {
    /// Settings with the default sampling parameters and timeout.
    pub fn new(api_url: &str, api_key: &str, model: &str) -> Self {
        Self {
            api_url: api_url.trim_end_matches('/').to_owned(),
            api_key: api_key.to_owned(),
            model: model.to_owned(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            top_p: DEFAULT_TOP_P,
            timeout: DEFAULT_REWRITE_TIMEOUT,
        }
    }

    /// Set the per-call deadline.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Rewriter backed by the Anthropic Messages API.
pub struct AnthropicRewriter {
    client: reqwest::Client,
    config: AnthropicConfig,
    prompt: RewritePrompt,
}

impl AnthropicRewriter {
    /// Create a rewriter with the given settings and prompt.
    pub fn new(config: AnthropicConfig, prompt: RewritePrompt) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
            prompt,
        }
    }

    async fn complete(&self, text: &str) -> Result<String, RewriteError> {
        let url = format!("{}/messages", self.config.api_url);
        let prompt = self.prompt.render(text)?;

        let body = serde_json::json!({
            "model": self.config.model,
            "max_tokens": self.config.max_tokens,
            "temperature": self.config.temperature,
            "top_p": self.config.top_p,
            "messages": [
                {"role": "user", "content": prompt}
            ]
        });

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| RewriteError::Backend(format!("Anthropic request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "unable to read error body".to_owned());
            return Err(RewriteError::Backend(format!(
                "Anthropic returned {status}: {error_body}"
            )));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| RewriteError::Response(format!("Anthropic response parse failed: {e}")))?;

        extract_anthropic_text(&json)
    }
}

/// Extract `content[0].text` from a Messages API reply, trimmed.
fn extract_anthropic_text(json: &serde_json::Value) -> Result<String, RewriteError> {
    json.get("content")
        .and_then(|c| c.get(0))
        .and_then(|b| b.get("text"))
        .and_then(serde_json::Value::as_str)
        .map(|text| text.trim().to_owned())
        .ok_or_else(|| RewriteError::Response("missing content[0].text".to_owned()))
}

/// The configured rewriter.
pub enum Rewriter {
    /// Anthropic Messages API.
    Anthropic(Box<AnthropicRewriter>),
    /// Returns the input unchanged.
    Passthrough,
}

impl Rewriter {
    /// Human-readable name for logging.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Anthropic(_) => "anthropic",
            Self::Passthrough => "passthrough",
        }
    }
}

impl TextRewriter for Rewriter {
    async fn rewrite(&self, text: &str) -> Result<String, RewriteError> {
        match self {
            Self::Passthrough => Ok(text.to_owned()),
            Self::Anthropic(backend) => {
                let deadline = backend.config.timeout;
                match tokio::time::timeout(deadline, backend.complete(text)).await {
                    Ok(result) => result,
                    Err(_elapsed) => Err(RewriteError::Timeout(deadline.as_millis())),
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_prompt_embeds_answer() {
        let rendered = RewritePrompt::default().render("Automate reporting").unwrap();
        assert!(rendered.starts_with("You are a professional SOW writer."));
        assert!(rendered.ends_with("\n\nAutomate reporting"));
    }

    #[test]
    fn custom_prompt_renders() {
        let prompt = RewritePrompt::new("Polish: {{ text }}").unwrap();
        assert_eq!(prompt.render("abc").unwrap(), "Polish: abc");
        assert!(RewritePrompt::new("{% if %}").is_err());
    }

    #[test]
    fn bundled_prompt_file_matches_default() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../../templates/rewrite_prompt.j2");
        let from_file = RewritePrompt::from_file(path).unwrap();
        assert_eq!(
            from_file.render("x").unwrap(),
            RewritePrompt::default().render("x").unwrap()
        );
    }

    #[test]
    fn extract_text_trims() {
        let json = serde_json::json!({"content": [{"type": "text", "text": "  Polished.\n"}]});
        assert_eq!(extract_anthropic_text(&json).unwrap(), "Polished.");
    }

    #[test]
    fn extract_text_missing() {
        let json = serde_json::json!({"content": []});
        assert!(matches!(
            extract_anthropic_text(&json),
            Err(RewriteError::Response(_))
        ));
    }

    #[tokio::test]
    async fn passthrough_returns_input() {
        let out = Rewriter::Passthrough.rewrite("as is").await.unwrap();
        assert_eq!(out, "as is");
        assert_eq!(Rewriter::Passthrough.name(), "passthrough");
    }

    #[tokio::test]
    async fn unreachable_backend_is_an_error() {
        let config = AnthropicConfig::new("http://127.0.0.1:9", "test", "test-model")
            .with_timeout(Duration::from_millis(500));
        let rewriter = Rewriter::Anthropic(Box::new(AnthropicRewriter::new(
            config,
            RewritePrompt::default(),
        )));
        assert_eq!(rewriter.name(), "anthropic");
        assert!(rewriter.rewrite("text").await.is_err());
    }
}
