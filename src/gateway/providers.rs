use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ConfigError, GatewayError};
use crate::gateway::gateway::Gateway;

const SYSTEM_PROMPT: &str = "You are a prompt enhancement expert. Take the user's prompt and make it more detailed, specific, and effective. Add context, constraints, examples, and clear instructions while preserving the original intent.";

const ANTHROPIC_VERSION: &str = "2023-06-01";

// ============================================================================
// Provider configuration
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[serde(rename = "openai")]
    OpenAi,
    Anthropic,
    #[default]
    Gemini,
    Ollama,
}

impl ProviderKind {
    pub fn name(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::Gemini => "gemini",
            ProviderKind::Ollama => "ollama",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "gpt-4o-mini",
            ProviderKind::Anthropic => "claude-3-haiku-20240307",
            ProviderKind::Gemini => "gemini-2.5-flash",
            ProviderKind::Ollama => "qwen2.5:1.5b",
        }
    }

    pub fn default_endpoint(&self, model: &str) -> String {
        match self {
            ProviderKind::OpenAi => "https://api.openai.com/v1/chat/completions".to_string(),
            ProviderKind::Anthropic => "https://api.anthropic.com/v1/messages".to_string(),
            ProviderKind::Gemini => format!(
                "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent",
                model
            ),
            ProviderKind::Ollama => "http://localhost:11434/api/generate".to_string(),
        }
    }

    /// Local Ollama needs no key; hosted providers do.
    pub fn requires_api_key(&self) -> bool {
        !matches!(self, ProviderKind::Ollama)
    }
}

impl FromStr for ProviderKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(ProviderKind::OpenAi),
            "anthropic" => Ok(ProviderKind::Anthropic),
            "gemini" => Ok(ProviderKind::Gemini),
            "ollama" => Ok(ProviderKind::Ollama),
            other => Err(ConfigError::UnknownProvider(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default)]
    pub kind: ProviderKind,

    #[serde(default)]
    pub api_key: Option<String>,

    /// Overrides the provider's default model
    #[serde(default)]
    pub model: Option<String>,

    /// Overrides the provider's default endpoint
    #[serde(default)]
    pub endpoint: Option<String>,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: ProviderKind::default(),
            api_key: None,
            model: None,
            endpoint: None,
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
        }
    }
}

fn default_max_tokens() -> u32 { 500 }
fn default_temperature() -> f32 { 0.7 }

impl ProviderConfig {
    pub fn model(&self) -> &str {
        self.model
            .as_deref()
            .unwrap_or_else(|| self.kind.default_model())
    }

    pub fn endpoint(&self) -> String {
        self.endpoint
            .clone()
            .unwrap_or_else(|| self.kind.default_endpoint(self.model()))
    }

    fn api_key(&self) -> &str {
        self.api_key.as_deref().unwrap_or_default()
    }

    /// Whether this provider can be called at all.
    pub fn has_credentials(&self) -> bool {
        !self.kind.requires_api_key()
            || self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }
}

// ============================================================================
// Wire bodies
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct OpenAiResponse {
    #[serde(default)]
    choices: Vec<OpenAiChoice>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: Option<ChatMessage>,
}

#[derive(Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<ChatMessage>,
}

#[derive(Deserialize)]
struct AnthropicResponse {
    #[serde(default)]
    content: Vec<AnthropicBlock>,
}

#[derive(Deserialize)]
struct AnthropicBlock {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    generation_config: GeminiGenerationConfig,
}

#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

#[derive(Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    prompt: String,
    stream: bool,
}

#[derive(Deserialize)]
struct OllamaResponse {
    #[serde(default)]
    response: Option<String>,
}

// ============================================================================
// Response parsing
// ============================================================================

fn malformed(provider: ProviderKind, reason: impl ToString) -> GatewayError {
    GatewayError::MalformedResponse {
        provider: provider.name().to_string(),
        reason: reason.to_string(),
    }
}

fn non_empty(provider: ProviderKind, text: Option<String>) -> Result<String, GatewayError> {
    text.filter(|t| !t.trim().is_empty())
        .ok_or_else(|| malformed(provider, "no text in response"))
}

pub fn parse_openai_response(body: &str) -> Result<String, GatewayError> {
    let kind = ProviderKind::OpenAi;
    let parsed: OpenAiResponse = serde_json::from_str(body).map_err(|e| malformed(kind, e))?;
    let text = parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message)
        .map(|m| m.content);
    non_empty(kind, text)
}

pub fn parse_anthropic_response(body: &str) -> Result<String, GatewayError> {
    let kind = ProviderKind::Anthropic;
    let parsed: AnthropicResponse = serde_json::from_str(body).map_err(|e| malformed(kind, e))?;
    non_empty(kind, parsed.content.into_iter().next().and_then(|b| b.text))
}

pub fn parse_gemini_response(body: &str) -> Result<String, GatewayError> {
    let kind = ProviderKind::Gemini;
    let parsed: GeminiResponse = serde_json::from_str(body).map_err(|e| malformed(kind, e))?;
    let text = parsed
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .and_then(|c| c.parts.into_iter().next())
        .and_then(|p| p.text);
    non_empty(kind, text)
}

pub fn parse_ollama_response(body: &str) -> Result<String, GatewayError> {
    let kind = ProviderKind::Ollama;
    let parsed: OllamaResponse = serde_json::from_str(body).map_err(|e| malformed(kind, e))?;
    non_empty(kind, parsed.response)
}

// ============================================================================
// Remote provider
// ============================================================================

/// Calls one hosted (or local Ollama) LLM API with the blocking client.
pub struct RemoteProvider {
    config: ProviderConfig,
    client: reqwest::blocking::Client,
}

impl RemoteProvider {
    pub fn new(config: ProviderConfig) -> Self {
        Self {
            config,
            client: reqwest::blocking::Client::new(),
        }
    }

    /// Request body for `prompt`, as sent on the wire.
    pub fn request_body(&self, prompt: &str) -> Result<serde_json::Value, serde_json::Error> {
        let model = self.config.model();
        let c = &self.config;
        match c.kind {
            ProviderKind::OpenAi => serde_json::to_value(OpenAiRequest {
                model,
                messages: vec![
                    ChatMessage {
                        role: "system".into(),
                        content: SYSTEM_PROMPT.into(),
                    },
                    ChatMessage {
                        role: "user".into(),
                        content: format!("Please enhance this prompt: \"{}\"", prompt),
                    },
                ],
                max_tokens: c.max_tokens,
                temperature: c.temperature,
            }),
            ProviderKind::Anthropic => serde_json::to_value(AnthropicRequest {
                model,
                max_tokens: c.max_tokens,
                messages: vec![ChatMessage {
                    role: "user".into(),
                    content: format!("{}\n\nPrompt: \"{}\"", SYSTEM_PROMPT, prompt),
                }],
            }),
            ProviderKind::Gemini => serde_json::to_value(GeminiRequest {
                contents: vec![GeminiContent {
                    parts: vec![GeminiPart {
                        text: Some(format!(
                            "{}\n\nOriginal prompt: \"{}\"\n\nEnhanced prompt:",
                            SYSTEM_PROMPT, prompt
                        )),
                    }],
                }],
                generation_config: GeminiGenerationConfig {
                    temperature: c.temperature,
                    max_output_tokens: c.max_tokens,
                },
            }),
            ProviderKind::Ollama => serde_json::to_value(OllamaRequest {
                model,
                prompt: format!("{}\n\nPrompt: \"{}\"\n\nEnhanced prompt:", SYSTEM_PROMPT, prompt),
                stream: false,
            }),
        }
    }

    fn send(&self, body: &serde_json::Value) -> Result<String, GatewayError> {
        let kind = self.config.kind;
        let url = self.config.endpoint();
        let key = self.config.api_key();

        let mut request = self.client.post(&url).json(body);
        request = match kind {
            ProviderKind::OpenAi => request.bearer_auth(key),
            ProviderKind::Anthropic => request
                .header("x-api-key", key)
                .header("anthropic-version", ANTHROPIC_VERSION),
            ProviderKind::Gemini => request.query(&[("key", key)]),
            ProviderKind::Ollama => request,
        };

        debug!(provider = kind.name(), model = self.config.model(), "calling provider");

        let response = request.send().map_err(|e| GatewayError::Request {
            target: kind.name().to_string(),
            reason: e.to_string(),
        })?;
        let status = response.status();
        let text = response.text().map_err(|e| GatewayError::Request {
            target: kind.name().to_string(),
            reason: e.to_string(),
        })?;

        if !status.is_success() {
            return Err(GatewayError::Upstream {
                provider: kind.name().to_string(),
                status: status.as_u16(),
                body: text,
            });
        }
        Ok(text)
    }
}

impl Gateway for RemoteProvider {
    fn name(&self) -> &str {
        self.config.kind.name()
    }

    fn enhance(&self, text: &str) -> Result<String, GatewayError> {
        let body = self
            .request_body(text)
            .map_err(|e| malformed(self.config.kind, e))?;
        let raw = self.send(&body)?;
        match self.config.kind {
            ProviderKind::OpenAi => parse_openai_response(&raw),
            ProviderKind::Anthropic => parse_anthropic_response(&raw),
            ProviderKind::Gemini => parse_gemini_response(&raw),
            ProviderKind::Ollama => parse_ollama_response(&raw),
        }
    }
}
