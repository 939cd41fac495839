use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::GatewayError;
use crate::gateway::endpoint::{CustomEndpoint, EndpointConfig};
use crate::gateway::local::LocalHeuristic;
use crate::gateway::message::{BackgroundMessage, EnhanceReply};
use crate::gateway::providers::{ProviderConfig, RemoteProvider};

/// Turns a prompt into an enhanced prompt.
pub trait Gateway {
    /// Short name used in logs.
    fn name(&self) -> &str;

    fn enhance(&self, text: &str) -> Result<String, GatewayError>;
}

/// Everything the gateway needs, injected at construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub endpoint: EndpointConfig,
    #[serde(default = "default_true")]
    pub local_fallback: bool,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            provider: ProviderConfig::default(),
            endpoint: EndpointConfig::default(),
            local_fallback: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Tries each strategy in order and returns the first non-empty result.
///
/// Built from config the order is fixed: remote provider (when it has
/// credentials), then the user endpoint (when allowed and set), then the
/// local heuristic (when enabled).
pub struct FallbackGateway {
    strategies: Vec<Box<dyn Gateway>>,
}

impl FallbackGateway {
    pub fn new(strategies: Vec<Box<dyn Gateway>>) -> Self {
        Self { strategies }
    }

    pub fn from_config(config: &GatewayConfig) -> Self {
        let mut strategies: Vec<Box<dyn Gateway>> = Vec::new();

        if config.provider.has_credentials() {
            strategies.push(Box::new(RemoteProvider::new(config.provider.clone())));
        }
        if let Some(url) = config.endpoint.active_url() {
            strategies.push(Box::new(CustomEndpoint::new(url)));
        }
        if config.local_fallback {
            strategies.push(Box::new(LocalHeuristic));
        }

        Self::new(strategies)
    }

    pub fn strategy_names(&self) -> Vec<&str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }
}

impl Gateway for FallbackGateway {
    fn name(&self) -> &str {
        "fallback"
    }

    fn enhance(&self, text: &str) -> Result<String, GatewayError> {
        let mut last_error = GatewayError::NoStrategy;

        for strategy in &self.strategies {
            match strategy.enhance(text) {
                Ok(enhanced) if !enhanced.trim().is_empty() => {
                    info!(strategy = strategy.name(), "enhancement succeeded");
                    return Ok(enhanced);
                }
                Ok(_) => {
                    warn!(strategy = strategy.name(), "strategy returned empty text");
                    last_error = GatewayError::MalformedResponse {
                        provider: strategy.name().to_string(),
                        reason: "empty text".into(),
                    };
                }
                Err(e) => {
                    warn!(strategy = strategy.name(), error = %e, "strategy failed, trying next");
                    last_error = e;
                }
            }
        }

        Err(last_error)
    }
}

/// Background-side dispatch of one message. Unknown message types get no reply.
pub fn handle_message(gateway: &dyn Gateway, message: &BackgroundMessage) -> Option<EnhanceReply> {
    match message {
        BackgroundMessage::EnhancePrompt { prompt } => Some(match gateway.enhance(prompt) {
            Ok(enhanced) => EnhanceReply::success(enhanced),
            Err(e) => EnhanceReply::failure(e.to_string()),
        }),
        BackgroundMessage::Unknown => None,
    }
}
