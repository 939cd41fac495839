use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ConfigError;
use crate::gateway::endpoint::EndpointConfig;
use crate::gateway::gateway::GatewayConfig;
use crate::gateway::providers::{ProviderConfig, ProviderKind};

/// Environment variable consulted when neither CLI nor config file set a key.
pub const API_KEY_ENV: &str = "PROMPT_ENHANCER_API_KEY";

pub const DEFAULT_CONFIG_PATH: &str = "prompt-enhancer.yaml";

// ============================================================================
// CLI Argument Parsing (clap derive)
// ============================================================================

#[derive(Parser, Debug)]
#[command(
    name = "prompt-enhancer",
    version,
    about = "Attach prompt-enhancement controls to text fields and serve enhancement requests"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to config file (default: prompt-enhancer.yaml in current dir)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// LLM provider: openai, anthropic, gemini or ollama
    #[arg(long, global = true)]
    pub provider: Option<String>,

    /// API key for the provider
    #[arg(long, global = true)]
    pub api_key: Option<String>,

    /// Append lifecycle events as JSON lines to this file
    #[arg(long, global = true)]
    pub trace: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Enhance a single prompt and print the result
    Enhance {
        /// Prompt text to enhance
        #[arg(long)]
        text: String,
    },

    /// Enhance a fixed sample prompt to check the configuration
    Test,

    /// Run the background host: JSON messages on stdin, replies on stdout
    Serve,

    /// Load a page description, attach controls and click each one
    Simulate {
        /// Path to a page fixture YAML file
        #[arg(long)]
        page: String,

        /// Scroll the page by this many pixels after attaching
        #[arg(long, default_value_t = 0.0)]
        scroll: f64,

        /// Click every control and apply the results
        #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
        click: bool,
    },
}

// ============================================================================
// Config File Model (optional YAML)
// ============================================================================

/// Optional YAML config file: `prompt-enhancer.yaml`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub provider: ProviderConfig,

    #[serde(default)]
    pub endpoint: EndpointConfig,

    #[serde(default = "default_true")]
    pub local_fallback: bool,

    #[serde(default)]
    pub trace_path: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            provider: ProviderConfig::default(),
            endpoint: EndpointConfig::default(),
            local_fallback: true,
            trace_path: None,
        }
    }
}

fn default_true() -> bool { true }

// ============================================================================
// Config File Loading
// ============================================================================

/// Load config from a YAML file. Returns defaults if file is missing or malformed.
pub fn load_config(path: Option<&str>) -> AppConfig {
    let config_path = path.unwrap_or(DEFAULT_CONFIG_PATH);
    match std::fs::read_to_string(config_path) {
        Ok(content) => serde_yaml::from_str(&content).unwrap_or_else(|e| {
            warn!(path = config_path, error = %e, "malformed config file, using defaults");
            AppConfig::default()
        }),
        Err(_) => AppConfig::default(),
    }
}

// ============================================================================
// Config Builders (merge CLI args with config file)
// ============================================================================

/// Build the gateway configuration. Precedence: CLI > config file > environment > defaults.
pub fn build_gateway_config(
    config: &AppConfig,
    provider: Option<&str>,
    api_key: Option<&str>,
    env_api_key: Option<String>,
) -> Result<GatewayConfig, ConfigError> {
    let mut provider_config = config.provider.clone();

    if let Some(name) = provider {
        let kind: ProviderKind = name.parse()?;
        if kind != provider_config.kind {
            // Key, model and endpoint overrides belong to the provider they were written for.
            provider_config = ProviderConfig {
                kind,
                ..ProviderConfig::default()
            };
        }
    }

    if let Some(key) = api_key {
        provider_config.api_key = Some(key.to_string());
    } else if provider_config.api_key.is_none() {
        provider_config.api_key = env_api_key.filter(|k| !k.trim().is_empty());
    }

    config.endpoint.validate()?;

    Ok(GatewayConfig {
        provider: provider_config,
        endpoint: config.endpoint.clone(),
        local_fallback: config.local_fallback,
    })
}

/// Trace file from the CLI flag, falling back to the config file.
pub fn resolve_trace_path(cli_trace: Option<&str>, config: &AppConfig) -> Option<String> {
    cli_trace
        .map(str::to_string)
        .or_else(|| config.trace_path.clone())
}
