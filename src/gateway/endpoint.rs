use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ConfigError, GatewayError};
use crate::gateway::gateway::Gateway;

/// Keys a custom endpoint may put its text under, in order of preference.
const RESULT_KEYS: &[&str] = &["enhanced", "result", "text", "response"];

/// User-configured enhancement endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EndpointConfig {
    #[serde(default)]
    pub url: Option<String>,

    /// Off by default; a configured URL is ignored unless this is set.
    #[serde(default)]
    pub allow_user_endpoints: bool,
}

impl EndpointConfig {
    /// Reject URLs that are not http(s). An empty URL counts as unset.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() && !url.starts_with("http") => {
                Err(ConfigError::InvalidEndpoint(url.to_string()))
            }
            _ => Ok(()),
        }
    }

    /// URL to call, when user endpoints are allowed and one is set.
    pub fn active_url(&self) -> Option<&str> {
        if !self.allow_user_endpoints {
            return None;
        }
        self.url.as_deref().map(str::trim).filter(|u| !u.is_empty())
    }
}

#[derive(Serialize)]
struct EndpointRequest<'a> {
    prompt: &'a str,
}

/// Pull the enhanced text out of a custom endpoint's JSON reply.
pub fn parse_endpoint_response(body: &str) -> Result<String, GatewayError> {
    let value: Value = serde_json::from_str(body).map_err(|e| GatewayError::MalformedResponse {
        provider: "endpoint".into(),
        reason: e.to_string(),
    })?;

    RESULT_KEYS
        .iter()
        .filter_map(|key| value.get(*key).and_then(Value::as_str))
        .find(|text| !text.is_empty())
        .map(str::to_string)
        .ok_or_else(|| GatewayError::MalformedResponse {
            provider: "endpoint".into(),
            reason: "server response did not contain enhanced text".into(),
        })
}

pub struct CustomEndpoint {
    url: String,
    client: reqwest::blocking::Client,
}

impl CustomEndpoint {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            client: reqwest::blocking::Client::new(),
        }
    }
}

impl Gateway for CustomEndpoint {
    fn name(&self) -> &str {
        "endpoint"
    }

    fn enhance(&self, text: &str) -> Result<String, GatewayError> {
        let request_failed = |e: reqwest::Error| GatewayError::Request {
            target: self.url.clone(),
            reason: e.to_string(),
        };

        let response = self
            .client
            .post(&self.url)
            .header("Accept", "application/json")
            .json(&EndpointRequest { prompt: text })
            .send()
            .map_err(request_failed)?;

        let status = response.status();
        let body = response.text().map_err(request_failed)?;
        if !status.is_success() {
            return Err(GatewayError::Upstream {
                provider: "endpoint".into(),
                status: status.as_u16(),
                body,
            });
        }

        parse_endpoint_response(&body)
    }
}
