use serde::{Deserialize, Serialize};

/// Message sent from a page to the background gateway (one JSON object).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum BackgroundMessage {
    #[serde(rename = "ENHANCE_PROMPT")]
    EnhancePrompt { prompt: String },

    /// Any other message type. The gateway does not answer these.
    #[serde(other)]
    Unknown,
}

impl BackgroundMessage {
    pub fn enhance(prompt: &str) -> Self {
        BackgroundMessage::EnhancePrompt {
            prompt: prompt.to_string(),
        }
    }
}

/// Reply to an `ENHANCE_PROMPT` message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnhanceReply {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enhanced: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl EnhanceReply {
    pub fn success(enhanced: impl Into<String>) -> Self {
        Self {
            ok: true,
            enhanced: Some(enhanced.into()),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            enhanced: None,
            error: Some(error.into()),
        }
    }
}
