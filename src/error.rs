use thiserror::Error;

use crate::dom::dom_model::NodeId;

/// Failures reported by an `Environment` when a node cannot be queried or mutated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomError {
    /// Node id was never issued by this document
    #[error("unknown node {0:?}")]
    UnknownNode(NodeId),

    /// Node exists but is no longer attached to the document
    #[error("node {0:?} is detached from the document")]
    Detached(NodeId),

    /// Structural operation the document cannot perform (e.g. inserting before a non-child)
    #[error("invalid DOM operation: {0}")]
    InvalidOperation(String),

    #[error("invalid selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },
}

/// Reasons an element is left without a control. Never shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutSkip {
    #[error("element has no parent to host a wrapper")]
    NoParent,

    #[error("element could not be measured or wrapped: {0}")]
    Dom(#[from] DomError),
}

/// Failures produced by the enhancement collaborator itself.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// Upstream API answered with a non-success status
    #[error("{provider} API error: {status} - {body}")]
    Upstream {
        provider: String,
        status: u16,
        body: String,
    },

    /// Upstream answered, but the body did not contain usable text
    #[error("invalid response from {provider}: {reason}")]
    MalformedResponse { provider: String, reason: String },

    /// The request could not be sent at all
    #[error("request to {target} failed: {reason}")]
    Request { target: String, reason: String },

    /// No strategy is configured to serve the request
    #[error("no enhancement strategy available")]
    NoStrategy,
}

/// The privileged channel between the page and the gateway broke.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelError {
    /// Receiving end is gone (extension reloaded, host process exited)
    #[error("channel disconnected: {0}")]
    Disconnected(String),

    #[error("channel protocol error: {0}")]
    Protocol(String),
}

/// Outcome taxonomy of a single control's enhancement request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnhanceError {
    /// Request never reached the gateway or its reply never came back
    #[error("Extension error: {0}. Please refresh the page and try again.")]
    Transport(ChannelError),

    /// Gateway explicitly reported failure; the reason is shown verbatim
    #[error("Enhancer error: {0}")]
    Gateway(String),

    /// Gateway answered without usable text
    #[error("{}", .0.notice())]
    EmptyResult(EmptyResult),
}

/// Two shapes of "nothing came back".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyResult {
    /// The channel completed without any reply
    NoResponse,
    /// A success reply without text
    EmptyText,
}

impl EmptyResult {
    pub fn notice(&self) -> &'static str {
        match self {
            EmptyResult::NoResponse => "No response from enhancer.",
            EmptyResult::EmptyText => "Enhancer error: empty response",
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("endpoint must start with http:// or https:// (got '{0}')")]
    InvalidEndpoint(String),

    #[error("unsupported provider '{0}' (expected openai, anthropic, gemini or ollama)")]
    UnknownProvider(String),
}

/// Failures loading a page description for the simulator.
#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("could not read page fixture '{path}': {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("could not parse page fixture '{path}': {source}")]
    Parse {
        path: String,
        source: serde_yaml::Error,
    },

    #[error("page fixture is invalid: {0}")]
    Invalid(#[from] DomError),
}

/// Failures of the NDJSON background host loop.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("host I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not serialize reply: {0}")]
    Serialize(#[from] serde_json::Error),
}
