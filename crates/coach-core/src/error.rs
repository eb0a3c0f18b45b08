use thiserror::Error;

/// Why a turn did not produce a reply
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("chat endpoint returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("malformed reply ({source}): {body}")]
    Decode {
        #[source]
        source: serde_json::Error,
        body: String,
    },

    #[error("no user message to send")]
    NoUserMessage,

    #[error("reply task ended unexpectedly: {0}")]
    Aborted(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine config directory")]
    NoConfigDir,

    #[error("chat endpoint is not configured (set --endpoint, COACH_CHAT_ENDPOINT, or \"endpoint\" in {0})")]
    EndpointNotSet(String),

    #[error("unknown payload mode '{0}' (expected 'history' or 'single')")]
    UnknownMode(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
