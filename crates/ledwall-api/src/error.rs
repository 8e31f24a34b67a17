use thiserror::Error;

/// Top-level error type for the `ledwall-api` crate.
///
/// Covers the failure modes of both device surfaces: the push channel
/// (websocket) and the request/response command endpoints.
/// `ledwall-core` maps these into user-facing diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Building the HTTP client failed (TLS backend, invalid header value).
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),

    // ── Command endpoints ───────────────────────────────────────────
    /// The device answered a command with a non-success status.
    #[error("Device rejected {command} (HTTP {status}): {body}")]
    CommandRejected {
        command: &'static str,
        status: u16,
        body: String,
    },

    // ── WebSocket ───────────────────────────────────────────────────
    /// WebSocket connection failed.
    #[error("WebSocket connection failed: {0}")]
    WebSocketConnect(String),

    // ── Data ────────────────────────────────────────────────────────
    /// JSON (de)serialization failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::WebSocketConnect(_) => true,
            Self::CommandRejected { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Returns `true` if the device answered but refused the command.
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::CommandRejected { .. })
    }

    /// Returns `true` if the device refused our bearer token.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::CommandRejected { status: 401, .. })
    }
}
