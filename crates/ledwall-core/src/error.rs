// ── Core error types ──
//
// User-facing errors from ledwall-core. Consumers never see raw HTTP
// statuses or websocket failures directly: `From<ledwall_api::Error>`
// translates transport-layer errors into domain variants.

use thiserror::Error;

use crate::model::Period;
use crate::schedule::ActivationStage;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to device at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    // ── Command errors ───────────────────────────────────────────────
    /// A request/response command failed. Local state was left untouched.
    #[error("Failed to {command}: {reason}")]
    CommandFailed {
        command: String,
        reason: String,
        status: Option<u16>,
    },

    /// `start` stopped before activation because a prerequisite failed.
    #[error("Schedule activation aborted at {stage}: {reason}")]
    ActivationAborted {
        stage: ActivationStage,
        reason: String,
    },

    // ── Edit errors ──────────────────────────────────────────────────
    #[error("Schedule is active; stop it before editing")]
    ScheduleActive,

    #[error("No {period} schedule item at index {index} (length {len})")]
    IndexOutOfRange {
        period: Period,
        index: usize,
        len: usize,
    },

    #[error("Duration must be at least 1 second")]
    InvalidDuration,

    #[error("Invalid time of day '{value}': expected HH:MM")]
    InvalidTime { value: String },

    #[error("Invalid pixel index map: {message}")]
    InvalidIndexMap { message: String },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Unknown device status index {index}")]
    UnknownStatus { index: u32 },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Wrap a transport error raised by a named command.
    pub(crate) fn command(command: &str, err: ledwall_api::Error) -> Self {
        let status = match &err {
            ledwall_api::Error::CommandRejected { status, .. } => Some(*status),
            ledwall_api::Error::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        };
        let reason = match err {
            ledwall_api::Error::CommandRejected { status, body, .. } if body.is_empty() => {
                format!("device answered HTTP {status}")
            }
            ledwall_api::Error::CommandRejected { status, body, .. } => {
                format!("device answered HTTP {status}: {body}")
            }
            other => other.to_string(),
        };
        Self::CommandFailed {
            command: command.to_owned(),
            reason,
            status,
        }
    }

    /// HTTP status attached to a failed command, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::CommandFailed { status, .. } => *status,
            _ => None,
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<ledwall_api::Error> for CoreError {
    fn from(err: ledwall_api::Error) -> Self {
        match err {
            ledwall_api::Error::Transport(ref e) if e.is_connect() || e.is_timeout() => {
                CoreError::ConnectionFailed {
                    url: e
                        .url()
                        .map_or_else(|| "<unknown>".into(), ToString::to_string),
                    reason: e.to_string(),
                }
            }
            ledwall_api::Error::Transport(e) => CoreError::Internal(e.to_string()),
            ledwall_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            ledwall_api::Error::ClientBuild(message) => CoreError::Config { message },
            err @ ledwall_api::Error::CommandRejected { command, .. } => {
                CoreError::command(command, err)
            }
            ledwall_api::Error::WebSocketConnect(reason) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("WebSocket connection failed: {reason}"),
            },
            ledwall_api::Error::Serialization(e) => {
                CoreError::Internal(format!("Serialization error: {e}"))
            }
        }
    }
}
