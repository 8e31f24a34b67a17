//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and process exit codes.

use ledwall_config::ConfigError;
use ledwall_core::CoreError;
use miette::Diagnostic;
use thiserror::Error;

pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to device at {url}")]
    #[diagnostic(
        code(ledwall::connection_failed),
        help(
            "Check that the panel is powered and reachable.\n\
             Reason: {reason}"
        )
    )]
    ConnectionFailed { url: String, reason: String },

    #[error("No snapshot from {url} within {seconds}s")]
    #[diagnostic(
        code(ledwall::timeout),
        help("Increase --timeout, or check the token if the device drops the connection.")
    )]
    Timeout { url: String, seconds: u64 },

    // ── Commands ─────────────────────────────────────────────────────
    #[error("Device rejected the request: {message}")]
    #[diagnostic(
        code(ledwall::unauthorized),
        help("Pass --token, set LEDWALL_TOKEN, or store one with the system keyring.")
    )]
    Unauthorized { message: String },

    #[error("{message}")]
    #[diagnostic(code(ledwall::command_failed))]
    CommandFailed { message: String },

    #[error("Schedule is active")]
    #[diagnostic(
        code(ledwall::schedule_active),
        help("Run: ledwall schedule stop")
    )]
    ScheduleActive,

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(ledwall::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(ledwall::profile_not_found),
        help("Available profiles: {available}\nConfig file: {path}")
    )]
    ProfileNotFound {
        name: String,
        available: String,
        path: String,
    },

    #[error("No device configured")]
    #[diagnostic(
        code(ledwall::no_config),
        help(
            "Pass --base-url, set LEDWALL_BASE_URL, or add a profile to\n\
             {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(ledwall::config))]
    Config(ConfigError),

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render JSON: {0}")]
    #[diagnostic(code(ledwall::json))]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Unauthorized { .. } => exit_code::AUTH,
            Self::ScheduleActive => exit_code::CONFLICT,
            Self::Validation { .. } | Self::ProfileNotFound { .. } | Self::NoConfig { .. } => {
                exit_code::USAGE
            }
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        if matches!(err.status(), Some(401 | 403)) {
            return Self::Unauthorized {
                message: err.to_string(),
            };
        }
        match err {
            CoreError::ConnectionFailed { url, reason } => Self::ConnectionFailed { url, reason },
            CoreError::ScheduleActive => Self::ScheduleActive,
            CoreError::InvalidDuration => Self::Validation {
                field: "duration".into(),
                reason: err.to_string(),
            },
            CoreError::InvalidTime { .. } => Self::Validation {
                field: "time".into(),
                reason: err.to_string(),
            },
            CoreError::InvalidIndexMap { .. } | CoreError::IndexOutOfRange { .. } => {
                Self::Validation {
                    field: "input".into(),
                    reason: err.to_string(),
                }
            }
            CoreError::Config { message } => Self::Validation {
                field: "config".into(),
                reason: message,
            },
            other => Self::CommandFailed {
                message: other.to_string(),
            },
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::ProfileNotFound { name, available } => Self::ProfileNotFound {
                name,
                available,
                path: ledwall_config::config_path().display().to_string(),
            },
            ConfigError::Core(core) => core.into(),
            other => Self::Config(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_commands_exit_with_auth_code() {
        let err: CliError = CoreError::CommandFailed {
            command: "start schedule".into(),
            reason: "device answered HTTP 401".into(),
            status: Some(401),
        }
        .into();
        assert!(matches!(err, CliError::Unauthorized { .. }));
        assert_eq!(err.exit_code(), exit_code::AUTH);
    }

    #[test]
    fn edit_rejection_is_a_conflict() {
        let err: CliError = CoreError::ScheduleActive.into();
        assert_eq!(err.exit_code(), exit_code::CONFLICT);
    }

    #[test]
    fn rejected_command_keeps_message() {
        let err: CliError = CoreError::CommandFailed {
            command: "stop schedule".into(),
            reason: "device answered HTTP 500".into(),
            status: Some(500),
        }
        .into();
        assert_eq!(err.exit_code(), exit_code::GENERAL);
        assert!(err.to_string().contains("HTTP 500"), "{err}");
    }
}
