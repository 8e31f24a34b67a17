//! Shared configuration for LED wall tools.
//!
//! TOML profiles, token resolution (env + keyring + plaintext + build-time),
//! and translation to `ledwall_core::DeviceConfig`. The CLI adds
//! flag-aware overrides on top.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use ledwall_core::{CoreError, DeviceConfig, ReconnectConfig};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use url::Url;

/// Keyring service name; entries are keyed `<profile>/token`.
pub const KEYRING_SERVICE: &str = "ledwall";

/// Prefix of environment overrides, e.g. `LEDWALL_PROFILES__HOME__BASE_URL`.
pub const ENV_PREFIX: &str = "LEDWALL_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{name}' not found (available: {available})")]
    ProfileNotFound { name: String, available: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when `--profile` is not given.
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    /// Named device profiles.
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: BTreeMap::new(),
        }
    }
}

impl Config {
    /// The profile called `name`, or a listing of what exists.
    pub fn profile(&self, name: &str) -> Result<&Profile, ConfigError> {
        self.profiles
            .get(name)
            .ok_or_else(|| ConfigError::ProfileNotFound {
                name: name.into(),
                available: self.profile_names(),
            })
    }

    pub fn profile_names(&self) -> String {
        if self.profiles.is_empty() {
            return "(none)".into();
        }
        self.profiles.keys().cloned().collect::<Vec<_>>().join(", ")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    /// Command timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            timeout: default_timeout(),
        }
    }
}

fn default_output() -> String {
    "plain".into()
}
fn default_timeout() -> u64 {
    10
}

/// A named device profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Profile {
    /// Command endpoint root (e.g., "http://192.168.1.50").
    pub base_url: String,

    /// Push-channel URL. Derived from `base_url` when absent.
    pub ws_url: Option<String>,

    /// Device token (plaintext; prefer keyring or env var).
    pub token: Option<String>,

    /// Environment variable name containing the token.
    pub token_env: Option<String>,

    /// Override timeout, in seconds.
    pub timeout: Option<u64>,

    /// First reconnect delay, in milliseconds.
    pub initial_delay_ms: Option<u64>,

    /// Reconnect backoff ceiling, in seconds.
    pub max_delay_secs: Option<u64>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("dev", "ledwall", "ledwall").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("ledwall");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load defaults, then `path` (if present), then `LEDWALL_*` overrides.
///
/// Nested keys use a double underscore:
/// `LEDWALL_PROFILES__HOME__BASE_URL=http://10.0.0.9`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"));

    let config: Config = figment.extract()?;
    debug!(path = %path.display(), profiles = config.profiles.len(), "config loaded");
    Ok(config)
}

/// Load config, returning a default if loading fails.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

/// Render a config as TOML, e.g. for `config show`.
pub fn to_toml(cfg: &Config) -> Result<String, ConfigError> {
    Ok(toml::to_string_pretty(cfg)?)
}

// ── Token resolution ────────────────────────────────────────────────

/// Resolve the device token from the credential chain.
///
/// 1. the env var named by `token_env`
/// 2. the system keyring (`ledwall` / `<profile>/token`)
/// 3. plaintext `token` in the profile
/// 4. `LEDWALL_API_TOKEN` baked in at build time
///
/// Empty values are skipped. `None` means the device is used without auth.
pub fn resolve_token(profile: &Profile, profile_name: &str) -> Option<SecretString> {
    if let Some(val) = profile
        .token_env
        .as_deref()
        .and_then(|name| std::env::var(name).ok())
        .filter(|v| !v.is_empty())
    {
        debug!(profile = profile_name, "token from environment");
        return Some(SecretString::from(val));
    }

    if let Some(secret) = keyring_token(profile_name) {
        debug!(profile = profile_name, "token from keyring");
        return Some(SecretString::from(secret));
    }

    if let Some(token) = profile.token.as_deref().filter(|t| !t.is_empty()) {
        debug!(profile = profile_name, "token from config file");
        return Some(SecretString::from(token.to_owned()));
    }

    build_time_token()
}

fn keyring_token(profile_name: &str) -> Option<String> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/token")).ok()?;
    entry.get_password().ok().filter(|s| !s.is_empty())
}

/// Token baked in at build time, if any.
pub fn build_time_token() -> Option<SecretString> {
    option_env!("LEDWALL_API_TOKEN")
        .filter(|t| !t.is_empty())
        .map(|t| SecretString::from(t.to_owned()))
}

// ── Profile → DeviceConfig ──────────────────────────────────────────

/// Build a `DeviceConfig` from a profile, with no flag overrides.
pub fn profile_to_device_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<DeviceConfig, ConfigError> {
    let base_url = parse_url("base_url", &profile.base_url)?;
    let mut config = DeviceConfig::new(base_url)?;

    if let Some(ref ws) = profile.ws_url {
        config.ws_url = parse_url("ws_url", ws)?;
    }
    config.token = resolve_token(profile, profile_name);
    config.timeout = Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout));
    config.reconnect = reconnect_for(profile);
    Ok(config)
}

/// Reconnect tuning from a profile; unset fields keep the defaults.
pub fn reconnect_for(profile: &Profile) -> ReconnectConfig {
    let mut reconnect = ReconnectConfig::default();
    if let Some(ms) = profile.initial_delay_ms {
        reconnect.initial_delay = Duration::from_millis(ms);
    }
    if let Some(secs) = profile.max_delay_secs {
        reconnect.max_delay = Duration::from_secs(secs);
    }
    if reconnect.max_delay < reconnect.initial_delay {
        reconnect.max_delay = reconnect.initial_delay;
    }
    reconnect
}

/// Parse a URL field, naming the field on failure.
pub fn parse_url(field: &str, value: &str) -> Result<Url, ConfigError> {
    value.parse().map_err(|e| ConfigError::Validation {
        field: field.into(),
        reason: format!("invalid URL '{value}': {e}"),
    })
}
