// ── Runtime device configuration ──
//
// Describes *how* to reach a device. Carries the credential and
// connection tuning, but never touches disk: the CLI builds a
// `DeviceConfig` and hands it in.

use std::time::Duration;

use ledwall_api::ReconnectConfig;
use secrecy::SecretString;
use url::Url;

use crate::error::CoreError;

/// Version information of this client build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientBuild {
    pub version: String,
    pub build_time: Option<String>,
}

impl ClientBuild {
    pub fn new(version: impl Into<String>, build_time: Option<String>) -> Self {
        Self {
            version: version.into(),
            build_time: build_time.filter(|s| !s.is_empty()),
        }
    }

    /// `v<version>`, else the build time, else nothing.
    pub fn label(&self) -> Option<String> {
        if self.version.is_empty() {
            self.build_time.clone()
        } else {
            Some(format!("v{}", self.version))
        }
    }
}

impl Default for ClientBuild {
    fn default() -> Self {
        Self::new(
            env!("CARGO_PKG_VERSION"),
            option_env!("LEDWALL_BUILD_TIME").map(str::to_owned),
        )
    }
}

/// Configuration for one device.
#[derive(Debug, Clone)]
pub struct DeviceConfig {
    /// Root of the command endpoints (e.g. `http://192.168.1.50/`).
    pub base_url: Url,
    /// Push-channel endpoint (e.g. `ws://192.168.1.50/ws`).
    pub ws_url: Url,
    /// Bearer token for both surfaces. Empty counts as absent.
    pub token: Option<SecretString>,
    /// Request timeout for commands.
    pub timeout: Duration,
    pub reconnect: ReconnectConfig,
    /// How often the current period is re-derived from the clock.
    pub period_tick: Duration,
    pub client_build: ClientBuild,
}

impl DeviceConfig {
    /// Defaults for a device at `base_url`, push channel at `<base>/ws`.
    pub fn new(base_url: Url) -> Result<Self, CoreError> {
        let ws_url = ws_url_for(&base_url)?;
        Ok(Self {
            base_url,
            ws_url,
            token: None,
            timeout: Duration::from_secs(10),
            reconnect: ReconnectConfig::default(),
            period_tick: Duration::from_secs(30),
            client_build: ClientBuild::default(),
        })
    }
}

/// Derive the push-channel URL from the command base URL.
pub fn ws_url_for(base_url: &Url) -> Result<Url, CoreError> {
    let scheme = match base_url.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => {
            return Err(CoreError::Config {
                message: format!("unsupported URL scheme '{other}' in {base_url}"),
            });
        }
    };

    let mut url = base_url.clone();
    url.set_scheme(scheme).map_err(|()| CoreError::Config {
        message: format!("cannot derive websocket URL from {base_url}"),
    })?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url.set_query(None);
    url.join("ws").map_err(|e| CoreError::Config {
        message: format!("cannot derive websocket URL from {base_url}: {e}"),
    })
}
