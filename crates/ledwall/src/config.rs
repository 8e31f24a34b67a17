//! CLI configuration: a thin layer over `ledwall_config` that applies
//! `GlobalOpts` flag overrides (--base-url, --ws-url, --token, --timeout).

use std::time::Duration;

use ledwall_config::{Config, Profile};
use ledwall_core::DeviceConfig;
use secrecy::SecretString;

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub use ledwall_config::{config_path, load_config_or_default};

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Build the `DeviceConfig` for this invocation.
///
/// Flags beat the profile. Without a matching profile, `--base-url` alone
/// is enough; an explicitly named missing profile is an error.
pub fn build_device_config(global: &GlobalOpts, cfg: &Config) -> Result<DeviceConfig, CliError> {
    let profile_name = active_profile_name(global, cfg);

    let profile = match cfg.profile(&profile_name) {
        Ok(profile) => profile.clone(),
        Err(err) if global.profile.is_some() => return Err(err.into()),
        Err(_) => Profile::default(),
    };

    let base_url = global
        .base_url
        .clone()
        .unwrap_or_else(|| profile.base_url.clone());
    if base_url.is_empty() {
        return Err(CliError::NoConfig {
            path: config_path().display().to_string(),
        });
    }

    let profile = Profile {
        base_url,
        ws_url: global.ws_url.clone().or(profile.ws_url),
        ..profile
    };
    let mut config =
        ledwall_config::profile_to_device_config(&profile, &profile_name, &cfg.defaults)?;

    if let Some(token) = global.token.as_deref().filter(|t| !t.is_empty()) {
        config.token = Some(SecretString::from(token.to_owned()));
    }
    if let Some(secs) = global.timeout {
        config.timeout = Duration::from_secs(secs);
    }
    Ok(config)
}
