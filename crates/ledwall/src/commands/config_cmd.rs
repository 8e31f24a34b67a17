//! Config subcommand handlers.

use ledwall_config::Config;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts, OutputFormat};
use crate::config;
use crate::error::CliError;
use crate::output;

const REDACTED: &str = "********";

pub fn handle(args: &ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Path => {
            output::print_output(&config::config_path().display().to_string());
            Ok(())
        }
        ConfigCommand::Show => {
            let cfg = redacted(config::load_config_or_default());
            let rendered = match global.output {
                OutputFormat::Json => serde_json::to_string_pretty(&cfg)?,
                OutputFormat::Plain => ledwall_config::to_toml(&cfg)?,
            };
            output::print_output(rendered.trim_end());
            Ok(())
        }
    }
}

/// Mask plaintext tokens before printing.
fn redacted(mut cfg: Config) -> Config {
    for profile in cfg.profiles.values_mut() {
        if profile.token.is_some() {
            profile.token = Some(REDACTED.into());
        }
    }
    cfg
}

#[cfg(test)]
mod tests {
    use ledwall_config::Profile;

    use super::*;

    #[test]
    fn tokens_are_masked() {
        let mut cfg = Config::default();
        cfg.profiles.insert(
            "hall".into(),
            Profile {
                base_url: "http://10.0.0.9".into(),
                token: Some("hunter2".into()),
                ..Profile::default()
            },
        );
        let shown = redacted(cfg);
        assert_eq!(shown.profiles["hall"].token.as_deref(), Some(REDACTED));
    }
}
