//! Clap derive structures for the `ledwall` CLI.
//!
//! Defines the command tree, global flags, and shared argument types.

use clap::{Args, Parser, Subcommand, ValueEnum};
use ledwall_core::{RotateDirection, ScheduleItem, TimeOfDay};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// ledwall -- control an LED wall from the command line
#[derive(Debug, Parser)]
#[command(
    name = "ledwall",
    version,
    about = "Control an LED wall from the command line",
    long_about = "Drive an LED wall panel: watch its live state over the push\n\
        channel, send brightness/plugin/rotation frames, and manage the\n\
        day/night plugin schedule.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Device profile to use
    #[arg(long, short = 'p', env = "LEDWALL_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Device base URL for commands (overrides profile)
    #[arg(long, short = 'u', env = "LEDWALL_BASE_URL", global = true)]
    pub base_url: Option<String>,

    /// Push-channel URL (default: derived from the base URL)
    #[arg(long, env = "LEDWALL_WS_URL", global = true)]
    pub ws_url: Option<String>,

    /// Device token
    #[arg(long, env = "LEDWALL_TOKEN", global = true, hide_env_values = true)]
    pub token: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "LEDWALL_OUTPUT",
        default_value = "plain",
        global = true
    )]
    pub output: OutputFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Request and sync timeout in seconds
    #[arg(long, env = "LEDWALL_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    Plain,
    /// Pretty-printed JSON
    Json,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Connect, wait for the first device snapshot, and print it
    #[command(alias = "st")]
    Status,

    /// Stream device state changes until interrupted
    Watch,

    /// Set panel brightness
    Brightness {
        /// Brightness level
        #[arg(value_parser = clap::value_parser!(u8))]
        level: u8,
    },

    /// Switch the active plugin (stops a running schedule)
    Plugin {
        /// Plugin id
        id: i32,

        /// Ask the device to keep this plugin across restarts
        #[arg(long)]
        persist: bool,
    },

    /// Rotate the panel by 90 degrees
    Rotate {
        direction: RotateArg,
    },

    /// Manage the day/night schedule
    #[command(alias = "sched")]
    Schedule(ScheduleArgs),

    /// Inspect configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum RotateArg {
    Left,
    Right,
}

impl From<RotateArg> for RotateDirection {
    fn from(arg: RotateArg) -> Self {
        match arg {
            RotateArg::Left => Self::Left,
            RotateArg::Right => Self::Right,
        }
    }
}

// ── Schedule ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ScheduleArgs {
    #[command(subcommand)]
    pub command: ScheduleCommand,
}

#[derive(Debug, Subcommand)]
pub enum ScheduleCommand {
    /// Push the given rotations and start the schedule
    ///
    /// Each list is only pushed when given and non-empty. Nothing starts
    /// if a push fails.
    Start {
        /// Day rotation, e.g. `2:30,5:60` (plugin id : seconds)
        #[arg(long, value_delimiter = ',', value_parser = parse_item)]
        day: Vec<ScheduleItem>,

        /// Night rotation, same format as --day
        #[arg(long, value_delimiter = ',', value_parser = parse_item)]
        night: Vec<ScheduleItem>,
    },

    /// Stop the schedule
    Stop,

    /// Reset the schedule on the device
    Clear,

    /// Set when day and night begin
    Bounds {
        /// Day start, HH:MM
        day_start: TimeOfDay,
        /// Night start, HH:MM
        night_start: TimeOfDay,
    },

    /// Replace the day rotation on the device
    PushDay {
        /// Items as `ID:SECS`; none clears the rotation
        #[arg(value_delimiter = ',', value_parser = parse_item)]
        items: Vec<ScheduleItem>,
    },

    /// Replace the night rotation on the device
    PushNight {
        /// Items as `ID:SECS`; none clears the rotation
        #[arg(value_delimiter = ',', value_parser = parse_item)]
        items: Vec<ScheduleItem>,
    },
}

/// Parse `ID:SECS` into a schedule item. Zero-second items are refused.
pub fn parse_item(s: &str) -> Result<ScheduleItem, String> {
    let (id, secs) = s
        .split_once(':')
        .ok_or_else(|| format!("expected ID:SECS, got '{s}'"))?;
    let plugin_id: i32 = id
        .trim()
        .parse()
        .map_err(|_| format!("invalid plugin id '{id}'"))?;
    let duration: u32 = secs
        .trim()
        .parse()
        .map_err(|_| format!("invalid duration '{secs}'"))?;
    if duration == 0 {
        return Err(format!("duration must be at least 1 second in '{s}'"));
    }
    Ok(ScheduleItem::new(plugin_id, duration))
}

// ── Config / completions ─────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the config file path
    Path,
    /// Print the effective configuration (tokens redacted)
    Show,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
