//! Output formatting: plain text or JSON.
//!
//! Plain output is colored when stdout is a terminal and `NO_COLOR` is
//! unset. JSON output is meant for scripting and is never colored.

use std::io::{self, IsTerminal, Write};

use ledwall_core::{DeviceState, Notice, ScheduleItem, TimeOfDay};
use owo_colors::OwoColorize;
use serde::Serialize;

use crate::cli::OutputFormat;
use crate::error::CliError;

// ── Color helpers ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
pub struct Palette {
    color: bool,
}

impl Palette {
    pub fn detect() -> Self {
        Self {
            color: io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none(),
        }
    }

    pub const fn plain() -> Self {
        Self { color: false }
    }

    fn label(self, s: &str) -> String {
        if self.color {
            s.bold().to_string()
        } else {
            s.to_owned()
        }
    }

    fn good(self, s: &str) -> String {
        if self.color {
            s.green().to_string()
        } else {
            s.to_owned()
        }
    }

    fn bad(self, s: &str) -> String {
        if self.color {
            s.red().to_string()
        } else {
            s.to_owned()
        }
    }

    fn dim(self, s: &str) -> String {
        if self.color {
            s.dimmed().to_string()
        } else {
            s.to_owned()
        }
    }
}

// ── Renderers ───────────────────────────────────────────────────────

/// Full snapshot, for `status`.
pub fn render_state(
    format: OutputFormat,
    state: &DeviceState,
    palette: Palette,
) -> Result<String, CliError> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(state)?),
        OutputFormat::Plain => Ok(state_detail(state, palette)),
    }
}

/// One line per observed change, for `watch`.
pub fn render_change(
    format: OutputFormat,
    state: &DeviceState,
    palette: Palette,
) -> Result<String, CliError> {
    let summary = Summary::from(state);
    match format {
        OutputFormat::Json => Ok(serde_json::to_string(&summary)?),
        OutputFormat::Plain => {
            let connection = if state.connection_state.is_connected() {
                palette.good(summary.connection)
            } else {
                palette.bad(summary.connection)
            };
            Ok(format!(
                "{} {connection} brightness={} plugin={} rotation={} schedule={} period={}",
                palette.dim(&TimeOfDay::now().to_string()),
                summary.brightness,
                summary.plugin,
                summary.rotation,
                summary.schedule,
                summary.period,
            ))
        }
    }
}

/// Operator notice from a schedule command.
pub fn render_notice(format: OutputFormat, notice: &Notice) -> Result<String, CliError> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string(notice)?),
        OutputFormat::Plain => Ok(notice.message.clone()),
    }
}

pub fn print_output(output: &str) {
    if output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

// ── Plain detail view ───────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct Summary<'a> {
    connection: &'a str,
    status: String,
    brightness: u8,
    plugin: i32,
    rotation: u16,
    schedule: &'static str,
    period: String,
}

impl<'a> From<&'a DeviceState> for Summary<'a> {
    fn from(state: &'a DeviceState) -> Self {
        Self {
            connection: state.connection_state.label(),
            status: state.system_status.to_string(),
            brightness: state.brightness,
            plugin: state.plugin,
            rotation: state.rotation,
            schedule: if state.is_active_scheduler {
                "active"
            } else {
                "idle"
            },
            period: state.schedule.current_period().to_string(),
        }
    }
}

fn state_detail(state: &DeviceState, palette: Palette) -> String {
    let plugin = match state.plugin_name(state.plugin) {
        Some(name) => format!("{name} ({})", state.plugin),
        None => state.plugin.to_string(),
    };
    let schedule = if state.is_active_scheduler {
        palette.good("active")
    } else {
        palette.dim("idle")
    };
    let bounds = state.schedule.bounds();

    let rows = [
        ("Connection", state.connection_state.label().to_owned()),
        ("Status", state.system_status.to_string()),
        ("Plugin", plugin),
        ("Brightness", state.brightness.to_string()),
        ("Rotation", format!("{}°", state.rotation)),
        ("Schedule", schedule),
        (
            "Period",
            format!(
                "{} (day {}, night {})",
                state.schedule.current_period(),
                bounds.day_start,
                bounds.night_start
            ),
        ),
        ("Day", rotation_line(state, state.schedule.day())),
        ("Night", rotation_line(state, state.schedule.night())),
        (
            "Plugins",
            state
                .plugins
                .iter()
                .map(|p| format!("{}={}", p.id, p.name))
                .collect::<Vec<_>>()
                .join(", "),
        ),
        (
            "Firmware",
            state.version_label().unwrap_or_else(|| "unknown".into()),
        ),
    ];

    rows.iter()
        .map(|(label, value)| format!("{}{value}", palette.label(&format!("{label:<11}"))))
        .collect::<Vec<_>>()
        .join("\n")
}

fn rotation_line(state: &DeviceState, items: &[ScheduleItem]) -> String {
    if items.is_empty() {
        return "-".into();
    }
    items
        .iter()
        .map(|item| {
            let name = state
                .plugin_name(item.plugin_id)
                .map_or_else(|| item.plugin_id.to_string(), str::to_owned);
            format!("{name} {}s", item.duration)
        })
        .collect::<Vec<_>>()
        .join(" → ")
}
