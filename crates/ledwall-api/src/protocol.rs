//! Wire shapes for the device push channel.
//!
//! Every frame is a JSON object tagged by its `event` field. Inbound
//! frames decode into [`InboundFrame`]; anything that fails to parse or
//! carries an unknown tag decodes to [`InboundFrame::Ignored`] so a bad
//! frame can never take the session down.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

// ── Shared item types ────────────────────────────────────────────────

/// One step of a plugin rotation: show `plugin_id` for `duration` seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleItem {
    pub plugin_id: i32,
    pub duration: u32,
}

impl ScheduleItem {
    pub fn new(plugin_id: i32, duration: u32) -> Self {
        Self {
            plugin_id,
            duration,
        }
    }
}

/// A plugin the device can run. Only identity matters on this side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginInfo {
    pub id: i32,
    pub name: String,
}

// ── Inbound ──────────────────────────────────────────────────────────

/// A decoded push-channel frame.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum InboundFrame {
    /// Device state snapshot.
    Info(Box<InfoSnapshot>),
    /// Unknown tag, or a frame that failed to decode.
    #[serde(other)]
    Ignored,
}

/// A (possibly partial) device state snapshot.
///
/// Every field is optional: the device omits expensive fields such as the
/// pixel buffer on ticks where they did not change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InfoSnapshot {
    /// Index into the device's status table.
    pub status: Option<u32>,
    pub rotation: Option<u16>,
    pub brightness: Option<u8>,
    pub schedule_active: Option<bool>,
    /// Active rotation for the current period (legacy combined list).
    pub schedule: Option<Vec<ScheduleItem>>,
    pub schedule_day: Option<Vec<ScheduleItem>>,
    pub schedule_night: Option<Vec<ScheduleItem>>,
    /// `HH:MM`
    pub day_start: Option<String>,
    /// `HH:MM`
    pub night_start: Option<String>,
    pub current_period: Option<String>,
    pub plugins: Option<Vec<PluginInfo>>,
    /// Active plugin id; the device reports `-1` when nothing runs.
    pub plugin: Option<i32>,
    pub build_time: Option<String>,
    pub version: Option<String>,
    /// Pixel buffer, one brightness byte per LED.
    pub data: Option<Vec<u8>>,
}

/// Decode a raw text frame. Never fails.
pub fn decode(text: &str) -> InboundFrame {
    match serde_json::from_str(text) {
        Ok(frame) => frame,
        Err(e) => {
            tracing::debug!(error = %e, "Discarding undecodable frame");
            InboundFrame::Ignored
        }
    }
}

// ── Outbound ─────────────────────────────────────────────────────────

/// Direction for the `rotate` operator frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum RotateDirection {
    Left,
    Right,
}

/// Fire-and-forget operator frames sent over the push channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum ClientFrame {
    /// Ask the device for an immediate snapshot.
    Info,
    Brightness { brightness: u8 },
    /// Switch plugin. The device stops a running schedule when it gets this.
    Plugin { plugin: i32 },
    Rotate { direction: RotateDirection },
    /// Persist the active plugin across device reboots.
    PersistPlugin,
}

impl ClientFrame {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Credential frame. Kept apart from [`ClientFrame`] so the token never
/// shows up in `Debug` output.
#[derive(Serialize)]
struct AuthFrame<'a> {
    event: &'static str,
    token: &'a str,
}

pub(crate) fn auth_frame(token: &str) -> Result<String, serde_json::Error> {
    serde_json::to_string(&AuthFrame {
        event: "auth",
        token,
    })
}
