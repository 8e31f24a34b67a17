use ledwall_api::{ConnectionState, PluginInfo, ScheduleItem};
use serde::{Serialize, Serializer};

use crate::error::CoreError;
use crate::model::{LED_COUNT, PixelIndexMap, SystemStatus};
use crate::schedule::Schedule;

/// The plugin whose pixel buffer is already in display order.
pub const DIRECT_DRAW_PLUGIN: i32 = 1;

/// Everything known about the device, plus the local schedule.
///
/// Read it through [`Store::snapshot`](super::Store::snapshot); only the
/// store writes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceState {
    pub system_status: SystemStatus,
    pub rotation: u16,
    pub brightness: u8,
    pub is_active_scheduler: bool,
    /// The device's combined rotation. Kept for wire compatibility only.
    #[serde(rename = "schedule")]
    pub legacy_schedule: Vec<ScheduleItem>,
    pub plugins: Vec<PluginInfo>,
    pub plugin: i32,
    pub index_matrix: PixelIndexMap,
    pub leds: Vec<u8>,
    pub artnet_universe: u16,
    pub build_time: Option<String>,
    pub version: Option<String>,
    #[serde(serialize_with = "serialize_connection_state")]
    pub connection_state: ConnectionState,
    #[serde(rename = "scheduler")]
    pub schedule: Schedule,
}

impl Default for DeviceState {
    fn default() -> Self {
        Self {
            system_status: SystemStatus::None,
            rotation: 0,
            brightness: 0,
            is_active_scheduler: false,
            legacy_schedule: Vec::new(),
            plugins: Vec::new(),
            plugin: DIRECT_DRAW_PLUGIN,
            index_matrix: PixelIndexMap::identity(),
            leds: vec![0; LED_COUNT],
            artnet_universe: 1,
            build_time: None,
            version: None,
            connection_state: ConnectionState::Disconnected,
            schedule: Schedule::default(),
        }
    }
}

impl DeviceState {
    /// Plugin new schedule items start with: the first in the catalog.
    pub fn default_plugin_id(&self) -> i32 {
        self.plugins
            .first()
            .map(|p| p.id)
            .filter(|&id| id != 0)
            .unwrap_or(DIRECT_DRAW_PLUGIN)
    }

    pub fn plugin_name(&self, id: i32) -> Option<&str> {
        self.plugins
            .iter()
            .find(|p| p.id == id)
            .map(|p| p.name.as_str())
    }

    /// `v<version>`, else the device build time, else nothing.
    pub fn version_label(&self) -> Option<String> {
        let present = |s: &Option<String>| s.as_deref().filter(|s| !s.is_empty()).map(str::to_owned);
        present(&self.version)
            .map(|v| format!("v{v}"))
            .or_else(|| present(&self.build_time))
    }

    /// The pixel buffer in physical display order.
    pub fn display_pixels(&self) -> Vec<u8> {
        self.index_matrix.to_display_order(&self.leds)
    }

    /// Run a structural schedule edit, refusing while the device runs it.
    pub(crate) fn edit_schedule<T>(
        &mut self,
        edit: impl FnOnce(&mut Schedule) -> Result<T, CoreError>,
    ) -> Result<T, CoreError> {
        if self.is_active_scheduler {
            return Err(CoreError::ScheduleActive);
        }
        edit(&mut self.schedule)
    }
}

fn serialize_connection_state<S: Serializer>(
    state: &ConnectionState,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(state.label())
}
