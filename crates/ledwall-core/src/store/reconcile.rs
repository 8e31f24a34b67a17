// Sparse merge of device snapshots into the store.
//
// Fields absent from a snapshot keep their previous value. The local
// day/night rotations are never touched here; see `Schedule::confirm`.

use ledwall_api::InfoSnapshot;
use tracing::warn;

use super::state::{DIRECT_DRAW_PLUGIN, DeviceState};
use crate::model::{PixelIndexMap, SystemStatus};

/// Merge one `info` snapshot into `state`.
pub fn reconcile(state: &mut DeviceState, info: &InfoSnapshot) {
    if let Some(index) = info.status {
        match SystemStatus::from_index(index) {
            Ok(status) => state.system_status = status,
            Err(e) => warn!(error = %e, "Keeping previous system status"),
        }
    }

    if let Some(rotation) = info.rotation {
        state.rotation = rotation;
    }
    if let Some(brightness) = info.brightness {
        state.brightness = brightness;
    }
    if let Some(active) = info.schedule_active {
        state.is_active_scheduler = active;
    }

    if let Some(schedule) = &info.schedule {
        state.legacy_schedule.clone_from(schedule);
    }

    // First population wins: the catalog does not change at runtime.
    if state.plugins.is_empty() {
        if let Some(plugins) = &info.plugins {
            state.plugins.clone_from(plugins);
        }
    }

    if let Some(plugin) = info.plugin.filter(|&p| p != 0) {
        state.plugin = plugin;
    }

    // Empty strings mean "not built in" and never replace a known value.
    if let Some(build_time) = info.build_time.as_ref().filter(|s| !s.is_empty()) {
        state.build_time = Some(build_time.clone());
    }
    if let Some(version) = info.version.as_ref().filter(|s| !s.is_empty()) {
        state.version = Some(version.clone());
    }

    if state.plugin == DIRECT_DRAW_PLUGIN && !state.index_matrix.is_identity() {
        state.index_matrix = PixelIndexMap::identity();
    }

    if let Some(data) = &info.data {
        state.leds.clone_from(data);
    }
}
