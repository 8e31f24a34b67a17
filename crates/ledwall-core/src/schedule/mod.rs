// ── Day/night schedule ──
//
// `Schedule` is the pure in-memory half: the two rotations, the period
// bounds, which period is being edited and where activation stands.
// `ScheduleModel` is the command half that talks to the device.

mod model;

use ledwall_api::{InfoSnapshot, ScheduleItem};
use serde::Serialize;
use strum::Display;

use crate::error::CoreError;
use crate::model::{DayBounds, Period, TimeOfDay};

pub use model::ScheduleModel;

/// Where the schedule stands from this client's point of view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SchedulePhase {
    /// Editable.
    #[default]
    Idle,
    /// `start` succeeded locally; waiting for the device to report it active.
    Activating,
    /// The device reports the schedule running.
    Active,
}

/// The step of `start` that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ActivationStage {
    #[strum(serialize = "day push")]
    PushDay,
    #[strum(serialize = "night push")]
    PushNight,
    #[strum(serialize = "start")]
    Start,
}

/// Two independent rotations plus the bounds that pick between them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    day: Vec<ScheduleItem>,
    night: Vec<ScheduleItem>,
    bounds: DayBounds,
    /// Local bound edit not yet accepted by the device.
    #[serde(skip)]
    bounds_dirty: bool,
    editing: Period,
    current_period: Period,
    phase: SchedulePhase,
}

impl Schedule {
    // ── Accessors ────────────────────────────────────────────────────

    pub fn day(&self) -> &[ScheduleItem] {
        &self.day
    }

    pub fn night(&self) -> &[ScheduleItem] {
        &self.night
    }

    pub fn items(&self, period: Period) -> &[ScheduleItem] {
        match period {
            Period::Day => &self.day,
            Period::Night => &self.night,
        }
    }

    pub fn bounds(&self) -> DayBounds {
        self.bounds
    }

    pub fn has_unpushed_bounds(&self) -> bool {
        self.bounds_dirty
    }

    /// The period local edits apply to.
    pub fn editing(&self) -> Period {
        self.editing
    }

    pub fn current_period(&self) -> Period {
        self.current_period
    }

    pub fn phase(&self) -> SchedulePhase {
        self.phase
    }

    // ── Local edits ──────────────────────────────────────────────────
    //
    // Only reachable through `DeviceState::edit_schedule`, which refuses
    // while the device reports the schedule active.

    pub(crate) fn set_editing(&mut self, period: Period) {
        self.editing = period;
    }

    fn editing_items_mut(&mut self) -> &mut Vec<ScheduleItem> {
        match self.editing {
            Period::Day => &mut self.day,
            Period::Night => &mut self.night,
        }
    }

    fn item_mut(&mut self, index: usize) -> Result<&mut ScheduleItem, CoreError> {
        let period = self.editing;
        let items = self.editing_items_mut();
        let len = items.len();
        items
            .get_mut(index)
            .ok_or(CoreError::IndexOutOfRange { period, index, len })
    }

    /// Append a one-second item. Returns its index.
    pub(crate) fn add_item(&mut self, plugin_id: i32) -> usize {
        let items = self.editing_items_mut();
        items.push(ScheduleItem::new(plugin_id, 1));
        items.len() - 1
    }

    pub(crate) fn remove_item(&mut self, index: usize) -> Result<ScheduleItem, CoreError> {
        let period = self.editing;
        let items = self.editing_items_mut();
        if index >= items.len() {
            return Err(CoreError::IndexOutOfRange {
                period,
                index,
                len: items.len(),
            });
        }
        Ok(items.remove(index))
    }

    pub(crate) fn set_plugin_for(&mut self, index: usize, plugin_id: i32) -> Result<(), CoreError> {
        self.item_mut(index)?.plugin_id = plugin_id;
        Ok(())
    }

    pub(crate) fn set_duration_for(&mut self, index: usize, duration: u32) -> Result<(), CoreError> {
        if duration == 0 {
            return Err(CoreError::InvalidDuration);
        }
        self.item_mut(index)?.duration = duration;
        Ok(())
    }

    /// Replace a whole rotation at once.
    pub(crate) fn replace_items(
        &mut self,
        period: Period,
        items: Vec<ScheduleItem>,
    ) -> Result<(), CoreError> {
        if items.iter().any(|item| item.duration == 0) {
            return Err(CoreError::InvalidDuration);
        }
        match period {
            Period::Day => self.day = items,
            Period::Night => self.night = items,
        }
        Ok(())
    }

    /// Edit bounds locally. Device reports stop overriding them until pushed.
    pub(crate) fn edit_bounds(&mut self, bounds: DayBounds) {
        self.bounds = bounds;
        self.bounds_dirty = true;
    }

    // ── Command outcomes ─────────────────────────────────────────────

    pub(crate) fn bounds_pushed(&mut self, bounds: DayBounds) {
        self.bounds = bounds;
        self.bounds_dirty = false;
    }

    pub(crate) fn begin_activation(&mut self) {
        self.phase = SchedulePhase::Activating;
    }

    pub(crate) fn abort_activation(&mut self) {
        if self.phase == SchedulePhase::Activating {
            self.phase = SchedulePhase::Idle;
        }
    }

    pub(crate) fn deactivate(&mut self) {
        self.phase = SchedulePhase::Idle;
    }

    // ── Device confirmation ──────────────────────────────────────────

    /// Mirror what the device reports about its schedule.
    ///
    /// A running schedule belongs to the device, so its rotations replace
    /// the local ones. Bounds follow the device unless a local edit is
    /// still unpushed.
    pub(crate) fn confirm(&mut self, info: &InfoSnapshot) {
        match info.schedule_active {
            Some(true) => {
                self.phase = SchedulePhase::Active;
                if let Some(day) = &info.schedule_day {
                    self.day.clone_from(day);
                }
                if let Some(night) = &info.schedule_night {
                    self.night.clone_from(night);
                }
            }
            Some(false) if self.phase == SchedulePhase::Active => {
                self.phase = SchedulePhase::Idle;
            }
            _ => {}
        }

        if !self.bounds_dirty {
            if let Some(day_start) = parse_bound(info.day_start.as_deref()) {
                self.bounds.day_start = day_start;
            }
            if let Some(night_start) = parse_bound(info.night_start.as_deref()) {
                self.bounds.night_start = night_start;
            }
        }
    }

    /// Re-derive the current period. Returns `true` if it changed.
    pub(crate) fn refresh_period(&mut self, now: TimeOfDay) -> bool {
        let period = self.bounds.period_at(now);
        let changed = period != self.current_period;
        self.current_period = period;
        changed
    }
}

fn parse_bound(raw: Option<&str>) -> Option<TimeOfDay> {
    let raw = raw?;
    match raw.parse() {
        Ok(time) => Some(time),
        Err(e) => {
            tracing::warn!(error = %e, "Ignoring malformed schedule bound from device");
            None
        }
    }
}
