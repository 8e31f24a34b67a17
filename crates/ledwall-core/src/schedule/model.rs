use std::sync::Arc;

use ledwall_api::{ScheduleClient, ScheduleItem};
use tracing::debug;

use super::ActivationStage;
use crate::error::CoreError;
use crate::model::{DayBounds, Period, TimeOfDay};
use crate::store::{NoticeLevel, Store};

/// Schedule edits and the device commands that push and run them.
///
/// Edits touch only the store. Commands are request/response calls; a
/// failed command leaves local state as it was and publishes a notice.
#[derive(Clone)]
pub struct ScheduleModel {
    store: Arc<Store>,
    client: Arc<ScheduleClient>,
}

impl ScheduleModel {
    pub fn new(store: Arc<Store>, client: Arc<ScheduleClient>) -> Self {
        Self { store, client }
    }

    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    // ── Local edits ──────────────────────────────────────────────────

    /// Append an item for the first catalog plugin, one second long.
    pub fn add_item(&self) -> Result<usize, CoreError> {
        self.store.try_update(|state| {
            let plugin = state.default_plugin_id();
            state.edit_schedule(|schedule| Ok(schedule.add_item(plugin)))
        })
    }

    pub fn remove_item(&self, index: usize) -> Result<ScheduleItem, CoreError> {
        self.store
            .try_update(|state| state.edit_schedule(|schedule| schedule.remove_item(index)))
    }

    pub fn set_plugin_for(&self, index: usize, plugin_id: i32) -> Result<(), CoreError> {
        self.store.try_update(|state| {
            state.edit_schedule(|schedule| schedule.set_plugin_for(index, plugin_id))
        })
    }

    pub fn set_duration_for(&self, index: usize, duration: u32) -> Result<(), CoreError> {
        self.store.try_update(|state| {
            state.edit_schedule(|schedule| schedule.set_duration_for(index, duration))
        })
    }

    /// Replace a whole rotation.
    pub fn replace_items(&self, period: Period, items: Vec<ScheduleItem>) -> Result<(), CoreError> {
        self.store.try_update(|state| {
            state.edit_schedule(|schedule| schedule.replace_items(period, items))
        })
    }

    /// Change the bounds locally without pushing them.
    pub fn edit_bounds(&self, day_start: TimeOfDay, night_start: TimeOfDay) {
        let now = TimeOfDay::now();
        self.store.update(|state| {
            state
                .schedule
                .edit_bounds(DayBounds::new(day_start, night_start));
            state.schedule.refresh_period(now);
        });
    }

    // ── Device commands ──────────────────────────────────────────────

    /// Send a day rotation to the device.
    pub async fn push_day(&self, items: &[ScheduleItem]) -> Result<(), CoreError> {
        let result = self.send_rotation(Period::Day, items).await;
        self.report(&result, "Day schedule saved", "Failed to save day schedule");
        result
    }

    /// Send a night rotation to the device.
    pub async fn push_night(&self, items: &[ScheduleItem]) -> Result<(), CoreError> {
        let result = self.send_rotation(Period::Night, items).await;
        self.report(
            &result,
            "Night schedule saved",
            "Failed to save night schedule",
        );
        result
    }

    /// Send the day/night boundaries. On success they become the local
    /// bounds and device reports are followed again.
    pub async fn set_bounds(
        &self,
        day_start: TimeOfDay,
        night_start: TimeOfDay,
    ) -> Result<(), CoreError> {
        debug!(%day_start, %night_start, "pushing schedule bounds");
        let result = self
            .client
            .set_bounds(&day_start.to_string(), &night_start.to_string())
            .await
            .map_err(|e| CoreError::command("set schedule bounds", e));

        if result.is_ok() {
            let now = TimeOfDay::now();
            self.store.update(|state| {
                state
                    .schedule
                    .bounds_pushed(DayBounds::new(day_start, night_start));
                state.schedule.refresh_period(now);
            });
        }
        self.report(
            &result,
            "Schedule bounds saved",
            "Failed to save schedule bounds",
        );
        result
    }

    /// Push the local rotations, then start the schedule.
    ///
    /// Each non-empty rotation must be accepted before `start` is sent;
    /// the first failure aborts with its stage and nothing is started.
    pub async fn start(&self) -> Result<(), CoreError> {
        let mut day = Vec::new();
        let mut night = Vec::new();
        self.store.update(|state| {
            state.schedule.begin_activation();
            day = state.schedule.day().to_vec();
            night = state.schedule.night().to_vec();
        });

        let result = self.activate(&day, &night).await;
        match &result {
            Ok(()) => self.store.notify(NoticeLevel::Info, "Scheduler started"),
            Err(e) => {
                self.store.update(|state| state.schedule.abort_activation());
                self.store
                    .notify(NoticeLevel::Error, format!("Failed to start schedule: {e}"));
            }
        }
        result
    }

    /// Stop the schedule. Always sent, whatever the local phase.
    pub async fn stop(&self) -> Result<(), CoreError> {
        let result = self
            .client
            .stop()
            .await
            .map_err(|e| CoreError::command("stop schedule", e));
        if result.is_ok() {
            self.store.update(|state| state.schedule.deactivate());
        }
        self.report(
            &result,
            "Stopped schedule successfully",
            "Failed to stop schedule",
        );
        result
    }

    /// Reset the device-side schedule.
    pub async fn clear(&self) -> Result<(), CoreError> {
        let result = self
            .client
            .clear()
            .await
            .map_err(|e| CoreError::command("reset schedule", e));
        if result.is_ok() {
            self.store.update(|state| state.schedule.deactivate());
        }
        self.report(
            &result,
            "Reset schedule successfully",
            "Failed to reset schedule",
        );
        result
    }

    /// Stop if the device reports the schedule running, start otherwise.
    pub async fn toggle(&self) -> Result<(), CoreError> {
        if self.store.snapshot().is_active_scheduler {
            self.stop().await
        } else {
            self.start().await
        }
    }

    // ── Helpers ──────────────────────────────────────────────────────

    async fn activate(&self, day: &[ScheduleItem], night: &[ScheduleItem]) -> Result<(), CoreError> {
        if !day.is_empty() {
            self.send_rotation(Period::Day, day)
                .await
                .map_err(|e| aborted(ActivationStage::PushDay, &e))?;
        }
        if !night.is_empty() {
            self.send_rotation(Period::Night, night)
                .await
                .map_err(|e| aborted(ActivationStage::PushNight, &e))?;
        }
        self.client
            .start()
            .await
            .map_err(|e| aborted(ActivationStage::Start, &CoreError::command("start schedule", e)))
    }

    async fn send_rotation(&self, period: Period, items: &[ScheduleItem]) -> Result<(), CoreError> {
        if items.iter().any(|item| item.duration == 0) {
            return Err(CoreError::InvalidDuration);
        }
        debug!(%period, items = items.len(), "pushing schedule rotation");
        match period {
            Period::Day => self
                .client
                .push_day(items)
                .await
                .map_err(|e| CoreError::command("save day schedule", e)),
            Period::Night => self
                .client
                .push_night(items)
                .await
                .map_err(|e| CoreError::command("save night schedule", e)),
        }
    }

    fn report(&self, result: &Result<(), CoreError>, success: &str, failure: &str) {
        match result {
            Ok(()) => self.store.notify(NoticeLevel::Info, success),
            Err(e) => self.store.notify(NoticeLevel::Error, format!("{failure}: {e}")),
        }
    }
}

fn aborted(stage: ActivationStage, err: &CoreError) -> CoreError {
    let reason = match err {
        CoreError::CommandFailed { reason, .. } => reason.clone(),
        other => other.to_string(),
    };
    CoreError::ActivationAborted { stage, reason }
}
