// ── Device state store ──
//
// Single source of truth for device + schedule state. Every mutation is
// one `watch` update, so observers see each reconciled snapshot or
// command outcome as a single consistent change.

mod reconcile;
mod state;

use std::sync::Arc;

use ledwall_api::{ConnectionState, InfoSnapshot};
use serde::Serialize;
use strum::Display;
use tokio::sync::{broadcast, watch};

use crate::error::CoreError;
use crate::model::{Period, PixelIndexMap, TimeOfDay};
use crate::stream::StateStream;

pub use reconcile::reconcile;
pub use state::{DIRECT_DRAW_PLUGIN, DeviceState};

const NOTICE_CHANNEL_SIZE: usize = 32;

// ── Notices ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Error,
}

/// A transient, operator-facing message about a command outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

// ── Store ────────────────────────────────────────────────────────────

/// Reactive device state.
///
/// Snapshots are `Arc`s: cheap to hold, never mutated after publication.
pub struct Store {
    state: watch::Sender<Arc<DeviceState>>,
    notices: broadcast::Sender<Notice>,
}

impl Store {
    pub fn new() -> Self {
        let (state, _) = watch::channel(Arc::new(DeviceState::default()));
        let (notices, _) = broadcast::channel(NOTICE_CHANNEL_SIZE);
        Self { state, notices }
    }

    // ── Reads ────────────────────────────────────────────────────────

    pub fn snapshot(&self) -> Arc<DeviceState> {
        self.state.borrow().clone()
    }

    /// Subscribe to state changes. One change per store update.
    pub fn subscribe(&self) -> StateStream {
        StateStream::new(self.state.subscribe())
    }

    /// Subscribe to operator notices.
    pub fn notices(&self) -> broadcast::Receiver<Notice> {
        self.notices.subscribe()
    }

    // ── Device facts ─────────────────────────────────────────────────

    /// Reconcile one `info` snapshot, mirror the device's schedule and
    /// re-derive the period, all as one update.
    pub fn apply_snapshot(&self, info: &InfoSnapshot, now: TimeOfDay) {
        self.update(|state| {
            reconcile(state, info);
            state.schedule.confirm(info);
            state.schedule.refresh_period(now);
        });
    }

    pub fn set_connection_state(&self, connection_state: ConnectionState) {
        self.state.send_if_modified(|state| {
            if state.connection_state == connection_state {
                return false;
            }
            Arc::make_mut(state).connection_state = connection_state;
            true
        });
    }

    /// Re-derive the current period. Notifies only when it flips.
    pub fn refresh_period(&self, now: TimeOfDay) {
        self.state
            .send_if_modified(|state| Arc::make_mut(state).schedule.refresh_period(now));
    }

    // ── Operator setters ─────────────────────────────────────────────
    //
    // Optimistic local echoes of fire-and-forget frames; the next
    // snapshot is authoritative.

    pub fn set_brightness(&self, brightness: u8) {
        self.update(|state| state.brightness = brightness);
    }

    pub fn set_rotation(&self, rotation: u16) {
        self.update(|state| state.rotation = rotation);
    }

    pub fn set_plugin(&self, plugin: i32) {
        self.update(|state| state.plugin = plugin);
    }

    pub fn set_artnet_universe(&self, universe: u16) {
        self.update(|state| state.artnet_universe = universe);
    }

    /// Replace the pixel index map. Must be a permutation of `0..256`.
    pub fn set_index_matrix(&self, indices: Vec<u8>) -> Result<(), CoreError> {
        let map = PixelIndexMap::from_permutation(indices)?;
        self.update(|state| state.index_matrix = map);
        Ok(())
    }

    /// Switch which period local schedule edits apply to.
    pub fn set_editing_period(&self, period: Period) {
        self.update(|state| state.schedule.set_editing(period));
    }

    // ── Internals ────────────────────────────────────────────────────

    pub(crate) fn notify(&self, level: NoticeLevel, message: impl Into<String>) {
        let notice = Notice {
            level,
            message: message.into(),
        };
        match level {
            NoticeLevel::Info => tracing::info!(message = %notice.message, "notice"),
            NoticeLevel::Error => tracing::warn!(message = %notice.message, "notice"),
        }
        // No subscribers is fine: notices are transient.
        let _ = self.notices.send(notice);
    }

    /// Apply `f` as one update and notify once.
    pub(crate) fn update(&self, f: impl FnOnce(&mut DeviceState)) {
        self.state.send_modify(|state| f(Arc::make_mut(state)));
    }

    /// Like [`update`](Self::update), but nothing is published on error.
    pub(crate) fn try_update<T>(
        &self,
        f: impl FnOnce(&mut DeviceState) -> Result<T, CoreError>,
    ) -> Result<T, CoreError> {
        let mut out = None;
        self.state.send_if_modified(|state| {
            let mut draft = DeviceState::clone(state);
            let result = f(&mut draft);
            let ok = result.is_ok();
            if ok {
                *state = Arc::new(draft);
            }
            out = Some(result);
            ok
        });
        out.unwrap_or_else(|| Err(CoreError::Internal("store update did not run".into())))
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use ledwall_api::ScheduleItem;

    use super::*;

    fn noon() -> TimeOfDay {
        TimeOfDay::new(12, 0).unwrap()
    }

    #[tokio::test]
    async fn one_notification_per_snapshot() {
        let store = Store::new();
        let mut rx = store.subscribe();

        store.apply_snapshot(
            &InfoSnapshot {
                brightness: Some(10),
                rotation: Some(90),
                plugin: Some(4),
                data: Some(vec![1; 256]),
                ..InfoSnapshot::default()
            },
            noon(),
        );

        let state = rx.changed().await.unwrap();
        assert_eq!(state.brightness, 10);
        assert_eq!(state.plugin, 4);
        assert_eq!(state.leds, vec![1; 256]);
        assert!(!rx.has_changed());
    }

    #[tokio::test]
    async fn failed_edit_publishes_nothing() {
        let store = Store::new();
        let mut rx = store.subscribe();

        let result = store.try_update(|state| {
            state.brightness = 200;
            Err::<(), _>(CoreError::ScheduleActive)
        });

        assert!(result.is_err());
        assert!(!rx.has_changed());
        assert_eq!(store.snapshot().brightness, 0);
    }

    #[test]
    fn connection_state_only_notifies_on_change() {
        let store = Store::new();
        let rx = store.subscribe();

        store.set_connection_state(ConnectionState::Disconnected);
        assert!(!rx.has_changed());

        store.set_connection_state(ConnectionState::Connected);
        assert!(rx.has_changed());
        assert!(store.snapshot().connection_state.is_connected());
    }

    #[test]
    fn index_matrix_setter_validates() {
        let store = Store::new();
        assert!(store.set_index_matrix(vec![1, 2, 3]).is_err());
        store
            .set_index_matrix((0..=u8::MAX).rev().collect())
            .unwrap();
        assert!(!store.snapshot().index_matrix.is_identity());
    }

    #[test]
    fn artnet_universe_setter() {
        let store = Store::new();
        assert_eq!(store.snapshot().artnet_universe, 1);

        let rx = store.subscribe();
        store.set_artnet_universe(7);
        assert!(rx.has_changed());
        assert_eq!(store.snapshot().artnet_universe, 7);
    }

    #[test]
    fn editing_period_switch() {
        let store = Store::new();
        store.set_editing_period(Period::Night);
        store
            .try_update(|state| state.edit_schedule(|s| Ok(s.add_item(2))))
            .unwrap();

        let snap = store.snapshot();
        assert_eq!(snap.schedule.night(), &[ScheduleItem::new(2, 1)]);
        assert!(snap.schedule.day().is_empty());
    }

    #[tokio::test]
    async fn notices_reach_subscribers() {
        let store = Store::new();
        let mut rx = store.notices();
        store.notify(NoticeLevel::Info, "Scheduler started");

        let notice = rx.recv().await.unwrap();
        assert_eq!(notice.level, NoticeLevel::Info);
        assert_eq!(notice.message, "Scheduler started");
    }
}
