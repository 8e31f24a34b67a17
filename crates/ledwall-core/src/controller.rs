// ── Controller abstraction ──
//
// Lifecycle of one device session: wires the push channel into the store
// (transport → decoder → reconciler), exposes the schedule model, and
// forwards operator frames.

use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use ledwall_api::protocol::{self, InboundFrame};
use ledwall_api::{
    ClientFrame, ConnectionState, RotateDirection, ScheduleClient, TransportConfig,
    WebSocketHandle,
};
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

use crate::config::DeviceConfig;
use crate::error::CoreError;
use crate::model::TimeOfDay;
use crate::schedule::ScheduleModel;
use crate::store::{DeviceState, Store};

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<ControllerInner>`.
#[derive(Clone)]
pub struct Controller {
    inner: Arc<ControllerInner>,
}

struct ControllerInner {
    config: DeviceConfig,
    store: Arc<Store>,
    schedule: ScheduleModel,
    /// Flips to `true` once the first snapshot has been reconciled.
    synced: watch::Sender<bool>,
    session: Mutex<Option<Session>>,
}

/// Everything owned by one `connect()` … `disconnect()` span.
struct Session {
    ws: WebSocketHandle,
    cancel: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl Controller {
    /// Create a controller. Does NOT connect; call
    /// [`connect()`](Self::connect) to start the push channel.
    pub fn new(config: DeviceConfig) -> Result<Self, CoreError> {
        let transport = TransportConfig {
            timeout: config.timeout,
            token: config.token.clone(),
        };
        let client = ScheduleClient::new(config.base_url.clone(), &transport)?;
        Ok(Self::with_schedule_client(config, client))
    }

    /// Create a controller around a pre-built command client.
    pub fn with_schedule_client(config: DeviceConfig, client: ScheduleClient) -> Self {
        let store = Arc::new(Store::new());
        let schedule = ScheduleModel::new(Arc::clone(&store), Arc::new(client));
        let (synced, _) = watch::channel(false);

        Self {
            inner: Arc::new(ControllerInner {
                config,
                store,
                schedule,
                synced,
                session: Mutex::new(None),
            }),
        }
    }

    pub fn config(&self) -> &DeviceConfig {
        &self.inner.config
    }

    pub fn store(&self) -> &Arc<Store> {
        &self.inner.store
    }

    pub fn schedule(&self) -> &ScheduleModel {
        &self.inner.schedule
    }

    pub fn snapshot(&self) -> Arc<DeviceState> {
        self.inner.store.snapshot()
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.inner.store.snapshot().connection_state
    }

    // ── Connection lifecycle ─────────────────────────────────────

    /// Start the push channel and the background tasks.
    ///
    /// Returns immediately; connecting and reconnecting happen in the
    /// background and show up as connection-state changes. Calling it
    /// while already connected is a no-op.
    pub async fn connect(&self) {
        let mut session = self.inner.session.lock().await;
        if session.is_some() {
            debug!("already connected");
            return;
        }

        // A new session is unsynced until its own first snapshot.
        self.inner.synced.send_replace(false);

        let config = &self.inner.config;
        let cancel = CancellationToken::new();
        let ws = WebSocketHandle::connect(
            config.ws_url.clone(),
            config.reconnect.clone(),
            cancel.clone(),
            config.token.clone(),
        );

        let store = Arc::clone(&self.inner.store);
        let tasks = vec![
            tokio::spawn(sync_task(
                Arc::clone(&store),
                ws.frames(),
                self.inner.synced.clone(),
                cancel.clone(),
            )),
            tokio::spawn(connection_state_task(
                Arc::clone(&store),
                ws.state_changes(),
            )),
            tokio::spawn(period_task(store, config.period_tick, cancel.clone())),
        ];

        *session = Some(Session { ws, cancel, tasks });
        info!(url = %config.ws_url, "push channel started");
    }

    /// Stop the push channel and join the background tasks.
    ///
    /// Frames already handed to [`send`](Self::send) are flushed first.
    pub async fn disconnect(&self) {
        let Some(session) = self.inner.session.lock().await.take() else {
            return;
        };
        session.cancel.cancel();
        for task in session.tasks {
            let _ = task.await;
        }
        drop(session.ws);
        debug!("disconnected");
    }

    /// Wait until the first snapshot has been reconciled.
    pub async fn wait_synced(&self, timeout: Duration) -> Result<Arc<DeviceState>, CoreError> {
        let mut synced = self.inner.synced.subscribe();
        tokio::time::timeout(timeout, synced.wait_for(|s| *s))
            .await
            .map_err(|_| CoreError::ConnectionFailed {
                url: self.inner.config.ws_url.to_string(),
                reason: format!("no device snapshot within {}s", timeout.as_secs()),
            })?
            .map_err(|_| CoreError::Internal("sync signal dropped".into()))?;
        Ok(self.snapshot())
    }

    // ── Operator frames ──────────────────────────────────────────

    /// Fire-and-forget. Dropped silently unless connected.
    pub async fn send(&self, frame: &ClientFrame) {
        match self.inner.session.lock().await.as_ref() {
            Some(session) => session.ws.send_frame(frame),
            None => debug!(?frame, "not connected, dropping frame"),
        }
    }

    pub async fn set_brightness(&self, brightness: u8) {
        self.send(&ClientFrame::Brightness { brightness }).await;
        self.inner.store.set_brightness(brightness);
    }

    /// Switch plugin. The device stops a running schedule when it gets this.
    pub async fn set_plugin(&self, plugin: i32) {
        self.send(&ClientFrame::Plugin { plugin }).await;
        self.inner.store.set_plugin(plugin);
    }

    pub async fn rotate(&self, direction: RotateDirection) {
        self.send(&ClientFrame::Rotate { direction }).await;
    }

    pub async fn persist_plugin(&self) {
        self.send(&ClientFrame::PersistPlugin).await;
    }

    /// Ask the device for an immediate snapshot.
    pub async fn request_info(&self) {
        self.send(&ClientFrame::Info).await;
    }
}

// ── Background tasks ─────────────────────────────────────────────

/// Decode every inbound frame and reconcile `info` snapshots.
async fn sync_task(
    store: Arc<Store>,
    frames: impl futures_core::Stream<Item = Arc<str>> + Send,
    synced: watch::Sender<bool>,
    cancel: CancellationToken,
) {
    let mut frames = std::pin::pin!(frames);
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            frame = frames.next() => {
                let Some(frame) = frame else { break };
                match protocol::decode(&frame) {
                    InboundFrame::Info(info) => {
                        store.apply_snapshot(&info, TimeOfDay::now());
                        synced.send_replace(true);
                    }
                    InboundFrame::Ignored => trace!("ignored frame"),
                }
            }
        }
    }
}

/// Mirror transport state into the store until the transport is gone.
async fn connection_state_task(store: Arc<Store>, mut states: watch::Receiver<ConnectionState>) {
    loop {
        let state = *states.borrow_and_update();
        store.set_connection_state(state);
        if states.changed().await.is_err() {
            break;
        }
    }
    store.set_connection_state(ConnectionState::Disconnected);
}

/// Keep the current period in step with the wall clock.
async fn period_task(store: Arc<Store>, tick: Duration, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(tick.max(Duration::from_secs(1)));
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => store.refresh_period(TimeOfDay::now()),
        }
    }
}
