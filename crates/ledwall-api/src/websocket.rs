//! Push-channel transport with auto-reconnect.
//!
//! Connects to the device's WebSocket endpoint and fans inbound text
//! frames out through a [`tokio::sync::broadcast`] channel. Handles
//! reconnection with exponential backoff + jitter automatically, sends the
//! credential frame first on every (re)connect, and publishes a four-state
//! [`ConnectionState`] through a `watch` channel.
//!
//! # Example
//!
//! ```rust,ignore
//! use futures_util::StreamExt;
//! use ledwall_api::websocket::{ReconnectConfig, WebSocketHandle};
//! use tokio_util::sync::CancellationToken;
//! use url::Url;
//!
//! let cancel = CancellationToken::new();
//! let ws_url = Url::parse("ws://192.168.1.50/ws")?;
//!
//! let handle = WebSocketHandle::connect(ws_url, ReconnectConfig::default(), cancel, None);
//! let mut frames = std::pin::pin!(handle.frames());
//!
//! while let Some(frame) = frames.next().await {
//!     println!("{frame}");
//! }
//! ```

use std::sync::Arc;
use std::time::Duration;

use futures_core::Stream;
use futures_util::{SinkExt, StreamExt};
use secrecy::SecretString;
use strum::Display;
use tokio::sync::{broadcast, mpsc, watch};
use tokio_tungstenite::tungstenite::{self, ClientRequestBuilder};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::Error;
use crate::protocol::{ClientFrame, auth_frame};
use crate::transport::non_empty;

// ── Channel capacities ───────────────────────────────────────────────

const FRAME_CHANNEL_CAPACITY: usize = 256;
const OUTBOUND_CHANNEL_CAPACITY: usize = 64;

// ── ConnectionState ──────────────────────────────────────────────────

/// Push-channel connection state.
///
/// Mirrors the WebSocket ready-state indices (0..=3). Only the transport
/// writes it; everyone else observes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ConnectionState {
    Connecting,
    Connected,
    Disconnecting,
    Disconnected,
}

impl ConnectionState {
    const TABLE: [Self; 4] = [
        Self::Connecting,
        Self::Connected,
        Self::Disconnecting,
        Self::Disconnected,
    ];

    /// The WebSocket ready-state index for this state.
    pub fn ready_state(self) -> u8 {
        match self {
            Self::Connecting => 0,
            Self::Connected => 1,
            Self::Disconnecting => 2,
            Self::Disconnected => 3,
        }
    }

    /// Map a ready-state index back to a state. Out-of-range is `None`.
    pub fn from_ready_state(index: u8) -> Option<Self> {
        Self::TABLE.get(usize::from(index)).copied()
    }

    /// Human-readable label, e.g. for a status line.
    pub fn label(self) -> &'static str {
        match self {
            Self::Connecting => "Connecting",
            Self::Connected => "Connected",
            Self::Disconnecting => "Disconnecting",
            Self::Disconnected => "Disconnected",
        }
    }

    pub fn is_connected(self) -> bool {
        self == Self::Connected
    }
}

// ── ReconnectConfig ──────────────────────────────────────────────────

/// Exponential backoff configuration for WebSocket reconnection.
///
/// Retries are unbounded: the device is expected to come back.
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Delay before the first reconnection attempt. Default: 1s.
    pub initial_delay: Duration,

    /// Upper bound on backoff delay. Default: 30s.
    pub max_delay: Duration,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
        }
    }
}

// ── WebSocketHandle ──────────────────────────────────────────────────

/// Handle to a running push-channel connection.
///
/// Owns one logical connection at a time. Call
/// [`shutdown`](Self::shutdown) to tear down the background task.
pub struct WebSocketHandle {
    frame_tx: broadcast::Sender<Arc<str>>,
    outbound_tx: mpsc::Sender<String>,
    state_rx: watch::Receiver<ConnectionState>,
    cancel: CancellationToken,
}

impl WebSocketHandle {
    /// Spawn the reconnection loop.
    ///
    /// Returns immediately; the first connection attempt happens in the
    /// background. If `token` is set and non-empty, each successful
    /// connect sends `{"event":"auth","token":...}` before any other frame.
    pub fn connect(
        ws_url: Url,
        reconnect: ReconnectConfig,
        cancel: CancellationToken,
        token: Option<SecretString>,
    ) -> Self {
        let (frame_tx, _) = broadcast::channel(FRAME_CHANNEL_CAPACITY);
        let (outbound_tx, outbound_rx) = mpsc::channel(OUTBOUND_CHANNEL_CAPACITY);
        let (state_tx, state_rx) = watch::channel(ConnectionState::Disconnected);

        let link = Link {
            url: ws_url,
            token,
            frame_tx: frame_tx.clone(),
            state_tx,
            outbound_rx,
            cancel: cancel.clone(),
        };
        tokio::spawn(ws_loop(link, reconnect));

        Self {
            frame_tx,
            outbound_tx,
            state_rx,
            cancel,
        }
    }

    /// The connection state right now.
    pub fn current_state(&self) -> ConnectionState {
        *self.state_rx.borrow()
    }

    /// Observe connection state transitions.
    pub fn state_changes(&self) -> watch::Receiver<ConnectionState> {
        self.state_rx.clone()
    }

    /// Get a raw broadcast receiver for inbound text frames.
    ///
    /// If a consumer falls behind, it receives
    /// [`broadcast::error::RecvError::Lagged`].
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<str>> {
        self.frame_tx.subscribe()
    }

    /// Inbound text frames as one logical stream spanning every reconnect.
    ///
    /// Lagging is logged and skipped, never surfaced. The stream only ends
    /// once the handle has been shut down and dropped.
    pub fn frames(&self) -> impl Stream<Item = Arc<str>> + Send + 'static {
        let mut rx = self.frame_tx.subscribe();
        async_stream::stream! {
            loop {
                match rx.recv().await {
                    Ok(frame) => yield frame,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Frame subscriber lagged, resuming");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    /// Fire-and-forget send. Silently dropped unless connected.
    pub fn send(&self, payload: String) {
        if !self.current_state().is_connected() {
            tracing::debug!("Not connected, dropping outbound frame");
            return;
        }
        if let Err(e) = self.outbound_tx.try_send(payload) {
            tracing::warn!(error = %e, "Outbound queue unavailable, dropping frame");
        }
    }

    /// Serialize and send an operator frame.
    pub fn send_frame(&self, frame: &ClientFrame) {
        match frame.to_json() {
            Ok(payload) => self.send(payload),
            Err(e) => tracing::warn!(error = %e, ?frame, "Could not serialize frame"),
        }
    }

    /// Signal the background task to shut down gracefully.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

// ── Background reconnection loop ─────────────────────────────────────

/// Everything the background task owns across reconnects.
struct Link {
    url: Url,
    token: Option<SecretString>,
    frame_tx: broadcast::Sender<Arc<str>>,
    state_tx: watch::Sender<ConnectionState>,
    outbound_rx: mpsc::Receiver<String>,
    cancel: CancellationToken,
}

impl Link {
    fn set_state(&self, state: ConnectionState) {
        self.state_tx.send_if_modified(|current| {
            let changed = *current != state;
            *current = state;
            changed
        });
    }
}

/// Main loop: connect → read → on drop, backoff → reconnect. Forever.
async fn ws_loop(mut link: Link, reconnect: ReconnectConfig) {
    let mut attempt: u32 = 0;

    loop {
        link.set_state(ConnectionState::Connecting);

        match connect_and_run(&mut link).await {
            Ok(Session::Established) => {
                tracing::info!("WebSocket disconnected, reconnecting");
                attempt = 0;
            }
            Ok(Session::Cancelled) => break,
            Err(e) => {
                tracing::warn!(error = %e, attempt, "WebSocket error");
            }
        }
        link.set_state(ConnectionState::Disconnected);

        let delay = calculate_backoff(attempt, &reconnect);
        tracing::info!(
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            attempt,
            "Waiting before reconnect"
        );

        tokio::select! {
            biased;
            () = link.cancel.cancelled() => break,
            () = tokio::time::sleep(delay) => {}
        }

        attempt = attempt.saturating_add(1);
    }

    link.set_state(ConnectionState::Disconnected);
    tracing::debug!("WebSocket loop exiting");
}

// ── Single connection lifecycle ──────────────────────────────────────

/// How a connection that did open came to an end.
enum Session {
    /// Opened, then dropped by the peer or the network.
    Established,
    /// Closed because shutdown was requested.
    Cancelled,
}

/// Establish a single WebSocket connection and pump it until it drops.
async fn connect_and_run(link: &mut Link) -> Result<Session, Error> {
    tracing::info!(url = %link.url, "Connecting to WebSocket");

    let uri: tungstenite::http::Uri = link
        .url
        .as_str()
        .parse()
        .map_err(|e: tungstenite::http::uri::InvalidUri| Error::WebSocketConnect(e.to_string()))?;

    let (ws_stream, _response) = tokio::select! {
        biased;
        () = link.cancel.cancelled() => return Ok(Session::Cancelled),
        connected = tokio_tungstenite::connect_async(ClientRequestBuilder::new(uri)) => {
            connected.map_err(|e| Error::WebSocketConnect(e.to_string()))?
        }
    };

    let (mut write, mut read) = ws_stream.split();

    // Anything queued while we were away belongs to the previous session.
    while link.outbound_rx.try_recv().is_ok() {}

    if let Some(payload) = non_empty(link.token.as_ref()).and_then(|t| match auth_frame(t) {
        Ok(payload) => Some(payload),
        Err(e) => {
            tracing::warn!(error = %e, "Could not build auth frame, continuing unauthenticated");
            None
        }
    }) {
        write
            .send(tungstenite::Message::text(payload))
            .await
            .map_err(|e| Error::WebSocketConnect(e.to_string()))?;
        tracing::debug!("Auth frame sent");
    }

    link.set_state(ConnectionState::Connected);
    tracing::info!("WebSocket connected");

    loop {
        tokio::select! {
            biased;
            () = link.cancel.cancelled() => {
                link.set_state(ConnectionState::Disconnecting);
                // Frames queued before shutdown still go out.
                while let Ok(payload) = link.outbound_rx.try_recv() {
                    if let Err(e) = write.send(tungstenite::Message::text(payload)).await {
                        tracing::debug!(error = %e, "Pending frame not delivered");
                        break;
                    }
                }
                if let Err(e) = write.send(tungstenite::Message::Close(None)).await {
                    tracing::debug!(error = %e, "Close frame not delivered");
                }
                return Ok(Session::Cancelled);
            }
            Some(payload) = link.outbound_rx.recv() => {
                if let Err(e) = write.send(tungstenite::Message::text(payload)).await {
                    return Err(Error::WebSocketConnect(e.to_string()));
                }
            }
            frame = read.next() => {
                match frame {
                    Some(Ok(tungstenite::Message::Text(text))) => {
                        // Ignore send errors -- just means no active subscribers right now
                        let _ = link.frame_tx.send(Arc::from(text.as_str()));
                    }
                    Some(Ok(tungstenite::Message::Ping(_))) => {
                        // tungstenite handles pong replies automatically
                        tracing::trace!("WebSocket ping");
                    }
                    Some(Ok(tungstenite::Message::Close(frame))) => {
                        link.set_state(ConnectionState::Disconnecting);
                        if let Some(ref cf) = frame {
                            tracing::info!(
                                code = %cf.code,
                                reason = cf.reason.as_str(),
                                "WebSocket close frame received"
                            );
                        } else {
                            tracing::info!("WebSocket close frame received (no payload)");
                        }
                        return Ok(Session::Established);
                    }
                    Some(Err(e)) => {
                        tracing::warn!(error = %e, "WebSocket read failed");
                        return Ok(Session::Established);
                    }
                    None => {
                        tracing::info!("WebSocket stream ended");
                        return Ok(Session::Established);
                    }
                    Some(Ok(_)) => {
                        // Binary, Pong, Frame -- ignore
                    }
                }
            }
        }
    }
}

// ── Backoff calculation ──────────────────────────────────────────────

/// Exponential backoff with jitter.
///
/// `delay = min(initial * 2^attempt, max) + jitter`
///
/// Jitter is +-25% to spread out reconnection storms from multiple clients.
#[allow(clippy::cast_precision_loss, clippy::as_conversions)]
fn calculate_backoff(attempt: u32, config: &ReconnectConfig) -> Duration {
    let exponent = i32::try_from(attempt.min(30)).unwrap_or(30);
    let base = config.initial_delay.as_secs_f64() * 2.0_f64.powi(exponent);
    let capped = base.min(config.max_delay.as_secs_f64());

    // Deterministic "jitter" seeded from the attempt number.
    let jitter_factor = 1.0 + 0.25 * ((f64::from(attempt) * 7.3).sin());
    let with_jitter = (capped * jitter_factor).max(0.0);

    Duration::from_secs_f64(with_jitter)
}

// ── Tests ────────────────────────────────────────────────────────────
