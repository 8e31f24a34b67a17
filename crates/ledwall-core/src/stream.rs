// ── Reactive state stream ──
//
// Subscription type for consuming store changes.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::store::DeviceState;

/// A subscription to the device state.
///
/// Provides both point-in-time snapshot access and change notification
/// via [`changed()`](Self::changed) or by converting to a `Stream`.
pub struct StateStream {
    current: Arc<DeviceState>,
    receiver: watch::Receiver<Arc<DeviceState>>,
}

impl StateStream {
    pub(crate) fn new(receiver: watch::Receiver<Arc<DeviceState>>) -> Self {
        let current = receiver.borrow().clone();
        Self { current, receiver }
    }

    /// The snapshot captured at creation time or at the last `changed()`.
    pub fn current(&self) -> &Arc<DeviceState> {
        &self.current
    }

    /// The latest snapshot (may have changed since creation).
    pub fn latest(&self) -> Arc<DeviceState> {
        self.receiver.borrow().clone()
    }

    /// Whether an update arrived that `changed()` has not returned yet.
    pub fn has_changed(&self) -> bool {
        self.receiver.has_changed().unwrap_or(false)
    }

    /// Wait for the next change, returning the new snapshot.
    /// Returns `None` once the store has been dropped.
    pub async fn changed(&mut self) -> Option<Arc<DeviceState>> {
        self.receiver.changed().await.ok()?;
        let snap = self.receiver.borrow_and_update().clone();
        self.current = snap.clone();
        Some(snap)
    }

    /// Convert into a `Stream` for use with `StreamExt` combinators.
    ///
    /// The first item is the current snapshot.
    pub fn into_stream(self) -> StateWatchStream {
        StateWatchStream {
            inner: WatchStream::new(self.receiver),
        }
    }
}

/// `Stream` adapter backed by a `watch::Receiver`.
pub struct StateWatchStream {
    inner: WatchStream<Arc<DeviceState>>,
}

impl Stream for StateWatchStream {
    type Item = Arc<DeviceState>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use futures_util::StreamExt;

    use crate::store::Store;

    #[tokio::test]
    async fn stream_yields_current_then_changes() {
        let store = Store::new();
        let mut stream = store.subscribe().into_stream();

        let first = stream.next().await.unwrap();
        assert_eq!(first.brightness, 0);

        store.set_brightness(128);
        let second = stream.next().await.unwrap();
        assert_eq!(second.brightness, 128);
    }

    #[tokio::test]
    async fn changed_tracks_current() {
        let store = Store::new();
        let mut sub = store.subscribe();

        store.set_rotation(270);
        assert!(sub.has_changed());
        let snap = sub.changed().await.unwrap();
        assert_eq!(snap.rotation, 270);
        assert_eq!(sub.current().rotation, 270);
        assert!(!sub.has_changed());
    }

    #[test]
    fn latest_sees_updates_before_changed() {
        let store = Store::new();
        let sub = store.subscribe();

        store.set_brightness(40);
        assert_eq!(sub.current().brightness, 0);
        assert_eq!(sub.latest().brightness, 40);
        assert!(sub.has_changed());
    }

    #[test]
    fn changed_waits_for_an_update() {
        let store = Store::new();
        let mut sub = store.subscribe();
        let mut changed = tokio_test::task::spawn(sub.changed());

        tokio_test::assert_pending!(changed.poll());
        store.set_plugin(6);
        assert!(changed.is_woken());
        let snap = tokio_test::assert_ready!(changed.poll()).unwrap();
        assert_eq!(snap.plugin, 6);
    }
}
