// Controller sessions against a local websocket device.
#![allow(clippy::unwrap_used)]

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use ledwall_api::ReconnectConfig;
use ledwall_core::{ConnectionState, Controller, DeviceConfig, SystemStatus};
use secrecy::SecretString;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;
use url::Url;

const WAIT: Duration = Duration::from_secs(5);

/// Fake device. Connection `n` gets `pushes[n]` after the client's first
/// frame; every connection but the last is closed afterwards. Every text
/// frame the device receives is reported as `(connection, json)`.
async fn spawn_device(pushes: Vec<Value>) -> (Url, mpsc::UnboundedReceiver<(usize, Value)>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        let last = pushes.len() - 1;
        for (conn, push) in pushes.into_iter().enumerate() {
            let Ok((stream, _)) = listener.accept().await else {
                return;
            };
            let mut ws = accept_async(stream).await.unwrap();

            if let Ok(Some(Ok(Message::Text(text)))) =
                timeout(Duration::from_millis(300), ws.next()).await
            {
                tx.send((conn, serde_json::from_str(text.as_str()).unwrap()))
                    .ok();
            }
            ws.send(Message::text(push.to_string())).await.unwrap();

            if conn < last {
                ws.close(None).await.ok();
                continue;
            }
            let tx = tx.clone();
            tokio::spawn(async move {
                while let Some(Ok(msg)) = ws.next().await {
                    if let Message::Text(text) = msg {
                        tx.send((conn, serde_json::from_str(text.as_str()).unwrap()))
                            .ok();
                    }
                }
            });
        }
    });

    (Url::parse(&format!("http://{addr}/")).unwrap(), rx)
}

fn config(base_url: Url) -> DeviceConfig {
    let mut config = DeviceConfig::new(base_url).unwrap();
    config.token = Some(SecretString::from("wall-token".to_string()));
    config.reconnect = ReconnectConfig {
        initial_delay: Duration::from_millis(50),
        max_delay: Duration::from_millis(200),
    };
    config
}

fn full_info() -> Value {
    json!({
        "event": "info",
        "status": 1,
        "rotation": 0,
        "brightness": 50,
        "scheduleActive": false,
        "plugins": [{ "id": 1, "name": "Draw" }, { "id": 4, "name": "Clock" }],
        "plugin": 4,
        "version": "1.0.0",
        "data": vec![7; 256],
    })
}

#[tokio::test]
async fn test_reconnect_keeps_reconciled_state_and_reauthenticates() {
    let (base_url, mut received) = spawn_device(vec![
        full_info(),
        json!({ "event": "info", "rotation": 90 }),
    ])
    .await;

    let controller = Controller::new(config(base_url)).unwrap();
    let mut states = controller.store().subscribe();
    controller.connect().await;

    let state = timeout(WAIT, async {
        loop {
            let state = states.changed().await.unwrap();
            if state.rotation == 90 && state.connection_state == ConnectionState::Connected {
                break state;
            }
        }
    })
    .await
    .unwrap();

    // Fields from the first connection survive the sparse second snapshot.
    assert_eq!(state.brightness, 50);
    assert_eq!(state.system_status, SystemStatus::WsBinary);
    assert_eq!(state.plugin, 4);
    assert_eq!(state.plugins.len(), 2);
    assert_eq!(state.leds, vec![7; 256]);
    assert_eq!(state.version_label().as_deref(), Some("v1.0.0"));

    controller.disconnect().await;
    assert_eq!(controller.connection_state(), ConnectionState::Disconnected);

    let mut auth_per_conn = [0usize; 2];
    while let Ok((conn, frame)) = received.try_recv() {
        assert_eq!(frame, json!({ "event": "auth", "token": "wall-token" }));
        auth_per_conn[conn] += 1;
    }
    assert_eq!(auth_per_conn, [1, 1]);
}

#[tokio::test]
async fn test_operator_frames_reach_device() {
    let (base_url, mut received) = spawn_device(vec![full_info()]).await;

    let controller = Controller::new(config(base_url)).unwrap();
    controller.connect().await;
    let synced = controller.wait_synced(WAIT).await.unwrap();
    assert_eq!(synced.brightness, 50);

    // The auth frame.
    let (_, auth) = timeout(WAIT, received.recv()).await.unwrap().unwrap();
    assert_eq!(auth["event"], "auth");

    controller.set_brightness(200).await;
    assert_eq!(controller.snapshot().brightness, 200);
    controller.persist_plugin().await;
    controller.disconnect().await;

    let (_, brightness) = timeout(WAIT, received.recv()).await.unwrap().unwrap();
    assert_eq!(brightness, json!({ "event": "brightness", "brightness": 200 }));
    let (_, persist) = timeout(WAIT, received.recv()).await.unwrap().unwrap();
    assert_eq!(persist, json!({ "event": "persist-plugin" }));
}

#[tokio::test]
async fn test_send_without_connection_is_dropped() {
    let controller =
        Controller::new(config(Url::parse("http://127.0.0.1:1/").unwrap())).unwrap();
    controller.request_info().await;
    assert_eq!(controller.connection_state(), ConnectionState::Disconnected);
}

#[tokio::test]
async fn test_new_session_waits_for_its_own_snapshot() {
    // The device serves a single connection, so the second session never syncs.
    let (base_url, _received) = spawn_device(vec![full_info()]).await;

    let controller = Controller::new(config(base_url)).unwrap();
    controller.connect().await;
    controller.wait_synced(WAIT).await.unwrap();
    controller.disconnect().await;

    controller.connect().await;
    let result = controller.wait_synced(Duration::from_millis(300)).await;
    controller.disconnect().await;
    assert!(result.is_err(), "{result:?}");
}
