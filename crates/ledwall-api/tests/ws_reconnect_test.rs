// Push-channel tests against a local websocket device.
#![allow(clippy::unwrap_used)]

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use secrecy::SecretString;
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use url::Url;

use ledwall_api::{ConnectionState, ReconnectConfig, WebSocketHandle};

const WAIT: Duration = Duration::from_secs(5);

/// A text frame the fake device received, tagged with the connection index.
#[derive(Debug)]
struct Received {
    conn: usize,
    text: String,
}

/// Fake device: on every connection it waits briefly for a first client
/// frame, then pushes `{"event":"info","brightness":<conn index>}`.
/// The first connection is closed right after that push.
async fn spawn_device() -> (Url, mpsc::UnboundedReceiver<Received>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        let mut next_conn = 0usize;
        while let Ok((stream, _)) = listener.accept().await {
            let conn = next_conn;
            next_conn += 1;
            let tx = tx.clone();

            tokio::spawn(async move {
                let mut ws = accept_async(stream).await.unwrap();

                if let Ok(Some(Ok(Message::Text(text)))) =
                    timeout(Duration::from_millis(300), ws.next()).await
                {
                    tx.send(Received {
                        conn,
                        text: text.as_str().to_owned(),
                    })
                    .ok();
                }

                let frame = json!({ "event": "info", "brightness": conn }).to_string();
                ws.send(Message::text(frame)).await.unwrap();

                if conn == 0 {
                    ws.close(None).await.ok();
                    return;
                }
                while let Some(Ok(msg)) = ws.next().await {
                    if let Message::Text(text) = msg {
                        tx.send(Received {
                            conn,
                            text: text.as_str().to_owned(),
                        })
                        .ok();
                    }
                }
            });
        }
    });

    (Url::parse(&format!("ws://{addr}/ws")).unwrap(), rx)
}

fn fast_reconnect() -> ReconnectConfig {
    ReconnectConfig {
        initial_delay: Duration::from_millis(50),
        max_delay: Duration::from_millis(200),
    }
}

fn drain(rx: &mut mpsc::UnboundedReceiver<Received>) -> Vec<Received> {
    let mut out = Vec::new();
    while let Ok(received) = rx.try_recv() {
        out.push(received);
    }
    out
}

#[tokio::test]
async fn test_one_auth_frame_per_connection_across_reconnect() {
    let (url, mut received) = spawn_device().await;
    let token = SecretString::from("wall-token".to_string());

    let handle = WebSocketHandle::connect(
        url,
        fast_reconnect(),
        CancellationToken::new(),
        Some(token),
    );
    let mut frames = std::pin::pin!(handle.frames());

    // One logical stream spans both connections.
    let first = timeout(WAIT, frames.next()).await.unwrap().unwrap();
    let second = timeout(WAIT, frames.next()).await.unwrap().unwrap();
    assert!(first.contains(r#""brightness":0"#), "got {first}");
    assert!(second.contains(r#""brightness":1"#), "got {second}");
    assert_eq!(handle.current_state(), ConnectionState::Connected);

    handle.shutdown();
    let mut states = handle.state_changes();
    timeout(WAIT, states.wait_for(|s| *s == ConnectionState::Disconnected))
        .await
        .unwrap()
        .unwrap();

    let received = drain(&mut received);
    let auth = json!({ "event": "auth", "token": "wall-token" });
    for conn in 0..2 {
        let frames: Vec<serde_json::Value> = received
            .iter()
            .filter(|r| r.conn == conn)
            .map(|r| serde_json::from_str(&r.text).unwrap())
            .collect();
        assert_eq!(frames, vec![auth.clone()], "connection {conn}");
    }
}

#[tokio::test]
async fn test_empty_token_sends_no_auth_frame() {
    let (url, mut received) = spawn_device().await;

    let handle = WebSocketHandle::connect(
        url,
        fast_reconnect(),
        CancellationToken::new(),
        Some(SecretString::from(String::new())),
    );
    let mut frames = std::pin::pin!(handle.frames());

    let first = timeout(WAIT, frames.next()).await.unwrap().unwrap();
    assert!(first.contains(r#""event":"info""#));

    handle.shutdown();
    assert!(drain(&mut received).is_empty());
}

#[tokio::test]
async fn test_send_reaches_device_once_connected() {
    let (url, mut received) = spawn_device().await;

    let handle = WebSocketHandle::connect(url, fast_reconnect(), CancellationToken::new(), None);
    let mut frames = std::pin::pin!(handle.frames());

    // Skip past the first (closing) connection.
    timeout(WAIT, frames.next()).await.unwrap().unwrap();
    timeout(WAIT, frames.next()).await.unwrap().unwrap();

    handle.send_frame(&ledwall_api::ClientFrame::Brightness { brightness: 77 });

    let got = timeout(WAIT, received.recv()).await.unwrap().unwrap();
    assert_eq!(got.conn, 1);
    assert_eq!(got.text, r#"{"event":"brightness","brightness":77}"#);

    handle.shutdown();
}

#[tokio::test]
async fn test_unreachable_device_stays_retrying() {
    // Bind then drop to get a port with nothing listening.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let handle = WebSocketHandle::connect(
        Url::parse(&format!("ws://{addr}/ws")).unwrap(),
        fast_reconnect(),
        CancellationToken::new(),
        None,
    );

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_ne!(handle.current_state(), ConnectionState::Connected);

    handle.shutdown();
    let mut states = handle.state_changes();
    timeout(WAIT, states.wait_for(|s| *s == ConnectionState::Disconnected))
        .await
        .unwrap()
        .unwrap();
}
