// ledwall-api: Async Rust client for networked LED wall devices (push channel + schedule commands)

pub mod error;
pub mod protocol;
pub mod schedule;
pub mod transport;
pub mod websocket;

pub use error::Error;
pub use protocol::{ClientFrame, InboundFrame, InfoSnapshot, PluginInfo, RotateDirection, ScheduleItem};
pub use schedule::ScheduleClient;
pub use transport::TransportConfig;
pub use websocket::{ConnectionState, ReconnectConfig, WebSocketHandle};
