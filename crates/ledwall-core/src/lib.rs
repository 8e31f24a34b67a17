// ledwall-core: State synchronization and scheduling between ledwall-api and consumers (CLI).

pub mod config;
pub mod controller;
pub mod error;
pub mod model;
pub mod schedule;
pub mod store;
pub mod stream;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{ClientBuild, DeviceConfig};
pub use controller::Controller;
pub use error::CoreError;
pub use schedule::{ActivationStage, Schedule, ScheduleModel, SchedulePhase};
pub use store::{DeviceState, Notice, NoticeLevel, Store};
pub use stream::StateStream;

pub use model::{DayBounds, Period, PixelIndexMap, SystemStatus, TimeOfDay, LED_COUNT};

// Wire types consumers need without depending on ledwall-api directly.
pub use ledwall_api::{
    ClientFrame, ConnectionState, PluginInfo, ReconnectConfig, RotateDirection, ScheduleItem,
};
