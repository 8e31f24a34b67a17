//! Command dispatch: bridges CLI args -> controller calls -> output.

pub mod config_cmd;
pub mod device;
pub mod schedule;
pub mod status;
pub mod watch;

use std::sync::Arc;

use ledwall_core::{Controller, DeviceState};

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a device-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    controller: &Controller,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Status => status::handle(controller, global).await,
        Command::Watch => watch::handle(controller, global).await,
        Command::Brightness { level } => device::brightness(controller, level, global).await,
        Command::Plugin { id, persist } => device::plugin(controller, id, persist, global).await,
        Command::Rotate { direction } => {
            device::rotate(controller, direction.into(), global).await
        }
        Command::Schedule(args) => schedule::handle(controller, args, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}

/// Open the push channel and wait for the first reconciled snapshot.
///
/// Waiting for a snapshot also guarantees the auth frame went out first,
/// so frames sent afterwards are not dropped.
pub(crate) async fn connect_synced(controller: &Controller) -> Result<Arc<DeviceState>, CliError> {
    controller.connect().await;
    let timeout = controller.config().timeout;
    match controller.wait_synced(timeout).await {
        Ok(state) => Ok(state),
        Err(_) => {
            controller.disconnect().await;
            Err(CliError::Timeout {
                url: controller.config().ws_url.to_string(),
                seconds: timeout.as_secs(),
            })
        }
    }
}
