//! Operator frames: brightness, plugin, rotation.
//!
//! Each handler waits for the device to sync, sends its frame, and
//! disconnects, which flushes the frame before the socket closes.

use ledwall_core::{ClientFrame, Controller, RotateDirection};

use crate::cli::{GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

pub async fn brightness(
    controller: &Controller,
    level: u8,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    super::connect_synced(controller).await?;
    controller.set_brightness(level).await;
    controller.disconnect().await;
    report(
        global,
        &[ClientFrame::Brightness { brightness: level }],
        &format!("Brightness set to {level}"),
    )
}

pub async fn plugin(
    controller: &Controller,
    id: i32,
    persist: bool,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let state = super::connect_synced(controller).await?;
    controller.set_plugin(id).await;
    let mut frames = vec![ClientFrame::Plugin { plugin: id }];
    if persist {
        controller.persist_plugin().await;
        frames.push(ClientFrame::PersistPlugin);
    }
    controller.disconnect().await;

    let name = state
        .plugin_name(id)
        .map_or_else(|| id.to_string(), |name| format!("{name} ({id})"));
    let suffix = if persist { ", persisted" } else { "" };
    report(global, &frames, &format!("Plugin switched to {name}{suffix}"))
}

pub async fn rotate(
    controller: &Controller,
    direction: RotateDirection,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    super::connect_synced(controller).await?;
    controller.rotate(direction).await;
    controller.disconnect().await;
    report(
        global,
        &[ClientFrame::Rotate { direction }],
        &format!("Rotated {direction}"),
    )
}

/// JSON mode echoes the frames sent; plain mode prints `message`.
fn report(global: &GlobalOpts, frames: &[ClientFrame], message: &str) -> Result<(), CliError> {
    let rendered = match global.output {
        OutputFormat::Json => serde_json::to_string_pretty(frames)?,
        OutputFormat::Plain => message.to_owned(),
    };
    output::print_output(&rendered);
    Ok(())
}
