//! `status`: one snapshot, then exit.

use ledwall_core::Controller;

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output::{self, Palette};

pub async fn handle(controller: &Controller, global: &GlobalOpts) -> Result<(), CliError> {
    let state = super::connect_synced(controller).await?;
    controller.disconnect().await;
    let rendered = output::render_state(global.output, &state, Palette::detect())?;
    output::print_output(&rendered);
    Ok(())
}
