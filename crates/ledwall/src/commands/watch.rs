//! `watch`: print every store change until Ctrl-C.

use ledwall_core::Controller;
use tracing::debug;

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output::{self, Palette};

pub async fn handle(controller: &Controller, global: &GlobalOpts) -> Result<(), CliError> {
    let palette = Palette::detect();
    let mut states = controller.store().subscribe();
    controller.connect().await;

    output::print_output(&output::render_change(
        global.output,
        states.current(),
        palette,
    )?);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                debug!("interrupted");
                break;
            }
            state = states.changed() => {
                let Some(state) = state else { break };
                output::print_output(&output::render_change(global.output, &state, palette)?);
            }
        }
    }

    controller.disconnect().await;
    Ok(())
}
