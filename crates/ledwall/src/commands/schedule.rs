//! Schedule subcommand handlers. Pure HTTP: no push channel needed.

use ledwall_core::{Controller, NoticeLevel, Period};
use tokio::sync::broadcast;

use crate::cli::{GlobalOpts, ScheduleArgs, ScheduleCommand};
use crate::error::CliError;
use crate::output;

pub async fn handle(
    controller: &Controller,
    args: ScheduleArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let model = controller.schedule();
    let mut notices = controller.store().notices();

    let result = match args.command {
        ScheduleCommand::Start { day, night } => {
            model.replace_items(Period::Day, day)?;
            model.replace_items(Period::Night, night)?;
            model.start().await
        }
        ScheduleCommand::Stop => model.stop().await,
        ScheduleCommand::Clear => model.clear().await,
        ScheduleCommand::Bounds {
            day_start,
            night_start,
        } => model.set_bounds(day_start, night_start).await,
        ScheduleCommand::PushDay { items } => model.push_day(&items).await,
        ScheduleCommand::PushNight { items } => model.push_night(&items).await,
    };

    print_notices(&mut notices, global)?;
    result.map_err(CliError::from)
}

/// Print success notices. Failures surface as the command's error instead.
fn print_notices(
    notices: &mut broadcast::Receiver<ledwall_core::Notice>,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    while let Ok(notice) = notices.try_recv() {
        if notice.level == NoticeLevel::Info {
            output::print_output(&output::render_notice(global.output, &notice)?);
        }
    }
    Ok(())
}
