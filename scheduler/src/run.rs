use anyhow::Context;
use energenie_common::{
    config::format_hhmm, logging, run_day, Clock, DailyWindow, RuntimeConfig, ScheduleSettings,
    SolarCalculator, SystemClock, SystemLines, ThreadDelay, Transmitter,
};
use tracing::info;

use crate::cli::Args;

pub fn run(args: Args) -> anyhow::Result<()> {
    let config_path = args.config_path();
    let config = RuntimeConfig::load(&config_path)
        .with_context(|| format!("failed to load runtime config {}", config_path.display()))?;
    logging::init(config.logging.file.as_deref()).context("failed to initialise logging")?;

    logging::log_failure(schedule(&args, &config))
}

fn schedule(args: &Args, config: &RuntimeConfig) -> anyhow::Result<()> {
    let mut clock = SystemClock::new(config.zone()?);
    let reference = clock.now();
    info!(
        "scheduler started at {reference}: offset {} min, cutoff {}, receiver {}",
        args.turn_on_offset_minutes,
        format_hhmm(args.lights_off_time),
        args.receiver_socket
    );

    let sun = SolarCalculator::new(config.site.latitude, config.site.longitude);
    let settings = ScheduleSettings {
        turn_on_offset_minutes: args.turn_on_offset_minutes,
        cutoff: args.lights_off_time,
    };
    let window = DailyWindow::for_reference(reference, &sun, &settings)
        .context("failed to compute today's schedule")?;

    let lines = SystemLines::open(&config.gpio).context("failed to open gpio lines")?;
    let mut transmitter =
        Transmitter::new(lines, ThreadDelay).context("failed to initialise transmitter")?;

    let report = run_day(
        &window,
        reference,
        &mut transmitter,
        args.receiver_socket,
        &mut clock,
    )
    .context("scheduled run failed")?;

    info!(
        "run complete: sent {:?} after {} wait(s)",
        report.sent, report.waits
    );
    Ok(())
}
