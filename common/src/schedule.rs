use chrono::{DateTime, Duration, FixedOffset, Local, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use tracing::{error, info, warn};

use crate::{
    error::Error,
    lines::OutputLines,
    sun::SunsetSource,
    transmitter::{Delay, Transmitter},
    types::{SocketId, SwitchState},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleSettings {
    /// Minutes relative to sunset; negative switches on before sunset.
    pub turn_on_offset_minutes: i32,
    pub cutoff: NaiveTime,
}

/// The day's on/off instants, fixed for the whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyWindow {
    pub sunset: NaiveTime,
    pub turn_on: DateTime<FixedOffset>,
    pub turn_off: DateTime<FixedOffset>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Turn-on lands at or after the cutoff.
    ForceOffMisconfigured,
    /// The run started once the cutoff had already passed.
    ForceOffAfterCutoff,
    /// Turn-on already passed, cutoff still ahead.
    OnNowThenOffAtCutoff,
    WaitThenOnThenOff,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleStep {
    Send(SwitchState),
    WaitUntil(DateTime<FixedOffset>),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub sent: Vec<SwitchState>,
    pub waits: usize,
}

pub trait Clock {
    fn now(&self) -> DateTime<FixedOffset>;
    fn sleep(&mut self, duration: std::time::Duration);
}

/// Wall clock. Readings carry the offset in effect at the moment of reading.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock {
    timezone: Option<Tz>,
}

impl SystemClock {
    pub fn new(timezone: Option<Tz>) -> Self {
        Self { timezone }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        match self.timezone {
            Some(tz) => Utc::now().with_timezone(&tz).fixed_offset(),
            None => Local::now().fixed_offset(),
        }
    }

    fn sleep(&mut self, duration: std::time::Duration) {
        std::thread::sleep(duration);
    }
}

impl DailyWindow {
    pub fn compute(
        reference: DateTime<FixedOffset>,
        sunset: NaiveTime,
        settings: &ScheduleSettings,
    ) -> Result<Self, Error> {
        let offset = *reference.offset();
        let date = reference.date_naive();

        let sunset_at = at(offset, date, sunset)?;
        let turn_on = sunset_at
            .checked_add_signed(Duration::minutes(i64::from(settings.turn_on_offset_minutes)))
            .ok_or_else(|| {
                Error::InvalidTimeWindow(format!(
                    "offset {} minutes from {sunset_at}",
                    settings.turn_on_offset_minutes
                ))
            })?;
        let turn_off = at(offset, date, settings.cutoff)?;

        Ok(Self {
            sunset,
            turn_on,
            turn_off,
        })
    }

    /// Looks up today's sunset for `reference` and derives the window from it.
    pub fn for_reference(
        reference: DateTime<FixedOffset>,
        sun: &impl SunsetSource,
        settings: &ScheduleSettings,
    ) -> Result<Self, Error> {
        let sunset = sun.sunset(reference.date_naive(), *reference.offset())?;
        let window = Self::compute(reference, sunset, settings)?;
        info!(
            "sunset: {}, turn on: {}, turn off: {}",
            window.sunset,
            window.turn_on.time(),
            window.turn_off.time()
        );
        Ok(window)
    }

    pub fn decide(&self, reference: DateTime<FixedOffset>) -> Decision {
        if self.turn_on >= self.turn_off {
            Decision::ForceOffMisconfigured
        } else if reference >= self.turn_off {
            Decision::ForceOffAfterCutoff
        } else if reference >= self.turn_on {
            Decision::OnNowThenOffAtCutoff
        } else {
            Decision::WaitThenOnThenOff
        }
    }
}

impl Decision {
    pub fn steps(self, window: &DailyWindow) -> Vec<ScheduleStep> {
        match self {
            Self::ForceOffMisconfigured | Self::ForceOffAfterCutoff => {
                vec![ScheduleStep::Send(SwitchState::Off)]
            }
            Self::OnNowThenOffAtCutoff => vec![
                ScheduleStep::Send(SwitchState::On),
                ScheduleStep::WaitUntil(window.turn_off),
                ScheduleStep::Send(SwitchState::Off),
            ],
            Self::WaitThenOnThenOff => vec![
                ScheduleStep::WaitUntil(window.turn_on),
                ScheduleStep::Send(SwitchState::On),
                ScheduleStep::WaitUntil(window.turn_off),
                ScheduleStep::Send(SwitchState::Off),
            ],
        }
    }

    fn log(self, window: &DailyWindow) {
        let on = window.turn_on.time();
        let off = window.turn_off.time();
        match self {
            Self::ForceOffMisconfigured => {
                warn!("turn-on time {on} is at/after cutoff {off}; ensuring light is off and exiting")
            }
            Self::ForceOffAfterCutoff => {
                error!("run started at/after cutoff {off}; ensuring light is off")
            }
            Self::OnNowThenOffAtCutoff => {
                warn!("run started after the scheduled turn-on {on}; ensuring light is on")
            }
            Self::WaitThenOnThenOff => info!("turn-on {on} still ahead"),
        }
    }
}

/// Blocks until `target` with a single sleep.
pub fn wait_until(clock: &mut impl Clock, target: DateTime<FixedOffset>) -> Result<(), Error> {
    let now = clock.now();
    if target <= now {
        return Err(Error::DeadlineAlreadyPassed { target, now });
    }

    let remaining = (target - now)
        .to_std()
        .map_err(|_| Error::DeadlineAlreadyPassed { target, now })?;
    clock.sleep(remaining);
    Ok(())
}

pub fn run_plan<L, D, C>(
    steps: &[ScheduleStep],
    transmitter: &mut Transmitter<L, D>,
    socket: SocketId,
    clock: &mut C,
) -> Result<RunReport, Error>
where
    L: OutputLines,
    D: Delay,
    C: Clock,
{
    let mut report = RunReport::default();
    for step in steps {
        match *step {
            ScheduleStep::Send(state) => {
                transmitter.send(socket, state)?;
                report.sent.push(state);
            }
            ScheduleStep::WaitUntil(target) => {
                info!("waiting until {target}");
                if let Err(err) = wait_until(clock, target) {
                    // The socket must never be left on once a wait aborts the run.
                    if report.sent.last() == Some(&SwitchState::On) {
                        error!("{err}; turning receiver {socket} off before aborting");
                        transmitter.send(socket, SwitchState::Off)?;
                        report.sent.push(SwitchState::Off);
                    }
                    return Err(err);
                }
                report.waits += 1;
            }
        }
    }
    Ok(report)
}

/// Decides against `reference` and carries the resulting steps out.
pub fn run_day<L, D, C>(
    window: &DailyWindow,
    reference: DateTime<FixedOffset>,
    transmitter: &mut Transmitter<L, D>,
    socket: SocketId,
    clock: &mut C,
) -> Result<RunReport, Error>
where
    L: OutputLines,
    D: Delay,
    C: Clock,
{
    let decision = window.decide(reference);
    decision.log(window);
    run_plan(&decision.steps(window), transmitter, socket, clock)
}

fn at(offset: FixedOffset, date: NaiveDate, time: NaiveTime) -> Result<DateTime<FixedOffset>, Error> {
    offset
        .from_local_datetime(&date.and_time(time))
        .single()
        .ok_or_else(|| Error::InvalidTimeWindow(format!("{date} {time} {offset}")))
}
