use chrono::{DateTime, FixedOffset};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("receiver must be an integer 1-4, got {0:?}")]
    InvalidSocket(String),

    #[error("target time {target} has already passed (now {now})")]
    DeadlineAlreadyPassed {
        target: DateTime<FixedOffset>,
        now: DateTime<FixedOffset>,
    },

    #[error("gpio unavailable: {0}")]
    HardwareUnavailable(String),

    #[error("{0}")]
    InvalidCutoff(&'static str),

    #[error("no sunset on {date} at latitude {latitude}")]
    NoSunset { date: chrono::NaiveDate, latitude: f64 },

    #[error("time window cannot be represented: {0}")]
    InvalidTimeWindow(String),

    #[error("config: {0}")]
    Config(String),
}

#[cfg(feature = "rpi")]
impl From<rppal::gpio::Error> for Error {
    fn from(err: rppal::gpio::Error) -> Self {
        Self::HardwareUnavailable(err.to_string())
    }
}
