pub mod config;
pub mod error;
pub mod gateway;
pub mod lines;
pub mod logging;
pub mod schedule;
pub mod signal;
pub mod sun;
pub mod topics;
pub mod transmitter;
pub mod types;

pub use config::{parse_cutoff, GpioConfig, MqttConfig, RuntimeConfig};
pub use error::Error;
pub use gateway::{parse_command, CommandGateway, GatewayOutcome};
pub use lines::{Line, OutputLines, SimulatedLines, SystemLines};
pub use schedule::{
    run_day, run_plan, wait_until, Clock, DailyWindow, Decision, RunReport, ScheduleSettings,
    ScheduleStep, SystemClock,
};
pub use sun::{SolarCalculator, SunsetSource};
pub use topics::*;
pub use transmitter::{Delay, ThreadDelay, Transmitter, SETTLE_INTERVAL, TRANSMIT_INTERVAL};
pub use types::{LinePattern, SocketId, SwitchState};
