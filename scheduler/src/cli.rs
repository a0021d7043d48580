use std::path::PathBuf;

use chrono::NaiveTime;
use clap::Parser;
use energenie_common::{parse_cutoff, SocketId};

const DEFAULT_CONFIG_PATH: &str = "energenie.json";

/// Energenie sunset scheduler. Run once a day, after midnight and before sunset.
#[derive(Debug, Parser)]
#[command(version)]
pub struct Args {
    /// Minutes relative to sunset to switch on (negative = before)
    #[arg(long, allow_negative_numbers = true)]
    pub turn_on_offset_minutes: i32,

    /// Daily cutoff in HH:MM (24h)
    #[arg(long, value_parser = parse_cutoff)]
    pub lights_off_time: NaiveTime,

    /// Energenie receiver socket (1-4)
    #[arg(long)]
    pub receiver_socket: SocketId,

    /// Runtime config (JSON); falls back to $ENERGENIE_CONFIG, then ./energenie.json
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Args {
    pub fn config_path(&self) -> PathBuf {
        self.config
            .clone()
            .or_else(|| std::env::var_os("ENERGENIE_CONFIG").map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Args, clap::Error> {
        Args::try_parse_from(std::iter::once("energenie-scheduler").chain(args.iter().copied()))
    }

    #[test]
    fn accepts_negative_offset() {
        let args = parse(&[
            "--turn-on-offset-minutes",
            "-30",
            "--lights-off-time",
            "23:00",
            "--receiver-socket",
            "2",
        ])
        .unwrap();

        assert_eq!(args.turn_on_offset_minutes, -30);
        assert_eq!(args.lights_off_time, NaiveTime::from_hms_opt(23, 0, 0).unwrap());
        assert_eq!(args.receiver_socket.get(), 2);
    }

    #[test]
    fn rejects_bad_socket_and_cutoff() {
        assert!(parse(&[
            "--turn-on-offset-minutes",
            "0",
            "--lights-off-time",
            "23:00",
            "--receiver-socket",
            "5",
        ])
        .is_err());

        assert!(parse(&[
            "--turn-on-offset-minutes",
            "0",
            "--lights-off-time",
            "25:00",
            "--receiver-socket",
            "1",
        ])
        .is_err());
    }

    #[test]
    fn all_arguments_are_required() {
        assert!(parse(&["--turn-on-offset-minutes", "10"]).is_err());
    }
}
