use std::{io::ErrorKind, path::Path};

use chrono::{NaiveTime, Timelike};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::{error::Error, topics::TOPIC_LIGHTS_SET, types::SocketId};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SiteConfig {
    pub latitude: f64,
    pub longitude: f64,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            latitude: 52.01355000660077,
            longitude: -2.5974807343283923,
        }
    }
}

/// BCM pin numbers for the transmitter board.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GpioConfig {
    #[serde(rename = "dataPins")]
    pub data_pins: [u8; 4],
    #[serde(rename = "modeSelectPin")]
    pub mode_select_pin: u8,
    #[serde(rename = "enablePin")]
    pub enable_pin: u8,
}

impl Default for GpioConfig {
    fn default() -> Self {
        // Header pins 11, 15, 16, 13 / 18 / 22.
        Self {
            data_pins: [17, 22, 23, 27],
            mode_select_pin: 24,
            enable_pin: 25,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct MqttConfig {
    pub host: String,
    pub port: u16,
    pub topic: String,
    #[serde(rename = "clientId")]
    pub client_id: String,
    pub user: String,
    pub pass: String,
    #[serde(rename = "keepAliveSecs")]
    pub keep_alive_secs: u64,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 1883,
            topic: TOPIC_LIGHTS_SET.to_string(),
            client_id: "energenie-listener".to_string(),
            user: String::new(),
            pass: String::new(),
            keep_alive_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ListenerConfig {
    pub socket: SocketId,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            socket: SocketId::ALL[1],
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Records are appended here instead of stderr when set.
    #[serde(default)]
    pub file: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RuntimeConfig {
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub gpio: GpioConfig,
    #[serde(default)]
    pub mqtt: MqttConfig,
    #[serde(default)]
    pub listener: ListenerConfig,
    /// IANA zone used for the reference instant; the host's local offset when unset.
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl RuntimeConfig {
    /// Reads `path` as JSON; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, Error> {
        let mut config = match std::fs::read(path) {
            Ok(raw) => serde_json::from_slice::<Self>(&raw)
                .map_err(|err| Error::Config(format!("{}: {err}", path.display())))?,
            Err(err) if err.kind() == ErrorKind::NotFound => Self::default(),
            Err(err) => return Err(Error::Config(format!("{}: {err}", path.display()))),
        };
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(host) = lookup("MQTT_HOST") {
            self.mqtt.host = host;
        }
        if let Some(port) = lookup("MQTT_PORT").and_then(|value| value.parse::<u16>().ok()) {
            self.mqtt.port = port;
        }
        if let Some(user) = lookup("MQTT_USER") {
            self.mqtt.user = user;
            self.mqtt.pass = lookup("MQTT_PASS").unwrap_or_default();
        }
        if let Some(file) = lookup("ENERGENIE_LOG_FILE") {
            self.logging.file = Some(file).filter(|value| !value.is_empty());
        }
    }

    pub fn validate(&self) -> Result<(), Error> {
        if !self.site.latitude.is_finite() || !(-90.0..=90.0).contains(&self.site.latitude) {
            return Err(Error::Config("latitude must be within -90..=90".to_string()));
        }
        if !self.site.longitude.is_finite() || !(-180.0..=180.0).contains(&self.site.longitude) {
            return Err(Error::Config("longitude must be within -180..=180".to_string()));
        }

        let mut pins = self.gpio.data_pins.to_vec();
        pins.push(self.gpio.mode_select_pin);
        pins.push(self.gpio.enable_pin);
        if pins.iter().any(|pin| *pin > 27) {
            return Err(Error::Config("gpio pins must be BCM 0-27".to_string()));
        }
        pins.sort_unstable();
        pins.dedup();
        if pins.len() != 6 {
            return Err(Error::Config("gpio pins must be distinct".to_string()));
        }

        if self.mqtt.topic.trim().is_empty() {
            return Err(Error::Config("mqtt topic cannot be empty".to_string()));
        }
        if self.mqtt.port == 0 {
            return Err(Error::Config("mqtt port must be between 1 and 65535".to_string()));
        }

        self.zone()?;
        Ok(())
    }

    pub fn zone(&self) -> Result<Option<Tz>, Error> {
        self.timezone
            .as_deref()
            .map(|timezone| {
                timezone
                    .parse::<Tz>()
                    .map_err(|_| Error::Config(format!("unknown timezone {timezone:?}")))
            })
            .transpose()
    }
}

/// Parses a 24-hour `HH:MM` cutoff.
pub fn parse_cutoff(value: &str) -> Result<NaiveTime, Error> {
    let (hour, minute) = value
        .trim()
        .split_once(':')
        .ok_or(Error::InvalidCutoff("time must be HH:MM"))?;
    let hour = hour
        .parse::<u32>()
        .map_err(|_| Error::InvalidCutoff("time must be HH:MM"))?;
    let minute = minute
        .parse::<u32>()
        .map_err(|_| Error::InvalidCutoff("time must be HH:MM"))?;

    if hour >= 24 || minute >= 60 {
        return Err(Error::InvalidCutoff("time must be within 00:00-23:59"));
    }
    NaiveTime::from_hms_opt(hour, minute, 0).ok_or(Error::InvalidCutoff("time must be HH:MM"))
}

pub fn format_hhmm(time: NaiveTime) -> String {
    format!("{:02}:{:02}", time.hour(), time.minute())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn parses_valid_cutoffs() {
        assert_eq!(
            parse_cutoff("23:00").unwrap(),
            NaiveTime::from_hms_opt(23, 0, 0).unwrap()
        );
        assert_eq!(
            parse_cutoff("0:05").unwrap(),
            NaiveTime::from_hms_opt(0, 5, 0).unwrap()
        );
        assert_eq!(format_hhmm(parse_cutoff("07:30").unwrap()), "07:30");
    }

    #[test]
    fn rejects_malformed_cutoffs() {
        for value in ["2300", "ab:cd", "", "12:", "-1:00"] {
            assert!(
                matches!(parse_cutoff(value), Err(Error::InvalidCutoff("time must be HH:MM"))),
                "{value}"
            );
        }
        for value in ["24:00", "12:60", "99:99"] {
            assert!(
                matches!(
                    parse_cutoff(value),
                    Err(Error::InvalidCutoff("time must be within 00:00-23:59"))
                ),
                "{value}"
            );
        }
    }

    #[test]
    fn partial_file_fills_defaults() {
        let config: RuntimeConfig =
            serde_json::from_str(r#"{"listener":{"socket":3},"timezone":"Europe/London"}"#)
                .unwrap();

        assert_eq!(config.listener.socket.get(), 3);
        assert_eq!(config.gpio, GpioConfig::default());
        assert_eq!(config.mqtt.topic, TOPIC_LIGHTS_SET);
        assert_eq!(config.zone().unwrap(), Some(chrono_tz::Europe::London));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn env_overrides_mqtt_settings() {
        let env: HashMap<&str, &str> = [
            ("MQTT_HOST", "broker.lan"),
            ("MQTT_PORT", "8883"),
            ("MQTT_USER", "lights"),
        ]
        .into_iter()
        .collect();

        let mut config = RuntimeConfig::default();
        config.apply_env_overrides(|key| env.get(key).map(|value| value.to_string()));

        assert_eq!(config.mqtt.host, "broker.lan");
        assert_eq!(config.mqtt.port, 8883);
        assert_eq!(config.mqtt.user, "lights");
        assert_eq!(config.mqtt.pass, "");
    }

    #[test]
    fn rejects_duplicate_pins_and_bad_zone() {
        let mut config = RuntimeConfig::default();
        config.gpio.enable_pin = config.gpio.data_pins[0];
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let mut config = RuntimeConfig::default();
        config.timezone = Some("Mars/Olympus".to_string());
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let mut config = RuntimeConfig::default();
        config.site.latitude = 120.0;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn missing_file_uses_defaults() {
        let path = std::env::temp_dir().join("energenie-config-that-does-not-exist.json");
        let config = RuntimeConfig::load(&path).unwrap();
        assert_eq!(config.gpio, GpioConfig::default());
    }
}
