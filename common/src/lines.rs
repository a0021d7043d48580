use tracing::{debug, trace, warn};

use crate::{
    config::GpioConfig,
    error::Error,
    signal,
    types::{LinePattern, SocketId, SwitchState},
};

/// Logical transmitter inputs. Physical pin numbers live in [`GpioConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Line {
    Data(u8),
    ModeSelect,
    Enable,
}

pub const DATA_LINES: [Line; 4] = [Line::Data(0), Line::Data(1), Line::Data(2), Line::Data(3)];

pub trait OutputLines {
    fn write(&mut self, line: Line, high: bool) -> Result<(), Error>;

    /// Best-effort return of every line to an undriven state.
    fn release(&mut self);
}

#[cfg(feature = "rpi")]
pub type SystemLines = rpi::RppalLines;
#[cfg(not(feature = "rpi"))]
pub type SystemLines = SimulatedLines;

/// Stand-in backend for hosts without GPIO; tracks levels in memory.
#[derive(Debug, Default)]
pub struct SimulatedLines {
    data: [bool; 4],
    mode_select: bool,
    enable: bool,
    released: bool,
    last_command: Option<(SocketId, SwitchState)>,
}

impl SimulatedLines {
    pub fn open(config: &GpioConfig) -> Result<Self, Error> {
        debug!(
            "simulated gpio: data pins {:?}, mode select {}, enable {}",
            config.data_pins, config.mode_select_pin, config.enable_pin
        );
        Ok(Self::default())
    }

    pub fn level(&self, line: Line) -> bool {
        match line {
            Line::Data(index) => self.data.get(usize::from(index)).copied().unwrap_or(false),
            Line::ModeSelect => self.mode_select,
            Line::Enable => self.enable,
        }
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Command latched by the most recent rising edge on enable.
    pub fn last_command(&self) -> Option<(SocketId, SwitchState)> {
        self.last_command
    }

    fn latch(&mut self) {
        let pattern = LinePattern::from_bits(self.data);
        match signal::decode(pattern) {
            Some((socket, state)) => {
                debug!("simulated transmission: receiver {socket} {state}");
                self.last_command = Some((socket, state));
            }
            None => warn!("simulated transmission of unknown code {pattern}"),
        }
    }
}

impl OutputLines for SimulatedLines {
    fn write(&mut self, line: Line, high: bool) -> Result<(), Error> {
        if self.released {
            return Err(Error::HardwareUnavailable("lines already released".to_string()));
        }

        let slot = match line {
            Line::Data(index) => self
                .data
                .get_mut(usize::from(index))
                .ok_or_else(|| Error::HardwareUnavailable(format!("no data line {index}")))?,
            Line::ModeSelect => &mut self.mode_select,
            Line::Enable => &mut self.enable,
        };
        let rising = !*slot && high;
        *slot = high;
        trace!("{line:?} -> {}", if high { "high" } else { "low" });

        if line == Line::Enable && rising {
            self.latch();
        }
        Ok(())
    }

    fn release(&mut self) {
        self.data = [false; 4];
        self.mode_select = false;
        self.enable = false;
        self.released = true;
        debug!("simulated gpio released");
    }
}

#[cfg(feature = "rpi")]
pub mod rpi {
    use rppal::gpio::{Gpio, Level, OutputPin};
    use tracing::debug;

    use super::{Line, OutputLines};
    use crate::{config::GpioConfig, error::Error};

    struct Pins {
        data: [OutputPin; 4],
        mode_select: OutputPin,
        enable: OutputPin,
    }

    /// Raspberry Pi GPIO through `/dev/gpiomem`. Pins are BCM numbered.
    pub struct RppalLines {
        pins: Option<Pins>,
    }

    impl RppalLines {
        pub fn open(config: &GpioConfig) -> Result<Self, Error> {
            let gpio = Gpio::new()?;
            let claim = |pin: u8| -> Result<OutputPin, Error> {
                let mut output = gpio.get(pin)?.into_output_low();
                output.set_reset_on_drop(true);
                Ok(output)
            };

            let [d0, d1, d2, d3] = config.data_pins;
            let pins = Pins {
                data: [claim(d0)?, claim(d1)?, claim(d2)?, claim(d3)?],
                mode_select: claim(config.mode_select_pin)?,
                enable: claim(config.enable_pin)?,
            };

            debug!(
                "claimed gpio: data pins {:?}, mode select {}, enable {}",
                config.data_pins, config.mode_select_pin, config.enable_pin
            );
            Ok(Self { pins: Some(pins) })
        }
    }

    impl OutputLines for RppalLines {
        fn write(&mut self, line: Line, high: bool) -> Result<(), Error> {
            let pins = self
                .pins
                .as_mut()
                .ok_or_else(|| Error::HardwareUnavailable("lines already released".to_string()))?;

            let pin = match line {
                Line::Data(index) => pins.data.get_mut(usize::from(index)).ok_or_else(|| {
                    Error::HardwareUnavailable(format!("no data line {index}"))
                })?,
                Line::ModeSelect => &mut pins.mode_select,
                Line::Enable => &mut pins.enable,
            };
            pin.write(Level::from(high));
            Ok(())
        }

        fn release(&mut self) {
            let Some(mut pins) = self.pins.take() else {
                return;
            };

            pins.enable.set_low();
            for pin in pins.data.iter_mut() {
                pin.set_low();
            }
            pins.mode_select.set_low();
            // Dropping the pins restores their previous mode.
            drop(pins);
            debug!("gpio lines released");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simulated_lines_track_levels_until_released() {
        let mut lines = SimulatedLines::open(&GpioConfig::default()).unwrap();

        lines.write(Line::Data(2), true).unwrap();
        lines.write(Line::Enable, true).unwrap();
        assert!(lines.level(Line::Data(2)));
        assert!(lines.level(Line::Enable));

        lines.release();
        assert!(lines.is_released());
        assert!(!lines.level(Line::Enable));
        assert!(matches!(
            lines.write(Line::Enable, true),
            Err(Error::HardwareUnavailable(_))
        ));
    }

    #[test]
    fn enable_edge_latches_decoded_command() {
        let mut lines = SimulatedLines::default();
        for (index, level) in [false, true, true, false].into_iter().enumerate() {
            lines.write(Line::Data(index as u8), level).unwrap();
        }
        assert_eq!(lines.last_command(), None);

        lines.write(Line::Enable, true).unwrap();
        assert_eq!(
            lines.last_command(),
            Some((SocketId::new(2).unwrap(), SwitchState::Off))
        );

        // Holding enable high does not latch again; an unknown code keeps the last one.
        lines.write(Line::Data(2), false).unwrap();
        lines.write(Line::Enable, true).unwrap();
        lines.write(Line::Enable, false).unwrap();
        lines.write(Line::Enable, true).unwrap();
        assert_eq!(
            lines.last_command(),
            Some((SocketId::new(2).unwrap(), SwitchState::Off))
        );
    }

    #[test]
    fn unknown_data_line_is_rejected() {
        let mut lines = SimulatedLines::default();
        assert!(matches!(
            lines.write(Line::Data(4), true),
            Err(Error::HardwareUnavailable(_))
        ));
    }
}
