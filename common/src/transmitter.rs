use std::{thread, time::Duration};

use tracing::{debug, info, warn};

use crate::{
    error::Error,
    lines::{Line, OutputLines, DATA_LINES},
    signal,
    types::{LinePattern, SocketId, SwitchState},
};

/// Time for the data lines to stabilise before the transmitter samples them.
pub const SETTLE_INTERVAL: Duration = Duration::from_millis(100);
/// Time enable stays asserted so the receiver can detect and latch the code.
pub const TRANSMIT_INTERVAL: Duration = Duration::from_millis(250);

pub trait Delay {
    fn pause(&mut self, duration: Duration);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadDelay;

impl Delay for ThreadDelay {
    fn pause(&mut self, duration: Duration) {
        thread::sleep(duration);
    }
}

/// Exclusive owner of the transmitter's lines. Dropping it releases them.
pub struct Transmitter<L: OutputLines, D: Delay = ThreadDelay> {
    lines: L,
    delay: D,
    sent_frames: u64,
    last_pattern: Option<LinePattern>,
}

impl<L: OutputLines, D: Delay> Transmitter<L, D> {
    /// Drives every line low before any command can be sent.
    pub fn new(mut lines: L, delay: D) -> Result<Self, Error> {
        lines.write(Line::ModeSelect, false)?;
        for line in DATA_LINES {
            lines.write(line, false)?;
        }
        lines.write(Line::Enable, false)?;

        Ok(Self {
            lines,
            delay,
            sent_frames: 0,
            last_pattern: None,
        })
    }

    pub fn turn_on(&mut self, socket: SocketId) -> Result<LinePattern, Error> {
        self.send(socket, SwitchState::On)
    }

    pub fn turn_off(&mut self, socket: SocketId) -> Result<LinePattern, Error> {
        self.send(socket, SwitchState::Off)
    }

    /// Returns with enable low, or with the error from the failed write.
    pub fn send(&mut self, socket: SocketId, state: SwitchState) -> Result<LinePattern, Error> {
        let pattern = signal::encode(socket, state);
        info!("turning receiver {socket} {state}");
        debug!("sending code: {pattern}");

        for (line, level) in DATA_LINES.into_iter().zip(pattern.bits()) {
            self.lines.write(line, level)?;
        }
        self.delay.pause(SETTLE_INTERVAL);

        if let Err(err) = self.lines.write(Line::Enable, true) {
            self.force_enable_low();
            return Err(err);
        }
        self.delay.pause(TRANSMIT_INTERVAL);
        self.lines.write(Line::Enable, false)?;

        self.sent_frames = self.sent_frames.saturating_add(1);
        self.last_pattern = Some(pattern);
        Ok(pattern)
    }

    pub fn sent_frames(&self) -> u64 {
        self.sent_frames
    }

    pub fn last_pattern(&self) -> Option<LinePattern> {
        self.last_pattern
    }

    pub fn lines(&self) -> &L {
        &self.lines
    }

    fn force_enable_low(&mut self) {
        if let Err(err) = self.lines.write(Line::Enable, false) {
            warn!("failed to reset enable line: {err}");
        }
    }
}

impl<L: OutputLines, D: Delay> Drop for Transmitter<L, D> {
    fn drop(&mut self) {
        self.lines.release();
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::{cell::RefCell, rc::Rc, time::Duration};

    use super::Delay;
    use crate::{
        error::Error,
        lines::{Line, OutputLines},
    };

    #[derive(Debug, Clone, PartialEq)]
    pub enum Event {
        Write(Line, bool),
        Pause(Duration),
        Release,
    }

    /// Shared log of line writes and pauses, in call order.
    #[derive(Debug, Clone, Default)]
    pub struct Recorder {
        pub events: Rc<RefCell<Vec<Event>>>,
        pub fail_on: Option<Line>,
    }

    impl Recorder {
        pub fn events(&self) -> Vec<Event> {
            self.events.borrow().clone()
        }

        pub fn clear(&self) {
            self.events.borrow_mut().clear();
        }
    }

    impl OutputLines for Recorder {
        fn write(&mut self, line: Line, high: bool) -> Result<(), Error> {
            if self.fail_on == Some(line) && high {
                return Err(Error::HardwareUnavailable(format!("{line:?} stuck")));
            }
            self.events.borrow_mut().push(Event::Write(line, high));
            Ok(())
        }

        fn release(&mut self) {
            self.events.borrow_mut().push(Event::Release);
        }
    }

    impl Delay for Recorder {
        fn pause(&mut self, duration: Duration) {
            self.events.borrow_mut().push(Event::Pause(duration));
        }
    }
}
