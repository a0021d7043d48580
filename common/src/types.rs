use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// One of the four receiver channels served by a single transmitter module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct SocketId(u8);

impl SocketId {
    pub const ALL: [SocketId; 4] = [SocketId(1), SocketId(2), SocketId(3), SocketId(4)];

    pub fn new(value: u8) -> Result<Self, Error> {
        if (1..=4).contains(&value) {
            Ok(Self(value))
        } else {
            Err(Error::InvalidSocket(value.to_string()))
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for SocketId {
    type Error = Error;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        u8::try_from(value)
            .map_err(|_| Error::InvalidSocket(value.to_string()))
            .and_then(Self::new)
    }
}

impl From<SocketId> for u8 {
    fn from(socket: SocketId) -> Self {
        socket.0
    }
}

impl FromStr for SocketId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s
            .trim()
            .parse::<i64>()
            .map_err(|_| Error::InvalidSocket(s.to_string()))?;
        Self::try_from(value)
    }
}

impl fmt::Display for SocketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SwitchState {
    On,
    Off,
}

impl SwitchState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::On => "ON",
            Self::Off => "OFF",
        }
    }
}

impl fmt::Display for SwitchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Levels for the four transmitter data inputs, `b0..b3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LinePattern([bool; 4]);

impl LinePattern {
    pub(crate) const fn from_bits(bits: [bool; 4]) -> Self {
        Self(bits)
    }

    pub fn bits(self) -> [bool; 4] {
        self.0
    }
}

impl fmt::Display for LinePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for bit in self.0 {
            f.write_str(if bit { "1" } else { "0" })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn socket_accepts_only_one_to_four() {
        for value in 1..=4u8 {
            assert_eq!(SocketId::new(value).unwrap().get(), value);
        }
        assert!(matches!(SocketId::new(0), Err(Error::InvalidSocket(_))));
        assert!(matches!(SocketId::new(5), Err(Error::InvalidSocket(_))));
        assert!(matches!(SocketId::try_from(-1), Err(Error::InvalidSocket(_))));
        assert!(matches!(SocketId::try_from(260), Err(Error::InvalidSocket(_))));
    }

    #[test]
    fn socket_parses_from_text() {
        assert_eq!("3".parse::<SocketId>().unwrap().get(), 3);
        assert_eq!(" 2 ".parse::<SocketId>().unwrap().get(), 2);
        assert!(matches!("2.5".parse::<SocketId>(), Err(Error::InvalidSocket(_))));
        assert!(matches!("two".parse::<SocketId>(), Err(Error::InvalidSocket(_))));
        assert!(matches!("9".parse::<SocketId>(), Err(Error::InvalidSocket(_))));
    }

    #[test]
    fn socket_deserializes_with_validation() {
        let socket: SocketId = serde_json::from_str("4").unwrap();
        assert_eq!(socket.get(), 4);
        assert!(serde_json::from_str::<SocketId>("7").is_err());
    }

    #[test]
    fn pattern_displays_as_bits() {
        let pattern = LinePattern::from_bits([true, false, true, true]);
        assert_eq!(pattern.to_string(), "1011");
    }
}
