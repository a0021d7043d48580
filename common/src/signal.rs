//! Fixed 4-bit codes understood by the Energenie four-channel transmitter.
//!
//! `b0..b1` select the receiver, `b2` is always high and `b3` carries the
//! requested state.

use crate::types::{LinePattern, SocketId, SwitchState};

const ON_CODES: [[bool; 4]; 4] = [
    [true, true, true, true],
    [false, true, true, true],
    [true, false, true, true],
    [false, false, true, true],
];

const OFF_CODES: [[bool; 4]; 4] = [
    [true, true, true, false],
    [false, true, true, false],
    [true, false, true, false],
    [false, false, true, false],
];

pub fn encode(socket: SocketId, state: SwitchState) -> LinePattern {
    let index = usize::from(socket.get() - 1);
    let bits = match state {
        SwitchState::On => ON_CODES[index],
        SwitchState::Off => OFF_CODES[index],
    };
    LinePattern::from_bits(bits)
}

pub fn decode(pattern: LinePattern) -> Option<(SocketId, SwitchState)> {
    let bits = pattern.bits();
    SocketId::ALL.into_iter().find_map(|socket| {
        let index = usize::from(socket.get() - 1);
        if ON_CODES[index] == bits {
            Some((socket, SwitchState::On))
        } else if OFF_CODES[index] == bits {
            Some((socket, SwitchState::Off))
        } else {
            None
        }
    })
}
