use std::borrow::Cow;

use tracing::{debug, warn};

use crate::{
    error::Error,
    lines::OutputLines,
    transmitter::{Delay, Transmitter},
    types::{SocketId, SwitchState},
};

pub const MAX_PAYLOAD_BYTES: usize = 512;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayOutcome {
    Sent(SwitchState),
    Ignored(String),
}

pub fn parse_command(payload: &str) -> Option<SwitchState> {
    match payload.trim().to_ascii_uppercase().as_str() {
        "ON" => Some(SwitchState::On),
        "OFF" => Some(SwitchState::Off),
        _ => None,
    }
}

/// Maps override payloads onto sends for one configured receiver.
#[derive(Debug, Clone, Copy)]
pub struct CommandGateway {
    socket: SocketId,
}

impl CommandGateway {
    pub fn new(socket: SocketId) -> Self {
        Self { socket }
    }

    pub fn socket(&self) -> SocketId {
        self.socket
    }

    /// Only hardware failures are errors; anything unrecognised is dropped.
    pub fn handle<L: OutputLines, D: Delay>(
        &self,
        payload: &str,
        transmitter: &mut Transmitter<L, D>,
    ) -> Result<GatewayOutcome, Error> {
        let Some(state) = parse_command(payload) else {
            warn!("unknown payload: {:?}", payload.trim());
            return Ok(GatewayOutcome::Ignored(payload.trim().to_string()));
        };

        transmitter.send(self.socket, state)?;
        Ok(GatewayOutcome::Sent(state))
    }

    /// Entry for raw transport bytes. Invalid UTF-8 sequences are skipped, not fatal.
    pub fn handle_bytes<L: OutputLines, D: Delay>(
        &self,
        payload: &[u8],
        transmitter: &mut Transmitter<L, D>,
    ) -> Result<GatewayOutcome, Error> {
        if payload.len() > MAX_PAYLOAD_BYTES {
            warn!("dropping oversized payload ({} bytes)", payload.len());
            return Ok(GatewayOutcome::Ignored(format!("{} bytes", payload.len())));
        }

        let text = match String::from_utf8_lossy(payload) {
            Cow::Borrowed(text) => Cow::Borrowed(text),
            Cow::Owned(lossy) => {
                debug!("skipping invalid utf8 in payload");
                Cow::Owned(lossy.replace(char::REPLACEMENT_CHARACTER, ""))
            }
        };
        self.handle(&text, transmitter)
    }
}
