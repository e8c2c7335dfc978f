//! Wire frames handed to the module UART.
//!
//! In fixed-transmission mode the first three bytes of a frame are the
//! destination address and channel; the module strips them before the
//! frame goes on the air. Frames are built in a fixed-capacity buffer, so
//! an oversized payload is rejected before anything is copied.

use heapless::Vec as FrameVec;

use crate::config::Configuration;
use crate::consts::{
    BROADCAST_ADDRESS, FIXED_PREFIX_LEN, HEADER_LEN, MAX_TX_PACKET, PL_CONFIGURATION,
    ProgramCommand, REG_ADDRESS_CFG, SaveType,
};
use crate::error::{LoraError, LoraResult};

/// Encoded frame, never longer than [`MAX_TX_PACKET`].
pub type WireFrame = FrameVec<u8, MAX_TX_PACKET>;

/// Largest payload of a fixed-address frame.
pub const MAX_FIXED_PAYLOAD: usize = MAX_TX_PACKET - FIXED_PREFIX_LEN;

/// Destination of a fixed-address frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedTarget {
    /// Address high byte.
    pub address_high: u8,
    /// Address low byte.
    pub address_low: u8,
    /// Channel.
    pub channel: u8,
}

impl FixedTarget {
    /// Single module.
    pub const fn new(address_high: u8, address_low: u8, channel: u8) -> Self {
        Self {
            address_high,
            address_low,
            channel,
        }
    }

    /// Every module on `channel`.
    pub const fn broadcast(channel: u8) -> Self {
        Self::new(BROADCAST_ADDRESS, BROADCAST_ADDRESS, channel)
    }

    /// Whether this is the broadcast address.
    pub const fn is_broadcast(&self) -> bool {
        self.address_high == BROADCAST_ADDRESS && self.address_low == BROADCAST_ADDRESS
    }
}

/// Transparent frame: the payload itself.
pub fn transparent(payload: &[u8]) -> LoraResult<WireFrame> {
    FrameVec::from_slice(payload).map_err(|_| LoraError::PacketTooBig)
}

/// Fixed-address frame: `addrH | addrL | channel | payload`.
pub fn fixed(target: FixedTarget, payload: &[u8]) -> LoraResult<WireFrame> {
    if payload.len() > MAX_FIXED_PAYLOAD {
        return Err(LoraError::PacketTooBig);
    }
    let mut frame = WireFrame::new();
    frame
        .extend_from_slice(&[target.address_high, target.address_low, target.channel])
        .map_err(|_| LoraError::PacketTooBig)?;
    frame
        .extend_from_slice(payload)
        .map_err(|_| LoraError::PacketTooBig)?;
    Ok(frame)
}

/// Split a fixed-address frame back into target and payload.
pub fn parse_fixed(frame: &[u8]) -> LoraResult<(FixedTarget, &[u8])> {
    if frame.len() < FIXED_PREFIX_LEN {
        return Err(LoraError::DataSizeMismatch);
    }
    if frame.len() > MAX_TX_PACKET {
        return Err(LoraError::PacketTooBig);
    }
    let target = FixedTarget::new(frame[0], frame[1], frame[2]);
    Ok((target, &frame[FIXED_PREFIX_LEN..]))
}

/// Body of an over-the-air configuration message: `CF CF` followed by a
/// register write command carrying `config`.
pub fn configuration_message(config: &Configuration, save: SaveType) -> LoraResult<WireFrame> {
    let mut body = WireFrame::new();
    let wifi = ProgramCommand::WifiConfig.byte();
    let header = [save.command().byte(), REG_ADDRESS_CFG, PL_CONFIGURATION];
    let prefix = [wifi, wifi];
    let record = config.encode();
    let parts: [&[u8]; 3] = [&prefix, &header, &record];
    for part in parts {
        body.extend_from_slice(part)
            .map_err(|_| LoraError::PacketTooBig)?;
    }
    debug_assert_eq!(body.len(), 2 + HEADER_LEN + PL_CONFIGURATION as usize);
    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_broadcast_hello() {
        let frame = fixed(FixedTarget::broadcast(0x04), b"HELLO").unwrap();
        assert_eq!(
            frame.as_slice(),
            &[0xFF, 0xFF, 0x04, 0x48, 0x45, 0x4C, 0x4C, 0x4F]
        );
    }

    #[test]
    fn test_length_law() {
        for len in [0usize, 1, 100, 197] {
            let payload = vec![0xAA; len];
            assert_eq!(fixed(FixedTarget::new(1, 2, 3), &payload).unwrap().len(), len + 3);
        }
        for len in [0usize, 1, 200] {
            assert_eq!(transparent(&vec![0x55; len]).unwrap().len(), len);
        }
    }

    #[test]
    fn test_oversize_rejected() {
        for len in [198usize, 199, 200, 201, 4096] {
            assert_eq!(
                fixed(FixedTarget::broadcast(4), &vec![0; len]),
                Err(LoraError::PacketTooBig)
            );
        }
        assert_eq!(transparent(&[0; 201]), Err(LoraError::PacketTooBig));
    }

    #[test]
    fn test_parse_fixed_returns_target_and_payload() {
        let target = FixedTarget::new(0x12, 0x34, 0x17);
        let frame = fixed(target, b"ping").unwrap();
        let (t, payload) = parse_fixed(&frame).unwrap();
        assert_eq!(t, target);
        assert_eq!(payload, b"ping");
        assert!(!t.is_broadcast());
        assert_eq!(parse_fixed(&[1, 2]), Err(LoraError::DataSizeMismatch));
    }

    #[test]
    fn test_configuration_message_layout() {
        let mut cfg = Configuration::default();
        cfg.address_high = 0x12;
        cfg.address_low = 0x34;
        let body = configuration_message(&cfg, SaveType::Volatile).unwrap();
        assert_eq!(&body[..5], &[0xCF, 0xCF, 0xC2, 0x00, 0x08]);
        assert_eq!(&body[5..], &cfg.encode());
    }
}
