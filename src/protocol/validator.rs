//! Inbound frame validation (strict/extended modes), applied before a frame
//! is handed to message reassembly.

use crate::error::{Error, ProtocolError, Result};
use crate::protocol::frame::coding::{Control, Data, OpCode};
use crate::protocol::frame::FrameHeader;

/// Whether the validator enforces the RSV2/RSV3-must-be-zero and
/// known-opcode checks, or skips them for compatibility with peers that use
/// extensions this crate doesn't implement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidatorMode {
    /// Enforce every check in spec.
    Strict,
    /// Skip the reserved-bit and unknown-opcode checks.
    Extended,
}

impl Default for ValidatorMode {
    fn default() -> Self {
        ValidatorMode::Strict
    }
}

/// Validates inbound frames against RFC 6455, tracking whether a
/// fragmented message is currently open.
#[derive(Debug, Default)]
pub struct FrameValidator {
    mode: ValidatorMode,
    compression_active: bool,
    fragment_open: bool,
    fragment_compressed: bool,
}

impl FrameValidator {
    /// Create a validator. `compression_active` should reflect whether a
    /// per-message compression extension was negotiated for this
    /// connection, since that's the only case RSV1 is ever legal.
    pub fn new(mode: ValidatorMode, compression_active: bool) -> Self {
        FrameValidator {
            mode,
            compression_active,
            fragment_open: false,
            fragment_compressed: false,
        }
    }

    /// True if the accumulator for a fragmented message is open, i.e. a
    /// `fin=false` text/binary frame has been seen and no closing
    /// continuation frame has arrived yet.
    pub fn fragment_open(&self) -> bool {
        self.fragment_open
    }

    /// Whether the currently-open fragmented message started with RSV1 set.
    pub fn fragment_compressed(&self) -> bool {
        self.fragment_compressed
    }

    /// Validate one inbound frame header, updating fragmentation state.
    /// `payload_len` is used only to bound control-frame payloads.
    pub fn validate(&mut self, header: &FrameHeader, payload_len: usize) -> Result<()> {
        if matches!(self.mode, ValidatorMode::Strict) {
            if header.rsv2 || header.rsv3 {
                return Err(Error::Protocol(ProtocolError::UnexpectedReservedBit));
            }
            if header.rsv1 && !(self.compression_active && self.rsv1_allowed(header)) {
                return Err(Error::Protocol(ProtocolError::UnexpectedReservedBit));
            }
            if let OpCode::Data(Data::Reserved(_)) | OpCode::Control(Control::Reserved(_)) =
                header.opcode
            {
                return Err(Error::Protocol(ProtocolError::UnknownOpcode));
            }
        }

        if header.mask.is_some() {
            return Err(Error::Protocol(ProtocolError::FrameMasked));
        }

        if header.opcode.is_control() {
            if !header.is_final {
                return Err(Error::Protocol(ProtocolError::FragmentedControlFrame));
            }
            if payload_len > 125 {
                return Err(Error::Protocol(ProtocolError::TooLongControlFramePayload));
            }
        } else {
            self.validate_fragmentation(header)?;
        }

        Ok(())
    }

    fn rsv1_allowed(&self, header: &FrameHeader) -> bool {
        match header.opcode {
            OpCode::Data(Data::Text) | OpCode::Data(Data::Binary) => true,
            OpCode::Data(Data::Continue) => false,
            _ => false,
        }
    }

    fn validate_fragmentation(&mut self, header: &FrameHeader) -> Result<()> {
        match header.opcode {
            OpCode::Data(Data::Continue) => {
                if !self.fragment_open {
                    return Err(Error::Protocol(ProtocolError::UnexpectedContinueFrame));
                }
                if header.is_final {
                    self.fragment_open = false;
                    self.fragment_compressed = false;
                }
            }
            OpCode::Data(Data::Text) | OpCode::Data(Data::Binary) => {
                if self.fragment_open {
                    return Err(Error::Protocol(ProtocolError::ContinuationNotClosed));
                }
                if !header.is_final {
                    self.fragment_open = true;
                    self.fragment_compressed = header.rsv1;
                }
            }
            _ => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::frame::coding::OpCode;

    fn header(opcode: OpCode, is_final: bool) -> FrameHeader {
        FrameHeader { is_final, rsv1: false, rsv2: false, rsv3: false, opcode, mask: None }
    }

    #[test]
    fn rejects_rsv2_in_strict_mode() {
        let mut v = FrameValidator::new(ValidatorMode::Strict, false);
        let mut h = header(OpCode::Data(Data::Text), true);
        h.rsv2 = true;
        assert!(matches!(
            v.validate(&h, 0),
            Err(Error::Protocol(ProtocolError::UnexpectedReservedBit))
        ));
    }

    #[test]
    fn extended_mode_allows_unknown_opcode() {
        let mut v = FrameValidator::new(ValidatorMode::Extended, false);
        let h = header(OpCode::Data(Data::Reserved(5)), true);
        assert!(v.validate(&h, 0).is_ok());
    }

    #[test]
    fn rejects_masked_inbound_frame() {
        let mut v = FrameValidator::new(ValidatorMode::Strict, false);
        let mut h = header(OpCode::Data(Data::Text), true);
        h.mask = Some([0; 4]);
        assert!(matches!(v.validate(&h, 0), Err(Error::Protocol(ProtocolError::FrameMasked))));
    }

    #[test]
    fn rejects_fragmented_control_frame() {
        let mut v = FrameValidator::new(ValidatorMode::Strict, false);
        let h = header(OpCode::Control(Control::Ping), false);
        assert!(matches!(
            v.validate(&h, 0),
            Err(Error::Protocol(ProtocolError::FragmentedControlFrame))
        ));
    }

    #[test]
    fn continue_without_open_fragment_is_rejected() {
        let mut v = FrameValidator::new(ValidatorMode::Strict, false);
        let h = header(OpCode::Data(Data::Continue), true);
        assert!(matches!(
            v.validate(&h, 0),
            Err(Error::Protocol(ProtocolError::UnexpectedContinueFrame))
        ));
    }

    #[test]
    fn text_frame_while_fragment_open_is_rejected() {
        let mut v = FrameValidator::new(ValidatorMode::Strict, false);
        let start = header(OpCode::Data(Data::Text), false);
        v.validate(&start, 0).unwrap();
        let second = header(OpCode::Data(Data::Text), true);
        assert!(matches!(
            v.validate(&second, 0),
            Err(Error::Protocol(ProtocolError::ContinuationNotClosed))
        ));
    }

    #[test]
    fn fragmentation_round_trip_closes_accumulator() {
        let mut v = FrameValidator::new(ValidatorMode::Strict, false);
        v.validate(&header(OpCode::Data(Data::Text), false), 0).unwrap();
        assert!(v.fragment_open());
        v.validate(&header(OpCode::Data(Data::Continue), true), 0).unwrap();
        assert!(!v.fragment_open());
    }
}
