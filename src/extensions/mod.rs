//! WebSocket extensions

pub mod compression;

use crate::protocol::frame::coding::Data;
use crate::protocol::frame::{ExtensionHeaders, Frame};
use crate::Message;

/// A WebSocket extension that can transform outgoing frames and reassemble
/// incoming data frames into messages.
pub trait WebSocketExtension {
    /// Called when a data frame is about to be sent. Control frames never
    /// pass through this hook.
    fn on_send_frame(&mut self, frame: Frame) -> Result<Frame, crate::Error> {
        Ok(frame)
    }

    /// Called with each unmasked data frame received, in order. `header`
    /// captures the reserved bits of the received frame since the payload
    /// itself has already been split out; returns the completed message once
    /// `is_final` closes a (possibly fragmented) run of frames.
    fn on_receive_frame(
        &mut self,
        data_opcode: Data,
        is_final: bool,
        header: ExtensionHeaders,
        payload: Vec<u8>,
    ) -> Result<Option<Message>, crate::Error>;
}
