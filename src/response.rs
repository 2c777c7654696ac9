use heapless::Vec;

use crate::{
    codec::{byte_to_hex, push_all},
    frame::CanFrame,
    BELL, MAX_LINE_SIZE, TERMINATOR,
};

/// Bytes written back to the host, either in reply to a command or
/// unsolicited for a received frame.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Response {
    /// The command was handled
    Ack,
    /// The command was malformed, unknown or not allowed in the current state
    Bell,
    /// Reply to `F`
    Status(StatusFlags),
    /// Reply to `V`
    Version([u8; 4]),
    /// Reply to `N`
    SerialNumber([u8; 4]),
    /// Received a frame from the bus
    ReceivedFrame(CanFrame),
}

impl Response {
    /// Whether this is the reply to a successfully handled command
    pub fn is_handled(&self) -> bool {
        !matches!(self, Self::Bell | Self::ReceivedFrame(_))
    }

    pub fn as_bytes(&self) -> Vec<u8, MAX_LINE_SIZE> {
        let mut result = Vec::new();

        match self {
            Self::Ack => {}
            Self::Bell => push_all(&mut result, &[BELL]),
            Self::Status(flags) => {
                push_all(&mut result, b"F");
                push_all(&mut result, &byte_to_hex(flags.bits()));
            }
            Self::Version(version) => {
                push_all(&mut result, b"V");
                push_all(&mut result, version);
            }
            Self::SerialNumber(serial_number) => {
                push_all(&mut result, b"N");
                push_all(&mut result, serial_number);
            }
            Self::ReceivedFrame(can_frame) => return can_frame.as_line(),
        }

        if self.is_handled() {
            push_all(&mut result, &[TERMINATOR]);
        }

        result
    }
}

bitflags::bitflags! {
    /// Status byte reported by `F`. Bits 2..=7 (SJA1000 error flags) are
    /// always clear since the bus error state is not tracked.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct StatusFlags: u8 {
        const RX_QUEUE_FULL = 1 << 0;
        const TX_QUEUE_FULL = 1 << 1;
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for StatusFlags {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "StatusFlags({=u8:#04x})", self.bits());
    }
}
