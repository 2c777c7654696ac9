//! Capabilities the gateway needs from the board. Implementations live with
//! the platform bring-up code; received frames are delivered separately
//! through a [`FrameSender`](crate::FrameSender).

use crate::{frame::CanFrame, AcceptanceFilter};

/// Serial link to the host.
pub trait SerialPort {
    /// Error type.
    type Error: core::fmt::Debug;

    /// Copies whatever bytes have arrived into `buffer` and returns how many.
    /// Must not block waiting for data; returning `Ok(0)` is fine.
    fn read(&mut self, buffer: &mut [u8]) -> Result<usize, Self::Error>;

    /// Writes all of `bytes`.
    fn write(&mut self, bytes: &[u8]) -> Result<(), Self::Error>;
}

/// Bus configuration and transmission.
pub trait CanBus {
    /// Error type.
    type Error: core::fmt::Debug;

    /// Reconfigures the controller for `hertz`; errors if the rate cannot be
    /// produced.
    fn configure_bit_rate(&mut self, hertz: u32) -> Result<(), Self::Error>;

    /// Replaces the acceptance filter with `filter`.
    fn install_filter(&mut self, filter: AcceptanceFilter) -> Result<(), Self::Error>;

    /// Queues `frame` for transmission on the bus.
    fn send(&mut self, frame: &CanFrame) -> Result<(), Self::Error>;
}
