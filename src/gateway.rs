use core::ops::Range;

use crate::{
    adapter::Adapter,
    hal::{CanBus, SerialPort},
    queue::FrameReceiver,
    response::Response,
    scanner::{LineScanner, ScanState},
    Config, COMMAND_BUFFER_SIZE, TERMINATOR,
};

/// Most bytes pulled from the serial port per poll
pub const READ_CHUNK_SIZE: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GatewayError<S, B> {
    #[error("Serial port error: {0:?}")]
    Serial(S),
    #[error("CAN bus error: {0:?}")]
    Bus(B),
}

/// Polling loop tying the serial link, the command adapter and the bus
/// together.
pub struct Gateway<'q, S, B> {
    serial: S,
    bus: B,
    adapter: Adapter<'q>,
    scanner: LineScanner<COMMAND_BUFFER_SIZE>,
    read_buffer: [u8; READ_CHUNK_SIZE],
    /// Bytes of `read_buffer` not yet fed to the scanner
    pending: Range<usize>,
}

impl<'q, S: SerialPort, B: CanBus> Gateway<'q, S, B> {
    /// Applies the startup bit rate from `config` and starts closed.
    pub fn new(
        serial: S,
        mut bus: B,
        receive: FrameReceiver<'q>,
        config: Config,
    ) -> Result<Self, B::Error> {
        bus.configure_bit_rate(config.startup_bit_rate.hertz())?;

        Ok(Self {
            serial,
            bus,
            adapter: Adapter::new(config, receive),
            scanner: LineScanner::new(&[TERMINATOR]),
            read_buffer: [0; READ_CHUNK_SIZE],
            pending: 0..0,
        })
    }

    pub fn adapter(&self) -> &Adapter<'q> {
        &self.adapter
    }

    pub fn serial(&self) -> &S {
        &self.serial
    }

    pub fn serial_mut(&mut self) -> &mut S {
        &mut self.serial
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    /// One loop iteration: scan one chunk of input (replying to a completed
    /// command), send one queued frame to the bus and forward one received
    /// frame to the host.
    pub fn poll(&mut self) -> Result<(), GatewayError<S::Error, B::Error>> {
        self.scan_input()?;

        if let Some(frame) = self.adapter.next_transmit() {
            self.bus.send(&frame).map_err(GatewayError::Bus)?;
        }

        if let Some(frame) = self.adapter.next_received() {
            self.serial
                .write(&Response::ReceivedFrame(frame).as_bytes())
                .map_err(GatewayError::Serial)?;
        }

        Ok(())
    }

    /// Polls forever, calling `delay` between iterations. Collaborator errors
    /// are logged and skipped.
    pub fn run(&mut self, mut delay: impl FnMut()) -> ! {
        loop {
            if let Err(_error) = self.poll() {
                #[cfg(feature = "defmt")]
                defmt::error!("Gateway poll failed: {}", defmt::Debug2Format(&_error));
            }

            delay();
        }
    }

    fn scan_input(&mut self) -> Result<(), GatewayError<S::Error, B::Error>> {
        if self.pending.is_empty() {
            let count = self
                .serial
                .read(&mut self.read_buffer)
                .map_err(GatewayError::Serial)?;

            self.pending = 0..count.min(READ_CHUNK_SIZE);
        }

        let chunk = &self.read_buffer[self.pending.clone()];
        let remainder = self.scanner.feed(chunk);
        self.pending.start = self.pending.end - remainder.len();

        match self.scanner.state() {
            ScanState::InProgress => Ok(()),
            ScanState::Failed => {
                #[cfg(feature = "defmt")]
                defmt::warn!(
                    "No terminator within {} bytes, discarding input",
                    COMMAND_BUFFER_SIZE
                );

                self.scanner.reset();
                Ok(())
            }
            ScanState::Finished => {
                let response = self.adapter.handle(self.scanner.span(), &mut self.bus);
                self.scanner.reset();

                match response {
                    Some(response) => self
                        .serial
                        .write(&response.as_bytes())
                        .map_err(GatewayError::Serial),
                    None => Ok(()),
                }
            }
        }
    }
}
