use crate::{
    command::{BitTiming, Command, CommandKind, CommandParseError},
    frame::CanFrame,
    hal::CanBus,
    queue::{FrameQueue, FrameReceiver},
    response::{Response, StatusFlags},
    Config, QUEUE_CAPACITY,
};

/// Whether the adapter is taking part in bus traffic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AdapterState {
    /// Configuration mode, the initial state
    #[default]
    Closed,
    Open,
}

/// Acceptance code/mask pair, as set by `M` and `m`. Interpretation is left
/// to the bus driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AcceptanceFilter {
    pub code: u32,
    pub mask: u32,
}

/// Reasons a command line was rejected. All of them are answered with BEL.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DispatchError<E> {
    #[error("Failed to parse command")]
    Parse(#[from] CommandParseError),
    #[error("Command ({0:?}) is not allowed while the adapter is {1:?}")]
    NotAllowed(CommandKind, AdapterState),
    #[error("Bit timing ({0:?}) does not produce a usable bit rate")]
    UnsupportedBitTiming(BitTiming),
    #[error("Bus rejected the configuration: {0:?}")]
    Bus(E),
}

/// Open/closed state machine and command dispatcher.
///
/// Owns the transmit queue and the consuming end of the receive queue.
pub struct Adapter<'q> {
    config: Config,
    state: AdapterState,
    filter: AcceptanceFilter,
    transmit: FrameQueue<QUEUE_CAPACITY>,
    receive: FrameReceiver<'q>,
}

impl<'q> Adapter<'q> {
    pub fn new(config: Config, receive: FrameReceiver<'q>) -> Self {
        Self {
            config,
            state: AdapterState::Closed,
            filter: AcceptanceFilter::default(),
            transmit: FrameQueue::new(),
            receive,
        }
    }

    pub fn state(&self) -> AdapterState {
        self.state
    }

    pub fn filter(&self) -> AcceptanceFilter {
        self.filter
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn status(&self) -> StatusFlags {
        let mut flags = StatusFlags::empty();

        flags.set(StatusFlags::RX_QUEUE_FULL, self.receive.is_full());
        flags.set(StatusFlags::TX_QUEUE_FULL, self.transmit.is_full());

        flags
    }

    /// Next frame waiting to go out on the bus
    pub fn next_transmit(&mut self) -> Option<CanFrame> {
        self.transmit.pop_front()
    }

    /// Next frame received from the bus, waiting to go to the host
    pub fn next_received(&mut self) -> Option<CanFrame> {
        self.receive.pop_front()
    }

    /// Runs one command line (terminator included).
    ///
    /// Returns `Ok(None)` for an empty line, which gets no reply at all.
    /// Either the command takes full effect or nothing changes.
    pub fn dispatch<B: CanBus>(
        &mut self,
        line: &[u8],
        bus: &mut B,
    ) -> Result<Option<Response>, DispatchError<B::Error>> {
        if line.is_empty() {
            return Ok(None);
        }

        let command = Command::from_bytes(line)?;
        let kind = command.kind();

        if !kind.is_allowed_in(self.state) {
            return Err(DispatchError::NotAllowed(kind, self.state));
        }

        let response = match command {
            Command::Nop => Response::Ack,
            Command::SetBitRate(bit_rate) => {
                bus.configure_bit_rate(bit_rate.hertz())
                    .map_err(DispatchError::Bus)?;

                #[cfg(feature = "defmt")]
                defmt::info!("Bit rate set to {} Hz", bit_rate.hertz());

                Response::Ack
            }
            Command::SetBitTiming(timing) => {
                let hertz = timing
                    .bit_rate(self.config.oscillator_hz)
                    .ok_or(DispatchError::UnsupportedBitTiming(timing))?;

                bus.configure_bit_rate(hertz).map_err(DispatchError::Bus)?;

                #[cfg(feature = "defmt")]
                defmt::info!("Bit rate set to {} Hz from {}", hertz, timing);

                Response::Ack
            }
            Command::Open => {
                self.state = AdapterState::Open;

                #[cfg(feature = "defmt")]
                defmt::info!("Adapter opened");

                Response::Ack
            }
            Command::Close => {
                self.state = AdapterState::Closed;

                #[cfg(feature = "defmt")]
                defmt::info!("Adapter closed");

                Response::Ack
            }
            Command::ReadStatus => Response::Status(self.status()),
            Command::ReadVersion => Response::Version(self.config.version),
            Command::ReadSerialNumber => Response::SerialNumber(self.config.serial_number),
            Command::SetAcceptanceCode(code) => {
                self.apply_filter(AcceptanceFilter { code, ..self.filter }, bus)?
            }
            Command::SetAcceptanceMask(mask) => {
                self.apply_filter(AcceptanceFilter { mask, ..self.filter }, bus)?
            }
            Command::TransmitFrame(frame) => {
                // A full queue drops the frame; `F` reports it
                self.transmit.try_push(frame);

                Response::Ack
            }
        };

        Ok(Some(response))
    }

    /// Like [`dispatch`](Self::dispatch), with every rejection collapsed to
    /// [`Response::Bell`].
    pub fn handle<B: CanBus>(&mut self, line: &[u8], bus: &mut B) -> Option<Response> {
        match self.dispatch(line, bus) {
            Ok(response) => response,
            Err(_error) => {
                #[cfg(feature = "defmt")]
                defmt::debug!("Rejected command: {}", defmt::Debug2Format(&_error));

                Some(Response::Bell)
            }
        }
    }

    fn apply_filter<B: CanBus>(
        &mut self,
        filter: AcceptanceFilter,
        bus: &mut B,
    ) -> Result<Response, DispatchError<B::Error>> {
        bus.install_filter(filter).map_err(DispatchError::Bus)?;
        self.filter = filter;

        #[cfg(feature = "defmt")]
        defmt::info!("Acceptance filter set to {}", filter);

        Ok(Response::Ack)
    }
}
