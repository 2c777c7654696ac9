use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::{
    codec::u32_from_hex,
    frame::{CanFrame, FrameFormat},
    AdapterState, FrameParseError, TERMINATOR,
};

/// A single host command, decoded from one terminated line.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    /// A bare terminator, acknowledged without side effects
    Nop,
    SetBitRate(BitRate),
    SetBitTiming(BitTiming),
    Open,
    Close,
    ReadStatus,
    ReadVersion,
    ReadSerialNumber,
    SetAcceptanceCode(u32),
    SetAcceptanceMask(u32),
    TransmitFrame(CanFrame),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[num_enum(error_type(name = CommandParseError, constructor = CommandParseError::UnrecognizedCommand))]
#[repr(u8)]
pub enum CommandKind {
    Nop = b'\r',
    SetBitRate = b'S',
    SetBitTiming = b's',
    Open = b'O',
    Close = b'C',
    ReadStatus = b'F',
    ReadVersion = b'V',
    ReadSerialNumber = b'N',
    SetAcceptanceCode = b'M',
    SetAcceptanceMask = b'm',
    TransmitStandard = b't',
    TransmitExtended = b'T',
    TransmitStandardRemote = b'r',
    TransmitExtendedRemote = b'R',
}

impl CommandKind {
    /// Number of bytes after the command byte (terminator excluded), or
    /// `None` for frames whose length depends on their content.
    const fn get_data_length(&self) -> Option<usize> {
        match self {
            Self::Nop => Some(0),
            Self::SetBitRate => Some(1),
            Self::SetBitTiming => Some(4),
            Self::Open => Some(0),
            Self::Close => Some(0),
            Self::ReadStatus => Some(0),
            Self::ReadVersion => Some(0),
            Self::ReadSerialNumber => Some(0),
            Self::SetAcceptanceCode => Some(8),
            Self::SetAcceptanceMask => Some(8),
            Self::TransmitStandard
            | Self::TransmitExtended
            | Self::TransmitStandardRemote
            | Self::TransmitExtendedRemote => None,
        }
    }

    /// Whether the command may run while the adapter is in `state`.
    ///
    /// Bus configuration only happens while closed, traffic only while open.
    pub const fn is_allowed_in(&self, state: AdapterState) -> bool {
        match self {
            Self::Nop | Self::ReadVersion | Self::ReadSerialNumber => true,
            Self::SetBitRate
            | Self::SetBitTiming
            | Self::SetAcceptanceCode
            | Self::SetAcceptanceMask
            | Self::Open => matches!(state, AdapterState::Closed),
            Self::Close
            | Self::ReadStatus
            | Self::TransmitStandard
            | Self::TransmitExtended
            | Self::TransmitStandardRemote
            | Self::TransmitExtendedRemote => matches!(state, AdapterState::Open),
        }
    }
}

/// Standard bit rates selected with `Sn`
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[num_enum(error_type(name = CommandParseError, constructor = CommandParseError::InvalidBitRate))]
#[repr(u8)]
pub enum BitRate {
    /// Transmits and receives at 10 Kbit/s
    Rate10Kbit = b'0',
    /// Transmits and receives at 20 Kbit/s
    Rate20Kbit = b'1',
    /// Transmits and receives at 50 Kbit/s
    Rate50Kbit = b'2',
    /// Transmits and receives at 100 Kbit/s
    Rate100Kbit = b'3',
    /// Transmits and receives at 125 Kbit/s
    Rate125Kbit = b'4',
    /// Transmits and receives at 250 Kbit/s
    Rate250Kbit = b'5',
    /// Transmits and receives at 500 Kbit/s
    Rate500Kbit = b'6',
    /// Transmits and receives at 800 Kbit/s
    Rate800Kbit = b'7',
    /// Transmits and receives at 1 Mbit/s
    Rate1Mbit = b'8',
}

impl BitRate {
    pub const fn hertz(&self) -> u32 {
        match self {
            Self::Rate10Kbit => 10_000,
            Self::Rate20Kbit => 20_000,
            Self::Rate50Kbit => 50_000,
            Self::Rate100Kbit => 100_000,
            Self::Rate125Kbit => 125_000,
            Self::Rate250Kbit => 250_000,
            Self::Rate500Kbit => 500_000,
            Self::Rate800Kbit => 800_000,
            Self::Rate1Mbit => 1_000_000,
        }
    }
}

/// Raw SJA1000 style bus timing registers as sent with `sBBCC`.
///
/// BTR0: `SJW[7:6] BRP[5:0]`, BTR1: `SAM[7] TSEG2[6:4] TSEG1[3:0]`. Each field
/// stores its value minus one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BitTiming {
    pub btr0: u8,
    pub btr1: u8,
}

impl BitTiming {
    /// Bit rate prescaler, in oscillator periods per time quantum / 2
    pub const fn prescaler(&self) -> u32 {
        (self.btr0 & 0x3F) as u32 + 1
    }

    /// Time quanta before the sample point (after the sync segment)
    pub const fn tseg1(&self) -> u32 {
        (self.btr1 & 0x0F) as u32 + 1
    }

    /// Time quanta after the sample point
    pub const fn tseg2(&self) -> u32 {
        ((self.btr1 >> 4) & 0x07) as u32 + 1
    }

    /// Effective bit rate for a controller clocked at `oscillator_hz`, or
    /// `None` if the registers would produce a rate of zero.
    ///
    /// Computed as `osc / (2 * (BRP + 1) * (1 + (TSEG1 + 1) + (TSEG2 + 1)))`
    /// from the raw register fields, so `s031C` at 16 MHz is 125 kbit/s.
    pub const fn bit_rate(&self, oscillator_hz: u32) -> Option<u32> {
        let quanta = 1 + self.tseg1() + self.tseg2();
        let hertz = oscillator_hz / (2 * self.prescaler() * quanta);

        if hertz == 0 {
            None
        } else {
            Some(hertz)
        }
    }
}

/// Various errors which can arise while parsing a command line
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CommandParseError {
    /* Generic message parsing */
    #[error("Tried to parse an empty buffer")]
    Empty,
    #[error("Received a line without the terminating CR")]
    MissingTerminator,
    #[error("Received a command with an unrecognized specifier ({0:?})")]
    UnrecognizedCommand(u8),
    #[error("Received a command ({0:?}) with ({1:?}) data bytes but expected ({2:?})")]
    InvalidLength(CommandKind, usize, usize),

    /* Option Parsing */
    #[error("Tried to decode bit rate but it was invalid ({0:?})")]
    InvalidBitRate(u8),

    /* Field Parsing */
    #[error("Failed to parse command field")]
    InvalidField(#[from] FrameParseError),
}

impl Command {
    pub fn kind(&self) -> CommandKind {
        match self {
            Self::Nop => CommandKind::Nop,
            Self::SetBitRate(_) => CommandKind::SetBitRate,
            Self::SetBitTiming(_) => CommandKind::SetBitTiming,
            Self::Open => CommandKind::Open,
            Self::Close => CommandKind::Close,
            Self::ReadStatus => CommandKind::ReadStatus,
            Self::ReadVersion => CommandKind::ReadVersion,
            Self::ReadSerialNumber => CommandKind::ReadSerialNumber,
            Self::SetAcceptanceCode(_) => CommandKind::SetAcceptanceCode,
            Self::SetAcceptanceMask(_) => CommandKind::SetAcceptanceMask,
            Self::TransmitFrame(frame) => match frame.format() {
                FrameFormat::Standard => CommandKind::TransmitStandard,
                FrameFormat::Extended => CommandKind::TransmitExtended,
                FrameFormat::StandardRemote => CommandKind::TransmitStandardRemote,
                FrameFormat::ExtendedRemote => CommandKind::TransmitExtendedRemote,
            },
        }
    }

    /// Decodes a full command line, terminator included.
    pub fn from_bytes(buffer: &[u8]) -> Result<Self, CommandParseError> {
        if buffer.is_empty() {
            return Err(CommandParseError::Empty);
        }

        let Some((&TERMINATOR, line)) = buffer.split_last() else {
            return Err(CommandParseError::MissingTerminator);
        };

        let Some((&kind_byte, command_data)) = line.split_first() else {
            return Ok(Self::Nop);
        };

        let kind: CommandKind = kind_byte.try_into()?;

        /* Validate data length */

        if let Some(expected) = kind.get_data_length() {
            if command_data.len() != expected {
                return Err(CommandParseError::InvalidLength(
                    kind,
                    command_data.len(),
                    expected,
                ));
            }
        }

        /* Parse data bytes */

        Ok(match kind {
            CommandKind::Nop => Self::Nop,
            CommandKind::SetBitRate => Self::SetBitRate(command_data[0].try_into()?),
            CommandKind::SetBitTiming => Self::SetBitTiming(BitTiming {
                btr0: u32_from_hex(&command_data[..2])? as u8,
                btr1: u32_from_hex(&command_data[2..])? as u8,
            }),
            CommandKind::Open => Self::Open,
            CommandKind::Close => Self::Close,
            CommandKind::ReadStatus => Self::ReadStatus,
            CommandKind::ReadVersion => Self::ReadVersion,
            CommandKind::ReadSerialNumber => Self::ReadSerialNumber,
            CommandKind::SetAcceptanceCode => Self::SetAcceptanceCode(u32_from_hex(command_data)?),
            CommandKind::SetAcceptanceMask => Self::SetAcceptanceMask(u32_from_hex(command_data)?),
            CommandKind::TransmitStandard
            | CommandKind::TransmitExtended
            | CommandKind::TransmitStandardRemote
            | CommandKind::TransmitExtendedRemote => Self::TransmitFrame(CanFrame::from_bytes(line)?),
        })
    }
}

#[cfg(test)]
mod tests {
    use embedded_can::{ExtendedId, StandardId};

    use crate::{
        AdapterState, BitRate, BitTiming, CanFrame, Command, CommandKind, CommandParseError,
        FrameParseError,
    };

    #[test]
    fn command_parse_errors() {
        assert_eq!(Command::from_bytes(b""), Err(CommandParseError::Empty));

        assert_eq!(
            Command::from_bytes(b"O"),
            Err(CommandParseError::MissingTerminator)
        );

        assert_eq!(
            Command::from_bytes(b"X\r"),
            Err(CommandParseError::UnrecognizedCommand(b'X'))
        );

        assert_eq!(
            Command::from_bytes(b"S\r"),
            Err(CommandParseError::InvalidLength(CommandKind::SetBitRate, 0, 1))
        );

        assert_eq!(
            Command::from_bytes(b"S12\r"),
            Err(CommandParseError::InvalidLength(CommandKind::SetBitRate, 2, 1))
        );

        assert_eq!(
            Command::from_bytes(b"S9\r"),
            Err(CommandParseError::InvalidBitRate(b'9'))
        );

        assert_eq!(
            Command::from_bytes(b"O1\r"),
            Err(CommandParseError::InvalidLength(CommandKind::Open, 1, 0))
        );

        assert_eq!(
            Command::from_bytes(b"s03G1\r"),
            Err(CommandParseError::InvalidField(
                FrameParseError::IllegalHexDigit(b'G')
            ))
        );

        assert_eq!(
            Command::from_bytes(b"M1234567\r"),
            Err(CommandParseError::InvalidLength(
                CommandKind::SetAcceptanceCode,
                7,
                8
            ))
        );

        assert_eq!(
            Command::from_bytes(b"t123\r"),
            Err(CommandParseError::InvalidField(
                FrameParseError::MissingDataLengthCode
            ))
        );

        assert_eq!(
            Command::from_bytes(b"t1234AB\r"),
            Err(CommandParseError::InvalidField(
                FrameParseError::MismatchedDataLength(4, 1)
            ))
        );
    }

    #[test]
    fn parse_simple_commands() {
        assert_eq!(Command::from_bytes(b"\r"), Ok(Command::Nop));
        assert_eq!(Command::from_bytes(b"O\r"), Ok(Command::Open));
        assert_eq!(Command::from_bytes(b"C\r"), Ok(Command::Close));
        assert_eq!(Command::from_bytes(b"F\r"), Ok(Command::ReadStatus));
        assert_eq!(Command::from_bytes(b"V\r"), Ok(Command::ReadVersion));
        assert_eq!(Command::from_bytes(b"N\r"), Ok(Command::ReadSerialNumber));

        assert_eq!(
            Command::from_bytes(b"M000007FF\r"),
            Ok(Command::SetAcceptanceCode(0x7FF))
        );
        assert_eq!(
            Command::from_bytes(b"mFFFFFFFF\r"),
            Ok(Command::SetAcceptanceMask(0xFFFF_FFFF))
        );
    }

    #[test]
    fn standard_bit_rate_table() {
        let expected = [
            10_000, 20_000, 50_000, 100_000, 125_000, 250_000, 500_000, 800_000, 1_000_000,
        ];

        for (digit, hertz) in (b'0'..=b'8').zip(expected) {
            let Ok(Command::SetBitRate(rate)) = Command::from_bytes(&[b'S', digit, b'\r']) else {
                panic!("S{} was not accepted", digit as char);
            };

            assert_eq!(rate.hertz(), hertz);
            assert_eq!(u8::from(rate), digit);
        }

        for digit in [b'9', b'A', b'/', b' '] {
            assert!(Command::from_bytes(&[b'S', digit, b'\r']).is_err());
        }
    }

    #[test]
    fn parse_bit_timing() {
        let Ok(Command::SetBitTiming(timing)) = Command::from_bytes(b"s031C\r") else {
            panic!("bit timing was not accepted");
        };

        assert_eq!(timing, BitTiming { btr0: 0x03, btr1: 0x1C });
        assert_eq!(timing.prescaler(), 4);
        assert_eq!(timing.tseg1(), 13);
        assert_eq!(timing.tseg2(), 2);
        assert_eq!(timing.bit_rate(16_000_000), Some(125_000));

        // SJW and SAM bits do not take part in the rate
        let timing = BitTiming { btr0: 0xC0, btr1: 0x94 };
        assert_eq!(timing.prescaler(), 1);
        assert_eq!(timing.tseg1(), 5);
        assert_eq!(timing.tseg2(), 2);
        assert_eq!(timing.bit_rate(16_000_000), Some(1_000_000));

        let slowest = BitTiming { btr0: 0x3F, btr1: 0x7F };
        assert_eq!(slowest.bit_rate(1_000), None);
    }

    #[test]
    fn parse_transmit_commands() {
        assert_eq!(
            Command::from_bytes(b"t1230\r"),
            Ok(Command::TransmitFrame(
                CanFrame::new_data(StandardId::new(0x123).unwrap(), &[]).unwrap()
            ))
        );

        let command = Command::from_bytes(b"T1ABCDEF02BEEF\r").unwrap();
        assert_eq!(command.kind(), CommandKind::TransmitExtended);
        assert_eq!(
            command,
            Command::TransmitFrame(
                CanFrame::new_data(ExtendedId::new(0x1ABCDEF0).unwrap(), &[0xBE, 0xEF]).unwrap()
            )
        );

        let command = Command::from_bytes(b"r1238\r").unwrap();
        assert_eq!(command.kind(), CommandKind::TransmitStandardRemote);

        let command = Command::from_bytes(b"R00000123\r").unwrap();
        assert_eq!(command.kind(), CommandKind::TransmitExtendedRemote);
    }

    #[test]
    fn state_gating() {
        use AdapterState::{Closed, Open};

        for kind in [
            CommandKind::SetBitRate,
            CommandKind::SetBitTiming,
            CommandKind::SetAcceptanceCode,
            CommandKind::SetAcceptanceMask,
            CommandKind::Open,
        ] {
            assert!(kind.is_allowed_in(Closed));
            assert!(!kind.is_allowed_in(Open));
        }

        for kind in [
            CommandKind::Close,
            CommandKind::ReadStatus,
            CommandKind::TransmitStandard,
            CommandKind::TransmitExtended,
            CommandKind::TransmitStandardRemote,
            CommandKind::TransmitExtendedRemote,
        ] {
            assert!(!kind.is_allowed_in(Closed));
            assert!(kind.is_allowed_in(Open));
        }

        for kind in [
            CommandKind::Nop,
            CommandKind::ReadVersion,
            CommandKind::ReadSerialNumber,
        ] {
            assert!(kind.is_allowed_in(Closed));
            assert!(kind.is_allowed_in(Open));
        }
    }

    #[test]
    fn bit_rate_conversions() {
        assert_eq!(BitRate::try_from(b'3'), Ok(BitRate::Rate100Kbit));
        assert_eq!(
            BitRate::try_from(b'x'),
            Err(CommandParseError::InvalidBitRate(b'x'))
        );
    }
}
