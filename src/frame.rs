use embedded_can::Id;
use heapless::Vec;
use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::{
    codec::{
        byte_to_hex, dec_digit_to_u8, extended_id_from_hex, extended_id_to_hex, push_all,
        standard_id_from_hex, standard_id_to_hex, to_hex_digit, unpack_data_bytes,
    },
    MAX_LINE_SIZE, TERMINATOR,
};

/// Represents a classic CAN 2.0 frame which supports RTR (Remote Transmission
/// Request).
///
/// The DLC can be up to 8 bytes, and the data if absent means that it is an
/// RTR frame. For RTR frames the DLC is the requested length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CanFrame {
    #[cfg_attr(feature = "defmt", defmt(Debug2Format))]
    id: Id,
    dlc: usize,
    data: Option<[u8; 8]>,
}

impl CanFrame {
    /// Creates a new data frame. `data` must have a length in the range
    /// 0..=8 or else `None` will be returned instead.
    pub fn new_data(id: impl Into<Id>, data: &[u8]) -> Option<Self> {
        if data.len() > 8 {
            return None;
        }

        let mut copy = [0u8; 8];
        copy[..data.len()].copy_from_slice(data);

        Some(Self {
            id: id.into(),
            dlc: data.len(),
            data: Some(copy),
        })
    }

    /// Creates a new remote frame. `dlc` must be in the range 0..=8 or else
    /// `None` will be returned instead.
    pub fn new_remote(id: impl Into<Id>, dlc: usize) -> Option<Self> {
        if dlc > 8 {
            return None;
        }

        Some(Self {
            id: id.into(),
            dlc,
            data: None,
        })
    }

    /// Gets the message ID of the frame
    pub fn id(&self) -> Id {
        self.id
    }

    /// Gets the DLC (Data Length Code) of the frame
    pub fn dlc(&self) -> usize {
        self.dlc
    }

    /// Gets the data associated with the frame. Will return `None` if it is an
    /// RTR frame.
    pub fn data(&self) -> Option<&[u8]> {
        self.data.as_ref().map(|d| &d[..self.dlc])
    }

    pub fn is_remote(&self) -> bool {
        self.data.is_none()
    }

    pub fn is_extended(&self) -> bool {
        matches!(self.id, Id::Extended(_))
    }

    pub fn format(&self) -> FrameFormat {
        match (self.is_extended(), self.is_remote()) {
            (false, false) => FrameFormat::Standard,
            (true, false) => FrameFormat::Extended,
            (false, true) => FrameFormat::StandardRemote,
            (true, true) => FrameFormat::ExtendedRemote,
        }
    }
}

impl embedded_can::Frame for CanFrame {
    fn new(id: impl Into<Id>, data: &[u8]) -> Option<Self> {
        Self::new_data(id, data)
    }

    fn new_remote(id: impl Into<Id>, dlc: usize) -> Option<Self> {
        CanFrame::new_remote(id, dlc)
    }

    fn is_extended(&self) -> bool {
        CanFrame::is_extended(self)
    }

    fn is_remote_frame(&self) -> bool {
        self.is_remote()
    }

    fn id(&self) -> Id {
        self.id
    }

    fn dlc(&self) -> usize {
        self.dlc
    }

    fn data(&self) -> &[u8] {
        CanFrame::data(self).unwrap_or(&[])
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameParseError {
    #[error("Tried to parse an empty buffer")]
    Empty,
    #[error("Tried to decode frame format but it was invalid ({0:?})")]
    InvalidFrameFormat(u8),
    #[error("Expected {0:?} ID digits but only ({1:?}) bytes remained")]
    TruncatedId(usize, usize),
    #[error("Tried to decode a hex digit but it was out of range ({0:?})")]
    IllegalHexDigit(u8),
    #[error("Tried to decode a hex field of length ({0:?}), expected 1..=8 digits")]
    InvalidHexFieldLength(usize),
    #[error("Received a CAN Standard ID ({0:?}) that was out of the valid range (0..=0x7FF)")]
    StandardIdOutOfRange(u16),
    #[error("Received a CAN Extended ID ({0:?}) that was out of the valid range (0..=0x1FFFFFFF)")]
    ExtendedIdOutOfRange(u32),
    #[error("Received a data frame without a DLC digit")]
    MissingDataLengthCode,
    #[error("Tried to decode a decimal digit but it was out of range ({0:?})")]
    IllegalDecimalDigit(u8),
    #[error("Received a DLC ({0:?}) that was out of the valid range (0..=8)")]
    InvalidDataLengthCode(u8),
    #[error("Received encoded data with a length ({0:?}) that was not a multiple of 2")]
    InvalidEncodedDataLength(u8),
    #[error("Received a frame with expected length ({0:?}) but ({1:?}) bytes of data")]
    MismatchedDataLength(u8, usize),
    #[error("Received a remote frame with ({0:?}) bytes of additional data (should be empty)")]
    DataInRemoteFrame(usize),
}

/// Line prefix selecting the ID width and data/remote kind of a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[num_enum(error_type(name = FrameParseError, constructor = FrameParseError::InvalidFrameFormat))]
#[repr(u8)]
pub enum FrameFormat {
    /// `tiiil[dd..]`
    Standard = b't',
    /// `Tiiiiiiiil[dd..]`
    Extended = b'T',
    /// `riii[l]`
    StandardRemote = b'r',
    /// `Riiiiiiii[l]`
    ExtendedRemote = b'R',
}

impl FrameFormat {
    pub const fn is_extended(&self) -> bool {
        matches!(self, Self::Extended | Self::ExtendedRemote)
    }

    pub const fn is_remote(&self) -> bool {
        matches!(self, Self::StandardRemote | Self::ExtendedRemote)
    }

    const fn id_digits(&self) -> usize {
        if self.is_extended() {
            8
        } else {
            3
        }
    }
}

impl CanFrame {
    /// Decodes a frame line without its terminator, e.g. `t1232DEAD`.
    ///
    /// Decoding is all-or-nothing: any malformed field rejects the whole line.
    pub fn from_bytes(buffer: &[u8]) -> Result<Self, FrameParseError> {
        let (&prefix, fields) = buffer.split_first().ok_or(FrameParseError::Empty)?;
        let format: FrameFormat = prefix.try_into()?;

        let id_digits = format.id_digits();

        if fields.len() < id_digits {
            return Err(FrameParseError::TruncatedId(id_digits, fields.len()));
        }

        let (id_hex, remaining) = fields.split_at(id_digits);
        let truncated = |_| FrameParseError::TruncatedId(id_digits, id_hex.len());

        let id = if format.is_extended() {
            Id::Extended(extended_id_from_hex(id_hex.try_into().map_err(truncated)?)?)
        } else {
            Id::Standard(standard_id_from_hex(id_hex.try_into().map_err(truncated)?)?)
        };

        let Some((&dlc_byte, encoded_data_bytes)) = remaining.split_first() else {
            // `riii` without a DLC requests zero bytes
            return if format.is_remote() {
                Ok(Self {
                    id,
                    dlc: 0,
                    data: None,
                })
            } else {
                Err(FrameParseError::MissingDataLengthCode)
            };
        };

        let dlc = dec_digit_to_u8(dlc_byte)?;

        if dlc > 8 {
            return Err(FrameParseError::InvalidDataLengthCode(dlc));
        }

        if format.is_remote() {
            if !encoded_data_bytes.is_empty() {
                return Err(FrameParseError::DataInRemoteFrame(encoded_data_bytes.len()));
            }

            return Ok(Self {
                id,
                dlc: dlc as usize,
                data: None,
            });
        }

        let data = unpack_data_bytes(encoded_data_bytes, dlc as usize)?;

        Ok(Self {
            id,
            dlc: dlc as usize,
            data: Some(data),
        })
    }

    /// Encodes the frame as a terminated line for the host. Remote frames
    /// carry no DLC or data.
    pub fn as_line(&self) -> Vec<u8, MAX_LINE_SIZE> {
        let mut result = Vec::new();

        push_all(&mut result, &[self.format().into()]);

        match self.id {
            Id::Standard(standard_id) => push_all(&mut result, &standard_id_to_hex(standard_id)),
            Id::Extended(extended_id) => push_all(&mut result, &extended_id_to_hex(extended_id)),
        }

        if let Some(data) = self.data() {
            push_all(&mut result, &[to_hex_digit(self.dlc as u32)]);

            for byte in data {
                push_all(&mut result, &byte_to_hex(*byte));
            }
        }

        push_all(&mut result, &[TERMINATOR]);

        result
    }
}
