//! In-memory doubles for the serial link and the CAN controller.
use std::collections::VecDeque;

use slcan_bridge::{AcceptanceFilter, CanBus, CanFrame, SerialPort};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockError;

/// Serial port fed from queued chunks; everything written is recorded.
#[derive(Default)]
#[allow(dead_code)]
pub struct MockSerial {
    pub input: VecDeque<Vec<u8>>,
    pub output: Vec<u8>,
    pub fail_reads: bool,
}

#[allow(dead_code)]
impl MockSerial {
    pub fn with_input(chunks: &[&[u8]]) -> Self {
        Self {
            input: chunks.iter().map(|chunk| chunk.to_vec()).collect(),
            ..Default::default()
        }
    }

    pub fn push_input(&mut self, chunk: &[u8]) {
        self.input.push_back(chunk.to_vec());
    }

    /// Returns and clears everything written so far
    pub fn take_output(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.output)
    }
}

impl SerialPort for MockSerial {
    type Error = MockError;

    fn read(&mut self, buffer: &mut [u8]) -> Result<usize, Self::Error> {
        if self.fail_reads {
            return Err(MockError);
        }

        let Some(mut chunk) = self.input.pop_front() else {
            return Ok(0);
        };

        let count = chunk.len().min(buffer.len());
        buffer[..count].copy_from_slice(&chunk[..count]);

        if count < chunk.len() {
            self.input.push_front(chunk.split_off(count));
        }

        Ok(count)
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        self.output.extend_from_slice(bytes);
        Ok(())
    }
}

/// CAN controller recording every configuration change and sent frame.
#[derive(Default)]
#[allow(dead_code)]
pub struct MockBus {
    pub bit_rates: Vec<u32>,
    pub filters: Vec<AcceptanceFilter>,
    pub sent: Vec<CanFrame>,
    pub reject_sends: bool,
    pub supported_rates: Option<Vec<u32>>,
}

impl CanBus for MockBus {
    type Error = MockError;

    fn configure_bit_rate(&mut self, hertz: u32) -> Result<(), Self::Error> {
        if let Some(supported) = &self.supported_rates {
            if !supported.contains(&hertz) {
                return Err(MockError);
            }
        }

        self.bit_rates.push(hertz);
        Ok(())
    }

    fn install_filter(&mut self, filter: AcceptanceFilter) -> Result<(), Self::Error> {
        self.filters.push(filter);
        Ok(())
    }

    fn send(&mut self, frame: &CanFrame) -> Result<(), Self::Error> {
        if self.reject_sends {
            return Err(MockError);
        }

        self.sent.push(*frame);
        Ok(())
    }
}
