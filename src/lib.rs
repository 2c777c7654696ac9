#![no_std]

mod adapter;
mod codec;
mod command;
mod config;
mod frame;
mod gateway;
mod hal;
mod queue;
mod response;
mod scanner;

// Transmit, Extended, 1FFFFFFF, DLC = 8, 0x00 * 8
// T 1FFFFFFF 8 0000000000000000 \r

const MAX_ID_SIZE: usize = 8;

const MAX_DECODED_DATA_LENGTH: usize = 8;
const MAX_ENCODED_DATA_LENGTH: usize = MAX_DECODED_DATA_LENGTH * 2;

/// Longest line the gateway reads or writes (prefix + id + dlc + data + CR)
pub const MAX_LINE_SIZE: usize = 1 + MAX_ID_SIZE + 1 + MAX_ENCODED_DATA_LENGTH + 1;

/// Byte that terminates every command and every reply line
pub const TERMINATOR: u8 = b'\r';
/// Reply byte for a rejected command
pub const BELL: u8 = 0x07;

/// Size of the buffer a single command line is assembled in
pub const COMMAND_BUFFER_SIZE: usize = 32;
/// Number of frames each of the transmit and receive queues can hold
pub const QUEUE_CAPACITY: usize = 32;

pub use adapter::*;
pub use command::*;
pub use config::*;
pub use frame::*;
pub use gateway::*;
pub use hal::*;
pub use queue::*;
pub use response::*;
pub use scanner::*;

pub use embedded_can::{ExtendedId, Id, StandardId};
