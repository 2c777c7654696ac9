/// Progress of a [`LineScanner`], derived from its counters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ScanState {
    /// Still waiting for the rest of the delimiter
    InProgress,
    /// The delimiter was found; [`LineScanner::span`] holds the line
    Finished,
    /// The buffer filled up before the delimiter was found
    Failed,
}

impl ScanState {
    /// Both `Finished` and `Failed` require a [`LineScanner::reset`] before
    /// feeding more bytes.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::InProgress)
    }
}

/// Fills a fixed buffer from a chunked byte stream until a delimiter
/// sequence has been copied in.
///
/// The delimiter is matched incrementally, so it may straddle chunk
/// boundaries. Bytes following the delimiter in a chunk are handed back by
/// [`feed`](Self::feed) untouched for the next line.
#[derive(Debug, Clone)]
pub struct LineScanner<const N: usize> {
    sequence: &'static [u8],
    buffer: [u8; N],
    fill_amount: usize,
    search_index: usize,
}

impl<const N: usize> LineScanner<N> {
    pub const fn new(sequence: &'static [u8]) -> Self {
        Self {
            sequence,
            buffer: [0; N],
            fill_amount: 0,
            search_index: 0,
        }
    }

    /// Clears the buffer and forgets any partial match
    pub fn reset(&mut self) {
        self.buffer.fill(0);
        self.fill_amount = 0;
        self.search_index = 0;
    }

    /// Copies bytes from `chunk` until the chunk is exhausted, the buffer is
    /// full or the delimiter completes. Returns the unconsumed tail.
    pub fn feed<'c>(&mut self, chunk: &'c [u8]) -> &'c [u8] {
        if self.state().is_terminal() {
            return chunk;
        }

        for (index, &byte) in chunk.iter().enumerate() {
            self.buffer[self.fill_amount] = byte;
            self.fill_amount += 1;
            self.search_index = self.advance_match(byte);

            if self.state().is_terminal() {
                return &chunk[index + 1..];
            }
        }

        &[]
    }

    pub fn state(&self) -> ScanState {
        if self.search_index == self.sequence.len() {
            ScanState::Finished
        } else if self.fill_amount == N {
            ScanState::Failed
        } else {
            ScanState::InProgress
        }
    }

    /// The bytes filled so far; once finished this is the line including its
    /// delimiter.
    pub fn span(&self) -> &[u8] {
        &self.buffer[..self.fill_amount]
    }

    /// Number of delimiter bytes matched after consuming `byte`.
    ///
    /// On a mismatch the search restarts from the longest delimiter prefix
    /// that still ends at `byte`.
    fn advance_match(&self, byte: u8) -> usize {
        let matched = self.search_index;

        if self.sequence[matched] == byte {
            return matched + 1;
        }

        (0..matched)
            .rev()
            .find(|&candidate| {
                self.sequence[candidate] == byte
                    && self.sequence[..candidate] == self.sequence[matched - candidate..matched]
            })
            .map_or(0, |candidate| candidate + 1)
    }
}
