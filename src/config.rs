use crate::BitRate;

/// Identity and clocking of the adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    /// Reported by `V`
    pub version: [u8; 4],
    /// Reported by `N`
    pub serial_number: [u8; 4],
    /// Controller clock assumed when converting `s` bit timing registers
    pub oscillator_hz: u32,
    /// Bit rate applied before the host sends any command
    pub startup_bit_rate: BitRate,
}

impl Config {
    pub const DEFAULT_OSCILLATOR_HZ: u32 = 16_000_000;

    pub const fn new() -> Self {
        Self {
            version: *b"0000",
            serial_number: *b"0000",
            oscillator_hz: Self::DEFAULT_OSCILLATOR_HZ,
            startup_bit_rate: BitRate::Rate100Kbit,
        }
    }

    /// Returns `None` unless all four bytes are ASCII alphanumeric.
    pub const fn with_version(mut self, version: [u8; 4]) -> Option<Self> {
        if !is_alphanumeric(&version) {
            return None;
        }

        self.version = version;
        Some(self)
    }

    /// Returns `None` unless all four bytes are ASCII alphanumeric.
    pub const fn with_serial_number(mut self, serial_number: [u8; 4]) -> Option<Self> {
        if !is_alphanumeric(&serial_number) {
            return None;
        }

        self.serial_number = serial_number;
        Some(self)
    }

    pub const fn with_oscillator_hz(mut self, oscillator_hz: u32) -> Self {
        self.oscillator_hz = oscillator_hz;
        self
    }

    pub const fn with_startup_bit_rate(mut self, bit_rate: BitRate) -> Self {
        self.startup_bit_rate = bit_rate;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

const fn is_alphanumeric(raw: &[u8; 4]) -> bool {
    raw[0].is_ascii_alphanumeric()
        && raw[1].is_ascii_alphanumeric()
        && raw[2].is_ascii_alphanumeric()
        && raw[3].is_ascii_alphanumeric()
}

#[cfg(test)]
mod tests {
    use crate::{BitRate, Config};

    #[test]
    fn builders() {
        let config = Config::new()
            .with_version(*b"1013")
            .and_then(|config| config.with_serial_number(*b"AB12"))
            .unwrap()
            .with_oscillator_hz(8_000_000)
            .with_startup_bit_rate(BitRate::Rate500Kbit);

        assert_eq!(config.version, *b"1013");
        assert_eq!(config.serial_number, *b"AB12");
        assert_eq!(config.oscillator_hz, 8_000_000);
        assert_eq!(config.startup_bit_rate, BitRate::Rate500Kbit);

        assert_eq!(Config::default(), Config::new());
    }

    #[test]
    fn identifiers_must_be_alphanumeric() {
        assert!(Config::new().with_version(*b"1.0\r").is_none());
        assert!(Config::new().with_serial_number(*b"AB 1").is_none());
    }
}
