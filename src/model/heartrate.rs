//! Heart Rate Measurement Decoding
//!
//! This module parses the raw payload of the GATT Heart Rate Measurement
//! characteristic. Only the heart-rate value itself is decoded; the
//! sensor-contact, energy-expended and RR-interval fields are not inspected.

use std::fmt;

/// Helper macro to check if a specific bit is set in a byte.
macro_rules! is_bit_set {
    ($byte:expr, $pos:expr) => {
        ($byte & (1 << $pos)) != 0
    };
}

/// Represents one decoded Heart Rate Measurement notification.
///
/// The first payload byte is a flags bitfield. Bit 0 selects between an
/// 8-bit heart-rate value and a 16-bit little-endian one.
#[derive(Copy, Clone, Default, Debug, PartialEq, Eq)]
pub struct HeartrateMessage {
    /// Flags byte as delivered by the peripheral.
    flags: u8,
    /// Heart rate value in beats per minute (BPM).
    hr_value: u16,
}

impl HeartrateMessage {
    /// Constructs a new `HeartrateMessage` from raw notification data.
    ///
    /// # Arguments
    /// * `data` - A byte slice containing the raw measurement payload.
    ///
    /// # Panics
    /// Panics if the slice is shorter than the format selected by the flags
    /// byte. Peripheral data is trusted; a truncated payload is fatal.
    pub fn new(data: &[u8]) -> Self {
        assert!(
            data.len() > 1,
            "Invalid length: data must contain at least 2 bytes."
        );

        let flags = data[0];
        let hr_value = if is_bit_set!(flags, 0) {
            u16::from(data[1]) | (u16::from(data[2]) << 8)
        } else {
            u16::from(data[1])
        };

        HeartrateMessage { flags, hr_value }
    }

    /// Checks if the heart rate value uses the 16-bit representation.
    pub fn has_long_hr(&self) -> bool {
        is_bit_set!(self.flags, 0)
    }

    /// Returns the heart rate value in BPM.
    pub fn bpm(&self) -> u16 {
        self.hr_value
    }
}

impl fmt::Display for HeartrateMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} BPM (flags: 0b{:08b}, long: {})",
            self.hr_value,
            self.flags,
            self.has_long_hr()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_short_format() {
        let msg = HeartrateMessage::new(&[0x00, 72]);
        assert!(!msg.has_long_hr());
        assert_eq!(msg.bpm(), 72);
    }

    #[test]
    fn decodes_long_format_little_endian() {
        let msg = HeartrateMessage::new(&[0x01, 0x48, 0x00]);
        assert!(msg.has_long_hr());
        assert_eq!(msg.bpm(), 72);

        let msg = HeartrateMessage::new(&[0x01, 0x2C, 0x01]);
        assert_eq!(msg.bpm(), 300);
    }

    #[test]
    fn ignores_other_flag_bits() {
        // Sensor contact, energy expended and RR bits set, still 8-bit value.
        let msg = HeartrateMessage::new(&[0b0001_1110, 60, 0xFF, 0xFF]);
        assert_eq!(msg.bpm(), 60);
    }

    #[test]
    fn short_format_uses_second_byte_only() {
        let msg = HeartrateMessage::new(&[0x00, 0xFF, 0xAA]);
        assert_eq!(msg.bpm(), 255);
    }

    #[test]
    #[should_panic(expected = "Invalid length")]
    fn panics_on_truncated_payload() {
        HeartrateMessage::new(&[0x00]);
    }

    #[test]
    #[should_panic]
    fn panics_when_long_format_misses_high_byte() {
        HeartrateMessage::new(&[0x01, 0x48]);
    }
}
