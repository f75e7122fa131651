//! Logical radio parameters
//!
//! [`RadioConfiguration`] holds the handful of settings the driver turns into a
//! full register program. It is set once, handed to [`Radio::new`](crate::Radio::new),
//! and only read afterwards.

use heapless::Vec;

use crate::registers::{
    Bitrate, LoraBandwidth, Modulation, PaSelect, PreamblePolarity, RampTime, RxBandwidth,
    Shaping, MAX_SYNC_SIZE,
};
use crate::Error;

/// Number of entries in each bandwidth table
pub const BANDWIDTH_COUNT: usize = 22;

/// Largest packet the FIFO can hold
pub const MAX_PACKET_LEN: usize = 256;

/// Largest LoRa payload, bounded by the 8-bit payload length register
pub const MAX_LORA_PACKET_LEN: usize = 255;

/// Largest preamble detector error tolerance
pub const MAX_PREAMBLE_ERRORS: u8 = 0x1F;

/// FSK/OOK receiver bandwidth by bandwidth index
pub static FSK_BANDWIDTHS: [RxBandwidth; BANDWIDTH_COUNT] = [
    RxBandwidth::Khz2_6,
    RxBandwidth::Khz3_1,
    RxBandwidth::Khz3_9,
    RxBandwidth::Khz5_2,
    RxBandwidth::Khz6_3,
    RxBandwidth::Khz7_8,
    RxBandwidth::Khz10_4,
    RxBandwidth::Khz12_5,
    RxBandwidth::Khz15_6,
    RxBandwidth::Khz20_8,
    RxBandwidth::Khz25_0,
    RxBandwidth::Khz31_3,
    RxBandwidth::Khz41_7,
    RxBandwidth::Khz50_0,
    RxBandwidth::Khz62_5,
    RxBandwidth::Khz83_3,
    RxBandwidth::Khz100_0,
    RxBandwidth::Khz125_0,
    RxBandwidth::Khz166_7,
    RxBandwidth::Khz200_0,
    RxBandwidth::Khz250_0,
    RxBandwidth::Khz250_0,
];

/// LoRa signal bandwidth by bandwidth index.
///
/// LoRa only offers ten bandwidths, so neighbouring indices share a code.
pub static LORA_BANDWIDTHS: [LoraBandwidth; BANDWIDTH_COUNT] = [
    LoraBandwidth::Khz7_8,
    LoraBandwidth::Khz7_8,
    LoraBandwidth::Khz7_8,
    LoraBandwidth::Khz7_8,
    LoraBandwidth::Khz7_8,
    LoraBandwidth::Khz7_8,
    LoraBandwidth::Khz10_4,
    LoraBandwidth::Khz15_6,
    LoraBandwidth::Khz15_6,
    LoraBandwidth::Khz20_8,
    LoraBandwidth::Khz31_25,
    LoraBandwidth::Khz31_25,
    LoraBandwidth::Khz41_7,
    LoraBandwidth::Khz62_5,
    LoraBandwidth::Khz62_5,
    LoraBandwidth::Khz125,
    LoraBandwidth::Khz125,
    LoraBandwidth::Khz125,
    LoraBandwidth::Khz250,
    LoraBandwidth::Khz250,
    LoraBandwidth::Khz250,
    LoraBandwidth::Khz500,
];

/// Nominal bandwidth in Hz by bandwidth index
pub static BANDWIDTH_HZ: [u32; BANDWIDTH_COUNT] = [
    2_604, 3_125, 3_906, 5_208, 6_250, 7_812, 10_416, 12_500, 15_625, 20_833, 25_000, 31_250,
    41_666, 50_000, 62_500, 83_333, 100_000, 125_000, 166_666, 200_000, 250_000, 500_000,
];

/// Logical radio parameters
///
/// # Important Notes
/// - `bandwidth` is an index into [`FSK_BANDWIDTHS`] or [`LORA_BANDWIDTHS`]
///   depending on `modulation`, and must be below [`BANDWIDTH_COUNT`]
/// - `bitrate`, `deviation`, preamble, sync and OOK settings only apply to FSK/OOK
/// - A `payload_length` of zero selects variable length (LoRa explicit header,
///   FSK/OOK continuous mode)
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RadioConfiguration {
    /// Carrier frequency in Hz
    pub frequency: u32,
    /// Modem selection
    pub modulation: Modulation,
    /// Bandwidth index, 0..=21
    pub bandwidth: u8,
    /// Bit rate in bit/s (FSK/OOK)
    pub bitrate: u32,
    /// Frequency deviation in Hz (FSK)
    pub deviation: u32,
    /// Fixed payload length, 0 for variable length
    pub payload_length: u16,
    /// Append and check a payload CRC
    pub crc_enable: bool,
    /// PA output pin
    pub pa_pin: PaSelect,
    /// PA output level in dBm, clamped to the pin's range
    pub pa_power: u8,
    /// PA ramp time
    pub pa_ramp: RampTime,
    /// Modulation shaping
    pub shaping: Shaping,
    /// Sync word, up to 8 bytes; empty disables sync detection
    pub sync_value: Vec<u8, MAX_SYNC_SIZE>,
    /// Preamble length in bytes; 1..=3 also enables the preamble detector
    pub preamble_size: u8,
    /// Preamble bit pattern
    pub preamble_polarity: PreamblePolarity,
    /// Preamble detector error tolerance, 0..=31
    pub preamble_errors: u8,
    /// Enable the bit synchronizer
    pub bit_sync: bool,
    /// Stay in receive between transmissions
    pub rx_start: bool,
    /// Receiver floor in dBm
    pub rx_floor: f32,
}

impl Default for RadioConfiguration {
    fn default() -> Self {
        Self {
            frequency: 433_920_000,
            modulation: Modulation::Fsk,
            bandwidth: 10,
            bitrate: 4_800,
            deviation: 5_000,
            payload_length: 0,
            crc_enable: true,
            pa_pin: PaSelect::Boost,
            pa_power: 17,
            pa_ramp: RampTime::Us40,
            shaping: Shaping::None,
            sync_value: Vec::new(),
            preamble_size: 2,
            preamble_polarity: PreamblePolarity::Aa,
            preamble_errors: 0,
            bit_sync: true,
            rx_start: true,
            rx_floor: -94.0,
        }
    }
}

impl RadioConfiguration {
    /// Checks every parameter that indexes a table or sizes a register field.
    ///
    /// # Errors
    /// * `Error::InvalidBandwidth` - bandwidth index outside 0..=21
    /// * `Error::InvalidBitrate` - FSK/OOK bitrate of zero or below ~489 bit/s
    /// * `Error::InvalidPayloadLength` - longer than the modem can frame
    /// * `Error::InvalidPreambleErrors` - tolerance above 31
    pub fn validate(&self) -> Result<(), Error> {
        if self.bandwidth as usize >= BANDWIDTH_COUNT {
            return Err(Error::InvalidBandwidth(self.bandwidth));
        }

        let max_payload = match self.modulation {
            Modulation::Lora => MAX_LORA_PACKET_LEN,
            Modulation::Fsk | Modulation::Ook => {
                if Bitrate::from_bps(self.bitrate).is_none() {
                    return Err(Error::InvalidBitrate(self.bitrate));
                }
                MAX_PACKET_LEN
            }
        };
        if self.payload_length as usize > max_payload {
            return Err(Error::InvalidPayloadLength(self.payload_length));
        }

        if self.preamble_errors > MAX_PREAMBLE_ERRORS {
            return Err(Error::InvalidPreambleErrors(self.preamble_errors));
        }

        Ok(())
    }

    /// True when a fixed payload length is configured
    pub fn is_fixed_length(&self) -> bool {
        self.payload_length > 0
    }

    /// Receiver floor in half-dB steps, rounded half away from zero
    pub(crate) fn rx_floor_half_db(&self) -> i32 {
        let half_db = self.rx_floor * 2.0;
        if half_db >= 0.0 {
            (half_db + 0.5) as i32
        } else {
            (half_db - 0.5) as i32
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_configuration_is_valid() {
        assert_eq!(RadioConfiguration::default().validate(), Ok(()));
    }

    #[test]
    fn bandwidth_index_is_bounded() {
        let config = RadioConfiguration {
            bandwidth: 21,
            ..Default::default()
        };
        assert_eq!(config.validate(), Ok(()));

        let config = RadioConfiguration {
            bandwidth: 22,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(Error::InvalidBandwidth(22)));
    }

    #[test]
    fn bitrate_only_checked_for_fsk_and_ook() {
        let config = RadioConfiguration {
            bitrate: 0,
            modulation: Modulation::Ook,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(Error::InvalidBitrate(0)));

        let config = RadioConfiguration {
            modulation: Modulation::Lora,
            ..config
        };
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn payload_length_limits_depend_on_modem() {
        let config = RadioConfiguration {
            payload_length: 256,
            ..Default::default()
        };
        assert_eq!(config.validate(), Ok(()));

        let config = RadioConfiguration {
            modulation: Modulation::Lora,
            ..config
        };
        assert_eq!(config.validate(), Err(Error::InvalidPayloadLength(256)));
    }

    #[test]
    fn preamble_errors_fit_five_bits() {
        let config = RadioConfiguration {
            preamble_errors: 32,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(Error::InvalidPreambleErrors(32)));
    }

    #[test]
    fn rx_floor_rounds_half_away_from_zero() {
        let floor = |rx_floor| {
            RadioConfiguration {
                rx_floor,
                ..Default::default()
            }
            .rx_floor_half_db()
        };
        assert_eq!(floor(-94.0), -188);
        assert_eq!(floor(-94.3), -189);
        assert_eq!(floor(-94.2), -188);
        assert_eq!(floor(-94.25), -189);
        assert_eq!(floor(0.0), 0);
        assert_eq!(floor(3.3), 7);
    }
}
