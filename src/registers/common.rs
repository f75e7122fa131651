//! Registers shared by the FSK/OOK and LoRa register pages
//!
//! This module contains registers that sit at the same address and carry the
//! same meaning whichever modem is selected:
//! - Operating mode and modulation selection
//! - RF carrier frequency
//! - Power amplifier configuration and ramping
//! - DIO0 interrupt routing
//! - Silicon version

use core::convert::Infallible;

use regiface::{register, FromByteArray, ReadableRegister, ToByteArray, WritableRegister};

/// Crystal oscillator frequency in Hz
pub const FXOSC: u32 = 32_000_000;

/// Silicon revision reported by every SX1276/77/78/79
pub const SILICON_VERSION: u8 = 0x12;

/// Modulation scheme, latched by the LongRangeMode and ModulationType bits of [`OpMode`]
///
/// The LoRa bit can only be changed while the chip is in [`Mode::Sleep`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Modulation {
    /// LoRa spread-spectrum modem
    Lora,
    /// Frequency shift keying (packet engine, FSK page)
    Fsk,
    /// On-off keying (packet engine, FSK page)
    Ook,
}

impl Modulation {
    /// Bits 7..5 of `RegOpMode` selecting this modulation
    pub fn bits(self) -> u8 {
        match self {
            Self::Lora => 0x80,
            Self::Fsk => 0x00,
            Self::Ook => 0x20,
        }
    }

    fn from_bits(bits: u8) -> Self {
        if bits & 0x80 != 0 {
            Self::Lora
        } else if bits & 0x60 == 0x20 {
            Self::Ook
        } else {
            Self::Fsk
        }
    }
}

/// Transceiver mode, bits 2..0 of [`OpMode`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    /// Lowest power, FIFO inaccessible, modulation may be changed
    Sleep = 0x00,
    /// Crystal oscillator running
    Standby = 0x01,
    /// Frequency synthesis at the TX frequency
    FsTx = 0x02,
    /// Transmit
    Tx = 0x03,
    /// Frequency synthesis at the RX frequency
    FsRx = 0x04,
    /// Continuous receive
    Rx = 0x05,
    /// Single receive (LoRa only)
    RxSingle = 0x06,
    /// Channel activity detection (LoRa only)
    Cad = 0x07,
}

impl Mode {
    /// Mask of the mode field inside `RegOpMode`
    pub const MASK: u8 = 0x07;

    fn from_bits(bits: u8) -> Self {
        match bits & Self::MASK {
            0x00 => Self::Sleep,
            0x01 => Self::Standby,
            0x02 => Self::FsTx,
            0x03 => Self::Tx,
            0x04 => Self::FsRx,
            0x05 => Self::Rx,
            0x06 => Self::RxSingle,
            _ => Self::Cad,
        }
    }
}

/// Operating mode register (address: 0x01)
///
/// Selects the modem and drives the transceiver state machine.
///
/// # Important Notes
/// - Modulation bits must only be changed in Sleep mode
/// - The mode field reads back the state the chip has actually reached, which
///   may trail the requested state while the synthesizer settles
#[register(0x01u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ReadableRegister, WritableRegister)]
pub struct OpMode {
    /// Selected modem
    pub modulation: Modulation,
    /// Transceiver mode
    pub mode: Mode,
}

/// RF carrier frequency register (address: 0x06..0x08)
///
/// 24-bit synthesizer word, MSB first. One step is `FXOSC / 2^19` (~61 Hz).
///
/// # Important Notes
/// - The frequency is only latched after the LSB is written
/// - Must be written in Sleep or Standby mode
#[register(0x06u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ReadableRegister, WritableRegister)]
pub struct Frf {
    /// Synthesizer word (24 bits)
    pub value: u32,
}

impl Frf {
    /// Computes `floor(hz * 2^19 / FXOSC)`.
    pub fn from_hz(hz: u32) -> Self {
        Self {
            value: (((hz as u64) << 19) / FXOSC as u64) as u32 & 0x00FF_FFFF,
        }
    }

    /// Carrier frequency represented by this word, rounded down to the Hz.
    pub fn to_hz(self) -> u32 {
        ((self.value as u64 * FXOSC as u64) >> 19) as u32
    }
}

/// Power amplifier output pin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PaSelect {
    /// PA_BOOST pin, +2 to +17 dBm
    Boost,
    /// RFO pin, 0 to +14 dBm
    Rfo,
}

impl PaSelect {
    /// Inclusive output level range accepted by this pin
    pub fn power_range(self) -> (u8, u8) {
        match self {
            Self::Boost => (2, 17),
            Self::Rfo => (0, 14),
        }
    }
}

/// Power amplifier configuration register (address: 0x09)
///
/// # Important Notes
/// - MaxPower is always programmed to its highest setting
/// - The OutputPower field is offset by 2 on PA_BOOST
#[register(0x09u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, WritableRegister)]
pub struct PaConfig {
    /// Output pin
    pub pin: PaSelect,
    /// Requested output level, clamped into the pin's range when encoded
    pub level: u8,
}

impl PaConfig {
    const PA_BOOST: u8 = 0x80;
    const MAX_POWER: u8 = 0x70;

    /// Builds a PA configuration, clamping `level` into the pin's range.
    pub fn new(pin: PaSelect, level: u8) -> Self {
        let (min, max) = pin.power_range();
        Self {
            pin,
            level: level.clamp(min, max),
        }
    }
}

/// Data shaping applied by the modulator
///
/// The Gaussian filters apply to FSK, the cut-off filters to OOK. Both share
/// the same register bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Shaping {
    /// No shaping
    #[default]
    None,
    /// Gaussian filter, BT = 1.0 (FSK)
    GaussianBt1_0,
    /// Gaussian filter, BT = 0.5 (FSK)
    GaussianBt0_5,
    /// Gaussian filter, BT = 0.3 (FSK)
    GaussianBt0_3,
    /// Filtering with f_cutoff = bit rate (OOK)
    CutoffBitRate,
    /// Filtering with f_cutoff = 2 * bit rate (OOK)
    CutoffTwiceBitRate,
}

impl Shaping {
    /// Bits 6..5 of `RegPaRamp`
    pub fn bits(self) -> u8 {
        match self {
            Self::None => 0x00,
            Self::GaussianBt1_0 | Self::CutoffBitRate => 0x20,
            Self::GaussianBt0_5 | Self::CutoffTwiceBitRate => 0x40,
            Self::GaussianBt0_3 => 0x60,
        }
    }
}

/// PA rise/fall time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RampTime {
    Us3400 = 0x00,
    Us2000 = 0x01,
    Us1000 = 0x02,
    Us500 = 0x03,
    Us250 = 0x04,
    Us125 = 0x05,
    Us100 = 0x06,
    Us62 = 0x07,
    Us50 = 0x08,
    #[default]
    Us40 = 0x09,
    Us31 = 0x0A,
    Us25 = 0x0B,
    Us20 = 0x0C,
    Us15 = 0x0D,
    Us12 = 0x0E,
    Us10 = 0x0F,
}

impl RampTime {
    const MICROS: [u16; 16] = [
        3400, 2000, 1000, 500, 250, 125, 100, 62, 50, 40, 31, 25, 20, 15, 12, 10,
    ];

    /// Nominal ramp duration in microseconds
    pub fn micros(self) -> u16 {
        Self::MICROS[self as usize]
    }
}

/// PA ramp and data shaping register (address: 0x0A)
#[register(0x0Au8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, WritableRegister)]
pub struct PaRamp {
    /// Modulation shaping
    pub shaping: Shaping,
    /// PA ramp time
    pub ramp: RampTime,
}

/// DIO0 function, meaning depends on modem and mode
///
/// | Mapping | LoRa      | FSK/OOK RX   | FSK/OOK TX  |
/// |---------|-----------|--------------|-------------|
/// | `00`    | RxDone    | PayloadReady | PacketSent  |
/// | `01`    | TxDone    | CrcOk        | -           |
/// | `10`    | CadDone   | -            | -           |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Dio0Mapping {
    Mapping00 = 0x00,
    Mapping01 = 0x40,
    Mapping10 = 0x80,
    Mapping11 = 0xC0,
}

/// DIO mapping register 1 (address: 0x40)
///
/// Only DIO0 is wired up by this driver; DIO1..DIO3 stay on mapping `00`.
#[register(0x40u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, WritableRegister)]
pub struct DioMapping1 {
    /// DIO0 routing
    pub dio0: Dio0Mapping,
}

/// Silicon version register (address: 0x42)
///
/// Reads [`SILICON_VERSION`] on a healthy SX1276/77/78/79.
#[register(0x42u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ReadableRegister)]
pub struct Version {
    /// Full revision number in the high nibble, metal mask revision in the low nibble
    pub value: u8,
}

impl FromByteArray for OpMode {
    type Error = Infallible;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self {
            modulation: Modulation::from_bits(bytes[0]),
            mode: Mode::from_bits(bytes[0]),
        })
    }
}

impl ToByteArray for OpMode {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([self.modulation.bits() | self.mode as u8])
    }
}

impl FromByteArray for Frf {
    type Error = Infallible;
    type Array = [u8; 3];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self {
            value: u32::from_be_bytes([0, bytes[0], bytes[1], bytes[2]]),
        })
    }
}

impl ToByteArray for Frf {
    type Error = Infallible;
    type Array = [u8; 3];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        let bytes = self.value.to_be_bytes();
        Ok([bytes[1], bytes[2], bytes[3]])
    }
}

impl ToByteArray for PaConfig {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        // The level may not have gone through `new`
        let (min, max) = self.pin.power_range();
        let level = self.level.clamp(min, max);
        let (pin, power) = match self.pin {
            PaSelect::Boost => (Self::PA_BOOST, level - min),
            PaSelect::Rfo => (0x00, level),
        };
        Ok([pin | Self::MAX_POWER | (power & 0x0F)])
    }
}

impl ToByteArray for PaRamp {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([self.shaping.bits() | self.ramp as u8])
    }
}

impl ToByteArray for DioMapping1 {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([self.dio0 as u8])
    }
}

impl FromByteArray for Version {
    type Error = Infallible;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self { value: bytes[0] })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STEP_HZ: u32 = FXOSC >> 19;

    #[test]
    fn frf_recovers_frequency_within_one_step() {
        for hz in [
            137_000_000,
            169_400_000,
            433_050_000,
            433_920_000,
            868_100_000,
            868_300_000,
            902_300_000,
            915_000_000,
            927_500_000,
            1_020_000_000,
        ] {
            let frf = Frf::from_hz(hz);
            let recovered = frf.to_hz();
            assert!(recovered <= hz);
            assert!(hz - recovered < STEP_HZ + 1, "{hz} -> {recovered}");
        }
    }

    #[test]
    fn frf_bytes_for_915_mhz() {
        assert_eq!(Frf::from_hz(915_000_000).to_bytes(), Ok([0xE4, 0xC0, 0x00]));
        assert_eq!(Frf::from_hz(434_000_000).to_bytes(), Ok([0x6C, 0x80, 0x00]));
    }

    #[test]
    fn pa_boost_is_clamped_and_offset() {
        assert_eq!(PaConfig::new(PaSelect::Boost, 0).to_bytes(), Ok([0xF0]));
        assert_eq!(PaConfig::new(PaSelect::Boost, 2).to_bytes(), Ok([0xF0]));
        assert_eq!(PaConfig::new(PaSelect::Boost, 10).to_bytes(), Ok([0xF8]));
        assert_eq!(PaConfig::new(PaSelect::Boost, 17).to_bytes(), Ok([0xFF]));
        assert_eq!(PaConfig::new(PaSelect::Boost, 20).to_bytes(), Ok([0xFF]));
    }

    #[test]
    fn pa_level_built_directly_is_clamped_on_encode() {
        let low = PaConfig {
            pin: PaSelect::Boost,
            level: 0,
        };
        assert_eq!(low.to_bytes(), Ok([0xF0]));

        let high = PaConfig {
            pin: PaSelect::Rfo,
            level: 200,
        };
        assert_eq!(high.to_bytes(), Ok([0x7E]));
    }

    #[test]
    fn pa_rfo_is_clamped() {
        assert_eq!(PaConfig::new(PaSelect::Rfo, 0).to_bytes(), Ok([0x70]));
        assert_eq!(PaConfig::new(PaSelect::Rfo, 14).to_bytes(), Ok([0x7E]));
        assert_eq!(PaConfig::new(PaSelect::Rfo, 15).to_bytes(), Ok([0x7E]));
        for level in 0..=u8::MAX {
            let [byte] = PaConfig::new(PaSelect::Rfo, level).to_bytes().unwrap();
            assert_eq!(byte & PaConfig::MAX_POWER, PaConfig::MAX_POWER);
        }
    }

    #[test]
    fn op_mode_decodes_modulation_and_mode() {
        assert_eq!(
            OpMode::from_bytes([0x85]),
            Ok(OpMode {
                modulation: Modulation::Lora,
                mode: Mode::Rx,
            })
        );
        assert_eq!(
            OpMode::from_bytes([0x24]),
            Ok(OpMode {
                modulation: Modulation::Ook,
                mode: Mode::FsRx,
            })
        );
        assert_eq!(
            OpMode {
                modulation: Modulation::Ook,
                mode: Mode::Standby,
            }
            .to_bytes(),
            Ok([0x21])
        );
    }

    #[test]
    fn pa_ramp_combines_shaping_and_ramp() {
        let ramp = PaRamp {
            shaping: Shaping::GaussianBt0_5,
            ramp: RampTime::Us40,
        };
        assert_eq!(ramp.to_bytes(), Ok([0x49]));
        assert_eq!(RampTime::Us3400.micros(), 3400);
        assert_eq!(RampTime::Us10.micros(), 10);
    }
}
