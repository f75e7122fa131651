//! FSK/OOK register page
//!
//! This module contains registers that are only meaningful while the FSK/OOK
//! modem is selected, including:
//! - Bit rate and frequency deviation
//! - Receiver bandwidth, AFC/AGC and RX trigger setup
//! - OOK demodulator thresholds
//! - Preamble, sync word and packet engine configuration
//! - Image calibration
//!
//! Several of these addresses alias LoRa registers (e.g. 0x0D is `RegRxConfig`
//! here and `RegFifoAddrPtr` in LoRa mode). Only write them with the matching
//! modem latched in [`OpMode`](super::OpMode).

use bitflags::bitflags;
use core::convert::Infallible;

use regiface::{register, FromByteArray, ReadableRegister, ToByteArray, WritableRegister};

use super::FXOSC;

/// First of the eight consecutive sync word registers (address: 0x28..0x2F)
pub const SYNC_VALUE_ADDRESS: u8 = 0x28;

/// Maximum sync word length in bytes
pub const MAX_SYNC_SIZE: usize = 8;

/// Bit rate register (address: 0x02..0x03)
///
/// `bitrate = FXOSC / value`, MSB first.
#[register(0x02u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ReadableRegister, WritableRegister)]
pub struct Bitrate {
    /// FXOSC divider
    pub value: u16,
}

impl Bitrate {
    /// Divider for `bps`, rounded up so the real rate never exceeds the request.
    ///
    /// Returns `None` for zero or for rates too slow to fit in 16 bits.
    pub fn from_bps(bps: u32) -> Option<Self> {
        if bps == 0 {
            return None;
        }
        let value = FXOSC.div_ceil(bps);
        u16::try_from(value).ok().map(|value| Self { value })
    }
}

/// Frequency deviation register (address: 0x04..0x05)
///
/// `fdev = Fstep * value`, 14 bits, MSB first.
#[register(0x04u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ReadableRegister, WritableRegister)]
pub struct Fdev {
    /// Deviation in synthesizer steps
    pub value: u16,
}

impl Fdev {
    /// Largest representable deviation word
    pub const MAX: u16 = 0x3FFF;

    /// Deviation word for `hz`, saturating at [`Fdev::MAX`].
    pub fn from_hz(hz: u32) -> Self {
        let steps = (hz as u64 * 4096) / 250_000;
        Self {
            value: steps.min(Self::MAX as u64) as u16,
        }
    }
}

bitflags! {
    /// Receiver start-up and AFC/AGC control
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct RxConfigFlags: u8 {
        /// Restart RX on collision detection
        const RESTART_ON_COLLISION = 0x80;
        /// Manually restart RX without waiting for PLL lock
        const RESTART_RX_WITHOUT_PLL_LOCK = 0x40;
        /// Manually restart RX after PLL lock
        const RESTART_RX_WITH_PLL_LOCK = 0x20;
        /// AFC runs at each receiver start-up
        const AFC_AUTO_ON = 0x10;
        /// LNA gain is driven by the AGC
        const AGC_AUTO_ON = 0x08;
        /// Start AFC/AGC on RSSI interrupt
        const TRIGGER_RSSI = 0x01;
        /// Start AFC/AGC on preamble detection
        const TRIGGER_PREAMBLE = 0x06;
    }
}

/// RX configuration register (address: 0x0D)
#[register(0x0Du8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, WritableRegister)]
pub struct RxConfig {
    pub flags: RxConfigFlags,
}

/// RSSI threshold register (address: 0x10)
///
/// RSSI interrupt fires when `RSSI <= -value / 2` dBm.
#[register(0x10u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, WritableRegister)]
pub struct RssiThresh {
    pub value: u8,
}

/// Single-side receiver channel filter bandwidth
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RxBandwidth {
    Khz2_6 = 0x17,
    Khz3_1 = 0x0F,
    Khz3_9 = 0x07,
    Khz5_2 = 0x16,
    Khz6_3 = 0x0E,
    Khz7_8 = 0x06,
    Khz10_4 = 0x15,
    Khz12_5 = 0x0D,
    Khz15_6 = 0x05,
    Khz20_8 = 0x14,
    Khz25_0 = 0x0C,
    Khz31_3 = 0x04,
    Khz41_7 = 0x13,
    Khz50_0 = 0x0B,
    Khz62_5 = 0x03,
    Khz83_3 = 0x12,
    Khz100_0 = 0x0A,
    Khz125_0 = 0x02,
    Khz166_7 = 0x11,
    Khz200_0 = 0x09,
    Khz250_0 = 0x01,
}

/// Receiver bandwidth register (address: 0x12)
#[register(0x12u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, WritableRegister)]
pub struct RxBw {
    pub bandwidth: RxBandwidth,
}

/// OOK demodulator threshold type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OokThresholdType {
    Fixed = 0x00,
    Peak = 0x08,
    Average = 0x10,
}

/// OOK peak mode threshold step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OokPeakThreshStep {
    Db0_5 = 0x00,
    Db1_0 = 0x01,
    Db1_5 = 0x02,
    Db2_0 = 0x03,
    Db3_0 = 0x04,
    Db4_0 = 0x05,
    Db5_0 = 0x06,
    Db6_0 = 0x07,
}

/// OOK peak demodulator register (address: 0x14)
#[register(0x14u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, WritableRegister)]
pub struct OokPeak {
    /// Enable the bit synchronizer
    pub bit_sync_on: bool,
    /// Threshold type
    pub threshold_type: OokThresholdType,
    /// Step used while the peak threshold decays
    pub step: OokPeakThreshStep,
}

/// OOK fixed threshold register (address: 0x15)
///
/// Floor of the peak threshold, in 0.5 dB steps.
#[register(0x15u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, WritableRegister)]
pub struct OokFix {
    pub threshold: u8,
}

/// How often the OOK peak threshold is decremented
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OokPeakThreshDec {
    OncePerChip = 0x00,
    OnceEvery2Chips = 0x20,
    OnceEvery4Chips = 0x40,
    OnceEvery8Chips = 0x60,
    TwicePerChip = 0x80,
    FourTimesPerChip = 0xA0,
    EightTimesPerChip = 0xC0,
    SixteenTimesPerChip = 0xE0,
}

/// OOK average register (address: 0x16)
#[register(0x16u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, WritableRegister)]
pub struct OokAvg {
    pub decrement: OokPeakThreshDec,
}

impl OokAvg {
    // Reserved bit 4 reads back as 1 and must be preserved.
    const RESERVED: u8 = 0x10;
}

bitflags! {
    /// AFC and FEI control
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct AfcFeiFlags: u8 {
        /// Start an AGC sequence
        const AGC_START = 0x10;
        /// Clear the AFC value
        const AFC_CLEAR = 0x02;
        /// Clear the AFC value on each receiver restart
        const AFC_AUTO_CLEAR_ON = 0x01;
    }
}

/// AFC/FEI control register (address: 0x1A)
#[register(0x1Au8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, WritableRegister)]
pub struct AfcFei {
    pub flags: AfcFeiFlags,
}

/// Preamble detector register (address: 0x1F)
#[register(0x1Fu8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, WritableRegister)]
pub enum PreambleDetect {
    /// Detector disabled
    Off,
    /// Detector enabled
    On {
        /// Preamble bytes needed for detection, 1..=3
        size: u8,
        /// Chip errors tolerated per bit, 0..=31
        tolerance: u8,
    },
}

impl PreambleDetect {
    const DETECTOR_ON: u8 = 0x80;
    const SIZE_SHIFT: u8 = 5;

    /// Detector setting for a configured preamble length.
    ///
    /// Only 1..=3 bytes can be detected; any other length disables the detector.
    pub fn for_preamble(size: u8, tolerance: u8) -> Self {
        match size {
            1..=3 => Self::On { size, tolerance },
            _ => Self::Off,
        }
    }
}

/// Transmitted preamble length register (address: 0x25..0x26)
#[register(0x25u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, WritableRegister)]
pub struct PreambleSize {
    /// Preamble length in bytes
    pub value: u16,
}

/// Automatic receiver restart after a packet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AutoRestartRx {
    Off = 0x00,
    WithoutPllRelock = 0x40,
    WithPllRelock = 0x80,
}

/// Polarity of the preamble bit pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PreamblePolarity {
    /// `0xAA` pattern
    #[default]
    Aa,
    /// `0x55` pattern
    P55,
}

impl PreamblePolarity {
    /// Pattern byte sent on air
    pub fn pattern(self) -> u8 {
        match self {
            Self::Aa => 0xAA,
            Self::P55 => 0x55,
        }
    }
}

/// Sync word configuration register (address: 0x27)
#[register(0x27u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, WritableRegister)]
pub struct SyncConfig {
    /// Receiver restart behaviour after PayloadReady
    pub auto_restart: AutoRestartRx,
    /// Preamble polarity
    pub polarity: PreamblePolarity,
    /// Sync word generation and detection enabled
    pub sync_on: bool,
    /// Sync word length in bytes, 1..=8 (ignored when `sync_on` is false)
    pub size: u8,
}

/// Packet configuration register 1 (address: 0x30)
///
/// Only the CRC bit is driven. Fixed-length format, no DC-free encoding, no
/// address filtering and CRC auto-clear stay at zero.
#[register(0x30u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, WritableRegister)]
pub struct PacketConfig1 {
    pub crc_on: bool,
}

/// Data processing mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DataMode {
    /// Bits stream straight to/from DIO2, no packet engine
    Continuous = 0x00,
    /// Packet engine and FIFO in use
    Packet = 0x40,
}

/// Packet configuration register 2 (address: 0x31)
#[register(0x31u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, WritableRegister)]
pub struct PacketConfig2 {
    pub data_mode: DataMode,
    /// Bits 10..8 of the payload length
    pub payload_length_msb: u8,
}

/// Payload length register (address: 0x32)
///
/// Bits 7..0 of the fixed payload length. The high bits live in [`PacketConfig2`].
#[register(0x32u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, WritableRegister)]
pub struct PayloadLength {
    pub lsb: u8,
}

/// Condition that starts a packet transmission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TxStartCondition {
    /// FIFO level exceeds the threshold
    FifoLevel = 0x00,
    /// At least one byte in the FIFO
    FifoNotEmpty = 0x80,
}

/// FIFO threshold register (address: 0x35)
#[register(0x35u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, WritableRegister)]
pub struct FifoThresh {
    pub tx_start: TxStartCondition,
    /// FifoLevel interrupt threshold, 0..=63
    pub threshold: u8,
}

impl FifoThresh {
    /// Largest threshold value
    pub const MAX_THRESHOLD: u8 = 0x3F;
}

bitflags! {
    /// Image and RSSI calibration control
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ImageCalFlags: u8 {
        /// Calibrate again when the temperature drifts past the threshold
        const AUTO_IMAGE_CAL_ON = 0x80;
        /// Trigger a calibration
        const IMAGE_CAL_START = 0x40;
        /// Calibration in progress (read only)
        const IMAGE_CAL_RUNNING = 0x20;
        /// Temperature change above threshold since last calibration (read only)
        const TEMP_CHANGE = 0x08;
        /// 10 °C re-trigger threshold
        const TEMP_THRESHOLD_10C = 0x02;
        /// 15 °C re-trigger threshold
        const TEMP_THRESHOLD_15C = 0x04;
        /// 20 °C re-trigger threshold
        const TEMP_THRESHOLD_20C = 0x06;
        /// Temperature monitor stopped
        const TEMP_MONITOR_OFF = 0x01;
    }
}

/// Image calibration register (address: 0x3B)
///
/// # Important Notes
/// - Lives in the FSK page; calibrate before latching LoRa mode
/// - Must run after the carrier frequency is set, in Standby
#[register(0x3Bu8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ReadableRegister, WritableRegister)]
pub struct ImageCal {
    pub flags: ImageCalFlags,
}

impl FromByteArray for Bitrate {
    type Error = Infallible;
    type Array = [u8; 2];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self {
            value: u16::from_be_bytes(bytes),
        })
    }
}

impl ToByteArray for Bitrate {
    type Error = Infallible;
    type Array = [u8; 2];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok(self.value.to_be_bytes())
    }
}

impl FromByteArray for Fdev {
    type Error = Infallible;
    type Array = [u8; 2];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self {
            value: u16::from_be_bytes(bytes) & Self::MAX,
        })
    }
}

impl ToByteArray for Fdev {
    type Error = Infallible;
    type Array = [u8; 2];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok((self.value & Self::MAX).to_be_bytes())
    }
}

impl ToByteArray for RxConfig {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([self.flags.bits()])
    }
}

impl ToByteArray for RssiThresh {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([self.value])
    }
}

impl ToByteArray for RxBw {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([self.bandwidth as u8])
    }
}

impl ToByteArray for OokPeak {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        let bit_sync = if self.bit_sync_on { 0x20 } else { 0x00 };
        Ok([bit_sync | self.threshold_type as u8 | self.step as u8])
    }
}

impl ToByteArray for OokFix {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([self.threshold])
    }
}

impl ToByteArray for OokAvg {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([Self::RESERVED | self.decrement as u8])
    }
}

impl ToByteArray for AfcFei {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([self.flags.bits()])
    }
}

impl ToByteArray for PreambleDetect {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        match self {
            Self::Off => Ok([0x00]),
            Self::On { size, tolerance } => Ok([Self::DETECTOR_ON
                | ((size.saturating_sub(1) & 0x03) << Self::SIZE_SHIFT)
                | (tolerance & 0x1F)]),
        }
    }
}

impl ToByteArray for PreambleSize {
    type Error = Infallible;
    type Array = [u8; 2];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok(self.value.to_be_bytes())
    }
}

impl ToByteArray for SyncConfig {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        let polarity = match self.polarity {
            PreamblePolarity::Aa => 0x00,
            PreamblePolarity::P55 => 0x20,
        };
        let sync = if self.sync_on {
            0x10 | (self.size.saturating_sub(1) & 0x07)
        } else {
            0x00
        };
        Ok([self.auto_restart as u8 | polarity | sync])
    }
}

impl ToByteArray for PacketConfig1 {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([if self.crc_on { 0x10 } else { 0x00 }])
    }
}

impl ToByteArray for PacketConfig2 {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([self.data_mode as u8 | (self.payload_length_msb & 0x07)])
    }
}

impl ToByteArray for PayloadLength {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([self.lsb])
    }
}

impl ToByteArray for FifoThresh {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([self.tx_start as u8 | (self.threshold & Self::MAX_THRESHOLD)])
    }
}

impl FromByteArray for ImageCal {
    type Error = Infallible;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self {
            flags: ImageCalFlags::from_bits_retain(bytes[0]),
        })
    }
}

impl ToByteArray for ImageCal {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([self.flags.bits()])
    }
}
