//! LoRa register page
//!
//! This module contains registers that are only meaningful while the LoRa
//! modem is selected:
//! - FIFO data buffer pointers
//! - Interrupt flags and masking
//! - Modem configuration (bandwidth, coding rate, header mode, spreading factor, CRC)
//! - Payload length
//!
//! The LoRa FIFO is a 256 byte buffer shared between TX and RX. Access goes
//! through `RegFifo` at the position held by [`FifoAddrPtr`], which
//! auto-increments on every access.

use bitflags::bitflags;
use core::convert::Infallible;

use regiface::{register, FromByteArray, ReadableRegister, ToByteArray, WritableRegister};

/// SPI access pointer into the FIFO (address: 0x0D)
#[register(0x0Du8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, WritableRegister)]
pub struct FifoAddrPtr {
    pub address: u8,
}

/// Start of the TX region in the FIFO (address: 0x0E)
#[register(0x0Eu8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, WritableRegister)]
pub struct FifoTxBaseAddr {
    pub address: u8,
}

/// Start of the RX region in the FIFO (address: 0x0F)
#[register(0x0Fu8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, WritableRegister)]
pub struct FifoRxBaseAddr {
    pub address: u8,
}

/// Start address of the last packet received (address: 0x10)
#[register(0x10u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ReadableRegister)]
pub struct FifoRxCurrentAddr {
    pub address: u8,
}

bitflags! {
    /// LoRa interrupt sources
    ///
    /// Used by both the mask register and the flag register. Flags are cleared
    /// by writing a 1 to them.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct IrqFlags: u8 {
        /// No packet within the RX single timeout
        const RX_TIMEOUT = 0x80;
        /// Packet reception complete
        const RX_DONE = 0x40;
        /// Payload CRC failed
        const PAYLOAD_CRC_ERROR = 0x20;
        /// Valid header received
        const VALID_HEADER = 0x10;
        /// Packet transmission complete
        const TX_DONE = 0x08;
        /// CAD complete
        const CAD_DONE = 0x04;
        /// Frequency hopping channel change
        const FHSS_CHANGE_CHANNEL = 0x02;
        /// Channel activity detected during CAD
        const CAD_DETECTED = 0x01;
    }
}

/// Interrupt mask register (address: 0x11)
///
/// A set bit masks the corresponding source in [`LoraIrqFlags`].
#[register(0x11u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, WritableRegister)]
pub struct LoraIrqFlagsMask {
    pub masked: IrqFlags,
}

/// Interrupt flag register (address: 0x12)
///
/// Writing a set bit clears the flag.
#[register(0x12u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ReadableRegister, WritableRegister)]
pub struct LoraIrqFlags {
    pub flags: IrqFlags,
}

impl LoraIrqFlags {
    /// Value that clears every pending flag
    pub fn clear_all() -> Self {
        Self {
            flags: IrqFlags::all(),
        }
    }
}

/// Number of payload bytes of the last packet received (address: 0x13)
#[register(0x13u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ReadableRegister)]
pub struct RxNbBytes {
    pub count: u8,
}

/// LoRa signal bandwidth
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LoraBandwidth {
    Khz7_8 = 0x00,
    Khz10_4 = 0x10,
    Khz15_6 = 0x20,
    Khz20_8 = 0x30,
    Khz31_25 = 0x40,
    Khz41_7 = 0x50,
    Khz62_5 = 0x60,
    Khz125 = 0x70,
    Khz250 = 0x80,
    Khz500 = 0x90,
}

/// LoRa forward error correction coding rate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CodingRate {
    Cr4_5 = 0x02,
    Cr4_6 = 0x04,
    Cr4_7 = 0x06,
    Cr4_8 = 0x08,
}

/// Modem configuration register 1 (address: 0x1D)
#[register(0x1Du8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, WritableRegister)]
pub struct ModemConfig1 {
    pub bandwidth: LoraBandwidth,
    pub coding_rate: CodingRate,
    /// Length, coding rate and CRC presence are omitted from the header
    pub implicit_header: bool,
}

/// Modem configuration register 2 (address: 0x1E)
///
/// The two symbol timeout MSBs are left at zero.
#[register(0x1Eu8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, WritableRegister)]
pub struct ModemConfig2 {
    /// Spreading factor, 6..=12
    pub spreading_factor: u8,
    /// Send the FIFO content continuously
    pub tx_continuous: bool,
    /// Generate and check a payload CRC
    pub rx_payload_crc_on: bool,
}

/// Payload length register (address: 0x22)
///
/// Required in implicit header mode; sets the TX length in explicit mode.
/// Must not be zero.
#[register(0x22u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, WritableRegister)]
pub struct LoraPayloadLength {
    pub length: u8,
}

impl FromByteArray for FifoRxCurrentAddr {
    type Error = Infallible;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self { address: bytes[0] })
    }
}

impl ToByteArray for FifoAddrPtr {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([self.address])
    }
}

impl ToByteArray for FifoTxBaseAddr {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([self.address])
    }
}

impl ToByteArray for FifoRxBaseAddr {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([self.address])
    }
}

impl ToByteArray for LoraIrqFlagsMask {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([self.masked.bits()])
    }
}

impl FromByteArray for LoraIrqFlags {
    type Error = Infallible;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self {
            flags: IrqFlags::from_bits_retain(bytes[0]),
        })
    }
}

impl ToByteArray for LoraIrqFlags {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([self.flags.bits()])
    }
}

impl FromByteArray for RxNbBytes {
    type Error = Infallible;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self { count: bytes[0] })
    }
}

impl ToByteArray for ModemConfig1 {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        let header = if self.implicit_header { 0x01 } else { 0x00 };
        Ok([self.bandwidth as u8 | self.coding_rate as u8 | header])
    }
}

impl ToByteArray for ModemConfig2 {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        let tx_continuous = if self.tx_continuous { 0x08 } else { 0x00 };
        let crc = if self.rx_payload_crc_on { 0x04 } else { 0x00 };
        Ok([((self.spreading_factor & 0x0F) << 4) | tx_continuous | crc])
    }
}

impl ToByteArray for LoraPayloadLength {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([self.length])
    }
}
