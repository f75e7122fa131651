//! Driver error type

use regiface::errors::Error as RegifaceError;

/// Errors returned by the [`Radio`](crate::Radio) driver.
///
/// Bounded waits that time out (mode changes, image calibration, transmit
/// completion) are not errors. They are logged and the driver carries on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// SPI transaction failed
    Bus,
    /// A register reply could not be decoded
    Decode,
    /// Reset or DIO0 pin access failed
    Pin,
    /// The version register did not report a supported silicon revision.
    ///
    /// This is fatal: the driver is marked failed and stays inert.
    UnknownVersion(u8),
    /// The driver was marked failed during bring-up
    DeviceFailed,
    /// Bandwidth index outside 0..=21
    InvalidBandwidth(u8),
    /// FSK/OOK bitrate of zero, or too slow for the 16-bit bitrate register
    InvalidBitrate(u32),
    /// Configured payload length the packet engine cannot frame
    InvalidPayloadLength(u16),
    /// Preamble error tolerance does not fit the 5-bit field
    InvalidPreambleErrors(u8),
    /// Packet length rejected by [`Radio::transmit`](crate::Radio::transmit)
    InvalidPacketLength(usize),
}

impl From<RegifaceError> for Error {
    fn from(err: RegifaceError) -> Self {
        match err {
            RegifaceError::BusError => Error::Bus,
            _ => Error::Decode,
        }
    }
}
