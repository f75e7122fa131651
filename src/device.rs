//! SX127x Register Interface
//!
//! This module provides the register-level interface to SX127x series radios over SPI.
//! It supports both synchronous and asynchronous operations.
//!
//! Every access is one complete SPI transaction:
//! - Read: `[address & 0x7F]` followed by one reply byte
//! - Write: `[address | 0x80]` followed by the value byte
//! - FIFO burst: the same framing addressed at `RegFifo` (0x00) with N data bytes
//!
//! Typed registers wider than one byte are accessed one byte per transaction at
//! consecutive addresses, most significant byte first.
//!
//! # Example
//! ```ignore
//! use sx127x::{Device, Version};
//!
//! // Create device with SPI interface
//! let spi = // ... SPI implementation
//! let mut device = Device::new(spi);
//!
//! // Read a register
//! let version: Version = device.read_register()?;
//!
//! // Write to the FIFO
//! device.write_fifo(&[0x01, 0x02, 0x03])?;
//! ```

use core::convert::Infallible;

use regiface::{errors::Error as RegifaceError, ByteArray, ReadableRegister, WritableRegister};

/// Address of the FIFO data register
pub const FIFO_ADDRESS: u8 = 0x00;

const WRITE_FLAG: u8 = 0x80;
const ADDRESS_MASK: u8 = 0x7F;

/// Main register interface for the SX127x radio.
///
/// This struct wraps an SPI interface and is the only place the driver touches the bus.
/// It supports both synchronous operations through the embedded-hal traits and
/// asynchronous operations through embedded-hal-async.
pub struct Device<SPI> {
    spi: SPI,
}

impl<SPI> Device<SPI> {
    /// Creates a new Device instance wrapping the provided SPI interface.
    ///
    /// # Arguments
    /// * `spi` - An SPI interface implementing the required embedded-hal traits
    pub fn new(spi: SPI) -> Self {
        Self { spi }
    }

    /// Releases the underlying SPI device.
    ///
    /// This method consumes the Device instance and returns the wrapped SPI interface.
    pub fn release(self) -> SPI {
        self.spi
    }
}

impl<SPI> Device<SPI>
where
    SPI: embedded_hal::spi::SpiDevice,
{
    /// Reads one byte from a raw register address.
    ///
    /// # Errors
    /// * `RegifaceError::BusError` - SPI communication failed
    pub fn read(&mut self, address: u8) -> Result<u8, RegifaceError> {
        let mut value = [0u8];

        self.spi
            .transaction(&mut [
                embedded_hal::spi::Operation::Write(&[address & ADDRESS_MASK]),
                embedded_hal::spi::Operation::Read(&mut value),
            ])
            .map_err(|_| RegifaceError::BusError)?;

        Ok(value[0])
    }

    /// Writes one byte to a raw register address.
    ///
    /// # Errors
    /// * `RegifaceError::BusError` - SPI communication failed
    pub fn write(&mut self, address: u8, value: u8) -> Result<(), RegifaceError> {
        self.spi
            .transaction(&mut [
                embedded_hal::spi::Operation::Write(&[address | WRITE_FLAG]),
                embedded_hal::spi::Operation::Write(&[value]),
            ])
            .map_err(|_| RegifaceError::BusError)
    }

    /// Reads a register value from the device.
    ///
    /// # Type Parameters
    /// * `R` - Register type implementing ReadableRegister with u8 ID
    ///
    /// # Errors
    /// * `RegifaceError::BusError` - SPI communication failed
    /// * `RegifaceError::DeserializationError` - Failed to parse register value
    pub fn read_register<R>(&mut self) -> Result<R, RegifaceError>
    where
        R: ReadableRegister<IdType = u8>,
    {
        let mut raw_value = R::Array::new();

        for (offset, byte) in raw_value.as_mut().iter_mut().enumerate() {
            *byte = self.read(R::id() + offset as u8)?;
        }

        R::from_bytes(raw_value).map_err(|_| RegifaceError::DeserializationError)
    }

    /// Writes a value to a device register.
    ///
    /// # Type Parameters
    /// * `R` - Register type implementing WritableRegister with u8 ID
    ///
    /// # Arguments
    /// * `register` - The register value to write
    ///
    /// # Errors
    /// * `RegifaceError::BusError` - SPI communication failed
    pub fn write_register<R>(&mut self, register: R) -> Result<(), RegifaceError>
    where
        R: WritableRegister<IdType = u8, Error = Infallible>,
    {
        let raw_value = match register.to_bytes() {
            Ok(raw) => raw,
            Err(never) => match never {},
        };

        for (offset, byte) in raw_value.as_ref().iter().enumerate() {
            self.write(R::id() + offset as u8, *byte)?;
        }

        Ok(())
    }

    /// Writes a packet payload into the FIFO in one burst.
    ///
    /// # Arguments
    /// * `bytes` - Data to write
    ///
    /// # Errors
    /// * `RegifaceError::BusError` - SPI communication failed
    pub fn write_fifo(&mut self, bytes: &[u8]) -> Result<(), RegifaceError> {
        self.spi
            .transaction(&mut [
                embedded_hal::spi::Operation::Write(&[FIFO_ADDRESS | WRITE_FLAG]),
                embedded_hal::spi::Operation::Write(bytes),
            ])
            .map_err(|_| RegifaceError::BusError)
    }

    /// Reads `bytes.len()` bytes out of the FIFO in one burst.
    ///
    /// # Arguments
    /// * `bytes` - Buffer to store read data
    ///
    /// # Errors
    /// * `RegifaceError::BusError` - SPI communication failed
    pub fn read_fifo(&mut self, bytes: &mut [u8]) -> Result<(), RegifaceError> {
        self.spi
            .transaction(&mut [
                embedded_hal::spi::Operation::Write(&[FIFO_ADDRESS & ADDRESS_MASK]),
                embedded_hal::spi::Operation::Read(bytes),
            ])
            .map_err(|_| RegifaceError::BusError)
    }
}

impl<SPI> Device<SPI>
where
    SPI: embedded_hal_async::spi::SpiDevice,
{
    /// Asynchronously reads one byte from a raw register address.
    ///
    /// This is the async version of [`read`](Device::read).
    pub async fn read_async(&mut self, address: u8) -> Result<u8, RegifaceError> {
        let mut value = [0u8];

        self.spi
            .transaction(&mut [
                embedded_hal_async::spi::Operation::Write(&[address & ADDRESS_MASK]),
                embedded_hal_async::spi::Operation::Read(&mut value),
            ])
            .await
            .map_err(|_| RegifaceError::BusError)?;

        Ok(value[0])
    }

    /// Asynchronously writes one byte to a raw register address.
    ///
    /// This is the async version of [`write`](Device::write).
    pub async fn write_async(&mut self, address: u8, value: u8) -> Result<(), RegifaceError> {
        self.spi
            .transaction(&mut [
                embedded_hal_async::spi::Operation::Write(&[address | WRITE_FLAG]),
                embedded_hal_async::spi::Operation::Write(&[value]),
            ])
            .await
            .map_err(|_| RegifaceError::BusError)
    }

    /// Asynchronously reads a register value from the device.
    ///
    /// This is the async version of [`read_register`](Device::read_register).
    pub async fn read_register_async<R>(&mut self) -> Result<R, RegifaceError>
    where
        R: ReadableRegister<IdType = u8>,
    {
        let mut raw_value = R::Array::new();

        for (offset, byte) in raw_value.as_mut().iter_mut().enumerate() {
            *byte = self.read_async(R::id() + offset as u8).await?;
        }

        R::from_bytes(raw_value).map_err(|_| RegifaceError::DeserializationError)
    }

    /// Asynchronously writes a value to a device register.
    ///
    /// This is the async version of [`write_register`](Device::write_register).
    pub async fn write_register_async<R>(&mut self, register: R) -> Result<(), RegifaceError>
    where
        R: WritableRegister<IdType = u8, Error = Infallible>,
    {
        let raw_value = match register.to_bytes() {
            Ok(raw) => raw,
            Err(never) => match never {},
        };

        for (offset, byte) in raw_value.as_ref().iter().enumerate() {
            self.write_async(R::id() + offset as u8, *byte).await?;
        }

        Ok(())
    }

    /// Asynchronously writes a packet payload into the FIFO in one burst.
    ///
    /// This is the async version of [`write_fifo`](Device::write_fifo).
    pub async fn write_fifo_async(&mut self, bytes: &[u8]) -> Result<(), RegifaceError> {
        self.spi
            .transaction(&mut [
                embedded_hal_async::spi::Operation::Write(&[FIFO_ADDRESS | WRITE_FLAG]),
                embedded_hal_async::spi::Operation::Write(bytes),
            ])
            .await
            .map_err(|_| RegifaceError::BusError)
    }

    /// Asynchronously reads `bytes.len()` bytes out of the FIFO in one burst.
    ///
    /// This is the async version of [`read_fifo`](Device::read_fifo).
    pub async fn read_fifo_async(&mut self, bytes: &mut [u8]) -> Result<(), RegifaceError> {
        self.spi
            .transaction(&mut [
                embedded_hal_async::spi::Operation::Write(&[FIFO_ADDRESS & ADDRESS_MASK]),
                embedded_hal_async::spi::Operation::Read(bytes),
            ])
            .await
            .map_err(|_| RegifaceError::BusError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registers::{Frf, Version};
    use embedded_hal_mock::eh1::spi::{Mock as SpiMock, Transaction as SpiTransaction};

    #[test]
    fn read_clears_the_write_bit() {
        let spi = SpiMock::new(&[
            SpiTransaction::transaction_start(),
            SpiTransaction::write(0x42),
            SpiTransaction::read(0x12),
            SpiTransaction::transaction_end(),
        ]);
        let mut device = Device::new(spi);

        let version: Version = device.read_register().unwrap();
        assert_eq!(version.value, 0x12);

        device.release().done();
    }

    #[test]
    fn multi_byte_register_is_written_msb_first() {
        let spi = SpiMock::new(&[
            SpiTransaction::transaction_start(),
            SpiTransaction::write(0x86),
            SpiTransaction::write(0xE4),
            SpiTransaction::transaction_end(),
            SpiTransaction::transaction_start(),
            SpiTransaction::write(0x87),
            SpiTransaction::write(0xC0),
            SpiTransaction::transaction_end(),
            SpiTransaction::transaction_start(),
            SpiTransaction::write(0x88),
            SpiTransaction::write(0x00),
            SpiTransaction::transaction_end(),
        ]);
        let mut device = Device::new(spi);

        device.write_register(Frf::from_hz(915_000_000)).unwrap();

        device.release().done();
    }

    #[test]
    fn fifo_burst_uses_a_single_transaction() {
        let spi = SpiMock::new(&[
            SpiTransaction::transaction_start(),
            SpiTransaction::write(0x80),
            SpiTransaction::write_vec(vec![0xDE, 0xAD, 0xBE, 0xEF]),
            SpiTransaction::transaction_end(),
            SpiTransaction::transaction_start(),
            SpiTransaction::write(0x00),
            SpiTransaction::read_vec(vec![0x01, 0x02]),
            SpiTransaction::transaction_end(),
        ]);
        let mut device = Device::new(spi);

        device.write_fifo(&[0xDE, 0xAD, 0xBE, 0xEF]).unwrap();
        let mut buf = [0u8; 2];
        device.read_fifo(&mut buf).unwrap();
        assert_eq!(buf, [0x01, 0x02]);

        device.release().done();
    }

    #[tokio::test]
    async fn async_register_access_matches_blocking_framing() {
        let spi = SpiMock::new(&[
            SpiTransaction::transaction_start(),
            SpiTransaction::write(0x42),
            SpiTransaction::read(0x12),
            SpiTransaction::transaction_end(),
            SpiTransaction::transaction_start(),
            SpiTransaction::write(0x80),
            SpiTransaction::write_vec(vec![0x0A, 0x0B]),
            SpiTransaction::transaction_end(),
        ]);
        let mut device = Device::new(spi);

        let version: Version = device.read_register_async().await.unwrap();
        assert_eq!(version.value, 0x12);
        device.write_fifo_async(&[0x0A, 0x0B]).await.unwrap();

        device.release().done();
    }
}
