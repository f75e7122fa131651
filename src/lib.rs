#![cfg_attr(not(test), no_std)]
//! SX127x Radio Driver
//!
//! This crate drives the Semtech SX1276/77/78/79 sub-GHz transceivers from an
//! `embedded-hal` SPI device, a reset pin and the DIO0 interrupt line.
//!
//! # Features
//! - Modems: LoRa (SF7, CR 4/5, 7.8-500 kHz) and (G)FSK/OOK packet engine
//! - Fixed or variable payload length, optional payload CRC
//! - PA_BOOST or RFO output with ramp time and modulation shaping
//! - Image calibration at bring-up
//! - Bounded, non-fatal waits for every chip state change
//!
//! # Architecture
//! - [`device`]: Register access over SPI
//!   - One-byte register reads and writes and FIFO bursts
//!   - Typed access to [`registers`] through `regiface`
//!
//! - [`registers`]: Register definitions for direct hardware access
//!   - [`registers`] common, FSK/OOK page and LoRa page registers
//!
//! - [`radio`]: The [`Radio`] driver
//!   - Bring-up and modem programming from a [`RadioConfiguration`]
//!   - Operating mode control
//!   - Packet transmit and receive polling
//!
//! - [`timing`]: The [`Clock`] used to bound every wait
//!
//! # Usage
//! Configuration follows a fixed sequence:
//!
//! 1. Fill in a [`RadioConfiguration`] (or start from its `Default`)
//! 2. Create a [`Radio`] with the SPI device, pins, delay and clock
//! 3. Call [`Radio::configure`] once
//! 4. Call [`Radio::transmit`] to send, and [`Radio::poll_receive`] on every
//!    tick of the main loop to receive
//!
//! # Important Notes
//! - Only silicon version 0x12 is accepted; anything else leaves the driver
//!   permanently failed
//! - Timeouts are logged, not returned
//! - Variable length FSK/OOK packets are not received
//!
//! # Example
//! ```ignore
//! use sx127x::{Radio, RadioConfiguration, Error};
//!
//! fn run(spi: impl SpiDevice, reset: impl OutputPin, dio0: impl InputPin,
//!        delay: impl DelayNs, millis: impl FnMut() -> u32) -> Result<(), Error> {
//!     let mut radio = Radio::new(spi, reset, dio0, delay, millis, RadioConfiguration::default());
//!     radio.configure()?;
//!     radio.transmit(b"hello")?;
//!
//!     loop {
//!         radio.poll_receive(&mut |packet: &[u8]| {
//!             // handle packet
//!         })?;
//!     }
//! }
//! ```

#[macro_use]
mod fmt;

pub mod config;
pub mod device;
pub mod error;
pub mod radio;
pub mod registers;
pub mod timing;

pub use config::RadioConfiguration;
pub use device::Device;
pub use error::Error;
pub use radio::{OperatingMode, PacketListener, Radio};
pub use regiface::errors::Error as RegifaceError;
pub use registers::*;
pub use timing::Clock;
