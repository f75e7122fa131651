//! SX127x radio driver
//!
//! [`Radio`] owns the register interface, the reset and DIO0 pins, a delay and
//! a monotonic [`Clock`], and turns a [`RadioConfiguration`] into a working
//! LoRa, FSK or OOK link:
//!
//! - [`Radio::configure`]: reset, identity check, carrier, image calibration,
//!   PA and modem programming, then RX or standby
//! - [`Radio::transmit`]: push one packet through the FIFO and wait for DIO0
//! - [`Radio::poll_receive`]: non-blocking check for a received packet, meant
//!   to be called on every tick of the host loop
//!
//! Every wait is a bounded spin on the clock. Timeouts are logged and the
//! driver carries on from whatever state the chip reached.
//!
//! The driver does no locking. A multi-threaded host must serialize calls.

mod calibration;
mod fsk;
mod lora;
mod mode;
mod packet;

#[cfg(test)]
mod testing;

pub use mode::OperatingMode;
pub use packet::PacketListener;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use embedded_hal::spi::SpiDevice;

use crate::config::{RadioConfiguration, BANDWIDTH_HZ};
use crate::registers::{
    Frf, Modulation, PaConfig, PaRamp, PaSelect, Version, SILICON_VERSION,
};
use crate::timing::Clock;
use crate::{Device, Error};

const RESET_PULSE_US: u32 = 1_000;
const RESET_SETTLE_US: u32 = 10_000;

/// SX127x LoRa/FSK/OOK transceiver
pub struct Radio<SPI, RST, DIO, D, C> {
    device: Device<SPI>,
    reset: RST,
    dio0: DIO,
    delay: D,
    clock: C,
    config: RadioConfiguration,
    mode: Option<OperatingMode>,
    failed: bool,
}

impl<SPI, RST, DIO, D, C> Radio<SPI, RST, DIO, D, C> {
    /// Creates a driver. Nothing is sent to the chip until [`Radio::configure`].
    ///
    /// # Arguments
    /// * `spi` - SPI device with the radio's chip select
    /// * `reset` - NRESET line
    /// * `dio0` - DIO0 interrupt line, read as a level
    /// * `delay` - Delay provider for reset and mode settling
    /// * `clock` - Monotonic millisecond clock bounding every wait
    /// * `config` - Radio parameters applied by [`Radio::configure`]
    pub fn new(
        spi: SPI,
        reset: RST,
        dio0: DIO,
        delay: D,
        clock: C,
        config: RadioConfiguration,
    ) -> Self {
        Self {
            device: Device::new(spi),
            reset,
            dio0,
            delay,
            clock,
            config,
            mode: None,
            failed: false,
        }
    }

    /// Releases the SPI device, pins, delay and clock.
    pub fn release(self) -> (SPI, RST, DIO, D, C) {
        (
            self.device.release(),
            self.reset,
            self.dio0,
            self.delay,
            self.clock,
        )
    }

    /// The configuration this driver programs.
    pub fn configuration(&self) -> &RadioConfiguration {
        &self.config
    }

    /// Last operating mode entered, `None` before bring-up.
    ///
    /// A mode is recorded once the chip confirmed it or the confirmation wait
    /// timed out.
    pub fn mode(&self) -> Option<OperatingMode> {
        self.mode
    }

    /// True once the silicon identity check has failed.
    ///
    /// A failed driver never touches the bus again.
    pub fn is_failed(&self) -> bool {
        self.failed
    }

    fn ensure_healthy(&self) -> Result<(), Error> {
        if self.failed {
            Err(Error::DeviceFailed)
        } else {
            Ok(())
        }
    }

    /// Logs the human-readable configuration.
    pub fn log_configuration(&self) {
        let config = &self.config;
        info!("SX127x:");
        info!("  Frequency: {} Hz", config.frequency);
        if let Some(hz) = BANDWIDTH_HZ.get(config.bandwidth as usize) {
            info!("  Bandwidth: {} Hz", hz);
        }
        info!(
            "  PA Pin: {}",
            match config.pa_pin {
                PaSelect::Boost => "BOOST",
                PaSelect::Rfo => "RFO",
            }
        );
        info!("  PA Power: {} dBm", PaConfig::new(config.pa_pin, config.pa_power).level);
        info!("  PA Ramp: {} us", config.pa_ramp.micros());
        info!("  Shaping: {:?}", config.shaping);
        info!("  Modulation: {:?}", config.modulation);
        if config.modulation == Modulation::Fsk {
            info!("  Deviation: {} Hz", config.deviation);
        }
        if config.modulation != Modulation::Lora {
            info!("  Bitrate: {} b/s", config.bitrate);
            info!("  Bitsync: {}", config.bit_sync);
            info!("  Rx Start: {}", config.rx_start);
            info!("  Rx Floor: {} dBm", config.rx_floor);
            if config.preamble_size > 0 {
                info!("  Preamble Size: {}", config.preamble_size);
                info!("  Preamble Polarity: {:?}", config.preamble_polarity);
                info!("  Preamble Errors: {}", config.preamble_errors);
            }
            if !config.sync_value.is_empty() {
                info!("  Sync Value: {:?}", config.sync_value.as_slice());
            }
        }
        if config.is_fixed_length() {
            info!("  Payload Length: {}", config.payload_length);
        }
        if config.is_fixed_length() || config.modulation == Modulation::Lora {
            info!("  CRC Enable: {}", config.crc_enable);
        }
        if self.failed {
            error!("Configuring SX127x failed");
        }
    }
}

impl<SPI, RST, DIO, D, C> Radio<SPI, RST, DIO, D, C>
where
    SPI: SpiDevice,
    RST: OutputPin,
    DIO: InputPin,
    D: DelayNs,
    C: Clock,
{
    /// Resets the chip and programs the full configuration.
    ///
    /// Calling this again re-programs the chip from scratch.
    ///
    /// # Sequence
    /// 1. Pulse NRESET
    /// 2. Check the silicon version
    /// 3. Sleep, set the carrier, standby, run image calibration
    /// 4. Latch the modulation in sleep
    /// 5. Program the PA and ramp/shaping
    /// 6. Program the FSK/OOK or LoRa modem
    /// 7. Enter RX if `rx_start` is set, standby otherwise
    ///
    /// # Errors
    /// * Configuration errors from [`RadioConfiguration::validate`], before any bus traffic
    /// * `Error::UnknownVersion` - wrong silicon; the driver is marked failed
    /// * `Error::DeviceFailed` - the driver was already marked failed
    /// * `Error::Bus`, `Error::Pin` - collaborator failures
    pub fn configure(&mut self) -> Result<(), Error> {
        self.ensure_healthy()?;
        self.config.validate()?;

        debug!("resetting SX127x");
        self.reset.set_low().map_err(|_| Error::Pin)?;
        self.delay.delay_us(RESET_PULSE_US);
        self.reset.set_high().map_err(|_| Error::Pin)?;
        self.delay.delay_us(RESET_SETTLE_US);

        let version: Version = self.device.read_register()?;
        if version.value != SILICON_VERSION {
            error!("unsupported SX127x silicon version {}", version.value);
            self.failed = true;
            return Err(Error::UnknownVersion(version.value));
        }

        // Image calibration lives in the FSK page, so the carrier is set and
        // calibrated before the target modulation is latched.
        self.latch_mode(Modulation::Fsk, OperatingMode::Sleep)?;
        self.device
            .write_register(Frf::from_hz(self.config.frequency))?;
        self.latch_mode(Modulation::Fsk, OperatingMode::Standby)?;
        self.run_image_calibration()?;
        self.latch_mode(self.config.modulation, OperatingMode::Sleep)?;

        self.device
            .write_register(PaConfig::new(self.config.pa_pin, self.config.pa_power))?;
        self.device.write_register(PaRamp {
            shaping: self.config.shaping,
            ramp: self.config.pa_ramp,
        })?;

        match self.config.modulation {
            Modulation::Lora => self.configure_lora()?,
            Modulation::Fsk | Modulation::Ook => self.configure_fsk_ook()?,
        }

        if self.config.rx_start {
            self.enter_receive()
        } else {
            self.enter_standby()
        }
    }
}
