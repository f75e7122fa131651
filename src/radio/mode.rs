//! Operating mode control

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use embedded_hal::spi::SpiDevice;

use super::Radio;
use crate::registers::{
    Dio0Mapping, DioMapping1, IrqFlags, LoraIrqFlagsMask, Mode, Modulation, OpMode,
};
use crate::timing::{wait_until, Clock, MODE_TIMEOUT_MS};
use crate::Error;

const MODE_SETTLE_US: u32 = 1_000;

/// Operating modes driven by this driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OperatingMode {
    Sleep,
    Standby,
    Transmit,
    Receive,
}

impl OperatingMode {
    /// `RegOpMode` mode field requested for this state
    pub fn mode(self) -> Mode {
        match self {
            Self::Sleep => Mode::Sleep,
            Self::Standby => Mode::Standby,
            Self::Transmit => Mode::Tx,
            Self::Receive => Mode::Rx,
        }
    }

    /// Whether a mode field read back from the chip confirms this state.
    ///
    /// The chip briefly reports FSRX on its way into RX, so FSRX is accepted
    /// as confirmation of [`OperatingMode::Receive`]. No other intermediate
    /// state is accepted.
    pub fn is_confirmed_by(self, reported: Mode) -> bool {
        reported == self.mode() || (self == Self::Receive && reported == Mode::FsRx)
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
    /// Requests `target` and spins until the chip reports it.
    ///
    /// The current modulation bits are written along with the mode. The wait is
    /// bounded by 20 ms; on timeout a warning is logged and the call still
    /// succeeds, leaving the chip wherever it got to.
    ///
    /// # Errors
    /// * `Error::DeviceFailed` - the driver was marked failed
    /// * `Error::Bus` - SPI communication failed
    pub fn set_mode(&mut self, target: OperatingMode) -> Result<(), Error> {
        self.ensure_healthy()?;
        self.device.write_register(OpMode {
            modulation: self.config.modulation,
            mode: target.mode(),
        })?;

        let device = &mut self.device;
        let confirmed = wait_until(&mut self.clock, MODE_TIMEOUT_MS, || -> Result<bool, Error> {
            let op_mode: OpMode = device.read_register()?;
            Ok(target.is_confirmed_by(op_mode.mode))
        })?;
        if !confirmed {
            warn!("timed out entering {:?}", target);
        }

        self.mode = Some(target);
        Ok(())
    }

    /// Enters RX.
    ///
    /// In LoRa mode every interrupt source is unmasked and RxDone is routed to DIO0.
    pub fn enter_receive(&mut self) -> Result<(), Error> {
        self.set_mode(OperatingMode::Receive)?;
        if self.config.modulation == Modulation::Lora {
            self.route_lora_irq(Dio0Mapping::Mapping00)?;
        }
        Ok(())
    }

    /// Enters TX.
    ///
    /// In LoRa mode every interrupt source is unmasked and TxDone is routed to DIO0.
    pub fn enter_transmit(&mut self) -> Result<(), Error> {
        self.set_mode(OperatingMode::Transmit)?;
        if self.config.modulation == Modulation::Lora {
            self.route_lora_irq(Dio0Mapping::Mapping01)?;
        }
        Ok(())
    }

    /// Enters standby.
    pub fn enter_standby(&mut self) -> Result<(), Error> {
        self.set_mode(OperatingMode::Standby)
    }

    fn route_lora_irq(&mut self, dio0: Dio0Mapping) -> Result<(), Error> {
        self.device.write_register(LoraIrqFlagsMask {
            masked: IrqFlags::empty(),
        })?;
        self.device.write_register(DioMapping1 { dio0 })?;
        Ok(())
    }

    /// Writes a mode with an explicit modulation and waits a fixed settle time
    /// instead of polling. Used during bring-up, where the modulation bits
    /// differ from the configured ones.
    pub(super) fn latch_mode(
        &mut self,
        modulation: Modulation,
        target: OperatingMode,
    ) -> Result<(), Error> {
        self.device.write_register(OpMode {
            modulation,
            mode: target.mode(),
        })?;
        self.delay.delay_us(MODE_SETTLE_US);
        self.mode = Some(target);
        Ok(())
    }
}
