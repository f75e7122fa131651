//! Image and RSSI calibration
//!
//! The receiver's image rejection depends on a one-shot calibration that has
//! to run after every carrier or band change. It runs in FSK Standby.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use embedded_hal::spi::SpiDevice;

use super::Radio;
use crate::registers::{ImageCal, ImageCalFlags};
use crate::timing::{wait_until, Clock, IMAGE_CAL_TIMEOUT_MS};
use crate::Error;

impl<SPI, RST, DIO, D, C> Radio<SPI, RST, DIO, D, C>
where
    SPI: SpiDevice,
    RST: OutputPin,
    DIO: InputPin,
    D: DelayNs,
    C: Clock,
{
    /// Starts an image calibration and waits up to 20 ms for it to finish.
    ///
    /// Automatic re-calibration is armed with a 10 °C threshold. A timeout is
    /// logged and otherwise ignored; the calibration is not retried.
    ///
    /// # Errors
    /// * `Error::DeviceFailed` - the driver was marked failed
    /// * `Error::Bus` - SPI communication failed
    pub fn run_image_calibration(&mut self) -> Result<(), Error> {
        self.ensure_healthy()?;
        self.device.write_register(ImageCal {
            flags: ImageCalFlags::AUTO_IMAGE_CAL_ON
                | ImageCalFlags::IMAGE_CAL_START
                | ImageCalFlags::TEMP_THRESHOLD_10C,
        })?;

        let device = &mut self.device;
        let finished = wait_until(&mut self.clock, IMAGE_CAL_TIMEOUT_MS, || -> Result<bool, Error> {
            let status: ImageCal = device.read_register()?;
            Ok(!status.flags.contains(ImageCalFlags::IMAGE_CAL_RUNNING))
        })?;
        if !finished {
            warn!("image calibration timed out");
        }

        Ok(())
    }
}
