//! LoRa modem program

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use embedded_hal::spi::SpiDevice;

use super::Radio;
use crate::config::LORA_BANDWIDTHS;
use crate::registers::{
    CodingRate, FifoRxBaseAddr, FifoTxBaseAddr, LoraPayloadLength, ModemConfig1, ModemConfig2,
};
use crate::timing::Clock;
use crate::Error;

const SPREADING_FACTOR: u8 = 7;
const CODING_RATE: CodingRate = CodingRate::Cr4_5;

impl<SPI, RST, DIO, D, C> Radio<SPI, RST, DIO, D, C>
where
    SPI: SpiDevice,
    RST: OutputPin,
    DIO: InputPin,
    D: DelayNs,
    C: Clock,
{
    pub(super) fn configure_lora(&mut self) -> Result<(), Error> {
        let config = &self.config;
        let device = &mut self.device;

        let bandwidth = LORA_BANDWIDTHS
            .get(config.bandwidth as usize)
            .copied()
            .ok_or(Error::InvalidBandwidth(config.bandwidth))?;
        device.write_register(ModemConfig1 {
            bandwidth,
            coding_rate: CODING_RATE,
            implicit_header: config.is_fixed_length(),
        })?;
        device.write_register(ModemConfig2 {
            spreading_factor: SPREADING_FACTOR,
            tx_continuous: false,
            rx_payload_crc_on: config.crc_enable,
        })?;

        // TX and RX share the whole FIFO
        device.write_register(FifoTxBaseAddr { address: 0 })?;
        device.write_register(FifoRxBaseAddr { address: 0 })?;

        // Zero is not a legal length, even in explicit header mode
        device.write_register(LoraPayloadLength {
            length: config.payload_length.clamp(1, u8::MAX as u16) as u8,
        })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use crate::config::RadioConfiguration;

    #[test]
    fn variable_length_uses_explicit_header() {
        let mut radio = radio(lora_config(), lora_modem(), &[], &[]);
        radio.configure_lora().unwrap();
        finish(radio);
    }

    #[test]
    fn fixed_length_uses_implicit_header() {
        let config = RadioConfiguration {
            payload_length: 12,
            crc_enable: false,
            bandwidth: 21,
            ..lora_config()
        };

        let mut spi = write(0x1D, 0x93);
        spi.extend(write(0x1E, 0x70));
        spi.extend(write(0x0E, 0x00));
        spi.extend(write(0x0F, 0x00));
        spi.extend(write(0x22, 0x0C));

        let mut radio = radio(config, spi, &[], &[]);
        radio.configure_lora().unwrap();
        finish(radio);
    }

    #[test]
    fn neighbouring_indices_share_a_bandwidth() {
        for (index, code) in [(0u8, 0x02u8), (5, 0x02), (6, 0x12), (10, 0x42), (11, 0x42)] {
            let config = RadioConfiguration {
                bandwidth: index,
                crc_enable: false,
                ..lora_config()
            };

            let mut spi = write(0x1D, code);
            spi.extend(write(0x1E, 0x70));
            spi.extend(write(0x0E, 0x00));
            spi.extend(write(0x0F, 0x00));
            spi.extend(write(0x22, 0x01));

            let mut radio = radio(config, spi, &[], &[]);
            radio.configure_lora().unwrap();
            finish(radio);
        }
    }
}
