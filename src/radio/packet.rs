//! Packet transmit and receive

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use embedded_hal::spi::SpiDevice;

use super::Radio;
use crate::config::{MAX_LORA_PACKET_LEN, MAX_PACKET_LEN};
use crate::registers::{
    FifoAddrPtr, FifoRxCurrentAddr, IrqFlags, LoraIrqFlags, LoraPayloadLength, Modulation,
    RxNbBytes,
};
use crate::timing::{wait_until, Clock, TX_TIMEOUT_MS};
use crate::Error;

/// Receiver of packets recovered by [`Radio::poll_receive`].
///
/// Implemented for every `FnMut(&[u8])`, so a closure can be passed directly.
pub trait PacketListener {
    /// Called once per received packet with the raw FIFO contents.
    fn on_packet(&mut self, packet: &[u8]);
}

impl<F> PacketListener for F
where
    F: FnMut(&[u8]),
{
    fn on_packet(&mut self, packet: &[u8]) {
        self(packet)
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
    /// Sends one packet and waits up to 4 s for DIO0 to signal completion.
    ///
    /// Afterwards the radio goes back to RX if `rx_start` is set, standby
    /// otherwise. A completion timeout is logged and the call still succeeds.
    ///
    /// # Arguments
    /// * `packet` - Payload, 1 to 256 bytes (255 for LoRa). Must match the
    ///   configured payload length when one is set.
    ///
    /// # Errors
    /// * `Error::InvalidPacketLength` - rejected before any bus traffic
    /// * `Error::DeviceFailed` - the driver was marked failed
    /// * `Error::Bus`, `Error::Pin` - collaborator failures
    pub fn transmit(&mut self, packet: &[u8]) -> Result<(), Error> {
        self.ensure_healthy()?;
        self.check_packet_length(packet.len())?;

        if self.config.modulation == Modulation::Lora {
            self.enter_standby()?;
            if !self.config.is_fixed_length() {
                self.device.write_register(LoraPayloadLength {
                    length: packet.len() as u8,
                })?;
            }
            self.device.write_register(LoraIrqFlags::clear_all())?;
            self.device.write_register(FifoAddrPtr { address: 0 })?;
            self.device.write_fifo(packet)?;
            self.enter_transmit()?;
        } else {
            self.enter_transmit()?;
            self.device.write_fifo(packet)?;
        }

        let dio0 = &mut self.dio0;
        let sent = wait_until(&mut self.clock, TX_TIMEOUT_MS, || dio0.is_high())
            .map_err(|_| Error::Pin)?;
        if !sent {
            warn!("transmit of {} bytes timed out", packet.len());
        }

        if self.config.rx_start {
            self.enter_receive()
        } else {
            self.enter_standby()
        }
    }

    /// Checks DIO0 and hands a received packet to `listener`.
    ///
    /// Does nothing unless DIO0 is high. LoRa packets failing their payload
    /// CRC are dropped; the interrupt flags are cleared either way. FSK/OOK
    /// packets are only recovered with a fixed payload length.
    ///
    /// # Errors
    /// * `Error::InvalidPayloadLength` - fixed length larger than the FIFO
    /// * `Error::DeviceFailed` - the driver was marked failed
    /// * `Error::Bus`, `Error::Pin` - collaborator failures
    pub fn poll_receive<L>(&mut self, listener: &mut L) -> Result<(), Error>
    where
        L: PacketListener + ?Sized,
    {
        self.ensure_healthy()?;
        if !self.dio0.is_high().map_err(|_| Error::Pin)? {
            return Ok(());
        }

        let mut buffer = [0u8; MAX_PACKET_LEN];
        match self.config.modulation {
            Modulation::Lora => {
                let irq: LoraIrqFlags = self.device.read_register()?;
                if irq.flags.contains(IrqFlags::PAYLOAD_CRC_ERROR) {
                    warn!("dropping LoRa packet with bad CRC");
                } else {
                    let count: RxNbBytes = self.device.read_register()?;
                    if count.count > 0 {
                        let current: FifoRxCurrentAddr = self.device.read_register()?;
                        self.device.write_register(FifoAddrPtr {
                            address: current.address,
                        })?;

                        let packet = &mut buffer[..count.count as usize];
                        self.device.read_fifo(packet)?;
                        debug!("received {} bytes", packet.len());
                        listener.on_packet(packet);
                    }
                }
                self.device.write_register(LoraIrqFlags::clear_all())?;
            }
            Modulation::Fsk | Modulation::Ook if self.config.is_fixed_length() => {
                let length = self.config.payload_length;
                let packet = buffer
                    .get_mut(..length as usize)
                    .ok_or(Error::InvalidPayloadLength(length))?;
                self.device.read_fifo(packet)?;
                debug!("received {} bytes", packet.len());
                listener.on_packet(packet);
            }
            // Variable length FSK/OOK reception is not supported
            Modulation::Fsk | Modulation::Ook => {}
        }

        Ok(())
    }

    fn check_packet_length(&self, len: usize) -> Result<(), Error> {
        let max = match self.config.modulation {
            Modulation::Lora => MAX_LORA_PACKET_LEN,
            Modulation::Fsk | Modulation::Ook => MAX_PACKET_LEN,
        };
        let fixed = self.config.payload_length as usize;

        if len == 0 || len > max || (fixed > 0 && len != fixed) {
            error!("rejecting packet of {} bytes", len);
            return Err(Error::InvalidPacketLength(len));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::*;
    use crate::config::RadioConfiguration;
    use crate::radio::OperatingMode;
    use embedded_hal_mock::eh1::digital::{State, Transaction as PinTransaction};
    use embedded_hal_mock::eh1::spi::Transaction as SpiTransaction;

    fn fifo_write(bytes: &[u8]) -> Vec<SpiTransaction<u8>> {
        vec![
            SpiTransaction::transaction_start(),
            SpiTransaction::write(0x80),
            SpiTransaction::write_vec(bytes.to_vec()),
            SpiTransaction::transaction_end(),
        ]
    }

    fn fifo_read(bytes: &[u8]) -> Vec<SpiTransaction<u8>> {
        vec![
            SpiTransaction::transaction_start(),
            SpiTransaction::write(0x00),
            SpiTransaction::read_vec(bytes.to_vec()),
            SpiTransaction::transaction_end(),
        ]
    }

    #[test]
    fn lora_transmit_end_to_end() {
        let mut spi = bring_up(&[0xE4, 0xC0, 0x00], 0x80);
        spi.extend(lora_915_modem());
        spi.extend(set_mode(0x81, 0x81));
        // transmit
        spi.extend(set_mode(0x81, 0x81));
        spi.extend(write(0x22, 0x03));
        spi.extend(write(0x12, 0xFF));
        spi.extend(write(0x0D, 0x00));
        spi.extend(fifo_write(&[0x01, 0x02, 0x03]));
        spi.extend(set_mode(0x83, 0x83));
        spi.extend(write(0x11, 0x00));
        spi.extend(write(0x40, 0x40));
        spi.extend(set_mode(0x81, 0x81));

        let mut radio = radio(
            lora_config(),
            spi,
            &reset_pulse(),
            &[PinTransaction::get(State::High)],
        );
        radio.configure().unwrap();
        radio.transmit(&[0x01, 0x02, 0x03]).unwrap();
        assert_eq!(radio.mode(), Some(OperatingMode::Standby));
        finish(radio);
    }

    #[test]
    fn fsk_transmit_fills_fifo_after_entering_tx() {
        let config = fsk_fixed_config();

        let mut spi = set_mode(0x03, 0x03);
        spi.extend(fifo_write(&[0xA5; 8]));
        spi.extend(set_mode(0x05, 0x05));

        let mut radio = radio(config, spi, &[], &[PinTransaction::get(State::High)]);
        radio.transmit(&[0xA5; 8]).unwrap();
        assert_eq!(radio.mode(), Some(OperatingMode::Receive));
        finish(radio);
    }

    #[test]
    fn transmit_timeout_is_not_an_error() {
        let config = RadioConfiguration {
            rx_start: false,
            ..fsk_fixed_config()
        };

        let mut spi = set_mode(0x03, 0x03);
        spi.extend(fifo_write(&[0x00; 8]));
        spi.extend(set_mode(0x01, 0x01));

        let dio = vec![PinTransaction::get(State::Low); TX_TIMEOUT_MS as usize];

        let mut radio = radio(config, spi, &[], &dio);
        assert_eq!(radio.transmit(&[0x00; 8]), Ok(()));
        assert_eq!(radio.mode(), Some(OperatingMode::Standby));
        finish(radio);
    }

    #[test]
    fn transmit_rejects_bad_lengths_without_bus_traffic() {
        let mut radio = radio(RadioConfiguration::default(), vec![], &[], &[]);
        assert_eq!(radio.transmit(&[]), Err(Error::InvalidPacketLength(0)));
        assert_eq!(
            radio.transmit(&[0u8; 257]),
            Err(Error::InvalidPacketLength(257))
        );
        finish(radio);

        let mut fixed = crate::radio::testing::radio(fsk_fixed_config(), vec![], &[], &[]);
        assert_eq!(
            fixed.transmit(&[0u8; 7]),
            Err(Error::InvalidPacketLength(7))
        );
        finish(fixed);

        let mut lora = crate::radio::testing::radio(lora_config(), vec![], &[], &[]);
        assert_eq!(
            lora.transmit(&[0u8; 256]),
            Err(Error::InvalidPacketLength(256))
        );
        finish(lora);
    }

    #[test]
    fn lora_fixed_length_transmit_keeps_payload_length() {
        let config = RadioConfiguration {
            payload_length: 3,
            ..lora_config()
        };

        let mut spi = set_mode(0x81, 0x81);
        spi.extend(write(0x12, 0xFF));
        spi.extend(write(0x0D, 0x00));
        spi.extend(fifo_write(&[0x0A, 0x0B, 0x0C]));
        spi.extend(set_mode(0x83, 0x83));
        spi.extend(write(0x11, 0x00));
        spi.extend(write(0x40, 0x40));
        spi.extend(set_mode(0x81, 0x81));

        let mut radio = radio(config, spi, &[], &[PinTransaction::get(State::High)]);
        radio.transmit(&[0x0A, 0x0B, 0x0C]).unwrap();
        finish(radio);
    }

    #[test]
    fn poll_receive_lora_skips_empty_packets() {
        let mut spi = read(0x12, 0x40);
        spi.extend(read(0x13, 0x00));
        spi.extend(write(0x12, 0xFF));

        let mut radio = radio(
            lora_config(),
            spi,
            &[],
            &[PinTransaction::get(State::High)],
        );

        let mut count = 0;
        radio.poll_receive(&mut |_: &[u8]| count += 1).unwrap();
        assert_eq!(count, 0);
        finish(radio);
    }

    #[test]
    fn poll_receive_rejects_fixed_length_beyond_fifo() {
        let config = RadioConfiguration {
            payload_length: 300,
            ..fsk_fixed_config()
        };

        let mut radio = radio(config, vec![], &[], &[PinTransaction::get(State::High)]);

        let mut count = 0;
        assert_eq!(
            radio.poll_receive(&mut |_: &[u8]| count += 1),
            Err(Error::InvalidPayloadLength(300))
        );
        assert_eq!(count, 0);
        finish(radio);
    }

    #[test]
    fn poll_receive_fsk_fixed_length_reads_one_burst() {
        let payload = [1, 2, 3, 4, 5, 6, 7, 8];
        let mut spi = bring_up(&[0x6C, 0x7A, 0xE1], 0x00);
        spi.extend(fsk_fixed_8_modem());
        spi.extend(set_mode(0x05, 0x05));
        spi.extend(fifo_read(&payload));

        let mut radio = radio(
            fsk_fixed_config(),
            spi,
            &reset_pulse(),
            &[PinTransaction::get(State::High)],
        );
        radio.configure().unwrap();

        let mut received = Vec::new();
        radio
            .poll_receive(&mut |packet: &[u8]| received.push(packet.to_vec()))
            .unwrap();
        assert_eq!(received, vec![payload.to_vec()]);
        finish(radio);
    }

    #[test]
    fn poll_receive_is_idle_while_dio0_is_low() {
        let mut radio = radio(
            lora_config(),
            vec![],
            &[],
            &[PinTransaction::get(State::Low)],
        );

        let mut count = 0;
        radio.poll_receive(&mut |_: &[u8]| count += 1).unwrap();
        assert_eq!(count, 0);
        finish(radio);
    }

    #[test]
    fn poll_receive_lora_repositions_fifo_and_clears_flags() {
        let mut spi = read(0x12, 0x40);
        spi.extend(read(0x13, 0x03));
        spi.extend(read(0x10, 0x20));
        spi.extend(write(0x0D, 0x20));
        spi.extend(fifo_read(&[0xDE, 0xAD, 0x01]));
        spi.extend(write(0x12, 0xFF));

        let mut radio = radio(
            lora_config(),
            spi,
            &[],
            &[PinTransaction::get(State::High)],
        );

        let mut received = Vec::new();
        radio
            .poll_receive(&mut |packet: &[u8]| received.push(packet.to_vec()))
            .unwrap();
        assert_eq!(received, vec![vec![0xDE, 0xAD, 0x01]]);
        finish(radio);
    }

    #[test]
    fn poll_receive_lora_drops_crc_failures() {
        let mut spi = read(0x12, 0x60);
        spi.extend(write(0x12, 0xFF));

        let mut radio = radio(
            lora_config(),
            spi,
            &[],
            &[PinTransaction::get(State::High)],
        );

        let mut count = 0;
        radio.poll_receive(&mut |_: &[u8]| count += 1).unwrap();
        assert_eq!(count, 0);
        finish(radio);
    }

    #[test]
    fn poll_receive_ignores_variable_length_fsk() {
        let mut radio = radio(
            RadioConfiguration::default(),
            vec![],
            &[],
            &[PinTransaction::get(State::High)],
        );

        let mut count = 0;
        radio.poll_receive(&mut |_: &[u8]| count += 1).unwrap();
        assert_eq!(count, 0);
        finish(radio);
    }
}
