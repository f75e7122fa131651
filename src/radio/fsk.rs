//! FSK/OOK modem program

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use embedded_hal::spi::SpiDevice;

use super::Radio;
use crate::config::FSK_BANDWIDTHS;
use crate::registers::{
    AfcFei, AfcFeiFlags, AutoRestartRx, Bitrate, DataMode, Dio0Mapping, DioMapping1, Fdev,
    FifoThresh, Modulation, OokAvg, OokFix, OokPeak, OokPeakThreshDec, OokPeakThreshStep,
    OokThresholdType, PacketConfig1, PacketConfig2, PayloadLength, PreambleDetect, PreambleSize,
    RssiThresh, RxBw, RxConfig, RxConfigFlags, SyncConfig, TxStartCondition, SYNC_VALUE_ADDRESS,
};
use crate::timing::Clock;
use crate::Error;

impl<SPI, RST, DIO, D, C> Radio<SPI, RST, DIO, D, C>
where
    SPI: SpiDevice,
    RST: OutputPin,
    DIO: InputPin,
    D: DelayNs,
    C: Clock,
{
    pub(super) fn configure_fsk_ook(&mut self) -> Result<(), Error> {
        let config = &self.config;
        let device = &mut self.device;

        let bandwidth = FSK_BANDWIDTHS
            .get(config.bandwidth as usize)
            .copied()
            .ok_or(Error::InvalidBandwidth(config.bandwidth))?;
        device.write_register(RxBw { bandwidth })?;

        device.write_register(Fdev::from_hz(config.deviation))?;
        device.write_register(
            Bitrate::from_bps(config.bitrate).ok_or(Error::InvalidBitrate(config.bitrate))?,
        )?;

        // AFC/AGC start on preamble detection when a preamble is expected
        let trigger = if config.preamble_size > 0 {
            RxConfigFlags::TRIGGER_PREAMBLE
        } else {
            RxConfigFlags::TRIGGER_RSSI
        };
        let mut rx_flags = RxConfigFlags::AGC_AUTO_ON | trigger;
        if config.modulation == Modulation::Fsk {
            rx_flags |= RxConfigFlags::AFC_AUTO_ON;
        }
        device.write_register(AfcFei {
            flags: AfcFeiFlags::AFC_AUTO_CLEAR_ON,
        })?;
        device.write_register(RxConfig { flags: rx_flags })?;

        if config.is_fixed_length() {
            let length = config.payload_length;
            device.write_register(FifoThresh {
                tx_start: TxStartCondition::FifoLevel,
                threshold: (length - 1).min(FifoThresh::MAX_THRESHOLD as u16) as u8,
            })?;
            device.write_register(PacketConfig1 {
                crc_on: config.crc_enable,
            })?;
            device.write_register(PacketConfig2 {
                data_mode: DataMode::Packet,
                payload_length_msb: (length >> 8) as u8,
            })?;
            device.write_register(PayloadLength { lsb: length as u8 })?;
        } else {
            device.write_register(PacketConfig2 {
                data_mode: DataMode::Continuous,
                payload_length_msb: 0,
            })?;
        }
        // PayloadReady in RX, PacketSent in TX
        device.write_register(DioMapping1 {
            dio0: Dio0Mapping::Mapping00,
        })?;

        device.write_register(SyncConfig {
            auto_restart: AutoRestartRx::WithPllRelock,
            polarity: config.preamble_polarity,
            sync_on: !config.sync_value.is_empty(),
            size: config.sync_value.len() as u8,
        })?;
        for (offset, byte) in config.sync_value.iter().enumerate() {
            device.write(SYNC_VALUE_ADDRESS + offset as u8, *byte)?;
        }

        device.write_register(PreambleDetect::for_preamble(
            config.preamble_size,
            config.preamble_errors,
        ))?;
        device.write_register(PreambleSize {
            value: config.preamble_size as u16,
        })?;

        device.write_register(OokPeak {
            bit_sync_on: config.bit_sync,
            threshold_type: OokThresholdType::Peak,
            step: OokPeakThreshStep::Db0_5,
        })?;
        device.write_register(OokAvg {
            decrement: OokPeakThreshDec::OnceEvery8Chips,
        })?;

        let floor = config.rx_floor_half_db();
        device.write_register(OokFix {
            threshold: (256 + floor).clamp(0, 255) as u8,
        })?;
        device.write_register(RssiThresh {
            value: floor.unsigned_abs().min(255) as u8,
        })?;

        Ok(())
    }
}
