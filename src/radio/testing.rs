//! Mock collaborators and expected bus traffic shared by the driver tests

use embedded_hal_mock::eh1::delay::NoopDelay;
use embedded_hal_mock::eh1::digital::{Mock as PinMock, State, Transaction as PinTransaction};
use embedded_hal_mock::eh1::spi::{Mock as SpiMock, Transaction as SpiTransaction};

use super::Radio;
use crate::config::RadioConfiguration;
use crate::registers::Modulation;
use crate::timing::tests::TickingClock;

pub(crate) type MockRadio = Radio<SpiMock<u8>, PinMock, PinMock, NoopDelay, TickingClock>;

pub(crate) fn radio(
    config: RadioConfiguration,
    spi: Vec<SpiTransaction<u8>>,
    reset: &[PinTransaction],
    dio0: &[PinTransaction],
) -> MockRadio {
    radio_with_clock(config, spi, reset, dio0, TickingClock::default())
}

pub(crate) fn radio_with_clock(
    config: RadioConfiguration,
    spi: Vec<SpiTransaction<u8>>,
    reset: &[PinTransaction],
    dio0: &[PinTransaction],
    clock: TickingClock,
) -> MockRadio {
    Radio::new(
        SpiMock::new(&spi),
        PinMock::new(reset),
        PinMock::new(dio0),
        NoopDelay::new(),
        clock,
        config,
    )
}

/// Releases the radio and checks every mock saw exactly what was expected.
pub(crate) fn finish(radio: MockRadio) {
    let (mut spi, mut reset, mut dio0, _, _) = radio.release();
    spi.done();
    reset.done();
    dio0.done();
}

pub(crate) fn reset_pulse() -> [PinTransaction; 2] {
    [
        PinTransaction::set(State::Low),
        PinTransaction::set(State::High),
    ]
}

pub(crate) fn write(address: u8, value: u8) -> Vec<SpiTransaction<u8>> {
    vec![
        SpiTransaction::transaction_start(),
        SpiTransaction::write(address | 0x80),
        SpiTransaction::write(value),
        SpiTransaction::transaction_end(),
    ]
}

pub(crate) fn read(address: u8, value: u8) -> Vec<SpiTransaction<u8>> {
    vec![
        SpiTransaction::transaction_start(),
        SpiTransaction::write(address),
        SpiTransaction::read(value),
        SpiTransaction::transaction_end(),
    ]
}

/// An op-mode write confirmed by a single matching readback
pub(crate) fn set_mode(written: u8, reported: u8) -> Vec<SpiTransaction<u8>> {
    let mut spi = write(0x01, written);
    spi.extend(read(0x01, reported));
    spi
}

/// Identity check, carrier, calibration and modulation latch.
///
/// `frf` is the carrier register content, `modulation_sleep` the op-mode
/// byte latching the target modulation in sleep.
pub(crate) fn bring_up(frf: &[u8; 3], modulation_sleep: u8) -> Vec<SpiTransaction<u8>> {
    let mut spi = read(0x42, 0x12);
    spi.extend(write(0x01, 0x00));
    spi.extend(write(0x06, frf[0]));
    spi.extend(write(0x07, frf[1]));
    spi.extend(write(0x08, frf[2]));
    spi.extend(write(0x01, 0x01));
    spi.extend(write(0x3B, 0xC2));
    spi.extend(read(0x3B, 0x02));
    spi.extend(write(0x01, modulation_sleep));
    spi
}

/// Default PA: BOOST at 17 dBm, 40 us ramp, no shaping
fn default_pa() -> Vec<SpiTransaction<u8>> {
    let mut spi = write(0x09, 0xFF);
    spi.extend(write(0x0A, 0x09));
    spi
}

/// PA and LoRa modem program of [`lora_config`]
pub(crate) fn lora_915_modem() -> Vec<SpiTransaction<u8>> {
    let mut spi = default_pa();
    spi.extend(lora_modem());
    spi
}

/// PA and FSK modem program of [`fsk_fixed_config`]
pub(crate) fn fsk_fixed_8_modem() -> Vec<SpiTransaction<u8>> {
    let mut spi = default_pa();
    spi.extend(fsk_modem());
    spi
}

/// LoRa modem program alone: 125 kHz, 4/5, explicit header, CRC on
pub(crate) fn lora_modem() -> Vec<SpiTransaction<u8>> {
    let mut spi = write(0x1D, 0x72);
    spi.extend(write(0x1E, 0x74));
    spi.extend(write(0x0E, 0x00));
    spi.extend(write(0x0F, 0x00));
    spi.extend(write(0x22, 0x01));
    spi
}

/// FSK modem program alone: 25 kHz, 5 kHz deviation, 4800 bit/s, 8 bytes fixed
pub(crate) fn fsk_modem() -> Vec<SpiTransaction<u8>> {
    let mut spi = write(0x12, 0x0C);
    spi.extend(write(0x04, 0x00));
    spi.extend(write(0x05, 0x51));
    spi.extend(write(0x02, 0x1A));
    spi.extend(write(0x03, 0x0B));
    spi.extend(write(0x1A, 0x01));
    spi.extend(write(0x0D, 0x1E));
    spi.extend(write(0x35, 0x07));
    spi.extend(write(0x30, 0x00));
    spi.extend(write(0x31, 0x40));
    spi.extend(write(0x32, 0x08));
    spi.extend(write(0x40, 0x00));
    spi.extend(write(0x27, 0x80));
    spi.extend(write(0x1F, 0xA0));
    spi.extend(write(0x25, 0x00));
    spi.extend(write(0x26, 0x02));
    spi.extend(write(0x14, 0x28));
    spi.extend(write(0x16, 0x70));
    spi.extend(write(0x15, 0x44));
    spi.extend(write(0x10, 0xBC));
    spi
}

/// LoRa at 915 MHz, 125 kHz, variable length, CRC on, standby after bring-up
pub(crate) fn lora_config() -> RadioConfiguration {
    RadioConfiguration {
        frequency: 915_000_000,
        modulation: Modulation::Lora,
        bandwidth: 15,
        payload_length: 0,
        crc_enable: true,
        rx_start: false,
        ..Default::default()
    }
}

/// Default FSK with an 8 byte fixed payload and no CRC
pub(crate) fn fsk_fixed_config() -> RadioConfiguration {
    RadioConfiguration {
        payload_length: 8,
        crc_enable: false,
        ..Default::default()
    }
}
