//! # nRF24L01(+) Radio Device
//!
//! Drives an nRF24L01 compatible 2.4 GHz transceiver as a raw BLE advertising transmitter.
//!
//! ## Architecture
//!
//! The chip is configured so that everything it adds to a packet by itself coincides with
//! the BLE air format:
//! - 1 Mbps data rate, no CRC, no auto-acknowledge, no retransmit, no dynamic payloads
//! - 4 byte address holding the advertising access address 0x8E89BED6 bit-reversed
//!   (written LSB first as 71 91 7D 6B); with the default 0x55/0xAA preamble the chip emits
//!   the exact BLE preamble and access address
//! - The payload is the whitened, bit-reversed PDU produced by the advertiser
//!
//! ## Hardware Interface
//!
//! - `SPI`: an `embedded-hal` 1.0 `SpiDevice` (the device owns chip select)
//! - `CE`: chip enable output pin, pulsed to start a transmission
//! - `D`: delay provider for the power-up settle time and the CE pulse
//!
//! Every command is a single `transfer_in_place`; the first byte clocked back is the status
//! register and is ignored except where a register is read.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiDevice;
use log::{Level, log};

use crate::{ADVERTISING_ACCESS_ADDRESS, RADIO_PAYLOAD_MAX, RadioPort};

// Registers
const REG_CONFIG: u8 = 0x00;
const REG_EN_AA: u8 = 0x01;
const REG_EN_RXADDR: u8 = 0x02;
const REG_SETUP_AW: u8 = 0x03;
const REG_SETUP_RETR: u8 = 0x04;
const REG_RF_CH: u8 = 0x05;
const REG_RF_SETUP: u8 = 0x06;
const REG_STATUS: u8 = 0x07;
const REG_TX_ADDR: u8 = 0x10;
const REG_FIFO_STATUS: u8 = 0x17;
const REG_DYNPD: u8 = 0x1C;
const REG_FEATURE: u8 = 0x1D;

// Commands
const CMD_R_REGISTER: u8 = 0x00;
const CMD_W_REGISTER: u8 = 0x20;
const CMD_W_TX_PAYLOAD: u8 = 0xA0;
const CMD_FLUSH_TX: u8 = 0xE1;
const CMD_NOP: u8 = 0xFF;

const CONFIG_PWR_UP: u8 = 0x02;
const SETUP_AW_4_BYTES: u8 = 0x02;
const RF_SETUP_DR_1_MBPS: u8 = 0x00;
const STATUS_CLEAR_IRQ: u8 = 0x70;
const FIFO_STATUS_TX_EMPTY: u8 = 0x10;
const RF_CH_MASK: u8 = 0x7F;

/// Crystal oscillator start-up plus standby settle time after PWR_UP
const POWER_UP_DELAY_US: u32 = 1500;
/// Minimum CE high pulse to start a transmission is 10 us
const CE_PULSE_US: u32 = 15;

/// Transmit output power
#[derive(Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "std", derive(Debug))]
pub enum TxPower {
    Minus18Dbm,
    Minus12Dbm,
    Minus6Dbm,
    #[default]
    ZeroDbm,
}

impl TxPower {
    /// RF_PWR field of the RF_SETUP register
    pub const fn rf_setup_bits(self) -> u8 {
        match self {
            TxPower::Minus18Dbm => 0x00,
            TxPower::Minus12Dbm => 0x02,
            TxPower::Minus6Dbm => 0x04,
            TxPower::ZeroDbm => 0x06,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "std", derive(Debug))]
pub struct Nrf24Configuration {
    pub tx_power: TxPower,
}

#[derive(Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(Debug))]
pub enum Nrf24Error<SpiE, PinE> {
    Spi(SpiE),
    Pin(PinE),
    /// The frame does not fit into the 32 byte TX FIFO entry (contains the offending length)
    PayloadTooLong(usize),
}

/// nRF24L01(+) radio device
pub struct RadioDevice<SPI, CE, D> {
    spi: SPI,
    ce: CE,
    delay: D,
    config: Nrf24Configuration,
}

impl<SPI, CE, D> RadioDevice<SPI, CE, D>
where
    SPI: SpiDevice<u8>,
    CE: OutputPin,
    D: DelayNs,
{
    /// Wrap the bus and pins; the chip is not touched until [`RadioPort::power_up`]
    pub fn new(spi: SPI, ce: CE, delay: D, config: Nrf24Configuration) -> Self {
        RadioDevice { spi, ce, delay, config }
    }

    /// Give back the bus and pins
    pub fn release(self) -> (SPI, CE, D) {
        (self.spi, self.ce, self.delay)
    }

    fn command(&mut self, buffer: &mut [u8]) -> Result<(), Nrf24Error<SPI::Error, CE::Error>> {
        self.spi.transfer_in_place(buffer).map_err(Nrf24Error::Spi)
    }

    fn write_register(&mut self, register: u8, value: u8) -> Result<(), Nrf24Error<SPI::Error, CE::Error>> {
        self.command(&mut [CMD_W_REGISTER | register, value])
    }

    fn read_register(&mut self, register: u8) -> Result<u8, Nrf24Error<SPI::Error, CE::Error>> {
        let mut buffer = [CMD_R_REGISTER | register, CMD_NOP];
        self.command(&mut buffer)?;
        Ok(buffer[1])
    }

    fn write_tx_address(&mut self) -> Result<(), Nrf24Error<SPI::Error, CE::Error>> {
        let address = ADVERTISING_ACCESS_ADDRESS.reverse_bits().to_le_bytes();
        let mut buffer = [CMD_W_REGISTER | REG_TX_ADDR, address[0], address[1], address[2], address[3]];
        self.command(&mut buffer)
    }
}

impl<SPI, CE, D> RadioPort for RadioDevice<SPI, CE, D>
where
    SPI: SpiDevice<u8>,
    CE: OutputPin,
    D: DelayNs,
{
    type Error = Nrf24Error<SPI::Error, CE::Error>;

    fn set_frequency(&mut self, mhz_offset: u8) -> Result<(), Self::Error> {
        self.write_register(REG_RF_CH, mhz_offset & RF_CH_MASK)
    }

    fn transmit(&mut self, frame: &[u8]) -> Result<(), Self::Error> {
        if frame.len() > RADIO_PAYLOAD_MAX {
            return Err(Nrf24Error::PayloadTooLong(frame.len()));
        }
        let mut buffer = [0u8; RADIO_PAYLOAD_MAX + 1];
        buffer[0] = CMD_W_TX_PAYLOAD;
        buffer[1..=frame.len()].copy_from_slice(frame);
        self.command(&mut buffer[..=frame.len()])?;

        self.ce.set_high().map_err(Nrf24Error::Pin)?;
        self.delay.delay_us(CE_PULSE_US);
        self.ce.set_low().map_err(Nrf24Error::Pin)
    }

    fn transmit_queue_empty(&mut self) -> Result<bool, Self::Error> {
        Ok(self.read_register(REG_FIFO_STATUS)? & FIFO_STATUS_TX_EMPTY != 0)
    }

    fn power_up(&mut self) -> Result<(), Self::Error> {
        self.ce.set_low().map_err(Nrf24Error::Pin)?;
        self.write_register(REG_EN_AA, 0)?;
        self.write_register(REG_EN_RXADDR, 0)?;
        self.write_register(REG_SETUP_AW, SETUP_AW_4_BYTES)?;
        self.write_register(REG_SETUP_RETR, 0)?;
        self.write_register(REG_RF_SETUP, RF_SETUP_DR_1_MBPS | self.config.tx_power.rf_setup_bits())?;
        self.write_register(REG_DYNPD, 0)?;
        self.write_register(REG_FEATURE, 0)?;
        self.write_tx_address()?;
        self.write_register(REG_STATUS, STATUS_CLEAR_IRQ)?;
        self.command(&mut [CMD_FLUSH_TX])?;
        // PTX mode, hardware CRC disabled
        self.write_register(REG_CONFIG, CONFIG_PWR_UP)?;
        self.delay.delay_us(POWER_UP_DELAY_US);
        log!(Level::Info, "nRF24 powered up, RF_SETUP {:#04x}", self.config.tx_power.rf_setup_bits());
        Ok(())
    }

    fn power_down(&mut self) -> Result<(), Self::Error> {
        self.ce.set_low().map_err(Nrf24Error::Pin)?;
        self.write_register(REG_CONFIG, 0)
    }
}
