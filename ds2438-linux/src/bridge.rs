//! DS2484 I2C to 1-Wire bridge, as the bus master of the DS2438.

use bitfield_struct::bitfield;
use embedded_hal::{
    delay::DelayNs,
    i2c::{I2c, SevenBitAddress},
};
use embedded_onewire::{OneWire, OneWireResult, OneWireStatus};

const DS2484_ADDR: u8 = 0x18;

const DEVICE_RST_CMD: u8 = 0xf0;
const READ_PTR_CMD: u8 = 0xe1;
const WRITE_CONFIG_CMD: u8 = 0xd2;
const ONEWIRE_RESET_CMD: u8 = 0xb4;
const ONEWIRE_SINGLE_BIT: u8 = 0x87;
const ONEWIRE_WRITE_BYTE: u8 = 0xa5;
const ONEWIRE_READ_BYTE: u8 = 0x96;
const ONEWIRE_TRIPLET: u8 = 0x78;

const DEVICE_STATUS_PTR: u8 = 0xf0;
const READ_DATA_PTR: u8 = 0xe1;

#[derive(Debug)]
/// DS2484 hardware errors.
pub enum BridgeError<E> {
    /// I2C bus errors.
    I2c(E),
    /// Busy wait retries exceeded.
    RetriesExceeded,
}

impl<E> From<E> for BridgeError<E> {
    fn from(value: E) -> Self {
        Self::I2c(value)
    }
}

/// Status register of the DS2484.
#[bitfield(u8)]
pub struct BridgeStatus {
    /// 1WB: a 1-Wire command is in progress.
    pub onewire_busy: bool,
    /// PPD: a presence pulse was seen during the last 1-Wire reset.
    pub presence_pulse: bool,
    /// SD: the line was shorted during the last 1-Wire reset.
    pub short_detect: bool,
    /// LL: logic level of the line.
    pub logic_level: bool,
    /// RST: the bridge went through a device reset.
    pub device_reset: bool,
    /// SBR: single bit result, or first bit of a triplet.
    pub single_bit_result: bool,
    /// TSB: second bit of a triplet.
    pub triplet_second_bit: bool,
    /// DIR: direction taken by the last triplet.
    pub branch_direction: bool,
}

impl OneWireStatus for BridgeStatus {
    fn presence(&self) -> bool {
        self.presence_pulse()
    }

    fn shortcircuit(&self) -> bool {
        self.short_detect()
    }

    fn logic_level(&self) -> Option<bool> {
        Some(BridgeStatus::logic_level(self))
    }
}

/// Device configuration register of the DS2484.
#[bitfield(u8)]
pub struct BridgeConfig {
    /// APU: active pull-up.
    pub active_pullup: bool,
    /// PDN: 1-Wire power down.
    pub power_down: bool,
    /// SPU: strong pull-up after the next byte or bit, cleared by the bridge when it ends.
    pub strong_pullup: bool,
    /// 1WS: overdrive speed.
    pub overdrive: bool,
    #[bits(4)]
    __: u8,
}

impl BridgeConfig {
    /// The register is written with its upper nibble holding the complement of the lower one.
    fn write_byte(self) -> u8 {
        let bits = self.into_bits() & 0x0f;
        bits | ((!bits & 0x0f) << 4)
    }
}

/// A DS2484 bridge on an I2C bus.
pub struct Ds2484Bridge<I, D> {
    i2c: I,
    delay: D,
    retries: u8,
    config: BridgeConfig,
}

impl<I: I2c<SevenBitAddress>, D: DelayNs> Ds2484Bridge<I, D> {
    /// Wrap an I2C bus and a timer. Active pull-up is enabled.
    pub fn new(i2c: I, delay: D) -> Self {
        Self {
            i2c,
            delay,
            retries: 100,
            config: BridgeConfig::new().with_active_pullup(true),
        }
    }

    /// Set the number of 1 ms polls before a busy bridge is given up on.
    pub fn with_retries(mut self, retries: u8) -> Self {
        self.retries = retries;
        self
    }

    /// Give back the I2C bus and the timer.
    #[allow(dead_code)]
    pub fn release(self) -> (I, D) {
        (self.i2c, self.delay)
    }

    /// Reset the bridge and write its configuration.
    pub fn init(&mut self) -> Result<(), BridgeError<I::Error>> {
        self.i2c.write(DS2484_ADDR, &[DEVICE_RST_CMD])?;
        let mut tries = 0;
        loop {
            let mut status = [0];
            self.i2c.read(DS2484_ADDR, &mut status)?;
            if BridgeStatus::from_bits(status[0]).device_reset() {
                break;
            }
            tries += 1;
            if tries > self.retries {
                return Err(BridgeError::RetriesExceeded);
            }
            self.delay.delay_ms(1);
        }
        self.write_config(self.config)
    }

    fn write_config(&mut self, config: BridgeConfig) -> Result<(), BridgeError<I::Error>> {
        self.wait()?;
        let mut readback = [0];
        self.i2c.write_read(
            DS2484_ADDR,
            &[WRITE_CONFIG_CMD, config.write_byte()],
            &mut readback,
        )?;
        log::trace!("DS2484 configuration {:#04x}", readback[0]);
        Ok(())
    }

    fn wait(&mut self) -> Result<BridgeStatus, BridgeError<I::Error>> {
        self.i2c
            .write(DS2484_ADDR, &[READ_PTR_CMD, DEVICE_STATUS_PTR])?;
        let mut tries = 0;
        loop {
            let mut status = [0];
            self.i2c.read(DS2484_ADDR, &mut status)?;
            let status = BridgeStatus::from_bits(status[0]);
            if !status.onewire_busy() {
                return Ok(status);
            }
            tries += 1;
            if tries > self.retries {
                return Err(BridgeError::RetriesExceeded);
            }
            self.delay.delay_ms(1);
        }
    }
}

impl<I: I2c<SevenBitAddress>, D: DelayNs> OneWire for Ds2484Bridge<I, D> {
    type Status = BridgeStatus;

    type BusError = BridgeError<I::Error>;

    fn reset(&mut self) -> OneWireResult<Self::Status, Self::BusError> {
        self.wait()?;
        self.i2c
            .write(DS2484_ADDR, &[ONEWIRE_RESET_CMD])
            .map_err(BridgeError::from)?;
        Ok(self.wait()?)
    }

    fn write_byte(&mut self, byte: u8) -> OneWireResult<(), Self::BusError> {
        self.wait()?;
        self.i2c
            .write(DS2484_ADDR, &[ONEWIRE_WRITE_BYTE, byte])
            .map_err(BridgeError::from)?;
        Ok(())
    }

    fn read_byte(&mut self) -> OneWireResult<u8, Self::BusError> {
        self.wait()?;
        self.i2c
            .write(DS2484_ADDR, &[ONEWIRE_READ_BYTE])
            .map_err(BridgeError::from)?;
        self.wait()?;
        let mut val = [0];
        self.i2c
            .write_read(DS2484_ADDR, &[READ_PTR_CMD, READ_DATA_PTR], &mut val)
            .map_err(BridgeError::from)?;
        Ok(val[0])
    }

    fn write_bit(&mut self, bit: bool) -> OneWireResult<(), Self::BusError> {
        self.wait()?;
        self.i2c
            .write(
                DS2484_ADDR,
                &[ONEWIRE_SINGLE_BIT, if bit { 0x80 } else { 0x0 }],
            )
            .map_err(BridgeError::from)?;
        Ok(())
    }

    fn read_bit(&mut self) -> OneWireResult<bool, Self::BusError> {
        self.write_bit(true)?;
        Ok(self.wait()?.single_bit_result())
    }

    fn write_byte_strong_pullup(&mut self, byte: u8) -> OneWireResult<(), Self::BusError> {
        self.write_config(self.config.with_strong_pullup(true))?;
        self.write_byte(byte)
    }

    fn read_triplet(&mut self, direction: bool) -> OneWireResult<(bool, bool, bool), Self::BusError> {
        self.wait()?;
        self.i2c
            .write(
                DS2484_ADDR,
                &[ONEWIRE_TRIPLET, if direction { 0x80 } else { 0x0 }],
            )
            .map_err(BridgeError::from)?;
        let status = self.wait()?;
        Ok((
            status.single_bit_result(),
            status.triplet_second_bit(),
            status.branch_direction(),
        ))
    }
}
