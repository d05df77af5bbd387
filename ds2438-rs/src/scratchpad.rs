use crate::Configuration;
use fixed::types::I8F8;

/// Temperature in degrees Celsius.
///
/// The DS2438 resolves 1/32 °C; the three least significant bits are always zero.
pub type Temperature = I8F8;

pub(crate) const STATUS: usize = 0;
pub(crate) const TEMP_LSB: usize = 1;
pub(crate) const TEMP_MSB: usize = 2;
pub(crate) const VOLT_LSB: usize = 3;
pub(crate) const VOLT_MSB: usize = 4;
pub(crate) const CURR_LSB: usize = 5;
pub(crate) const CURR_MSB: usize = 6;
pub(crate) const THRESH: usize = 7;

/// Snapshot of page 0 of the DS2438 scratchpad.
///
/// | Byte | Content |
/// |------|---------|
/// | 0 | Status/configuration |
/// | 1-2 | Temperature (LSB, MSB) |
/// | 3-4 | Voltage (LSB, MSB) |
/// | 5-6 | Current (LSB, MSB) |
/// | 7 | Threshold |
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Scratchpad([u8; 8]);

impl Scratchpad {
    /// Size of the page in bytes, without the CRC.
    pub const LEN: usize = 8;

    /// Wrap raw page bytes.
    pub const fn from_bytes(bytes: [u8; 8]) -> Self {
        Self(bytes)
    }

    /// Raw page bytes.
    pub const fn as_bytes(&self) -> &[u8; 8] {
        &self.0
    }

    /// The status/configuration byte.
    pub const fn status(&self) -> u8 {
        self.0[STATUS]
    }

    /// The status/configuration byte, decoded.
    pub fn configuration(&self) -> Configuration {
        Configuration::from_bits(self.status())
    }

    /// Temperature register as a signed count of 1/32 °C.
    pub fn temperature_raw(&self) -> i16 {
        i16::from_le_bytes([self.0[TEMP_LSB], self.0[TEMP_MSB]]) >> 3
    }

    /// Temperature register in °C.
    pub fn temperature(&self) -> Temperature {
        Temperature::from_le_bytes([self.0[TEMP_LSB] & 0xf8, self.0[TEMP_MSB]])
    }

    /// Voltage register as a count of 10 mV.
    pub fn voltage_raw(&self) -> i16 {
        i16::from_le_bytes([self.0[VOLT_LSB], self.0[VOLT_MSB]])
    }

    /// Voltage register in volts.
    pub fn voltage(&self) -> f32 {
        self.voltage_raw() as f32 * 0.01
    }

    /// Current register, signed and unscaled.
    pub fn current_raw(&self) -> i16 {
        i16::from_le_bytes([self.0[CURR_LSB], self.0[CURR_MSB]])
    }

    /// Current accumulator threshold byte.
    pub const fn threshold(&self) -> u8 {
        self.0[THRESH]
    }
}

impl From<[u8; 8]> for Scratchpad {
    fn from(value: [u8; 8]) -> Self {
        Self(value)
    }
}
