use bitfield_struct::bitfield;

/// Status/configuration register of the DS2438, byte 0 of page 0.
///
/// The lower four bits are read/write configuration; the busy flags are
/// read-only and reflect conversions and EEPROM writes in progress.
#[bitfield(u8)]
#[derive(PartialEq, Eq)]
pub struct Configuration {
    /// IAD: enables the current A/D converter, which samples the sense
    /// resistor 36.41 times per second.
    pub current_ad: bool,
    /// CA: enables the current accumulators (ICA, CCA, DCA).
    pub current_accumulator: bool,
    /// EE: shadows the current accumulators to EEPROM.
    pub shadow_eeprom: bool,
    /// AD: voltage A/D input select. `true` converts the VDD supply input,
    /// `false` the VAD general purpose input.
    pub supply_input: bool,
    /// TB: temperature conversion in progress.
    pub temperature_busy: bool,
    /// NVB: EEPROM copy in progress.
    pub nvram_busy: bool,
    /// ADB: voltage conversion in progress.
    pub adc_busy: bool,
    #[bits(1)]
    __: u8,
}

/// Input selection of the voltage A/D converter, written as the
/// configuration byte before every voltage conversion that depends on it.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum InputSelect {
    /// Supply (excitation) voltage of ratiometric sensors, configuration `0x0f`.
    Reference,
    /// Sensor wired to the VAD input, configuration `0x00`.
    PrimarySensor,
    /// Auxiliary sensing configuration `0x09`, used for solar readings.
    AuxiliarySensor,
    /// Any other configuration byte.
    Other(u8),
}

impl InputSelect {
    /// Configuration byte selecting this input.
    pub const fn config(self) -> u8 {
        use InputSelect::*;
        match self {
            Reference => 0x0f,
            PrimarySensor => 0x00,
            AuxiliarySensor => 0x09,
            Other(config) => config,
        }
    }

    /// Decoded view of the configuration byte.
    pub fn configuration(self) -> Configuration {
        Configuration::from_bits(self.config())
    }
}

impl From<u8> for InputSelect {
    fn from(value: u8) -> Self {
        use InputSelect::*;
        match value {
            0x0f => Reference,
            0x00 => PrimarySensor,
            0x09 => AuxiliarySensor,
            other => Other(other),
        }
    }
}

impl From<InputSelect> for u8 {
    fn from(value: InputSelect) -> Self {
        value.config()
    }
}
