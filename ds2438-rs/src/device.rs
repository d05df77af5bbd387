use crate::{
    Configuration, DS2438_CONVERT_T, DS2438_CONVERT_V, DS2438_COPY_SCRATCH, DS2438_FAMILY,
    DS2438_PAGE0, DS2438_READ_SCRATCH, DS2438_RECALL_MEMORY, DS2438_WRITE_SCRATCH, Ds2438Error,
    Ds2438Result, InputSelect, Scratchpad, Temperature,
};
use embedded_hal::delay::DelayNs;
use embedded_onewire::{OneWire, OneWireCrc, OneWireError, OneWireResult};

/// Time the DS2438 needs to copy the scratchpad to EEPROM.
const COPY_DELAY_MS: u32 = 20;
/// Voltage conversion time.
const CONVERT_V_DELAY_MS: u32 = 10;
/// Temperature conversion time.
const CONVERT_T_DELAY_MS: u32 = 20;

/// A DS2438 smart battery monitor on a 1-Wire bus.
///
/// The driver holds the device address and its own configuration only;
/// the bus master is borrowed by every call.
#[derive(Debug, Clone)]
pub struct Ds2438 {
    rom: Option<u64>,
    parasite: bool,
    crc: bool,
    input: Option<InputSelect>,
    pub(crate) humidity_input: InputSelect,
    pub(crate) pressure_input: InputSelect,
    pub(crate) solar_input: InputSelect,
}

impl Ds2438 {
    /// 1-Wire family code of the DS2438.
    #[inline]
    pub const fn family() -> u8 {
        DS2438_FAMILY
    }

    /// Bind a driver to the device with the given ROM address.
    ///
    /// No bus activity takes place.
    pub fn new(rom: u64) -> Self {
        Self::with_rom(Some(rom))
    }

    /// Bind a driver to the only device of a single-drop bus, addressed with Skip ROM.
    pub fn single_drop() -> Self {
        Self::with_rom(None)
    }

    fn with_rom(rom: Option<u64>) -> Self {
        Self {
            rom,
            parasite: true,
            crc: false,
            input: None,
            humidity_input: InputSelect::PrimarySensor,
            pressure_input: InputSelect::PrimarySensor,
            solar_input: InputSelect::AuxiliarySensor,
        }
    }

    /// Hold the bus with a strong pull-up during conversions and EEPROM copies,
    /// for parasitically powered devices. Enabled by default.
    pub fn with_parasite_power(mut self, parasite: bool) -> Self {
        self.parasite = parasite;
        self
    }

    /// Read the CRC byte that follows the scratchpad page and reject corrupted reads.
    /// Disabled by default.
    pub fn with_crc(mut self, crc: bool) -> Self {
        self.crc = crc;
        self
    }

    /// Input the humidity sensor is wired to.
    pub fn with_humidity_input(mut self, input: InputSelect) -> Self {
        self.humidity_input = input;
        self
    }

    /// Input the pressure sensor is wired to.
    pub fn with_pressure_input(mut self, input: InputSelect) -> Self {
        self.pressure_input = input;
        self
    }

    /// Input the solar sensor is wired to.
    pub fn with_solar_input(mut self, input: InputSelect) -> Self {
        self.solar_input = input;
        self
    }

    /// Rebind this driver to another device on the same bus.
    ///
    /// The input selection of the new device is unknown until the next
    /// successful [`Ds2438::write_setup`].
    pub fn set_address(&mut self, rom: u64) {
        self.rom = Some(rom);
        self.input = None;
    }

    /// ROM address of the device, `None` when addressed with Skip ROM.
    pub fn rom(&self) -> Option<u64> {
        self.rom
    }

    /// Input selection confirmed by the last successful [`Ds2438::write_setup`].
    pub fn input_select(&self) -> Option<InputSelect> {
        self.input
    }

    fn command<O: OneWire>(&self, bus: &mut O, cmd: u8) -> OneWireResult<(), O::BusError> {
        bus.address(self.rom)?;
        bus.write_byte(cmd)?;
        bus.write_byte(DS2438_PAGE0)
    }

    fn convert<O: OneWire, D: DelayNs>(
        &self,
        bus: &mut O,
        delay: &mut D,
        cmd: u8,
        delay_ms: u32,
    ) -> OneWireResult<(), O::BusError> {
        bus.address(self.rom)?;
        self.write_powered(bus, cmd)?;
        delay.delay_ms(delay_ms);
        Ok(())
    }

    /// Last byte before a power-hungry operation; pulled up on parasite power.
    fn write_powered<O: OneWire>(&self, bus: &mut O, byte: u8) -> OneWireResult<(), O::BusError> {
        if self.parasite {
            bus.write_byte_strong_pullup(byte)
        } else {
            bus.write_byte(byte)
        }
    }

    /// Write the configuration byte and commit it to EEPROM.
    ///
    /// The byte is written to the scratchpad, read back, and only copied when
    /// the read-back matches; the copy is followed by a 20 ms settling delay.
    ///
    /// # Errors
    /// [`Ds2438Error::SetupMismatch`] if the read-back differs. The input
    /// selection of the device is then unknown and no reading depending on
    /// it is reliable until a write succeeds.
    pub fn write_setup<O: OneWire, D: DelayNs>(
        &mut self,
        bus: &mut O,
        delay: &mut D,
        config: u8,
    ) -> Ds2438Result<(), O::BusError> {
        self.input = None;
        self.command(bus, DS2438_WRITE_SCRATCH)?;
        bus.write_byte(config)?;

        self.command(bus, DS2438_READ_SCRATCH)?;
        let read = bus.read_byte()?;
        if read != config {
            log::warn!(
                "DS2438 {:?}: configuration read back as {:#04x}, wrote {:#04x}",
                self.rom,
                read,
                config
            );
            return Err(Ds2438Error::SetupMismatch {
                written: config,
                read,
            });
        }

        bus.address(self.rom)?;
        bus.write_byte(DS2438_COPY_SCRATCH)?;
        self.write_powered(bus, DS2438_PAGE0)?;
        delay.delay_ms(COPY_DELAY_MS);
        self.input = Some(InputSelect::from(config));
        log::debug!("DS2438 {:?}: configuration {:#04x}", self.rom, config);
        Ok(())
    }

    /// Select the A/D input sampled by the next voltage conversion.
    pub fn select_input<O: OneWire, D: DelayNs>(
        &mut self,
        bus: &mut O,
        delay: &mut D,
        input: InputSelect,
    ) -> Ds2438Result<(), O::BusError> {
        self.write_setup(bus, delay, input.config())
    }

    /// Read the status/configuration byte.
    pub fn read_setup<O: OneWire>(&self, bus: &mut O) -> Ds2438Result<u8, O::BusError> {
        Ok(self.read_scratchpad(bus)?.status())
    }

    /// Read the status/configuration byte, decoded.
    pub fn read_configuration<O: OneWire>(
        &self,
        bus: &mut O,
    ) -> Ds2438Result<Configuration, O::BusError> {
        Ok(self.read_scratchpad(bus)?.configuration())
    }

    /// Recall page 0 from memory into the scratchpad and read it.
    ///
    /// # Errors
    /// [`OneWireError::InvalidCrc`] if CRC checking is enabled and the page
    /// does not match its CRC byte.
    pub fn read_scratchpad<O: OneWire>(&self, bus: &mut O) -> Ds2438Result<Scratchpad, O::BusError> {
        self.command(bus, DS2438_RECALL_MEMORY)?;
        self.command(bus, DS2438_READ_SCRATCH)?;
        let mut buf = [0; Scratchpad::LEN + 1];
        let len = if self.crc { buf.len() } else { Scratchpad::LEN };
        for b in buf[..len].iter_mut() {
            *b = bus.read_byte()?;
        }
        if self.crc && !OneWireCrc::validate(&buf) {
            log::warn!("DS2438 {:?}: scratchpad CRC mismatch {:02x?}", self.rom, buf);
            return Err(Ds2438Error::OneWire(OneWireError::InvalidCrc));
        }
        let mut page = [0; Scratchpad::LEN];
        page.copy_from_slice(&buf[..Scratchpad::LEN]);
        log::trace!("DS2438 {:?}: scratchpad {:02x?}", self.rom, page);
        Ok(Scratchpad::from_bytes(page))
    }

    /// Convert and read the voltage of the currently selected input, in volts.
    ///
    /// No input selection takes place; see [`Ds2438::select_input`].
    pub fn read_volt<O: OneWire, D: DelayNs>(
        &self,
        bus: &mut O,
        delay: &mut D,
    ) -> Ds2438Result<f32, O::BusError> {
        self.convert(bus, delay, DS2438_CONVERT_V, CONVERT_V_DELAY_MS)?;
        let volt = self.read_scratchpad(bus)?.voltage();
        log::trace!("DS2438 {:?}: {:?} input at {} V", self.rom, self.input, volt);
        Ok(volt)
    }

    /// Convert and read the temperature.
    pub fn read_temperature<O: OneWire, D: DelayNs>(
        &self,
        bus: &mut O,
        delay: &mut D,
    ) -> Ds2438Result<Temperature, O::BusError> {
        self.convert(bus, delay, DS2438_CONVERT_T, CONVERT_T_DELAY_MS)?;
        Ok(self.read_scratchpad(bus)?.temperature())
    }

    /// Convert and read the temperature in °C.
    pub fn read_temp_c<O: OneWire, D: DelayNs>(
        &self,
        bus: &mut O,
        delay: &mut D,
    ) -> Ds2438Result<f32, O::BusError> {
        Ok(self.read_temperature(bus, delay)?.to_num::<f32>())
    }

    /// Convert and read the temperature in °F.
    pub fn read_temp_f<O: OneWire, D: DelayNs>(
        &self,
        bus: &mut O,
        delay: &mut D,
    ) -> Ds2438Result<f32, O::BusError> {
        Ok(self.read_temp_c(bus, delay)? * 1.8 + 32.0)
    }

    /// Read the current register as raw signed counts.
    ///
    /// The value is not scaled by a sense resistor; it serves as a relative
    /// solar flux reading.
    pub fn read_current<O: OneWire>(&self, bus: &mut O) -> Ds2438Result<f32, O::BusError> {
        Ok(self.read_scratchpad(bus)?.current_raw() as f32)
    }
}
