use crate::{ONEWIRE_MATCH_ROM_CMD, ONEWIRE_SKIP_ROM_CMD, OneWireError, OneWireResult};

/// Status of the bus, as reported by a reset.
pub trait OneWireStatus {
    /// Returns `true` if at least one device answered the reset with a presence pulse.
    fn presence(&self) -> bool;

    /// Returns `true` if the bus master detected a short on the line during the reset.
    fn shortcircuit(&self) -> bool;

    /// Logic level of the line sampled during the last status update, if the
    /// bus master is able to report it.
    fn logic_level(&self) -> Option<bool> {
        None
    }
}

/// Trait for 1-Wire communication.
/// This trait defines the basic operations required for 1-Wire communication, such as resetting the bus,
/// writing and reading bytes, and writing and reading bits.
pub trait OneWire {
    /// The status type returned by the reset operation.
    /// This type must implement the [OneWireStatus] trait.
    type Status: OneWireStatus;
    /// The error type returned by the operations of this trait.
    /// This type is used to indicate errors in the underlying hardware or communication.
    type BusError;

    /// Resets the 1-Wire bus and returns the status of the bus.
    ///
    /// # Errors
    /// This method returns an error if the reset operation fails.
    fn reset(&mut self) -> OneWireResult<Self::Status, Self::BusError>;

    /// Writes a byte to the 1-Wire bus.
    ///
    /// # Errors
    /// This method returns an error if the write operation fails.
    fn write_byte(&mut self, byte: u8) -> OneWireResult<(), Self::BusError>;

    /// Reads a byte from the 1-Wire bus.
    ///
    /// # Errors
    /// This method returns an error if the read operation fails.
    fn read_byte(&mut self) -> OneWireResult<u8, Self::BusError>;

    /// Writes a single bit to the 1-Wire bus.
    ///
    /// # Errors
    /// This method returns an error if the write operation fails.
    fn write_bit(&mut self, bit: bool) -> OneWireResult<(), Self::BusError>;

    /// Reads a single bit from the 1-Wire bus.
    ///
    /// # Errors
    /// This method returns an error if the read operation fails.
    fn read_bit(&mut self) -> OneWireResult<bool, Self::BusError>;

    /// Writes a byte, then holds the line high through a strong pull-up so that
    /// parasitically powered devices can draw the current a conversion or an
    /// EEPROM copy needs. The pull-up is released by the next bus operation.
    ///
    /// # Errors
    /// Returns [`OneWireError::Unimplemented`] unless the bus master supports a strong pull-up.
    fn write_byte_strong_pullup(&mut self, _byte: u8) -> OneWireResult<(), Self::BusError> {
        Err(OneWireError::Unimplemented)
    }

    /// # Note: Not intended for public API use.
    /// ## This method is internally used by the [search algorithm](https://www.analog.com/en/resources/app-notes/1wire-search-algorithm.html).
    ///
    /// Generates two read time slots and one write time slot. If both read time
    /// slots are 0, `direction` decides the written bit; otherwise the written
    /// bit is the id bit that was read.
    ///
    /// # Returns
    /// A tuple of the id bit, the complement bit, and the direction taken.
    ///
    /// # Errors
    /// Returns [`OneWireError::Unimplemented`] if the bus master has no triplet
    /// command, in which case the search falls back to single bit operations.
    fn read_triplet(&mut self, _direction: bool) -> OneWireResult<(bool, bool, bool), Self::BusError> {
        Err(OneWireError::Unimplemented)
    }

    /// Addresses devices on the 1-Wire bus.
    /// The first [`OneWire::read_byte`], [`OneWire::read_bit`], [`OneWire::write_byte`], [`OneWire::write_bit`] operation should be preceded by this method to address devices on the bus.
    /// Note: A [`OneWire::read_byte`] or [`OneWire::read_bit`] call will return garbage data if this method is called without specifying a ROM address on a bus with multiple devices.
    /// # Arguments
    /// * `rom` - The ROM address of the device to address. Pass [`None`] to skip ROM addressing and address all devices on the bus.
    ///
    /// # Errors
    /// [`OneWireError::ShortCircuit`] or [`OneWireError::NoDevicePresent`] if the
    /// reset reports a faulty or empty bus, or any error of the underlying operations.
    fn address(&mut self, rom: Option<u64>) -> OneWireResult<(), Self::BusError> {
        let status = self.reset()?;
        if status.shortcircuit() {
            return Err(OneWireError::ShortCircuit);
        }
        if !status.presence() {
            return Err(OneWireError::NoDevicePresent);
        }
        match rom {
            Some(rom) => {
                self.write_byte(ONEWIRE_MATCH_ROM_CMD)?;
                for b in rom.to_le_bytes() {
                    self.write_byte(b)?;
                }
            }
            None => self.write_byte(ONEWIRE_SKIP_ROM_CMD)?,
        }
        Ok(())
    }
}
