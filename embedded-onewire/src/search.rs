use crate::{
    ONEWIRE_CONDITIONAL_SEARCH_CMD, ONEWIRE_SEARCH_CMD, OneWire, OneWireCrc, OneWireError,
    OneWireStatus,
};

/// A structure for searching devices on a 1-Wire bus.
/// This structure implements the search algorithm for discovering devices on the 1-Wire bus.
/// It maintains the state of the search between calls to [`OneWireSearch::next`].
pub struct OneWireSearch<'a, T> {
    onewire: &'a mut T,
    cmd: u8,
    last_device: bool,
    last_discrepancy: u8,
    family: Option<u8>,
    rom: [u8; 8],
}

#[repr(u8)]
#[derive(Debug, Clone, Copy)]
/// Type of search performed using [`OneWireSearch`].
pub enum OneWireSearchKind {
    /// Normal search
    Normal = ONEWIRE_SEARCH_CMD,
    /// Search only for devices with alarm
    Alarmed = ONEWIRE_CONDITIONAL_SEARCH_CMD,
}

impl<'a, T> OneWireSearch<'a, T> {
    /// Creates a new [`OneWireSearch`] instance that walks every device on the bus.
    pub fn new(onewire: &'a mut T, kind: OneWireSearchKind) -> Self {
        Self {
            onewire,
            cmd: kind as _,
            last_device: false,
            last_discrepancy: 0,
            family: None,
            rom: [0; 8],
        }
    }

    /// Creates a new [`OneWireSearch`] instance that only reports devices of one family.
    ///
    /// The first pass is steered straight to the family code, and the search
    /// ends as soon as it walks past the last device of that family.
    pub fn with_family(onewire: &'a mut T, kind: OneWireSearchKind, family: u8) -> Self {
        let mut search = Self::new(onewire, kind);
        search.family = Some(family);
        search.rom[0] = family;
        search.last_discrepancy = 64;
        search
    }
}

impl<T: OneWire> OneWireSearch<'_, T> {
    /// Searches for the next device on the 1-Wire bus.
    /// This method implements the [1-Wire search algorithm](https://www.analog.com/en/resources/app-notes/1wire-search-algorithm.html).
    /// Call it repeatedly; it returns `None` once every device has been reported.
    ///
    /// # Returns
    /// The ROM code of the found device as a `u64`, family code in the least significant byte
    /// and the CRC-8 in the most significant byte.
    ///
    /// # Errors
    /// [`OneWireError::NoDevicePresent`] and [`OneWireError::ShortCircuit`] come from
    /// the reset status, [`OneWireError::InvalidCrc`] from a corrupted ROM.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Result<Option<u64>, OneWireError<T::BusError>> {
        if self.last_device {
            return Ok(None);
        }
        let status = self.onewire.reset()?;
        if status.shortcircuit() {
            return Err(OneWireError::ShortCircuit);
        }
        if !status.presence() {
            return Err(OneWireError::NoDevicePresent);
        }
        self.onewire.write_byte(self.cmd)?;

        let mut last_zero = 0;
        for bit_num in 1..=64u8 {
            let idx = ((bit_num - 1) / 8) as usize;
            let mask = 1u8 << ((bit_num - 1) % 8);
            let dir = if bit_num < self.last_discrepancy {
                self.rom[idx] & mask != 0
            } else {
                bit_num == self.last_discrepancy
            };
            let (id_bit, complement_bit, taken) = match self.onewire.read_triplet(dir) {
                Ok(triplet) => triplet,
                Err(OneWireError::Unimplemented) => {
                    let id_bit = self.onewire.read_bit()?;
                    let complement_bit = self.onewire.read_bit()?;
                    let taken = if id_bit != complement_bit { id_bit } else { dir };
                    if !(id_bit && complement_bit) {
                        self.onewire.write_bit(taken)?;
                    }
                    (id_bit, complement_bit, taken)
                }
                Err(e) => return Err(e),
            };
            if id_bit && complement_bit {
                // nobody answered this slot
                self.last_discrepancy = 0;
                self.last_device = true;
                return Ok(None);
            }
            if !id_bit && !complement_bit && !taken {
                last_zero = bit_num;
            }
            if taken {
                self.rom[idx] |= mask;
            } else {
                self.rom[idx] &= !mask;
            }
        }

        self.last_discrepancy = last_zero;
        self.last_device = last_zero == 0;

        if !OneWireCrc::validate(&self.rom) {
            return Err(OneWireError::InvalidCrc);
        }
        if let Some(family) = self.family {
            if self.rom[0] != family {
                self.last_device = true;
                return Ok(None);
            }
        }
        Ok(Some(u64::from_le_bytes(self.rom)))
    }
}
