#![cfg_attr(not(test), no_std)]
#![deny(missing_docs)]

//! # DS2438
//!
//! A no-std driver for the Analog Devices DS2438 smart battery monitor.
//!
//! The driver does not own the bus: every operation borrows a bus master
//! implementing [`OneWire`] and, where a conversion is involved, a timer
//! implementing [`DelayNs`](embedded_hal::delay::DelayNs).
//!
//! Besides the raw temperature, voltage and current registers, the driver
//! computes readings of ratiometric sensors wired to the VAD input: the
//! supply voltage is sampled first ([`InputSelect::Reference`]), then the
//! sensor input, and the two are combined (see [`VoltagePair`]).

mod config;
mod device;
mod error;
mod scratchpad;
mod sensors;

pub use config::{Configuration, InputSelect};
pub use device::Ds2438;
pub use embedded_onewire::{OneWire, OneWireError, OneWireResult};
pub use error::{Ds2438Error, Ds2438Result};
pub use scratchpad::{Scratchpad, Temperature};
pub use sensors::{VoltagePair, humidity, pressure, pressure_error};

use embedded_onewire::{OneWireSearch, OneWireSearchKind};

/// 1-Wire family code of the DS2438.
pub const DS2438_FAMILY: u8 = 0x26;

pub(crate) const DS2438_WRITE_SCRATCH: u8 = 0x4e;
pub(crate) const DS2438_READ_SCRATCH: u8 = 0xbe;
pub(crate) const DS2438_COPY_SCRATCH: u8 = 0x48;
pub(crate) const DS2438_RECALL_MEMORY: u8 = 0xb8;
pub(crate) const DS2438_CONVERT_T: u8 = 0x44;
pub(crate) const DS2438_CONVERT_V: u8 = 0xb4;

/// Page holding the status/configuration byte and the conversion results.
pub(crate) const DS2438_PAGE0: u8 = 0x00;

/// Search the bus for DS2438 devices.
///
/// Fills `roms` with the addresses found, stopping early once it is full,
/// and returns the number of devices stored.
pub fn enumerate<O: OneWire>(bus: &mut O, roms: &mut [u64]) -> OneWireResult<usize, O::BusError> {
    let mut search = OneWireSearch::with_family(bus, OneWireSearchKind::Normal, DS2438_FAMILY);
    let mut devices = 0;
    for slot in roms.iter_mut() {
        match search.next()? {
            Some(rom) => {
                *slot = rom;
                devices += 1;
            }
            None => break,
        }
    }
    log::debug!("found {} DS2438 device(s)", devices);
    Ok(devices)
}
