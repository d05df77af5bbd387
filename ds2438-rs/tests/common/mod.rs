//! Simulated DS2438 on a 1-Wire bus, and a delay that records into the same log.
#![allow(dead_code)]

use ds2438::{OneWire, OneWireError, OneWireResult};
use embedded_hal::delay::DelayNs;
use embedded_onewire::{ONEWIRE_MATCH_ROM_CMD, OneWireCrc, OneWireStatus};
use std::{cell::RefCell, rc::Rc};

pub const ROM: u64 = 0x5a00_0001_e2a4_1c26;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Reset,
    /// ROM phase finished; `None` for Skip ROM.
    Select(Option<u64>),
    /// Function command, with the strong pull-up flag.
    Command(u8, bool),
    Write(u8),
    /// Strong pull-up held after the preceding write.
    Pullup,
    Read(u8),
    Delay(u32),
}

pub type Log = Rc<RefCell<Vec<Event>>>;

pub fn log() -> Log {
    Rc::new(RefCell::new(Vec::new()))
}

pub struct Presence(bool);

impl OneWireStatus for Presence {
    fn presence(&self) -> bool {
        self.0
    }

    fn shortcircuit(&self) -> bool {
        false
    }
}

pub struct SimDs2438 {
    pub rom: u64,
    pub page: [u8; 8],
    pub present: bool,
    pub strong_pullup: bool,
    /// Replaces the status byte on every scratchpad read.
    pub readback: Option<u8>,
    pub corrupt_crc: bool,
    /// Voltage register loaded by a conversion, keyed by the configuration byte.
    voltages: Vec<(u8, i16)>,
    log: Log,
    frame: Vec<u8>,
    cursor: usize,
}

impl SimDs2438 {
    pub fn new(log: Log) -> Self {
        Self {
            rom: ROM,
            page: [0; 8],
            present: true,
            strong_pullup: true,
            readback: None,
            corrupt_crc: false,
            voltages: Vec::new(),
            log,
            frame: Vec::new(),
            cursor: 0,
        }
    }

    pub fn with_voltage(mut self, config: u8, volts: f32) -> Self {
        self.voltages.push((config, (volts * 100.0).round() as i16));
        self
    }

    pub fn with_temperature(mut self, lsb: u8, msb: u8) -> Self {
        self.page[1] = lsb;
        self.page[2] = msb;
        self
    }

    fn push(&self, event: Event) {
        self.log.borrow_mut().push(event);
    }

    fn rom_len(&self) -> usize {
        if self.frame[0] == ONEWIRE_MATCH_ROM_CMD { 9 } else { 1 }
    }

    fn selected(&self) -> bool {
        match self.frame.first() {
            Some(&0xcc) => true,
            Some(&0x55) if self.frame.len() >= 9 => {
                let mut rom = [0; 8];
                rom.copy_from_slice(&self.frame[1..9]);
                u64::from_le_bytes(rom) == self.rom
            }
            _ => false,
        }
    }

    fn command(&self) -> Option<u8> {
        self.frame.get(self.rom_len()).copied()
    }

    fn accept(&mut self, byte: u8, pullup: bool) {
        self.frame.push(byte);
        let rom_len = self.rom_len();
        let len = self.frame.len();
        if len == rom_len {
            let rom = if rom_len == 9 {
                let mut rom = [0; 8];
                rom.copy_from_slice(&self.frame[1..9]);
                Some(u64::from_le_bytes(rom))
            } else {
                None
            };
            self.push(Event::Select(rom));
            return;
        }
        if len < rom_len || !self.selected() {
            return;
        }
        let body = len - rom_len;
        if body == 1 {
            self.push(Event::Command(byte, pullup));
            if byte == 0xb4 {
                let config = self.page[0];
                if let Some(&(_, raw)) = self.voltages.iter().find(|(c, _)| *c == config) {
                    self.page[3..5].copy_from_slice(&raw.to_le_bytes());
                }
            }
            return;
        }
        self.push(Event::Write(byte));
        if pullup {
            self.push(Event::Pullup);
        }
        if body == 2 {
            self.cursor = 0;
        } else if self.command() == Some(0x4e) && self.cursor < self.page.len() {
            self.page[self.cursor] = byte;
            self.cursor += 1;
        }
    }

    /// Configuration bytes written to the scratchpad, in order.
    pub fn configs(log: &Log) -> Vec<u8> {
        let log = log.borrow();
        let mut configs = Vec::new();
        for (idx, event) in log.iter().enumerate() {
            if let Event::Command(0x4e, _) = event {
                if let Some(Event::Write(config)) = log.get(idx + 2) {
                    configs.push(*config);
                }
            }
        }
        configs
    }

    /// Function commands issued, with the strong pull-up flag.
    pub fn commands(log: &Log) -> Vec<(u8, bool)> {
        log.borrow()
            .iter()
            .filter_map(|e| match e {
                Event::Command(cmd, pullup) => Some((*cmd, *pullup)),
                _ => None,
            })
            .collect()
    }
}

impl OneWire for SimDs2438 {
    type Status = Presence;
    type BusError = ();

    fn reset(&mut self) -> OneWireResult<Self::Status, Self::BusError> {
        self.frame.clear();
        self.push(Event::Reset);
        Ok(Presence(self.present))
    }

    fn write_byte(&mut self, byte: u8) -> OneWireResult<(), Self::BusError> {
        self.accept(byte, false);
        Ok(())
    }

    fn read_byte(&mut self) -> OneWireResult<u8, Self::BusError> {
        let byte = if !self.selected() || self.command() != Some(0xbe) {
            0xff
        } else {
            let byte = match self.cursor {
                0 => self.readback.unwrap_or(self.page[0]),
                c if c < 8 => self.page[c],
                8 => {
                    let crc = OneWireCrc::checksum(&self.page);
                    if self.corrupt_crc { !crc } else { crc }
                }
                _ => 0xff,
            };
            self.cursor += 1;
            byte
        };
        self.push(Event::Read(byte));
        Ok(byte)
    }

    fn write_bit(&mut self, _bit: bool) -> OneWireResult<(), Self::BusError> {
        Ok(())
    }

    fn read_bit(&mut self) -> OneWireResult<bool, Self::BusError> {
        Ok(true)
    }

    fn write_byte_strong_pullup(&mut self, byte: u8) -> OneWireResult<(), Self::BusError> {
        if !self.strong_pullup {
            return Err(OneWireError::Unimplemented);
        }
        self.accept(byte, true);
        Ok(())
    }
}

/// Delay that returns immediately and records the requested time.
pub struct RecordingDelay(Log);

impl RecordingDelay {
    pub fn new(log: Log) -> Self {
        Self(log)
    }
}

impl DelayNs for RecordingDelay {
    fn delay_ns(&mut self, _ns: u32) {}

    fn delay_ms(&mut self, ms: u32) {
        self.0.borrow_mut().push(Event::Delay(ms));
    }
}

pub fn delays(log: &Log) -> Vec<u32> {
    log.borrow()
        .iter()
        .filter_map(|e| match e {
            Event::Delay(ms) => Some(*ms),
            _ => None,
        })
        .collect()
}

pub fn assert_float_eq(a: f32, b: f32, epsilon: f32) {
    let diff = (a - b).abs();
    assert!(
        diff < epsilon,
        "Values not equal within epsilon: {} vs {} (diff: {}, epsilon: {})",
        a,
        b,
        diff,
        epsilon
    );
}
