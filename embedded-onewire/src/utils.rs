#[derive(Debug, Default)]
/// Calculate CRC-8 used in 1-Wire communications.
pub struct OneWireCrc(u8);

const fn crc8_step(crc: u8, byte: u8) -> u8 {
    let mut crc = crc ^ byte;
    let mut bit = 0;
    while bit < 8 {
        crc = if crc & 0x1 == 0x1 {
            (crc >> 1) ^ 0x8c
        } else {
            crc >> 1
        };
        bit += 1;
    }
    crc
}

#[cfg(feature = "crc-table")]
const CRC_TABLE: [u8; 256] = {
    let mut table = [0; 256];
    let mut idx = 0;
    while idx < 256 {
        table[idx] = crc8_step(0, idx as u8);
        idx += 1;
    }
    table
};

impl OneWireCrc {
    /// Get the current CRC value
    pub fn value(&self) -> u8 {
        self.0
    }

    /// Update the CRC with the incoming byte.
    #[cfg(feature = "crc-table")]
    pub fn update(&mut self, byte: u8) {
        self.0 = CRC_TABLE[(self.0 ^ byte) as usize];
    }

    /// Update the CRC with the incoming byte.
    #[cfg(not(feature = "crc-table"))]
    pub fn update(&mut self, byte: u8) {
        self.0 = crc8_step(self.0, byte);
    }

    /// Compute the 1-Wire CRC of a sequence of bytes.
    pub fn checksum(sequence: &[u8]) -> u8 {
        let mut crc = OneWireCrc::default();
        for &byte in sequence {
            crc.update(byte);
        }
        crc.value()
    }

    /// Validate a sequence of bytes where the last byte is the 1-Wire CRC of
    /// the previous bytes.
    pub fn validate(sequence: &[u8]) -> bool {
        // running the CRC over data followed by its own CRC leaves zero
        !sequence.is_empty() && Self::checksum(sequence) == 0
    }
}
