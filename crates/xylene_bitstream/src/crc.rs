//! CRC-32 computation and checksum verification over configuration packets.
//!
//! Every word written to a register other than CRC is folded into the running
//! CRC as a 37-bit value: the 5-bit register address followed by the 32 data
//! bits, MSB first. A corrupted register field therefore changes the CRC just
//! as a corrupted data word does. The CRC restarts after a `RCRC` command.
//! Each write to the CRC register states an expected value that is compared
//! with the running CRC at that point.

use crate::packet::{Command, ConfigPacket, Register};

/// CRC-32 polynomial (IEEE 802.3), processed MSB first.
const CRC32_POLY: u32 = 0x04C1_1DB7;

/// Width of a register address in the CRC input.
const REGISTER_BITS: u32 = 5;

/// Precomputed CRC-32 lookup table (256 entries).
const CRC32_TABLE: [u32; 256] = {
    let mut table = [0u32; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = (i as u32) << 24;
        let mut j = 0;
        while j < 8 {
            if crc & 0x8000_0000 != 0 {
                crc = (crc << 1) ^ CRC32_POLY;
            } else {
                crc <<= 1;
            }
            j += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
};

/// An incremental CRC-32.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Crc32 {
    value: u32,
}

impl Crc32 {
    /// Creates a CRC with a zero initial value.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds bytes into the CRC.
    pub fn update(&mut self, data: &[u8]) {
        for &byte in data {
            let idx = ((self.value >> 24) ^ byte as u32) as usize;
            self.value = (self.value << 8) ^ CRC32_TABLE[idx];
        }
    }

    /// Feeds the low `count` bits of `bits` into the CRC, MSB first.
    fn update_bits(&mut self, bits: u32, count: u32) {
        for i in (0..count).rev() {
            let feedback = ((self.value >> 31) ^ (bits >> i)) & 1;
            self.value <<= 1;
            if feedback == 1 {
                self.value ^= CRC32_POLY;
            }
        }
    }

    /// Feeds one word written to `register`.
    pub fn update_register_word(&mut self, register: Register, word: u32) {
        self.update_bits(u32::from(register.address()), REGISTER_BITS);
        self.update(&word.to_be_bytes());
    }

    /// Returns the current CRC value.
    pub fn value(&self) -> u32 {
        self.value
    }

    /// Resets the CRC to its initial value.
    pub fn reset(&mut self) {
        self.value = 0;
    }

    /// Applies one packet's effect under the stream checksum rules.
    ///
    /// Returns the stated values of a CRC register write, paired with the
    /// running CRC they are compared against.
    pub fn apply(&mut self, packet: &ConfigPacket) -> Vec<(u32, u32)> {
        if !packet.is_write() {
            return Vec::new();
        }
        if packet.register == Register::Crc {
            return packet.payload.iter().map(|&s| (s, self.value)).collect();
        }
        for &word in &packet.payload {
            self.update_register_word(packet.register, word);
        }
        if packet.command() == Some(Command::Rcrc) {
            self.reset();
        }
        Vec::new()
    }
}

/// A stated checksum and the value computed at the same point in the stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChecksumCheck {
    /// Index of the CRC register write.
    pub packet: usize,
    /// Byte offset of the stated word.
    pub offset: usize,
    /// The value written to the CRC register.
    pub stated: u32,
    /// The running CRC at that point.
    pub computed: u32,
}

impl ChecksumCheck {
    /// Returns `true` if the stated and computed values agree.
    pub fn matches(&self) -> bool {
        self.stated == self.computed
    }
}

/// Replays the checksum rules over a packet sequence.
///
/// Returns one check per stated CRC word, in stream order. An empty result
/// means the stream carries no checksum.
pub fn checksum_checks(packets: &[ConfigPacket]) -> Vec<ChecksumCheck> {
    let mut crc = Crc32::new();
    let mut checks = Vec::new();
    for packet in packets {
        for (i, (stated, computed)) in crc.apply(packet).into_iter().enumerate() {
            checks.push(ChecksumCheck {
                packet: packet.index,
                offset: packet.word_offset(i),
                stated,
                computed,
            });
        }
    }
    checks
}
