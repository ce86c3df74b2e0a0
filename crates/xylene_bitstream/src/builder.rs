//! Synthetic bitstream construction for tests.
//!
//! [`StreamBuilder`] emits the same header, packet, and checksum layout the
//! reader consumes, so tests can describe a stream as a sequence of register
//! writes instead of hand-assembling bytes. The CRC it states follows the
//! reader's checksum rules exactly.

use crate::crc::Crc32;
use crate::packet::{
    type1_header, type2_header, Command, ConfigPacket, Opcode, PacketType, Register, NOOP,
    SYNC_WORD, TYPE1_MAX_WORDS,
};
use std::ops::Range;

/// Bus-width auto-detection pattern preceding the sync word.
const BUS_WIDTH_PATTERN: [u32; 2] = [0x0000_00BB, 0x1122_0044];

/// Builds a configuration bitstream one register write at a time.
#[derive(Clone, Debug, Default)]
pub struct StreamBuilder {
    header: Option<(String, String)>,
    declared_length: Option<u32>,
    words: Vec<u32>,
    crc: Crc32,
    frame_data: Vec<Range<usize>>,
    trailing: Vec<u8>,
}

impl StreamBuilder {
    /// Creates a headerless stream.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a `.bit` header with the given design and part names.
    pub fn with_header(mut self, design: &str, part: &str) -> Self {
        self.header = Some((design.to_string(), part.to_string()));
        self
    }

    /// Overrides the header's declared data length.
    pub fn with_declared_length(mut self, length: u32) -> Self {
        self.declared_length = Some(length);
        self
    }

    /// Appends `count` NOOP words.
    pub fn noop(mut self, count: usize) -> Self {
        self.words.extend(std::iter::repeat(NOOP).take(count));
        self
    }

    /// Appends a raw word.
    pub fn raw(mut self, word: u32) -> Self {
        self.words.push(word);
        self
    }

    /// Appends a register write, using a type-2 packet for long payloads.
    pub fn write(mut self, register: Register, payload: &[u32]) -> Self {
        let count = payload.len() as u32;
        if count <= TYPE1_MAX_WORDS {
            self.words.push(type1_header(Opcode::Write, register, count));
        } else {
            self.words.push(type1_header(Opcode::Write, register, 0));
            self.words.push(type2_header(Opcode::Write, count));
        }
        let start = self.words.len();
        self.words.extend_from_slice(payload);
        if register == Register::Fdri {
            self.frame_data.push(start..self.words.len());
        }
        self.crc.apply(&ConfigPacket {
            index: 0,
            offset: 0,
            packet_type: PacketType::Type1,
            opcode: Opcode::Write,
            register,
            payload: payload.to_vec(),
        });
        self
    }

    /// Writes a command.
    pub fn command(self, command: Command) -> Self {
        self.write(Register::Cmd, &[command.value()])
    }

    /// Resets the CRC.
    pub fn rcrc(self) -> Self {
        self.command(Command::Rcrc)
    }

    /// Enables configuration writes.
    pub fn wcfg(self) -> Self {
        self.command(Command::Wcfg)
    }

    /// Ends configuration.
    pub fn desync(self) -> Self {
        self.command(Command::Desync)
    }

    /// Writes the IDCODE register.
    pub fn idcode(self, idcode: u32) -> Self {
        self.write(Register::Idcode, &[idcode])
    }

    /// Writes the frame address register.
    pub fn far(self, address: u32) -> Self {
        self.write(Register::Far, &[address])
    }

    /// Writes frame data.
    pub fn fdri(self, words: &[u32]) -> Self {
        self.write(Register::Fdri, words)
    }

    /// Replicates the last frame at FAR.
    pub fn mfwr(self) -> Self {
        self.write(Register::Mfwr, &[0, 0])
    }

    /// States the correct running CRC.
    pub fn crc(self) -> Self {
        let value = self.crc.value();
        self.write(Register::Crc, &[value])
    }

    /// States an arbitrary CRC value.
    pub fn crc_value(self, value: u32) -> Self {
        self.write(Register::Crc, &[value])
    }

    /// Appends raw bytes after the last packet.
    pub fn trailing(mut self, bytes: &[u8]) -> Self {
        self.trailing.extend_from_slice(bytes);
        self
    }

    /// Serializes the stream.
    pub fn build(&self) -> Vec<u8> {
        self.build_with_layout().0
    }

    /// Serializes the stream, also returning the byte ranges of every FDRI payload.
    pub fn build_with_layout(&self) -> (Vec<u8>, Vec<Range<usize>>) {
        let mut body = Vec::new();
        body.extend_from_slice(&[0xFF; 16]);
        for word in BUS_WIDTH_PATTERN {
            body.extend_from_slice(&word.to_be_bytes());
        }
        body.extend_from_slice(&[0xFF; 8]);
        body.extend_from_slice(&SYNC_WORD.to_be_bytes());
        let words_start = body.len();
        for word in &self.words {
            body.extend_from_slice(&word.to_be_bytes());
        }
        body.extend_from_slice(&self.trailing);

        let mut out = Vec::new();
        if let Some((design, part)) = &self.header {
            let length = self.declared_length.unwrap_or(body.len() as u32);
            write_header(&mut out, design, part, length);
        }
        let base = out.len() + words_start;
        out.extend_from_slice(&body);

        let ranges = self
            .frame_data
            .iter()
            .map(|r| base + r.start * 4..base + r.end * 4)
            .collect();
        (out, ranges)
    }
}

/// Writes the `.bit` header.
fn write_header(data: &mut Vec<u8>, design: &str, part: &str, length: u32) {
    let preamble = [
        0x00, 0x09, 0x0F, 0xF0, 0x0F, 0xF0, 0x0F, 0xF0, 0x0F, 0xF0, 0x00, 0x00, 0x01,
    ];
    data.extend_from_slice(&preamble);
    write_field(data, b'a', design.as_bytes());
    write_field(data, b'b', part.as_bytes());
    write_field(data, b'c', b"2024/01/01");
    write_field(data, b'd', b"00:00:00");
    data.push(b'e');
    data.extend_from_slice(&length.to_be_bytes());
}

/// Writes a single field (key + 2-byte length + NUL-terminated value).
fn write_field(data: &mut Vec<u8>, key: u8, value: &[u8]) {
    data.push(key);
    data.extend_from_slice(&((value.len() + 1) as u16).to_be_bytes());
    data.extend_from_slice(value);
    data.push(0);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::parse_header;
    use crate::packet::parse_packets;
    use crate::reader::find_sync;

    #[test]
    fn header_roundtrips_through_parser() {
        let bytes = StreamBuilder::new().with_header("top", "xy2x2").desync().build();
        let sync = find_sync(&bytes, 1024).unwrap();
        let header = parse_header(&bytes[..sync]).unwrap();
        assert_eq!(header.design.as_deref(), Some("top"));
        assert_eq!(header.part.as_deref(), Some("xy2x2"));
        assert_eq!(header.data_length, Some((bytes.len() - header.end) as u32));
    }

    #[test]
    fn long_payload_uses_type2() {
        let data = vec![0u32; 3000];
        let bytes = StreamBuilder::new().fdri(&data).build();
        let sync = find_sync(&bytes, 1024).unwrap();
        let stream = parse_packets(&bytes[sync + 4..], sync + 4).unwrap();
        assert_eq!(stream.packets.len(), 2);
        assert_eq!(stream.packets[0].packet_type, PacketType::Type1);
        assert_eq!(stream.packets[1].packet_type, PacketType::Type2);
        assert_eq!(stream.packets[1].payload.len(), 3000);
    }

    #[test]
    fn frame_data_ranges_point_at_payload() {
        let (bytes, ranges) = StreamBuilder::new()
            .with_header("d", "p")
            .far(0)
            .fdri(&[0xCAFE_F00D])
            .build_with_layout();
        assert_eq!(ranges.len(), 1);
        assert_eq!(&bytes[ranges[0].clone()], &[0xCA, 0xFE, 0xF0, 0x0D]);
    }
}
