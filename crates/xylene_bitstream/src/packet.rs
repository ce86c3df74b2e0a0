//! Configuration packet headers, registers, and commands.
//!
//! After the sync word the stream is a sequence of 32-bit big-endian words.
//! Each packet starts with a header word:
//!
//! ```text
//! type 1:  [31:29]=001  [28:27] opcode  [17:13] register  [10:0] word count
//! type 2:  [31:29]=010  [28:27] opcode  [26:0] word count
//! ```
//!
//! A type-2 packet inherits its register from the preceding type-1 packet and
//! carries payloads too long for the 11-bit count.

use crate::error::DecodeError;
use serde::Serialize;
use std::fmt;

/// Synchronization word marking the start of configuration commands.
pub const SYNC_WORD: u32 = 0xAA99_5566;

/// Type-1 NOP with no payload.
pub const NOOP: u32 = 0x2000_0000;

/// Largest word count a type-1 header can carry.
pub const TYPE1_MAX_WORDS: u32 = 0x7FF;

/// Largest word count a type-2 header can carry.
pub const TYPE2_MAX_WORDS: u32 = 0x07FF_FFFF;

/// The header layout of a packet.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
pub enum PacketType {
    /// Register-addressed packet with an 11-bit count.
    Type1,
    /// Continuation packet with a 27-bit count.
    Type2,
}

/// What a packet does to its register.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
pub enum Opcode {
    /// No operation.
    Nop,
    /// Register read.
    Read,
    /// Register write.
    Write,
    /// Reserved encoding.
    Reserved,
}

impl Opcode {
    fn from_bits(bits: u32) -> Self {
        match bits & 0x3 {
            0 => Opcode::Nop,
            1 => Opcode::Read,
            2 => Opcode::Write,
            _ => Opcode::Reserved,
        }
    }

    fn bits(self) -> u32 {
        match self {
            Opcode::Nop => 0,
            Opcode::Read => 1,
            Opcode::Write => 2,
            Opcode::Reserved => 3,
        }
    }
}

macro_rules! registers {
    ($($(#[$meta:meta])* $name:ident = $addr:literal,)*) => {
        /// A configuration register addressed by a type-1 packet.
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize)]
        pub enum Register {
            $($(#[$meta])* $name,)*
            /// An address outside the known register file.
            Unknown(u8),
        }

        impl Register {
            /// Decodes a 5-bit register address.
            pub fn from_address(address: u8) -> Self {
                match address {
                    $($addr => Register::$name,)*
                    other => Register::Unknown(other),
                }
            }

            /// Returns the 5-bit register address.
            pub fn address(self) -> u8 {
                match self {
                    $(Register::$name => $addr,)*
                    Register::Unknown(other) => other,
                }
            }
        }
    };
}

registers! {
    /// Cyclic redundancy check.
    Crc = 0,
    /// Frame address register.
    Far = 1,
    /// Frame data register input.
    Fdri = 2,
    /// Frame data register output.
    Fdro = 3,
    /// Command register.
    Cmd = 4,
    /// Control register 0.
    Ctl0 = 5,
    /// Masking register for CTL0 and CTL1.
    Mask = 6,
    /// Status register.
    Stat = 7,
    /// Legacy output register.
    Lout = 8,
    /// Configuration option register 0.
    Cor0 = 9,
    /// Multiple frame write register.
    Mfwr = 10,
    /// Initial CBC value register.
    Cbc = 11,
    /// Device ID register.
    Idcode = 12,
    /// User access register.
    Axss = 13,
    /// Configuration option register 1.
    Cor1 = 14,
    /// Warm boot start address register.
    Wbstar = 16,
    /// Watchdog timer register.
    Timer = 17,
    /// Boot history status register.
    Bootsts = 22,
    /// Control register 1.
    Ctl1 = 24,
    /// SPI flash opcode register.
    Bspi = 31,
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Register::Unknown(addr) => write!(f, "REG{addr}"),
            other => write!(f, "{}", format!("{other:?}").to_ascii_uppercase()),
        }
    }
}

macro_rules! commands {
    ($($(#[$meta:meta])* $name:ident = $value:literal,)*) => {
        /// A value written to the command register.
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize)]
        pub enum Command {
            $($(#[$meta])* $name,)*
            /// A value outside the known command set.
            Unknown(u32),
        }

        impl Command {
            /// Decodes a command register value.
            pub fn from_value(value: u32) -> Self {
                match value {
                    $($value => Command::$name,)*
                    other => Command::Unknown(other),
                }
            }

            /// Returns the command register value.
            pub fn value(self) -> u32 {
                match self {
                    $(Command::$name => $value,)*
                    Command::Unknown(other) => other,
                }
            }
        }
    };
}

commands! {
    /// Null command.
    Null = 0,
    /// Write configuration data.
    Wcfg = 1,
    /// Multiple frame write.
    Mfw = 2,
    /// Last frame.
    Lfrm = 3,
    /// Read configuration data.
    Rcfg = 4,
    /// Begin the startup sequence.
    Start = 5,
    /// Reset the capture signal.
    Rcap = 6,
    /// Reset the CRC register.
    Rcrc = 7,
    /// Assert the GHIGH_B signal.
    Aghigh = 8,
    /// Switch the configuration clock frequency.
    Switch = 9,
    /// Pulse the GRESTORE signal.
    Grestore = 10,
    /// Begin the shutdown sequence.
    Shutdown = 11,
    /// Pulse the GCAPTURE signal.
    Gcapture = 12,
    /// End configuration.
    Desync = 13,
    /// Internal program.
    Iprog = 15,
    /// Calculate the CRC of the first readback data.
    Crcc = 16,
    /// Reload the watchdog timer.
    Ltimer = 17,
}

/// One decoded configuration packet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ConfigPacket {
    /// Position in the packet sequence.
    pub index: usize,
    /// Byte offset of the header word in the raw input.
    pub offset: usize,
    /// Header layout.
    pub packet_type: PacketType,
    /// Operation.
    pub opcode: Opcode,
    /// Target register (inherited for type-2 packets).
    pub register: Register,
    /// Payload words.
    pub payload: Vec<u32>,
}

impl ConfigPacket {
    /// Returns `true` if the packet writes its register.
    pub fn is_write(&self) -> bool {
        self.opcode == Opcode::Write
    }

    /// Returns `true` if the packet writes `register`.
    pub fn writes(&self, register: Register) -> bool {
        self.is_write() && self.register == register
    }

    /// Returns the command of a command-register write.
    pub fn command(&self) -> Option<Command> {
        if !self.writes(Register::Cmd) {
            return None;
        }
        self.payload.first().map(|&v| Command::from_value(v))
    }

    /// Returns the byte offset of payload word `word`.
    pub fn word_offset(&self, word: usize) -> usize {
        self.offset + 4 + word * 4
    }
}

/// Builds a type-1 header word.
pub fn type1_header(opcode: Opcode, register: Register, word_count: u32) -> u32 {
    0x2000_0000
        | (opcode.bits() << 27)
        | (u32::from(register.address() & 0x1F) << 13)
        | (word_count & TYPE1_MAX_WORDS)
}

/// Builds a type-2 header word.
pub fn type2_header(opcode: Opcode, word_count: u32) -> u32 {
    0x4000_0000 | (opcode.bits() << 27) | (word_count & TYPE2_MAX_WORDS)
}

/// The result of splitting a post-sync byte stream into packets.
#[derive(Debug, Default)]
pub struct PacketStream {
    /// Every packet up to and including the DESYNC write.
    pub packets: Vec<ConfigPacket>,
    /// Whether a DESYNC command ended the stream.
    pub desynced: bool,
    /// Byte offset of the first non-NOOP data after DESYNC.
    pub trailing: Option<usize>,
}

/// Splits the words following the sync word into packets.
///
/// `base` is the absolute byte offset of `data[0]` in the input, used for
/// packet offsets and error positions.
pub fn parse_packets(data: &[u8], base: usize) -> Result<PacketStream, DecodeError> {
    let mut stream = PacketStream::default();
    let mut pos = 0usize;
    let mut last_type1: Option<Register> = None;

    let read_word = |pos: usize| -> Option<u32> {
        let bytes = data.get(pos..pos + 4)?;
        Some(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    };

    while pos < data.len() {
        let offset = base + pos;
        let Some(header) = read_word(pos) else {
            return Err(DecodeError::TruncatedStream {
                offset,
                reason: format!("{} trailing bytes do not form a word", data.len() - pos),
            });
        };

        let opcode = Opcode::from_bits(header >> 27);
        let (packet_type, register, count) = match header >> 29 {
            1 => {
                let register = Register::from_address(((header >> 13) & 0x1F) as u8);
                last_type1 = Some(register);
                (PacketType::Type1, register, header & TYPE1_MAX_WORDS)
            }
            2 => {
                let Some(register) = last_type1 else {
                    return Err(DecodeError::Desynchronized {
                        offset,
                        word: header,
                    });
                };
                (PacketType::Type2, register, header & TYPE2_MAX_WORDS)
            }
            _ => {
                return Err(DecodeError::Desynchronized {
                    offset,
                    word: header,
                })
            }
        };

        let start = pos + 4;
        let end = (count as usize)
            .checked_mul(4)
            .and_then(|n| start.checked_add(n))
            .filter(|&end| end <= data.len())
            .ok_or_else(|| DecodeError::TruncatedStream {
                offset,
                reason: format!(
                    "{register} packet declares {count} words but only {} bytes remain",
                    data.len().saturating_sub(start)
                ),
            })?;

        let payload = data[start..end]
            .chunks_exact(4)
            .map(|b| u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
            .collect();

        let packet = ConfigPacket {
            index: stream.packets.len(),
            offset,
            packet_type,
            opcode,
            register,
            payload,
        };
        tracing::trace!(
            index = packet.index,
            offset = packet.offset,
            %register,
            ?opcode,
            words = count,
            "packet"
        );
        let desync = packet.command() == Some(Command::Desync);
        stream.packets.push(packet);
        pos = end;

        if desync {
            stream.desynced = true;
            let mut tail = pos;
            while tail < data.len() {
                if read_word(tail) != Some(NOOP) {
                    stream.trailing = Some(base + tail);
                    break;
                }
                tail += 4;
            }
            break;
        }
    }

    Ok(stream)
}
