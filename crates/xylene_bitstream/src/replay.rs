//! Packet replay: materializing frames from register writes.
//!
//! The stream is a sequential state machine. A [`ReplayState`] carries the
//! frame address register, pending frame data, the last committed frame (for
//! multi-frame writes), the write-enable flag, the IDCODE and the bound part
//! through the packet sequence. [`replay`] is independent of the byte-level
//! reader and can be run on any packet slice.

use crate::container::{ConfigFrame, FrameTable};
use crate::packet::{Command, ConfigPacket, Register};
use std::sync::Arc;
use xylene_common::{FrameAddress, IdCode};
use xylene_database::{Database, PartDescriptor};
use xylene_diagnostics::{Diagnostic, DiagnosticKind, Diagnostics, Location};

/// Inputs that parameterize a replay.
#[derive(Clone, Default)]
pub struct ReplayContext<'a> {
    /// Frame length override in words.
    pub frame_words: Option<usize>,
    /// Part to bind up front.
    pub part: Option<Arc<PartDescriptor>>,
    /// Database for binding a part by IDCODE when none is given.
    pub database: Option<&'a Database>,
}

/// What a replay produced.
#[derive(Debug)]
pub struct ReplayOutcome {
    /// Materialized frames.
    pub frames: FrameTable,
    /// The IDCODE written by the stream.
    pub idcode: Option<IdCode>,
    /// The part bound at the end of the replay.
    pub part: Option<Arc<PartDescriptor>>,
    /// The frame length that split the frame data.
    pub frame_words: Option<usize>,
    /// Anomalies in stream order.
    pub diagnostics: Diagnostics,
}

/// Mutable register state carried through the packet sequence.
struct ReplayState<'a> {
    ctx: &'a ReplayContext<'a>,
    far: Option<FrameAddress>,
    pending: Vec<u32>,
    pending_at: Location,
    last_frame: Option<Vec<u32>>,
    write_enabled: bool,
    highest_since_wcfg: Option<FrameAddress>,
    idcode: Option<IdCode>,
    part: Option<Arc<PartDescriptor>>,
    frames: FrameTable,
    diagnostics: Diagnostics,
    reported_unknown_length: bool,
    reported_missing_wcfg: bool,
}

impl<'a> ReplayState<'a> {
    fn new(ctx: &'a ReplayContext<'a>) -> Self {
        Self {
            ctx,
            far: None,
            pending: Vec::new(),
            pending_at: Location::NONE,
            last_frame: None,
            write_enabled: false,
            highest_since_wcfg: None,
            idcode: None,
            part: ctx.part.clone(),
            frames: FrameTable::new(),
            diagnostics: Diagnostics::new(),
            reported_unknown_length: false,
            reported_missing_wcfg: false,
        }
    }

    fn frame_words(&self) -> Option<usize> {
        self.ctx
            .frame_words
            .or_else(|| self.part.as_ref().map(|p| p.words_per_frame()))
            .filter(|&w| w > 0)
    }

    fn report(&mut self, kind: DiagnosticKind, message: String, location: Location) {
        tracing::trace!(%location, ?kind, "{message}");
        self.diagnostics.push(Diagnostic::new(kind, message, location));
    }

    fn step(&mut self, packet: &ConfigPacket) {
        if !packet.is_write() || packet.payload.is_empty() {
            return;
        }
        let here = Location::at_packet(packet.index, packet.offset);
        match packet.register {
            Register::Far => self.write_far(packet, here),
            Register::Fdri => self.write_fdri(packet, here),
            Register::Mfwr => self.write_mfwr(here),
            Register::Idcode => self.write_idcode(packet, here),
            Register::Cmd => {
                if packet.command() == Some(Command::Wcfg) {
                    self.write_enabled = true;
                    self.reported_missing_wcfg = false;
                    self.highest_since_wcfg = None;
                }
            }
            Register::Unknown(addr) => self.report(
                DiagnosticKind::UnknownRegister,
                format!("write to unknown register address {addr}"),
                here,
            ),
            Register::Fdro | Register::Stat | Register::Bootsts => self.report(
                DiagnosticKind::ReadOnlyRegister,
                format!(
                    "{} words written to read-only register {}; ignored",
                    packet.payload.len(),
                    packet.register
                ),
                here,
            ),
            _ => {}
        }
    }

    fn write_far(&mut self, packet: &ConfigPacket, here: Location) {
        self.flush_partial();
        let Some(&raw) = packet.payload.last() else {
            return;
        };
        let address = FrameAddress::from_raw(raw);
        if self.part.is_some() {
            if let Some(highest) = self.highest_since_wcfg {
                if address < highest {
                    self.report(
                        DiagnosticKind::FrameOutOfRange,
                        format!("FAR moves back to {address} after frame {highest} was written"),
                        here.with_frame(address),
                    );
                }
            }
        }
        self.far = Some(address);
    }

    fn write_fdri(&mut self, packet: &ConfigPacket, here: Location) {
        if !self.write_enabled && !self.reported_missing_wcfg {
            self.reported_missing_wcfg = true;
            self.report(
                DiagnosticKind::MissingWriteCommand,
                "frame data written before a WCFG command".to_string(),
                here,
            );
        }
        if self.far.is_none() {
            self.far = Some(FrameAddress::from_raw(0));
            self.report(
                DiagnosticKind::FrameOutOfRange,
                "frame data written before any FAR write; placed at address 0".to_string(),
                here.with_frame(FrameAddress::from_raw(0)),
            );
        }

        let Some(words) = self.frame_words() else {
            if !self.reported_unknown_length {
                self.reported_unknown_length = true;
                self.report(
                    DiagnosticKind::UnknownFrameLength,
                    "no frame length known; each FDRI packet is one frame".to_string(),
                    here,
                );
            }
            self.commit(packet.payload.clone(), here, true);
            return;
        };

        if self.pending.is_empty() {
            self.pending_at = here;
        }
        self.pending.extend_from_slice(&packet.payload);
        while self.pending.len() >= words {
            let rest = self.pending.split_off(words);
            let frame = std::mem::replace(&mut self.pending, rest);
            self.commit(frame, here, true);
        }
        if !self.pending.is_empty() {
            self.pending_at = here;
        }
    }

    fn write_mfwr(&mut self, here: Location) {
        match self.last_frame.clone() {
            Some(frame) => {
                if self.far.is_none() {
                    self.far = Some(FrameAddress::from_raw(0));
                }
                self.commit(frame, here, false);
            }
            None => self.report(
                DiagnosticKind::MissingWriteCommand,
                "multi-frame write with no previous frame to replicate".to_string(),
                here,
            ),
        }
    }

    fn write_idcode(&mut self, packet: &ConfigPacket, here: Location) {
        let Some(&raw) = packet.payload.last() else {
            return;
        };
        let idcode = IdCode::from_raw(raw);
        match self.idcode {
            Some(previous) if previous != idcode => {
                self.report(
                    DiagnosticKind::IdcodeConflict,
                    format!("IDCODE rewritten from {previous} to {idcode}; keeping {previous}"),
                    here,
                );
                return;
            }
            Some(_) => return,
            None => self.idcode = Some(idcode),
        }

        if self.part.is_none() {
            if let Some(part) = self.ctx.database.and_then(|db| db.lookup(idcode)) {
                tracing::debug!(%idcode, part = part.name(), "bound part by IDCODE");
                self.part = Some(Arc::clone(part));
            }
        }
    }

    /// Stores a frame at FAR, optionally advancing FAR.
    fn commit(&mut self, data: Vec<u32>, here: Location, advance: bool) {
        let address = self.far.unwrap_or(FrameAddress::from_raw(0));
        let at = here.with_frame(address);

        if let Some(part) = &self.part {
            if !part.contains_frame(address) {
                let message = format!(
                    "frame {address} outside the {} frames of {}",
                    part.frame_count(),
                    part.name()
                );
                self.report(DiagnosticKind::FrameOutOfRange, message, at);
            }
        }
        self.highest_since_wcfg = Some(self.highest_since_wcfg.map_or(address, |h| h.max(address)));

        self.last_frame = Some(data.clone());
        if self.frames.insert(ConfigFrame { address, data }) {
            self.report(
                DiagnosticKind::FrameRewritten,
                format!("frame {address} written more than once"),
                at,
            );
        }
        if advance {
            let next = address.next().unwrap_or_else(|| {
                self.report(
                    DiagnosticKind::FrameOutOfRange,
                    format!("FAR auto-increment wraps past {address}; continuing at address 0"),
                    at,
                );
                FrameAddress::from_raw(0)
            });
            self.far = Some(next);
        }
    }

    fn flush_partial(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let Some(words) = self.frame_words() else {
            return;
        };
        let mut data = std::mem::take(&mut self.pending);
        let got = data.len();
        data.resize(words, 0);
        let at = self.pending_at;
        self.report(
            DiagnosticKind::PartialFrame,
            format!("frame data ends after {got} of {words} words; zero-padded"),
            at,
        );
        self.commit(data, at, true);
    }

    fn finish(mut self) -> ReplayOutcome {
        self.flush_partial();
        let frame_words = self.frame_words();
        ReplayOutcome {
            frames: self.frames,
            idcode: self.idcode,
            part: self.part,
            frame_words,
            diagnostics: self.diagnostics,
        }
    }
}

/// Replays a packet sequence, materializing frames.
pub fn replay(packets: &[ConfigPacket], ctx: &ReplayContext<'_>) -> ReplayOutcome {
    let mut state = ReplayState::new(ctx);
    for packet in packets {
        state.step(packet);
    }
    let outcome = state.finish();
    tracing::debug!(
        packets = packets.len(),
        frames = outcome.frames.len(),
        "replay finished"
    );
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::{Opcode, PacketType};
    use xylene_diagnostics::Severity;

    fn write(register: Register, payload: Vec<u32>) -> ConfigPacket {
        ConfigPacket {
            index: 0,
            offset: 0,
            packet_type: PacketType::Type1,
            opcode: Opcode::Write,
            register,
            payload,
        }
    }

    fn indexed(mut packets: Vec<ConfigPacket>) -> Vec<ConfigPacket> {
        for (i, p) in packets.iter_mut().enumerate() {
            p.index = i;
            p.offset = 16 + i * 8;
        }
        packets
    }

    fn cmd(command: Command) -> ConfigPacket {
        write(Register::Cmd, vec![command.value()])
    }

    fn kinds(outcome: &ReplayOutcome) -> Vec<DiagnosticKind> {
        outcome.diagnostics.iter().map(|d| d.kind).collect()
    }

    fn part(words: usize, frames: u32) -> Arc<PartDescriptor> {
        let json = format!(
            r#"{{ "parts": [{{
                "name": "xy", "idcode": "0x01234093",
                "words_per_frame": {words}, "frame_count": {frames}, "rows": 1,
                "grid": [["A"]], "column_types": {{ "A": {{ "frames": {{ "logic": {frames} }} }} }}
            }}] }}"#
        );
        let db = Database::from_json_str(&json).unwrap();
        Arc::clone(db.list_parts().next().unwrap())
    }

    #[test]
    fn frames_split_by_override_length() {
        let packets = indexed(vec![
            cmd(Command::Wcfg),
            write(Register::Far, vec![4]),
            write(Register::Fdri, vec![1, 2, 3, 4, 5, 6]),
        ]);
        let ctx = ReplayContext {
            frame_words: Some(2),
            ..Default::default()
        };
        let out = replay(&packets, &ctx);
        assert!(out.diagnostics.is_empty());
        let addrs: Vec<u32> = out.frames.addresses().map(FrameAddress::as_raw).collect();
        assert_eq!(addrs, vec![4, 5, 6]);
        assert_eq!(out.frames.get(FrameAddress::from_raw(6)).unwrap().data, vec![5, 6]);
        assert_eq!(out.frame_words, Some(2));
    }

    #[test]
    fn unknown_length_uses_packet_boundaries() {
        let packets = indexed(vec![
            cmd(Command::Wcfg),
            write(Register::Far, vec![0]),
            write(Register::Fdri, vec![1, 2, 3]),
            write(Register::Fdri, vec![4]),
        ]);
        let out = replay(&packets, &ReplayContext::default());
        assert_eq!(kinds(&out), vec![DiagnosticKind::UnknownFrameLength]);
        assert_eq!(out.frames.len(), 2);
        assert_eq!(out.frames.get(FrameAddress::from_raw(1)).unwrap().data, vec![4]);
    }

    #[test]
    fn fdri_before_wcfg_and_far() {
        let packets = indexed(vec![write(Register::Fdri, vec![7, 8])]);
        let ctx = ReplayContext {
            frame_words: Some(2),
            ..Default::default()
        };
        let out = replay(&packets, &ctx);
        assert_eq!(
            kinds(&out),
            vec![
                DiagnosticKind::MissingWriteCommand,
                DiagnosticKind::FrameOutOfRange
            ]
        );
        assert!(out.frames.contains(FrameAddress::from_raw(0)));
        assert_eq!(out.diagnostics[1].severity, Severity::Warning);
    }

    #[test]
    fn partial_frame_is_zero_padded() {
        let packets = indexed(vec![
            cmd(Command::Wcfg),
            write(Register::Far, vec![0]),
            write(Register::Fdri, vec![1, 2, 3]),
        ]);
        let ctx = ReplayContext {
            frame_words: Some(2),
            ..Default::default()
        };
        let out = replay(&packets, &ctx);
        assert_eq!(kinds(&out), vec![DiagnosticKind::PartialFrame]);
        assert_eq!(out.frames.get(FrameAddress::from_raw(1)).unwrap().data, vec![3, 0]);
    }

    #[test]
    fn mfwr_replicates_last_frame() {
        let packets = indexed(vec![
            cmd(Command::Wcfg),
            write(Register::Far, vec![0]),
            write(Register::Fdri, vec![0xAA, 0xBB]),
            write(Register::Far, vec![9]),
            write(Register::Mfwr, vec![0, 0]),
        ]);
        let ctx = ReplayContext {
            frame_words: Some(2),
            ..Default::default()
        };
        let out = replay(&packets, &ctx);
        assert!(out.diagnostics.is_empty());
        assert_eq!(
            out.frames.get(FrameAddress::from_raw(9)).unwrap().data,
            vec![0xAA, 0xBB]
        );
    }

    #[test]
    fn mfwr_without_previous_frame() {
        let packets = indexed(vec![cmd(Command::Wcfg), write(Register::Mfwr, vec![0])]);
        let out = replay(&packets, &ReplayContext::default());
        assert_eq!(kinds(&out), vec![DiagnosticKind::MissingWriteCommand]);
        assert!(out.frames.is_empty());
    }

    #[test]
    fn rewritten_frame_is_info() {
        let packets = indexed(vec![
            cmd(Command::Wcfg),
            write(Register::Far, vec![3]),
            write(Register::Fdri, vec![1]),
            cmd(Command::Wcfg),
            write(Register::Far, vec![3]),
            write(Register::Fdri, vec![2]),
        ]);
        let ctx = ReplayContext {
            frame_words: Some(1),
            ..Default::default()
        };
        let out = replay(&packets, &ctx);
        assert_eq!(kinds(&out), vec![DiagnosticKind::FrameRewritten]);
        assert_eq!(out.diagnostics[0].severity, Severity::Info);
        assert_eq!(out.frames.get(FrameAddress::from_raw(3)).unwrap().data, vec![2]);
    }

    #[test]
    fn range_and_ordering_checked_with_part() {
        let packets = indexed(vec![
            cmd(Command::Wcfg),
            write(Register::Far, vec![2]),
            write(Register::Fdri, vec![1, 2]),
            write(Register::Far, vec![0]),
            write(Register::Fdri, vec![3]),
        ]);
        let ctx = ReplayContext {
            part: Some(part(1, 3)),
            ..Default::default()
        };
        let out = replay(&packets, &ctx);
        assert_eq!(
            kinds(&out),
            vec![DiagnosticKind::FrameOutOfRange, DiagnosticKind::FrameOutOfRange]
        );
        assert_eq!(
            out.diagnostics[0].location.frame,
            Some(FrameAddress::from_raw(3))
        );
        // Data is stored regardless.
        assert_eq!(out.frames.len(), 3);
    }

    #[test]
    fn idcode_binds_part_from_database() {
        let p = part(2, 4);
        let db = Database::from_catalog(xylene_database::Catalog {
            parts: vec![xylene_database::catalog::PartEntry::from(p.as_ref())],
        })
        .unwrap();
        let packets = indexed(vec![
            write(Register::Idcode, vec![0x0123_4093]),
            cmd(Command::Wcfg),
            write(Register::Far, vec![0]),
            write(Register::Fdri, vec![1, 2, 3, 4]),
        ]);
        let ctx = ReplayContext {
            database: Some(&db),
            ..Default::default()
        };
        let out = replay(&packets, &ctx);
        assert!(out.diagnostics.is_empty());
        assert_eq!(out.part.unwrap().name(), "xy");
        assert_eq!(out.frames.len(), 2);
        assert_eq!(out.idcode, Some(IdCode::from_raw(0x0123_4093)));
    }

    #[test]
    fn conflicting_idcode_keeps_first() {
        let packets = indexed(vec![
            write(Register::Idcode, vec![1]),
            write(Register::Idcode, vec![1]),
            write(Register::Idcode, vec![2]),
        ]);
        let out = replay(&packets, &ReplayContext::default());
        assert_eq!(kinds(&out), vec![DiagnosticKind::IdcodeConflict]);
        assert_eq!(out.idcode, Some(IdCode::from_raw(1)));
    }

    #[test]
    fn unknown_register_write() {
        let packets = indexed(vec![write(Register::Unknown(20), vec![0])]);
        let out = replay(&packets, &ReplayContext::default());
        assert_eq!(kinds(&out), vec![DiagnosticKind::UnknownRegister]);
        assert_eq!(out.diagnostics[0].location.packet, Some(0));
    }

    #[test]
    fn read_only_register_write() {
        let packets = indexed(vec![
            cmd(Command::Wcfg),
            write(Register::Far, vec![0]),
            write(Register::Fdro, vec![0xDEAD_BEEF]),
            write(Register::Stat, vec![0]),
            write(Register::Bootsts, vec![0]),
        ]);
        let out = replay(&packets, &ReplayContext::default());
        assert_eq!(
            kinds(&out),
            vec![
                DiagnosticKind::ReadOnlyRegister,
                DiagnosticKind::ReadOnlyRegister,
                DiagnosticKind::ReadOnlyRegister,
            ]
        );
        assert!(out.diagnostics[0].message.contains("FDRO"));
        assert!(out.frames.is_empty());
    }

    #[test]
    fn far_wrap_is_reported() {
        let packets = indexed(vec![
            cmd(Command::Wcfg),
            write(Register::Far, vec![u32::MAX]),
            write(Register::Fdri, vec![1, 2]),
        ]);
        let ctx = ReplayContext {
            frame_words: Some(1),
            ..Default::default()
        };
        let out = replay(&packets, &ctx);
        assert_eq!(kinds(&out), vec![DiagnosticKind::FrameOutOfRange]);
        let addresses: Vec<u32> = out.frames.addresses().map(FrameAddress::as_raw).collect();
        assert_eq!(addresses, vec![0, u32::MAX]);
    }
}
