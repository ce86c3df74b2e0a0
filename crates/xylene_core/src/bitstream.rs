//! A decoded container bound to its part.

use crate::error::QueryError;
use crate::resolver::PhysicalAddress;
use std::sync::Arc;
use xylene_bitstream::{BitstreamContainer, ConfigFrame};
use xylene_common::FrameAddress;
use xylene_database::{Database, PartDescriptor};
use xylene_diagnostics::Diagnostics;

/// A container whose frames were materialized with its part's geometry.
#[derive(Debug, Clone)]
pub struct Bitstream {
    container: BitstreamContainer,
    part: Arc<PartDescriptor>,
    diagnostics: Diagnostics,
}

impl Bitstream {
    /// Binds a container to the part its IDCODE names.
    ///
    /// A part already bound during decoding is kept. Fails with
    /// [`QueryError::UnknownPart`] when the IDCODE has no database entry; the
    /// container itself stays usable for decode-only work.
    pub fn bind(container: BitstreamContainer, database: &Database) -> Result<Self, QueryError> {
        if let Some(part) = container.part().cloned() {
            return Ok(Self::with_part(container, part));
        }
        let idcode = container.idcode().ok_or(QueryError::MissingIdcode)?;
        let part = database
            .lookup(idcode)
            .ok_or(QueryError::UnknownPart { idcode })?;
        Ok(Self::with_part(container, Arc::clone(part)))
    }

    /// Binds a container to `part` regardless of its IDCODE.
    ///
    /// The frame table is rebuilt when the container was decoded against a
    /// different part or frame length.
    pub fn with_part(container: BitstreamContainer, part: Arc<PartDescriptor>) -> Self {
        let same_part = container.part().is_some_and(|p| Arc::ptr_eq(p, &part));
        let same_length = container.frame_words() == Some(part.words_per_frame());
        if same_part && same_length {
            return Self {
                container,
                part,
                diagnostics: Diagnostics::new(),
            };
        }
        tracing::debug!(part = part.name(), "rebuilding frames for bound part");
        let (container, diagnostics) = container.rematerialize(&part);
        Self {
            container,
            part,
            diagnostics,
        }
    }

    /// Returns the container.
    pub fn container(&self) -> &BitstreamContainer {
        &self.container
    }

    /// Returns the bound part.
    pub fn part(&self) -> &Arc<PartDescriptor> {
        &self.part
    }

    /// Returns the anomalies found while rebuilding frames for the part.
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Returns the frame at `address`.
    pub fn frame(&self, address: FrameAddress) -> Option<&ConfigFrame> {
        self.container.frames().get(address)
    }

    /// Returns one bit, or `None` when the bitstream does not carry its frame.
    pub fn bit(&self, address: PhysicalAddress) -> Option<bool> {
        self.frame(address.frame)?.bit(address.frame_bit())
    }

    /// Unwraps the container.
    pub fn into_container(self) -> BitstreamContainer {
        self.container
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::database;
    use xylene_bitstream::builder::StreamBuilder;
    use xylene_bitstream::{decode, DecodeOptions};
    use xylene_diagnostics::DiagnosticKind;

    #[test]
    fn bind_by_idcode_rebuilds_frames() {
        let db = database();
        let bytes = StreamBuilder::new()
            .rcrc()
            .idcode(0x0432_1093)
            .wcfg()
            .far(2)
            .fdri(&[1, 2, 3, 4])
            .crc()
            .desync()
            .build();
        // Without a database every FDRI packet becomes one frame.
        let (container, diags) = decode(&bytes, &DecodeOptions::default()).unwrap();
        assert_eq!(diags[0].kind, DiagnosticKind::UnknownFrameLength);
        assert_eq!(container.frames().len(), 1);

        let bs = Bitstream::bind(container, &db).unwrap();
        assert_eq!(bs.part().name(), "xyrag");
        assert_eq!(bs.container().frames().len(), 2);
        assert_eq!(bs.frame(FrameAddress::from_raw(3)).unwrap().data, vec![3, 4]);
        assert!(bs.diagnostics().is_empty());
        assert_eq!(
            bs.bit(PhysicalAddress::new(FrameAddress::from_raw(3), 1, 2)),
            Some(true)
        );
        assert_eq!(
            bs.bit(PhysicalAddress::new(FrameAddress::from_raw(9), 0, 0)),
            None
        );
    }

    #[test]
    fn bound_part_is_kept() {
        let db = database();
        let bytes = StreamBuilder::new()
            .idcode(0x0123_4093)
            .wcfg()
            .far(0)
            .fdri(&[7])
            .desync()
            .build();
        let options = DecodeOptions::default().with_database(&db);
        let (container, _) = decode(&bytes, &options).unwrap();
        let part = Arc::clone(container.part().unwrap());
        let bs = Bitstream::bind(container, &db).unwrap();
        assert!(Arc::ptr_eq(bs.part(), &part));
    }

    #[test]
    fn unknown_idcode_fails_to_bind() {
        let db = database();
        let bytes = StreamBuilder::new()
            .idcode(0x0BAD_0093)
            .wcfg()
            .far(0)
            .fdri(&[7])
            .desync()
            .build();
        let (container, _) = decode(&bytes, &DecodeOptions::default()).unwrap();
        assert_eq!(container.frames().len(), 1);
        assert!(matches!(
            Bitstream::bind(container, &db),
            Err(QueryError::UnknownPart { .. })
        ));

        let bytes = StreamBuilder::new().desync().build();
        let (container, _) = decode(&bytes, &DecodeOptions::default()).unwrap();
        assert_eq!(
            Bitstream::bind(container, &db).unwrap_err(),
            QueryError::MissingIdcode
        );
    }
}
