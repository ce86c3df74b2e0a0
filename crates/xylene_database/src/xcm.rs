//! The XCM container: a compressed, checksummed wrapper for catalog data.
//!
//! Layout:
//!
//! ```text
//! magic        u32 BE   "XCM1"
//! timestamp    u32 LE   high half, microseconds since the Unix epoch
//!              u32 LE   low half
//! compression  u8
//! content      u8
//! length       u64 LE   stored (compressed) data length
//! data         [u8]
//! checksum     [u8; 8]  BLAKE2b with an 8-byte digest, over the uncompressed data
//! ```

use crate::catalog::Catalog;
use crate::error::XcmError;
use blake2::digest::consts::U8;
use blake2::{Blake2b, Digest};
use std::io::{Read, Write};
use std::time::{SystemTime, UNIX_EPOCH};

/// The `XCM1` magic number.
pub const XCM_MAGIC: u32 = 0x5843_4D31;

const HEADER_LEN: usize = 4 + 8 + 1 + 1 + 8;
const CHECKSUM_LEN: usize = 8;
const ZSTD_LEVEL: i32 = 19;

fn checksum(payload: &[u8]) -> [u8; CHECKSUM_LEN] {
    let mut out = [0u8; CHECKSUM_LEN];
    out.copy_from_slice(&Blake2b::<U8>::digest(payload));
    out
}

/// Compression applied to the stored data.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Compression {
    /// Zstandard (default).
    Zstd,
    /// LZMA; recognised but not supported.
    Lzma,
    /// zlib; recognised but not supported.
    Zlib,
    /// bzip2; recognised but not supported.
    Bz2,
    /// gzip; recognised but not supported.
    Gzip,
    /// Stored uncompressed.
    None,
}

impl Compression {
    /// Returns the on-disk code.
    pub fn code(self) -> u8 {
        match self {
            Compression::Zstd => 0x01,
            Compression::Lzma => 0x02,
            Compression::Zlib => 0x03,
            Compression::Bz2 => 0x04,
            Compression::Gzip => 0x05,
            Compression::None => 0xFF,
        }
    }

    /// Decodes an on-disk code.
    pub fn from_code(code: u8) -> Option<Self> {
        Some(match code {
            0x01 => Compression::Zstd,
            0x02 => Compression::Lzma,
            0x03 => Compression::Zlib,
            0x04 => Compression::Bz2,
            0x05 => Compression::Gzip,
            0xFF => Compression::None,
            _ => return None,
        })
    }

    fn compress(self, data: &[u8]) -> Result<Vec<u8>, XcmError> {
        match self {
            Compression::Zstd => {
                let mut encoder = zstd::stream::Encoder::new(Vec::new(), ZSTD_LEVEL)?;
                encoder.write_all(data)?;
                Ok(encoder.finish()?)
            }
            Compression::None => Ok(data.to_vec()),
            other => Err(XcmError::UnsupportedCompression(other.code())),
        }
    }

    fn decompress(self, stored: &[u8]) -> Result<Vec<u8>, XcmError> {
        match self {
            Compression::Zstd => {
                let mut decoder = zstd::stream::Decoder::new(stored)?;
                let mut out = Vec::new();
                decoder.read_to_end(&mut out)?;
                Ok(out)
            }
            Compression::None => Ok(stored.to_vec()),
            other => Err(XcmError::UnsupportedCompression(other.code())),
        }
    }
}

/// How the payload is serialized.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Content {
    /// A MessagePack catalog with named fields.
    Msgpack,
    /// A JSON catalog.
    Json,
    /// Opaque bytes.
    Blob,
}

impl Content {
    /// Returns the on-disk code.
    pub fn code(self) -> u8 {
        match self {
            Content::Msgpack => 0x00,
            Content::Json => 0x01,
            Content::Blob => 0x02,
        }
    }

    /// Decodes an on-disk code.
    pub fn from_code(code: u8) -> Option<Self> {
        Some(match code {
            0x00 => Content::Msgpack,
            0x01 => Content::Json,
            0x02 => Content::Blob,
            _ => return None,
        })
    }
}

/// An XCM container held in memory with its payload uncompressed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct XcmFile {
    timestamp_micros: u64,
    compression: Compression,
    content: Content,
    payload: Vec<u8>,
}

impl XcmFile {
    /// Creates a zstd-compressed container stamped with the current time.
    pub fn new(content: Content, payload: Vec<u8>) -> Self {
        let timestamp_micros = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_micros() as u64)
            .unwrap_or(0);
        Self {
            timestamp_micros,
            compression: Compression::Zstd,
            content,
            payload,
        }
    }

    /// Serializes a catalog as the payload of a new container.
    pub fn from_catalog(catalog: &Catalog, content: Content) -> Result<Self, XcmError> {
        let payload = match content {
            Content::Msgpack => {
                rmp_serde::to_vec_named(catalog).map_err(|e| XcmError::Codec(e.to_string()))?
            }
            Content::Json => {
                serde_json::to_vec(catalog).map_err(|e| XcmError::Codec(e.to_string()))?
            }
            Content::Blob => {
                return Err(XcmError::Codec(
                    "a catalog cannot be stored as a blob".to_string(),
                ))
            }
        };
        Ok(Self::new(content, payload))
    }

    /// Sets the compression used by [`dump`](Self::dump).
    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    /// Sets the timestamp in microseconds since the Unix epoch.
    pub fn with_timestamp(mut self, micros: u64) -> Self {
        self.timestamp_micros = micros;
        self
    }

    /// Returns the timestamp in microseconds since the Unix epoch.
    pub fn timestamp_micros(&self) -> u64 {
        self.timestamp_micros
    }

    /// Returns the compression the container was stored with.
    pub fn compression(&self) -> Compression {
        self.compression
    }

    /// Returns the payload serialization.
    pub fn content(&self) -> Content {
        self.content
    }

    /// Returns the uncompressed payload.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Returns the uncompressed payload size.
    pub fn size(&self) -> usize {
        self.payload.len()
    }

    /// Deserializes the payload as a catalog.
    pub fn to_catalog(&self) -> Result<Catalog, XcmError> {
        match self.content {
            Content::Msgpack => {
                rmp_serde::from_slice(&self.payload).map_err(|e| XcmError::Codec(e.to_string()))
            }
            Content::Json => {
                serde_json::from_slice(&self.payload).map_err(|e| XcmError::Codec(e.to_string()))
            }
            Content::Blob => Err(XcmError::Codec(
                "blob content does not hold a catalog".to_string(),
            )),
        }
    }

    /// Parses and verifies a container.
    pub fn load(bytes: &[u8]) -> Result<Self, XcmError> {
        if bytes.len() < 4 {
            return Err(XcmError::Truncated("magic"));
        }
        let magic = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        if magic != XCM_MAGIC {
            return Err(XcmError::BadMagic(magic));
        }
        if bytes.len() < HEADER_LEN {
            return Err(XcmError::Truncated("header"));
        }

        let high = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
        let low = u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]);
        let timestamp_micros = (u64::from(high) << 32) | u64::from(low);

        let compression =
            Compression::from_code(bytes[12]).ok_or(XcmError::UnsupportedCompression(bytes[12]))?;
        let content = Content::from_code(bytes[13]).ok_or(XcmError::UnknownContent(bytes[13]))?;

        let mut len_bytes = [0u8; 8];
        len_bytes.copy_from_slice(&bytes[14..HEADER_LEN]);
        let stored_len = usize::try_from(u64::from_le_bytes(len_bytes))
            .map_err(|_| XcmError::Truncated("data"))?;

        let rest = &bytes[HEADER_LEN..];
        if rest.len() < stored_len || rest.len() - stored_len < CHECKSUM_LEN {
            return Err(XcmError::Truncated("data"));
        }
        let stored = &rest[..stored_len];
        let mut checksum_bytes = [0u8; CHECKSUM_LEN];
        checksum_bytes.copy_from_slice(&rest[stored_len..stored_len + CHECKSUM_LEN]);

        let payload = compression.decompress(stored)?;
        let computed = checksum(&payload);
        if computed != checksum_bytes {
            return Err(XcmError::ChecksumMismatch {
                stored: u64::from_be_bytes(checksum_bytes),
                computed: u64::from_be_bytes(computed),
            });
        }

        tracing::debug!(
            ?compression,
            ?content,
            size = payload.len(),
            "loaded XCM container"
        );

        Ok(Self {
            timestamp_micros,
            compression,
            content,
            payload,
        })
    }

    /// Serializes the container.
    pub fn dump(&self) -> Result<Vec<u8>, XcmError> {
        let stored = self.compression.compress(&self.payload)?;
        let mut out = Vec::with_capacity(HEADER_LEN + stored.len() + CHECKSUM_LEN);
        out.extend_from_slice(&XCM_MAGIC.to_be_bytes());
        out.extend_from_slice(&((self.timestamp_micros >> 32) as u32).to_le_bytes());
        out.extend_from_slice(&(self.timestamp_micros as u32).to_le_bytes());
        out.push(self.compression.code());
        out.push(self.content.code());
        out.extend_from_slice(&(stored.len() as u64).to_le_bytes());
        out.extend_from_slice(&stored);
        out.extend_from_slice(&checksum(&self.payload));
        Ok(out)
    }
}
