//! The length-prefixed `.bit` file header.
//!
//! ```text
//! 00 09  <9 bytes preamble>
//! 00 01  'a'
//! <len16> design name\0      then 'b' part, 'c' date, 'd' time, each
//!                            key byte + len16 + NUL-terminated text
//! 'e' <len32>                length of the configuration data that follows
//! ```

use crate::error::DecodeError;
use serde::Serialize;

/// Metadata from the `.bit` header. Opaque to the decoder.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct BitHeader {
    /// Design name (key `a`).
    pub design: Option<String>,
    /// Part identifier string (key `b`).
    pub part: Option<String>,
    /// Build date (key `c`).
    pub date: Option<String>,
    /// Build time (key `d`).
    pub time: Option<String>,
    /// Declared configuration data length (key `e`).
    pub data_length: Option<u32>,
    /// Byte offset just past the header.
    #[serde(skip)]
    pub end: usize,
}

impl BitHeader {
    /// Returns `true` if no field was present.
    pub fn is_empty(&self) -> bool {
        self.design.is_none()
            && self.part.is_none()
            && self.date.is_none()
            && self.time.is_none()
            && self.data_length.is_none()
    }
}

const PREAMBLE_MARK: [u8; 2] = [0x00, 0x09];

struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn take(&mut self, n: usize, what: &str) -> Result<&'a [u8], DecodeError> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|&end| end <= self.data.len())
            .ok_or_else(|| DecodeError::TruncatedStream {
                offset: self.pos,
                reason: format!("header {what} runs past the sync word"),
            })?;
        let data = self.data;
        let bytes = &data[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    fn u16(&mut self, what: &str) -> Result<usize, DecodeError> {
        let b = self.take(2, what)?;
        Ok(usize::from(u16::from_be_bytes([b[0], b[1]])))
    }

    fn u32(&mut self, what: &str) -> Result<u32, DecodeError> {
        let b = self.take(4, what)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn text(&mut self, what: &str) -> Result<String, DecodeError> {
        let len = self.u16(what)?;
        let bytes = self.take(len, what)?;
        let bytes = bytes.strip_suffix(&[0]).unwrap_or(bytes);
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }
}

/// Parses the bytes preceding the sync word.
///
/// A prefix not starting with the `00 09` preamble is bus-width padding and
/// yields an empty header.
pub fn parse_header(prefix: &[u8]) -> Result<BitHeader, DecodeError> {
    let mut header = BitHeader::default();
    if !prefix.starts_with(&PREAMBLE_MARK) {
        return Ok(header);
    }

    let mut cur = Cursor {
        data: prefix,
        pos: 0,
    };
    let preamble_len = cur.u16("preamble length")?;
    cur.take(preamble_len, "preamble")?;
    let key_len = cur.u16("key length")?;
    let mut key = cur.take(key_len, "first key")?.first().copied();

    while let Some(k) = key {
        let key_offset = cur.pos.saturating_sub(1);
        match k {
            b'a' => header.design = Some(cur.text("design name")?),
            b'b' => header.part = Some(cur.text("part name")?),
            b'c' => header.date = Some(cur.text("date")?),
            b'd' => header.time = Some(cur.text("time")?),
            b'e' => {
                header.data_length = Some(cur.u32("data length")?);
                break;
            }
            other => {
                return Err(DecodeError::TruncatedStream {
                    offset: key_offset,
                    reason: format!("unknown header key 0x{other:02X}"),
                })
            }
        }
        key = if cur.pos < prefix.len() {
            Some(cur.take(1, "key")?[0])
        } else {
            None
        };
    }

    header.end = cur.pos;
    tracing::debug!(
        design = header.design.as_deref().unwrap_or(""),
        part = header.part.as_deref().unwrap_or(""),
        "parsed bit header"
    );
    Ok(header)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(data: &mut Vec<u8>, key: u8, text: &str) {
        data.push(key);
        data.extend_from_slice(&((text.len() + 1) as u16).to_be_bytes());
        data.extend_from_slice(text.as_bytes());
        data.push(0);
    }

    fn sample() -> Vec<u8> {
        let mut data = vec![
            0x00, 0x09, 0x0F, 0xF0, 0x0F, 0xF0, 0x0F, 0xF0, 0x0F, 0xF0, 0x00, 0x00, 0x01,
        ];
        data.push(b'a');
        data.extend_from_slice(&6u16.to_be_bytes());
        data.extend_from_slice(b"blink\0");
        field(&mut data, b'b', "xy7s25csg324");
        field(&mut data, b'c', "2024/01/01");
        field(&mut data, b'd', "12:00:00");
        data.push(b'e');
        data.extend_from_slice(&0x40u32.to_be_bytes());
        data
    }

    #[test]
    fn parses_all_fields() {
        let mut data = sample();
        let end = data.len();
        data.extend_from_slice(&[0xFF; 8]);
        let header = parse_header(&data).unwrap();
        assert_eq!(header.design.as_deref(), Some("blink"));
        assert_eq!(header.part.as_deref(), Some("xy7s25csg324"));
        assert_eq!(header.date.as_deref(), Some("2024/01/01"));
        assert_eq!(header.time.as_deref(), Some("12:00:00"));
        assert_eq!(header.data_length, Some(0x40));
        assert_eq!(header.end, end);
    }

    #[test]
    fn padding_only_is_empty() {
        let header = parse_header(&[0xFF, 0xFF, 0x00, 0x00, 0x00, 0xBB]).unwrap();
        assert!(header.is_empty());
        assert_eq!(header.end, 0);
        assert!(parse_header(&[]).unwrap().is_empty());
    }

    #[test]
    fn field_past_end_truncates() {
        let data = sample();
        let cut = &data[..20];
        assert!(matches!(
            parse_header(cut),
            Err(DecodeError::TruncatedStream { .. })
        ));
    }

    #[test]
    fn unknown_key_truncates() {
        let mut data = sample();
        let e = data.len() - 5;
        data[e] = b'z';
        assert!(matches!(
            parse_header(&data),
            Err(DecodeError::TruncatedStream { .. })
        ));
    }
}
